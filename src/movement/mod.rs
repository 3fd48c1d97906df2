//! Movement arbiter
//!
//! Turns the latest stick request of each channel into actuator commands on a
//! fixed tick. The sampling thread only writes into [`MovementSlots`]; the
//! tick loop owns everything else (cursor location, champion throttle) and
//! never waits for samples.
//!
//! Per tick and per channel:
//! - consume the slot; an already-seen release means the channel is idle
//! - cursor: move to the next location (or back to the origin on release)
//! - champion: send the move-and-click sequence if the throttle allows

pub mod champion;
pub mod cursor;
pub mod request;


use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::actuator::{ActuatorError, SharedActuator};
use crate::config::MovementConfig;
use crate::input::gamepad::{ControllerEvent, EventCallback, StickId};

use champion::ChampionThrottle;
use cursor::CursorTracker;

pub use request::{ChampionRequest, CursorRequest, MovementSlots, RequestSlot};

/// What a channel did during one tick
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelOutcome {
    /// Nothing to do
    Idle,
    /// Command sent
    Issued,
    /// Champion command held back by the throttle
    Throttled,
    /// Actuator rejected the command
    Failed(ActuatorError),
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub cursor: ChannelOutcome,
    pub champion: ChannelOutcome,
}

/// Counters, logged at shutdown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArbiterStats {
    pub ticks: u64,
    pub cursor_issued: u64,
    pub champion_issued: u64,
    pub champion_throttled: u64,
    pub failed: u64,
}

/// Arbiter timing and scaling
#[derive(Debug, Clone)]
pub struct ArbiterSettings {
    pub tick_interval: Duration,
    pub champion_period: u32,
    pub cursor_base_speed: f64,
}

impl Default for ArbiterSettings {
    fn default() -> Self {
        Self::from(&MovementConfig::default())
    }
}

impl From<&MovementConfig> for ArbiterSettings {
    fn from(config: &MovementConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            champion_period: config.champion_period_ticks,
            cursor_base_speed: config.cursor_base_speed,
        }
    }
}

/// Build the listener that routes stick events into the channel slots
///
/// Right stick drives the cursor and left stick the champion, unless
/// `swap_sticks` is set.
pub fn stick_router(slots: Arc<MovementSlots>, swap_sticks: bool) -> EventCallback {
    let cursor_stick = if swap_sticks { StickId::Left } else { StickId::Right };

    Arc::new(move |event: &ControllerEvent| {
        if let ControllerEvent::StickMoved { stick, sample } = event {
            if *stick == cursor_stick {
                slots.submit_cursor(*sample);
            } else {
                slots.submit_champion(*sample);
            }
        }
    })
}

/// Tick-driven movement arbiter
pub struct MovementArbiter {
    slots: Arc<MovementSlots>,
    actuator: SharedActuator,
    settings: ArbiterSettings,
    cursor: CursorTracker,
    throttle: ChampionThrottle,
    stats: ArbiterStats,
}

impl MovementArbiter {
    pub fn new(slots: Arc<MovementSlots>, actuator: SharedActuator, settings: ArbiterSettings) -> Self {
        Self {
            cursor: CursorTracker::new(settings.cursor_base_speed),
            throttle: ChampionThrottle::new(settings.champion_period),
            slots,
            actuator,
            settings,
            stats: ArbiterStats::default(),
        }
    }

    pub fn stats(&self) -> &ArbiterStats {
        &self.stats
    }

    /// Tracked cursor location
    pub fn cursor_location(&self) -> (f64, f64) {
        self.cursor.location()
    }

    /// Run one tick
    pub async fn tick(&mut self) -> TickReport {
        self.stats.ticks += 1;

        let cursor = self.tick_cursor().await;
        let champion = self.tick_champion().await;
        self.throttle.tick();

        trace!("Tick {}: cursor={:?} champion={:?}", self.stats.ticks, cursor, champion);

        TickReport { cursor, champion }
    }

    async fn tick_cursor(&mut self) -> ChannelOutcome {
        let Some(request) = self.slots.cursor.take() else {
            return ChannelOutcome::Idle;
        };

        let (target, command) = self.cursor.command(&request);
        let result = self.actuator.session().await.execute(&command).await;

        match result {
            Ok(()) => {
                self.cursor.set_location(target);
                self.stats.cursor_issued += 1;
                ChannelOutcome::Issued
            }
            Err(e) => {
                self.stats.failed += 1;
                ChannelOutcome::Failed(e)
            }
        }
    }

    async fn tick_champion(&mut self) -> ChannelOutcome {
        let Some(request) = self.slots.champion.take() else {
            return ChannelOutcome::Idle;
        };

        if !self.throttle.ready(request.urgent) {
            self.stats.champion_throttled += 1;
            return ChannelOutcome::Throttled;
        }

        // The throttle restarts even if the sequence fails part way
        self.throttle.reset();

        match self.actuator.run_sequence(&champion::command_sequence(&request)).await {
            Ok(()) => {
                self.stats.champion_issued += 1;
                ChannelOutcome::Issued
            }
            Err(e) => {
                self.stats.failed += 1;
                ChannelOutcome::Failed(e)
            }
        }
    }

    /// Tick until `shutdown` fires or its sender is dropped
    pub async fn run(mut self, mut shutdown: mpsc::Receiver<()>) -> ArbiterStats {
        info!(
            "Movement arbiter running (tick {:?}, champion period {} ticks)",
            self.settings.tick_interval, self.settings.champion_period
        );

        let mut ticker = interval(self.settings.tick_interval);
        // Ticks never overlap; a slow tick pushes the schedule back
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Movement arbiter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    if let ChannelOutcome::Failed(e) = &report.cursor {
                        warn!("Cursor command failed: {}", e);
                    }
                    if let ChannelOutcome::Failed(e) = &report.champion {
                        warn!("Champion command failed: {}", e);
                    }
                }
            }
        }

        self.stats
    }

    /// Spawn [`MovementArbiter::run`] on the tokio runtime
    pub fn spawn(self) -> ArbiterHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let task = tokio::spawn(self.run(shutdown_rx));
        ArbiterHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a spawned arbiter
///
/// Dropping the handle stops the tick loop.
pub struct ArbiterHandle {
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<ArbiterStats>>,
}

impl ArbiterHandle {
    /// Stop the tick loop and collect its statistics
    pub async fn shutdown(mut self) -> ArbiterStats {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }

        match self.task.take() {
            Some(task) => match task.await {
                Ok(stats) => stats,
                Err(e) => {
                    warn!("Movement arbiter task failed: {}", e);
                    ArbiterStats::default()
                }
            },
            None => ArbiterStats::default(),
        }
    }
}

impl Drop for ArbiterHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
    }
}
