//! Snapshot sources and the sampling thread
//!
//! A [`SnapshotSource`] is anything that can be asked for the current
//! whole-gamepad state. The [`SamplerHandle`] owns a dedicated OS thread that
//! polls one source at a fixed interval, diffs each new snapshot against the
//! last one and feeds the transition through the [`ControllerStateMonitor`].
//!
//! Sources are built on the sampling thread itself (some backends, gilrs in
//! particular, are not `Send`), so [`SamplerHandle::spawn`] takes a factory.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use super::monitor::ControllerStateMonitor;
use super::snapshot::RawGamepadSnapshot;

/// Snapshot source failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The device went away
    #[error("controller disconnected")]
    Disconnected,
    /// A finite source ran out of frames
    #[error("source exhausted")]
    Exhausted,
    /// Backend hiccup; polling may succeed next time
    #[error("backend error: {0}")]
    Backend(String),
}

impl SourceError {
    /// Terminal errors stop the sampler
    pub fn is_terminal(&self) -> bool {
        matches!(self, SourceError::Disconnected | SourceError::Exhausted)
    }
}

/// Polled source of raw gamepad state
pub trait SnapshotSource {
    /// Short human-readable name for logs
    fn name(&self) -> &str;

    /// Current device state
    ///
    /// # Returns
    /// - `Ok(Some(snapshot))` when a (possibly unchanged) state is available
    /// - `Ok(None)` when there is nothing new to report
    /// - `Err(_)` on failure, see [`SourceError::is_terminal`]
    fn poll(&mut self) -> Result<Option<RawGamepadSnapshot>, SourceError>;
}

/// Boxed factory run on the sampling thread
pub type SourceFactory =
    Box<dyn FnOnce() -> Result<Box<dyn SnapshotSource>, SourceError> + Send + 'static>;

/// Lifecycle of the sampling thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerStatus {
    Running,
    /// Source failed terminally; the sampler has exited
    SourceLost(String),
    /// Shut down on request
    Stopped,
}

/// Handle to a running sampling thread
///
/// Dropping the handle asks the thread to stop.
pub struct SamplerHandle {
    shutdown_tx: Option<mpsc::Sender<()>>,
    status_rx: watch::Receiver<SamplerStatus>,
    thread: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Spawn the sampling thread
    ///
    /// # Arguments
    /// * `factory` - Builds the source on the sampling thread
    /// * `monitor` - Monitor (with its listeners) owned by the thread from now on
    /// * `poll_interval` - Time between two polls
    pub fn spawn<F>(factory: F, monitor: ControllerStateMonitor, poll_interval: Duration) -> Self
    where
        F: FnOnce() -> Result<Box<dyn SnapshotSource>, SourceError> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (status_tx, status_rx) = watch::channel(SamplerStatus::Running);

        let thread = std::thread::Builder::new()
            .name("gamepad-sampler".into())
            .spawn(move || {
                Self::sample_loop(Box::new(factory), monitor, poll_interval, shutdown_rx, status_tx);
            });

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                // Without a thread there is nothing to sample; report it as a lost source
                error!("Failed to spawn sampling thread: {}", e);
                let (status_tx, status_rx) =
                    watch::channel(SamplerStatus::SourceLost(format!("thread spawn failed: {}", e)));
                drop(status_tx);
                return Self {
                    shutdown_tx: None,
                    status_rx,
                    thread: None,
                };
            }
        };

        Self {
            shutdown_tx: Some(shutdown_tx),
            status_rx,
            thread,
        }
    }

    /// Subscribe to status changes
    pub fn status(&self) -> watch::Receiver<SamplerStatus> {
        self.status_rx.clone()
    }

    /// Ask the sampling thread to stop and wait for it to exit
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
            debug!("Sampler shutdown requested");
        }
        if let Some(thread) = self.thread.take() {
            // The loop wakes at least once per poll interval, so this is short
            let _ = tokio::task::spawn_blocking(move || thread.join()).await;
        }
    }

    /// Main loop (runs in the dedicated sampling thread)
    fn sample_loop(
        factory: SourceFactory,
        mut monitor: ControllerStateMonitor,
        poll_interval: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
        status_tx: watch::Sender<SamplerStatus>,
    ) {
        let mut source = match factory() {
            Ok(source) => source,
            Err(e) => {
                error!("Failed to open snapshot source: {}", e);
                let _ = status_tx.send(SamplerStatus::SourceLost(e.to_string()));
                return;
            }
        };

        info!("Sampling '{}' every {:?}", source.name(), poll_interval);

        let mut last = RawGamepadSnapshot::default();
        let mut last_loop = Instant::now();

        loop {
            match shutdown_rx.try_recv() {
                Ok(_) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    debug!("Sampler shutting down");
                    let _ = status_tx.send(SamplerStatus::Stopped);
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            match source.poll() {
                Ok(Some(snapshot)) => {
                    if snapshot != last {
                        trace!("Snapshot changed: {:?}", snapshot);
                        monitor.process(&last, &snapshot);
                        last = snapshot;
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_terminal() => {
                    warn!("Source '{}' lost: {}", source.name(), e);
                    // Let moving sticks and held triggers report their release
                    monitor.process(&last, &RawGamepadSnapshot::default());
                    let _ = status_tx.send(SamplerStatus::SourceLost(e.to_string()));
                    break;
                }
                Err(e) => {
                    warn!("Source '{}' poll failed: {}", source.name(), e);
                }
            }

            let elapsed = last_loop.elapsed();
            if elapsed < poll_interval {
                std::thread::sleep(poll_interval - elapsed);
            }
            last_loop = Instant::now();
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
    }
}
