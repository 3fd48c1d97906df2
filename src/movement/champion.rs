//! Champion channel: throttled move-and-click locomotion

use crate::actuator::{ActuatorCommand, MouseButton};

use super::cursor::ORIGIN;
use super::request::ChampionRequest;

/// Horizontal reach from the desk center at distance 1.0 (16:9 corrected)
pub const RADIUS_X: f64 = ORIGIN.0 * 9.0 / 16.0;
/// Vertical reach from the desk center at distance 1.0
pub const RADIUS_Y: f64 = ORIGIN.1;

/// Post-click nudge so the game registers the click as a fresh position
const NUDGE: (i32, i32) = (10, 10);

/// Where the champion should be sent
pub fn target(request: &ChampionRequest) -> (f64, f64) {
    (
        ORIGIN.0 + f64::from(request.sample.x) * RADIUS_X * request.distance,
        ORIGIN.1 + f64::from(request.sample.y) * RADIUS_Y * request.distance,
    )
}

/// Compound command: move, right button down, nudge, right button up
pub fn command_sequence(request: &ChampionRequest) -> [ActuatorCommand; 4] {
    let (x, y) = target(request);
    [
        ActuatorCommand::MoveTo { x, y },
        ActuatorCommand::ButtonDown(MouseButton::Right),
        ActuatorCommand::MoveBy { dx: NUDGE.0, dy: NUDGE.1 },
        ActuatorCommand::ButtonUp(MouseButton::Right),
    ]
}

/// Champion throttle
///
/// A command may go out when the countdown has reached zero (or the request
/// is urgent); issuing resets it to the period. It counts down once per tick.
#[derive(Debug, Clone)]
pub struct ChampionThrottle {
    period: u32,
    countdown: u32,
}

impl ChampionThrottle {
    /// Starts ready, unlike a fresh period, so the first locomotion command
    /// goes out on the first tick
    pub fn new(period: u32) -> Self {
        Self { period, countdown: 0 }
    }

    pub fn ready(&self, urgent: bool) -> bool {
        urgent || self.countdown == 0
    }

    pub fn reset(&mut self) {
        self.countdown = self.period;
    }

    /// End of tick
    pub fn tick(&mut self) {
        self.countdown = self.countdown.saturating_sub(1);
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }
}
