//! Cursor channel: relative stick motion on an absolute virtual desk

use crate::actuator::ActuatorCommand;

use super::request::CursorRequest;

/// Largest coordinate on either axis of the virtual desk
pub const DESK_BOUND: f64 = 65535.0;

/// Desk center; a released stick snaps the cursor here
pub const ORIGIN: (f64, f64) = (DESK_BOUND / 2.0, DESK_BOUND / 2.0);

/// Horizontal deltas are scaled to the 16:9 aspect ratio
const ASPECT_X: f64 = 9.0 / 16.0;

/// Tracked cursor location
///
/// Owned by the tick loop. The location only advances once the actuator has
/// accepted the move.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    location: (f64, f64),
    base_speed: f64,
}

impl CursorTracker {
    pub fn new(base_speed: f64) -> Self {
        Self {
            location: ORIGIN,
            base_speed,
        }
    }

    pub fn location(&self) -> (f64, f64) {
        self.location
    }

    pub fn set_location(&mut self, location: (f64, f64)) {
        self.location = location;
    }

    /// Where this request would put the cursor
    pub fn target(&self, request: &CursorRequest) -> (f64, f64) {
        if request.sample.released {
            return ORIGIN;
        }

        let speed = request.sensitivity * self.base_speed;
        let dx = ((f64::from(request.sample.x) * speed).trunc() * ASPECT_X).trunc();
        let dy = (f64::from(request.sample.y) * speed).trunc();

        (
            step_within_desk(self.location.0, dx),
            step_within_desk(self.location.1, dy),
        )
    }

    /// Command for this request
    pub fn command(&self, request: &CursorRequest) -> ((f64, f64), ActuatorCommand) {
        let (x, y) = self.target(request);
        ((x, y), ActuatorCommand::MoveTo { x, y })
    }
}

/// Apply a delta, keeping the old coordinate if the result leaves the desk
fn step_within_desk(coordinate: f64, delta: f64) -> f64 {
    let next = coordinate + delta;
    if (0.0..=DESK_BOUND).contains(&next) {
        next
    } else {
        coordinate
    }
}
