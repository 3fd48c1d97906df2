//! Recording actuator for tests and diagnostics

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Actuator, ActuatorCommand, ActuatorError, ActuatorResult, MouseButton};

#[derive(Debug, Default)]
struct FailurePlan {
    /// Successful commands still allowed before failing
    remaining: Option<usize>,
    error: Option<ActuatorError>,
    /// Fail a single command, then stop failing
    once: bool,
}

/// Actuator that records every successful command
///
/// Can be told to fail, either immediately or after a number of successes.
/// Failed commands are not recorded.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    commands: Mutex<Vec<ActuatorCommand>>,
    failure: Mutex<FailurePlan>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands, oldest first
    pub fn commands(&self) -> Vec<ActuatorCommand> {
        self.commands.lock().clone()
    }

    /// Take and clear the recorded commands
    pub fn take(&self) -> Vec<ActuatorCommand> {
        std::mem::take(&mut *self.commands.lock())
    }

    /// Fail every command from now on
    pub fn fail_with(&self, error: ActuatorError) {
        self.fail_after(0, error);
    }

    /// Let `successes` commands through, then fail every command
    pub fn fail_after(&self, successes: usize, error: ActuatorError) {
        *self.failure.lock() = FailurePlan {
            remaining: Some(successes),
            error: Some(error),
            once: false,
        };
    }

    /// Let `successes` commands through, fail the next one, then recover
    pub fn fail_once_after(&self, successes: usize, error: ActuatorError) {
        *self.failure.lock() = FailurePlan {
            remaining: Some(successes),
            error: Some(error),
            once: true,
        };
    }

    /// Stop failing
    pub fn recover(&self) {
        *self.failure.lock() = FailurePlan::default();
    }

    fn record(&self, command: ActuatorCommand) -> ActuatorResult {
        {
            let mut plan = self.failure.lock();
            if let Some(remaining) = plan.remaining {
                if remaining == 0 {
                    if plan.once {
                        if let Some(error) = std::mem::take(&mut *plan).error {
                            return Err(error);
                        }
                    } else if let Some(error) = plan.error.clone() {
                        return Err(error);
                    }
                } else {
                    plan.remaining = Some(remaining - 1);
                }
            }
        }
        self.commands.lock().push(command);
        Ok(())
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn move_cursor_to(&self, x: f64, y: f64) -> ActuatorResult {
        self.record(ActuatorCommand::MoveTo { x, y })
    }

    async fn move_cursor_by(&self, dx: i32, dy: i32) -> ActuatorResult {
        self.record(ActuatorCommand::MoveBy { dx, dy })
    }

    async fn press_key(&self, key: &str) -> ActuatorResult {
        self.record(ActuatorCommand::PressKey(key.to_string()))
    }

    async fn set_button_down(&self, button: MouseButton) -> ActuatorResult {
        self.record(ActuatorCommand::ButtonDown(button))
    }

    async fn set_button_up(&self, button: MouseButton) -> ActuatorResult {
        self.record(ActuatorCommand::ButtonUp(button))
    }

    async fn click(&self, button: MouseButton) -> ActuatorResult {
        self.record(ActuatorCommand::Click(button))
    }
}
