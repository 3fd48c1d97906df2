//! Console actuator - logs every command instead of injecting input
//!
//! This is useful for:
//! - Dry runs with the replay source
//! - Checking bindings without moving the real pointer
//! - Development on machines without an input injection backend

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use super::{Actuator, ActuatorCommand, ActuatorResult, MouseButton};

pub struct ConsoleActuator {
    name: String,
    /// Execution counter for debugging
    command_count: AtomicU64,
}

impl ConsoleActuator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command_count: AtomicU64::new(0),
        }
    }

    /// Commands logged so far
    pub fn command_count(&self) -> u64 {
        self.command_count.load(Ordering::Relaxed)
    }

    fn log(&self, command: ActuatorCommand) -> ActuatorResult {
        let exec_num = self.command_count.fetch_add(1, Ordering::Relaxed) + 1;

        info!(
            "🎮 [{}] Actuator '{}' → {} [cmd #{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            self.name,
            command,
            exec_num
        );

        debug!(
            actuator = self.name,
            command = ?command,
            cmd_count = exec_num,
            "ConsoleActuator command"
        );

        Ok(())
    }
}

#[async_trait]
impl Actuator for ConsoleActuator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn move_cursor_to(&self, x: f64, y: f64) -> ActuatorResult {
        self.log(ActuatorCommand::MoveTo { x, y })
    }

    async fn move_cursor_by(&self, dx: i32, dy: i32) -> ActuatorResult {
        self.log(ActuatorCommand::MoveBy { dx, dy })
    }

    async fn press_key(&self, key: &str) -> ActuatorResult {
        self.log(ActuatorCommand::PressKey(key.to_string()))
    }

    async fn set_button_down(&self, button: MouseButton) -> ActuatorResult {
        self.log(ActuatorCommand::ButtonDown(button))
    }

    async fn set_button_up(&self, button: MouseButton) -> ActuatorResult {
        self.log(ActuatorCommand::ButtonUp(button))
    }

    async fn click(&self, button: MouseButton) -> ActuatorResult {
        self.log(ActuatorCommand::Click(button))
    }
}
