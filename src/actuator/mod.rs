//! Output side: synthetic mouse and keyboard input
//!
//! The pipeline never talks to the OS directly. Everything it wants to do to
//! the pointer or keyboard goes through an [`Actuator`], wrapped in a
//! [`SharedActuator`] so multi-step sequences from different tasks never
//! interleave.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

pub mod console;
pub mod recording;

pub use console::ConsoleActuator;
pub use recording::RecordingActuator;

/// Actuator failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("actuator unavailable: {0}")]
    Unavailable(String),
    #[error("unknown key: {0}")]
    UnknownKey(String),
    #[error("input injection failed: {0}")]
    Injection(String),
}

pub type ActuatorResult = Result<(), ActuatorError>;

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// One actuator call, as data
///
/// Used for logging and by the recording actuator.
#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCommand {
    MoveTo { x: f64, y: f64 },
    MoveBy { dx: i32, dy: i32 },
    PressKey(String),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Click(MouseButton),
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorCommand::MoveTo { x, y } => write!(f, "move_to({:.1}, {:.1})", x, y),
            ActuatorCommand::MoveBy { dx, dy } => write!(f, "move_by({}, {})", dx, dy),
            ActuatorCommand::PressKey(key) => write!(f, "press_key({})", key),
            ActuatorCommand::ButtonDown(button) => write!(f, "button_down({:?})", button),
            ActuatorCommand::ButtonUp(button) => write!(f, "button_up({:?})", button),
            ActuatorCommand::Click(button) => write!(f, "click({:?})", button),
        }
    }
}

/// Synthetic input sink
///
/// Cursor coordinates are absolute on a virtual desk normalized to
/// `0..=65535` per axis.
///
/// Note: all methods take `&self` to support `Arc<dyn Actuator>`.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Actuator name for logs
    fn name(&self) -> &str;

    async fn move_cursor_to(&self, x: f64, y: f64) -> ActuatorResult;

    async fn move_cursor_by(&self, dx: i32, dy: i32) -> ActuatorResult;

    async fn press_key(&self, key: &str) -> ActuatorResult;

    async fn set_button_down(&self, button: MouseButton) -> ActuatorResult;

    async fn set_button_up(&self, button: MouseButton) -> ActuatorResult;

    /// Press and release a mouse button
    async fn click(&self, button: MouseButton) -> ActuatorResult;

    /// Execute a command value
    async fn execute(&self, command: &ActuatorCommand) -> ActuatorResult {
        match command {
            ActuatorCommand::MoveTo { x, y } => self.move_cursor_to(*x, *y).await,
            ActuatorCommand::MoveBy { dx, dy } => self.move_cursor_by(*dx, *dy).await,
            ActuatorCommand::PressKey(key) => self.press_key(key).await,
            ActuatorCommand::ButtonDown(button) => self.set_button_down(*button).await,
            ActuatorCommand::ButtonUp(button) => self.set_button_up(*button).await,
            ActuatorCommand::Click(button) => self.click(*button).await,
        }
    }
}

/// Actuator shared between the tick loop and the bindings task
///
/// A session holds the motion lock for its lifetime, so a compound sequence
/// (move, press, nudge, release) runs without anything else in between.
#[derive(Clone)]
pub struct SharedActuator {
    inner: Arc<dyn Actuator>,
    motion: Arc<Mutex<()>>,
}

impl SharedActuator {
    pub fn new(inner: Arc<dyn Actuator>) -> Self {
        Self {
            inner,
            motion: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Wait for exclusive access
    pub async fn session(&self) -> ActuatorSession<'_> {
        ActuatorSession {
            _guard: self.motion.lock().await,
            actuator: self.inner.as_ref(),
        }
    }

    /// Run a command sequence as one session, stopping at the first failure
    ///
    /// Buttons the sequence pressed are released before the error is
    /// returned, so a failure never leaves a mouse button held down.
    pub async fn run_sequence(&self, commands: &[ActuatorCommand]) -> ActuatorResult {
        let session = self.session().await;
        let mut held: Vec<MouseButton> = Vec::new();

        for command in commands {
            if let Err(e) = session.execute(command).await {
                for button in held.iter().rev() {
                    if let Err(release) = session.set_button_up(*button).await {
                        warn!("Failed to release {:?} after {}: {}", button, command, release);
                    }
                }
                return Err(e);
            }

            match command {
                ActuatorCommand::ButtonDown(button) => held.push(*button),
                ActuatorCommand::ButtonUp(button) => held.retain(|b| b != button),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Exclusive access to the shared actuator
pub struct ActuatorSession<'a> {
    _guard: MutexGuard<'a, ()>,
    actuator: &'a (dyn Actuator + 'static),
}

impl Deref for ActuatorSession<'_> {
    type Target = dyn Actuator;

    fn deref(&self) -> &Self::Target {
        self.actuator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_command_display() {
        assert_eq!(ActuatorCommand::MoveTo { x: 32767.5, y: 0.0 }.to_string(), "move_to(32767.5, 0.0)");
        assert_eq!(ActuatorCommand::MoveBy { dx: 10, dy: -3 }.to_string(), "move_by(10, -3)");
        assert_eq!(ActuatorCommand::PressKey("Q".into()).to_string(), "press_key(Q)");
        assert_eq!(ActuatorCommand::Click(MouseButton::Right).to_string(), "click(Right)");
    }

    #[tokio::test]
    async fn test_sequence_stops_at_first_failure() {
        let recorder = Arc::new(RecordingActuator::new());
        let shared = SharedActuator::new(recorder.clone());

        recorder.fail_after(1, ActuatorError::Injection("blocked".into()));
        let result = shared
            .run_sequence(&[
                ActuatorCommand::MoveTo { x: 1.0, y: 2.0 },
                ActuatorCommand::ButtonDown(MouseButton::Right),
                ActuatorCommand::ButtonUp(MouseButton::Right),
            ])
            .await;

        assert_eq!(result, Err(ActuatorError::Injection("blocked".into())));
        assert_eq!(recorder.commands(), vec![ActuatorCommand::MoveTo { x: 1.0, y: 2.0 }]);
    }

    #[tokio::test]
    async fn test_failed_sequence_releases_held_button() {
        let recorder = Arc::new(RecordingActuator::new());
        let shared = SharedActuator::new(recorder.clone());

        recorder.fail_once_after(2, ActuatorError::Injection("blocked".into()));
        let result = shared
            .run_sequence(&[
                ActuatorCommand::MoveTo { x: 1.0, y: 2.0 },
                ActuatorCommand::ButtonDown(MouseButton::Right),
                ActuatorCommand::MoveBy { dx: 10, dy: 10 },
                ActuatorCommand::ButtonUp(MouseButton::Right),
            ])
            .await;

        assert_eq!(result, Err(ActuatorError::Injection("blocked".into())));
        assert_eq!(
            recorder.commands(),
            vec![
                ActuatorCommand::MoveTo { x: 1.0, y: 2.0 },
                ActuatorCommand::ButtonDown(MouseButton::Right),
                ActuatorCommand::ButtonUp(MouseButton::Right),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_release_reports_the_first_error() {
        let recorder = Arc::new(RecordingActuator::new());
        let shared = SharedActuator::new(recorder.clone());

        // Nothing gets through after the button goes down, not even the release
        recorder.fail_after(1, ActuatorError::Unavailable("focus lost".into()));
        let result = shared
            .run_sequence(&[
                ActuatorCommand::ButtonDown(MouseButton::Left),
                ActuatorCommand::MoveBy { dx: 1, dy: 1 },
                ActuatorCommand::ButtonUp(MouseButton::Left),
            ])
            .await;

        assert_eq!(result, Err(ActuatorError::Unavailable("focus lost".into())));
        assert_eq!(recorder.commands(), vec![ActuatorCommand::ButtonDown(MouseButton::Left)]);
    }

    #[tokio::test]
    async fn test_sessions_do_not_interleave() {
        let recorder = Arc::new(RecordingActuator::new());
        let shared = SharedActuator::new(recorder.clone());

        let first = {
            let shared = shared.clone();
            tokio::spawn(async move {
                let session = shared.session().await;
                session.set_button_down(MouseButton::Right).await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
                session.set_button_up(MouseButton::Right).await.unwrap();
            })
        };

        // Let the first task take the lock
        tokio::time::sleep(Duration::from_millis(5)).await;
        shared.session().await.press_key("Q").await.unwrap();
        first.await.unwrap();

        assert_eq!(
            recorder.commands(),
            vec![
                ActuatorCommand::ButtonDown(MouseButton::Right),
                ActuatorCommand::ButtonUp(MouseButton::Right),
                ActuatorCommand::PressKey("Q".into()),
            ]
        );
    }
}
