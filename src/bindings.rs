//! Button bindings - turns button and trigger events into key presses and clicks
//!
//! Uses a dedicated channel + single task for sequential event processing, so
//! key presses come out in the order the buttons went down and never block the
//! sampling thread.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::actuator::{ActuatorResult, MouseButton, SharedActuator};
use crate::config::BindingsConfig;
use crate::input::gamepad::{ButtonId, ControllerEvent, EventCallback, TriggerSide};

/// Button → key and trigger → mouse button table
#[derive(Debug, Clone)]
pub struct ButtonBindings {
    keys: BTreeMap<ButtonId, String>,
    clicks: BTreeMap<TriggerSide, MouseButton>,
}

impl ButtonBindings {
    pub fn new(config: &BindingsConfig) -> Self {
        Self {
            keys: config.buttons.clone(),
            clicks: config.triggers.clone(),
        }
    }

    pub fn key_for(&self, button: ButtonId) -> Option<&str> {
        self.keys.get(&button).map(String::as_str)
    }

    pub fn click_for(&self, side: TriggerSide) -> Option<MouseButton> {
        self.clicks.get(&side).copied()
    }
}

impl Default for ButtonBindings {
    fn default() -> Self {
        Self::new(&BindingsConfig::default())
    }
}

/// Bindings processor - connects monitor events to the actuator
pub struct BindingsProcessor {
    /// Channel sender, also cloned into the listener
    event_tx: mpsc::UnboundedSender<ControllerEvent>,
    task: JoinHandle<()>,
}

impl BindingsProcessor {
    /// Spawn the sequential processor task
    pub fn spawn(bindings: ButtonBindings, actuator: SharedActuator) -> Self {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ControllerEvent>();

        let task = tokio::spawn(async move {
            debug!("Bindings processor started (sequential mode)");

            while let Some(event) = event_rx.recv().await {
                Self::handle_event(&bindings, &actuator, &event).await;
            }

            debug!("Bindings processor stopped");
        });

        Self { event_tx, task }
    }

    /// Listener forwarding button and trigger events to the processor
    pub fn listener(&self) -> EventCallback {
        let tx = self.event_tx.clone();
        Arc::new(move |event: &ControllerEvent| {
            if matches!(event, ControllerEvent::StickMoved { .. }) {
                return;
            }
            if let Err(e) = tx.send(event.clone()) {
                warn!("Failed to send controller event to bindings processor: {}", e);
            }
        })
    }

    /// Stop accepting events and wait for the queued ones to be handled
    ///
    /// Listeners handed out earlier keep the channel open; drop the monitor
    /// that owns them first.
    pub async fn shutdown(self) {
        drop(self.event_tx);
        if let Err(e) = self.task.await {
            warn!("Bindings processor task failed: {}", e);
        }
    }

    async fn handle_event(bindings: &ButtonBindings, actuator: &SharedActuator, event: &ControllerEvent) {
        match event {
            ControllerEvent::ButtonsPressed(buttons) => {
                for button in buttons {
                    match bindings.key_for(*button) {
                        Some(key) => {
                            debug!("Button {} pressed → key {}", button, key);
                            Self::report(
                                actuator.session().await.press_key(key).await,
                                "key press",
                            );
                        }
                        None => debug!("Button {} pressed (unbound)", button),
                    }
                }
            }
            ControllerEvent::ButtonsReleased(buttons) => {
                for button in buttons {
                    debug!("Button {} released", button);
                }
            }
            ControllerEvent::TriggerPressed(side) => match bindings.click_for(*side) {
                Some(mouse_button) => {
                    debug!("Trigger {:?} pressed → click {:?}", side, mouse_button);
                    Self::report(actuator.session().await.click(mouse_button).await, "click");
                }
                None => debug!("Trigger {:?} pressed (unbound)", side),
            },
            ControllerEvent::TriggerReleased(side) => {
                debug!("Trigger {:?} released", side);
            }
            ControllerEvent::StickMoved { .. } => {}
        }
    }

    fn report(result: ActuatorResult, what: &str) {
        if let Err(e) = result {
            warn!("Binding {} failed: {}", what, e);
        }
    }
}
