//! Controller state monitor
//!
//! Turns whole-gamepad snapshot transitions into discrete events by running
//! the button, stick and trigger detectors over the fields that changed.
//! Events are returned to the caller and also dispatched synchronously to
//! every subscribed listener, in subscription order, on the calling thread.

use std::sync::Arc;
use tracing::{debug, trace};

use super::buttons::ButtonEdgeDetector;
use super::normalize::{StickNormalizer, StickSample, DEFAULT_STICK_DEADZONE, DEFAULT_STICK_MAX};
use super::snapshot::{ButtonId, RawGamepadSnapshot, StickId, TriggerSide};
use super::trigger::{TriggerEdge, TriggerHysteresis, DEFAULT_TRIGGER_THRESHOLD};
use crate::config::MonitorConfig;

/// Discrete controller event
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Stick deflected, or came back to rest (`sample.released`)
    StickMoved { stick: StickId, sample: StickSample },
    TriggerPressed(TriggerSide),
    TriggerReleased(TriggerSide),
    /// Buttons that went down in one transition (never empty)
    ButtonsPressed(Vec<ButtonId>),
    /// Buttons that came up in one transition (never empty)
    ButtonsReleased(Vec<ButtonId>),
}

/// Callback type for controller events
pub type EventCallback = Arc<dyn Fn(&ControllerEvent) + Send + Sync>;

/// Detector thresholds
#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub stick_deadzone: f32,
    pub stick_max: f32,
    pub trigger_threshold: u8,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            stick_deadzone: DEFAULT_STICK_DEADZONE,
            stick_max: DEFAULT_STICK_MAX,
            trigger_threshold: DEFAULT_TRIGGER_THRESHOLD,
        }
    }
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            stick_deadzone: config.stick_deadzone,
            stick_max: config.stick_max,
            trigger_threshold: config.trigger_threshold,
        }
    }
}

/// Raw-to-event translator for one gamepad
///
/// Holds the per-stick "was moving" and per-trigger "was pressed" state, so
/// transitions must be fed serially from a single sampling source.
pub struct ControllerStateMonitor {
    left_stick: StickNormalizer,
    right_stick: StickNormalizer,
    left_trigger: TriggerHysteresis,
    right_trigger: TriggerHysteresis,
    listeners: Vec<EventCallback>,
}

impl ControllerStateMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        debug!("Creating controller monitor with settings: {:?}", settings);
        Self {
            left_stick: StickNormalizer::new(settings.stick_deadzone, settings.stick_max),
            right_stick: StickNormalizer::new(settings.stick_deadzone, settings.stick_max),
            left_trigger: TriggerHysteresis::new(settings.trigger_threshold),
            right_trigger: TriggerHysteresis::new(settings.trigger_threshold),
            listeners: Vec::new(),
        }
    }

    /// Subscribe to controller events
    pub fn subscribe(&mut self, callback: EventCallback) {
        self.listeners.push(callback);
    }

    /// Process one `prev -> curr` transition
    ///
    /// Event order: left stick, right stick, left trigger, right trigger,
    /// pressed buttons, released buttons.
    pub fn process(
        &mut self,
        prev: &RawGamepadSnapshot,
        curr: &RawGamepadSnapshot,
    ) -> Vec<ControllerEvent> {
        let mut events = Vec::new();

        if prev == curr {
            trace!("Snapshot unchanged, nothing to do");
            return events;
        }

        for stick in [StickId::Left, StickId::Right] {
            if prev.stick(stick) != curr.stick(stick) {
                let (x, y) = curr.stick(stick);
                if let Some(sample) = self.normalizer(stick).update(x, y) {
                    events.push(ControllerEvent::StickMoved { stick, sample });
                }
            }
        }

        for side in [TriggerSide::Left, TriggerSide::Right] {
            if prev.trigger(side) != curr.trigger(side) {
                match self.hysteresis(side).update(curr.trigger(side)) {
                    Some(TriggerEdge::Pressed) => events.push(ControllerEvent::TriggerPressed(side)),
                    Some(TriggerEdge::Released) => events.push(ControllerEvent::TriggerReleased(side)),
                    None => {}
                }
            }
        }

        if prev.buttons != curr.buttons {
            let edges = ButtonEdgeDetector::diff(prev.buttons, curr.buttons);
            if !edges.pressed.is_empty() {
                events.push(ControllerEvent::ButtonsPressed(edges.pressed));
            }
            if !edges.released.is_empty() {
                events.push(ControllerEvent::ButtonsReleased(edges.released));
            }
        }

        for event in &events {
            debug!("Controller event: {:?}", event);
            for callback in &self.listeners {
                callback(event);
            }
        }

        events
    }

    fn normalizer(&mut self, stick: StickId) -> &mut StickNormalizer {
        match stick {
            StickId::Left => &mut self.left_stick,
            StickId::Right => &mut self.right_stick,
        }
    }

    fn hysteresis(&mut self, side: TriggerSide) -> &mut TriggerHysteresis {
        match side {
            TriggerSide::Left => &mut self.left_trigger,
            TriggerSide::Right => &mut self.right_trigger,
        }
    }
}

impl Default for ControllerStateMonitor {
    fn default() -> Self {
        Self::new(MonitorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::gamepad::snapshot::button_flags;
    use parking_lot::Mutex;

    fn snapshot() -> RawGamepadSnapshot {
        RawGamepadSnapshot::default()
    }

    #[test]
    fn test_identical_snapshots_emit_nothing() {
        let mut monitor = ControllerStateMonitor::default();
        let state = RawGamepadSnapshot { thumb_rx: 20000, ..snapshot() };
        assert!(monitor.process(&state, &state).is_empty());
    }

    #[test]
    fn test_right_stick_move_and_release() {
        let mut monitor = ControllerStateMonitor::default();
        let rest = snapshot();
        let moved = RawGamepadSnapshot { thumb_rx: 20000, ..snapshot() };

        let events = monitor.process(&rest, &moved);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ControllerEvent::StickMoved { stick, sample } => {
                assert_eq!(*stick, StickId::Right);
                assert!(!sample.released);
                assert!((sample.x - 1.0).abs() < 1e-6);
            }
            other => panic!("Expected stick event, got {:?}", other),
        }

        let events = monitor.process(&moved, &rest);
        assert_eq!(
            events,
            vec![ControllerEvent::StickMoved { stick: StickId::Right, sample: StickSample::RELEASED }]
        );

        // Jitter inside the deadzone after the release stays silent
        let jitter = RawGamepadSnapshot { thumb_rx: 120, ..snapshot() };
        assert!(monitor.process(&rest, &jitter).is_empty());
    }

    #[test]
    fn test_sticks_are_independent() {
        let mut monitor = ControllerStateMonitor::default();
        let rest = snapshot();
        let left = RawGamepadSnapshot { thumb_ly: -30000, ..snapshot() };
        let both = RawGamepadSnapshot { thumb_rx: 30000, ..left };

        monitor.process(&rest, &left);
        let events = monitor.process(&left, &both);
        // Left stick did not change, only the right stick reports
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ControllerEvent::StickMoved { stick: StickId::Right, .. }));
    }

    #[test]
    fn test_both_triggers_report_edges() {
        let mut monitor = ControllerStateMonitor::default();
        let rest = snapshot();
        let pulled = RawGamepadSnapshot { left_trigger: 200, right_trigger: 90, ..snapshot() };
        let eased = RawGamepadSnapshot { left_trigger: 180, right_trigger: 10, ..snapshot() };

        assert_eq!(
            monitor.process(&rest, &pulled),
            vec![
                ControllerEvent::TriggerPressed(TriggerSide::Left),
                ControllerEvent::TriggerPressed(TriggerSide::Right),
            ]
        );
        assert_eq!(
            monitor.process(&pulled, &eased),
            vec![ControllerEvent::TriggerReleased(TriggerSide::Right)]
        );
    }

    #[test]
    fn test_button_sets_and_order() {
        let mut monitor = ControllerStateMonitor::default();
        let prev = RawGamepadSnapshot { buttons: button_flags::A, ..snapshot() };
        let curr = RawGamepadSnapshot {
            buttons: button_flags::B | button_flags::START,
            thumb_lx: 25000,
            ..snapshot()
        };

        let events = monitor.process(&prev, &curr);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ControllerEvent::StickMoved { stick: StickId::Left, .. }));
        assert_eq!(events[1], ControllerEvent::ButtonsPressed(vec![ButtonId::B, ButtonId::Start]));
        assert_eq!(events[2], ControllerEvent::ButtonsReleased(vec![ButtonId::A]));
    }

    #[test]
    fn test_unmapped_bits_produce_no_button_event() {
        let mut monitor = ControllerStateMonitor::default();
        let curr = RawGamepadSnapshot { buttons: 0x0800, ..snapshot() };
        assert!(monitor.process(&snapshot(), &curr).is_empty());
    }

    #[test]
    fn test_listeners_receive_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ControllerStateMonitor::default();

        for tag in ["first", "second"] {
            let seen = seen.clone();
            monitor.subscribe(Arc::new(move |event: &ControllerEvent| {
                seen.lock().push((tag, event.clone()));
            }));
        }

        let curr = RawGamepadSnapshot { buttons: button_flags::X, right_trigger: 255, ..snapshot() };
        monitor.process(&snapshot(), &curr);

        let seen = seen.lock();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], ("first", ControllerEvent::TriggerPressed(TriggerSide::Right)));
        assert_eq!(seen[1], ("second", ControllerEvent::TriggerPressed(TriggerSide::Right)));
        assert_eq!(seen[2], ("first", ControllerEvent::ButtonsPressed(vec![ButtonId::X])));
        assert_eq!(seen[3], ("second", ControllerEvent::ButtonsPressed(vec![ButtonId::X])));
    }
}
