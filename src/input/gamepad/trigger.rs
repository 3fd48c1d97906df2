//! Trigger press/release edges with a single threshold

use serde::{Deserialize, Serialize};

/// XInput trigger threshold below which input is ignored.
///
/// Triggers report 0-255; values at or below this threshold count as released.
pub const DEFAULT_TRIGGER_THRESHOLD: u8 = 30;

/// Trigger transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEdge {
    Pressed,
    Released,
}

/// Per-trigger hysteresis state
///
/// The same cutoff is used in both directions; chatter is suppressed by
/// only reporting a crossing that disagrees with the last reported state.
#[derive(Debug, Clone)]
pub struct TriggerHysteresis {
    threshold: u8,
    was_pressed: bool,
}

impl TriggerHysteresis {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            was_pressed: false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.was_pressed
    }

    /// Feed one raw pressure value, returning an edge if the state flipped
    pub fn update(&mut self, pressure: u8) -> Option<TriggerEdge> {
        let above = pressure > self.threshold;

        match (above, self.was_pressed) {
            (true, false) => {
                self.was_pressed = true;
                Some(TriggerEdge::Pressed)
            }
            (false, true) => {
                self.was_pressed = false;
                Some(TriggerEdge::Released)
            }
            _ => None,
        }
    }
}

impl Default for TriggerHysteresis {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_press_and_release() {
        let mut trigger = TriggerHysteresis::default();
        assert_eq!(trigger.update(0), None);
        assert_eq!(trigger.update(30), None); // at threshold is still released
        assert_eq!(trigger.update(31), Some(TriggerEdge::Pressed));
        assert!(trigger.is_pressed());
        assert_eq!(trigger.update(255), None);
        assert_eq!(trigger.update(100), None);
        assert_eq!(trigger.update(30), Some(TriggerEdge::Released));
        assert!(!trigger.is_pressed());
        assert_eq!(trigger.update(0), None);
    }

    proptest! {
        #[test]
        fn prop_edges_alternate(pressures in proptest::collection::vec(any::<u8>(), 0..200)) {
            let mut trigger = TriggerHysteresis::default();
            let mut last: Option<TriggerEdge> = None;

            for pressure in pressures {
                if let Some(edge) = trigger.update(pressure) {
                    match (last, edge) {
                        (None, TriggerEdge::Pressed) => {}
                        (Some(TriggerEdge::Pressed), TriggerEdge::Released) => {}
                        (Some(TriggerEdge::Released), TriggerEdge::Pressed) => {}
                        other => prop_assert!(false, "edges out of order: {:?}", other),
                    }
                    last = Some(edge);
                }
                prop_assert_eq!(trigger.is_pressed(), pressure > DEFAULT_TRIGGER_THRESHOLD);
            }
        }
    }
}
