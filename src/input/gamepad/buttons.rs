//! Button bank edge detection
//!
//! Diffs two raw button bitmasks into the set of buttons that went down and
//! the set that came up. The scan walks all 16 bit positions from the most
//! significant bit down, so the output order is fixed no matter which bits
//! changed.

use super::snapshot::ButtonId;

/// Buttons that changed state between two samples
///
/// `pressed` and `released` are disjoint and each keeps scan order (MSB first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonEdgeSet {
    pub pressed: Vec<ButtonId>,
    pub released: Vec<ButtonId>,
}

impl ButtonEdgeSet {
    /// True when no mapped button changed
    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty() && self.released.is_empty()
    }
}

/// Stateless button bank differ
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonEdgeDetector;

impl ButtonEdgeDetector {
    /// Diff `prev` against `curr`
    ///
    /// Bits without a mapped [`ButtonId`] are diffed like any other bit but
    /// never reported.
    pub fn diff(prev: u16, curr: u16) -> ButtonEdgeSet {
        let changed = prev ^ curr;
        let mut edges = ButtonEdgeSet::default();

        let mut mask: u16 = 0x8000;
        for index in 1..=16u8 {
            if changed & mask != 0 {
                if let Some(button) = ButtonId::from_scan_index(index) {
                    if curr & mask != 0 {
                        edges.pressed.push(button);
                    } else {
                        edges.released.push(button);
                    }
                }
            }
            mask >>= 1;
        }

        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::gamepad::snapshot::button_flags;
    use proptest::prelude::*;

    #[test]
    fn test_single_press() {
        let edges = ButtonEdgeDetector::diff(0, button_flags::A);
        assert_eq!(edges.pressed, vec![ButtonId::A]);
        assert!(edges.released.is_empty());
    }

    #[test]
    fn test_no_change() {
        let edges = ButtonEdgeDetector::diff(button_flags::A, button_flags::A);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_simultaneous_press_and_release() {
        // A held -> B held: A released, B pressed in the same sample
        let edges = ButtonEdgeDetector::diff(button_flags::A, button_flags::B);
        assert_eq!(edges.pressed, vec![ButtonId::B]);
        assert_eq!(edges.released, vec![ButtonId::A]);
    }

    #[test]
    fn test_scan_order_is_msb_first() {
        let all = button_flags::Y | button_flags::A | button_flags::DPAD_UP | button_flags::START;
        let edges = ButtonEdgeDetector::diff(0, all);
        assert_eq!(
            edges.pressed,
            vec![ButtonId::Y, ButtonId::A, ButtonId::Start, ButtonId::DPadUp]
        );
    }

    #[test]
    fn test_press_detection_uses_the_changed_bit_only() {
        // X stays held while Y is released: Y must land in `released` even
        // though other bits of `curr` are set
        let edges = ButtonEdgeDetector::diff(
            button_flags::X | button_flags::Y,
            button_flags::X,
        );
        assert!(edges.pressed.is_empty());
        assert_eq!(edges.released, vec![ButtonId::Y]);
    }

    #[test]
    fn test_reserved_bits_are_ignored() {
        let edges = ButtonEdgeDetector::diff(0, 0x0800 | 0x0400);
        assert!(edges.is_empty());

        let edges = ButtonEdgeDetector::diff(0x0C00, 0x0C00 | button_flags::B);
        assert_eq!(edges.pressed, vec![ButtonId::B]);
    }

    proptest! {
        #[test]
        fn prop_edges_are_disjoint_and_cover_mapped_changes(prev in any::<u16>(), curr in any::<u16>()) {
            let edges = ButtonEdgeDetector::diff(prev, curr);

            for button in &edges.pressed {
                prop_assert!(!edges.released.contains(button));
                prop_assert!(curr & button.mask() != 0);
                prop_assert!(prev & button.mask() == 0);
            }
            for button in &edges.released {
                prop_assert!(prev & button.mask() != 0);
                prop_assert!(curr & button.mask() == 0);
            }

            let changed = prev ^ curr;
            for button in ButtonId::ALL {
                let in_sets = edges.pressed.contains(&button) || edges.released.contains(&button);
                prop_assert_eq!(in_sets, changed & button.mask() != 0);
            }
        }
    }
}
