//! Raw gamepad snapshot and logical control identifiers
//!
//! A snapshot is the whole device state captured at one instant, laid out the
//! way XInput reports it: four signed stick axes, two pressure bytes and a
//! 16-bit button bank. Every backend converts into this layout so the
//! detectors downstream only ever see one format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// XInput button bit flags
///
/// rusty_xinput doesn't export individual button constants,
/// so they are defined here from the XINPUT_GAMEPAD layout.
pub mod button_flags {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Whole-gamepad state at one instant
///
/// The all-zero value is the rest state (sticks centered, triggers and
/// buttons released).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct RawGamepadSnapshot {
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub buttons: u16,
}

impl RawGamepadSnapshot {
    /// Raw axes of one stick as `(x, y)`
    pub fn stick(&self, stick: StickId) -> (i16, i16) {
        match stick {
            StickId::Left => (self.thumb_lx, self.thumb_ly),
            StickId::Right => (self.thumb_rx, self.thumb_ry),
        }
    }

    /// Raw pressure of one trigger
    pub fn trigger(&self, side: TriggerSide) -> u8 {
        match side {
            TriggerSide::Left => self.left_trigger,
            TriggerSide::Right => self.right_trigger,
        }
    }
}

/// Stick identifier
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StickId {
    Left,
    Right,
}

/// Trigger identifier
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSide {
    Left,
    Right,
}

/// Logical button identifier
///
/// The discriminant is the scan index used by the edge detector: index 1 is
/// the most significant bit of the button bank, index 16 the least
/// significant. Indices 5 and 6 are reserved bits with no button behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ButtonId {
    Y = 1,
    X = 2,
    B = 3,
    A = 4,
    RightBumper = 7,
    LeftBumper = 8,
    RightThumb = 9,
    LeftThumb = 10,
    Back = 11,
    Start = 12,
    DPadRight = 13,
    DPadLeft = 14,
    DPadDown = 15,
    DPadUp = 16,
}

impl ButtonId {
    /// Every mapped button in scan order (MSB first)
    pub const ALL: [ButtonId; 14] = [
        ButtonId::Y,
        ButtonId::X,
        ButtonId::B,
        ButtonId::A,
        ButtonId::RightBumper,
        ButtonId::LeftBumper,
        ButtonId::RightThumb,
        ButtonId::LeftThumb,
        ButtonId::Back,
        ButtonId::Start,
        ButtonId::DPadRight,
        ButtonId::DPadLeft,
        ButtonId::DPadDown,
        ButtonId::DPadUp,
    ];

    /// Look up the button behind a scan index
    ///
    /// Returns `None` for index 0 (the "empty" identifier), the reserved
    /// indices and anything past 16.
    pub fn from_scan_index(index: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| *b as u8 == index)
    }

    /// Bit mask of this button in the raw button bank
    pub fn mask(self) -> u16 {
        0x8000 >> (self as u8 - 1)
    }

    /// Stable snake_case name, as used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            ButtonId::Y => "y",
            ButtonId::X => "x",
            ButtonId::B => "b",
            ButtonId::A => "a",
            ButtonId::RightBumper => "right_bumper",
            ButtonId::LeftBumper => "left_bumper",
            ButtonId::RightThumb => "right_thumb",
            ButtonId::LeftThumb => "left_thumb",
            ButtonId::Back => "back",
            ButtonId::Start => "start",
            ButtonId::DPadRight => "d_pad_right",
            ButtonId::DPadLeft => "d_pad_left",
            ButtonId::DPadDown => "d_pad_down",
            ButtonId::DPadUp => "d_pad_up",
        }
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_match_xinput_layout() {
        assert_eq!(ButtonId::Y.mask(), button_flags::Y);
        assert_eq!(ButtonId::X.mask(), button_flags::X);
        assert_eq!(ButtonId::B.mask(), button_flags::B);
        assert_eq!(ButtonId::A.mask(), button_flags::A);
        assert_eq!(ButtonId::RightBumper.mask(), button_flags::RIGHT_SHOULDER);
        assert_eq!(ButtonId::LeftBumper.mask(), button_flags::LEFT_SHOULDER);
        assert_eq!(ButtonId::RightThumb.mask(), button_flags::RIGHT_THUMB);
        assert_eq!(ButtonId::LeftThumb.mask(), button_flags::LEFT_THUMB);
        assert_eq!(ButtonId::Back.mask(), button_flags::BACK);
        assert_eq!(ButtonId::Start.mask(), button_flags::START);
        assert_eq!(ButtonId::DPadRight.mask(), button_flags::DPAD_RIGHT);
        assert_eq!(ButtonId::DPadLeft.mask(), button_flags::DPAD_LEFT);
        assert_eq!(ButtonId::DPadDown.mask(), button_flags::DPAD_DOWN);
        assert_eq!(ButtonId::DPadUp.mask(), button_flags::DPAD_UP);
    }

    #[test]
    fn test_reserved_indices_are_unmapped() {
        assert_eq!(ButtonId::from_scan_index(0), None);
        assert_eq!(ButtonId::from_scan_index(5), None);
        assert_eq!(ButtonId::from_scan_index(6), None);
        assert_eq!(ButtonId::from_scan_index(17), None);
        assert_eq!(ButtonId::from_scan_index(4), Some(ButtonId::A));
        assert_eq!(ButtonId::from_scan_index(16), Some(ButtonId::DPadUp));
    }

    #[test]
    fn test_button_names_round_trip_through_yaml() {
        for button in ButtonId::ALL {
            let yaml = serde_yaml::to_string(&button).unwrap();
            assert_eq!(yaml.trim(), button.name());
        }
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = RawGamepadSnapshot {
            thumb_lx: 1,
            thumb_ly: 2,
            thumb_rx: 3,
            thumb_ry: 4,
            left_trigger: 5,
            right_trigger: 6,
            buttons: 0,
        };
        assert_eq!(snapshot.stick(StickId::Left), (1, 2));
        assert_eq!(snapshot.stick(StickId::Right), (3, 4));
        assert_eq!(snapshot.trigger(TriggerSide::Left), 5);
        assert_eq!(snapshot.trigger(TriggerSide::Right), 6);
    }
}
