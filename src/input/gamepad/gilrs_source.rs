//! gilrs snapshot source (Windows, non-XInput controllers)
//!
//! Follows the first connected gamepad and rebuilds an XInput-layout snapshot
//! from gilrs' cached state after pumping its event queue.
//!
//! # Physical Layout Mapping
//!
//! gilrs reports face buttons by position. Third-party pads (FaceOff, 8BitDo)
//! use the Nintendo layout, so positions map to Xbox names as:
//!
//! ```text
//!       [X/North]
//!   [Y/West] [A/East]
//!       [B/South]
//! ```

use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use tracing::{debug, info};

use super::provider::{SnapshotSource, SourceError};
use super::snapshot::{button_flags, RawGamepadSnapshot};

const BUTTON_MAP: [(Button, u16); 14] = [
    (Button::East, button_flags::A),
    (Button::South, button_flags::B),
    (Button::North, button_flags::X),
    (Button::West, button_flags::Y),
    (Button::LeftTrigger, button_flags::LEFT_SHOULDER),
    (Button::RightTrigger, button_flags::RIGHT_SHOULDER),
    (Button::Select, button_flags::BACK),
    (Button::Start, button_flags::START),
    (Button::LeftThumb, button_flags::LEFT_THUMB),
    (Button::RightThumb, button_flags::RIGHT_THUMB),
    (Button::DPadUp, button_flags::DPAD_UP),
    (Button::DPadDown, button_flags::DPAD_DOWN),
    (Button::DPadLeft, button_flags::DPAD_LEFT),
    (Button::DPadRight, button_flags::DPAD_RIGHT),
];

/// Scale a gilrs axis value (-1.0..=1.0) to the XInput stick range
fn axis_to_raw(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Scale a gilrs trigger value (0.0..=1.0) to the XInput pressure byte
fn trigger_to_raw(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8
}

/// gilrs-backed source for the first connected gamepad
pub struct GilrsSource {
    gilrs: Gilrs,
    id: GamepadId,
    name: String,
}

impl GilrsSource {
    /// Initialize gilrs and pick the first connected gamepad
    pub fn open() -> Result<Self, SourceError> {
        let mut gilrs =
            Gilrs::new().map_err(|e| SourceError::Backend(format!("gilrs initialization failed: {}", e)))?;

        // Drain startup events so connection state is current
        while gilrs.next_event().is_some() {}

        let (id, name) = gilrs
            .gamepads()
            .find(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .ok_or(SourceError::Disconnected)?;

        info!("gilrs gamepad connected: \"{}\"", name);
        Ok(Self { gilrs, id, name })
    }

    fn snapshot(&self) -> RawGamepadSnapshot {
        let gamepad = self.gilrs.gamepad(self.id);

        let buttons = BUTTON_MAP
            .iter()
            .filter(|(button, _)| gamepad.is_pressed(*button))
            .fold(0u16, |bits, (_, flag)| bits | flag);

        let trigger = |button: Button, axis: Axis| {
            let pressure = gamepad
                .button_data(button)
                .map(|data| data.value())
                .unwrap_or_else(|| (gamepad.value(axis) + 1.0) / 2.0);
            trigger_to_raw(pressure)
        };

        RawGamepadSnapshot {
            thumb_lx: axis_to_raw(gamepad.value(Axis::LeftStickX)),
            thumb_ly: axis_to_raw(gamepad.value(Axis::LeftStickY)),
            thumb_rx: axis_to_raw(gamepad.value(Axis::RightStickX)),
            thumb_ry: axis_to_raw(gamepad.value(Axis::RightStickY)),
            left_trigger: trigger(Button::LeftTrigger2, Axis::LeftZ),
            right_trigger: trigger(Button::RightTrigger2, Axis::RightZ),
            buttons,
        }
    }
}

impl SnapshotSource for GilrsSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> Result<Option<RawGamepadSnapshot>, SourceError> {
        let mut changed = false;

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if id != self.id {
                continue;
            }
            match event {
                EventType::Disconnected => {
                    debug!("gilrs gamepad disconnected: \"{}\"", self.name);
                    return Err(SourceError::Disconnected);
                }
                EventType::ButtonPressed(..)
                | EventType::ButtonReleased(..)
                | EventType::ButtonChanged(..)
                | EventType::AxisChanged(..) => changed = true,
                _ => {}
            }
        }

        Ok(changed.then(|| self.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_scaling() {
        assert_eq!(axis_to_raw(0.0), 0);
        assert_eq!(axis_to_raw(1.0), i16::MAX);
        assert_eq!(axis_to_raw(-1.0), -i16::MAX);
        assert_eq!(axis_to_raw(2.0), i16::MAX);
    }

    #[test]
    fn test_trigger_scaling() {
        assert_eq!(trigger_to_raw(0.0), 0);
        assert_eq!(trigger_to_raw(1.0), 255);
        assert_eq!(trigger_to_raw(-0.5), 0);
    }

    #[test]
    fn test_button_map_covers_every_mapped_bit_once() {
        let combined = BUTTON_MAP.iter().fold(0u16, |bits, (_, flag)| {
            assert_eq!(bits & flag, 0);
            bits | flag
        });
        assert_eq!(combined.count_ones(), 14);
    }
}
