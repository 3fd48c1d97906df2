//! XInput snapshot source (Windows)
//!
//! Polls one XInput user index and reports a snapshot whenever the driver's
//! packet number moves.

use rusty_xinput::{XInputHandle, XInputState, XInputUsageError};
use tracing::{debug, info};

use super::provider::{SnapshotSource, SourceError};
use super::snapshot::RawGamepadSnapshot;

impl From<&XInputState> for RawGamepadSnapshot {
    fn from(state: &XInputState) -> Self {
        Self {
            thumb_lx: state.raw.Gamepad.sThumbLX,
            thumb_ly: state.raw.Gamepad.sThumbLY,
            thumb_rx: state.raw.Gamepad.sThumbRX,
            thumb_ry: state.raw.Gamepad.sThumbRY,
            left_trigger: state.left_trigger(),
            right_trigger: state.right_trigger(),
            buttons: state.raw.Gamepad.wButtons,
        }
    }
}

/// XInput-backed source for a single controller
pub struct XInputSource {
    handle: XInputHandle,
    user_index: u32,
    name: String,
    last_packet: Option<u32>,
}

impl XInputSource {
    /// Load the XInput library and check the controller is present
    pub fn open(user_index: u32) -> Result<Self, SourceError> {
        let handle = XInputHandle::load_default()
            .map_err(|e| SourceError::Backend(format!("XInput library not available: {:?}", e)))?;

        match handle.get_state(user_index) {
            Ok(_) => info!("XInput controller {} connected", user_index + 1),
            Err(XInputUsageError::DeviceNotConnected) => return Err(SourceError::Disconnected),
            Err(e) => return Err(SourceError::Backend(format!("{:?}", e))),
        }

        Ok(Self {
            handle,
            user_index,
            name: format!("XInput Controller {}", user_index + 1),
            last_packet: None,
        })
    }
}

impl SnapshotSource for XInputSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> Result<Option<RawGamepadSnapshot>, SourceError> {
        let state = match self.handle.get_state(self.user_index) {
            Ok(state) => state,
            Err(XInputUsageError::DeviceNotConnected) => {
                debug!("XInput controller {} not connected", self.user_index + 1);
                return Err(SourceError::Disconnected);
            }
            Err(e) => return Err(SourceError::Backend(format!("{:?}", e))),
        };

        // Same packet number means the driver has nothing new
        let packet = state.raw.dwPacketNumber;
        if self.last_packet == Some(packet) {
            return Ok(None);
        }
        self.last_packet = Some(packet);

        Ok(Some(RawGamepadSnapshot::from(&state)))
    }
}
