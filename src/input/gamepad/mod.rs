//! Gamepad input: raw snapshots in, discrete controller events out
//!
//! Backends ([`XInputSource`], [`GilrsSource`], [`ReplaySource`]) produce
//! [`RawGamepadSnapshot`]s. The sampling thread diffs consecutive snapshots
//! and the [`ControllerStateMonitor`] turns each transition into events via
//! the button, stick and trigger detectors.

pub mod buttons;
pub mod monitor;
pub mod normalize;
pub mod provider;
pub mod replay;
pub mod snapshot;
pub mod trigger;

#[cfg(windows)]
pub mod gilrs_source;
#[cfg(windows)]
pub mod xinput_source;

pub use buttons::{ButtonEdgeDetector, ButtonEdgeSet};
pub use monitor::{ControllerEvent, ControllerStateMonitor, EventCallback, MonitorSettings};
pub use normalize::{StickNormalizer, StickSample};
pub use provider::{SamplerHandle, SamplerStatus, SnapshotSource, SourceError, SourceFactory};
pub use replay::{ReplayFrame, ReplaySource};
pub use snapshot::{ButtonId, RawGamepadSnapshot, StickId, TriggerSide};
pub use trigger::{TriggerEdge, TriggerHysteresis};

#[cfg(windows)]
pub use gilrs_source::GilrsSource;
#[cfg(windows)]
pub use xinput_source::XInputSource;
