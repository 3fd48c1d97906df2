//! Replay source: plays back recorded snapshots from a YAML file
//!
//! Lets the pipeline run on machines without a controller. The file is a
//! list of frames; each frame is a snapshot (missing fields are zero) held
//! for `hold_ms` before the next one:
//!
//! ```yaml
//! - thumb_rx: 20000
//!   hold_ms: 400
//! - buttons: 0x1000
//!   hold_ms: 100
//! - {}
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

use super::provider::{SnapshotSource, SourceError};
use super::snapshot::RawGamepadSnapshot;

fn default_hold_ms() -> u64 {
    100
}

/// One recorded frame
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReplayFrame {
    #[serde(flatten)]
    pub snapshot: RawGamepadSnapshot,
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
}

impl ReplayFrame {
    pub fn new(snapshot: RawGamepadSnapshot, hold_ms: u64) -> Self {
        Self { snapshot, hold_ms }
    }
}

/// Finite snapshot source over a list of frames
///
/// Reports [`SourceError::Exhausted`] once the last frame's hold has elapsed.
#[derive(Debug)]
pub struct ReplaySource {
    name: String,
    frames: Vec<ReplayFrame>,
    /// Index of the frame currently being held, `None` before the first poll
    position: Option<usize>,
    hold_until: Instant,
}

impl ReplaySource {
    pub fn from_frames(name: impl Into<String>, frames: Vec<ReplayFrame>) -> Self {
        Self {
            name: name.into(),
            frames,
            position: None,
            hold_until: Instant::now(),
        }
    }

    /// Parse frames from YAML text
    pub fn from_yaml_str(name: impl Into<String>, yaml: &str) -> Result<Self> {
        let frames: Vec<ReplayFrame> =
            serde_yaml::from_str(yaml).context("Failed to parse replay frames")?;
        Ok(Self::from_frames(name, frames))
    }

    /// Load frames from a YAML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read replay file: {}", path.display()))?;

        let source = Self::from_yaml_str(format!("replay:{}", path.display()), &content)
            .with_context(|| format!("Invalid replay file: {}", path.display()))?;

        debug!("Loaded {} replay frame(s) from {}", source.frames.len(), path.display());
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl SnapshotSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> Result<Option<RawGamepadSnapshot>, SourceError> {
        let now = Instant::now();
        if self.position.is_some() && now < self.hold_until {
            return Ok(None);
        }

        let next = self.position.map_or(0, |p| p + 1);
        let frame = self.frames.get(next).ok_or(SourceError::Exhausted)?;

        self.position = Some(next);
        self.hold_until = now + Duration::from_millis(frame.hold_ms);
        Ok(Some(frame.snapshot))
    }
}
