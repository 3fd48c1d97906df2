//! Stick normalization with a radial deadzone
//!
//! Converts raw XInput stick axes into a unit direction plus a
//! deadzone-compensated magnitude.
//!
//! # Stick Normalization
//!
//! Uses a radial (circular) deadzone rather than a per-axis (square) one, so
//! diagonals reach full magnitude and the response is the same in every
//! direction. The normalizer is stateful: leaving the deadzone produces a
//! stream of samples, coming back into it produces exactly one "released"
//! sample, and resting inside it produces nothing at all.

use serde::{Deserialize, Serialize};

/// Default stick deadzone radius on the raw ±32767 scale.
pub const DEFAULT_STICK_DEADZONE: f32 = 7300.0;

/// Magnitude at which a stick counts as fully deflected.
///
/// Diagonals can exceed this (up to ~46340) and are clipped.
pub const DEFAULT_STICK_MAX: f32 = 32767.0;

/// Normalized analog stick sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct StickSample {
    /// Direction X in [-1.0, 1.0]
    pub x: f32,
    /// Direction Y in [-1.0, 1.0], device-up is negative
    pub y: f32,
    /// Deadzone-compensated magnitude in (0.0, 1.0], 0.0 when released
    pub magnitude: f32,
    /// Stick has come back to rest
    pub released: bool,
}

impl StickSample {
    /// The at-rest marker: all components zero
    pub const RELEASED: StickSample = StickSample {
        x: 0.0,
        y: 0.0,
        magnitude: 0.0,
        released: true,
    };
}

/// Stateful stick normalizer (one per physical stick)
#[derive(Debug, Clone)]
pub struct StickNormalizer {
    deadzone: f32,
    max: f32,
    was_moving: bool,
}

impl StickNormalizer {
    /// Create a normalizer
    ///
    /// # Arguments
    /// * `deadzone` - Radius below which the stick is at rest
    /// * `max` - Magnitude mapped to 1.0, must be greater than `deadzone`
    pub fn new(deadzone: f32, max: f32) -> Self {
        Self {
            deadzone,
            max,
            was_moving: false,
        }
    }

    /// Whether the last emitted sample was a deflection
    pub fn is_moving(&self) -> bool {
        self.was_moving
    }

    /// Feed one raw sample
    ///
    /// # Returns
    /// * `Some(sample)` with `released: false` while outside the deadzone
    /// * `Some(StickSample::RELEASED)` once, on the first sample back inside
    /// * `None` while resting (nothing changed)
    pub fn update(&mut self, raw_x: i16, raw_y: i16) -> Option<StickSample> {
        let x = raw_x as f32;
        let y = raw_y as f32;
        let magnitude = (x * x + y * y).sqrt();

        // A zero vector has no direction; treat it as rest before any division
        if magnitude == 0.0 || magnitude <= self.deadzone {
            if self.was_moving {
                self.was_moving = false;
                return Some(StickSample::RELEASED);
            }
            return None;
        }

        let clipped = magnitude.min(self.max);
        let norm_mag = ((clipped - self.deadzone) / (self.max - self.deadzone)).clamp(0.0, 1.0);

        self.was_moving = true;

        Some(StickSample {
            x: (x / magnitude).clamp(-1.0, 1.0),
            y: (-y / magnitude).clamp(-1.0, 1.0),
            magnitude: norm_mag,
            released: false,
        })
    }
}

impl Default for StickNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_STICK_DEADZONE, DEFAULT_STICK_MAX)
    }
}
