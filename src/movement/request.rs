//! Movement requests and the single-entry slots that hold them
//!
//! The sampling thread overwrites a slot's `current` request whenever a stick
//! moves; the tick loop reads it at its own pace. There is no queue: a burst
//! of samples between two ticks collapses to the latest one.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::input::gamepad::StickSample;

/// `normMag` above which a stick counts as pushed hard
pub const FULL_SCALE_THRESHOLD: f32 = 0.8;

/// Two-step scale applied to cursor speed and champion distance
pub fn scale_for(magnitude: f32) -> f64 {
    if magnitude <= FULL_SCALE_THRESHOLD {
        0.5
    } else {
        1.0
    }
}

/// Something a channel slot can hold
pub trait MovementRequest: Send + Sync {
    /// The request the slot starts with
    fn at_rest() -> Self;

    fn sample(&self) -> &StickSample;

    fn is_release(&self) -> bool {
        self.sample().released
    }
}

/// Pointer request
#[derive(Debug, Clone, PartialEq)]
pub struct CursorRequest {
    pub sample: StickSample,
    pub sensitivity: f64,
}

impl CursorRequest {
    pub fn new(sample: StickSample) -> Self {
        Self {
            sensitivity: scale_for(sample.magnitude),
            sample,
        }
    }
}

impl MovementRequest for CursorRequest {
    fn at_rest() -> Self {
        Self::new(StickSample::RELEASED)
    }

    fn sample(&self) -> &StickSample {
        &self.sample
    }
}

/// Locomotion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChampionRequest {
    pub sample: StickSample,
    pub distance: f64,
    /// Bypasses the champion throttle. Always false: heading changes are not detected.
    pub urgent: bool,
}

impl ChampionRequest {
    pub fn new(sample: StickSample) -> Self {
        Self {
            distance: scale_for(sample.magnitude),
            sample,
            urgent: false,
        }
    }
}

impl MovementRequest for ChampionRequest {
    fn at_rest() -> Self {
        Self::new(StickSample::RELEASED)
    }

    fn sample(&self) -> &StickSample {
        &self.sample
    }
}

#[derive(Debug)]
struct SlotState<R> {
    current: Arc<R>,
    previous: Arc<R>,
}

/// Latest-wins request slot for one channel
///
/// Staleness is pointer identity: every submit allocates a fresh `Arc`, so
/// `current` and `previous` are the same allocation exactly when nothing was
/// submitted since the last tick. Two equal-valued submissions are still two
/// distinct requests.
#[derive(Debug)]
pub struct RequestSlot<R> {
    state: Mutex<SlotState<R>>,
}

impl<R: MovementRequest> RequestSlot<R> {
    /// Start at rest with nothing pending
    pub fn new() -> Self {
        let initial = Arc::new(R::at_rest());
        Self {
            state: Mutex::new(SlotState {
                current: initial.clone(),
                previous: initial,
            }),
        }
    }

    /// Replace the current request
    pub fn submit(&self, request: R) {
        self.state.lock().current = Arc::new(request);
    }

    /// Consume the slot for one tick
    ///
    /// Marks the current request as seen and returns it unless it was already
    /// seen and is a release, i.e. unless the channel is idle.
    pub fn take(&self) -> Option<Arc<R>> {
        let mut state = self.state.lock();
        let stale = Arc::ptr_eq(&state.current, &state.previous);
        let at_rest = state.current.is_release();
        state.previous = state.current.clone();

        if stale && at_rest {
            None
        } else {
            Some(state.current.clone())
        }
    }

    /// Current request without consuming it
    pub fn peek(&self) -> Arc<R> {
        self.state.lock().current.clone()
    }
}

impl<R: MovementRequest> Default for RequestSlot<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Both channel slots, shared between the sampler and the tick loop
#[derive(Debug, Default)]
pub struct MovementSlots {
    pub cursor: RequestSlot<CursorRequest>,
    pub champion: RequestSlot<ChampionRequest>,
}

impl MovementSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit_cursor(&self, sample: StickSample) {
        self.cursor.submit(CursorRequest::new(sample));
    }

    pub fn submit_champion(&self, sample: StickSample) {
        self.champion.submit(ChampionRequest::new(sample));
    }
}
