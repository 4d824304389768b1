//! Wheel position tracking from quadrature encoder edges.
//!
//! Both counters live in one 64-bit atomic (left in the low half, right in
//! the high half), so the interrupt callbacks and the sampling loop never
//! need a lock and a snapshot can never mix an old left with a new right.

use std::sync::atomic::{AtomicU64, Ordering};

use rppal::gpio::Level;

/// Cumulative wheel travel in encoder steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderState {
    pub left_steps: i32,
    pub right_steps: i32,
}

impl EncoderState {
    pub fn new(left_steps: i32, right_steps: i32) -> Self {
        Self {
            left_steps,
            right_steps,
        }
    }

    /// Steps travelled by each wheel since `earlier`.
    ///
    /// Wrapping arithmetic keeps the deltas right even when a counter rolls
    /// over between the two snapshots.
    pub fn delta_since(&self, earlier: &EncoderState) -> (i32, i32) {
        (
            self.left_steps.wrapping_sub(earlier.left_steps),
            self.right_steps.wrapping_sub(earlier.right_steps),
        )
    }

    fn pack(self) -> u64 {
        (self.left_steps as u32 as u64) | ((self.right_steps as u32 as u64) << 32)
    }

    fn unpack(packed: u64) -> Self {
        Self {
            left_steps: packed as u32 as i32,
            right_steps: (packed >> 32) as u32 as i32,
        }
    }
}

/// Step applied to the left wheel for a rising edge on phase A.
pub fn left_step(phase_b: Level) -> i32 {
    match phase_b {
        Level::Low => 1,
        Level::High => -1,
    }
}

/// The right encoder is mounted mirrored, so its sign is flipped: both
/// wheels count up when the robot drives forward.
pub fn right_step(phase_b: Level) -> i32 {
    -left_step(phase_b)
}

pub struct EncoderTracker {
    steps: AtomicU64,
}

impl EncoderTracker {
    pub fn new() -> Self {
        Self::with_state(EncoderState::default())
    }

    pub fn with_state(state: EncoderState) -> Self {
        Self {
            steps: AtomicU64::new(state.pack()),
        }
    }

    /// Rising edge on the left phase A line. `phase_b` is the level of the
    /// paired phase B line at the time of the edge.
    pub fn on_edge_left(&self, phase_b: Level) {
        self.apply(left_step(phase_b), 0);
    }

    /// Rising edge on the right phase A line.
    pub fn on_edge_right(&self, phase_b: Level) {
        self.apply(0, right_step(phase_b));
    }

    /// Consistent copy of both counters.
    pub fn snapshot(&self) -> EncoderState {
        EncoderState::unpack(self.steps.load(Ordering::Acquire))
    }

    // The CAS only retries when the other wheel's callback lands in the
    // same instant, so it completes in one or two iterations. The closure
    // always returns Some, so fetch_update cannot fail.
    fn apply(&self, left: i32, right: i32) {
        self
            .steps
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |packed| {
                let state = EncoderState::unpack(packed);
                Some(
                    EncoderState {
                        left_steps: state.left_steps.wrapping_add(left),
                        right_steps: state.right_steps.wrapping_add(right),
                    }
                    .pack(),
                )
            })
            .ok();
    }
}

impl Default for EncoderTracker {
    fn default() -> Self {
        Self::new()
    }
}
