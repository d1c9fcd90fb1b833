use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A timestamped logical action. How physical devices map onto `action` is
/// decided outside the engine; judgment strategies interpret the numbers.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct GameInput {
    pub time: f64,
    pub action: i32,
    pub value: i32,
}

impl GameInput {
    /// Placeholder held as the current input before anything was consumed.
    pub const NONE: Self = Self { time: -9999.0, action: -9999, value: -9999 };

    pub const fn new(time: f64, action: i32, value: i32) -> Self {
        Self { time, action, value }
    }

    #[inline(always)]
    pub const fn button(&self) -> bool {
        self.value != 0
    }
}

/// FIFO of inputs waiting for the next input-driven update.
///
/// Inputs are consumed strictly in enqueue order and never sorted; callers
/// must push them with non-decreasing timestamps.
#[derive(Clone, Debug, Default)]
pub struct InputQueue {
    pending: VecDeque<GameInput>,
}

impl InputQueue {
    #[inline(always)]
    pub fn push(&mut self, input: GameInput) {
        self.pending.push_back(input);
    }

    #[inline(always)]
    pub fn pop(&mut self) -> Option<GameInput> {
        self.pending.pop_front()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
