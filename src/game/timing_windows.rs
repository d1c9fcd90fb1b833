// Shared hit window geometry so judgment and any visual consumers agree.

// All windows are in seconds.
pub const DEFAULT_HIT_WINDOW_S: f64 = 0.14;
pub const DEFAULT_FRONT_TO_BACK_RATIO: f64 = 1.0;

/// An asymmetric window around the strikeline.
///
/// `front_end` is always <= 0 and `back_end` always >= 0; both are offsets of
/// `note_time - now`, so `front_end` bounds late hits and `back_end` early
/// ones. A ratio of 1 splits the window evenly; higher ratios favour late hits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitWindow {
    /// Total width. Logic uses the ends, never this.
    pub size: f64,
    pub front_to_back_ratio: f64,
    pub front_end: f64,
    pub back_end: f64,
}

impl HitWindow {
    pub fn new(size: f64, front_to_back_ratio: f64) -> Self {
        debug_assert!(
            (0.0..=2.0).contains(&front_to_back_ratio),
            "front_to_back_ratio must be in [0, 2], got {front_to_back_ratio}"
        );
        let half = (size / 2.0).abs();
        Self {
            size,
            front_to_back_ratio,
            front_end: -(half * front_to_back_ratio),
            back_end: half * (2.0 - front_to_back_ratio),
        }
    }

    /// Strict on both ends.
    #[inline(always)]
    pub fn contains(&self, note_time: f64, now: f64) -> bool {
        let offset = note_time - now;
        offset > self.front_end && offset < self.back_end
    }

    /// The note can no longer enter the window as time moves forward.
    #[inline(always)]
    pub fn has_passed(&self, note_time: f64, now: f64) -> bool {
        note_time < now && !self.contains(note_time, now)
    }
}

impl Default for HitWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HIT_WINDOW_S, DEFAULT_FRONT_TO_BACK_RATIO)
    }
}
