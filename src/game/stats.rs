use serde::Serialize;

/// Accumulated results for a session. Only moves forward between resets.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineStats {
    pub score: u32,
    pub score_multiplier: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub notes_hit: u32,
    pub notes_missed: u32,
    pub stars: u32,

    /// 0.0..=1.0
    pub star_power_amount: f64,
    pub is_star_power_active: bool,
    pub phrases_hit: u32,
    pub phrases_missed: u32,

    /// Solo bonuses sit outside the multiplier and the star thresholds.
    pub solo_bonuses: u32,
}

impl Default for EngineStats {
    fn default() -> Self {
        Self {
            score: 0,
            score_multiplier: 1,
            combo: 0,
            max_combo: 0,
            notes_hit: 0,
            notes_missed: 0,
            stars: 0,
            star_power_amount: 0.0,
            is_star_power_active: false,
            phrases_hit: 0,
            phrases_missed: 0,
            solo_bonuses: 0,
        }
    }
}

impl EngineStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline(always)]
    pub fn total_score(&self) -> u32 {
        self.score + self.solo_bonuses
    }
}
