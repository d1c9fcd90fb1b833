use crate::game::star_power::MeterAnchor;

/// Per-session cursor. Everything here is derived from the sequence of
/// updates, so a reset followed by the same updates reproduces it exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineState {
    pub current_time: f64,
    pub last_update_time: f64,
    pub current_tick: u32,
    pub last_tick: u32,

    pub current_time_sig_index: usize,
    pub next_time_sig_index: usize,
    /// Star-power drain window for the active time signature.
    pub ticks_every_eight_measures: u32,
    /// Where the active meter was last set; ignored while star power is off.
    pub star_power_anchor: MeterAnchor,

    /// Position in the chart's chord-head sequence of the earliest unresolved note.
    pub note_cursor: usize,
    pub current_star_index: usize,

    pub current_solo_index: usize,
    pub is_solo_active: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            last_update_time: 0.0,
            current_tick: 0,
            last_tick: 0,
            current_time_sig_index: 0,
            next_time_sig_index: 1,
            ticks_every_eight_measures: 0,
            star_power_anchor: MeterAnchor::default(),
            note_cursor: 0,
            current_star_index: 0,
            current_solo_index: 0,
            is_solo_active: false,
        }
    }
}

impl EngineState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_returns_to_canonical_zero() {
        let mut state = EngineState {
            current_time: 3.0,
            current_tick: 900,
            note_cursor: 4,
            is_solo_active: true,
            next_time_sig_index: 3,
            star_power_anchor: MeterAnchor::new(0.5, 900),
            ..EngineState::default()
        };
        state.reset();
        assert_eq!(state, EngineState::default());
        assert_eq!(state.next_time_sig_index, 1);
    }
}
