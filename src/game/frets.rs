use crate::game::chart::Chart;
use crate::game::input::GameInput;
use crate::game::judgment::{ChordPolicy, DEFAULT_MAX_MULTIPLIER, JudgeContext, Judgment, UpdateKind};
use crate::game::note::{Note, NoteIndex};

/// Frets are actions `0..FRET_COUNT`; press sets the bit, release clears it.
pub const FRET_COUNT: i32 = 5;
pub const STRUM_ACTION: i32 = 5;
pub const STAR_POWER_ACTION: i32 = 6;

/// Bitmask of the lanes a chord needs held.
pub fn chord_mask(chart: &Chart, head: NoteIndex) -> u8 {
    chart
        .chord_members(head)
        .fold(0, |mask, i| mask | 1u8.checked_shl(u32::from(chart.note(i).lane)).unwrap_or(0))
}

/// Fretted rules: a chord is one target, hit by strumming while holding
/// exactly its frets.
#[derive(Clone, Debug)]
pub struct FretJudgment {
    max_multiplier: u32,
    held_frets: u8,
    strummed: bool,
}

impl Default for FretJudgment {
    fn default() -> Self {
        Self::new()
    }
}

impl FretJudgment {
    pub fn new() -> Self {
        Self::with_max_multiplier(DEFAULT_MAX_MULTIPLIER)
    }

    pub fn with_max_multiplier(max_multiplier: u32) -> Self {
        Self { max_multiplier, held_frets: 0, strummed: false }
    }

    #[inline(always)]
    pub fn held_frets(&self) -> u8 {
        self.held_frets
    }
}

impl Judgment for FretJudgment {
    fn chord_policy(&self) -> ChordPolicy {
        ChordPolicy::Collapse
    }

    fn max_multiplier(&self) -> u32 {
        self.max_multiplier
    }

    fn apply_input(&mut self, input: &GameInput) {
        match input.action {
            fret @ 0..FRET_COUNT => {
                let bit = 1u8 << fret;
                if input.button() {
                    self.held_frets |= bit;
                } else {
                    self.held_frets &= !bit;
                }
            }
            STRUM_ACTION if input.button() => self.strummed = true,
            _ => {}
        }
    }

    fn end_input(&mut self) {
        self.strummed = false;
    }

    fn wants_star_power(&self, input: &GameInput) -> bool {
        input.action == STAR_POWER_ACTION && input.button()
    }

    fn is_hittable(&self, ctx: &JudgeContext<'_>, index: NoteIndex) -> bool {
        match ctx.kind {
            UpdateKind::Bot => ctx.chart.note(index).time <= ctx.now,
            UpdateKind::Input => self.strummed && self.held_frets == chord_mask(ctx.chart, index),
            UpdateKind::Time => false,
        }
    }

    fn on_hit(&mut self, _note: &Note) {
        self.strummed = false;
    }

    fn reset(&mut self, keep_buttons: bool) {
        self.strummed = false;
        if !keep_buttons {
            self.held_frets = 0;
        }
    }
}
