use crate::game::input::GameInput;
use crate::game::judgment::{ChordPolicy, DEFAULT_MAX_MULTIPLIER, JudgeContext, Judgment, UpdateKind};
use crate::game::note::{Note, NoteIndex};

/// Pads are actions `0..PAD_COUNT`; a note's lane is the pad it expects.
pub const PAD_COUNT: i32 = 5;
pub const STAR_POWER_ACTION: i32 = 10;

/// Percussion rules: every chord member is its own target, and one pad
/// strike can hit at most one note.
#[derive(Clone, Debug)]
pub struct DrumsJudgment {
    max_multiplier: u32,
    pad_hit_this_update: Option<u8>,
}

impl Default for DrumsJudgment {
    fn default() -> Self {
        Self::new()
    }
}

impl DrumsJudgment {
    pub fn new() -> Self {
        Self::with_max_multiplier(DEFAULT_MAX_MULTIPLIER)
    }

    pub fn with_max_multiplier(max_multiplier: u32) -> Self {
        Self { max_multiplier, pad_hit_this_update: None }
    }
}

impl Judgment for DrumsJudgment {
    fn chord_policy(&self) -> ChordPolicy {
        ChordPolicy::Separate
    }

    fn max_multiplier(&self) -> u32 {
        self.max_multiplier
    }

    fn apply_input(&mut self, input: &GameInput) {
        if input.button() && (0..PAD_COUNT).contains(&input.action) {
            self.pad_hit_this_update = Some(input.action as u8);
        }
    }

    fn end_input(&mut self) {
        self.pad_hit_this_update = None;
    }

    fn wants_star_power(&self, input: &GameInput) -> bool {
        input.action == STAR_POWER_ACTION && input.button()
    }

    fn is_hittable(&self, ctx: &JudgeContext<'_>, index: NoteIndex) -> bool {
        let note = ctx.chart.note(index);
        match ctx.kind {
            UpdateKind::Bot => note.time <= ctx.now,
            UpdateKind::Input => self.pad_hit_this_update == Some(note.lane),
            UpdateKind::Time => false,
        }
    }

    fn on_hit(&mut self, _note: &Note) {
        // Strike consumed.
        self.pad_hit_this_update = None;
    }

    fn reset(&mut self, _keep_buttons: bool) {
        self.pad_hit_this_update = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::chart::ChartBuilder;
    use crate::game::note::NoteFlags;

    #[test]
    fn strike_matches_only_its_pad_once() {
        let mut b = ChartBuilder::new();
        let head = b.chord(1.0, 480, &[1, 3], NoteFlags::empty());
        let chart = b.build();
        let child = chart.note(head).children[0];

        let mut drums = DrumsJudgment::new();
        let input = GameInput::new(1.0, 3, 1);
        drums.apply_input(&input);
        let ctx = JudgeContext { chart: &chart, now: 1.0, kind: UpdateKind::Input, input: &input };
        assert!(!drums.is_hittable(&ctx, head));
        assert!(drums.is_hittable(&ctx, child));

        drums.on_hit(chart.note(child));
        assert!(!drums.is_hittable(&ctx, child), "one strike hits one note");
    }

    #[test]
    fn releases_and_unknown_actions_do_not_strike() {
        let mut drums = DrumsJudgment::new();
        drums.apply_input(&GameInput::new(0.0, 2, 0));
        drums.apply_input(&GameInput::new(0.0, 7, 1));
        assert_eq!(drums.pad_hit_this_update, None);
        assert!(drums.wants_star_power(&GameInput::new(0.0, STAR_POWER_ACTION, 1)));
        assert!(!drums.wants_star_power(&GameInput::new(0.0, STAR_POWER_ACTION, 0)));
    }
}
