use crate::game::chart::Chart;
use crate::game::input::GameInput;
use crate::game::note::{Note, NoteIndex};
use smallvec::SmallVec;

pub const POINTS_PER_NOTE: u32 = 50;
pub const DEFAULT_MAX_MULTIPLIER: u32 = 4;
/// Combo needed per multiplier step.
pub const NOTES_PER_MULTIPLIER: u32 = 10;

/// How simultaneous notes are counted and judged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChordPolicy {
    /// The whole chord is one judged unit (fretted instruments).
    Collapse,
    /// Every chord member is judged and scored on its own (percussion).
    Separate,
}

impl ChordPolicy {
    /// Number of judged notes a chord head stands for.
    #[inline(always)]
    pub fn note_count(self, chart: &Chart, head: NoteIndex) -> u32 {
        match self {
            Self::Collapse => 1,
            Self::Separate => 1 + chart.note(head).children.len() as u32,
        }
    }

    /// Indices that are hit or missed as a unit, for one chord head.
    pub fn units(self, chart: &Chart, head: NoteIndex) -> SmallVec<[NoteIndex; 4]> {
        match self {
            Self::Collapse => SmallVec::from_slice(&[head]),
            Self::Separate => chart.chord_members(head).collect(),
        }
    }
}

/// Provenance of the judgment pass currently running.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    Time,
    Input,
    Bot,
}

pub struct JudgeContext<'a> {
    pub chart: &'a Chart,
    pub now: f64,
    pub kind: UpdateKind,
    pub input: &'a GameInput,
}

/// Per-instrument rules plugged into the engine's simulation loop.
///
/// The engine owns window geometry, cursors, combo, star power and solos;
/// implementors only decide whether a gesture matches a note and how many
/// points a judged unit is worth.
pub trait Judgment {
    fn chord_policy(&self) -> ChordPolicy;

    fn max_multiplier(&self) -> u32 {
        DEFAULT_MAX_MULTIPLIER
    }

    /// Called once per consumed input, before it is judged.
    fn apply_input(&mut self, input: &GameInput);

    /// Called after the judgment passes for an input have settled.
    fn end_input(&mut self) {}

    fn wants_star_power(&self, _input: &GameInput) -> bool {
        false
    }

    /// `index` is a chord head under [`ChordPolicy::Collapse`] and any chord
    /// member under [`ChordPolicy::Separate`]. Only asked during input and bot
    /// passes, and only for notes inside the hit window.
    fn is_hittable(&self, ctx: &JudgeContext<'_>, index: NoteIndex) -> bool;

    fn on_hit(&mut self, _note: &Note) {}

    fn on_miss(&mut self, _note: &Note) {}

    /// Points for one judged unit at 1x.
    fn note_points(&self, chart: &Chart, unit: NoteIndex) -> u32 {
        match self.chord_policy() {
            ChordPolicy::Collapse => POINTS_PER_NOTE * chart.chord_members(unit).count() as u32,
            ChordPolicy::Separate => POINTS_PER_NOTE,
        }
    }

    /// Maximum score of the whole chart at 1x.
    fn calculate_base_score(&self, chart: &Chart) -> u32 {
        let policy = self.chord_policy();
        chart
            .heads()
            .iter()
            .flat_map(|&head| policy.units(chart, head))
            .map(|unit| self.note_points(chart, unit))
            .sum()
    }

    fn reset(&mut self, keep_buttons: bool);
}

/// Combo multiplier before star power doubling.
#[inline(always)]
pub fn combo_multiplier(combo: u32, max_multiplier: u32) -> u32 {
    (1 + combo / NOTES_PER_MULTIPLIER).min(max_multiplier.max(1))
}
