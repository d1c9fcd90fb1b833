use crate::game::chart::Chart;
use crate::game::events::{EngineEvent, EventQueue};
use crate::game::judgment::ChordPolicy;
use crate::game::state::EngineState;
use crate::game::stats::EngineStats;
use log::info;
use serde::Serialize;

pub const SOLO_BONUS_PER_NOTE: u32 = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SoloSection {
    /// Chord-aware count of judged notes in the section.
    pub note_count: u32,
    pub notes_hit: u32,
    /// Positions of the start and end chords in [`Chart::heads`], inclusive.
    pub first_head: usize,
    pub last_head: usize,
}

impl SoloSection {
    pub const fn new(note_count: u32, first_head: usize, last_head: usize) -> Self {
        Self { note_count, notes_hit: 0, first_head, last_head }
    }

    #[inline(always)]
    pub const fn contains(&self, position: usize) -> bool {
        self.first_head <= position && position <= self.last_head
    }

    #[inline(always)]
    pub const fn bonus(&self) -> u32 {
        self.notes_hit * SOLO_BONUS_PER_NOTE
    }
}

/// Scans chord heads once for solo start/end pairs. Solos never nest; a start
/// with no matching end produces no section.
pub fn find_solo_sections(chart: &Chart, policy: ChordPolicy) -> Vec<SoloSection> {
    let heads = chart.heads();
    let mut sections = Vec::new();
    let mut i = 0;
    while i < heads.len() {
        let start = heads[i];
        if !chart.note(start).is_solo_start() {
            i += 1;
            continue;
        }

        let mut count = 0;
        let mut end_at = None;
        for (j, &head) in heads.iter().enumerate().skip(i) {
            count += policy.note_count(chart, head);
            if chart.note(head).is_solo_end() {
                end_at = Some(j);
                break;
            }
        }

        match end_at {
            Some(j) => {
                sections.push(SoloSection::new(count, i, j));
                i = j + 1;
            }
            None => break,
        }
    }
    sections
}

/// Solo sections for one chart. The list itself never changes between
/// resets; only the hit counts do.
#[derive(Clone, Debug, Default)]
pub struct SoloTracker {
    sections: Vec<SoloSection>,
}

impl SoloTracker {
    pub fn new(sections: Vec<SoloSection>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[SoloSection] {
        &self.sections
    }

    pub fn start(&self, state: &mut EngineState, events: &mut EventQueue) {
        let Some(section) = self.sections.get(state.current_solo_index) else {
            return;
        };
        if state.is_solo_active {
            return;
        }
        state.is_solo_active = true;
        info!("Solo {} started ({} notes)", state.current_solo_index, section.note_count);
        events.push(EngineEvent::SoloStart { section: *section });
    }

    /// Credits a hit to the section holding the chord at `position`, whether
    /// or not that section has started yet.
    pub fn record_hit(&mut self, position: usize, state: &EngineState, stats: &mut EngineStats) {
        let i = self.sections.partition_point(|s| s.last_head < position);
        let Some(section) = self.sections.get_mut(i).filter(|s| s.contains(position)) else {
            return;
        };
        section.notes_hit += 1;
        // Already ended: its bonus was paid without this note.
        if i < state.current_solo_index {
            stats.solo_bonuses += SOLO_BONUS_PER_NOTE;
        }
    }

    pub fn end(&mut self, state: &mut EngineState, stats: &mut EngineStats, events: &mut EventQueue) {
        if !state.is_solo_active {
            return;
        }
        state.is_solo_active = false;
        let section = self.sections[state.current_solo_index];
        stats.solo_bonuses += section.bonus();
        info!(
            "Solo {} ended: {}/{} notes, bonus {}",
            state.current_solo_index,
            section.notes_hit,
            section.note_count,
            section.bonus()
        );
        events.push(EngineEvent::SoloEnd { section });
        state.current_solo_index += 1;
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.notes_hit = 0;
        }
    }
}
