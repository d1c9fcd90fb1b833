use crate::error::Result;
use crate::game::note::{Note, NoteFlags, NoteIndex};
use crate::game::timing::{SyncTrack, TempoChange, TimeSignatureChange};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Flags a chord child inherits from the note that owns it.
const CHILD_INHERITED_FLAGS: NoteFlags = NoteFlags::STAR_POWER;

/// Arena of notes for one instrument difficulty.
///
/// Chord heads form a doubly linked, time-ordered sequence through
/// `prev`/`next`; chord children hang off their head via `children` and
/// share its time.
#[derive(Clone, Debug, Default)]
pub struct Chart {
    notes: Vec<Note>,
    heads: Vec<NoteIndex>,
}

impl Chart {
    #[inline(always)]
    pub fn note(&self, index: NoteIndex) -> &Note {
        &self.notes[index]
    }

    #[inline(always)]
    pub fn note_mut(&mut self, index: NoteIndex) -> &mut Note {
        &mut self.notes[index]
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Chord heads in time order.
    #[inline(always)]
    pub fn heads(&self) -> &[NoteIndex] {
        &self.heads
    }

    /// Where `head` sits in [`Chart::heads`]. Heads are appended in index
    /// order, so this is a binary search.
    pub fn head_position(&self, head: NoteIndex) -> Option<usize> {
        self.heads.binary_search(&head).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Head followed by its children.
    pub fn chord_members(&self, head: NoteIndex) -> impl Iterator<Item = NoteIndex> + '_ {
        std::iter::once(head).chain(self.notes[head].children.iter().copied())
    }

    pub fn is_chord_resolved(&self, head: NoteIndex) -> bool {
        self.chord_members(head).all(|i| self.notes[i].is_resolved())
    }

    /// Clears hit/miss state and restores authored phrase flags.
    pub fn reset_note_states(&mut self) {
        for note in &mut self.notes {
            note.reset_note_state();
        }
    }
}

/// Appends chords in time order and links them.
#[derive(Debug, Default)]
pub struct ChartBuilder {
    chart: Chart,
}

impl ChartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chord. The first lane becomes the head; the rest become children.
    /// Returns the head index.
    pub fn chord(&mut self, time: f64, tick: u32, lanes: &[u8], flags: NoteFlags) -> NoteIndex {
        assert!(!lanes.is_empty(), "a chord needs at least one lane");
        let chart = &mut self.chart;
        let head = chart.notes.len();

        let mut note = Note::new(time, tick, lanes[0], flags);
        if let Some(&prev) = chart.heads.last() {
            debug_assert!(chart.notes[prev].time <= time, "chords must be appended in time order");
            note.prev = Some(prev);
            chart.notes[prev].next = Some(head);
        }
        chart.notes.push(note);
        chart.heads.push(head);

        for &lane in &lanes[1..] {
            let child = chart.notes.len();
            let mut note = Note::new(time, tick, lane, flags & CHILD_INHERITED_FLAGS);
            note.parent = Some(head);
            chart.notes.push(note);
            chart.notes[head].children.push(child);
        }
        head
    }

    /// Single-note shorthand.
    pub fn note(&mut self, time: f64, tick: u32, lane: u8, flags: NoteFlags) -> NoteIndex {
        self.chord(time, tick, &[lane], flags)
    }

    pub fn build(self) -> Chart {
        self.chart
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChordEntry {
    pub tick: u32,
    pub lanes: Vec<u8>,
    #[serde(default)]
    pub flags: NoteFlags,
}

/// On-disk chart: tempo map plus tick-addressed chords. Note times are
/// derived from the tempo map on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartFile {
    pub resolution: u32,
    #[serde(default)]
    pub tempos: Vec<TempoChange>,
    #[serde(default)]
    pub time_signatures: Vec<TimeSignatureChange>,
    pub notes: Vec<ChordEntry>,
}

impl ChartFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn build(&self) -> (SyncTrack, Chart) {
        let sync = SyncTrack::new(self.resolution, &self.tempos, &self.time_signatures);
        let mut entries: Vec<&ChordEntry> = self.notes.iter().filter(|e| !e.lanes.is_empty()).collect();
        entries.sort_by_key(|e| e.tick);

        let mut builder = ChartBuilder::new();
        for entry in entries {
            builder.chord(sync.tick_to_time(entry.tick), entry.tick, &entry.lanes, entry.flags);
        }
        (sync, builder.build())
    }
}
