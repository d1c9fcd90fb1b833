use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index of a note inside a [`crate::game::chart::Chart`] arena.
pub type NoteIndex = usize;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct NoteFlags: u16 {
        const STAR_POWER       = 1 << 0;
        const STAR_POWER_START = 1 << 1;
        const STAR_POWER_END   = 1 << 2;
        const SOLO_START       = 1 << 3;
        const SOLO_END         = 1 << 4;
    }
}

impl Default for NoteFlags {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Clone, Debug)]
pub struct Note {
    pub time: f64,
    pub tick: u32,
    /// Instrument payload: pad number for drums, fret bit for fretted parts.
    pub lane: u8,
    pub flags: NoteFlags,
    /// Flags as authored; restored on every reset.
    pub authored_flags: NoteFlags,
    /// Set on chord children, pointing at the note that owns them.
    pub parent: Option<NoteIndex>,
    pub children: SmallVec<[NoteIndex; 4]>,
    pub prev: Option<NoteIndex>,
    pub next: Option<NoteIndex>,
    pub was_hit: bool,
    pub was_missed: bool,
}

impl Note {
    pub fn new(time: f64, tick: u32, lane: u8, flags: NoteFlags) -> Self {
        Self {
            time,
            tick,
            lane,
            flags,
            authored_flags: flags,
            parent: None,
            children: SmallVec::new(),
            prev: None,
            next: None,
            was_hit: false,
            was_missed: false,
        }
    }

    #[inline(always)]
    pub fn is_star_power(&self) -> bool {
        self.flags.contains(NoteFlags::STAR_POWER)
    }

    #[inline(always)]
    pub fn is_star_power_start(&self) -> bool {
        self.flags.contains(NoteFlags::STAR_POWER_START)
    }

    #[inline(always)]
    pub fn is_star_power_end(&self) -> bool {
        self.flags.contains(NoteFlags::STAR_POWER_END)
    }

    #[inline(always)]
    pub fn is_solo_start(&self) -> bool {
        self.flags.contains(NoteFlags::SOLO_START)
    }

    #[inline(always)]
    pub fn is_solo_end(&self) -> bool {
        self.flags.contains(NoteFlags::SOLO_END)
    }

    #[inline(always)]
    pub fn is_resolved(&self) -> bool {
        self.was_hit || self.was_missed
    }

    pub fn reset_note_state(&mut self) {
        self.flags = self.authored_flags;
        self.was_hit = false;
        self.was_missed = false;
    }
}
