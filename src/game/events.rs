use crate::game::note::NoteIndex;
use crate::game::solo::SoloSection;
use serde::Serialize;

/// Notifications produced while updating, in the order they happened.
///
/// The engine queues these instead of calling back into user code, so
/// nothing can mutate the engine while an update is running. Drain them with
/// [`crate::game::engine::Engine::drain_events`] after each update call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    NoteHit { index: NoteIndex, time: f64 },
    NoteMissed { index: NoteIndex, time: f64 },
    StarPowerPhraseHit { index: NoteIndex },
    StarPowerPhraseMissed { index: NoteIndex },
    StarPowerStatus { active: bool },
    SoloStart { section: SoloSection },
    SoloEnd { section: SoloSection },
}

#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<EngineEvent>,
}

impl EventQueue {
    #[inline(always)]
    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn as_slice(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
