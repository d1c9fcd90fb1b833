use crate::error::{Error, Result};
use crate::game::chart::Chart;
use crate::game::events::{EngineEvent, EventQueue};
use crate::game::input::{GameInput, InputQueue};
use crate::game::judgment::{ChordPolicy, JudgeContext, Judgment, UpdateKind, combo_multiplier};
use crate::game::note::NoteIndex;
use crate::game::parameters::EngineParameters;
use crate::game::solo::{SoloSection, SoloTracker, find_solo_sections};
use crate::game::star_power::{self, MeterAnchor};
use crate::game::state::EngineState;
use crate::game::stats::EngineStats;
use crate::game::timing::{SyncTrack, TimeBase};
use log::{debug, info, trace};
use smallvec::SmallVec;
use std::sync::Arc;

/// Single-threaded judgment and scoring loop for one chart.
///
/// All mutation happens inside the update calls. Events produced during an
/// update are queued and must be fetched with [`Engine::drain_events`]
/// afterwards; there are no callbacks, so nothing can re-enter the engine
/// mid-update.
///
/// Inputs must be queued in non-decreasing time order. The queue does not
/// sort or check them; out-of-order inputs give undefined judgments.
pub struct Engine<J: Judgment, T: TimeBase = SyncTrack> {
    judge: J,
    sync: Arc<T>,
    chart: Chart,
    params: EngineParameters,
    base_score: u32,
    star_score_thresholds: Vec<u32>,

    state: EngineState,
    stats: EngineStats,
    solos: SoloTracker,
    inputs: InputQueue,
    current_input: GameInput,
    update_kind: UpdateKind,
    events: EventQueue,
}

impl<J: Judgment, T: TimeBase> Engine<J, T> {
    pub fn new(judge: J, chart: Chart, sync: Arc<T>, params: EngineParameters) -> Self {
        // The base score must be final before the thresholds are scaled by it.
        let base_score = judge.calculate_base_score(&chart);
        let star_score_thresholds = params.star_score_thresholds(base_score);
        let solos = SoloTracker::new(find_solo_sections(&chart, judge.chord_policy()));

        info!(
            "Engine ready: {} chords, base score {}, {} solo sections",
            chart.heads().len(),
            base_score,
            solos.sections().len()
        );

        Self {
            judge,
            sync,
            chart,
            params,
            base_score,
            star_score_thresholds,
            state: EngineState::default(),
            stats: EngineStats::default(),
            solos,
            inputs: InputQueue::default(),
            current_input: GameInput::NONE,
            update_kind: UpdateKind::Time,
            events: EventQueue::default(),
        }
    }

    pub fn queue_input(&mut self, input: GameInput) {
        self.inputs.push(input);
    }

    pub fn is_input_queued(&self) -> bool {
        !self.inputs.is_empty()
    }

    /// Advances to `time` without any input and settles every note that
    /// resolves by then.
    pub fn update(&mut self, time: f64) {
        self.update_kind = UpdateKind::Time;
        self.run_to_fixed_point(time);
    }

    /// Consumes every queued input in order. Misses up to an input's time are
    /// resolved before the input is judged, so a late input can never rescue
    /// a note whose window already closed.
    pub fn update_inputs(&mut self) {
        while let Some(input) = self.inputs.pop() {
            self.update(input.time);

            self.current_input = input;
            self.judge.apply_input(&input);
            if self.judge.wants_star_power(&input) && self.stats.star_power_amount > 0.0 {
                self.activate_star_power();
            }

            self.update_kind = UpdateKind::Input;
            let mut passes = 0u32;
            while self.update_hit_logic(input.time) {
                // Only the first pass may use the input.
                self.update_kind = UpdateKind::Time;
                passes += 1;
            }
            self.update_kind = UpdateKind::Time;
            self.judge.end_input();
            trace!("Input {:?} settled after {} passes", input, passes + 1);
        }
    }

    /// Same contract as [`Engine::update`], but the judgment rules treat the
    /// pass as bot play.
    pub fn update_bot(&mut self, time: f64) {
        self.update_kind = UpdateKind::Bot;
        self.run_to_fixed_point(time);
        self.update_kind = UpdateKind::Time;
    }

    /// Replays `inputs` from a clean state up to `time`. Inputs later than
    /// `time` are ignored. Returns how many inputs were consumed.
    pub fn process_up_to_time(&mut self, time: f64, inputs: &[GameInput]) -> usize {
        self.reset(false);

        let mut consumed = 0;
        for input in inputs {
            if input.time > time {
                break;
            }
            self.inputs.push(*input);
            consumed += 1;
        }

        info!("Replaying {consumed} inputs up to {time:.3}s");
        self.update_inputs();
        self.update(time);
        info!(
            "Replay finished: score {}, combo {}, stars {}",
            self.stats.score, self.stats.combo, self.stats.stars
        );
        consumed
    }

    /// Incremental replay without a reset. Not implemented; always fails and
    /// leaves the engine untouched.
    pub fn process_from_time_to_time(&mut self, start: f64, end: f64, _inputs: &[GameInput]) -> Result<usize> {
        debug!("Rejected incremental replay {start:.3}s -> {end:.3}s");
        Err(Error::IncrementalReplayUnsupported)
    }

    /// Returns to the state right after construction. The chart and
    /// parameters are kept; stripped phrases are restored.
    pub fn reset(&mut self, keep_buttons: bool) {
        self.current_input = GameInput::NONE;
        self.inputs.clear();
        self.update_kind = UpdateKind::Time;

        self.state.reset();
        self.stats.reset();
        self.chart.reset_note_states();
        self.solos.reset();
        self.judge.reset(keep_buttons);
        self.events.clear();
        info!("Engine reset (keep_buttons: {keep_buttons})");
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn sync(&self) -> &T {
        &self.sync
    }

    pub fn parameters(&self) -> &EngineParameters {
        &self.params
    }

    pub fn base_score(&self) -> u32 {
        self.base_score
    }

    pub fn star_score_thresholds(&self) -> &[u32] {
        &self.star_score_thresholds
    }

    pub fn solo_sections(&self) -> &[SoloSection] {
        self.solos.sections()
    }

    pub fn current_input(&self) -> &GameInput {
        &self.current_input
    }

    pub fn judgment(&self) -> &J {
        &self.judge
    }

    fn run_to_fixed_point(&mut self, time: f64) {
        let mut passes = 1u32;
        while self.update_hit_logic(time) {
            passes += 1;
        }
        trace!("Update at {time:.3}s settled after {passes} passes");
    }

    fn update_time_variables(&mut self, time: f64) {
        let state = &mut self.state;
        state.last_update_time = state.current_time;
        state.current_time = time;
        state.last_tick = state.current_tick;
        state.current_tick = self.sync.time_to_tick(time);

        let time_sigs = self.sync.time_signatures();
        while state.next_time_sig_index < time_sigs.len()
            && time_sigs[state.next_time_sig_index].time <= time
        {
            state.current_time_sig_index = state.next_time_sig_index;
            state.next_time_sig_index += 1;
        }

        if let Some(sig) = time_sigs.get(state.current_time_sig_index) {
            state.ticks_every_eight_measures = sig.ticks_every_eight_measures(self.sync.resolution());
        }
    }

    /// One judgment step at `time`. Returns true if any note changed state,
    /// in which case the caller runs another step at the same time.
    fn update_hit_logic(&mut self, time: f64) -> bool {
        self.update_time_variables(time);

        if self.stats.is_star_power_active {
            let anchor = self.state.star_power_anchor;
            let drained = star_power::drained_between(&*self.sync, anchor.tick, self.state.current_tick);
            if star_power::deplete(&mut self.stats, &mut self.events, anchor, drained) {
                self.update_multiplier();
            }
        }

        let heads = self.chart.heads();
        while self.state.note_cursor < heads.len() && self.chart.is_chord_resolved(heads[self.state.note_cursor]) {
            self.state.note_cursor += 1;
        }
        let Some(&head) = heads.get(self.state.note_cursor) else {
            return false;
        };

        if self.update_kind != UpdateKind::Time
            && let Some(unit) = self.find_hittable(time)
        {
            self.hit_unit(unit);
            return true;
        }

        if self.params.hit_window.has_passed(self.chart.note(head).time, time) {
            let policy = self.judge.chord_policy();
            for unit in policy.units(&self.chart, head) {
                if !self.chart.note(unit).is_resolved() {
                    self.miss_unit(unit);
                }
            }
            return true;
        }

        false
    }

    /// First unresolved unit in the window that the rules accept.
    fn find_hittable(&self, time: f64) -> Option<NoteIndex> {
        let ctx = JudgeContext {
            chart: &self.chart,
            now: time,
            kind: self.update_kind,
            input: &self.current_input,
        };
        let window = &self.params.hit_window;
        let policy = self.judge.chord_policy();

        for &head in &self.chart.heads()[self.state.note_cursor..] {
            let note_time = self.chart.note(head).time;
            if !window.contains(note_time, time) {
                if note_time > time {
                    break;
                }
                continue;
            }

            let hit = policy
                .units(&self.chart, head)
                .into_iter()
                .find(|&unit| !self.chart.note(unit).is_resolved() && self.judge.is_hittable(&ctx, unit));
            if hit.is_some() || policy == ChordPolicy::Collapse {
                // Collapsed chords are judged strictly in order.
                return hit;
            }
        }
        None
    }

    /// Notes that change state together with `unit`.
    fn resolved_with(&self, unit: NoteIndex) -> SmallVec<[NoteIndex; 4]> {
        match self.judge.chord_policy() {
            ChordPolicy::Collapse => self.chart.chord_members(unit).collect(),
            ChordPolicy::Separate => SmallVec::from_slice(&[unit]),
        }
    }

    fn hit_unit(&mut self, unit: NoteIndex) {
        let head = self.chart.note(unit).parent.unwrap_or(unit);
        for i in self.resolved_with(unit) {
            self.chart.note_mut(i).was_hit = true;
        }
        self.judge.on_hit(self.chart.note(unit));

        if self.chart.note(head).is_solo_start() {
            self.solos.start(&mut self.state, &mut self.events);
        }

        self.stats.combo += 1;
        self.stats.max_combo = self.stats.max_combo.max(self.stats.combo);
        self.stats.notes_hit += 1;
        self.update_multiplier();

        let points = self.judge.note_points(&self.chart, unit) * self.stats.score_multiplier;
        self.stats.score += points;
        if let Some(position) = self.chart.head_position(head) {
            self.solos.record_hit(position, &self.state, &mut self.stats);
        }
        self.update_stars();

        let time = self.chart.note(unit).time;
        debug!("Hit note {unit} at {time:.3}s for {points} (combo {})", self.stats.combo);
        self.events.push(EngineEvent::NoteHit { index: unit, time });

        if self.chart.is_chord_resolved(head) {
            let note = self.chart.note(head);
            let (phrase_end, solo_end) = (note.is_star_power() && note.is_star_power_end(), note.is_solo_end());
            if phrase_end {
                star_power::award(&mut self.stats, &mut self.events, head);
                if self.stats.is_star_power_active {
                    self.anchor_meter();
                }
            }
            if solo_end {
                self.solos.end(&mut self.state, &mut self.stats, &mut self.events);
            }
        }
    }

    fn miss_unit(&mut self, unit: NoteIndex) {
        let head = self.chart.note(unit).parent.unwrap_or(unit);
        for i in self.resolved_with(unit) {
            self.chart.note_mut(i).was_missed = true;
        }
        self.judge.on_miss(self.chart.note(unit));

        if self.chart.note(head).is_solo_start() {
            self.solos.start(&mut self.state, &mut self.events);
        }

        self.stats.combo = 0;
        self.stats.notes_missed += 1;
        self.update_multiplier();

        let time = self.chart.note(unit).time;
        debug!("Missed note {unit} at {time:.3}s");
        self.events.push(EngineEvent::NoteMissed { index: unit, time });

        star_power::strip(&mut self.chart, &mut self.stats, &mut self.events, unit);

        if self.chart.is_chord_resolved(head) && self.chart.note(head).is_solo_end() {
            self.solos.end(&mut self.state, &mut self.stats, &mut self.events);
        }
    }

    fn activate_star_power(&mut self) {
        if star_power::activate(&mut self.stats, &mut self.events) {
            self.anchor_meter();
            self.update_multiplier();
        }
    }

    fn anchor_meter(&mut self) {
        self.state.star_power_anchor = MeterAnchor::new(self.stats.star_power_amount, self.state.current_tick);
    }

    fn update_multiplier(&mut self) {
        let mut multiplier = combo_multiplier(self.stats.combo, self.judge.max_multiplier());
        if self.stats.is_star_power_active {
            multiplier *= 2;
        }
        self.stats.score_multiplier = multiplier;
    }

    /// A table starting at zero means no base score, so no stars.
    fn update_stars(&mut self) {
        if self.star_score_thresholds.first().is_none_or(|&t| t == 0) {
            return;
        }
        while let Some(&threshold) = self.star_score_thresholds.get(self.state.current_star_index) {
            if self.stats.score < threshold {
                break;
            }
            self.stats.stars += 1;
            self.state.current_star_index += 1;
            info!("Reached star {} at score {}", self.stats.stars, self.stats.score);
        }
    }
}
