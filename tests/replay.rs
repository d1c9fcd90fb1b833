use std::sync::Arc;
use trackjudge::game::chart::{Chart, ChartBuilder, ChartFile};
use trackjudge::game::drums::{self, DrumsJudgment};
use trackjudge::game::events::EngineEvent;
use trackjudge::game::frets::{self, FretJudgment};
use trackjudge::game::note::NoteFlags;
use trackjudge::game::parameters::{DEFAULT_STAR_MULTIPLIER_THRESHOLDS, EngineParameters};
use trackjudge::game::replay::Replay;
use trackjudge::game::timing::SyncTrack;
use trackjudge::{Engine, Error, GameInput};

const SP: NoteFlags = NoteFlags::STAR_POWER;
/// Ticks per second at the default 120 bpm and 480 resolution.
const TICKS_PER_SECOND: f64 = 960.0;

fn params(window: f64, ratio: f64) -> EngineParameters {
    EngineParameters::new(window, ratio, &DEFAULT_STAR_MULTIPLIER_THRESHOLDS)
}

fn drums_engine(chart: Chart, params: EngineParameters) -> Engine<DrumsJudgment> {
    Engine::new(DrumsJudgment::new(), chart, Arc::new(SyncTrack::default()), params)
}

fn add(b: &mut ChartBuilder, time: f64, lane: u8, flags: NoteFlags) {
    b.note(time, (time * TICKS_PER_SECOND) as u32, lane, flags);
}

/// A mixed chart: opening notes, a 5-note star power phrase, a chord, a
/// 4-note solo and a tail.
fn session_chart() -> Chart {
    let mut b = ChartBuilder::new();
    add(&mut b, 1.0, 0, NoteFlags::empty());
    add(&mut b, 1.5, 1, NoteFlags::empty());
    add(&mut b, 2.0, 0, SP | NoteFlags::STAR_POWER_START);
    add(&mut b, 2.25, 1, SP);
    add(&mut b, 2.5, 2, SP);
    add(&mut b, 2.75, 1, SP);
    add(&mut b, 3.0, 0, SP | NoteFlags::STAR_POWER_END);
    b.chord(3.5, 3360, &[0, 2], NoteFlags::empty());
    add(&mut b, 4.0, 1, NoteFlags::SOLO_START);
    add(&mut b, 4.25, 2, NoteFlags::empty());
    add(&mut b, 4.5, 1, NoteFlags::empty());
    add(&mut b, 4.75, 0, NoteFlags::SOLO_END);
    add(&mut b, 6.0, 3, NoteFlags::empty());
    b.build()
}

/// Strikes every note of `chart` on time, except the heads listed in `skip`.
fn perfect_inputs(chart: &Chart, skip: &[usize], offset: f64) -> Vec<GameInput> {
    let mut inputs = Vec::new();
    for (pos, &head) in chart.heads().iter().enumerate() {
        if skip.contains(&pos) {
            continue;
        }
        for member in chart.chord_members(head) {
            let note = chart.note(member);
            inputs.push(GameInput::new(note.time + offset, i32::from(note.lane), 1));
        }
    }
    inputs
}

#[test]
fn replaying_twice_is_bit_identical() {
    let chart = session_chart();
    let mut inputs = perfect_inputs(&chart, &[9], 0.01);
    // Activate star power after the phrase, so depletion is part of the run.
    inputs.insert(inputs.len() - 1, GameInput::new(5.0, drums::STAR_POWER_ACTION, 1));

    let mut engine = drums_engine(chart, params(0.1, 1.0));
    let consumed = engine.process_up_to_time(7.0, &inputs);
    assert!(engine.stats().is_star_power_active);
    assert!(engine.stats().star_power_amount < 0.25);
    let (stats, state) = (engine.stats().clone(), engine.state().clone());
    let events = engine.drain_events();

    assert_eq!(engine.process_up_to_time(7.0, &inputs), consumed);
    assert_eq!(engine.stats(), &stats);
    assert_eq!(engine.state(), &state);
    assert_eq!(engine.drain_events(), events);
    assert_eq!(consumed, inputs.len());
}

#[test]
fn inputs_past_the_target_time_are_not_consumed() {
    let chart = session_chart();
    let inputs = perfect_inputs(&chart, &[], 0.0);
    let mut engine = drums_engine(chart, params(0.1, 1.0));

    let consumed = engine.process_up_to_time(2.0, &inputs);
    assert_eq!(consumed, 3, "notes at 1.0, 1.5 and 2.0");
    assert_eq!(engine.stats().notes_hit, 3);
    assert!(!engine.is_input_queued());
}

#[test]
fn misses_do_not_depend_on_later_inputs() {
    let two_notes = || {
        let mut b = ChartBuilder::new();
        add(&mut b, 1.0, 0, NoteFlags::empty());
        add(&mut b, 2.0, 0, NoteFlags::empty());
        b.build()
    };

    let mut idle = drums_engine(two_notes(), params(0.1, 1.0));
    idle.update(1.5);
    assert!(idle.chart().note(0).was_missed);

    let mut late = drums_engine(two_notes(), params(0.1, 1.0));
    late.process_up_to_time(2.5, &[GameInput::new(1.2, 0, 1), GameInput::new(2.0, 0, 1)]);
    assert!(late.chart().note(0).was_missed, "an input after the window closed must not rescue it");
    assert!(late.chart().note(1).was_hit);
    assert_eq!(late.stats().notes_missed, 1);
}

#[test]
fn hit_window_is_asymmetric_and_exclusive() {
    let one_note = || {
        let mut b = ChartBuilder::new();
        add(&mut b, 1.0, 0, NoteFlags::empty());
        b.build()
    };
    let params = params(0.1, 1.5);
    assert!((params.hit_window.front_end + 0.075).abs() < 1e-12);
    assert!((params.hit_window.back_end - 0.025).abs() < 1e-12);

    let hit_at = |time: f64| {
        let mut engine = drums_engine(one_note(), params.clone());
        engine.process_up_to_time(time, &[GameInput::new(time, 0, 1)]);
        engine.stats().notes_hit == 1
    };
    assert!(hit_at(1.0));
    assert!(hit_at(0.98), "25ms early bound");
    assert!(!hit_at(0.97), "too early");
    assert!(hit_at(1.07), "75ms late bound");
    assert!(!hit_at(1.08), "window already closed");
}

#[test]
fn one_miss_voids_the_whole_phrase() {
    let chart = session_chart();
    let phrase: Vec<usize> = chart.heads()[2..7].to_vec();
    // Skip the third note of the phrase.
    let inputs = perfect_inputs(&chart, &[4], 0.0);

    let mut engine = drums_engine(chart, params(0.1, 1.0));
    engine.process_up_to_time(3.2, &inputs);

    for &note in &phrase {
        assert!(!engine.chart().note(note).is_star_power(), "note {note} kept its flag");
    }
    let stats = engine.stats();
    assert_eq!(stats.phrases_missed, 1);
    assert_eq!(stats.phrases_hit, 0);
    assert_eq!(stats.star_power_amount, 0.0);

    let missed: Vec<_> = engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::StarPowerPhraseMissed { .. }))
        .collect();
    assert_eq!(missed, vec![EngineEvent::StarPowerPhraseMissed { index: phrase[2] }]);
}

#[test]
fn completed_phrase_awards_a_quarter_meter_clamped_at_full() {
    let mut b = ChartBuilder::new();
    for i in 0..5 {
        let t = 1.0 + f64::from(i);
        add(&mut b, t, 0, SP | NoteFlags::STAR_POWER_START);
        add(&mut b, t + 0.5, 0, SP | NoteFlags::STAR_POWER_END);
    }
    let chart = b.build();
    let inputs = perfect_inputs(&chart, &[], 0.0);
    let mut engine = drums_engine(chart, params(0.1, 1.0));

    engine.process_up_to_time(2.0, &inputs);
    assert_eq!(engine.stats().star_power_amount, 0.25);

    engine.process_up_to_time(4.0, &inputs);
    assert_eq!(engine.stats().star_power_amount, 0.75);

    engine.process_up_to_time(6.0, &inputs);
    assert_eq!(engine.stats().star_power_amount, 1.0);
    assert_eq!(engine.stats().phrases_hit, 5);
}

#[test]
fn solo_counts_every_note_and_fires_once() {
    let chart = session_chart();
    let inputs = perfect_inputs(&chart, &[], 0.0);
    let mut engine = drums_engine(chart, params(0.1, 1.0));
    assert_eq!(engine.solo_sections().len(), 1);
    assert_eq!(engine.solo_sections()[0].note_count, 4);

    engine.process_up_to_time(7.0, &inputs);
    assert_eq!(engine.solo_sections()[0].notes_hit, 4);
    assert_eq!(engine.stats().solo_bonuses, 400);

    let events = engine.drain_events();
    let starts = events.iter().filter(|e| matches!(e, EngineEvent::SoloStart { .. })).count();
    let ends = events.iter().filter(|e| matches!(e, EngineEvent::SoloEnd { .. })).count();
    assert_eq!((starts, ends), (1, 1));
    assert_eq!(engine.state().current_solo_index, 1);
    assert!(!engine.state().is_solo_active);
}

#[test]
fn live_play_matches_full_replay() {
    let chart = session_chart();
    let inputs = perfect_inputs(&chart, &[1, 9], 0.02);

    let mut live = drums_engine(chart.clone(), params(0.1, 1.0));
    let mut live_events = Vec::new();
    let mut frame = 0.0;
    let mut pending = inputs.iter().peekable();
    while frame < 7.0 {
        frame += 1.0 / 60.0;
        while let Some(input) = pending.next_if(|i| i.time <= frame) {
            live.queue_input(*input);
        }
        live.update_inputs();
        live.update(frame);
        live_events.extend(live.drain_events());
    }
    let final_time = frame;

    let mut replayed = drums_engine(chart, params(0.1, 1.0));
    replayed.process_up_to_time(final_time, &inputs);

    assert_eq!(replayed.stats(), live.stats());
    assert_eq!(replayed.drain_events(), live_events);

    live.reset(false);
    live.process_up_to_time(final_time, &inputs);
    assert_eq!(live.stats(), replayed.stats());
}

#[test]
fn stars_follow_ascending_thresholds_once_each() {
    let chart = session_chart();
    let inputs = perfect_inputs(&chart, &[], 0.0);
    let mut engine = drums_engine(chart, params(0.1, 1.0));

    let thresholds = engine.star_score_thresholds().to_vec();
    assert_eq!(thresholds.len(), DEFAULT_STAR_MULTIPLIER_THRESHOLDS.len());
    assert!(thresholds.windows(2).all(|w| w[0] <= w[1]));
    assert!(thresholds[0] > 0, "thresholds are scaled by the final base score");

    engine.process_up_to_time(7.0, &inputs);
    let stats = engine.stats();
    let reached = thresholds.iter().filter(|&&t| stats.score >= t).count() as u32;
    assert_eq!(stats.stars, reached);
    assert_eq!(engine.state().current_star_index, reached as usize);
}

#[test]
fn incremental_replay_is_refused() {
    let mut engine = drums_engine(session_chart(), params(0.1, 1.0));
    let err = engine.process_from_time_to_time(1.0, 2.0, &[]).unwrap_err();
    assert!(matches!(err, Error::IncrementalReplayUnsupported));
}

#[test]
fn recorded_replay_reproduces_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.replay");
    let chart = session_chart();
    let inputs = perfect_inputs(&chart, &[3], 0.015);
    let params = params(0.1, 1.2);

    let mut engine = drums_engine(chart, params.clone());
    engine.process_up_to_time(7.0, &inputs);
    let expected = engine.stats().clone();

    Replay::record(&params, inputs).unwrap().save(&path).unwrap();
    let replay = Replay::load(&path).unwrap();
    replay.check_compatible(engine.parameters()).unwrap();

    engine.process_up_to_time(7.0, &replay.inputs);
    assert_eq!(engine.stats(), &expected);
}

#[test]
fn fret_chart_file_plays_end_to_end() {
    let json = r#"{
        "resolution": 480,
        "tempos": [{ "tick": 0, "bpm": 120.0 }],
        "time_signatures": [{ "tick": 0, "numerator": 4, "denominator": 4 }],
        "notes": [
            { "tick": 480, "lanes": [0] },
            { "tick": 960, "lanes": [0, 1], "flags": "STAR_POWER | STAR_POWER_START | STAR_POWER_END" },
            { "tick": 1440, "lanes": [2] }
        ]
    }"#;
    let file: ChartFile = serde_json::from_str(json).unwrap();
    let (sync, chart) = file.build();
    let mut engine = Engine::new(FretJudgment::new(), chart, Arc::new(sync), params(0.1, 1.0));
    assert_eq!(engine.base_score(), 4 * 50);

    let strum = |t: f64| GameInput::new(t, frets::STRUM_ACTION, 1);
    let inputs = [
        GameInput::new(0.4, 0, 1),
        strum(0.5),
        GameInput::new(0.9, 1, 1),
        strum(1.0),
        GameInput::new(1.4, 0, 0),
        GameInput::new(1.4, 1, 0),
        GameInput::new(1.45, 2, 1),
        strum(1.5),
    ];
    engine.process_up_to_time(2.0, &inputs);

    let stats = engine.stats();
    assert_eq!(stats.notes_hit, 3);
    assert_eq!(stats.score, engine.base_score());
    assert_eq!(stats.phrases_hit, 1);
    assert_eq!(stats.star_power_amount, 0.25);
}
