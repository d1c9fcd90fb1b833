use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trackjudge::config::EngineConfig;
use trackjudge::game::chart::{Chart, ChartFile};
use trackjudge::game::drums::DrumsJudgment;
use trackjudge::game::frets::FretJudgment;
use trackjudge::game::judgment::Judgment;
use trackjudge::game::parameters::EngineParameters;
use trackjudge::game::replay::Replay;
use trackjudge::game::solo::SoloSection;
use trackjudge::game::stats::EngineStats;
use trackjudge::game::timing::SyncTrack;
use trackjudge::{Engine, GameInput};

const CONFIG_PATH: &str = "trackjudge.ini";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Instrument {
    Drums,
    Frets,
}

#[derive(Parser)]
#[command(name = "trackjudge")]
#[command(about = "Judge and score a recorded play of a chart", version)]
struct Args {
    /// Chart JSON file
    #[arg(long, value_name = "FILE")]
    chart: PathBuf,

    /// Inputs as a JSON array or a binary replay
    #[arg(long, value_name = "FILE")]
    inputs: Option<PathBuf>,

    /// Stop at this song time in seconds (default: one second past the last note)
    #[arg(long)]
    time: Option<f64>,

    #[arg(long, value_enum, default_value_t = Instrument::Drums)]
    instrument: Instrument,

    #[arg(long, value_name = "FILE", default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Let the bot play instead of replaying inputs
    #[arg(long)]
    bot: bool,

    /// Save the replayed inputs as a binary replay
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,
}

#[derive(Serialize)]
struct Summary<'a> {
    inputs_consumed: usize,
    base_score: u32,
    total_score: u32,
    star_score_thresholds: &'a [u32],
    solo_sections: &'a [SoloSection],
    stats: &'a EngineStats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    let args = Args::parse();

    if !args.config.exists()
        && let Err(e) = EngineConfig::default().save(&args.config)
    {
        warn!("Failed to create default config file: {e}");
    }
    let config = EngineConfig::load(&args.config);
    log::set_max_level(config.log_level.as_level_filter());
    let params = config.to_parameters();

    let (sync, chart) = ChartFile::load(&args.chart)?.build();
    let end_time = args.time.unwrap_or_else(|| default_end_time(&chart));
    let inputs = match &args.inputs {
        Some(path) => load_inputs(path, &params)?,
        None => Vec::new(),
    };

    if let Some(path) = &args.record {
        Replay::record(&params, inputs.clone())?.save(path)?;
    }

    let sync = Arc::new(sync);
    match args.instrument {
        Instrument::Drums => {
            let judge = DrumsJudgment::with_max_multiplier(config.max_multiplier);
            run(Engine::new(judge, chart, sync, params), &inputs, end_time, args.bot)
        }
        Instrument::Frets => {
            let judge = FretJudgment::with_max_multiplier(config.max_multiplier);
            run(Engine::new(judge, chart, sync, params), &inputs, end_time, args.bot)
        }
    }
}

fn run<J: Judgment>(
    mut engine: Engine<J, SyncTrack>,
    inputs: &[GameInput],
    end_time: f64,
    bot: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let consumed = if bot {
        let note_times: Vec<f64> = engine.chart().heads().iter().map(|&h| engine.chart().note(h).time).collect();
        for time in note_times.into_iter().filter(|t| *t <= end_time) {
            engine.update_bot(time);
        }
        engine.update_bot(end_time);
        0
    } else {
        engine.process_up_to_time(end_time, inputs)
    };

    for event in engine.drain_events() {
        info!("{}", serde_json::to_string(&event)?);
    }

    let summary = Summary {
        inputs_consumed: consumed,
        base_score: engine.base_score(),
        total_score: engine.stats().total_score(),
        star_score_thresholds: engine.star_score_thresholds(),
        solo_sections: engine.solo_sections(),
        stats: engine.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn default_end_time(chart: &Chart) -> f64 {
    chart.heads().last().map_or(0.0, |&h| chart.note(h).time + 1.0)
}

/// JSON files are plain input arrays; anything else is read as a replay and
/// must match the active parameters.
fn load_inputs(path: &Path, params: &EngineParameters) -> trackjudge::Result<Vec<GameInput>> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let content = std::fs::read_to_string(path)?;
        let inputs: Vec<GameInput> = serde_json::from_str(&content)?;
        info!("Loaded {} inputs from {:?}", inputs.len(), path);
        return Ok(inputs);
    }
    let replay = Replay::load(path)?;
    replay.check_compatible(params)?;
    Ok(replay.inputs)
}
