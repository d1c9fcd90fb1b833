use crate::error::Result;
use crate::game::judgment::DEFAULT_MAX_MULTIPLIER;
use crate::game::parameters::{DEFAULT_STAR_MULTIPLIER_THRESHOLDS, EngineParameters};
use crate::game::timing_windows::{DEFAULT_FRONT_TO_BACK_RATIO, DEFAULT_HIT_WINDOW_S};
use ini::Ini;
use log::{info, warn};
use std::path::Path;
use std::str::FromStr;

const ENGINE_SECTION: &str = "Engine";
const LOGGING_SECTION: &str = "Logging";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub hit_window: f64,
    pub front_to_back_ratio: f64,
    pub star_multiplier_thresholds: Vec<f32>,
    pub max_multiplier: u32,
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hit_window: DEFAULT_HIT_WINDOW_S,
            front_to_back_ratio: DEFAULT_FRONT_TO_BACK_RATIO,
            star_multiplier_thresholds: DEFAULT_STAR_MULTIPLIER_THRESHOLDS.to_vec(),
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
            log_level: LogLevel::Warn,
        }
    }
}

impl EngineConfig {
    /// Reads `path`, using defaults for a missing file and for any missing or
    /// malformed key. Never fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file {path:?} not found, using defaults");
            return Self::default();
        }
        match Ini::load_from_file(path) {
            Ok(conf) => {
                info!("Loaded config from {path:?}");
                Self::from_ini(&conf)
            }
            Err(e) => {
                warn!("Failed to read config {path:?}: {e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn from_ini(conf: &Ini) -> Self {
        let default = Self::default();
        Self {
            hit_window: read_key(conf, ENGINE_SECTION, "HitWindow", |v| {
                v.parse::<f64>().ok().filter(|w| w.is_finite() && *w > 0.0)
            })
            .unwrap_or(default.hit_window),
            front_to_back_ratio: read_key(conf, ENGINE_SECTION, "FrontToBackRatio", |v| {
                v.parse::<f64>().ok().filter(|r| r.is_finite())
            })
            .map_or(default.front_to_back_ratio, |r| r.clamp(0.0, 2.0)),
            star_multiplier_thresholds: read_key(conf, ENGINE_SECTION, "StarMultiplierThresholds", parse_thresholds)
                .unwrap_or(default.star_multiplier_thresholds),
            max_multiplier: read_key(conf, ENGINE_SECTION, "MaxMultiplier", |v| v.parse::<u32>().ok())
                .map_or(default.max_multiplier, |m| m.max(1)),
            log_level: read_key(conf, LOGGING_SECTION, "LogLevel", |v| LogLevel::from_str(v).ok())
                .unwrap_or(default.log_level),
        }
    }

    pub fn to_ini(&self) -> Ini {
        let thresholds = self
            .star_multiplier_thresholds
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut conf = Ini::new();
        conf.with_section(Some(ENGINE_SECTION))
            .set("HitWindow", self.hit_window.to_string())
            .set("FrontToBackRatio", self.front_to_back_ratio.to_string())
            .set("StarMultiplierThresholds", thresholds)
            .set("MaxMultiplier", self.max_multiplier.to_string());
        conf.with_section(Some(LOGGING_SECTION))
            .set("LogLevel", self.log_level.as_str());
        conf
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_ini().write_to_file(path)?;
        info!("Wrote config to {path:?}");
        Ok(())
    }

    pub fn to_parameters(&self) -> EngineParameters {
        EngineParameters::new(self.hit_window, self.front_to_back_ratio, &self.star_multiplier_thresholds)
    }
}

/// Looks up one key; present-but-unparsable values are reported and treated
/// as missing.
fn read_key<T>(conf: &Ini, section: &str, key: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let raw = conf.get_from(Some(section), key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!("Ignoring invalid [{section}] {key}={raw:?}");
    }
    parsed
}

fn parse_thresholds(v: &str) -> Option<Vec<f32>> {
    let values = v
        .split(',')
        .map(|t| t.trim().parse::<f32>().ok().filter(|t| t.is_finite() && *t >= 0.0))
        .collect::<Option<Vec<_>>>()?;
    let ascending = values.windows(2).all(|w| w[0] <= w[1]);
    (!values.is_empty() && ascending).then_some(values)
}
