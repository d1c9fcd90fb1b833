use crate::error::{Error, Result};
use crate::game::timing_windows::HitWindow;
use std::hash::Hasher;
use std::io::{Read, Write};
use twox_hash::XxHash64;

/// Newest parameter layout this build writes and understands.
///
/// - v0: front end, back end
/// - v1: + hit window size, front/back ratio, star multiplier thresholds
pub const PARAMETERS_VERSION: u32 = 1;

/// Score multiples of the base score needed for each star tier.
pub const DEFAULT_STAR_MULTIPLIER_THRESHOLDS: [f32; 7] =
    [0.21, 0.46, 0.77, 1.85, 3.08, 4.52, 6.08];

/// Timing and scoring configuration. Immutable once an engine is built.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineParameters {
    pub hit_window: HitWindow,
    pub star_multiplier_thresholds: Vec<f32>,
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            hit_window: HitWindow::default(),
            star_multiplier_thresholds: DEFAULT_STAR_MULTIPLIER_THRESHOLDS.to_vec(),
        }
    }
}

impl EngineParameters {
    pub fn new(hit_window: f64, front_to_back_ratio: f64, star_multiplier_thresholds: &[f32]) -> Self {
        Self {
            hit_window: HitWindow::new(hit_window, front_to_back_ratio),
            star_multiplier_thresholds: star_multiplier_thresholds.to_vec(),
        }
    }

    /// Scales the multiplier curve by a finalized base score.
    pub fn star_score_thresholds(&self, base_score: u32) -> Vec<u32> {
        self.star_multiplier_thresholds
            .iter()
            .map(|m| (f64::from(base_score) * f64::from(*m)).round() as u32)
            .collect()
    }

    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.serialize_as(writer, PARAMETERS_VERSION)
    }

    /// Writes exactly the fields introduced at or before `version`.
    pub fn serialize_as<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        check_version(version)?;
        let cfg = bincode::config::standard();

        bincode::encode_into_std_write(self.hit_window.front_end, writer, cfg)?;
        bincode::encode_into_std_write(self.hit_window.back_end, writer, cfg)?;

        if version >= 1 {
            bincode::encode_into_std_write(self.hit_window.size, writer, cfg)?;
            bincode::encode_into_std_write(self.hit_window.front_to_back_ratio, writer, cfg)?;
            bincode::encode_into_std_write(&self.star_multiplier_thresholds, writer, cfg)?;
        }
        Ok(())
    }

    /// Reads a parameter block written with `version`. Fields newer than
    /// `version` keep their defaults.
    pub fn deserialize<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        check_version(version)?;
        let cfg = bincode::config::standard();
        let mut params = Self::default();

        let front_end: f64 = bincode::decode_from_std_read(reader, cfg)?;
        let back_end: f64 = bincode::decode_from_std_read(reader, cfg)?;
        // v0 only carries the ends; recover the width and ratio they imply.
        let size = back_end - front_end;
        let half = size / 2.0;
        params.hit_window = HitWindow {
            size,
            front_to_back_ratio: if half > 0.0 { -front_end / half } else { 1.0 },
            front_end,
            back_end,
        };

        if version >= 1 {
            params.hit_window.size = bincode::decode_from_std_read(reader, cfg)?;
            params.hit_window.front_to_back_ratio = bincode::decode_from_std_read(reader, cfg)?;
            params.star_multiplier_thresholds = bincode::decode_from_std_read(reader, cfg)?;
        }
        Ok(params)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.serialize(&mut buf)?;
        Ok(buf)
    }

    /// Stable hash of the current serialized form, for replay compatibility.
    pub fn fingerprint(&self) -> Result<u64> {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&self.to_bytes()?);
        Ok(hasher.finish())
    }
}

fn check_version(version: u32) -> Result<()> {
    if version > PARAMETERS_VERSION {
        return Err(Error::UnsupportedVersion { found: version, newest: PARAMETERS_VERSION });
    }
    Ok(())
}
