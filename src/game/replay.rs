use crate::error::{Error, Result};
use crate::game::input::GameInput;
use crate::game::parameters::{EngineParameters, PARAMETERS_VERSION};
use log::{info, warn};
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const REPLAY_MAGIC: [u8; 4] = *b"TJRP";
pub const REPLAY_FORMAT_VERSION: u32 = 1;

/// Recorded input stream plus the parameters it was played with.
///
/// Layout: magic, format version, parameter version, parameter block,
/// parameter fingerprint, inputs. Integers use bincode's standard config.
#[derive(Clone, Debug, PartialEq)]
pub struct Replay {
    pub parameters_version: u32,
    pub parameters: EngineParameters,
    pub fingerprint: u64,
    pub inputs: Vec<GameInput>,
}

impl Replay {
    pub fn record(parameters: &EngineParameters, inputs: Vec<GameInput>) -> Result<Self> {
        Ok(Self {
            parameters_version: PARAMETERS_VERSION,
            parameters: parameters.clone(),
            fingerprint: parameters.fingerprint()?,
            inputs,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let cfg = bincode::config::standard();
        writer.write_all(&REPLAY_MAGIC)?;
        bincode::encode_into_std_write(REPLAY_FORMAT_VERSION, writer, cfg)?;
        bincode::encode_into_std_write(self.parameters_version, writer, cfg)?;
        self.parameters.serialize_as(writer, self.parameters_version)?;
        bincode::encode_into_std_write(self.fingerprint, writer, cfg)?;
        bincode::encode_into_std_write(&self.inputs, writer, cfg)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let cfg = bincode::config::standard();
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != REPLAY_MAGIC {
            return Err(Error::BadMagic);
        }

        let format: u32 = bincode::decode_from_std_read(reader, cfg)?;
        if format > REPLAY_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion { found: format, newest: REPLAY_FORMAT_VERSION });
        }

        let parameters_version: u32 = bincode::decode_from_std_read(reader, cfg)?;
        let parameters = EngineParameters::deserialize(reader, parameters_version)?;
        let fingerprint = bincode::decode_from_std_read(reader, cfg)?;
        let inputs = bincode::decode_from_std_read(reader, cfg)?;
        Ok(Self { parameters_version, parameters, fingerprint, inputs })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(fs::File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        info!("Saved replay with {} inputs to {:?}", self.inputs.len(), path);
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let replay = Self::read_from(&mut BufReader::new(fs::File::open(path)?))?;
        info!("Loaded replay with {} inputs from {:?}", replay.inputs.len(), path);
        Ok(replay)
    }

    /// Fails if `params` would not judge this replay the way it was recorded.
    pub fn check_compatible(&self, params: &EngineParameters) -> Result<()> {
        let actual = params.fingerprint()?;
        if actual != self.fingerprint {
            warn!("Replay fingerprint {:#018x} does not match {:#018x}", self.fingerprint, actual);
            return Err(Error::ReplayMismatch { expected: self.fingerprint, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn inputs() -> Vec<GameInput> {
        vec![GameInput::new(0.5, 1, 1), GameInput::new(0.75, 1, 0), GameInput::new(1.0, 10, 1)]
    }

    #[test]
    fn replay_survives_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.replay");
        let params = EngineParameters::new(0.12, 0.8, &[0.5, 1.5]);

        let replay = Replay::record(&params, inputs()).unwrap();
        replay.save(&path).unwrap();
        let loaded = Replay::load(&path).unwrap();

        assert_eq!(loaded, replay);
        loaded.check_compatible(&params).unwrap();
    }

    #[test]
    fn different_parameters_are_rejected() {
        let replay = Replay::record(&EngineParameters::default(), inputs()).unwrap();
        let other = EngineParameters::new(0.2, 1.0, &[1.0]);
        let err = replay.check_compatible(&other).unwrap_err();
        assert!(matches!(err, Error::ReplayMismatch { expected, .. } if expected == replay.fingerprint));
    }

    #[test]
    fn foreign_bytes_are_not_a_replay() {
        let err = Replay::read_from(&mut Cursor::new(b"RIFF\x00\x00".to_vec())).unwrap_err();
        assert!(matches!(err, Error::BadMagic));
    }

    #[test]
    fn newer_format_is_refused() {
        let mut buf = REPLAY_MAGIC.to_vec();
        bincode::encode_into_std_write(REPLAY_FORMAT_VERSION + 1, &mut buf, bincode::config::standard()).unwrap();
        let err = Replay::read_from(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
    }
}
