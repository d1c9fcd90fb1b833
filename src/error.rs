use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode binary data: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to decode binary data: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Unsupported format version {found} (newest understood: {newest})")]
    UnsupportedVersion { found: u32, newest: u32 },

    #[error("Not a replay file")]
    BadMagic,

    #[error("Replay was recorded with different engine parameters: expected {expected:#018x}, got {actual:#018x}")]
    ReplayMismatch { expected: u64, actual: u64 },

    #[error("Incremental replay between two timestamps is not implemented")]
    IncrementalReplayUnsupported,
}

pub type Result<T> = std::result::Result<T, Error>;
