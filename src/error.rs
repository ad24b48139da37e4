use std::path::PathBuf;

use thiserror::Error;

use crate::time::Time;
use crate::types::LengthUnits;

/// Fatal errors. Any of these aborts the current validation run.
///
/// Conformance violations (budget overruns) are not errors; they are reported
/// through [`EventHandler::error`](crate::validator::EventHandler::error).
#[derive(Error, Debug)]
pub enum HrmError {
    #[error("Time intervals are overlapping: document begins at {begin} but the stream is at {current}")]
    OverlappingIntervals { current: Time, begin: Time },
    #[error("Snapshots are not in order of increasing offset ({current} follows {previous})")]
    OutOfOrder { previous: Time, current: Time },
    #[error("Unsupported {property} units: {units}")]
    UnsupportedUnits {
        property: &'static str,
        units: LengthUnits,
    },
    #[error("Unsupported colorimetry system: {0}")]
    UnsupportedColorimetry(String),
    #[error("Invalid time expression: {0:?}")]
    InvalidTime(String),
    #[error("Time arithmetic out of range: {0}")]
    TimeOverflow(String),
    #[error("Arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),
    #[error("Malformed document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, HrmError>;
