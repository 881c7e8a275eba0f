use termion::{color, style};
use thiserror::Error;

use crate::runtime::{Fault, LoadError};

/// The program file could not be read.
const EXIT_NO_INPUT: i32 = 66;
/// The program file was read but is not a valid program.
const EXIT_DATA_ERROR: i32 = 65;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl DriverError {
    pub fn render(&self, colored: bool) -> String {
        if colored {
            format!(
                "{}{}error{}: {self}",
                style::Bold,
                color::Fg(color::Red),
                style::Reset
            )
        } else {
            format!("error: {self}")
        }
    }

    /// A fault exits with its kind's code, load problems with the sysexits
    /// codes for missing or malformed input.
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::Io { .. } => EXIT_NO_INPUT,
            DriverError::Load(_) => EXIT_DATA_ERROR,
            DriverError::Fault(fault) => fault.kind.code(),
        }
    }
}
