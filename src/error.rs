//! Error taxonomy for a single `atten` invocation.
//!
//! Every error is terminal: it is printed as one line on stderr and mapped to
//! a fixed exit code so wrapper scripts can branch on the kind.

use std::process::ExitCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AttenError>;

#[derive(Error, Debug)]
pub enum AttenError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown attenuator channel {0} (not part of any path in this experiment)")]
    UnknownChannel(u32),

    #[error("attenuation {value} dB on channel {channel} is out of range (0 to {max} dB)")]
    Range { channel: u32, value: f64, max: f64 },

    #[error("hardware error on channel {channel}: {message}")]
    Hardware { channel: u32, message: String },

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

impl AttenError {
    /// Exit status reported for this kind of failure. Success is always 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            AttenError::Usage(_) => 2,
            AttenError::Config(_) => 3,
            AttenError::UnknownChannel(_) => 4,
            AttenError::Range { .. } => 5,
            AttenError::Hardware { .. } => 6,
            AttenError::Output(_) => 1,
        }
    }

    pub fn hardware(channel: u32, message: impl Into<String>) -> Self {
        AttenError::Hardware {
            channel,
            message: message.into(),
        }
    }
}

impl From<&AttenError> for ExitCode {
    fn from(err: &AttenError) -> Self {
        ExitCode::from(err.exit_code())
    }
}

/// Flatten an anyhow chain into a single-line configuration error.
impl From<anyhow::Error> for AttenError {
    fn from(err: anyhow::Error) -> Self {
        AttenError::Config(format!("{:#}", err))
    }
}

impl From<figment::Error> for AttenError {
    fn from(err: figment::Error) -> Self {
        AttenError::Config(err.to_string().replace('\n', "; "))
    }
}
