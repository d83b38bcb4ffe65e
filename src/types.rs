// Error taxonomy for the probe stages

use std::fmt;

/// The stage of a probe run an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Credentials,
    Initialization,
    Write,
    Read,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Credentials => write!(f, "credentials"),
            Stage::Initialization => write!(f, "initialization"),
            Stage::Write => write!(f, "write"),
            Stage::Read => write!(f, "read"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("credentials stage failed: {0}")]
    Credential(String),

    #[error("initialization stage failed: {0}")]
    Initialization(String),

    #[error("write stage failed: {0}")]
    Write(String),

    #[error("read stage failed: {0}")]
    Read(String),

    #[error("read stage failed: document {0} not found")]
    NotFound(String),
}

impl ProbeError {
    pub fn stage(&self) -> Stage {
        match self {
            ProbeError::Credential(_) => Stage::Credentials,
            ProbeError::Initialization(_) => Stage::Initialization,
            ProbeError::Write(_) => Stage::Write,
            ProbeError::Read(_) | ProbeError::NotFound(_) => Stage::Read,
        }
    }
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;
