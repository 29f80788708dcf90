//! Error type shared by the sieve, field, scheduler and sink layers

use std::fmt;

/// Errors raised while building engines or talking to transports
#[derive(Debug)]
pub enum XenakisError {
    /// Sieve clause with a bad modulus or an empty residue set
    InvalidClause(String),
    /// Probability field with unusable distribution parameters
    InvalidDistribution(String),
    /// Scheduler with a non-positive or non-finite rate bound
    InvalidScheduler(String),
    /// Cloud with an inconsistent pitch span
    InvalidCloud(String),
    /// Output configuration could not be parsed
    Config(String),
    /// MIDI device or OSC socket failure
    Transport(String),
    /// Serialization error
    Serde(String),
    /// IO error
    Io(std::io::Error),
}

impl fmt::Display for XenakisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XenakisError::InvalidClause(msg) => write!(f, "Invalid sieve clause: {}", msg),
            XenakisError::InvalidDistribution(msg) => write!(f, "Invalid distribution: {}", msg),
            XenakisError::InvalidScheduler(msg) => write!(f, "Invalid scheduler: {}", msg),
            XenakisError::InvalidCloud(msg) => write!(f, "Invalid cloud: {}", msg),
            XenakisError::Config(msg) => write!(f, "Configuration error: {}", msg),
            XenakisError::Transport(msg) => write!(f, "Transport error: {}", msg),
            XenakisError::Serde(msg) => write!(f, "Serialization error: {}", msg),
            XenakisError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for XenakisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XenakisError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for XenakisError {
    fn from(e: std::io::Error) -> Self {
        XenakisError::Io(e)
    }
}

impl From<serde_json::Error> for XenakisError {
    fn from(e: serde_json::Error) -> Self {
        XenakisError::Serde(e.to_string())
    }
}

/// Result type for crate operations
pub type XenakisResult<T> = Result<T, XenakisError>;
