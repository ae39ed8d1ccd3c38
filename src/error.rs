//! Error kinds shared by every component: IO, Parse, Config, Internal.

use thiserror::Error;

/// The one error type returned by every fallible operation in this crate.
///
/// Kinds mirror the propagation policy: `Io` for files that cannot be
/// opened or are truncated, `Parse` for bitstreams/JSON that don't match
/// the expected shape, `Config` for invalid caller-supplied parameters,
/// `Internal` for invariant violations that indicate a bug in this crate
/// rather than bad input.
#[derive(Error, Debug)]
pub enum HapticsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HapticsError {
    pub fn io<S: Into<String>>(msg: S) -> Self {
        HapticsError::Io(std::io::Error::other(msg.into()))
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        HapticsError::Parse(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        HapticsError::Config(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        HapticsError::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HapticsError>;
