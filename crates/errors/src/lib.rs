#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for bankr
//!
//! One enum per domain: [`InputError`] for snapshots and protocol text,
//! [`AnalysisError`] for invariant violations reaching the engine, and
//! [`ConfigError`] for configuration. [`Error`] wraps them for callers that
//! cross crate boundaries.

use std::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;

pub mod analysis;
pub mod config;
pub mod input;

pub use analysis::AnalysisError;
pub use config::ConfigError;
pub use input::InputError;

/// Any failure a bankr command can report
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization of a response failed
    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<PathBuf>,
    },
}

impl Error {
    /// I/O failure while reading `path`
    pub fn io_with_path(err: &std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// How an error is presented on the command line
pub trait UserFacingError {
    /// One-line description
    fn user_message(&self) -> Cow<'_, str>;

    /// What the user can change to make the command succeed
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// True when running the same command again may succeed
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable dotted code such as `input.parse`
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Input(err) => err.user_message(),
            Error::Analysis(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Io {
                message,
                path: Some(path),
                ..
            } => Cow::Owned(format!("{}: {message}", path.display())),
            Error::Io { message, .. } => Cow::Borrowed(message.as_str()),
            Error::Internal(_) => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Input(err) => err.user_hint(),
            Error::Analysis(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Io { .. } | Error::Internal(_) => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Error::Io { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Input(err) => err.user_code(),
            Error::Analysis(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
