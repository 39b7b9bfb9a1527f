// src/error.rs

//! Error types for _lcslib_.
//!
//! Every variant belongs to one [`ErrorCategory`]. The category decides how
//! far an error reaches: a configuration error disables one `Rule` or
//! `Pattern`, a scan error disables one file location, a conversion error
//! discards one `Clue`. None of them stop an investigation.

use crate::common::{FPath, FileOffset, FileSz};

use ::thiserror::Error;

/// How far an [`Error`] reaches.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    /// Bad rule, pattern, or log type definition.
    Configuration,
    /// A file location could not be scanned.
    Scan,
    /// A captured text could not be converted to its declared type.
    Conversion,
    /// A scan task was aborted by a timeout or by the caller.
    Cancelled,
}

/// Errors surfaced by _lcslib_.
#[derive(Debug, Error)]
pub enum Error {
    /// A constraint coordinate refers to a clue or group that does not exist.
    #[error("constraint coordinate ({clue_index}, {group_index}) does not exist in rule for effect {effect:?}")]
    UnknownCoordinate {
        effect: String,
        clue_index: usize,
        group_index: usize,
    },

    /// A capture group declared an unknown scalar type.
    #[error("unsupported converter {0:?}")]
    UnsupportedConverter(String),

    /// A log type file locator cannot be scanned.
    #[error("unsupported file locator {kind} {host}:{path}")]
    UnsupportedLocator {
        kind: String,
        host: String,
        path: FPath,
    },

    /// Two patterns share one name.
    #[error("pattern name {0:?} is not unique")]
    DuplicatePatternName(String),

    /// A rule refers to a pattern name that is not known.
    #[error("unknown pattern {0:?}")]
    UnknownPattern(String),

    /// A pattern regex failed to compile.
    #[error("pattern {name:?} has invalid regex: {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: ::regex::Error,
    },

    /// A primary key or typed group is not a capture group of the pattern.
    #[error("pattern {name:?} group {group_index} is not one of its {group_count} capture groups")]
    InvalidPrimaryKey {
        name: String,
        group_index: usize,
        group_count: usize,
    },

    /// Patterns of different log types were given to one matcher.
    #[error("pattern {name:?} has log type {found:?}, expected {expected:?}")]
    MixedLogTypes {
        name: String,
        expected: String,
        found: String,
    },

    /// A constraint was evaluated against values of the wrong type.
    #[error("constraint {constraint} cannot compare values {values}")]
    ConstraintType {
        constraint: &'static str,
        values: String,
    },

    /// Captured text could not be coerced to its declared type.
    #[error("pattern {pattern:?} group {group_index} value {text:?} is not a valid {scalar_type}")]
    Conversion {
        pattern: String,
        group_index: usize,
        text: String,
        scalar_type: &'static str,
    },

    /// Requested a file offset at or past the end of the file.
    #[error("offset {offset} is out of range for file {path:?} of size {filesz}")]
    OffsetOutOfRange {
        path: FPath,
        offset: FileOffset,
        filesz: FileSz,
    },

    /// The file has no bytes.
    #[error("file {0:?} is empty")]
    EmptyFile(FPath),

    /// A file locator names something other than a regular file.
    #[error("{0:?} is not a regular file")]
    NotRegularFile(FPath),

    /// Reading a file failed.
    #[error("{path:?}: {source}")]
    Io {
        path: FPath,
        #[source]
        source: std::io::Error,
    },

    /// A scan task did not finish.
    #[error("scan of {0:?} was cancelled")]
    Cancelled(FPath),
}

impl Error {
    /// Helper to wrap a [`std::io::Error`] with the path it happened on.
    pub fn io(path: &FPath, source: std::io::Error) -> Error {
        Error::Io {
            path: path.clone(),
            source,
        }
    }

    pub const fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownCoordinate { .. }
            | Error::UnsupportedConverter(_)
            | Error::UnsupportedLocator { .. }
            | Error::DuplicatePatternName(_)
            | Error::UnknownPattern(_)
            | Error::InvalidRegex { .. }
            | Error::InvalidPrimaryKey { .. }
            | Error::MixedLogTypes { .. }
            | Error::ConstraintType { .. }
            => ErrorCategory::Configuration,
            Error::OffsetOutOfRange { .. }
            | Error::EmptyFile(_)
            | Error::NotRegularFile(_)
            | Error::Io { .. }
            => ErrorCategory::Scan,
            Error::Conversion { .. } => ErrorCategory::Conversion,
            Error::Cancelled(_) => ErrorCategory::Cancelled,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
