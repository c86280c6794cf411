use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Section;

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// The reason a MAP file could not be decoded. Every kind that originates
/// from the byte stream carries the offset where decoding stopped.
#[derive(Debug, Error)]
pub enum DecodeErrorKind {
    #[error("truncated input at offset {offset}: {needed} bytes needed, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("marker mismatch at offset {offset}: expected {expected:?}, found {found:?}")]
    MarkerMismatch {
        offset: usize,
        expected: &'static str,
        found: String,
    },

    #[error("count mismatch at offset {offset}: {declared} {what} declared, {decoded} decoded")]
    CountMismatch {
        offset: usize,
        what: &'static str,
        declared: usize,
        decoded: usize,
    },

    #[error("unknown dialect at offset {offset}: {reason}")]
    UnknownDialect { offset: usize, reason: String },

    #[error("zero length string at offset {offset}")]
    InvalidString { offset: usize },

    #[error("{what} index {index} out of range, {len} available")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// The file is on the known-skip list and was never read
    #[error("known unsupported MAP file")]
    KnownUnsupported,

    #[error("could not read MAP file: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeErrorKind {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            Self::TruncatedInput { offset, .. }
            | Self::MarkerMismatch { offset, .. }
            | Self::CountMismatch { offset, .. }
            | Self::UnknownDialect { offset, .. }
            | Self::InvalidString { offset } => Some(offset),
            Self::IndexOutOfRange { .. } | Self::KnownUnsupported | Self::Io(_) => None,
        }
    }
}

/// A fatal decode failure with enough location information to find the bad
/// bytes: the file, the section being decoded and a trail of the records that
/// were open at the time.
#[derive(Debug)]
pub struct DecodeError {
    pub path: Option<PathBuf>,
    pub section: Option<Section>,
    /// Innermost record first
    pub context: Vec<String>,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn offset(&self) -> Option<usize> {
        self.kind.offset()
    }

    pub(crate) fn with_path(mut self, path: &Path) -> Self {
        if self.path.is_none() {
            self.path = Some(path.to_path_buf());
        }
        self
    }
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        Self {
            path: None,
            section: None,
            context: Vec::new(),
            kind,
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeErrorKind::Io(err).into()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: ", path.display())?;
        }
        if let Some(section) = self.section {
            write!(f, "{section}: ")?;
        }
        for what in self.context.iter().rev() {
            write!(f, "{what}: ")?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            DecodeErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Attach location information to a failed decode, in the same spirit as
/// `anyhow::Context`.
pub trait ResultExt<T> {
    fn context(self, what: &'static str) -> Result<T>;

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Record the section being decoded. The first section recorded wins.
    fn in_section(self, section: Section) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, what: &'static str) -> Result<T> {
        self.map_err(|mut err| {
            err.context.push(what.to_string());
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|mut err| {
            err.context.push(f());
            err
        })
    }

    fn in_section(self, section: Section) -> Result<T> {
        self.map_err(|mut err| {
            err.section.get_or_insert(section);
            err
        })
    }
}
