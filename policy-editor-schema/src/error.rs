//! Error types for policy translation.
//!
//! Every failure is terminal for the call that produced it and no destination bytes are
//! written once one occurs.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;

/// Textual representation involved in a parse or serialize failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// XACML-style XML policy
    Xml,
    /// Editor JSON schema
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => f.write_str("XML"),
            Self::Json => f.write_str("JSON"),
        }
    }
}

/// Pipeline stage at which a translation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Parse,
    Root,
    Serialize,
    Sink,
}

/// Errors that can occur while translating a policy document.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// A required source identifier was not supplied.
    #[error("{0} parameter is missing")]
    MissingInput(&'static str),

    /// Source bytes could not be parsed into the expected tree or value shape.
    #[error("Failed to parse {format} input: {message}")]
    Parse { format: Format, message: String },

    /// The parsed document has neither a `policy-set` nor a `policy` root.
    #[error("Unrecognized policy root '{0}': expected 'policy-set' or 'policy'")]
    UnrecognizedRoot(String),

    /// The transformed tree could not be rendered to output bytes.
    #[error("Failed to serialize {format} output: {message}")]
    Serialize { format: Format, message: String },

    /// Reading the source or writing the destination failed.
    #[error("Failed to {operation} {}: {source}", .path.display())]
    Sink {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TranslationError {
    pub(crate) fn parse(format: Format, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }

    pub(crate) fn serialize(format: Format, message: impl Into<String>) -> Self {
        Self::Serialize {
            format,
            message: message.into(),
        }
    }

    pub fn sink(operation: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Sink {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// The stage of the pipeline that produced this error
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingInput(_) => Stage::Input,
            Self::Parse { .. } => Stage::Parse,
            Self::UnrecognizedRoot(_) => Stage::Root,
            Self::Serialize { .. } => Stage::Serialize,
            Self::Sink { .. } => Stage::Sink,
        }
    }
}
