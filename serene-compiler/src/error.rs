// Compile-time failure taxonomy
// Every failure is fatal for the whole run; there is no partial output.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Malformed parse tree: {0}")]
    MalformedTree(String),

    #[error("Duplicate field '{tag}' in {construct}")]
    DuplicateTag { construct: String, tag: String },

    #[error("Unrecognized {construct} '{tag}'")]
    UnknownTag { construct: &'static str, tag: String },

    #[error("Invalid accessor '{0}'")]
    InvalidAccessor(String),

    #[error("{0}")]
    Scope(String),

    #[error("{0}")]
    Type(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    pub fn malformed(message: impl Into<String>) -> Self {
        CompileError::MalformedTree(message.into())
    }

    pub fn unknown(construct: &'static str, tag: impl Into<String>) -> Self {
        CompileError::UnknownTag {
            construct,
            tag: tag.into(),
        }
    }

    pub fn scope(message: impl Into<String>) -> Self {
        CompileError::Scope(message.into())
    }
}
