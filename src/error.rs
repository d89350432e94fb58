//! Typed errors for the patching engines.
//!
//! Each engine owns one enum. The orchestration layer wraps them in
//! `anyhow::Error` with context, so only the variants callers need to
//! distinguish are modelled here.

use std::time::Duration;
use thiserror::Error;

/// Failures running or reading the external analyzer.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("failed to start analyzer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analyzer '{program}' did not finish within {}s", timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("analyzer '{program}' failed ({status})")]
    Failed { program: String, status: String },

    #[error("failed to read analyzer output: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures deriving an import declaration for a reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("identifier '{0}' does not carry the generated-module prefix")]
    PrefixMismatch(String),

    #[error("identifier '{0}' is not strict PascalCase after its prefix")]
    NotPascalCase(String),
}

/// Structural problems found while editing the registration file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("malformed entry in update block at line {line}: {text}")]
    MalformedEntry { line: usize, text: String },

    #[error("update block opened at line {line} is never closed")]
    UnterminatedBlock { line: usize },
}
