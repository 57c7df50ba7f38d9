//! Typed failures returned at compilation checkpoints.
//!
//! Individual problems are reported through the
//! [`Reporter`](crate::diagnostics::Reporter) as they are found; these types
//! only tell the caller *that* a checkpoint failed and why, so it can stop.

/// An internal invariant was broken. Never caused by user input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("internal error: {message}")]
pub struct Fatal {
    pub message: String,
}

/// Failure of a single-file [`Driver`](crate::driver::Driver) phase.
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    /// The source file could not be read.
    #[error("cannot read '{file}': {source}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// Scanning or building reported errors.
    #[error("{file}: {errors} error(s) while parsing")]
    Syntax { file: String, errors: usize },

    /// Some deferred type specifiers could not be resolved.
    #[error("{file}: {unresolved} type reference(s) could not be resolved")]
    Unresolved { file: String, unresolved: usize },

    /// A phase was invoked out of order.
    #[error(transparent)]
    Fatal(#[from] Fatal),
}

/// Failure of a whole compilation unit, one variant per failure class.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed preprocessed file")]
    BadPreprocessedFile,

    #[error("failed to parse input file")]
    ParseError(#[source] ParseFailure),

    #[error("couldn't load all imports")]
    BadImport,

    #[error("type error")]
    BadType,

    #[error("refusing to generate code with unstructured parcelables")]
    FoundParcelable,

    #[error("invalid package declaration '{0}'")]
    BadPackage(String),

    #[error("invalid method ids")]
    BadMethodId,

    #[error("invalid constant declarations")]
    BadConstants,

    #[error(transparent)]
    Fatal(#[from] Fatal),
}

impl From<ParseFailure> for LoadError {
    fn from(e: ParseFailure) -> Self {
        match e {
            ParseFailure::Fatal(f) => LoadError::Fatal(f),
            other => LoadError::ParseError(other),
        }
    }
}
