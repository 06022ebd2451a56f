use crate::{EntropyError, StoreError};

/// A result type defaulting to the crate [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors a token lifecycle operation can produce.
///
/// Every variant is terminal for the operation that produced it. None of them
/// imply a partially successful result was returned to the caller.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller supplied an unusable argument (a zero cluster size, an empty
    /// or malformed token).
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The entropy source could not produce bytes for a new token.
    #[error("couldn't generate a token: {0}")]
    GenerationFailed(#[from] EntropyError),

    /// The namespace directory or its size key could not be established.
    ///
    /// The token is carried so operators can locate a namespace that may have
    /// been left behind without its size key.
    #[error("couldn't set up namespace {path} for token {token}: {cause}")]
    StoreSetupFailed {
        token: String,
        path: String,
        cause: SetupFailure,
    },

    /// The recursive delete of a namespace was rejected.
    #[error("couldn't tear down namespace {path}: {source}")]
    StoreTeardownFailed { path: String, source: StoreError },

    /// The configured base URL is not a bare origin.
    #[error("invalid base URL: {reason}")]
    InvalidBaseUrl { reason: String },
}

impl Error {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_base_url(reason: impl Into<String>) -> Self {
        Self::InvalidBaseUrl {
            reason: reason.into(),
        }
    }

    /// Returns the underlying store error, if the failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::StoreSetupFailed {
                cause: SetupFailure::Store(e),
                ..
            } => Some(e),
            Self::StoreTeardownFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Why a setup step was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupFailure {
    /// The store refused the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The store acknowledged a directory creation but described a different
    /// node than the one requested.
    #[error("store returned unexpected node (key: {key}, dir: {dir})")]
    UnexpectedNode { key: String, dir: bool },
}
