/// Errors reported by a [`crate::NamespaceStore`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A node already exists at the path a create targeted.
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// The path (or the directory a key must live under) does not exist.
    #[error("key not found: {0}")]
    NotFound(String),

    /// A path segment that must be a directory is a leaf key.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The operation targeted the store root, which is never created or
    /// deleted through this interface.
    #[error("refusing to operate on the store root")]
    RootPath,

    /// Connectivity, timeout, or protocol failure talking to the store.
    #[error("store backend error: {0}")]
    Backend(String),
}
