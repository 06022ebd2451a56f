use crate::{Node, StoreError};
use core::future::Future;

/// The capability the token lifecycle needs from a distributed key-value
/// store.
///
/// Implementations must be strongly consistent: the store, not any local
/// cache, decides whether a namespace exists. In particular
/// [`create_dir`](Self::create_dir) must be an atomic create-if-absent so that
/// two concurrent setups can never both claim the same path.
///
/// A single handle is shared across concurrent requests, so every operation
/// takes `&self` and returns a `Send` future. Timeouts and retries belong to
/// the implementation's client, not to callers.
pub trait NamespaceStore: Send + Sync {
    /// Creates an empty directory at `path`.
    ///
    /// Missing intermediate directories are created as needed.
    ///
    /// # Errors
    /// - [`StoreError::AlreadyExists`] if any node exists at `path`.
    /// - [`StoreError::NotADirectory`] if an ancestor of `path` is a leaf.
    /// - [`StoreError::Backend`] on connectivity failure.
    fn create_dir(&self, path: &str) -> impl Future<Output = Result<Node, StoreError>> + Send;

    /// Creates the leaf `relative` under the existing directory `dir` holding
    /// `value`.
    ///
    /// Intermediate segments of `relative` become directories.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if `dir` does not exist.
    /// - [`StoreError::AlreadyExists`] if the leaf already exists.
    /// - [`StoreError::NotADirectory`] if `dir` or an intermediate segment is
    ///   a leaf.
    /// - [`StoreError::Backend`] on connectivity failure.
    fn create_key(
        &self,
        dir: &str,
        relative: &str,
        value: &str,
    ) -> impl Future<Output = Result<Node, StoreError>> + Send;

    /// Deletes `path` and everything beneath it.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if nothing exists at `path`.
    /// - [`StoreError::Backend`] on connectivity failure.
    fn delete_recursive(&self, path: &str)
    -> impl Future<Output = Result<(), StoreError>> + Send;
}
