#[cfg(feature = "tracing")]
use tracing::{error, info, instrument, warn};

use crate::{
    EntropySource, Error, NamespaceStore, OsEntropy, Result, SetupFailure, Token,
    TokenGenerator, join_path, normalize_path,
};

/// Store directory under which every token namespace lives.
pub const DEFAULT_REGISTRY_ROOT: &str = "/_etcd/registry";

/// Key, relative to a namespace, that holds the expected cluster size.
pub const SIZE_KEY: &str = "_config/size";

/// Cluster size used when a request doesn't ask for one.
pub const DEFAULT_CLUSTER_SIZE: u32 = 3;

/// Creates and removes discovery tokens together with their store namespace.
///
/// A token, its namespace directory, and the namespace's size key form one
/// logical unit. [`setup`](Self::setup) only hands out a token once both store
/// writes have been acknowledged.
///
/// ## Partial setup
///
/// If the directory is created but the size key write fails, the directory is
/// left in the store without its size key and the setup reports
/// [`Error::StoreSetupFailed`]. Enable
/// [`with_rollback`](Self::with_rollback) to make a best-effort recursive
/// delete of that directory before the failure is returned.
///
/// The manager keeps no per-request state; a single instance can serve any
/// number of concurrent setups.
#[derive(Debug)]
pub struct TokenManager<S, R = OsEntropy>
where
    S: NamespaceStore,
    R: EntropySource,
{
    store: S,
    generator: TokenGenerator<R>,
    root: String,
    rollback_partial_setup: bool,
}

impl<S> TokenManager<S, OsEntropy>
where
    S: NamespaceStore,
{
    /// Creates a manager drawing tokens from the OS CSPRNG and registering
    /// them under [`DEFAULT_REGISTRY_ROOT`].
    pub fn new(store: S) -> Self {
        Self::with_generator(store, TokenGenerator::os())
    }
}

impl<S, R> TokenManager<S, R>
where
    S: NamespaceStore,
    R: EntropySource,
{
    pub fn with_generator(store: S, generator: TokenGenerator<R>) -> Self {
        Self {
            store,
            generator,
            root: DEFAULT_REGISTRY_ROOT.to_owned(),
            rollback_partial_setup: false,
        }
    }

    /// Registers namespaces under `root` instead of [`DEFAULT_REGISTRY_ROOT`].
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if `root` is the store root itself.
    pub fn with_root(mut self, root: &str) -> Result<Self> {
        let root = normalize_path(root);
        if root == "/" {
            return Err(Error::invalid_argument(
                "registry root must not be the store root",
            ));
        }
        self.root = root;
        Ok(self)
    }

    /// Deletes a freshly created namespace when its size key can't be
    /// written.
    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.rollback_partial_setup = enabled;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Absolute store path of `token`'s namespace.
    pub fn namespace_path(&self, token: &Token) -> String {
        join_path(&self.root, token.as_str())
    }

    /// Generates a token and establishes its namespace seeded with `size`.
    ///
    /// The store sees exactly two writes, in order: a create of the namespace
    /// directory, then a create of its [`SIZE_KEY`] holding `size` in decimal.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if `size` is zero. No store call is made.
    /// - [`Error::GenerationFailed`] if no token could be generated. No store
    ///   call is made.
    /// - [`Error::StoreSetupFailed`] if either write is rejected, or if the
    ///   store acknowledges the directory with a node that isn't a directory
    ///   at the requested path.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(root = %self.root)))]
    pub async fn setup(&self, size: u32) -> Result<Token> {
        if size == 0 {
            return Err(Error::invalid_argument("cluster size must be positive"));
        }

        let token = self.generator.generate().inspect_err(|_e| {
            #[cfg(feature = "tracing")]
            error!(error = %_e, "couldn't generate a token");
        })?;
        let path = self.namespace_path(&token);

        let node = self
            .store
            .create_dir(&path)
            .await
            .map_err(|e| self.setup_failed(&token, &path, e.into()))?;
        if node.key != path || !node.dir {
            return Err(self.setup_failed(
                &token,
                &path,
                SetupFailure::UnexpectedNode {
                    key: node.key,
                    dir: node.dir,
                },
            ));
        }

        if let Err(e) = self
            .store
            .create_key(&path, SIZE_KEY, &size.to_string())
            .await
        {
            if self.rollback_partial_setup {
                self.rollback(&path).await;
            } else {
                #[cfg(feature = "tracing")]
                warn!(%token, %path, "namespace left without size key");
            }
            return Err(self.setup_failed(&token, &path, e.into()));
        }

        #[cfg(feature = "tracing")]
        info!(%token, size, "new cluster created");

        Ok(token)
    }

    /// Recursively removes the namespace of `token`.
    ///
    /// Tokens are never reissued, so a torn-down token stays dead.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if `token` is empty or not a well-formed
    ///   token. Nothing is sent to the store, so a bad argument can never
    ///   address the registry root or a path outside it.
    /// - [`Error::StoreTeardownFailed`] if the namespace doesn't exist or the
    ///   store rejects the delete.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(root = %self.root)))]
    pub async fn teardown(&self, token: &str) -> Result<()> {
        let token = Token::parse(token)?;
        let path = self.namespace_path(&token);

        match self.store.delete_recursive(&path).await {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                info!(%token, "cluster deleted");
                Ok(())
            }
            Err(source) => {
                #[cfg(feature = "tracing")]
                error!(%token, %path, error = %source, "couldn't delete namespace");
                Err(Error::StoreTeardownFailed { path, source })
            }
        }
    }

    fn setup_failed(&self, token: &Token, path: &str, cause: SetupFailure) -> Error {
        #[cfg(feature = "tracing")]
        error!(%token, %path, error = %cause, "couldn't set up state");

        Error::StoreSetupFailed {
            token: token.to_string(),
            path: path.to_owned(),
            cause,
        }
    }

    async fn rollback(&self, path: &str) {
        match self.store.delete_recursive(path).await {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                info!(%path, "rolled back partial namespace");
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(%path, error = %_e, "rollback of partial namespace failed");
            }
        }
    }
}
