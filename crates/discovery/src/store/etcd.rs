//! etcd v3 backed [`NamespaceStore`].
//!
//! etcd v3 has a flat keyspace, so directories are modelled with marker keys:
//! a directory at `/a/b` is the empty key `/a/b/`, and a leaf at `/a/b` is the
//! bare key `/a/b`. Every operation is a single transaction, so existence
//! checks and writes are atomic on the server.

use crate::{NamespaceStore, Node, StoreError, ancestors, join_path, normalize_path};
use etcd_client::{
    Client, Compare, CompareOp, ConnectOptions, DeleteOptions, KvClient, Txn, TxnOp,
    TxnOpResponse, TxnResponse,
};
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

/// A [`NamespaceStore`] talking to an etcd v3 cluster.
///
/// The underlying gRPC channel is shared by clones, so one `EtcdStore` can be
/// handed to every request handler.
#[derive(Clone)]
pub struct EtcdStore {
    kv: KvClient,
}

impl core::fmt::Debug for EtcdStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EtcdStore").finish_non_exhaustive()
    }
}

impl EtcdStore {
    /// Connects to `endpoints`, applying `timeout` to both connection setup
    /// and each request.
    ///
    /// # Errors
    /// - [`StoreError::Backend`] if no endpoint can be reached.
    #[cfg_attr(feature = "tracing", instrument(skip(endpoints), fields(endpoints = ?endpoints)))]
    pub async fn connect(endpoints: &[String], timeout: Duration) -> Result<Self, StoreError> {
        let options = ConnectOptions::new()
            .with_connect_timeout(timeout)
            .with_timeout(timeout);
        let client = Client::connect(endpoints, Some(options))
            .await
            .map_err(backend)?;

        #[cfg(feature = "tracing")]
        debug!("connected to etcd");

        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            kv: client.kv_client(),
        }
    }

    async fn txn(&self, txn: Txn) -> Result<TxnResponse, StoreError> {
        self.kv.clone().txn(txn).await.map_err(backend)
    }
}

fn backend(e: etcd_client::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn dir_marker(path: &str) -> String {
    format!("{path}/")
}

fn absent(key: &str) -> Compare {
    Compare::create_revision(key, CompareOp::Equal, 0)
}

fn present(key: &str) -> Compare {
    Compare::create_revision(key, CompareOp::Greater, 0)
}

fn get(key: &str) -> TxnOp {
    TxnOp::get(key, None)
}

/// Which `Get` ops of a failed transaction found a key, in issue order.
fn found_keys(responses: &[TxnOpResponse]) -> Vec<bool> {
    responses
        .iter()
        .map(|r| matches!(r, TxnOpResponse::Get(resp) if !resp.kvs().is_empty()))
        .collect()
}

fn compare_failed(path: &str) -> StoreError {
    StoreError::Backend(format!("transaction on {path} failed without a visible cause"))
}

/// Explains a failed `create_dir` transaction.
///
/// `found` follows the `or_else` order: `[path, marker, parents...]`.
fn create_dir_failure(path: &str, parents: &[&str], found: &[bool]) -> StoreError {
    let hit = |idx: usize| found.get(idx).copied().unwrap_or(false);

    if hit(0) || hit(1) {
        return StoreError::AlreadyExists(path.to_owned());
    }
    if let Some(parent) = parents.iter().zip(2..).find(|(_, idx)| hit(*idx)) {
        return StoreError::NotADirectory((*parent.0).to_owned());
    }
    compare_failed(path)
}

/// Explains a failed `create_key` transaction.
///
/// `found` follows the `or_else` order: `[key, marker, between...]`, then
/// `[dir marker, dir]` unless `dir` is the root.
fn create_key_failure(dir: &str, key: &str, between: &[&str], found: &[bool]) -> StoreError {
    let hit = |idx: usize| found.get(idx).copied().unwrap_or(false);

    if dir != "/" {
        let dir_idx = 2 + between.len();
        if !hit(dir_idx) {
            return if hit(dir_idx + 1) {
                StoreError::NotADirectory(dir.to_owned())
            } else {
                StoreError::NotFound(dir.to_owned())
            };
        }
    }
    if hit(0) || hit(1) {
        return StoreError::AlreadyExists(key.to_owned());
    }
    if let Some(parent) = between.iter().zip(2..).find(|(_, idx)| hit(*idx)) {
        return StoreError::NotADirectory((*parent.0).to_owned());
    }
    compare_failed(key)
}

impl NamespaceStore for EtcdStore {
    async fn create_dir(&self, path: &str) -> Result<Node, StoreError> {
        let path = normalize_path(path);
        if path == "/" {
            return Err(StoreError::RootPath);
        }
        let marker = dir_marker(&path);
        let parents: Vec<&str> = ancestors(&path).collect();

        let mut compares = vec![absent(&path), absent(&marker)];
        compares.extend(parents.iter().map(|p| absent(p)));

        let mut puts: Vec<TxnOp> = parents
            .iter()
            .map(|p| TxnOp::put(dir_marker(p), "", None))
            .collect();
        puts.push(TxnOp::put(marker.as_str(), "", None));

        let mut lookups = vec![get(&path), get(&marker)];
        lookups.extend(parents.iter().map(|p| get(p)));

        let resp = self
            .txn(Txn::new().when(compares).and_then(puts).or_else(lookups))
            .await?;
        if resp.succeeded() {
            return Ok(Node::directory(path));
        }

        let found = found_keys(&resp.op_responses());
        Err(create_dir_failure(&path, &parents, &found))
    }

    async fn create_key(&self, dir: &str, relative: &str, value: &str) -> Result<Node, StoreError> {
        let dir = normalize_path(dir);
        let key = join_path(&dir, relative);
        if key == dir {
            return Err(StoreError::AlreadyExists(key));
        }
        let marker = dir_marker(&key);
        let between: Vec<&str> = ancestors(&key)
            .filter(|a| a.len() > dir.len())
            .collect();

        let mut compares = vec![absent(&key), absent(&marker)];
        compares.extend(between.iter().map(|p| absent(p)));

        let mut lookups = vec![get(&key), get(&marker)];
        lookups.extend(between.iter().map(|p| get(p)));

        // The root directory has no marker.
        if dir != "/" {
            compares.push(present(&dir_marker(&dir)));
            lookups.push(get(&dir_marker(&dir)));
            lookups.push(get(&dir));
        }

        let mut puts: Vec<TxnOp> = between
            .iter()
            .map(|p| TxnOp::put(dir_marker(p), "", None))
            .collect();
        puts.push(TxnOp::put(key.as_str(), value, None));

        let resp = self
            .txn(Txn::new().when(compares).and_then(puts).or_else(lookups))
            .await?;
        if resp.succeeded() {
            return Ok(Node::leaf(key, value));
        }

        let found = found_keys(&resp.op_responses());
        Err(create_key_failure(&dir, &key, &between, &found))
    }

    async fn delete_recursive(&self, path: &str) -> Result<(), StoreError> {
        let path = normalize_path(path);
        if path == "/" {
            return Err(StoreError::RootPath);
        }

        let ops = vec![
            TxnOp::delete(dir_marker(&path), Some(DeleteOptions::new().with_prefix())),
            TxnOp::delete(path.as_str(), None),
        ];
        let resp = self.txn(Txn::new().and_then(ops)).await?;

        let deleted: i64 = resp
            .op_responses()
            .iter()
            .map(|op| match op {
                TxnOpResponse::Delete(d) => d.deleted(),
                _ => 0,
            })
            .sum();

        #[cfg(feature = "tracing")]
        debug!(%path, deleted, "recursive delete");

        if deleted == 0 {
            return Err(StoreError::NotFound(path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "/_etcd/registry/0123456789abcdef0123456789abcdef";

    #[test]
    fn dir_collides_with_existing_key_or_marker() {
        let parents = ["/_etcd", "/_etcd/registry"];
        for found in [
            [true, false, false, false],
            [false, true, false, false],
            [true, true, false, true],
        ] {
            assert_eq!(
                create_dir_failure(NS, &parents, &found),
                StoreError::AlreadyExists(NS.into()),
                "{found:?}"
            );
        }
    }

    #[test]
    fn dir_under_a_leaf_names_the_shallowest_leaf() {
        let parents = ["/_etcd", "/_etcd/registry"];
        assert_eq!(
            create_dir_failure(NS, &parents, &[false, false, false, true]),
            StoreError::NotADirectory("/_etcd/registry".into())
        );
        assert_eq!(
            create_dir_failure(NS, &parents, &[false, false, true, true]),
            StoreError::NotADirectory("/_etcd".into())
        );
    }

    #[test]
    fn dir_failure_without_a_hit_is_a_backend_error() {
        let parents = ["/_etcd", "/_etcd/registry"];
        assert!(matches!(
            create_dir_failure(NS, &parents, &[false; 4]),
            StoreError::Backend(_)
        ));
        // a short response list is treated as nothing found
        assert!(matches!(
            create_dir_failure(NS, &parents, &[]),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn key_requires_its_directory() {
        let key = format!("{NS}/_config/size");
        let between = [format!("{NS}/_config")];
        let between: Vec<&str> = between.iter().map(String::as_str).collect();

        // [key, marker, _config, dir marker, dir]
        assert_eq!(
            create_key_failure(NS, &key, &between, &[false, false, false, false, false]),
            StoreError::NotFound(NS.into())
        );
        assert_eq!(
            create_key_failure(NS, &key, &between, &[false, false, false, false, true]),
            StoreError::NotADirectory(NS.into())
        );
    }

    #[test]
    fn missing_dir_outranks_an_existing_key() {
        let key = format!("{NS}/_config/size");
        let between = [format!("{NS}/_config")];
        let between: Vec<&str> = between.iter().map(String::as_str).collect();

        assert_eq!(
            create_key_failure(NS, &key, &between, &[true, false, false, false, false]),
            StoreError::NotFound(NS.into())
        );
    }

    #[test]
    fn key_collides_with_existing_key_or_marker() {
        let key = format!("{NS}/_config/size");
        let between = [format!("{NS}/_config")];
        let between: Vec<&str> = between.iter().map(String::as_str).collect();

        for found in [
            [true, false, false, true, false],
            [false, true, false, true, false],
        ] {
            assert_eq!(
                create_key_failure(NS, &key, &between, &found),
                StoreError::AlreadyExists(key.clone()),
                "{found:?}"
            );
        }
    }

    #[test]
    fn key_under_an_intermediate_leaf() {
        let key = format!("{NS}/_config/size");
        let config = format!("{NS}/_config");
        let between = [config.as_str()];

        assert_eq!(
            create_key_failure(NS, &key, &between, &[false, false, true, true, false]),
            StoreError::NotADirectory(config.clone())
        );
        assert!(matches!(
            create_key_failure(NS, &key, &between, &[false, false, false, true, false]),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn key_under_root_skips_the_directory_check() {
        // [key, marker, between...] only; the root has no marker
        assert_eq!(
            create_key_failure("/", "/size", &[], &[false, true]),
            StoreError::AlreadyExists("/size".into())
        );
        assert!(matches!(
            create_key_failure("/", "/size", &[], &[false, false]),
            StoreError::Backend(_)
        ));
    }
}
