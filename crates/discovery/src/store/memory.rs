use crate::{NamespaceStore, Node, StoreError, ancestors, join_path, normalize_path};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Entry {
    Dir,
    Leaf(String),
}

/// An in-process, strongly consistent [`NamespaceStore`].
///
/// Every operation runs under a single lock, which makes create-if-absent and
/// recursive delete trivially atomic. Clones share the same tree, so a test
/// can hand one clone to a [`crate::TokenManager`] and inspect the other.
///
/// The root directory `/` always exists and is not stored explicitly.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    nodes: Arc<Mutex<BTreeMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Node> {
        let path = normalize_path(path);
        let nodes = self.nodes.lock();
        nodes.get(&path).map(|entry| match entry {
            Entry::Dir => Node::directory(path.clone()),
            Entry::Leaf(value) => Node::leaf(path.clone(), value.clone()),
        })
    }

    /// Number of nodes in the store, directories included.
    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }
}

/// Fails if any ancestor of `path` deeper than `floor` is a leaf.
fn check_ancestors(
    nodes: &BTreeMap<String, Entry>,
    path: &str,
    floor: &str,
) -> Result<(), StoreError> {
    for ancestor in ancestors(path).filter(|a| a.len() > floor.len()) {
        if let Some(Entry::Leaf(_)) = nodes.get(ancestor) {
            return Err(StoreError::NotADirectory(ancestor.to_owned()));
        }
    }
    Ok(())
}

fn fill_ancestors(nodes: &mut BTreeMap<String, Entry>, path: &str) {
    for ancestor in ancestors(path) {
        nodes.entry(ancestor.to_owned()).or_insert(Entry::Dir);
    }
}

impl NamespaceStore for MemoryStore {
    async fn create_dir(&self, path: &str) -> Result<Node, StoreError> {
        let path = normalize_path(path);
        if path == "/" {
            return Err(StoreError::RootPath);
        }

        let mut nodes = self.nodes.lock();
        check_ancestors(&nodes, &path, "")?;
        if nodes.contains_key(&path) {
            return Err(StoreError::AlreadyExists(path));
        }
        fill_ancestors(&mut nodes, &path);
        nodes.insert(path.clone(), Entry::Dir);
        Ok(Node::directory(path))
    }

    async fn create_key(&self, dir: &str, relative: &str, value: &str) -> Result<Node, StoreError> {
        let dir = normalize_path(dir);
        let key = join_path(&dir, relative);

        let mut nodes = self.nodes.lock();
        if dir != "/" {
            match nodes.get(&dir) {
                None => return Err(StoreError::NotFound(dir)),
                Some(Entry::Leaf(_)) => return Err(StoreError::NotADirectory(dir)),
                Some(Entry::Dir) => {}
            }
        }
        if key == dir {
            return Err(StoreError::AlreadyExists(key));
        }
        check_ancestors(&nodes, &key, &dir)?;
        if nodes.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        fill_ancestors(&mut nodes, &key);
        nodes.insert(key.clone(), Entry::Leaf(value.to_owned()));
        Ok(Node::leaf(key, value))
    }

    async fn delete_recursive(&self, path: &str) -> Result<(), StoreError> {
        let path = normalize_path(path);
        if path == "/" {
            return Err(StoreError::RootPath);
        }

        let mut nodes = self.nodes.lock();
        if !nodes.contains_key(&path) {
            return Err(StoreError::NotFound(path));
        }
        let prefix = format!("{path}/");
        nodes.retain(|k, _| k != &path && !k.starts_with(&prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_dir_is_create_if_absent() {
        let store = MemoryStore::new();
        let node = store.create_dir("_etcd/registry/abc").await.unwrap();
        assert_eq!(node, Node::directory("/_etcd/registry/abc"));

        let err = store.create_dir("/_etcd/registry/abc").await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists("/_etcd/registry/abc".into()));

        // intermediate directories were created along the way
        assert_eq!(store.get("/_etcd"), Some(Node::directory("/_etcd")));
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn create_key_requires_existing_dir() {
        let store = MemoryStore::new();
        let err = store
            .create_key("/_etcd/registry/abc", "_config/size", "3")
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("/_etcd/registry/abc".into()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn create_key_fills_intermediate_dirs() {
        let store = MemoryStore::new();
        store.create_dir("/ns").await.unwrap();
        let node = store.create_key("/ns", "_config/size", "5").await.unwrap();
        assert_eq!(node, Node::leaf("/ns/_config/size", "5"));
        assert_eq!(store.get("/ns/_config"), Some(Node::directory("/ns/_config")));

        let err = store.create_key("/ns", "_config/size", "6").await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists("/ns/_config/size".into()));
        assert_eq!(store.get("/ns/_config/size"), Some(Node::leaf("/ns/_config/size", "5")));
    }

    #[tokio::test]
    async fn leaves_are_not_directories() {
        let store = MemoryStore::new();
        store.create_dir("/ns").await.unwrap();
        store.create_key("/ns", "leaf", "x").await.unwrap();

        assert_eq!(
            store.create_key("/ns/leaf", "child", "y").await.unwrap_err(),
            StoreError::NotADirectory("/ns/leaf".into())
        );
        assert_eq!(
            store.create_dir("/ns/leaf/child").await.unwrap_err(),
            StoreError::NotADirectory("/ns/leaf".into())
        );
        assert_eq!(
            store.create_key("/ns", "leaf/child", "y").await.unwrap_err(),
            StoreError::NotADirectory("/ns/leaf".into())
        );
    }

    #[tokio::test]
    async fn delete_recursive_removes_only_the_subtree() {
        let store = MemoryStore::new();
        store.create_dir("/r/a").await.unwrap();
        store.create_key("/r/a", "_config/size", "3").await.unwrap();
        store.create_dir("/r/ab").await.unwrap();

        store.delete_recursive("/r/a").await.unwrap();
        assert_eq!(store.get("/r/a"), None);
        assert_eq!(store.get("/r/a/_config/size"), None);
        // sibling sharing a name prefix survives
        assert_eq!(store.get("/r/ab"), Some(Node::directory("/r/ab")));

        assert_eq!(
            store.delete_recursive("/r/a").await.unwrap_err(),
            StoreError::NotFound("/r/a".into())
        );
    }

    #[tokio::test]
    async fn root_is_protected() {
        let store = MemoryStore::new();
        store.create_dir("/r").await.unwrap();
        assert_eq!(store.delete_recursive("").await.unwrap_err(), StoreError::RootPath);
        assert_eq!(store.delete_recursive("/").await.unwrap_err(), StoreError::RootPath);
        assert_eq!(store.create_dir("/").await.unwrap_err(), StoreError::RootPath);
        assert_eq!(store.len(), 1);
    }
}
