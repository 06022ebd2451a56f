/// A node acknowledged by the store after a successful create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Absolute, slash-prefixed path of the node.
    pub key: String,
    /// Whether the node is a directory.
    pub dir: bool,
    /// Value of a leaf key; `None` for directories.
    pub value: Option<String>,
}

impl Node {
    pub fn directory(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            dir: true,
            value: None,
        }
    }

    pub fn leaf(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            dir: false,
            value: Some(value.into()),
        }
    }
}

/// Normalizes `path` into the store's absolute form: a single leading slash,
/// no trailing slash, no empty segments.
///
/// The root itself normalizes to `"/"`.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Joins `relative` onto the absolute directory `dir`.
pub fn join_path(dir: &str, relative: &str) -> String {
    normalize_path(&format!("{dir}/{relative}"))
}

/// Yields every proper ancestor of an absolute path, shallowest first,
/// excluding the root. `/a/b/c` yields `/a`, then `/a/b`.
pub(crate) fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/')
        .map(|(i, _)| i)
        .filter(|&i| i > 0)
        .map(move |i| &path[..i])
}
