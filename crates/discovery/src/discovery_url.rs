use crate::{Error, Result, Token};
use url::Url;

/// Origin used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://discovery.etcd.io";

/// Parses and validates the configured base URL, falling back to
/// [`DEFAULT_BASE_URL`] when `configured` is `None` or empty.
///
/// The base must be a bare origin because the token becomes the entire path
/// of the discovery URL.
///
/// # Errors
/// - [`Error::InvalidBaseUrl`] if the URL doesn't parse, can't carry a path
///   (e.g. `mailto:`), or has a non-root path, a query, or a fragment.
pub fn resolve_base_url(configured: Option<&str>) -> Result<Url> {
    let raw = configured
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_BASE_URL);

    let url =
        Url::parse(raw).map_err(|e| Error::invalid_base_url(format!("{raw:?}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(Error::invalid_base_url(format!(
            "expected an origin that can carry a path ({raw})"
        )));
    }
    if !matches!(url.path(), "" | "/") {
        return Err(Error::invalid_base_url(format!(
            "expected URL without path ({})",
            url.path()
        )));
    }
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        return Err(Error::invalid_base_url(format!(
            "expected URL without query ({query})"
        )));
    }
    if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
        return Err(Error::invalid_base_url(format!(
            "expected URL without fragment ({fragment})"
        )));
    }
    Ok(url)
}

/// Builds client-facing discovery URLs from a validated origin.
///
/// Construct once at startup with [`DiscoveryUrl::resolve`] and share; the
/// base is immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryUrl {
    base: Url,
}

impl DiscoveryUrl {
    /// See [`resolve_base_url`].
    pub fn resolve(configured: Option<&str>) -> Result<Self> {
        resolve_base_url(configured).map(|base| Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Returns `<origin>/<token>`.
    pub fn compose(&self, token: &Token) -> String {
        compose_discovery_url(&self.base, token)
    }
}

/// Sets the path of `base` to `token` and returns the resulting URL.
///
/// Any empty `?` or `#` left on the base is dropped so the token is the last
/// thing in the URL.
pub fn compose_discovery_url(base: &Url, token: &Token) -> String {
    let mut url = base.clone();
    url.set_path(token.as_str());
    url.set_query(None);
    url.set_fragment(None);
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::parse("0123456789abcdef0123456789abcdef").unwrap()
    }

    #[test]
    fn defaults_when_unset_or_blank() {
        assert_eq!(
            resolve_base_url(None).unwrap().as_str(),
            "https://discovery.etcd.io/"
        );
        assert_eq!(
            resolve_base_url(Some("  ")).unwrap().as_str(),
            "https://discovery.etcd.io/"
        );
    }

    #[test]
    fn accepts_bare_origins() {
        for ok in [
            "https://discovery.example.com",
            "https://discovery.example.com/",
            "http://127.0.0.1:8087",
            "https://discovery.example.com/?",
            "https://discovery.example.com/#",
        ] {
            assert!(resolve_base_url(Some(ok)).is_ok(), "rejected {ok}");
        }
    }

    #[test]
    fn rejects_paths_queries_and_fragments() {
        for bad in [
            "https://discovery.example.com/v2",
            "https://discovery.example.com//",
            "https://discovery.example.com/?a=b",
            "https://discovery.example.com/#frag",
            "mailto:ops@example.com",
            "not a url",
        ] {
            assert!(
                matches!(resolve_base_url(Some(bad)), Err(Error::InvalidBaseUrl { .. })),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn composes_token_as_entire_path() {
        let composer = DiscoveryUrl::resolve(Some("https://discovery.example.com")).unwrap();
        assert_eq!(
            composer.compose(&token()),
            "https://discovery.example.com/0123456789abcdef0123456789abcdef"
        );

        let with_port = DiscoveryUrl::resolve(Some("http://localhost:8087/")).unwrap();
        assert_eq!(
            with_port.compose(&token()),
            "http://localhost:8087/0123456789abcdef0123456789abcdef"
        );

        let trailing = DiscoveryUrl::resolve(Some("https://discovery.example.com/?")).unwrap();
        assert_eq!(
            trailing.compose(&token()),
            "https://discovery.example.com/0123456789abcdef0123456789abcdef"
        );
    }
}
