//! Discovery tokens for cluster rendezvous.
//!
//! A discovery token is a random 128-bit identifier that names a namespace in
//! a strongly consistent key-value store. Independently started cluster
//! members use the token to find each other: the namespace is created once,
//! seeded with the expected cluster size, and torn down when the cluster no
//! longer needs it.
//!
//! The crate is split into four pieces:
//!
//! - [`TokenGenerator`] draws 16 bytes from an [`EntropySource`] and encodes
//!   them as a 32 character lowercase hex [`Token`].
//! - [`NamespaceStore`] is the capability the manager needs from the backing
//!   store. [`MemoryStore`] is always available; `EtcdStore` is behind the
//!   `etcd` feature.
//! - [`TokenManager`] performs `setup` and `teardown`.
//! - [`DiscoveryUrl`] turns a validated origin plus a token into the URL
//!   handed back to clients.

mod discovery_url;
mod error;
mod lifecycle;
mod store;
mod token;

pub use crate::discovery_url::*;
pub use crate::error::*;
pub use crate::lifecycle::*;
pub use crate::store::*;
pub use crate::token::*;
