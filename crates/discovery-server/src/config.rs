use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use discovery::{DEFAULT_BASE_URL, DEFAULT_CLUSTER_SIZE, DEFAULT_REGISTRY_ROOT, DiscoveryUrl};
use std::time::Duration;

/// Backing store for token namespaces.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    /// In-process store. State is lost on restart; intended for development
    /// and tests.
    Memory,
    /// etcd v3 cluster (requires the `etcd` feature).
    Etcd,
}

/// Runtime configuration for the `discovery-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults suitable for local use.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "discovery-server",
    version,
    about = "An HTTP service issuing cluster discovery tokens"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8087"))]
    pub server_addr: String,

    /// Public origin returned to clients; the token becomes the URL path.
    ///
    /// Must be a bare origin: no path, query, or fragment. Defaults to
    /// `https://discovery.etcd.io` when unset or empty.
    ///
    /// Environment variable: `ROOT_URL`
    #[arg(long, env = "ROOT_URL")]
    pub root_url: Option<String>,

    /// Store holding token namespaces.
    ///
    /// Environment variable: `STORE`
    #[arg(long, env = "STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// Comma-separated etcd endpoints, used when `STORE=etcd`.
    ///
    /// Environment variable: `ETCD_ENDPOINTS`
    #[arg(
        long,
        env = "ETCD_ENDPOINTS",
        value_delimiter = ',',
        default_value = "http://127.0.0.1:2379"
    )]
    pub etcd_endpoints: Vec<String>,

    /// Connect and per-request timeout for etcd, in milliseconds.
    ///
    /// Environment variable: `ETCD_TIMEOUT_MS`
    #[arg(long, env = "ETCD_TIMEOUT_MS", default_value_t = 5_000)]
    pub etcd_timeout_ms: u64,

    /// Store directory under which token namespaces are created.
    ///
    /// Environment variable: `REGISTRY_ROOT`
    #[arg(long, env = "REGISTRY_ROOT", default_value_t = String::from(DEFAULT_REGISTRY_ROOT))]
    pub registry_root: String,

    /// Cluster size used when a request omits `size`.
    ///
    /// Environment variable: `DEFAULT_SIZE`
    #[arg(long, env = "DEFAULT_SIZE", default_value_t = DEFAULT_CLUSTER_SIZE)]
    pub default_size: u32,

    /// Mount `DELETE /{token}` for tearing namespaces down.
    ///
    /// Environment variable: `ALLOW_TEARDOWN`
    #[arg(long, env = "ALLOW_TEARDOWN", default_value_t = false)]
    pub allow_teardown: bool,

    /// Delete a namespace whose size key couldn't be written instead of
    /// leaving it behind.
    ///
    /// Environment variable: `ROLLBACK_PARTIAL_SETUP`
    #[arg(long, env = "ROLLBACK_PARTIAL_SETUP", default_value_t = false)]
    pub rollback_partial_setup: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub discovery_url: DiscoveryUrl,
    pub store: StoreKind,
    pub etcd_endpoints: Vec<String>,
    pub etcd_timeout: Duration,
    pub registry_root: String,
    pub default_size: u32,
    pub allow_teardown: bool,
    pub rollback_partial_setup: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.default_size == 0 {
            bail!("DEFAULT_SIZE must be greater than 0");
        }

        let discovery_url = DiscoveryUrl::resolve(args.root_url.as_deref()).with_context(|| {
            format!(
                "ROOT_URL ({}) must be a bare origin",
                args.root_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
            )
        })?;

        let etcd_endpoints: Vec<String> = args
            .etcd_endpoints
            .into_iter()
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty())
            .collect();

        if args.store == StoreKind::Etcd {
            if etcd_endpoints.is_empty() {
                bail!("ETCD_ENDPOINTS must name at least one endpoint");
            }
            if args.etcd_timeout_ms == 0 {
                bail!("ETCD_TIMEOUT_MS must be greater than 0");
            }
        }

        let registry_root = args.registry_root.trim_matches('/');
        if registry_root.is_empty() {
            bail!("REGISTRY_ROOT must not be the store root");
        }

        Ok(Self {
            server_addr: args.server_addr,
            discovery_url,
            store: args.store,
            etcd_endpoints,
            etcd_timeout: Duration::from_millis(args.etcd_timeout_ms),
            registry_root: format!("/{registry_root}"),
            default_size: args.default_size,
            allow_teardown: args.allow_teardown,
            rollback_partial_setup: args.rollback_partial_setup,
        })
    }
}
