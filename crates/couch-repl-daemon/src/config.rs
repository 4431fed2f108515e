//! Configuration for couch-repld

use crate::error::{DaemonError, DaemonResult};
use couch_repl_client::Credentials;
use couch_repl_scheduler::{Endpoint, JobTemplate, SchedulerSettings};
use couch_repl_types::NodeId;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Job endpoint used in place of an unset address with the in-memory store
pub const MEMORY_STORE_ADDRESS: &str = "http://localhost:5984";

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Local store; startup fails while unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    /// Remote replication source
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Node identity
    #[serde(default)]
    pub node: NodeConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8090)),
            enable_cors: true,
        }
    }
}

/// Local store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-process store (for development/testing)
    Memory,

    /// Document store over HTTP
    Couch {
        /// Base address, e.g. `http://localhost:5984`
        address: String,

        #[serde(default)]
        username: String,

        #[serde(default)]
        password: String,
    },
}

/// Remote replication source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

/// Node identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// System id, e.g. `ITB-101-CP1`
    #[serde(default)]
    pub system_id: String,
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delay between bootstrap state polls in seconds
    #[serde(default = "default_bootstrap_poll_interval")]
    pub bootstrap_poll_interval_secs: u64,

    /// Maximum number of bootstrap state polls
    #[serde(default = "default_bootstrap_wait_limit")]
    pub bootstrap_wait_limit: u32,

    /// Delay between store reachability checks in seconds
    #[serde(default = "default_store_wait_interval")]
    pub store_wait_interval_secs: u64,

    /// Timeout for a single store request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Disable all scheduling
    #[serde(default)]
    pub stop_replication: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bootstrap_poll_interval_secs: default_bootstrap_poll_interval(),
            bootstrap_wait_limit: default_bootstrap_wait_limit(),
            store_wait_interval_secs: default_store_wait_interval(),
            request_timeout_secs: default_request_timeout(),
            stop_replication: false,
        }
    }
}

impl SchedulerConfig {
    pub fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            bootstrap_poll_interval: Duration::from_secs(self.bootstrap_poll_interval_secs),
            bootstrap_wait_limit: self.bootstrap_wait_limit,
            stop_replication: self.stop_replication,
        }
    }

    pub fn store_wait_interval(&self) -> Duration {
        Duration::from_secs(self.store_wait_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_bootstrap_poll_interval() -> u64 {
    1
}

fn default_bootstrap_wait_limit() -> u32 {
    60
}

fn default_store_wait_interval() -> u64 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file and `COUCH_REPL_*`
    /// environment variables (nested keys separated by `__`)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("COUCH_REPL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject configurations the daemon cannot start with
    pub fn validate(&self) -> DaemonResult<()> {
        let Some(store) = &self.store else {
            return Err(DaemonError::Config(
                "No store configured (COUCH_ADDR, or --dev for the in-memory store)".to_string(),
            ));
        };

        if let StoreConfig::Couch { address, .. } = store {
            if address.trim().is_empty() {
                return Err(DaemonError::Config(
                    "Store address is not configured (COUCH_ADDR)".to_string(),
                ));
            }
            if self.remote.address.trim().is_empty() && !self.scheduler.stop_replication {
                return Err(DaemonError::Config(
                    "Remote replication address is not configured (COUCH_REPL_ADDR)".to_string(),
                ));
            }
        }

        if self.scheduler.request_timeout_secs == 0 {
            return Err(DaemonError::Config(
                "Store request timeout must be positive".to_string(),
            ));
        }

        if self.node.system_id.trim().is_empty() {
            return Err(DaemonError::Config(
                "System id is not configured (SYSTEM_ID)".to_string(),
            ));
        }

        Ok(())
    }

    /// Job template: remote source, local target, this node
    pub fn job_template(&self) -> DaemonResult<JobTemplate> {
        let target = match &self.store {
            None | Some(StoreConfig::Memory) => {
                Endpoint::new(MEMORY_STORE_ADDRESS, Credentials::default())
            }
            Some(StoreConfig::Couch {
                address,
                username,
                password,
            }) => Endpoint::new(address.clone(), Credentials::new(username, password)),
        };

        let remote_address = if self.remote.address.trim().is_empty() {
            MEMORY_STORE_ADDRESS.to_string()
        } else {
            self.remote.address.clone()
        };
        let source = Endpoint::new(
            remote_address,
            Credentials::new(&self.remote.username, &self.remote.password),
        );

        let template = JobTemplate::new(source, target, NodeId::new(&self.node.system_id))?;
        Ok(template)
    }

    /// Create a development configuration backed by the in-memory store
    pub fn development(system_id: &str) -> Self {
        Self {
            store: Some(StoreConfig::Memory),
            node: NodeConfig {
                system_id: system_id.to_string(),
            },
            ..Default::default()
        }
    }
}
