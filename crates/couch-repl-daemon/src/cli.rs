//! Command line and deployment environment overrides

use crate::config::{DaemonConfig, StoreConfig};
use crate::error::{DaemonError, DaemonResult};
use clap::Parser;

/// couch-repld CLI
#[derive(Debug, Parser)]
#[command(name = "couch-repld")]
#[command(about = "Keeps per-database replication jobs aligned with the replication config", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "COUCH_REPL_CONFIG")]
    pub config: Option<String>,

    /// Admin API listen address
    #[arg(short, long, env = "COUCH_REPL_LISTEN_ADDR")]
    pub listen: Option<String>,

    /// Local store address; selects the HTTP store
    #[arg(long, env = "COUCH_ADDR")]
    pub couch_addr: Option<String>,

    #[arg(long, env = "COUCH_USER")]
    pub couch_user: Option<String>,

    #[arg(long, env = "COUCH_PASS", hide_env_values = true)]
    pub couch_pass: Option<String>,

    /// Use the in-memory store instead of a document store
    #[arg(long, env = "COUCH_REPL_DEV", conflicts_with = "couch_addr")]
    pub dev: bool,

    /// Remote replication source address
    #[arg(long, env = "COUCH_REPL_ADDR")]
    pub remote_addr: Option<String>,

    #[arg(long, env = "COUCH_REPL_USER")]
    pub remote_user: Option<String>,

    #[arg(long, env = "COUCH_REPL_PASS", hide_env_values = true)]
    pub remote_pass: Option<String>,

    /// Node identity
    #[arg(long, env = "SYSTEM_ID")]
    pub system_id: Option<String>,

    /// Any non-empty value disables scheduling
    #[arg(long, env = "STOP_REPLICATION")]
    pub stop_replication: Option<String>,

    /// Log level
    #[arg(long, env = "COUCH_REPL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "COUCH_REPL_LOG_JSON")]
    pub json: bool,
}

impl Cli {
    /// Apply CLI and deployment variables on top of the loaded configuration
    pub fn apply(&self, config: &mut DaemonConfig) -> DaemonResult<()> {
        if let Some(listen) = &self.listen {
            config.server.listen_addr = listen
                .parse()
                .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
        }

        if self.dev {
            config.store = Some(StoreConfig::Memory);
        }
        if let Some(address) = &self.couch_addr {
            let (username, password) = match &config.store {
                Some(StoreConfig::Couch {
                    username, password, ..
                }) => (username.clone(), password.clone()),
                _ => (String::new(), String::new()),
            };
            config.store = Some(StoreConfig::Couch {
                address: address.clone(),
                username,
                password,
            });
        }
        if let Some(StoreConfig::Couch {
            username, password, ..
        }) = &mut config.store
        {
            if let Some(user) = &self.couch_user {
                *username = user.clone();
            }
            if let Some(pass) = &self.couch_pass {
                *password = pass.clone();
            }
        }

        if let Some(address) = &self.remote_addr {
            config.remote.address = address.clone();
        }
        if let Some(user) = &self.remote_user {
            config.remote.username = user.clone();
        }
        if let Some(pass) = &self.remote_pass {
            config.remote.password = pass.clone();
        }

        if let Some(system_id) = &self.system_id {
            config.node.system_id = system_id.clone();
        }
        if self
            .stop_replication
            .as_deref()
            .is_some_and(|value| !value.is_empty())
        {
            config.scheduler.stop_replication = true;
        }

        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json {
            config.logging.json = true;
        }

        Ok(())
    }
}
