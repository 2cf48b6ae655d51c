// ⚙️ Configuration - shared by the TUI binary and the web server
// Flags first, then DATA_AGENT_* environment variables, then defaults

use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::router::RequestRouter;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Address the web server listens on
    #[arg(long = "bind", env = "DATA_AGENT_BIND", default_value = DEFAULT_BIND_ADDR)]
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// tracing filter used when RUST_LOG is not set
    #[arg(long = "log", env = "DATA_AGENT_LOG", default_value = DEFAULT_LOG_FILTER)]
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Pre-check catalog fields named in the request (e.g. "interest income")
    #[arg(long = "preselect", env = "DATA_AGENT_PRESELECT")]
    #[serde(default)]
    pub preselect_fields: bool,

    /// Directory row exports are written to
    #[arg(long = "export-dir", env = "DATA_AGENT_EXPORT_DIR", default_value = ".")]
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            bind_addr: default_bind_addr(),
            log_filter: default_log_filter(),
            preselect_fields: false,
            export_dir: default_export_dir(),
        }
    }
}

impl AgentConfig {
    pub fn router(&self) -> RequestRouter {
        RequestRouter::new().with_preselection(self.preselect_fields)
    }

    /// Install a stderr fmt subscriber. RUST_LOG wins over `log_filter`.
    pub fn init_tracing(&self) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&self.log_filter));

        // try_init: a second call (tests, embedding) is not an error
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
