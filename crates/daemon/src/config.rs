//! Daemon configuration loaded from environment variables

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "~/.queuekeeper/queues.db";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9640;
const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Console log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// SQLite database file
    pub db_path: PathBuf,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub flush_interval: Duration,
    /// Upper bound on the final flush at shutdown
    pub shutdown_timeout: Duration,
    pub log_format: LogFormat,
    /// Daily rolling log files are written here when set
    pub log_dir: Option<PathBuf>,
}

impl DaemonConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("QUEUEKEEPER_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let rpc_port = match lookup("QUEUEKEEPER_RPC_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("QUEUEKEEPER_RPC_PORT must be a valid port number, got '{}'", raw))?,
            None => DEFAULT_RPC_PORT,
        };

        let flush_secs = parse_secs(
            &lookup,
            "QUEUEKEEPER_FLUSH_INTERVAL_SECS",
            DEFAULT_FLUSH_INTERVAL_SECS,
        )?;
        if flush_secs == 0 {
            bail!("QUEUEKEEPER_FLUSH_INTERVAL_SECS must be greater than 0");
        }

        let shutdown_secs = parse_secs(
            &lookup,
            "QUEUEKEEPER_SHUTDOWN_TIMEOUT_SECS",
            DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        )?;
        if shutdown_secs == 0 {
            bail!("QUEUEKEEPER_SHUTDOWN_TIMEOUT_SECS must be greater than 0");
        }

        let log_format = match lookup("QUEUEKEEPER_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!(
                "QUEUEKEEPER_LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                other
            ),
        };

        Ok(Self {
            db_path: expand(&db_path),
            rpc_host: lookup("QUEUEKEEPER_RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string()),
            rpc_port,
            flush_interval: Duration::from_secs(flush_secs),
            shutdown_timeout: Duration::from_secs(shutdown_secs),
            log_format,
            log_dir: lookup("QUEUEKEEPER_LOG_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(|dir| expand(&dir)),
        })
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw)),
        None => Ok(default),
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
