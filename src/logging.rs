//! Logging: local `tracing` output plus MCP client notifications.
//!
//! The process-wide subscriber is set up once from the `--log` / `--verbose`
//! flags. Tool handlers log through [`Logger`], which mirrors each message to
//! the connected MCP client when its level passes the client-adjustable
//! [`LogLevelFilter`].

use anyhow::{Context, Result};
use rmcp::{
    RoleServer,
    model::{LoggingLevel, LoggingMessageNotificationParam},
    service::Peer,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where local log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Parse the `--log` value: `0`/`off`, `1`/`stdout`, `2`/`stderr`, or a file path.
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            path => LogTarget::File(PathBuf::from(path)),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the default level when set. MCP traffic runs over
/// stdout, so `Stdout` is only sensible for CLI subcommands.
pub fn init_tracing(target: &LogTarget, verbose: bool) -> Result<()> {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    let builder = FmtSubscriber::builder().with_env_filter(filter);

    match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stdout => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stdout).finish())?
        }
        LogTarget::Stderr => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())?
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing::subscriber::set_global_default(
                builder
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .finish(),
            )?
        }
    }

    Ok(())
}

/// Minimum level for client notifications, adjustable via `logging/setLevel`.
pub struct LogLevelFilter(AtomicU8);

impl LogLevelFilter {
    pub fn new(level: LoggingLevel) -> Self {
        Self(AtomicU8::new(severity(level)))
    }

    pub fn get(&self) -> LoggingLevel {
        level_from_severity(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, level: LoggingLevel) {
        self.0.store(severity(level), Ordering::Relaxed);
    }

    pub fn should_log(&self, level: LoggingLevel) -> bool {
        severity(level) >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self::new(LoggingLevel::Info)
    }
}

const LEVELS: [LoggingLevel; 8] = [
    LoggingLevel::Debug,
    LoggingLevel::Info,
    LoggingLevel::Notice,
    LoggingLevel::Warning,
    LoggingLevel::Error,
    LoggingLevel::Critical,
    LoggingLevel::Alert,
    LoggingLevel::Emergency,
];

fn severity(level: LoggingLevel) -> u8 {
    LEVELS.iter().position(|l| *l == level).unwrap_or(0) as u8
}

fn level_from_severity(val: u8) -> LoggingLevel {
    LEVELS
        .get(val as usize)
        .copied()
        .unwrap_or(LoggingLevel::Debug)
}

/// Map an MCP level onto the nearest tracing level.
pub fn logging_level_to_tracing(level: LoggingLevel) -> Level {
    match level {
        LoggingLevel::Debug => Level::DEBUG,
        LoggingLevel::Info | LoggingLevel::Notice => Level::INFO,
        LoggingLevel::Warning => Level::WARN,
        LoggingLevel::Error
        | LoggingLevel::Critical
        | LoggingLevel::Alert
        | LoggingLevel::Emergency => Level::ERROR,
    }
}

/// Logger handed to tool handlers.
#[derive(Clone)]
pub struct Logger {
    peer: Option<Peer<RoleServer>>,
    level_filter: Arc<LogLevelFilter>,
    name: Option<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            peer: None,
            level_filter: Arc::new(LogLevelFilter::default()),
            name: None,
        }
    }

    pub fn with_peer(mut self, peer: Peer<RoleServer>) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_level_filter(mut self, filter: Arc<LogLevelFilter>) -> Self {
        self.level_filter = filter;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Emit locally, then forward to the client if one is attached and the
    /// level passes its filter.
    pub fn log(&self, level: LoggingLevel, message: &str, data: Option<Value>) {
        let logger = self.name.as_deref().unwrap_or("cognitask");
        match logging_level_to_tracing(level) {
            Level::ERROR => tracing::error!(logger, "{}", message),
            Level::WARN => tracing::warn!(logger, "{}", message),
            Level::INFO => tracing::info!(logger, "{}", message),
            _ => tracing::debug!(logger, "{}", message),
        }

        if !self.level_filter.should_log(level) {
            return;
        }

        if let Some(ref peer) = self.peer {
            let param = LoggingMessageNotificationParam {
                level,
                logger: self.name.clone(),
                data: data.unwrap_or_else(|| json!({ "message": message })),
            };
            let peer = peer.clone();
            tokio::spawn(async move {
                let _ = peer.notify_logging_message(param).await;
            });
        }
    }

    pub fn debug(&self, msg: &str) {
        self.log(LoggingLevel::Debug, msg, None);
    }

    pub fn info(&self, msg: &str) {
        self.log(LoggingLevel::Info, msg, None);
    }

    pub fn warning(&self, msg: &str) {
        self.log(LoggingLevel::Warning, msg, None);
    }

    pub fn error(&self, msg: &str) {
        self.log(LoggingLevel::Error, msg, None);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
