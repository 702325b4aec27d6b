//! CLI command definitions.
//!
//! The main entry point is the `Cli` struct; with no subcommand the binary
//! runs the MCP server.

pub mod export;

use crate::config::UiMode;
use crate::format::OutputFormat;
use clap::{Args, Parser, Subcommand};
use export::ExportArgs;

/// CogniTask MCP server and CLI tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Owner id to act as (overrides config)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// UI mode: none (MCP only) or web (also serve the HTTP API)
    #[arg(long, value_enum, global = true)]
    pub ui: Option<UiMode>,

    /// Port for the HTTP API
    #[arg(long, global = true)]
    pub ui_port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the MCP server (default if no subcommand given)
    Serve,

    /// Show the task Focus Mode would pick right now
    Next(ReportArgs),

    /// Show task counts per status
    Stats(ReportArgs),

    /// Export the owner's tasks as a JSON snapshot
    Export(ExportArgs),
}

/// Output options shared by read-only subcommands.
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["cognitask-mcp"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["cognitask-mcp", "next", "--owner", "alice", "-f", "json"]);
        assert_eq!(cli.owner.as_deref(), Some("alice"));
        match cli.command {
            Some(Command::Next(args)) => assert_eq!(args.format, OutputFormat::Json),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ui_web_flag() {
        let cli = Cli::parse_from(["cognitask-mcp", "--ui", "web", "--ui-port", "9000"]);
        assert_eq!(cli.ui, Some(UiMode::Web));
        assert_eq!(cli.ui_port, Some(9000));
    }
}
