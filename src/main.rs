//! CogniTask MCP Server
//!
//! Personal task hierarchy and prioritization engine, served over MCP stdio
//! with an optional HTTP API.

use anyhow::Result;
use clap::Parser;
use cognitask_mcp::assistant::{AssistantError, GeminiClient, TextGenerator};
use cognitask_mcp::cli::{Cli, Command, ReportArgs, export};
use cognitask_mcp::config::{Config, ConfigLoader, ConfigPaths, UiMode};
use cognitask_mcp::dashboard;
use cognitask_mcp::db::Database;
use cognitask_mcp::error::TaskError;
use cognitask_mcp::format::{OutputFormat, format_stats_markdown, format_task_markdown};
use cognitask_mcp::logging::{LogLevelFilter, LogTarget, Logger, init_tracing};
use cognitask_mcp::tools::{ToolContext, ToolHandler};
use rmcp::{
    ErrorData, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, InitializeResult, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities,
    },
    service::RequestContext,
    transport::io::stdio,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const INSTRUCTIONS: &str = "\
Personal task manager. Tasks form a hierarchy (parent/sub-task) and carry a status, priority and optional due date.
Focus: next() picks the single task to work on now. Writes (update, delete, promote, breakdown) need the etag from the last read; on CONFLICT, re-read and retry.
parse_task and suggest_breakdown only propose; pass their output to create or breakdown to apply it.";

/// MCP server handler.
#[derive(Clone)]
struct CogniTaskServer {
    tool_handler: Arc<ToolHandler>,
    /// Client-adjustable via logging/setLevel.
    level_filter: Arc<LogLevelFilter>,
}

impl CogniTaskServer {
    fn new(tool_handler: ToolHandler, level_filter: Arc<LogLevelFilter>) -> Self {
        Self {
            tool_handler: Arc::new(tool_handler),
            level_filter,
        }
    }
}

impl ServerHandler for CogniTaskServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: Default::default(),
            server_info: rmcp::model::Implementation {
                name: "cognitask-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                logging: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn set_level(
        &self,
        request: rmcp::model::SetLevelRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<(), ErrorData> {
        self.level_filter.set(request.level);
        tracing::info!(level = ?request.level, "Logging level updated via MCP");
        Ok(())
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tool_handler.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let tool_name = request.name.clone();
        let start = std::time::Instant::now();

        let logger = Logger::new()
            .with_peer(context.peer.clone())
            .with_level_filter(Arc::clone(&self.level_filter))
            .with_name(format!("tool:{}", tool_name));
        let tool_ctx = ToolContext::new(logger);

        let args = Value::Object(request.arguments.unwrap_or_default());
        let elapsed_ms = || start.elapsed().as_millis() as u64;

        match self.tool_handler.call_tool(&tool_name, args, &tool_ctx).await {
            Ok(result) => {
                debug!(tool = %tool_name, duration_ms = elapsed_ms(), "Tool call succeeded");
                let text = match result {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Ok(CallToolResult {
                    content: vec![Content::text(text)],
                    is_error: None,
                    meta: None,
                    structured_content: None,
                })
            }
            Err(e) => {
                let task_err = TaskError::from(e);
                warn!(
                    tool = %tool_name,
                    error_code = task_err.code.as_str(),
                    error_message = %task_err.message,
                    duration_ms = elapsed_ms(),
                    "Tool call failed"
                );
                let error_json = serde_json::to_string(&task_err)
                    .unwrap_or_else(|_| json!({ "message": task_err.to_string() }).to_string());
                Ok(CallToolResult {
                    content: vec![Content::text(error_json)],
                    is_error: Some(true),
                    meta: None,
                    structured_content: None,
                })
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut loader = match cli.config {
        Some(ref path) => ConfigLoader::load_file(ConfigPaths::discover(), PathBuf::from(path))?,
        None => ConfigLoader::load()?,
    };
    if let Some(path) = loader.config_path() {
        debug!("Config file: {}", path.display());
    }

    let config = loader.config_mut();
    if let Some(ref db_path) = cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(ref owner) = cli.owner {
        config.server.default_owner = owner.clone();
    }
    if let Some(ui_mode) = cli.ui {
        config.server.ui.mode = ui_mode;
    }
    if let Some(ui_port) = cli.ui_port {
        config.server.ui.port = ui_port;
    }
    let config = loader.into_config();

    match cli.command {
        Some(Command::Next(args)) => run_next(&config, &args),
        Some(Command::Stats(args)) => run_stats(&config, &args),
        Some(Command::Export(args)) => {
            let db = open_database(&config)?;
            let snapshot = db.export_snapshot(&config.server.default_owner)?;
            export::run(&snapshot, &args)
        }
        Some(Command::Serve) | None => run_server(config).await,
    }
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    Database::open(&config.server.db_path)
}

/// Build the LLM backend, or `None` when no API key is available.
fn build_assistant(config: &Config) -> Option<Arc<dyn TextGenerator>> {
    match GeminiClient::from_config(&config.assistant) {
        Ok(client) => {
            info!("AI assistant enabled (model {})", config.assistant.model);
            Some(Arc::new(client))
        }
        Err(AssistantError::NotConfigured(var)) => {
            warn!("AI assistant disabled: {} is not set", var);
            None
        }
        Err(e) => {
            warn!("AI assistant disabled: {}", e);
            None
        }
    }
}

/// Run the MCP server
async fn run_server(config: Config) -> Result<()> {
    info!("Starting CogniTask MCP Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {:?}", config.server.db_path);
    info!("Default owner: {}", config.server.default_owner);
    info!("UI mode: {:?}", config.server.ui.mode);

    let db = Arc::new(open_database(&config)?);
    info!("Database initialized successfully");

    let assistant = build_assistant(&config);
    let config = Arc::new(config);

    let mut tool_handler = ToolHandler::new(Arc::clone(&db), Arc::clone(&config));
    if let Some(assistant) = assistant {
        tool_handler = tool_handler.with_assistant(assistant);
    }

    let server = CogniTaskServer::new(tool_handler, Arc::new(LogLevelFilter::default()));

    let _dashboard_handle = match config.server.ui.mode {
        UiMode::Web => {
            info!("Starting HTTP API on port {}", config.server.ui.port);
            Some(dashboard::start_server_with_retry(
                Arc::clone(&db),
                Arc::clone(&config),
                &config.server.ui,
            ))
        }
        UiMode::None => None,
    };

    info!("Server ready, listening on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}

fn run_next(config: &Config, args: &ReportArgs) -> Result<()> {
    let db = open_database(config)?;
    let record = db.select_next(&config.server.default_owner)?;

    match args.format {
        OutputFormat::Markdown => match record {
            Some(r) => print!("{}", format_task_markdown(&r.task)),
            None => println!("No actionable tasks."),
        },
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "task": record }))?)
        }
    }
    Ok(())
}

fn run_stats(config: &Config, args: &ReportArgs) -> Result<()> {
    let db = open_database(config)?;
    let stats = db.task_stats(&config.server.default_owner)?;

    match args.format {
        OutputFormat::Markdown => print!("{}", format_stats_markdown(&stats)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(())
}
