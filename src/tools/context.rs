//! Per-request context passed to tool functions.

use crate::logging::Logger;

/// Per-request context passed to all tools.
#[derive(Clone, Default)]
pub struct ToolContext {
    /// Logs to tracing and, when connected, to the MCP client.
    pub logger: Logger,
}

impl ToolContext {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}
