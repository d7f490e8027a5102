//! MCP Server Implementation
//!
//! This module contains the core MCP server implementation including:
//! - Tool registry for managing available tools
//! - A transport-independent JSON-RPC dispatcher
//! - HTTP server setup with Actix Web
//! - STDIO server implementation for line-based communication

use actix_web::{
    App, HttpResponse, HttpServer, Result,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::config::ServerConfig;
use crate::core::error::ToolError;
use crate::core::protocol::{
    INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, MCPRequest, MCPResponse, MCPTool,
    PARSE_ERROR, PROTOCOL_VERSION, ToolCallParams, tool_failure, tool_success,
};
use crate::tools;

/// Server metadata shared by both transports.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server name as reported in MCP initialize responses
    pub server_name: String,
    /// Server version string as reported in MCP initialize responses
    pub server_version: String,
}

impl From<&ServerConfig> for AppState {
    fn from(config: &ServerConfig) -> Self {
        Self {
            server_name: config.name.clone(),
            server_version: config.version.clone(),
        }
    }
}

/// Tool handler function type definition.
///
/// Handlers take the JSON `arguments` object of a `tools/call` request and
/// return either a JSON result or a tool error. They must be Send + Sync to
/// be shared across HTTP worker threads.
pub type ToolHandler = Box<dyn Fn(Value) -> std::result::Result<Value, ToolError> + Send + Sync>;

/// Registry of available MCP tools.
///
/// Keeps tool definitions in registration order for `tools/list` and maps
/// names to handlers for `tools/call`. Names are unique: registering a name
/// again replaces the earlier tool.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<MCPTool>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    /// Create an empty registry; tools are added with `register`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with the registry.
    ///
    /// # Arguments
    /// * `tool` - Tool definition with name, description, and input schema
    /// * `handler` - Function that executes the tool when called
    pub fn register(&mut self, tool: MCPTool, handler: ToolHandler) {
        let name = tool.name.clone();
        // A replaced handler means the old definition must leave the list too
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::warn!(tool = %name, "replacing previously registered tool");
            self.tools.retain(|t| t.name != name);
        }
        self.tools.push(tool);
    }

    /// Registered tool definitions, in registration order.
    pub fn tools(&self) -> &[MCPTool] {
        &self.tools
    }

    /// Invoke a tool by name. Returns None if no such tool is registered.
    pub fn call(&self, name: &str, arguments: Value) -> Option<std::result::Result<Value, ToolError>> {
        self.handlers.get(name).map(|handler| handler(arguments))
    }
}

/// Build the dice random source, seeded for reproducibility when configured.
pub fn dice_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Initialize and register all tools.
///
/// Add new tool registrations here when implementing additional tools.
pub fn initialize_tools(config: &ServerConfig) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    // One generator for the whole process, shared by every dice call
    let rng = Arc::new(Mutex::new(dice_rng(config.dice_seed)));
    tools::dice::register(&mut registry, rng);
    tools::add::register(&mut registry);

    tracing::debug!(count = registry.tools().len(), "tools registered");
    Arc::new(registry)
}

/// Route a single JSON-RPC request to its MCP method handler.
///
/// Returns None for notifications, which never receive a response.
/// Requests that do not declare JSON-RPC "2.0" are rejected with -32600.
pub fn dispatch(state: &AppState, registry: &ToolRegistry, req: MCPRequest) -> Option<MCPResponse> {
    if !req.has_valid_version() {
        tracing::warn!(jsonrpc = %req.jsonrpc, method = %req.method, "unsupported JSON-RPC version");
        // Notifications get no reply, even an error
        return (!req.is_notification()).then(|| {
            MCPResponse::error(
                req.id,
                INVALID_REQUEST,
                format!("Invalid Request: unsupported jsonrpc version '{}'", req.jsonrpc),
            )
        });
    }

    if req.is_notification() {
        tracing::debug!(method = %req.method, "notification received");
        return None;
    }

    // Route by method name; the id is echoed back unchanged
    let id = req.id;
    let response = match req.method.as_str() {
        "initialize" => handle_initialize(state, id),
        "ping" => MCPResponse::success(id, serde_json::json!({})),
        "tools/list" => handle_tools_list(registry, id),
        "tools/call" => handle_tools_call(registry, id, req.params),
        other => {
            tracing::debug!(method = %other, "unknown method");
            MCPResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
        }
    };
    Some(response)
}

/// Handle one line of the STDIO stream.
///
/// Returns the serialized response line, or None when nothing should be
/// written (blank lines, notifications, and unparsable input without an id).
pub fn handle_line(state: &AppState, registry: &ToolRegistry, line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }

    let response = match serde_json::from_str::<MCPRequest>(line) {
        Ok(req) => dispatch(state, registry, req)?,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse JSON-RPC request");
            // Answer only if the id can still be recovered from the raw JSON
            let id = serde_json::from_str::<Value>(line)
                .ok()
                .and_then(|partial| partial.get("id").cloned())?;
            MCPResponse::error_with_data(
                Some(id),
                PARSE_ERROR,
                "Parse error",
                Some(serde_json::json!({
                    "detail": e.to_string(),
                    "line": e.line(),
                    "column": e.column()
                })),
            )
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response");
            None
        }
    }
}

/// Handle MCP initialize: protocol version, capabilities, server info.
fn handle_initialize(state: &AppState, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(
        id,
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

/// Handle MCP tools/list: every registered tool with its input schema.
fn handle_tools_list(registry: &ToolRegistry, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(id, serde_json::json!({ "tools": registry.tools() }))
}

/// Execute a tool and wrap its outcome as MCP content.
///
/// Tool failures are reported inside the result with `isError: true`;
/// only malformed params and unknown tools become JSON-RPC errors.
fn handle_tools_call(registry: &ToolRegistry, id: Option<Value>, params: Option<Value>) -> MCPResponse {
    let Some(params) = params else {
        return MCPResponse::error(id, INVALID_PARAMS, "Invalid params");
    };

    let call: ToolCallParams = match serde_json::from_value(params) {
        Ok(call) => call,
        Err(e) => return MCPResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
    };

    // Tool errors stay inside the result; the JSON-RPC call itself succeeded
    match registry.call(&call.name, call.arguments) {
        Some(Ok(result)) => MCPResponse::success(id, tool_success(&result)),
        Some(Err(e)) => {
            tracing::warn!(tool = %call.name, error = %e, "tool call failed");
            MCPResponse::success(id, tool_failure(&e.to_string()))
        }
        None => MCPResponse::error(id, METHOD_NOT_FOUND, format!("Unknown tool: {}", call.name)),
    }
}

/// Health check endpoint handler.
async fn health(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": state.server_name
    })))
}

/// MCP JSON-RPC request handler for HTTP mode.
///
/// Notifications are acknowledged with 202 and an empty body.
async fn mcp_handler(
    state: web::Data<AppState>,
    registry: web::Data<ToolRegistry>,
    req: web::Json<MCPRequest>,
) -> Result<HttpResponse> {
    match dispatch(&state, &registry, req.into_inner()) {
        Some(response) => Ok(HttpResponse::Ok().json(response)),
        None => Ok(HttpResponse::Accepted().finish()),
    }
}

/// Register the HTTP routes.
///
/// Expects `AppState` and `ToolRegistry` to be provided as app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// # Configuration
/// - Worker threads: from config (CPU count, max 16, by default)
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive and request timeout: 30 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(config: &ServerConfig, registry: Arc<ToolRegistry>) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = config.bind_addr();
    let app_state = web::Data::new(AppState::from(config));
    let tool_registry = web::Data::from(registry);

    tracing::info!(
        name = %config.name,
        version = %config.version,
        bind = %bind_addr,
        workers = config.workers,
        "MCP server starting (HTTP mode)"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(tool_registry.clone())
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            // %r = request line, %s = status, %D = duration in ms
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure_routes)
    })
    .workers(config.workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the MCP server in STDIO mode.
///
/// Thin wrapper that serves stdin/stdout through `serve_lines` with 8KB
/// buffers. Logs go to stderr.
pub async fn run_server_stdio(state: AppState, registry: Arc<ToolRegistry>) -> std::io::Result<()> {
    use tokio::io::{BufReader, BufWriter};

    tracing::info!(
        name = %state.server_name,
        version = %state.server_version,
        "MCP server starting (STDIO mode)"
    );

    let stdin = BufReader::with_capacity(8192, tokio::io::stdin());
    let stdout = BufWriter::with_capacity(8192, tokio::io::stdout());
    serve_lines(&state, &registry, stdin, stdout).await?;

    tracing::info!("stdin closed, STDIO server stopping");
    Ok(())
}

/// Serve newline-delimited JSON-RPC from `reader` to `writer`.
///
/// Writes one response line per answered request and flushes after each.
/// Requests are processed one at a time until EOF. A line that is not
/// valid UTF-8 is logged and skipped; its id cannot be recovered, so it
/// gets no reply, the same as any other unparsable line without an id.
/// Only I/O errors on the streams themselves end the loop.
///
/// # Arguments
/// * `state` - Server metadata for initialize responses
/// * `registry` - Tools available to `tools/call`
/// * `reader` - Buffered request stream (stdin in production)
/// * `writer` - Response stream (stdout in production)
pub async fn serve_lines<R, W>(
    state: &AppState,
    registry: &ToolRegistry,
    mut reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        // Read raw bytes so a bad line cannot end the stream
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, bytes = buf.len(), "skipping line that is not valid UTF-8");
                continue;
            }
        };

        // Blank lines, notifications and id-less garbage produce nothing
        let Some(response) = handle_line(state, registry, line) else {
            continue;
        };

        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        // Flush after each response so the client sees it immediately
        writer.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stub_tool(name: &str, description: &str) -> MCPTool {
        MCPTool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn registering_same_name_replaces_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(stub_tool("t", "first"), Box::new(|_: Value| Ok(json!(1))));
        registry.register(stub_tool("other", "other"), Box::new(|_: Value| Ok(json!(0))));
        registry.register(stub_tool("t", "second"), Box::new(|_: Value| Ok(json!(2))));

        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["other", "t"]);
        assert_eq!(registry.tools()[1].description, "second");
        assert_eq!(registry.call("t", json!({})), Some(Ok(json!(2))));
    }

    #[test]
    fn calling_unknown_tool_returns_none() {
        let registry = ToolRegistry::new();
        assert!(registry.call("missing", json!({})).is_none());
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        use rand::Rng;
        let a: u64 = dice_rng(Some(9)).random();
        let b: u64 = dice_rng(Some(9)).random();
        assert_eq!(a, b);
    }

    #[test]
    fn initialize_tools_registers_dice_and_addition() {
        let registry = initialize_tools(&ServerConfig::default());
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["roll_dice", "add_numbers"]);
    }

    #[test]
    fn notifications_are_not_answered() {
        let state = AppState::from(&ServerConfig::default());
        let registry = initialize_tools(&ServerConfig::default());
        let req: MCPRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                .unwrap();
        assert!(dispatch(&state, &registry, req).is_none());
    }
}
