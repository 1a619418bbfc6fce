//! MCP server for omnidex — exposes the read-only SQL gateway over the
//! Model Context Protocol so an LLM client can query the network
//! database directly.

pub mod params;

use crate::sqltool::{SqlGateway, SqlToolResponse};
use crate::storage::NetworkStore;
use params::*;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use std::path::PathBuf;
use std::sync::Arc;

fn ok_text(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

#[derive(Clone)]
pub struct OmnidexMcpServer {
    gateway: SqlGateway,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OmnidexMcpServer {
    pub fn new(store: Arc<NetworkStore>) -> Self {
        Self {
            gateway: SqlGateway::new(store),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Execute a read-only SQL SELECT statement against the molecular interaction database. Returns rows as JSON. Use describe_schema first to see the available tables."
    )]
    fn execute_sql(
        &self,
        Parameters(p): Parameters<ExecuteSqlParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.gateway.run(&p.sql_query) {
            response @ SqlToolResponse::Success { .. } => {
                match serde_json::to_string_pretty(&response) {
                    Ok(text) => ok_text(text),
                    Err(e) => err_text(e.to_string()),
                }
            }
            SqlToolResponse::Failure { error } => err_text(error),
        }
    }

    #[tool(
        description = "Describe the tables and columns of the molecular interaction database, with example queries."
    )]
    fn describe_schema(&self) -> Result<CallToolResult, McpError> {
        ok_text(self.gateway.schema_description())
    }
}

#[tool_handler]
impl ServerHandler for OmnidexMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "omnidex MCP server — read-only SQL access to the molecular interaction network database"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server on stdio until the client disconnects.
///
/// Returns a process exit code; all diagnostics go to stderr because
/// stdout carries the protocol.
pub fn run_mcp_server(db_path: PathBuf) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let store = match NetworkStore::open(&db_path) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                eprintln!("failed to open database at {}: {}", db_path.display(), e);
                return 1;
            }
        };

        let server = OmnidexMcpServer::new(store);

        eprintln!("omnidex mcp server starting on stdio...");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to start MCP server: {}", e);
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            eprintln!("MCP server error: {}", e);
            return 1;
        }

        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> OmnidexMcpServer {
        let store = NetworkStore::open_in_memory().unwrap();
        store
            .raw_batch(
                r#"
                INSERT INTO annotations (uniprot, genesymbol, source, label, value)
                VALUES ('P04637', 'TP53', 'HPA', 'tissue', 'ubiquitous');
                "#,
            )
            .unwrap();
        OmnidexMcpServer::new(Arc::new(store))
    }

    #[test]
    fn execute_sql_returns_rows_for_selects() {
        let server = server();
        let result = server
            .execute_sql(Parameters(ExecuteSqlParams {
                sql_query: "SELECT genesymbol FROM annotations".into(),
            }))
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        let text = result.content[0].as_text().unwrap();
        assert!(text.text.contains("TP53"));
        assert!(text.text.contains("totalCount"));
    }

    #[test]
    fn execute_sql_rejects_mutations() {
        let server = server();
        let result = server
            .execute_sql(Parameters(ExecuteSqlParams {
                sql_query: "DROP TABLE annotations".into(),
            }))
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = result.content[0].as_text().unwrap();
        assert_eq!(
            text.text,
            "Invalid query. Only SELECT statements are allowed."
        );
    }

    #[test]
    fn describe_schema_lists_tables() {
        let server = server();
        let result = server.describe_schema().unwrap();
        let text = result.content[0].as_text().unwrap();
        assert!(text.text.contains("interactions"));
        assert!(text.text.contains("enzsub"));
    }
}
