//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteSqlParams {
    #[schemars(
        description = "A read-only SQL SELECT statement to run against the network database"
    )]
    pub sql_query: String,
}
