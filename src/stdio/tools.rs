//! Static tool metadata for the stdio server.
//!
//! The whole point of the gateway is a fixed, three-tool surface no matter
//! how many services the catalog holds; metadata lives here so the server
//! never has to enumerate per-entity tools.

use rmcp::schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::transport::QueryOptions;

pub const SEARCH_SERVICES: &str = "search_services";
pub const DESCRIBE_ENTITY: &str = "describe_entity";
pub const EXECUTE_ENTITY_OPERATION: &str = "execute_entity_operation";

/// Metadata for a single tool.
#[derive(Debug, Clone)]
pub struct ToolMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Value,
}

/// Helper to build schema from Args type.
pub fn build_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null)
}

/// Arguments for `search_services` (Stage 1).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchServicesArgs {
    /// Free-text query matched against service ids, titles and entity names.
    /// Omit to browse the whole catalog.
    pub query: Option<String>,
    /// Category filter: business-partner, sales, finance, procurement, hr,
    /// logistics or all. Unrecognized values mean all.
    pub category: Option<String>,
    /// Maximum matches to return (1-50, default 20).
    pub limit: Option<usize>,
}

/// Arguments for `describe_entity` (Stage 2).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DescribeEntityArgs {
    /// Service identifier from a search result.
    pub service_id: String,
    /// Entity name within that service.
    pub entity_name: String,
}

/// Arguments for `execute_entity_operation` (Stage 3).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteOperationArgs {
    /// Service identifier from a search result.
    pub service_id: String,
    /// Entity name within that service.
    pub entity_name: String,
    /// One of: read, read-single, create, update, delete.
    pub operation: String,
    /// Entity field values: key properties for read-single/update/delete,
    /// payload fields for create/update.
    #[serde(default)]
    pub parameters: serde_json::Map<String, Value>,
    /// Optional query options for the read operation.
    pub query_options: Option<QueryOptions>,
}

pub fn all_tool_metadata() -> Vec<ToolMetadata> {
    vec![
        ToolMetadata {
            name: SEARCH_SERVICES,
            description: "Search the service catalog by free text and category. Returns ranked (service, entity) candidates with their categories. Start here, then use describe_entity on one result before executing anything.",
            schema: build_schema::<SearchServicesArgs>(),
        },
        ToolMetadata {
            name: DESCRIBE_ENTITY,
            description: "Return the complete schema for one entity: properties with types and key flags, the ordered key list, and the create/update/delete capability flags. Use this to learn which fields an operation needs.",
            schema: build_schema::<DescribeEntityArgs>(),
        },
        ToolMetadata {
            name: EXECUTE_ENTITY_OPERATION,
            description: "Execute a CRUD operation (read, read-single, create, update, delete) against one entity. Key properties go in parameters for read-single/update/delete; query_options applies to read. Validation failures come back as structured errors naming what to fix.",
            schema: build_schema::<ExecuteOperationArgs>(),
        },
    ]
}
