use std::sync::Arc;

use anyhow::Result;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam, GetPromptResult,
        Implementation, InitializeRequestParam, InitializeResult, ListPromptsResult,
        ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, PaginatedRequestParam,
        AnnotateAble, ProtocolVersion, RawResource, ReadResourceRequestParam, ReadResourceResult,
        ResourceContents, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    transport::stdio,
};
use serde_json::json;

use crate::error::GatewayError;
use crate::gateway::Gateway;

use super::tools::{
    DESCRIBE_ENTITY, DescribeEntityArgs, EXECUTE_ENTITY_OPERATION, ExecuteOperationArgs,
    SEARCH_SERVICES, SearchServicesArgs, all_tool_metadata,
};

/// URI of the read-only catalog listing resource.
const CATALOG_RESOURCE_URI: &str = "catalog://services";

/// MCP server exposing the three-stage gateway over stdio.
///
/// The tool surface is fixed at three tools regardless of catalog size;
/// callers narrow down with `search_services`, inspect with
/// `describe_entity`, then act with `execute_entity_operation`.
pub struct GatewayServer {
    gateway: Arc<Gateway>,
}

impl GatewayServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Serve the stdio transport until the peer disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        log::info!(
            "Starting stdio server over a catalog of {} service(s)",
            self.gateway.catalog().len()
        );

        let service = self.serve(stdio()).await.inspect_err(|e| {
            log::error!("serving error: {e:?}");
        })?;
        service.waiting().await?;

        log::info!("Stdio server stopped");
        Ok(())
    }

    fn parse_args<T: serde::de::DeserializeOwned>(
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<T, McpError> {
        let value = serde_json::Value::Object(arguments.unwrap_or_default());
        serde_json::from_value(value)
            .map_err(|e| McpError::invalid_params(format!("Invalid arguments: {e}"), None))
    }

    /// Turn an engine error into a tool result or a protocol error.
    ///
    /// Caller-correctable failures become structured error results so the
    /// calling agent can self-correct; only transport failures propagate as
    /// hard errors.
    fn error_result(error: GatewayError) -> Result<CallToolResult, McpError> {
        if error.is_transport() {
            log::error!("transport failure: {error}");
            return Err(McpError::internal_error(
                error.to_string(),
                Some(error.to_json()),
            ));
        }
        log::debug!("validation failure: {error}");
        let body =
            serde_json::to_string_pretty(&error.to_json()).unwrap_or_else(|_| error.to_string());
        Ok(CallToolResult::error(vec![Content::text(body)]))
    }

    fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
        let body = serde_json::to_string_pretty(&value)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;
        Ok(CallToolResult::success(vec![Content::text(body)]))
    }

    async fn handle_search(&self, args: SearchServicesArgs) -> Result<CallToolResult, McpError> {
        let result =
            self.gateway
                .discover(args.query.as_deref(), args.category.as_deref(), args.limit);
        Self::json_result(json!(result))
    }

    async fn handle_describe(&self, args: DescribeEntityArgs) -> Result<CallToolResult, McpError> {
        match self.gateway.describe(&args.service_id, &args.entity_name) {
            Ok(description) => Self::json_result(json!(description)),
            Err(e) => Self::error_result(e),
        }
    }

    async fn handle_execute(&self, args: ExecuteOperationArgs) -> Result<CallToolResult, McpError> {
        let options = args.query_options.unwrap_or_default();
        match self
            .gateway
            .execute(
                &args.service_id,
                &args.entity_name,
                &args.operation,
                &args.parameters,
                &options,
            )
            .await
        {
            Ok(outcome) => Self::json_result(json!(outcome)),
            Err(e) => Self::error_result(e),
        }
    }
}

impl ServerHandler for GatewayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "OData gateway with progressive discovery. Use search_services to find a service and entity, describe_entity to fetch its schema, then execute_entity_operation to read or write data.".to_string(),
            ),
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_name = request.name.clone();
        log::debug!("Tool call '{tool_name}'");

        match &*tool_name {
            SEARCH_SERVICES => self.handle_search(Self::parse_args(request.arguments)?).await,
            DESCRIBE_ENTITY => self.handle_describe(Self::parse_args(request.arguments)?).await,
            EXECUTE_ENTITY_OPERATION => {
                self.handle_execute(Self::parse_args(request.arguments)?).await
            }
            other => Err(McpError::invalid_params(
                format!("Unknown tool: {other}"),
                None,
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let mut tools = Vec::new();
        for tool_meta in all_tool_metadata() {
            let schema_obj = match tool_meta.schema.clone() {
                serde_json::Value::Object(obj) => Arc::new(obj),
                _ => Arc::new(serde_json::Map::new()),
            };
            tools.push(Tool {
                name: tool_meta.name.to_string().into(),
                title: None,
                description: Some(tool_meta.description.to_string().into()),
                input_schema: schema_obj,
                output_schema: None,
                annotations: None,
                icons: None,
                meta: None,
            });
        }
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut raw = RawResource::new(CATALOG_RESOURCE_URI, "service-catalog");
        raw.description = Some(
            "Full catalog listing: service ids, titles, entity counts and categories".to_string(),
        );
        raw.mime_type = Some("application/json".to_string());
        Ok(ListResourcesResult {
            resources: vec![raw.no_annotation()],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if request.uri != CATALOG_RESOURCE_URI {
            return Err(McpError::invalid_request(
                format!("Unknown resource: {}", request.uri),
                Some(json!({ "available": [CATALOG_RESOURCE_URI] })),
            ));
        }
        let listing = self.gateway.catalog_listing();
        let body = serde_json::to_string_pretty(&json!({ "services": listing }))
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(body, CATALOG_RESOURCE_URI)],
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            next_cursor: None,
            resource_templates: Vec::new(),
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult {
            prompts: vec![],
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        _request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        Err(McpError::invalid_request("Prompts not supported", None))
    }

    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        Ok(self.get_info())
    }
}
