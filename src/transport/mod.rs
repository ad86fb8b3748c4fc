//! Transport collaborator boundary.
//!
//! The engine builds key expressions and query options; everything about how
//! requests reach the backing services (endpoint resolution, authentication,
//! retries, timeouts) belongs to the implementation behind [`EntityTransport`].

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use http::{HttpTransport, HttpTransportConfig};

/// Failure at the transport boundary. The dispatcher re-wraps these with
/// operation context before returning them to the caller.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The upstream service answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The request never produced an upstream answer (connect failure,
    /// timeout enforced by the HTTP client, malformed response body).
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Upstream { status, .. } => Some(*status),
            TransportError::Request(_) => None,
        }
    }
}

/// OData query options for entity-set reads. Each option is sent only when
/// present and meaningful: blank strings are pruned, `top` must be positive
/// and `skip` non-negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct QueryOptions {
    /// `$filter` expression.
    pub filter: Option<String>,
    /// Comma-separated `$select` projection.
    pub select: Option<String>,
    /// Comma-separated `$expand` navigation list.
    pub expand: Option<String>,
    /// `$orderby` expression.
    pub orderby: Option<String>,
    /// `$top` row limit; honored only when positive.
    pub top: Option<i64>,
    /// `$skip` offset; honored only when non-negative.
    pub skip: Option<i64>,
}

impl QueryOptions {
    /// Render the wire query parameters, independently omitting anything
    /// absent or empty. Never emits an empty-string parameter.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let text_options = [
            ("$filter", &self.filter),
            ("$select", &self.select),
            ("$expand", &self.expand),
            ("$orderby", &self.orderby),
        ];
        for (name, value) in text_options {
            if let Some(value) = value {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    params.push((name.to_string(), trimmed.to_string()));
                }
            }
        }
        if let Some(top) = self.top {
            if top > 0 {
                params.push(("$top".to_string(), top.to_string()));
            }
        }
        if let Some(skip) = self.skip {
            if skip >= 0 {
                params.push(("$skip".to_string(), skip.to_string()));
            }
        }
        params
    }
}

/// The five CRUD primitives the engine dispatches to.
///
/// `key_expression` arrives already type-formatted (see the dispatcher); the
/// transport only has to place it inside the resource path.
#[async_trait]
pub trait EntityTransport: Send + Sync {
    async fn fetch_entity_set(
        &self,
        base_path: &str,
        entity_set: &str,
        options: &QueryOptions,
    ) -> Result<Value, TransportError>;

    async fn fetch_entity(
        &self,
        base_path: &str,
        entity_set: &str,
        key_expression: &str,
    ) -> Result<Value, TransportError>;

    async fn create_entity(
        &self,
        base_path: &str,
        entity_set: &str,
        payload: &Value,
    ) -> Result<Value, TransportError>;

    async fn update_entity(
        &self,
        base_path: &str,
        entity_set: &str,
        key_expression: &str,
        payload: &Value,
    ) -> Result<Value, TransportError>;

    /// Delete returns no body upstream; success is the only signal.
    async fn delete_entity(
        &self,
        base_path: &str,
        entity_set: &str,
        key_expression: &str,
    ) -> Result<(), TransportError>;
}
