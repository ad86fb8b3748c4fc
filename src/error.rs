//! Error taxonomy for the gateway engine.
//!
//! Every variant except `Transport` is caller-correctable: the serving layer
//! turns these into structured error results (not protocol failures) so an
//! agent can fix its call without consulting documentation. Each variant
//! carries enough context for that retry (available alternatives, missing
//! field names, the required capability).

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Operation name is outside the closed set. Checked before any lookup.
    #[error("unknown operation '{0}' (expected one of: read, read-single, create, update, delete)")]
    InvalidOperation(String),

    #[error("service '{0}' not found in catalog")]
    ServiceNotFound(String),

    /// The service exists but has no entity of this name. `available` lists
    /// the entity names the service actually exposes.
    #[error("service '{service_id}' has no entity '{entity_name}'")]
    EntityNotFound {
        service_id: String,
        entity_name: String,
        available: Vec<String>,
    },

    /// One or more key properties were absent (or null) in the parameters.
    /// Reports every missing property, not just the first.
    #[error("missing key properties for entity '{entity_name}': {}", .missing.join(", "))]
    MissingKey {
        entity_name: String,
        missing: Vec<String>,
    },

    #[error("entity '{entity_name}' does not support {operation} (capability '{capability}' is disabled)")]
    CapabilityDenied {
        entity_name: String,
        operation: String,
        capability: String,
    },

    /// Transport-level failure, re-wrapped with operation context. The
    /// upstream status and message are preserved for diagnostics.
    #[error("transport failure during {context}: {message}")]
    Transport {
        context: String,
        status: Option<u16>,
        message: String,
    },
}

impl GatewayError {
    /// Stable tag used in structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidOperation(_) => "InvalidOperation",
            GatewayError::ServiceNotFound(_) => "ServiceNotFound",
            GatewayError::EntityNotFound { .. } => "EntityNotFound",
            GatewayError::MissingKey { .. } => "MissingKey",
            GatewayError::CapabilityDenied { .. } => "CapabilityDenied",
            GatewayError::Transport { .. } => "TransportFailure",
        }
    }

    /// True for failures originating at the transport boundary rather than
    /// from the dispatcher's own validation.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport { .. })
    }

    /// Structured payload for the serving surface. Includes corrective
    /// context alongside the message.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match self {
            GatewayError::EntityNotFound { available, .. } => {
                body["available_entities"] = json!(available);
            }
            GatewayError::MissingKey { missing, .. } => {
                body["missing_keys"] = json!(missing);
            }
            GatewayError::CapabilityDenied { capability, .. } => {
                body["required_capability"] = json!(capability);
            }
            GatewayError::Transport { status, .. } => {
                if let Some(status) = status {
                    body["upstream_status"] = json!(status);
                }
            }
            _ => {}
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_lists_all_properties() {
        let err = GatewayError::MissingKey {
            entity_name: "SalesOrderItem".to_string(),
            missing: vec!["OrderId".to_string(), "ItemNo".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("OrderId"));
        assert!(text.contains("ItemNo"));

        let body = err.to_json();
        assert_eq!(body["error"], "MissingKey");
        assert_eq!(body["missing_keys"][1], "ItemNo");
    }

    #[test]
    fn test_entity_not_found_enumerates_alternatives() {
        let err = GatewayError::EntityNotFound {
            service_id: "SALES_SRV".to_string(),
            entity_name: "Order".to_string(),
            available: vec!["SalesOrderHeader".to_string()],
        };
        assert_eq!(err.kind(), "EntityNotFound");
        assert_eq!(err.to_json()["available_entities"][0], "SalesOrderHeader");
    }

    #[test]
    fn test_transport_kind_and_status() {
        let err = GatewayError::Transport {
            context: "read on SALES_SRV/SalesOrderHeader".to_string(),
            status: Some(502),
            message: "bad gateway".to_string(),
        };
        assert!(err.is_transport());
        assert_eq!(err.to_json()["upstream_status"], 502);
    }
}
