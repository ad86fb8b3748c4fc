//! Stage 3: validated operation dispatch.
//!
//! Resolution order is fixed: operation name, then service, then entity,
//! then capability, then request building, then the single transport call.
//! Validation completes before anything goes on the wire, so a validation
//! failure never leaves partial side effects.

use serde_json::{Map, Value, json};

use crate::catalog::Catalog;
use crate::catalog::model::EntityType;
use crate::error::GatewayError;
use crate::transport::{EntityTransport, QueryOptions, TransportError};

use super::keys::build_key_expression;

/// The closed operation set. Read is always permitted; the other verbs are
/// gated by the entity's capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    ReadSingle,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Parse a caller-supplied operation name. Anything outside the closed
    /// set fails before any catalog lookup.
    pub fn parse(name: &str) -> Result<Self, GatewayError> {
        match name {
            "read" => Ok(Operation::Read),
            "read-single" => Ok(Operation::ReadSingle),
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(GatewayError::InvalidOperation(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::ReadSingle => "read-single",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    fn describe(&self, entity_name: &str) -> String {
        match self {
            Operation::Read => format!("Retrieved {entity_name} entity set"),
            Operation::ReadSingle => format!("Retrieved one {entity_name} entity"),
            Operation::Create => format!("Created {entity_name} entity"),
            Operation::Update => format!("Updated {entity_name} entity"),
            Operation::Delete => format!("Deleted {entity_name} entity"),
        }
    }
}

/// Uniform Stage 3 result envelope.
#[derive(Debug, serde::Serialize)]
pub struct ExecutionOutcome {
    pub operation: String,
    pub description: String,
    pub data: Value,
}

/// Validate and dispatch one operation against the transport.
pub async fn execute(
    catalog: &Catalog,
    transport: &dyn EntityTransport,
    service_id: &str,
    entity_name: &str,
    operation: &str,
    parameters: &Map<String, Value>,
    options: &QueryOptions,
) -> Result<ExecutionOutcome, GatewayError> {
    let operation = Operation::parse(operation)?;

    let service = catalog
        .service(service_id)
        .ok_or_else(|| GatewayError::ServiceNotFound(service_id.to_string()))?;
    let entity = service.entity(entity_name).ok_or_else(|| GatewayError::EntityNotFound {
        service_id: service_id.to_string(),
        entity_name: entity_name.to_string(),
        available: service.entity_names(),
    })?;

    enforce_capability(operation, entity)?;

    let base_path = service.base_path.as_str();
    let context = || format!("{} on {service_id}/{entity_name}", operation.as_str());

    let data = match operation {
        Operation::Read => transport
            .fetch_entity_set(base_path, entity_name, options)
            .await
            .map_err(|e| wrap_transport(e, context()))?,
        Operation::ReadSingle => {
            let key = build_key_expression(entity, parameters)?;
            transport
                .fetch_entity(base_path, entity_name, &key)
                .await
                .map_err(|e| wrap_transport(e, format!("{} [{key}]", context())))?
        }
        Operation::Create => {
            let payload = build_create_payload(entity, parameters);
            transport
                .create_entity(base_path, entity_name, &payload)
                .await
                .map_err(|e| wrap_transport(e, context()))?
        }
        Operation::Update => {
            let key = build_key_expression(entity, parameters)?;
            let payload = build_update_payload(entity, parameters);
            transport
                .update_entity(base_path, entity_name, &key, &payload)
                .await
                .map_err(|e| wrap_transport(e, format!("{} [{key}]", context())))?
        }
        Operation::Delete => {
            let key = build_key_expression(entity, parameters)?;
            transport
                .delete_entity(base_path, entity_name, &key)
                .await
                .map_err(|e| wrap_transport(e, format!("{} [{key}]", context())))?;
            // The transport returns no body for delete; synthesize the
            // confirmation the envelope promises.
            json!({ "deleted": true, "entity": entity_name, "key": key })
        }
    };

    Ok(ExecutionOutcome {
        operation: operation.as_str().to_string(),
        description: operation.describe(entity_name),
        data,
    })
}

fn enforce_capability(operation: Operation, entity: &EntityType) -> Result<(), GatewayError> {
    let denied = |capability: &str| GatewayError::CapabilityDenied {
        entity_name: entity.name.clone(),
        operation: operation.as_str().to_string(),
        capability: capability.to_string(),
    };
    match operation {
        Operation::Create if !entity.creatable => Err(denied("creatable")),
        Operation::Update if !entity.updatable => Err(denied("updatable")),
        Operation::Delete if !entity.deletable => Err(denied("deletable")),
        _ => Ok(()),
    }
}

fn wrap_transport(error: TransportError, context: String) -> GatewayError {
    GatewayError::Transport {
        context,
        status: error.status(),
        message: error.to_string(),
    }
}

/// Reserved field names never forwarded to the service: OData v2 inline
/// metadata and v4 annotations.
fn is_reserved_field(name: &str) -> bool {
    name.starts_with("__") || name.starts_with("@odata")
}

/// Filter create input: reserved fields dropped, nulls dropped, fields not
/// in the property list dropped with a warning, and declared key fields
/// stripped (keys are server-assigned on create).
pub(crate) fn build_create_payload(entity: &EntityType, parameters: &Map<String, Value>) -> Value {
    filter_payload(entity, parameters)
}

/// Update body: the same parameters minus the key fields (already consumed
/// by the key expression), run through the same filtering.
pub(crate) fn build_update_payload(entity: &EntityType, parameters: &Map<String, Value>) -> Value {
    filter_payload(entity, parameters)
}

fn filter_payload(entity: &EntityType, parameters: &Map<String, Value>) -> Value {
    let mut payload = Map::new();
    for (name, value) in parameters {
        if is_reserved_field(name) {
            continue;
        }
        if value.is_null() {
            continue;
        }
        if entity.property(name).is_none() {
            log::warn!(
                "dropping unknown field '{}' for entity '{}'",
                name,
                entity.name
            );
            continue;
        }
        if entity.is_key(name) {
            continue;
        }
        payload.insert(name.clone(), value.clone());
    }
    Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::Property;
    use serde_json::json;

    fn entity() -> EntityType {
        EntityType {
            name: "SalesOrderHeader".to_string(),
            namespace: String::new(),
            properties: vec![
                Property {
                    name: "OrderId".to_string(),
                    edm_type: "Edm.String".to_string(),
                    nullable: false,
                    max_length: Some(10),
                },
                Property {
                    name: "CustomerName".to_string(),
                    edm_type: "Edm.String".to_string(),
                    nullable: true,
                    max_length: None,
                },
            ],
            keys: vec!["OrderId".to_string()],
            creatable: true,
            updatable: true,
            deletable: true,
        }
    }

    #[test]
    fn test_operation_parse_rejects_unknown_names() {
        assert!(Operation::parse("read").is_ok());
        assert!(Operation::parse("read-single").is_ok());
        let err = Operation::parse("upsert").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidOperation(_)));
    }

    #[test]
    fn test_create_payload_filtering() {
        let params: Map<String, Value> = json!({
            "OrderId": "1000",
            "CustomerName": "ACME",
            "Unknown": "x",
            "__metadata": {"uri": "..."},
            "@odata.etag": "W/\"1\"",
            "NullField": null
        })
        .as_object()
        .unwrap()
        .clone();

        let payload = build_create_payload(&entity(), &params);
        let obj = payload.as_object().unwrap();
        // Keys are server-assigned on create; reserved, null and unknown
        // fields are all dropped.
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["CustomerName"], "ACME");
    }

    #[test]
    fn test_update_payload_excludes_key_fields() {
        let params: Map<String, Value> = json!({
            "OrderId": "1000",
            "CustomerName": "ACME"
        })
        .as_object()
        .unwrap()
        .clone();

        let payload = build_update_payload(&entity(), &params);
        let obj = payload.as_object().unwrap();
        assert!(!obj.contains_key("OrderId"));
        assert_eq!(obj["CustomerName"], "ACME");
    }

    #[test]
    fn test_capability_enforcement() {
        let mut e = entity();
        e.creatable = false;
        let err = enforce_capability(Operation::Create, &e).unwrap_err();
        match err {
            GatewayError::CapabilityDenied { capability, .. } => {
                assert_eq!(capability, "creatable");
            }
            other => panic!("expected CapabilityDenied, got {other:?}"),
        }
        // Read is always permitted.
        assert!(enforce_capability(Operation::Read, &e).is_ok());
        assert!(enforce_capability(Operation::ReadSingle, &e).is_ok());
    }
}
