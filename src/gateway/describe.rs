//! Stage 2: full schema resolution for one (service, entity) pair.
//!
//! Idempotent and side-effect-free. Failure payloads enumerate the entity
//! names the service actually has, so a caller can correct a typo without a
//! further round trip.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::catalog::model::{EntityType, ODataVersion, Service};
use crate::error::GatewayError;

#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    pub id: String,
    pub title: String,
    pub version: ODataVersion,
    pub base_path: String,
}

impl From<&Service> for ServiceSummary {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id.clone(),
            title: service.title.clone(),
            version: service.version,
            base_path: service.base_path.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub edm_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    pub is_key: bool,
}

/// Complete schema for one entity.
#[derive(Debug, Serialize)]
pub struct EntityDescription {
    pub service: ServiceSummary,
    pub entity_name: String,
    pub namespace: String,
    pub keys: Vec<String>,
    pub properties: Vec<PropertyDescriptor>,
    pub creatable: bool,
    pub updatable: bool,
    pub deletable: bool,
}

/// Resolve the full schema of `entity_name` within `service_id`.
pub fn describe(
    catalog: &Catalog,
    service_id: &str,
    entity_name: &str,
) -> Result<EntityDescription, GatewayError> {
    let service = catalog
        .service(service_id)
        .ok_or_else(|| GatewayError::ServiceNotFound(service_id.to_string()))?;

    let entity = service.entity(entity_name).ok_or_else(|| GatewayError::EntityNotFound {
        service_id: service_id.to_string(),
        entity_name: entity_name.to_string(),
        available: service.entity_names(),
    })?;

    Ok(build_description(service, entity))
}

fn build_description(service: &Service, entity: &EntityType) -> EntityDescription {
    let properties = entity
        .properties
        .iter()
        .map(|p| PropertyDescriptor {
            name: p.name.clone(),
            edm_type: p.edm_type.clone(),
            nullable: p.nullable,
            max_length: p.max_length,
            is_key: entity.is_key(&p.name),
        })
        .collect();

    EntityDescription {
        service: ServiceSummary::from(service),
        entity_name: entity.name.clone(),
        namespace: entity.namespace.clone(),
        keys: entity.keys.clone(),
        properties,
        creatable: entity.creatable,
        updatable: entity.updatable,
        deletable: entity.deletable,
    }
}
