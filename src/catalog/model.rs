//! Passive schema model: services, entity types and their properties.
//!
//! These records are built once per catalog load and are read-only from the
//! engine's perspective. The service `id` is the sole lookup key; `title` is
//! display-only and never used for resolution.

use serde::{Deserialize, Serialize};

/// OData protocol version tag carried by each service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ODataVersion {
    #[serde(rename = "v2")]
    V2,
    #[serde(rename = "v4")]
    V4,
}

/// One remote data service in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Unique, caller-chosen identifier. Stable for the process lifetime.
    pub id: String,
    /// Display title. Never used for lookup.
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub version: ODataVersion,
    /// Base path the transport resolves against its endpoint.
    pub base_path: String,
    #[serde(default)]
    pub metadata_path: String,
    /// Resolved entity metadata, or `None` if resolution failed for this
    /// service. A `None` service has zero entities; that is not an error.
    #[serde(default)]
    pub metadata: Option<ServiceMetadata>,
}

impl Service {
    pub fn entity_types(&self) -> &[EntityType] {
        self.metadata
            .as_ref()
            .map(|m| m.entity_types.as_slice())
            .unwrap_or(&[])
    }

    pub fn entity(&self, name: &str) -> Option<&EntityType> {
        self.entity_types().iter().find(|e| e.name == name)
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entity_types().iter().map(|e| e.name.clone()).collect()
    }
}

/// Resolved `$metadata` for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceMetadata {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
}

/// A typed, keyed record shape exposed by a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityType {
    /// Unique within the owning service.
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Ordered key property names; the order defines composite-key ordering.
    /// Every entry has a matching `Property`.
    #[serde(default)]
    pub keys: Vec<String>,
    /// Read is always implicitly permitted; these three are independent.
    #[serde(default)]
    pub creatable: bool,
    #[serde(default)]
    pub updatable: bool,
    #[serde(default)]
    pub deletable: bool,
}

impl EntityType {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Derived by membership test against the key list, never stored.
    pub fn is_key(&self, name: &str) -> bool {
        self.keys.iter().any(|k| k == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    /// Declared type-system tag, e.g. "Edm.String" or bare "string".
    #[serde(rename = "type")]
    pub edm_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
}

fn default_nullable() -> bool {
    true
}

/// Type families that drive key-value formatting. Everything not in a named
/// family is treated as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdmTypeFamily {
    Guid,
    Numeric,
    DateTime,
    String,
}

impl EdmTypeFamily {
    /// Classify a declared type tag. The `Edm.` prefix is tolerated and the
    /// comparison is case-insensitive.
    pub fn of(edm_type: &str) -> Self {
        let bare = edm_type
            .strip_prefix("Edm.")
            .or_else(|| edm_type.strip_prefix("edm."))
            .unwrap_or(edm_type)
            .to_ascii_lowercase();
        match bare.as_str() {
            "guid" => EdmTypeFamily::Guid,
            "int" | "int16" | "int32" | "int64" | "byte" | "sbyte" | "decimal" | "double"
            | "float" | "single" => EdmTypeFamily::Numeric,
            "datetime" | "datetimeoffset" | "date" | "time" | "timeofday" => {
                EdmTypeFamily::DateTime
            }
            _ => EdmTypeFamily::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_metadata_means_zero_entities() {
        let service = Service {
            id: "BROKEN_SRV".to_string(),
            title: "Broken".to_string(),
            description: String::new(),
            version: ODataVersion::V2,
            base_path: "/sap/opu/odata/sap/BROKEN_SRV".to_string(),
            metadata_path: String::new(),
            metadata: None,
        };
        assert!(service.entity_types().is_empty());
        assert!(service.entity("Anything").is_none());
    }

    #[test]
    fn test_edm_family_classification() {
        assert_eq!(EdmTypeFamily::of("Edm.Guid"), EdmTypeFamily::Guid);
        assert_eq!(EdmTypeFamily::of("guid"), EdmTypeFamily::Guid);
        assert_eq!(EdmTypeFamily::of("Edm.Int32"), EdmTypeFamily::Numeric);
        assert_eq!(EdmTypeFamily::of("decimal"), EdmTypeFamily::Numeric);
        assert_eq!(EdmTypeFamily::of("Edm.DateTime"), EdmTypeFamily::DateTime);
        assert_eq!(EdmTypeFamily::of("datetimeoffset"), EdmTypeFamily::DateTime);
        assert_eq!(EdmTypeFamily::of("Edm.String"), EdmTypeFamily::String);
        assert_eq!(EdmTypeFamily::of("boolean"), EdmTypeFamily::String);
    }

    #[test]
    fn test_is_key_is_derived_from_key_list() {
        let entity = EntityType {
            name: "SalesOrderItem".to_string(),
            namespace: "SAP".to_string(),
            properties: vec![
                Property {
                    name: "OrderId".to_string(),
                    edm_type: "Edm.String".to_string(),
                    nullable: false,
                    max_length: Some(10),
                },
                Property {
                    name: "NetAmount".to_string(),
                    edm_type: "Edm.Decimal".to_string(),
                    nullable: true,
                    max_length: None,
                },
            ],
            keys: vec!["OrderId".to_string()],
            creatable: true,
            updatable: true,
            deletable: false,
        };
        assert!(entity.is_key("OrderId"));
        assert!(!entity.is_key("NetAmount"));
    }
}
