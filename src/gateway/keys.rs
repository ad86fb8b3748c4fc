//! Key-expression building and type-directed value formatting.
//!
//! A key expression is the textual encoding that identifies one entity
//! instance: the type-formatted value for a single key, or comma-joined
//! `name=value` pairs (in declared key order) for composite keys.

use serde_json::{Map, Value};

use crate::catalog::model::{EdmTypeFamily, EntityType, Property};
use crate::error::GatewayError;

/// Format one key value according to its declared property type:
/// GUIDs as `guid'…'`, numerics bare, date/time as `datetime'…'`, everything
/// else as a quoted string with embedded single quotes doubled.
pub fn format_key_value(property: &Property, value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    match EdmTypeFamily::of(&property.edm_type) {
        EdmTypeFamily::Guid => format!("guid'{raw}'"),
        EdmTypeFamily::Numeric => raw,
        EdmTypeFamily::DateTime => format!("datetime'{raw}'"),
        EdmTypeFamily::String => format!("'{}'", raw.replace('\'', "''")),
    }
}

/// Build the key expression for an entity from caller parameters.
///
/// Collects the declared key properties in order; a key that is absent or
/// null in `parameters` is a `MissingKey` failure naming every missing
/// property at once, never a silent coercion.
pub fn build_key_expression(
    entity: &EntityType,
    parameters: &Map<String, Value>,
) -> Result<String, GatewayError> {
    let missing: Vec<String> = entity
        .keys
        .iter()
        .filter(|key| matches!(parameters.get(key.as_str()), None | Some(Value::Null)))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(GatewayError::MissingKey {
            entity_name: entity.name.clone(),
            missing,
        });
    }

    let mut parts = Vec::with_capacity(entity.keys.len());
    for key in &entity.keys {
        // Key names are a validated subset of property names; a catalog that
        // breaks that invariant gets string formatting as the fallback.
        let fallback = Property {
            name: key.clone(),
            edm_type: "Edm.String".to_string(),
            nullable: false,
            max_length: None,
        };
        let property = entity.property(key).unwrap_or(&fallback);
        let value = &parameters[key.as_str()];
        parts.push((key, format_key_value(property, value)));
    }

    if parts.len() == 1 {
        let (_, value) = parts.remove(0);
        Ok(value)
    } else {
        Ok(parts
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property(name: &str, edm_type: &str) -> Property {
        Property {
            name: name.to_string(),
            edm_type: edm_type.to_string(),
            nullable: false,
            max_length: None,
        }
    }

    fn entity(keys: &[(&str, &str)]) -> EntityType {
        EntityType {
            name: "Thing".to_string(),
            namespace: String::new(),
            properties: keys.iter().map(|(n, t)| property(n, t)).collect(),
            keys: keys.iter().map(|(n, _)| n.to_string()).collect(),
            creatable: true,
            updatable: true,
            deletable: true,
        }
    }

    #[test]
    fn test_string_value_quotes_and_escapes() {
        let p = property("Name", "Edm.String");
        assert_eq!(format_key_value(&p, &json!("O'Brien")), "'O''Brien'");
        assert_eq!(format_key_value(&p, &json!("1000")), "'1000'");
    }

    #[test]
    fn test_guid_and_datetime_wrapping() {
        assert_eq!(
            format_key_value(&property("Id", "Edm.Guid"), &json!("abc-123")),
            "guid'abc-123'"
        );
        assert_eq!(
            format_key_value(&property("At", "Edm.DateTime"), &json!("2024-01-01T00:00:00")),
            "datetime'2024-01-01T00:00:00'"
        );
    }

    #[test]
    fn test_numeric_value_unquoted() {
        let p = property("OrderId", "Edm.Int32");
        assert_eq!(format_key_value(&p, &json!(42)), "42");
        assert_eq!(format_key_value(&p, &json!("42")), "42");
    }

    #[test]
    fn test_single_key_emits_bare_value() {
        let e = entity(&[("OrderId", "Edm.String")]);
        let mut params = Map::new();
        params.insert("OrderId".to_string(), json!("1000"));
        assert_eq!(build_key_expression(&e, &params).unwrap(), "'1000'");
    }

    #[test]
    fn test_composite_key_joins_pairs_in_declared_order() {
        let e = entity(&[("OrderId", "Edm.Int32"), ("ItemNo", "Edm.String")]);
        let mut params = Map::new();
        params.insert("ItemNo".to_string(), json!("10"));
        params.insert("OrderId".to_string(), json!(7));
        assert_eq!(
            build_key_expression(&e, &params).unwrap(),
            "OrderId=7,ItemNo='10'"
        );
    }

    #[test]
    fn test_missing_keys_reported_together() {
        let e = entity(&[("OrderId", "Edm.Int32"), ("ItemNo", "Edm.String")]);
        let mut params = Map::new();
        params.insert("ItemNo".to_string(), Value::Null);
        let err = build_key_expression(&e, &params).unwrap_err();
        match err {
            GatewayError::MissingKey { missing, .. } => {
                assert_eq!(missing, vec!["OrderId".to_string(), "ItemNo".to_string()]);
            }
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }
}
