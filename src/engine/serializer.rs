//! Entity serializer
//!
//! Turns backend-typed rows into the uniform `{"value": [...]}` payload.
//! Each backend has its own closed value enum with an exhaustive JSON
//! mapping; wide-column rows additionally carry their system fields.

use serde_json::{json, Map, Number, Value};

use crate::engine::adapter::{RelationalRow, RelationalValue};
use crate::engine::widecolumn::entity::{
    iso8601, EdmValue, Entity, PARTITION_KEY, ROW_KEY, TIMESTAMP,
};

/// A backend scalar with a JSON form
pub trait JsonScalar {
    fn to_json(&self) -> Value;
}

impl JsonScalar for RelationalValue {
    fn to_json(&self) -> Value {
        match self {
            RelationalValue::Text(s) => Value::String(s.clone()),
            RelationalValue::Int32(n) => json!(n),
            RelationalValue::Int64(n) => json!(n),
            RelationalValue::Double(d) => double(*d),
            RelationalValue::Other(s) => Value::String(s.clone()),
        }
    }
}

impl JsonScalar for EdmValue {
    fn to_json(&self) -> Value {
        match self {
            EdmValue::String(s) => Value::String(s.clone()),
            EdmValue::Int32(n) => json!(n),
            EdmValue::Int64(n) => json!(n),
            EdmValue::Double(d) => double(*d),
            EdmValue::Boolean(b) => Value::Bool(*b),
            EdmValue::DateTime(dt) => Value::String(iso8601(dt)),
            EdmValue::Binary(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            EdmValue::Guid(g) => Value::String(g.hyphenated().to_string()),
        }
    }
}

// NaN and infinities have no JSON number form
fn double(d: f64) -> Value {
    Number::from_f64(d)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(d.to_string()))
}

/// Emit properties in order; a repeated name keeps its first position
fn emit_properties<'a, V, I>(properties: I) -> Map<String, Value>
where
    V: JsonScalar + 'a,
    I: IntoIterator<Item = (&'a str, &'a V)>,
{
    let mut object = Map::new();
    for (name, value) in properties {
        object.insert(name.to_string(), value.to_json());
    }
    object
}

fn wrap(rows: Vec<Value>) -> Value {
    json!({ "value": rows })
}

pub fn serialize_relational_rows(rows: &[RelationalRow]) -> Value {
    wrap(
        rows.iter()
            .map(|row| {
                Value::Object(emit_properties(
                    row.properties.iter().map(|(name, value)| (name.as_str(), value)),
                ))
            })
            .collect(),
    )
}

/// Like the relational form, followed by `Timestamp`, `PartitionKey`, `RowKey`
pub fn serialize_wide_column_rows(entities: &[Entity]) -> Value {
    wrap(
        entities
            .iter()
            .map(|entity| {
                let mut object = emit_properties(
                    entity.properties.iter().map(|p| (p.name.as_str(), &p.value)),
                );
                let system = [
                    (TIMESTAMP, iso8601(&entity.timestamp)),
                    (PARTITION_KEY, entity.partition_key.clone()),
                    (ROW_KEY, entity.row_key.clone()),
                ];
                for (name, value) in system {
                    object.insert(name.to_string(), Value::String(value));
                }
                Value::Object(object)
            })
            .collect(),
    )
}

pub fn serialize_table_names(names: &[String]) -> Value {
    json!({ "value": names })
}

pub fn serialize_table_metadata(table: &str) -> Value {
    json!({ "TableName": table })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn bob() -> Entity {
        let mut entity = Entity::new("P1", "R1").with("Name", EdmValue::String("Bob".to_string()));
        entity.timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        entity
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(serialize_relational_rows(&[]).to_string(), r#"{"value":[]}"#);
        assert_eq!(serialize_wide_column_rows(&[]).to_string(), r#"{"value":[]}"#);
    }

    #[test]
    fn test_wide_column_metadata_order() {
        assert_eq!(
            serialize_wide_column_rows(&[bob()]).to_string(),
            concat!(
                r#"{"value":[{"Name":"Bob","Timestamp":"2024-01-01T00:00:00Z","#,
                r#""PartitionKey":"P1","RowKey":"R1"}]}"#
            )
        );
    }

    #[test]
    fn test_system_fields_overwrite_in_place() {
        let entity = bob()
            .with("RowKey", EdmValue::String("stale".to_string()))
            .with("Age", EdmValue::Int32(7));
        assert_eq!(
            serialize_wide_column_rows(&[entity]).to_string(),
            concat!(
                r#"{"value":[{"Name":"Bob","RowKey":"R1","Age":7,"#,
                r#""Timestamp":"2024-01-01T00:00:00Z","PartitionKey":"P1"}]}"#
            )
        );
    }

    #[test]
    fn test_relational_rows() {
        let rows = vec![
            RelationalRow::new()
                .with("id", RelationalValue::Int64(1))
                .with("name", RelationalValue::Text("Alice".to_string()))
                .with("score", RelationalValue::Double(2.5))
                .with("note", RelationalValue::Other(String::new())),
            RelationalRow::new().with("id", RelationalValue::Int32(2)),
        ];
        assert_eq!(
            serialize_relational_rows(&rows).to_string(),
            r#"{"value":[{"id":1,"name":"Alice","score":2.5,"note":""},{"id":2}]}"#
        );
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![bob(), bob().with("Flag", EdmValue::Boolean(false))];
        let first = serialize_wide_column_rows(&rows).to_string();
        assert_eq!(first, serialize_wide_column_rows(&rows).to_string());

        let relational = vec![RelationalRow::new()
            .with("b", RelationalValue::Int64(2))
            .with("a", RelationalValue::Double(0.1))];
        assert_eq!(
            serialize_relational_rows(&relational).to_string(),
            serialize_relational_rows(&relational).to_string()
        );
    }

    #[test]
    fn test_edm_scalars() {
        let guid = Uuid::parse_str("936da01f-9abd-4d9d-80c7-02af85c822a8").unwrap();
        assert_eq!(
            EdmValue::Guid(guid).to_json(),
            json!("936da01f-9abd-4d9d-80c7-02af85c822a8")
        );
        let whole = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(EdmValue::DateTime(whole).to_json(), json!("2024-01-01T00:00:00Z"));
        let fractional = whole + chrono::Duration::milliseconds(5);
        assert_eq!(
            EdmValue::DateTime(fractional).to_json(),
            json!("2024-01-01T00:00:00.005Z")
        );
        assert_eq!(EdmValue::String("Bob".to_string()).to_json(), json!("Bob"));
        assert_eq!(EdmValue::Int32(-7).to_json(), json!(-7));
        assert_eq!(EdmValue::Double(2.5).to_json(), json!(2.5));
        assert_eq!(EdmValue::Binary(b"hi".to_vec()).to_json(), json!("hi"));
        assert_eq!(EdmValue::Boolean(true).to_json(), json!(true));
        assert_eq!(EdmValue::Int64(-5).to_json(), json!(-5));
        assert_eq!(EdmValue::Double(f64::NAN).to_json(), json!("NaN"));
        assert_eq!(RelationalValue::Double(f64::INFINITY).to_json(), json!("inf"));
    }

    #[test]
    fn test_table_helpers() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(serialize_table_names(&names).to_string(), r#"{"value":["a","b"]}"#);
        assert_eq!(serialize_table_metadata("people").to_string(), r#"{"TableName":"people"}"#);
    }
}
