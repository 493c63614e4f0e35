//! Field-type bindings: which fields an entity exposes to queries, and the
//! typed values they carry.

use core::cmp::Ordering;
use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::condition::Operator;
use crate::error::QueryError;

/// Declared value type of a queryable field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Decimal,
    /// Calendar date (`YYYY-MM-DD`).
    Date,
    /// UTC instant (RFC 3339).
    Timestamp,
    Boolean,
    Uuid,
}

impl FieldType {
    /// Operators a condition on a field of this type may use.
    pub fn operators(self) -> &'static [Operator] {
        use Operator::*;
        match self {
            FieldType::String => &[Eq, Ne, Like],
            FieldType::Decimal | FieldType::Date | FieldType::Timestamp => {
                &[Eq, Ne, Gt, Ge, Lt, Le]
            }
            FieldType::Boolean | FieldType::Uuid => &[Eq, Ne],
        }
    }

    pub fn supports(self, operator: Operator) -> bool {
        self.operators().contains(&operator)
    }

    /// Decode a JSON value in this type's shape.
    ///
    /// Decimals accept JSON numbers or numeric strings so that clients can send
    /// exact values without float rounding.
    pub fn decode(self, value: &JsonValue) -> Result<FieldValue, String> {
        match (self, value) {
            (FieldType::String, JsonValue::String(s)) => Ok(FieldValue::String(s.clone())),
            (FieldType::Decimal, JsonValue::Number(n)) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .map(FieldValue::Decimal)
                .map_err(|e| e.to_string()),
            (FieldType::Decimal, JsonValue::String(s)) => Decimal::from_str(s.trim())
                .map(FieldValue::Decimal)
                .map_err(|e| e.to_string()),
            (FieldType::Date, JsonValue::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|e| e.to_string()),
            (FieldType::Timestamp, JsonValue::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|dt| FieldValue::Timestamp(dt.with_timezone(&Utc)))
                .map_err(|e| e.to_string()),
            (FieldType::Boolean, JsonValue::Bool(b)) => Ok(FieldValue::Boolean(*b)),
            (FieldType::Uuid, JsonValue::String(s)) => Uuid::from_str(s)
                .map(FieldValue::Uuid)
                .map_err(|e| e.to_string()),
            (_, other) => Err(format!("unexpected JSON {}", json_kind(other))),
        }
    }
}

impl core::fmt::Display for FieldType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
        };
        f.write_str(s)
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// A typed value, one variant per field-type family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    String(String),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
    Uuid(Uuid),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Decimal(_) => FieldType::Decimal,
            FieldValue::Date(_) => FieldType::Date,
            FieldValue::Timestamp(_) => FieldType::Timestamp,
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::Uuid(_) => FieldType::Uuid,
        }
    }

    /// Ordering between two values of the same variant; `None` across variants.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

/// One field of an entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    /// Wire name used in client payloads (camelCase).
    pub name: &'static str,
    /// Storage column the field maps to.
    pub column: &'static str,
    pub ty: FieldType,
    /// `false` for fields only structural constraints may reference.
    pub filterable: bool,
}

impl FieldDef {
    pub const fn filterable(name: &'static str, column: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            column,
            ty,
            filterable: true,
        }
    }

    pub const fn internal(name: &'static str, column: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            column,
            ty,
            filterable: false,
        }
    }
}

/// Static field table of one entity type.
///
/// Schemas are declared as `static` items next to their entity and are the
/// only source of column names for backend translators.
#[derive(Debug)]
pub struct Schema {
    pub entity: &'static str,
    pub table: &'static str,
    /// Unique key; used as the final ordering tie-breaker.
    pub id: &'static FieldDef,
    pub fields: &'static [&'static FieldDef],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().copied().find(|f| f.name == name)
    }

    /// Resolve a client-supplied field name.
    ///
    /// Fields that exist but are internal are reported exactly like missing ones
    /// so clients cannot filter on structural columns.
    pub fn filterable(&self, name: &str) -> Result<&'static FieldDef, QueryError> {
        match self.field(name) {
            Some(def) if def.filterable => Ok(def),
            _ => Err(QueryError::UnknownField {
                entity: self.entity,
                field: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, def: &FieldDef) -> bool {
        self.fields.iter().any(|f| *f == def)
    }
}

/// An entity whose fields can be read by name for in-memory evaluation.
pub trait Filterable {
    fn schema() -> &'static Schema;

    /// Current value of `field`, or `None` when the field is absent/null.
    fn field_value(&self, field: &FieldDef) -> Option<FieldValue>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operator_table_matches_type_families() {
        assert!(FieldType::String.supports(Operator::Like));
        assert!(!FieldType::String.supports(Operator::Gt));
        assert!(FieldType::Decimal.supports(Operator::Ge));
        assert!(!FieldType::Decimal.supports(Operator::Like));
        assert!(FieldType::Date.supports(Operator::Lt));
        assert!(!FieldType::Boolean.supports(Operator::Gt));
        assert!(!FieldType::Uuid.supports(Operator::Like));
    }

    #[test]
    fn decimal_decodes_from_number_and_string() {
        let from_num = FieldType::Decimal.decode(&json!(5000)).unwrap();
        let from_str = FieldType::Decimal.decode(&json!("5000.00")).unwrap();
        assert_eq!(from_num.compare(&from_str), Some(Ordering::Equal));
        assert_eq!(
            FieldType::Decimal.decode(&json!(10.25)).unwrap(),
            FieldValue::Decimal(Decimal::new(1025, 2))
        );
    }

    #[test]
    fn decode_rejects_wrong_shapes() {
        assert!(FieldType::Boolean.decode(&json!("true")).is_err());
        assert!(FieldType::Date.decode(&json!("2024-13-01")).is_err());
        assert!(FieldType::String.decode(&json!(12)).is_err());
        assert!(FieldType::Uuid.decode(&json!("nope")).is_err());
    }

    #[test]
    fn timestamps_are_normalised_to_utc() {
        let v = FieldType::Timestamp
            .decode(&json!("2024-05-01T12:00:00+02:00"))
            .unwrap();
        let FieldValue::Timestamp(ts) = v else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn compare_is_none_across_variants() {
        assert_eq!(
            FieldValue::from("a").compare(&FieldValue::Boolean(true)),
            None
        );
    }
}
