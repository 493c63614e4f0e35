//! Client filter terms: `{ field, operation, value }`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::QueryError;
use crate::field::{FieldDef, FieldValue, Schema};

/// Comparison operator.
///
/// The symbolic spellings are canonical; the upper-case names are accepted as
/// aliases for older clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=", alias = "EQUALS")]
    Eq,
    #[serde(rename = "!=", alias = "NOT_EQUALS")]
    Ne,
    #[serde(rename = ">", alias = "GREATER_THAN")]
    Gt,
    #[serde(rename = ">=", alias = "GREATER_THAN_OR_EQUAL")]
    Ge,
    #[serde(rename = "<", alias = "LESS_THAN")]
    Lt,
    #[serde(rename = "<=", alias = "LESS_THAN_OR_EQUAL")]
    Le,
    #[serde(rename = "LIKE", alias = "like")]
    Like,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Like => "LIKE",
        }
    }
}

impl core::fmt::Display for Operator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Raw condition as received on the wire. The value is decoded only after the
/// field has been resolved against a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionPayload {
    pub field: String,
    pub operation: Operator,
    pub value: JsonValue,
}

impl ConditionPayload {
    pub fn new(field: impl Into<String>, operation: Operator, value: JsonValue) -> Self {
        Self {
            field: field.into(),
            operation,
            value,
        }
    }
}

/// A validated filter term bound to a schema field.
///
/// Construction guarantees the value variant matches the field's declared type
/// and that the operator is valid for that type.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: &'static FieldDef,
    operator: Operator,
    value: FieldValue,
}

impl Condition {
    pub fn new(
        field: &'static FieldDef,
        operator: Operator,
        value: FieldValue,
    ) -> Result<Self, QueryError> {
        if value.field_type() != field.ty {
            return Err(QueryError::InvalidValue {
                field: field.name,
                expected: field.ty,
                reason: format!("got a {} value", value.field_type()),
            });
        }
        if !field.ty.supports(operator) {
            return Err(QueryError::OperatorNotSupported {
                field: field.name,
                operator,
                ty: field.ty,
            });
        }
        Ok(Self {
            field,
            operator,
            value,
        })
    }

    pub fn field(&self) -> &'static FieldDef {
        self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

impl Schema {
    /// Build a condition on a client-visible field of this schema.
    pub fn condition(
        &self,
        field: &str,
        operator: Operator,
        value: impl Into<FieldValue>,
    ) -> Result<Condition, QueryError> {
        let def = self.filterable(field)?;
        Condition::new(def, operator, value.into())
    }

    /// Validate a wire payload: resolve the field, decode the value in the
    /// field's shape, then check the operator.
    pub fn parse(&self, payload: &ConditionPayload) -> Result<Condition, QueryError> {
        let def = self.filterable(&payload.field)?;
        let value = def
            .ty
            .decode(&payload.value)
            .map_err(|reason| QueryError::InvalidValue {
                field: def.name,
                expected: def.ty,
                reason,
            })?;
        Condition::new(def, payload.operation, value)
    }
}
