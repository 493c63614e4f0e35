use thiserror::Error;

use carshop_core::DomainError;

use crate::condition::Operator;
use crate::field::FieldType;

/// Rejected query input. Always a client error; never reaches storage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown field `{field}` for {entity}")]
    UnknownField { entity: &'static str, field: String },

    #[error("operator `{operator}` is not supported for field `{field}` of type {ty}")]
    OperatorNotSupported {
        field: &'static str,
        operator: Operator,
        ty: FieldType,
    },

    #[error("invalid value for field `{field}` (expected {expected}): {reason}")]
    InvalidValue {
        field: &'static str,
        expected: FieldType,
        reason: String,
    },

    #[error("invalid page request: {0}")]
    InvalidPage(String),
}

impl From<QueryError> for DomainError {
    fn from(value: QueryError) -> Self {
        DomainError::validation(value.to_string())
    }
}
