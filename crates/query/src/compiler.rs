//! Conditions → predicate.
//!
//! Compilation is pure: the only input besides the conditions is the target
//! entity's static schema.

use crate::condition::{Condition, ConditionPayload};
use crate::error::QueryError;
use crate::field::Filterable;
use crate::predicate::Predicate;

/// AND together the given conditions for entity type `E`.
///
/// An absent or empty list compiles to [`Predicate::True`] so the query runs
/// unfiltered. A condition bound to a field outside `E`'s schema is rejected.
pub fn compile<E: Filterable>(conditions: Option<&[Condition]>) -> Result<Predicate, QueryError> {
    let schema = E::schema();
    let Some(conditions) = conditions else {
        return Ok(Predicate::True);
    };

    let mut leaves = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let field = condition.field();
        if !field.filterable || !schema.contains(field) {
            return Err(QueryError::UnknownField {
                entity: schema.entity,
                field: field.name.to_string(),
            });
        }
        leaves.push(Predicate::from(condition.clone()));
    }
    Ok(Predicate::all(leaves))
}

/// Parse wire payloads against `E`'s schema and compile them.
///
/// The first rejected payload fails the whole call; nothing partial is returned.
pub fn compile_payloads<E: Filterable>(
    payloads: Option<&[ConditionPayload]>,
) -> Result<Predicate, QueryError> {
    let schema = E::schema();
    let conditions = payloads
        .map(|ps| ps.iter().map(|p| schema.parse(p)).collect::<Result<Vec<_>, _>>())
        .transpose()?;
    compile::<E>(conditions.as_deref())
}
