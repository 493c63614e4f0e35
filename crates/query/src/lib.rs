//! Dynamic query-condition engine.
//!
//! Client-supplied filter conditions (field, operator, value) are validated
//! against a static per-entity [`Schema`], compiled into a storage-agnostic
//! [`Predicate`] AST, and evaluated either in memory ([`Predicate::matches`]) or
//! by a backend translator living next to the store.
//!
//! Nothing here performs IO.

pub mod compiler;
pub mod condition;
pub mod error;
pub mod field;
pub mod page;
pub mod predicate;

pub use compiler::{compile, compile_payloads};
pub use condition::{Condition, ConditionPayload, Operator};
pub use error::QueryError;
pub use field::{FieldDef, FieldType, FieldValue, Filterable, Schema};
pub use page::{
    DEFAULT_PAGE_SIZE, Direction, MAX_PAGE_SIZE, Page, PageRequest, SortKey, SortOrder, paginate,
    sort_keys,
};
pub use predicate::Predicate;
