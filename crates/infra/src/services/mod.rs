//! Application services: the operations the HTTP layer exposes.
//!
//! Every service holds its collaborators behind `Arc<dyn …>` so the same code
//! runs against in-memory and Postgres stores.

pub mod price_history;
pub mod products;
pub mod users;

use thiserror::Error;

use carshop_core::DomainError;
use carshop_query::QueryError;

use crate::store::StoreError;

pub use price_history::PriceHistoryService;
pub use products::{ProductService, SearchScope};
pub use users::UserService;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Client-caused store failures surface as domain errors; the rest stay
/// infrastructure errors.
impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            StoreError::Query(err) => ServiceError::Domain(err.into()),
            other => ServiceError::Store(other),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        ServiceError::Domain(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflicts_become_domain_conflicts() {
        let err: ServiceError = StoreError::Conflict("stale".to_string()).into();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));

        let err: ServiceError = StoreError::Query(QueryError::InvalidPage("x".to_string())).into();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));

        let err: ServiceError = StoreError::Database("down".to_string()).into();
        assert!(matches!(err, ServiceError::Store(_)));
    }
}
