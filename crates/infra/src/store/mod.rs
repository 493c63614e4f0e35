//! Storage boundary.
//!
//! Services see storage only through [`Repository`], [`ProductRepository`] and
//! [`UserRepository`]:
//! "given a predicate and a page request, return a page of entities" plus
//! id lookups and version-checked writes. Two backends exist: in-memory (tests,
//! dev) and Postgres.

pub mod in_memory;
pub mod postgres;
pub mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use carshop_auth::User;
use carshop_core::{Entity, ExpectedVersion, Login};
use carshop_products::{PriceHistory, Product};
use carshop_query::{Filterable, Page, PageRequest, Predicate, QueryError};

pub use in_memory::{InMemoryProductRepository, InMemoryRepository, InMemoryUserRepository};
pub use postgres::{PgPriceHistoryRepository, PgProductRepository, PgUserRepository};

/// Storage operation error.
///
/// These are infrastructure failures, as opposed to domain errors. `Conflict`
/// and `Query` are the only variants a client can cause.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Version mismatch or uniqueness violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The page request named a field the schema does not have.
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be turned back into an entity.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Paged, predicate-filtered access to one entity type.
#[async_trait]
pub trait Repository<E>: Send + Sync
where
    E: Entity + Filterable + Send + Sync + 'static,
    E::Id: Send + Sync,
{
    async fn find_by_id(&self, id: &E::Id) -> StoreResult<Option<E>>;

    /// Fetch the entities matching `predicate`, ordered and sliced by `page`.
    /// `page == None` returns the whole result set.
    async fn find_all(&self, predicate: &Predicate, page: Option<&PageRequest>)
    -> StoreResult<Page<E>>;

    /// Insert or replace `entity` if the stored revision satisfies `expected`.
    async fn save(&self, entity: E, expected: ExpectedVersion) -> StoreResult<E>;
}

#[async_trait]
impl<E, R> Repository<E> for Arc<R>
where
    E: Entity + Filterable + Send + Sync + 'static,
    E::Id: Send + Sync,
    R: Repository<E> + ?Sized,
{
    async fn find_by_id(&self, id: &E::Id) -> StoreResult<Option<E>> {
        (**self).find_by_id(id).await
    }

    async fn find_all(
        &self,
        predicate: &Predicate,
        page: Option<&PageRequest>,
    ) -> StoreResult<Page<E>> {
        (**self).find_all(predicate, page).await
    }

    async fn save(&self, entity: E, expected: ExpectedVersion) -> StoreResult<E> {
        (**self).save(entity, expected).await
    }
}

/// Listing storage. A price-changing write carries its history record and
/// either both are stored or neither is.
#[async_trait]
pub trait ProductRepository: Repository<Product> {
    async fn save_with_price(
        &self,
        product: Product,
        expected: ExpectedVersion,
        record: PriceHistory,
    ) -> StoreResult<Product>;
}

/// Account storage. Login and mail are both unique keys.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_login(&self, login: &Login) -> StoreResult<Option<User>>;

    async fn find_by_mail(&self, mail: &str) -> StoreResult<Option<User>>;

    /// Version-checked write; a mail already used by another login is a
    /// `Conflict`.
    async fn save(&self, user: User, expected: ExpectedVersion) -> StoreResult<User>;
}

#[async_trait]
impl<R> UserRepository for Arc<R>
where
    R: UserRepository + ?Sized,
{
    async fn find_by_login(&self, login: &Login) -> StoreResult<Option<User>> {
        (**self).find_by_login(login).await
    }

    async fn find_by_mail(&self, mail: &str) -> StoreResult<Option<User>> {
        (**self).find_by_mail(mail).await
    }

    async fn save(&self, user: User, expected: ExpectedVersion) -> StoreResult<User> {
        (**self).save(user, expected).await
    }
}
