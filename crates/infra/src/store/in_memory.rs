use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use carshop_auth::User;
use carshop_core::{Entity, ExpectedVersion, Login, ProductId};
use carshop_products::{PriceHistory, Product};
use carshop_query::{Filterable, Page, PageRequest, Predicate, paginate};

use super::{ProductRepository, Repository, StoreError, StoreResult, UserRepository};

/// In-memory repository for tests/dev.
///
/// Filtering uses [`Predicate::matches`], which is the reference semantics the
/// SQL backend is tested against.
#[derive(Debug)]
pub struct InMemoryRepository<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Database("in-memory store lock poisoned".to_string())
}

fn put<E: Entity + Clone>(
    map: &mut HashMap<E::Id, E>,
    entity: E,
    expected: ExpectedVersion,
) -> StoreResult<E> {
    let stored = map.get(entity.id()).map(Entity::version);
    if !expected.matches(stored) {
        return Err(StoreError::Conflict(format!(
            "{:?} expected {expected:?}, found {stored:?}",
            entity.id()
        )));
    }
    map.insert(entity.id().clone(), entity.clone());
    Ok(entity)
}

#[async_trait]
impl<E> Repository<E> for InMemoryRepository<E>
where
    E: Entity + Filterable + Clone + Send + Sync + 'static,
    E::Id: Hash + Send + Sync,
{
    async fn find_by_id(&self, id: &E::Id) -> StoreResult<Option<E>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned())
    }

    async fn find_all(
        &self,
        predicate: &Predicate,
        page: Option<&PageRequest>,
    ) -> StoreResult<Page<E>> {
        let matching: Vec<E> = {
            let map = self.inner.read().map_err(|_| poisoned())?;
            map.values().filter(|e| predicate.matches(*e)).cloned().collect()
        };
        Ok(paginate(matching, page)?)
    }

    async fn save(&self, entity: E, expected: ExpectedVersion) -> StoreResult<E> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        put(&mut *map, entity, expected)
    }
}

/// In-memory listing store that appends price history into a shared
/// [`InMemoryRepository<PriceHistory>`] under the same write.
#[derive(Debug)]
pub struct InMemoryProductRepository {
    products: InMemoryRepository<Product>,
    history: Arc<InMemoryRepository<PriceHistory>>,
}

impl InMemoryProductRepository {
    pub fn new(history: Arc<InMemoryRepository<PriceHistory>>) -> Self {
        Self {
            products: InMemoryRepository::new(),
            history,
        }
    }
}

#[async_trait]
impl Repository<Product> for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        self.products.find_by_id(id).await
    }

    async fn find_all(
        &self,
        predicate: &Predicate,
        page: Option<&PageRequest>,
    ) -> StoreResult<Page<Product>> {
        self.products.find_all(predicate, page).await
    }

    async fn save(&self, product: Product, expected: ExpectedVersion) -> StoreResult<Product> {
        self.products.save(product, expected).await
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn save_with_price(
        &self,
        product: Product,
        expected: ExpectedVersion,
        record: PriceHistory,
    ) -> StoreResult<Product> {
        // Lock order: products, then history.
        let mut products = self.products.inner.write().map_err(|_| poisoned())?;
        let mut history = self.history.inner.write().map_err(|_| poisoned())?;

        let stored = products.get(product.id()).map(Entity::version);
        if !expected.matches(stored) {
            return Err(StoreError::Conflict(format!(
                "product {} expected {expected:?}, found {stored:?}",
                product.id()
            )));
        }
        put(&mut *history, record, ExpectedVersion::New)?;
        put(&mut *products, product, expected)
    }
}

/// In-memory account store.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<HashMap<Login, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_login(&self, login: &Login) -> StoreResult<Option<User>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(login).cloned())
    }

    async fn find_by_mail(&self, mail: &str) -> StoreResult<Option<User>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|u| u.mail == mail).cloned())
    }

    async fn save(&self, user: User, expected: ExpectedVersion) -> StoreResult<User> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let stored = map.get(&user.login).map(|u| u.version);
        if !expected.matches(stored) {
            return Err(StoreError::Conflict(format!(
                "user {} expected {expected:?}, found {stored:?}",
                user.login
            )));
        }
        if map
            .values()
            .any(|u| u.mail == user.mail && u.login != user.login)
        {
            return Err(StoreError::Conflict(format!("mail {} is already taken", user.mail)));
        }
        map.insert(user.login.clone(), user.clone());
        Ok(user)
    }
}
