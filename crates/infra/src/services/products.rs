//! Listing search and lifecycle orchestration.

use std::sync::Arc;

use chrono::Utc;

use carshop_core::{DomainError, DomainResult, Entity, ExpectedVersion, Login, ProductId};
use carshop_observability::{Observer, ServiceEvent};
use carshop_products::product::fields;
use carshop_products::{CreateProduct, Guards, PriceHistory, Product, UpdateProduct};
use carshop_query::{ConditionPayload, Page, PageRequest, Predicate, compile_payloads};

use super::ServiceResult;
use crate::store::{ProductRepository, Repository, UserRepository};

/// Structural visibility rules a search runs under. Chosen by the caller
/// context, never by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    /// Everything currently for sale.
    Catalogue,
    /// The owner's listings that are not deleted (sold ones included).
    OwnerListings(Login),
    /// Every listing of the owner, deleted ones included.
    OwnerArchive(Login),
}

impl SearchScope {
    pub fn predicate(&self) -> Predicate {
        match self {
            SearchScope::Catalogue => Predicate::all([
                Predicate::eq(&fields::DELETED, false),
                Predicate::eq(&fields::SOLD, false),
            ]),
            SearchScope::OwnerListings(login) => Predicate::all([
                Predicate::eq(&fields::OWNER, login.as_str()),
                Predicate::eq(&fields::DELETED, false),
            ]),
            SearchScope::OwnerArchive(login) => Predicate::eq(&fields::OWNER, login.as_str()),
        }
    }
}

pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
    observer: Arc<dyn Observer>,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            products,
            users,
            observer,
        }
    }

    /// Client conditions AND-ed with the scope's structural constraints.
    pub async fn search(
        &self,
        scope: &SearchScope,
        conditions: Option<&[ConditionPayload]>,
        page: Option<&PageRequest>,
    ) -> ServiceResult<Page<Product>> {
        let client = compile_payloads::<Product>(conditions)?;
        let predicate = scope.predicate().and(client);
        let found = self.products.find_all(&predicate, page).await?;

        self.observer.record(ServiceEvent::Searched {
            entity: "product",
            total: found.total_elements,
            conditions: conditions.map(<[_]>::len),
        });
        Ok(found)
    }

    /// Reads ignore the lifecycle flags: deleted and sold listings stay
    /// addressable by id.
    pub async fn find_by_id(&self, id: ProductId) -> ServiceResult<Product> {
        self.find_entity(id, Guards::NONE).await
    }

    /// Look up a listing and apply `guards` (existence first, then deletion,
    /// then sold).
    pub async fn find_entity(&self, id: ProductId, guards: Guards) -> ServiceResult<Product> {
        let product = self
            .products
            .find_by_id(&id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Product with id - {id} not found")))?;
        product.check(guards)?;
        Ok(product)
    }

    pub async fn create(&self, actor: &Login, cmd: CreateProduct) -> ServiceResult<Product> {
        let user = self
            .users
            .find_by_login(actor)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User with login - {actor} not found")))?;
        user.ensure_can_transact()?;

        let now = Utc::now();
        let product = Product::create(ProductId::new(), actor.clone(), cmd, now.date_naive())?;
        let record = PriceHistory::record(product.id_typed(), product.price(), actor.clone(), now);
        let product = self
            .products
            .save_with_price(product, ExpectedVersion::New, record.clone())
            .await?;
        self.transitioned(&product, "create", actor);
        self.price_recorded(&record);
        Ok(product)
    }

    /// A changed price is stored together with its history record.
    pub async fn update(
        &self,
        id: ProductId,
        actor: &Login,
        patch: UpdateProduct,
    ) -> ServiceResult<Product> {
        let mut product = self.find_entity(id, Guards::NONE).await?;
        let expected = ExpectedVersion::Exact(product.version());
        let price_change = product.update(actor, patch)?;
        let product = match price_change {
            Some(price) => {
                let record = PriceHistory::record(id, price, actor.clone(), Utc::now());
                let product = self
                    .products
                    .save_with_price(product, expected, record.clone())
                    .await?;
                self.price_recorded(&record);
                product
            }
            None => self.products.save(product, expected).await?,
        };
        self.transitioned(&product, "update", actor);
        Ok(product)
    }

    pub async fn delete(&self, id: ProductId, actor: &Login) -> ServiceResult<Product> {
        self.mutate(id, actor, "delete", |p| p.delete(actor)).await
    }

    pub async fn restore(&self, id: ProductId, actor: &Login) -> ServiceResult<Product> {
        self.mutate(id, actor, "restore", |p| p.restore(actor)).await
    }

    pub async fn sell(&self, id: ProductId, actor: &Login) -> ServiceResult<Product> {
        self.mutate(id, actor, "sell", |p| p.sell(actor)).await
    }

    /// Read, run the domain transition, then write back only if nobody else
    /// wrote in between.
    async fn mutate(
        &self,
        id: ProductId,
        actor: &Login,
        action: &'static str,
        transition: impl FnOnce(&mut Product) -> DomainResult<()>,
    ) -> ServiceResult<Product> {
        let mut product = self.find_entity(id, Guards::NONE).await?;
        let expected = ExpectedVersion::Exact(product.version());
        transition(&mut product)?;
        let product = self.products.save(product, expected).await?;
        self.transitioned(&product, action, actor);
        Ok(product)
    }

    fn price_recorded(&self, record: &PriceHistory) {
        self.observer.record(ServiceEvent::PriceRecorded {
            product_id: record.product_id.to_string(),
            price: record.price.to_string(),
            actor: record.changed_by.to_string(),
        });
    }

    fn transitioned(&self, product: &Product, action: &'static str, actor: &Login) {
        self.observer.record(ServiceEvent::Transitioned {
            entity: "product",
            id: product.id_typed().to_string(),
            action,
            actor: actor.to_string(),
        });
    }
}
