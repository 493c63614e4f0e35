use std::sync::Arc;

use carshop_core::ProductId;
use carshop_observability::{Observer, ServiceEvent};
use carshop_products::price_history::fields;
use carshop_products::{Guards, PriceHistory, Product};
use carshop_query::{ConditionPayload, Page, PageRequest, Predicate, compile_payloads};

use super::ServiceResult;
use super::products::ProductService;
use crate::store::Repository;

/// Read side of the price history log. Records are written by
/// [`ProductService`] only.
pub struct PriceHistoryService {
    history: Arc<dyn Repository<PriceHistory>>,
    products: Arc<ProductService>,
    observer: Arc<dyn Observer>,
}

impl PriceHistoryService {
    pub fn new(
        history: Arc<dyn Repository<PriceHistory>>,
        products: Arc<ProductService>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            history,
            products,
            observer,
        }
    }

    /// Price records of one product matching the client conditions.
    ///
    /// The product must exist; its lifecycle flags do not matter.
    pub async fn search(
        &self,
        product_id: ProductId,
        conditions: Option<&[ConditionPayload]>,
        page: Option<&PageRequest>,
    ) -> ServiceResult<Page<PriceHistory>> {
        let client = compile_payloads::<PriceHistory>(conditions)?;
        let product: Product = self.products.find_entity(product_id, Guards::NONE).await?;

        let predicate =
            Predicate::eq(&fields::PRODUCT_ID, *product.id_typed().as_uuid()).and(client);
        let found = self.history.find_all(&predicate, page).await?;

        self.observer.record(ServiceEvent::Searched {
            entity: "price history",
            total: found.total_elements,
            conditions: conditions.map(<[_]>::len),
        });
        Ok(found)
    }
}
