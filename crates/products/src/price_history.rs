//! Append-only price history of a listing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use carshop_core::{Entity, Login, PriceHistoryId, ProductId};
use carshop_query::{FieldDef, FieldType, FieldValue, Filterable, Schema};

pub mod fields {
    use super::*;

    pub static ID: FieldDef = FieldDef::internal("id", "id", FieldType::Uuid);
    pub static PRODUCT_ID: FieldDef =
        FieldDef::internal("productId", "product_id", FieldType::Uuid);
    pub static PRICE: FieldDef = FieldDef::filterable("price", "price", FieldType::Decimal);
    pub static CHANGED_AT: FieldDef =
        FieldDef::filterable("changedAt", "changed_at", FieldType::Timestamp);
    pub static CHANGED_BY: FieldDef =
        FieldDef::internal("changedBy", "changed_by", FieldType::String);

    pub static SCHEMA: Schema = Schema {
        entity: "price history",
        table: "price_history",
        id: &ID,
        fields: &[&ID, &PRODUCT_ID, &PRICE, &CHANGED_AT, &CHANGED_BY],
    };
}

/// One recorded price of a product, with who set it and when.
///
/// Records are created once per price-changing action and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub id: PriceHistoryId,
    pub product_id: ProductId,
    pub price: Decimal,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Login,
}

impl PriceHistory {
    pub fn record(
        product_id: ProductId,
        price: Decimal,
        changed_by: Login,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PriceHistoryId::new(),
            product_id,
            price,
            changed_at,
            changed_by,
        }
    }
}

impl Entity for PriceHistory {
    type Id = PriceHistoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        1
    }
}

impl Filterable for PriceHistory {
    fn schema() -> &'static Schema {
        &fields::SCHEMA
    }

    fn field_value(&self, field: &FieldDef) -> Option<FieldValue> {
        match field.name {
            "id" => Some((*self.id.as_uuid()).into()),
            "productId" => Some((*self.product_id.as_uuid()).into()),
            "price" => Some(self.price.into()),
            "changedAt" => Some(self.changed_at.into()),
            "changedBy" => Some(self.changed_by.as_str().into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carshop_query::{Operator, Predicate};

    #[test]
    fn product_scope_and_client_conditions_combine() {
        let product = ProductId::new();
        let other = ProductId::new();
        let by = Login::parse("seller").unwrap();
        let rec = PriceHistory::record(product, Decimal::from(900), by.clone(), Utc::now());
        let foreign = PriceHistory::record(other, Decimal::from(900), by, Utc::now());

        let cond = fields::SCHEMA
            .condition("price", Operator::Lt, Decimal::from(1000))
            .unwrap();
        let pred = Predicate::eq(&fields::PRODUCT_ID, *product.as_uuid()).and(cond.into());

        assert!(pred.matches(&rec));
        assert!(!pred.matches(&foreign));
    }

    #[test]
    fn product_id_is_not_client_filterable() {
        assert!(fields::SCHEMA.filterable("productId").is_err());
        assert!(fields::SCHEMA.filterable("changedBy").is_err());
        assert!(fields::SCHEMA.filterable("changedAt").is_ok());
    }
}
