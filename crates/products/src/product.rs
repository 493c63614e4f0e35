use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use carshop_core::{DomainError, DomainResult, Entity, Login, ProductId};
use carshop_query::{FieldDef, FieldType, FieldValue, Filterable, Schema};

/// Queryable fields of a product listing.
pub mod fields {
    use super::*;

    pub static ID: FieldDef = FieldDef::internal("id", "id", FieldType::Uuid);
    pub static MANUFACTURER: FieldDef =
        FieldDef::filterable("manufacturer", "manufacturer", FieldType::String);
    pub static MODEL: FieldDef = FieldDef::filterable("model", "model", FieldType::String);
    pub static DESCRIPTION: FieldDef =
        FieldDef::filterable("description", "description", FieldType::String);
    pub static PRICE: FieldDef = FieldDef::filterable("price", "price", FieldType::Decimal);
    pub static REGISTRATION_DATE: FieldDef =
        FieldDef::filterable("registrationDate", "registration_date", FieldType::Date);
    pub static DELETED: FieldDef = FieldDef::filterable("deleted", "deleted", FieldType::Boolean);
    pub static SOLD: FieldDef = FieldDef::filterable("sold", "sold", FieldType::Boolean);
    pub static OWNER: FieldDef = FieldDef::internal("owner", "owner_login", FieldType::String);

    pub static SCHEMA: Schema = Schema {
        entity: "product",
        table: "products",
        id: &ID,
        fields: &[
            &ID,
            &MANUFACTURER,
            &MODEL,
            &DESCRIPTION,
            &PRICE,
            &REGISTRATION_DATE,
            &DELETED,
            &SOLD,
            &OWNER,
        ],
    };
}

/// Lifecycle state derived from the `deleted` / `sold` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductState {
    Active,
    Deleted,
    Sold,
}

/// Which lifecycle guards a lookup applies.
///
/// Guards run in a fixed order (deletion, then sold) and the first failing one
/// wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guards {
    pub deletion_check: bool,
    pub sold_check: bool,
}

impl Guards {
    /// Reads bypass both guards.
    pub const NONE: Guards = Guards {
        deletion_check: false,
        sold_check: false,
    };

    /// Mutations require an active listing.
    pub const MUTATION: Guards = Guards {
        deletion_check: true,
        sold_check: true,
    };
}

/// A car listing.
///
/// Listings are never physically removed; deletion flips `deleted` and can be
/// undone until the listing is sold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    manufacturer: String,
    model: String,
    description: Option<String>,
    price: Decimal,
    registration_date: NaiveDate,
    deleted: bool,
    sold: bool,
    owner: Login,
    version: u64,
}

/// Flat persisted shape of a [`Product`], used by stores to rehydrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub manufacturer: String,
    pub model: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub registration_date: NaiveDate,
    pub deleted: bool,
    pub sold: bool,
    pub owner: Login,
    pub version: u64,
}

/// Command: create a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub manufacturer: String,
    pub model: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
}

/// Command: partial edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl Product {
    pub fn create(
        id: ProductId,
        owner: Login,
        cmd: CreateProduct,
        registration_date: NaiveDate,
    ) -> DomainResult<Self> {
        validate_text("manufacturer", &cmd.manufacturer)?;
        validate_text("model", &cmd.model)?;
        validate_price(cmd.price)?;

        Ok(Self {
            id,
            manufacturer: cmd.manufacturer.trim().to_string(),
            model: cmd.model.trim().to_string(),
            description: cmd.description.filter(|d| !d.trim().is_empty()),
            price: cmd.price,
            registration_date,
            deleted: false,
            sold: false,
            owner,
            version: 1,
        })
    }

    pub fn from_record(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            manufacturer: record.manufacturer,
            model: record.model,
            description: record.description,
            price: record.price,
            registration_date: record.registration_date,
            deleted: record.deleted,
            sold: record.sold,
            owner: record.owner,
            version: record.version,
        }
    }

    pub fn to_record(&self) -> ProductRecord {
        ProductRecord {
            id: self.id,
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
            description: self.description.clone(),
            price: self.price,
            registration_date: self.registration_date,
            deleted: self.deleted,
            sold: self.sold,
            owner: self.owner.clone(),
            version: self.version,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn registration_date(&self) -> NaiveDate {
        self.registration_date
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_sold(&self) -> bool {
        self.sold
    }

    pub fn owner(&self) -> &Login {
        &self.owner
    }

    pub fn state(&self) -> ProductState {
        if self.sold {
            ProductState::Sold
        } else if self.deleted {
            ProductState::Deleted
        } else {
            ProductState::Active
        }
    }

    /// Apply lifecycle guards in order: deletion first, then sold.
    pub fn check(&self, guards: Guards) -> DomainResult<()> {
        if guards.deletion_check && self.deleted {
            return Err(DomainError::soft_deletion(format!(
                "Product with id - {} is deleted",
                self.id
            )));
        }
        if guards.sold_check && self.sold {
            return Err(DomainError::selling(format!(
                "Product with id - {} is already sold",
                self.id
            )));
        }
        Ok(())
    }

    /// Edit allowed fields. Returns the new price when it changed, so callers can
    /// record price history.
    pub fn update(&mut self, actor: &Login, patch: UpdateProduct) -> DomainResult<Option<Decimal>> {
        self.check(Guards::MUTATION)?;
        self.ensure_owner(actor)?;

        if let Some(m) = &patch.manufacturer {
            validate_text("manufacturer", m)?;
        }
        if let Some(m) = &patch.model {
            validate_text("model", m)?;
        }
        if let Some(p) = patch.price {
            validate_price(p)?;
        }

        if let Some(m) = patch.manufacturer {
            self.manufacturer = m.trim().to_string();
        }
        if let Some(m) = patch.model {
            self.model = m.trim().to_string();
        }
        if let Some(d) = patch.description {
            self.description = Some(d).filter(|d| !d.trim().is_empty());
        }
        let price_change = match patch.price {
            Some(p) if p != self.price => {
                self.price = p;
                Some(p)
            }
            _ => None,
        };

        self.version += 1;
        Ok(price_change)
    }

    pub fn delete(&mut self, actor: &Login) -> DomainResult<()> {
        self.check(Guards::MUTATION)?;
        self.ensure_owner(actor)?;
        self.deleted = true;
        self.version += 1;
        Ok(())
    }

    pub fn restore(&mut self, actor: &Login) -> DomainResult<()> {
        if !self.deleted {
            return Err(DomainError::soft_deletion(format!(
                "Product with id - {} is not deleted",
                self.id
            )));
        }
        self.ensure_owner(actor)?;
        self.deleted = false;
        self.version += 1;
        Ok(())
    }

    pub fn sell(&mut self, actor: &Login) -> DomainResult<()> {
        self.check(Guards::MUTATION)?;
        self.ensure_owner(actor)?;
        self.sold = true;
        self.version += 1;
        Ok(())
    }

    fn ensure_owner(&self, actor: &Login) -> DomainResult<()> {
        if &self.owner != actor {
            return Err(DomainError::unauthorized(format!(
                "user {actor} does not own product with id - {}",
                self.id
            )));
        }
        Ok(())
    }
}

fn validate_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> DomainResult<()> {
    if price <= Decimal::ZERO {
        return Err(DomainError::validation("price must be greater than 0"));
    }
    Ok(())
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Filterable for Product {
    fn schema() -> &'static Schema {
        &fields::SCHEMA
    }

    fn field_value(&self, field: &FieldDef) -> Option<FieldValue> {
        match field.name {
            "id" => Some((*self.id.as_uuid()).into()),
            "manufacturer" => Some(self.manufacturer.clone().into()),
            "model" => Some(self.model.clone().into()),
            "description" => self.description.clone().map(Into::into),
            "price" => Some(self.price.into()),
            "registrationDate" => Some(self.registration_date.into()),
            "deleted" => Some(self.deleted.into()),
            "sold" => Some(self.sold.into()),
            "owner" => Some(self.owner.as_str().into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Login {
        Login::parse("seller").unwrap()
    }

    fn stranger() -> Login {
        Login::parse("stranger").unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn listing(price: i64) -> Product {
        Product::create(
            ProductId::new(),
            owner(),
            CreateProduct {
                manufacturer: "Toyota".to_string(),
                model: "Corolla".to_string(),
                description: None,
                price: Decimal::from(price),
            },
            today(),
        )
        .unwrap()
    }

    #[test]
    fn create_starts_active_at_version_one() {
        let p = listing(10_000);
        assert_eq!(p.state(), ProductState::Active);
        assert!(!p.is_deleted());
        assert!(!p.is_sold());
        assert_eq!(p.version(), 1);
        assert_eq!(p.registration_date(), today());
    }

    #[test]
    fn create_rejects_blank_text_and_non_positive_price() {
        let cmd = CreateProduct {
            manufacturer: "  ".to_string(),
            model: "X".to_string(),
            description: None,
            price: Decimal::ONE,
        };
        let err = Product::create(ProductId::new(), owner(), cmd, today()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let cmd = CreateProduct {
            manufacturer: "Audi".to_string(),
            model: "A4".to_string(),
            description: None,
            price: Decimal::ZERO,
        };
        let err = Product::create(ProductId::new(), owner(), cmd, today()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_reports_price_changes_only() {
        let mut p = listing(10_000);
        let changed = p
            .update(
                &owner(),
                UpdateProduct {
                    model: Some("Yaris".to_string()),
                    price: Some(Decimal::from(10_000)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(changed, None);
        assert_eq!(p.model(), "Yaris");

        let changed = p
            .update(
                &owner(),
                UpdateProduct {
                    price: Some(Decimal::from(9_500)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(changed, Some(Decimal::from(9_500)));
        assert_eq!(p.version(), 3);
    }

    #[test]
    fn invalid_patch_leaves_listing_untouched() {
        let mut p = listing(10_000);
        let before = p.clone();
        let err = p
            .update(
                &owner(),
                UpdateProduct {
                    model: Some("Yaris".to_string()),
                    price: Some(Decimal::from(-1)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(p, before);
    }

    #[test]
    fn sold_listing_rejects_update_and_delete_with_selling_error() {
        let mut p = listing(10_000);
        p.sell(&owner()).unwrap();
        assert_eq!(p.state(), ProductState::Sold);

        let err = p
            .update(
                &owner(),
                UpdateProduct {
                    price: Some(Decimal::from(1)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Selling(_)));

        let err = p.delete(&owner()).unwrap_err();
        assert!(matches!(err, DomainError::Selling(_)));
        assert!(!p.is_deleted());
    }

    #[test]
    fn delete_restore_cycle() {
        let mut p = listing(10_000);
        p.delete(&owner()).unwrap();
        assert_eq!(p.state(), ProductState::Deleted);

        let err = p.delete(&owner()).unwrap_err();
        assert!(matches!(err, DomainError::SoftDeletion(_)));
        let err = p.sell(&owner()).unwrap_err();
        assert!(matches!(err, DomainError::SoftDeletion(_)));

        p.restore(&owner()).unwrap();
        assert_eq!(p.state(), ProductState::Active);
        let err = p.restore(&owner()).unwrap_err();
        assert!(matches!(err, DomainError::SoftDeletion(msg) if msg.contains("not deleted")));
    }

    #[test]
    fn only_owner_mutates_after_guards_pass() {
        let mut p = listing(10_000);
        let err = p.sell(&stranger()).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        // Guard errors still win over ownership.
        p.delete(&owner()).unwrap();
        let err = p.delete(&stranger()).unwrap_err();
        assert!(matches!(err, DomainError::SoftDeletion(_)));
    }

    #[test]
    fn read_guards_bypass_flags() {
        let mut p = listing(10_000);
        p.delete(&owner()).unwrap();
        assert!(p.check(Guards::NONE).is_ok());
        assert!(p.check(Guards::MUTATION).is_err());
    }

    #[test]
    fn record_round_trips_through_storage_shape() {
        let mut p = listing(12_345);
        p.sell(&owner()).unwrap();
        assert_eq!(Product::from_record(p.to_record()), p);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Update,
            Delete,
            Restore,
            Sell,
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Update),
                Just(Op::Delete),
                Just(Op::Restore),
                Just(Op::Sell),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: every operation either succeeds and bumps the version, or
            /// fails with the error the guard table prescribes and changes nothing.
            #[test]
            fn transitions_follow_guard_table(ops in prop::collection::vec(arb_op(), 1..30)) {
                let mut p = listing(10_000);
                for op in ops {
                    let before = p.clone();
                    let result = match op {
                        Op::Update => p.update(&owner(), UpdateProduct {
                            description: Some("x".to_string()),
                            ..Default::default()
                        }).map(|_| ()),
                        Op::Delete => p.delete(&owner()),
                        Op::Restore => p.restore(&owner()),
                        Op::Sell => p.sell(&owner()),
                    };

                    match (op, result) {
                        (_, Ok(())) => prop_assert_eq!(p.version(), before.version() + 1),
                        (Op::Restore, Err(DomainError::SoftDeletion(_))) => {
                            prop_assert!(!before.is_deleted());
                            prop_assert_eq!(&p, &before);
                        }
                        (_, Err(DomainError::SoftDeletion(_))) => {
                            prop_assert!(before.is_deleted());
                            prop_assert_eq!(&p, &before);
                        }
                        (_, Err(DomainError::Selling(_))) => {
                            prop_assert!(before.is_sold() && !before.is_deleted());
                            prop_assert_eq!(&p, &before);
                        }
                        (op, Err(e)) => prop_assert!(false, "unexpected {e:?} for {op:?}"),
                    }
                    prop_assert!(!(p.is_deleted() && p.is_sold()));
                }
            }
        }
    }
}
