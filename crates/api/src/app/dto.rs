use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use carshop_auth::{ChangePassword, RegisterUser, User};
use carshop_core::{DomainError, Login};
use carshop_products::{CreateProduct, PriceHistory, Product, ProductState, UpdateProduct};
use carshop_query::{ConditionPayload, PageRequest};

// -------------------------
// Request DTOs
// -------------------------

/// Body of every `.../search` endpoint. Both parts are optional: no
/// conditions means "no client filter", no page means "everything".
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub conditions: Option<Vec<ConditionPayload>>,
    #[serde(default)]
    pub page: Option<PageRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub manufacturer: String,
    pub model: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
}

impl From<CreateProductRequest> for CreateProduct {
    fn from(value: CreateProductRequest) -> Self {
        CreateProduct {
            manufacturer: value.manufacturer,
            model: value.model,
            description: value.description,
            price: value.price,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

impl From<UpdateProductRequest> for UpdateProduct {
    fn from(value: UpdateProductRequest) -> Self {
        UpdateProduct {
            manufacturer: value.manufacturer,
            model: value.model,
            description: value.description,
            price: value.price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub login: String,
    pub mail: String,
    pub password: String,
}

impl TryFrom<RegisterUserRequest> for RegisterUser {
    type Error = DomainError;

    fn try_from(value: RegisterUserRequest) -> Result<Self, Self::Error> {
        Ok(RegisterUser {
            login: Login::parse(value.login)?,
            mail: value.mail,
            password: value.password,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl From<ChangePasswordRequest> for ChangePassword {
    fn from(value: ChangePasswordRequest) -> Self {
        ChangePassword {
            old_password: value.old_password,
            new_password: value.new_password,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub manufacturer: String,
    pub model: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub registration_date: NaiveDate,
    pub deleted: bool,
    pub sold: bool,
    pub state: ProductState,
    pub owner: String,
    pub version: u64,
}

impl From<&Product> for ProductResponse {
    fn from(p: &Product) -> Self {
        let record = p.to_record();
        Self {
            id: record.id.to_string(),
            manufacturer: record.manufacturer,
            model: record.model,
            description: record.description,
            price: record.price,
            registration_date: record.registration_date,
            deleted: record.deleted,
            sold: record.sold,
            state: p.state(),
            owner: record.owner.to_string(),
            version: record.version,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryResponse {
    pub id: String,
    pub product_id: String,
    pub price: Decimal,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

impl From<&PriceHistory> for PriceHistoryResponse {
    fn from(h: &PriceHistory) -> Self {
        Self {
            id: h.id.to_string(),
            product_id: h.product_id.to_string(),
            price: h.price,
            changed_at: h.changed_at,
            changed_by: h.changed_by.to_string(),
        }
    }
}

/// Public view of an account. The password hash never leaves the service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub login: String,
    pub mail: String,
    pub blocked: bool,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            login: u.login.to_string(),
            mail: u.mail.clone(),
            blocked: u.blocked,
            active: u.active,
            registered_at: u.registered_at,
        }
    }
}
