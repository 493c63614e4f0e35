//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / Other | N/A | `Database` |
//!
//! Version-checked writes are single statements (`UPDATE … WHERE version = $n`),
//! so two writers racing on the same row cannot both succeed. A price-changing
//! listing write and its history row share one transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use carshop_auth::User;
use carshop_core::{Entity, ExpectedVersion, Login, PriceHistoryId, ProductId};
use carshop_products::{PriceHistory, Product, ProductRecord};
use carshop_query::{Filterable, Page, PageRequest, Predicate, sort_keys};

use super::sql;
use super::{ProductRepository, Repository, StoreError, StoreResult, UserRepository};

const PRODUCT_COLUMNS: &str = "id, manufacturer, model, description, price, registration_date, \
                               deleted, sold, owner_login, version";
const PRICE_HISTORY_COLUMNS: &str = "id, product_id, price, changed_at, changed_by";
const USER_COLUMNS: &str = "login, mail, password_hash, blocked, active, registered_at, version";

/// Shared paged fetch: one `COUNT(*)` plus one ordered, sliced `SELECT`, both
/// inside a single read-only snapshot so the total always describes the same
/// rows as the content.
async fn fetch_page<E, F>(
    pool: &PgPool,
    columns: &str,
    predicate: &Predicate,
    page: Option<&PageRequest>,
    decode: F,
) -> StoreResult<Page<E>>
where
    E: Filterable,
    F: Fn(&PgRow) -> StoreResult<E>,
{
    let schema = E::schema();
    let keys = sort_keys(schema, page)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| map_sqlx_error("begin_page", e))?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("begin_page", e))?;

    let total: i64 = sql::count(schema, predicate)
        .build()
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("count", e))?
        .try_get(0)
        .map_err(|e| StoreError::Corrupt(format!("failed to read count: {e}")))?;

    let rows = sql::select_page(schema, columns, predicate, &keys, page)
        .build()
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("select_page", e))?;

    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_page", e))?;

    let content = rows.iter().map(decode).collect::<StoreResult<Vec<_>>>()?;
    Span::current().record("total", total);
    Ok(Page::new(content, u64::try_from(total).unwrap_or(0), page))
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: Arc<PgPool>,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn decode_product(row: &PgRow) -> StoreResult<Product> {
    let corrupt = |e: sqlx::Error| StoreError::Corrupt(format!("product row: {e}"));
    let owner: String = row.try_get("owner_login").map_err(corrupt)?;
    let version: i64 = row.try_get("version").map_err(corrupt)?;
    Ok(Product::from_record(ProductRecord {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id").map_err(corrupt)?),
        manufacturer: row.try_get("manufacturer").map_err(corrupt)?,
        model: row.try_get("model").map_err(corrupt)?,
        description: row.try_get("description").map_err(corrupt)?,
        price: row.try_get::<Decimal, _>("price").map_err(corrupt)?,
        registration_date: row.try_get::<NaiveDate, _>("registration_date").map_err(corrupt)?,
        deleted: row.try_get("deleted").map_err(corrupt)?,
        sold: row.try_get("sold").map_err(corrupt)?,
        owner: Login::parse(owner).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        version: u64::try_from(version).map_err(|e| StoreError::Corrupt(e.to_string()))?,
    }))
}

fn version_param(v: u64) -> StoreResult<i64> {
    i64::try_from(v).map_err(|_| StoreError::Database(format!("version {v} out of range")))
}

#[async_trait]
impl Repository<Product> for PgProductRepository {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, manufacturer, model, description, price, registration_date,
                   deleted, sold, owner_login, version
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_product", e))?;

        row.as_ref().map(decode_product).transpose()
    }

    #[instrument(skip(self, predicate, page), fields(total), err)]
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: Option<&PageRequest>,
    ) -> StoreResult<Page<Product>> {
        fetch_page(&self.pool, PRODUCT_COLUMNS, predicate, page, decode_product).await
    }

    #[instrument(
        skip(self, product),
        fields(product_id = %product.id(), expected = ?expected),
        err
    )]
    async fn save(&self, product: Product, expected: ExpectedVersion) -> StoreResult<Product> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("save_product", e))?;
        write_product(&mut conn, &product, expected).await?;
        Ok(product)
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(
        skip(self, product, record),
        fields(product_id = %product.id(), expected = ?expected, price_history_id = %record.id),
        err
    )]
    async fn save_with_price(
        &self,
        product: Product,
        expected: ExpectedVersion,
        record: PriceHistory,
    ) -> StoreResult<Product> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_save_product", e))?;
        write_product(&mut tx, &product, expected).await?;
        insert_price_history(&mut tx, &record).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_save_product", e))?;
        Ok(product)
    }
}

/// Insert (`New`) or version-checked update (`Exact`) of one listing row.
async fn write_product(
    conn: &mut PgConnection,
    product: &Product,
    expected: ExpectedVersion,
) -> StoreResult<()> {
    let r = product.to_record();
    let version = version_param(r.version)?;

    let result = match expected {
        ExpectedVersion::New => {
            let statement = format!(
                "INSERT INTO products ({PRODUCT_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
            );
            sqlx::query(&statement)
                .bind(r.id.as_uuid())
                .bind(&r.manufacturer)
                .bind(&r.model)
                .bind(&r.description)
                .bind(r.price)
                .bind(r.registration_date)
                .bind(r.deleted)
                .bind(r.sold)
                .bind(r.owner.as_str())
                .bind(version)
                .execute(&mut *conn)
                .await
        }
        ExpectedVersion::Exact(current) => {
            sqlx::query(
                r#"
                UPDATE products SET
                    manufacturer = $2,
                    model = $3,
                    description = $4,
                    price = $5,
                    registration_date = $6,
                    deleted = $7,
                    sold = $8,
                    owner_login = $9,
                    version = $10
                WHERE id = $1 AND version = $11
                "#,
            )
            .bind(r.id.as_uuid())
            .bind(&r.manufacturer)
            .bind(&r.model)
            .bind(&r.description)
            .bind(r.price)
            .bind(r.registration_date)
            .bind(r.deleted)
            .bind(r.sold)
            .bind(r.owner.as_str())
            .bind(version)
            .bind(version_param(current)?)
            .execute(&mut *conn)
            .await
        }
    }
    .map_err(|e| map_sqlx_error("save_product", e))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict(format!(
            "product {} expected {expected:?}",
            r.id
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Price history
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PgPriceHistoryRepository {
    pool: Arc<PgPool>,
}

impl PgPriceHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn decode_price_history(row: &PgRow) -> StoreResult<PriceHistory> {
    let corrupt = |e: sqlx::Error| StoreError::Corrupt(format!("price history row: {e}"));
    let changed_by: String = row.try_get("changed_by").map_err(corrupt)?;
    Ok(PriceHistory {
        id: PriceHistoryId::from_uuid(row.try_get::<Uuid, _>("id").map_err(corrupt)?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id").map_err(corrupt)?),
        price: row.try_get("price").map_err(corrupt)?,
        changed_at: row.try_get::<DateTime<Utc>, _>("changed_at").map_err(corrupt)?,
        changed_by: Login::parse(changed_by).map_err(|e| StoreError::Corrupt(e.to_string()))?,
    })
}

#[async_trait]
impl Repository<PriceHistory> for PgPriceHistoryRepository {
    #[instrument(skip(self), fields(price_history_id = %id), err)]
    async fn find_by_id(&self, id: &PriceHistoryId) -> StoreResult<Option<PriceHistory>> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, price, changed_at, changed_by
            FROM price_history
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_price_history", e))?;

        row.as_ref().map(decode_price_history).transpose()
    }

    #[instrument(skip(self, predicate, page), fields(total), err)]
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: Option<&PageRequest>,
    ) -> StoreResult<Page<PriceHistory>> {
        fetch_page(
            &self.pool,
            PRICE_HISTORY_COLUMNS,
            predicate,
            page,
            decode_price_history,
        )
        .await
    }

    /// Records are append-only: only `New` is accepted and an existing id is
    /// never overwritten.
    #[instrument(skip(self, record), fields(price_history_id = %record.id), err)]
    async fn save(&self, record: PriceHistory, expected: ExpectedVersion) -> StoreResult<PriceHistory> {
        if let ExpectedVersion::Exact(_) = expected {
            return Err(StoreError::Conflict(format!(
                "price history {} is immutable",
                record.id
            )));
        }
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("insert_price_history", e))?;
        insert_price_history(&mut conn, &record).await?;
        Ok(record)
    }
}

async fn insert_price_history(conn: &mut PgConnection, record: &PriceHistory) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO price_history (id, product_id, price, changed_at, changed_by)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(record.id.as_uuid())
    .bind(record.product_id.as_uuid())
    .bind(record.price)
    .bind(record.changed_at)
    .bind(record.changed_by.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_price_history", e))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn decode_user(row: &PgRow) -> StoreResult<User> {
    let corrupt = |e: sqlx::Error| StoreError::Corrupt(format!("user row: {e}"));
    let login: String = row.try_get("login").map_err(corrupt)?;
    let version: i64 = row.try_get("version").map_err(corrupt)?;
    Ok(User {
        login: Login::parse(login).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        mail: row.try_get("mail").map_err(corrupt)?,
        password_hash: row.try_get("password_hash").map_err(corrupt)?,
        blocked: row.try_get("blocked").map_err(corrupt)?,
        active: row.try_get("active").map_err(corrupt)?,
        registered_at: row.try_get("registered_at").map_err(corrupt)?,
        version: u64::try_from(version).map_err(|e| StoreError::Corrupt(e.to_string()))?,
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self), fields(login = %login), err)]
    async fn find_by_login(&self, login: &Login) -> StoreResult<Option<User>> {
        let statement = format!("SELECT {USER_COLUMNS} FROM users WHERE login = $1");
        let row = sqlx::query(&statement)
            .bind(login.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_login", e))?;
        row.as_ref().map(decode_user).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_mail(&self, mail: &str) -> StoreResult<Option<User>> {
        let statement = format!("SELECT {USER_COLUMNS} FROM users WHERE mail = $1");
        let row = sqlx::query(&statement)
            .bind(mail)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_mail", e))?;
        row.as_ref().map(decode_user).transpose()
    }

    #[instrument(skip(self, user), fields(login = %user.login, expected = ?expected), err)]
    async fn save(&self, user: User, expected: ExpectedVersion) -> StoreResult<User> {
        let version = version_param(user.version)?;
        let result = match expected {
            ExpectedVersion::New => {
                let statement = format!(
                    "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
                );
                sqlx::query(&statement)
                    .bind(user.login.as_str())
                    .bind(&user.mail)
                    .bind(&user.password_hash)
                    .bind(user.blocked)
                    .bind(user.active)
                    .bind(user.registered_at)
                    .bind(version)
                    .execute(&*self.pool)
                    .await
            }
            ExpectedVersion::Exact(current) => {
                sqlx::query(
                    r#"
                    UPDATE users SET
                        mail = $2,
                        password_hash = $3,
                        blocked = $4,
                        active = $5,
                        version = $6
                    WHERE login = $1 AND version = $7
                    "#,
                )
                .bind(user.login.as_str())
                .bind(&user.mail)
                .bind(&user.password_hash)
                .bind(user.blocked)
                .bind(user.active)
                .bind(version)
                .bind(version_param(current)?)
                .execute(&*self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("save_user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "user {} expected {expected:?}",
                user.login
            )));
        }
        Ok(user)
    }
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Run against a live database only when `CARSHOP_TEST_DATABASE_URL` is set.
#[cfg(test)]
mod tests {
    use super::*;
    use carshop_auth::{RegisterUser, SaltedSha256Hasher};
    use carshop_products::CreateProduct;
    use carshop_products::product::fields;
    use carshop_query::{PageRequest, SortOrder};

    async fn pool() -> Option<PgPool> {
        let url = std::env::var("CARSHOP_TEST_DATABASE_URL").ok()?;
        let pool = crate::db::connect(&url, 4).await.unwrap();
        crate::db::migrate(&pool).await.unwrap();
        Some(pool)
    }

    async fn seller(pool: &PgPool) -> Login {
        let login = Login::parse(format!("pg-{}", ProductId::new())).unwrap();
        let user = User::register(
            RegisterUser {
                login: login.clone(),
                mail: format!("{login}@example.com"),
                password: "long enough".to_string(),
            },
            &SaltedSha256Hasher,
            Utc::now(),
        )
        .unwrap();
        PgUserRepository::new(pool.clone())
            .save(user, ExpectedVersion::New)
            .await
            .unwrap();
        login
    }

    fn product(owner: &Login, manufacturer: &str, price: i64) -> Product {
        Product::create(
            ProductId::new(),
            owner.clone(),
            CreateProduct {
                manufacturer: manufacturer.to_string(),
                model: "M".to_string(),
                description: None,
                price: Decimal::from(price),
            },
            Utc::now().date_naive(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn failed_history_insert_rolls_back_the_listing() {
        let Some(pool) = pool().await else { return };
        let owner = seller(&pool).await;
        let repo = PgProductRepository::new(pool.clone());
        let history = PgPriceHistoryRepository::new(pool);

        let first = product(&owner, "Audi", 100);
        let first_id = first.id_typed();
        let record = PriceHistory::record(first_id, first.price(), owner.clone(), Utc::now());
        repo.save_with_price(first, ExpectedVersion::New, record.clone())
            .await
            .unwrap();

        let second = product(&owner, "BMW", 200);
        let mut reused = record.clone();
        reused.product_id = second.id_typed();
        assert!(matches!(
            repo.save_with_price(second.clone(), ExpectedVersion::New, reused).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(repo.find_by_id(&second.id_typed()).await.unwrap().is_none());
        let stored = history.find_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.product_id, first_id);
    }

    #[tokio::test]
    async fn pages_count_and_order_strings_bytewise() {
        let Some(pool) = pool().await else { return };
        let owner = seller(&pool).await;
        let repo = PgProductRepository::new(pool);
        for (m, price) in [("audi", 1), ("BMW", 2), ("Audi", 3)] {
            repo.save(product(&owner, m, price), ExpectedVersion::New)
                .await
                .unwrap();
        }

        let mine = Predicate::eq(&fields::OWNER, owner.as_str());
        let req = PageRequest::new(0, 2)
            .unwrap()
            .with_sort(SortOrder::asc("manufacturer"));
        let page = repo.find_all(&mine, Some(&req)).await.unwrap();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
        let names: Vec<&str> = page.content.iter().map(Product::manufacturer).collect();
        assert_eq!(names, vec!["Audi", "BMW"]);

        let all = repo.find_all(&mine, None).await.unwrap();
        assert_eq!(all.total_elements, all.content.len() as u64);
    }
}
