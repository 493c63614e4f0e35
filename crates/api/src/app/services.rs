//! Service wiring: picks a storage backend and builds the application services
//! on top of it.

use std::sync::Arc;

use carshop_auth::{PasswordHasher, SaltedSha256Hasher};
use carshop_infra::{
    InMemoryProductRepository, InMemoryRepository, InMemoryUserRepository,
    PgPriceHistoryRepository, PgProductRepository, PgUserRepository, PriceHistoryService,
    ProductRepository, ProductService, Repository, StoreError, UserRepository, UserService, db,
};
use carshop_observability::{Observer, TracingObserver};
use carshop_products::PriceHistory;

use crate::config::ApiConfig;

pub struct AppServices {
    pub products: Arc<ProductService>,
    pub price_history: Arc<PriceHistoryService>,
    pub users: Arc<UserService>,
}

struct Stores {
    products: Arc<dyn ProductRepository>,
    history: Arc<dyn Repository<PriceHistory>>,
    users: Arc<dyn UserRepository>,
}

impl AppServices {
    fn from_stores(stores: Stores, observer: Arc<dyn Observer>) -> Self {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(SaltedSha256Hasher);
        let products = Arc::new(ProductService::new(
            stores.products,
            Arc::clone(&stores.users),
            Arc::clone(&observer),
        ));
        let price_history = Arc::new(PriceHistoryService::new(
            stores.history,
            Arc::clone(&products),
            Arc::clone(&observer),
        ));
        let users = Arc::new(UserService::new(stores.users, hasher, observer));
        Self {
            products,
            price_history,
            users,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_stores(in_memory_stores(), Arc::new(TracingObserver))
    }
}

fn in_memory_stores() -> Stores {
    let history = Arc::new(InMemoryRepository::<PriceHistory>::new());
    Stores {
        products: Arc::new(InMemoryProductRepository::new(Arc::clone(&history))),
        history,
        users: Arc::new(InMemoryUserRepository::new()),
    }
}

/// Build services for `config`.
///
/// Persistent stores need `DATABASE_URL`; without it the process falls back to
/// in-memory stores.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StoreError> {
    if !config.use_persistent_stores {
        tracing::info!("using in-memory stores");
        return Ok(AppServices::in_memory());
    }

    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("USE_PERSISTENT_STORES set without DATABASE_URL; using in-memory stores");
        return Ok(AppServices::in_memory());
    };

    let pool = db::connect(url, config.max_connections).await?;
    db::migrate(&pool).await?;
    tracing::info!("using postgres stores");

    let stores = Stores {
        products: Arc::new(PgProductRepository::new(pool.clone())),
        history: Arc::new(PgPriceHistoryRepository::new(pool.clone())),
        users: Arc::new(PgUserRepository::new(pool)),
    };
    Ok(AppServices::from_stores(stores, Arc::new(TracingObserver)))
}
