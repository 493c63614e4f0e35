//! Infrastructure layer: storage backends and the application services that
//! run on top of them.

pub mod db;
pub mod services;
pub mod store;


pub use services::{
    PriceHistoryService, ProductService, SearchScope, ServiceError, ServiceResult, UserService,
};
pub use store::{
    InMemoryProductRepository, InMemoryRepository, InMemoryUserRepository,
    PgPriceHistoryRepository, PgProductRepository, PgUserRepository, ProductRepository,
    Repository, StoreError, StoreResult, UserRepository,
};
