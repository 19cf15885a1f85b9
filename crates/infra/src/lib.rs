//! Infrastructure layer: configuration, storage backends, external services.

pub mod config;
pub mod external;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use store::{
    CartStore, CatalogStore, Contact, ContactStore, InMemoryStore, OrderStore, PostgresStore,
    StoreError, StoreResult,
};
