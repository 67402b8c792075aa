pub mod accounts;
pub mod catalog;
pub mod error;
pub mod models;

pub use accounts::AccountService;
pub use catalog::{AnimeCatalog, Catalog, CatalogService, KinopoiskCatalog, ListParams};
pub use error::DomainError;
