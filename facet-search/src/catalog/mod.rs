//! Catalog implementations.

mod static_catalog;

pub use static_catalog::{NamedRange, StaticCatalog};
