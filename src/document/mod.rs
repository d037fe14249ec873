//! Document backend: schema-validated collections with bulk semantics.

pub mod collection;
pub mod query;
pub mod schema;
mod store;

pub use collection::{BulkReport, Collection, WriteFailure};
pub use query::ListOptions;
pub use store::DocumentStore;
