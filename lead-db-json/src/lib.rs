//! JSON-file storage backend for configurator leads.
//!
//! Register [`JsonFileRepositoryFactory`] with a
//! [`lead_core::db::RepositoryRegistry`] to make the `"json"` backend
//! available.

mod document;
mod factory;
mod repository;

pub use factory::JsonFileRepositoryFactory;
pub use repository::JsonFileLeadRepository;
