pub mod factory;
pub mod memory;
pub mod repository;
pub mod submit;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use memory::{InMemoryLeadRepository, InMemoryRepositoryFactory};
pub use repository::{LeadRepository, RepositoryError};
pub use submit::{LeadSubmitter, RetryPolicy};
