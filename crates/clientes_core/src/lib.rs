//! Core domain logic for customer records.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::customer::{
    is_valid_email, new_customer_id, parse_customer_id, Customer, CustomerId,
    CustomerValidationError,
};
pub use repo::customer_repo::{
    CustomerKey, CustomerRepository, RepoError, RepoResult, SqliteCustomerRepository,
};
pub use service::customer_service::{
    CustomerService, CustomerServiceError, CustomerUseCase, ServiceResult,
};

/// Minimal health-check API for wiring probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
