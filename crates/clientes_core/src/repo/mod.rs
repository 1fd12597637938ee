//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage capability the customer service depends on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExistsFor*`)
//!   distinguishable from DB transport errors.

pub mod customer_repo;
