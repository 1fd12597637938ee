//! Customer domain model.
//!
//! # Responsibility
//! - Define the canonical customer entity used by core business logic.
//! - Own per-field validation rules.
//!
//! # Invariants
//! - Every customer is identified by a stable `CustomerId`.
//! - A `Customer` value is never observable in an invalid state.

pub mod customer;
