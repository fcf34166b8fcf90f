//! img-harvest domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `ledger`: The per-community URL ledger
//! - `urls`: URL normalization and extension matching
//! - `communities`: Community list parsing
//! - `usecases`: Liveness classification, reconciliation and maintenance

pub mod communities;
pub mod ledger;
pub mod model;
pub mod ports;
pub mod urls;
pub mod usecases;

#[cfg(test)]
mod testing;

pub use ledger::UrlLedger;
pub use model::*;
pub use ports::*;
