//! Bonus proposals
//!
//! Storage and business rules for employee bonus proposals.

#[cfg(test)]
pub mod memory;
pub mod service;
pub mod store;

pub use service::BonusService;
pub use store::PgBonusStore;
