//! User and session storage
//!
//! - [`predicate`] - Equality predicates for user lookups
//! - [`memory`] - In-memory user tables and session map

pub mod memory;
pub mod predicate;

pub use memory::{MemorySessionStore, MemoryUserStore};
pub use predicate::{values_match, Condition, Predicate};
