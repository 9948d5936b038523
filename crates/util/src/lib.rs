//! prism-util - shared building blocks for the prism crates.
//!
//! Capability-dispatched cloning, the pre-order visitor contract, order
//! independent sequence comparison and a seeded fuzzer for tests.

pub mod clone;
pub mod fuzzer;
pub mod multiset;
pub mod visitor;

// Re-exports for convenience
pub use clone::{clone, clone_owned, CloneError, CloneStrategy, Cloneable};
pub use fuzzer::Fuzzer;
pub use multiset::{contains_by, unmatched, unordered_eq};
pub use visitor::{Visitable, Visitor};
