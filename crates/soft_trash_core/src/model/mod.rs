//! Record-level trash state contract.
//!
//! # Responsibility
//! - Define the trait every trashable record implements.
//! - Provide pure predicates over the trash timestamp.
//!
//! # Invariants
//! - Trash state is derived solely from one nullable timestamp attribute.
//! - Records are never physically removed by this crate.

pub mod record;
