//! Store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence/filtering contract the lifecycle consumes.
//! - Isolate SQLite query details from the lifecycle service.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod trash_store;
