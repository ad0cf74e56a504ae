//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls, hooks and timestamps into trash/restore
//!   use-cases.
//! - Keep callers decoupled from storage details.

pub mod trash_service;
