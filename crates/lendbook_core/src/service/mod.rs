//! Service layer for composite use-cases.
//!
//! # Responsibility
//! - Orchestrate multi-table writes that must commit together.
//! - Map repository failures to use-case level errors.

pub mod lending_service;
