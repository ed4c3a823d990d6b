//! Core lookup engine module.
//!
//! This module hosts the `run_lookup` implementation, the matching
//! predicates it is built from, and map-link decoration.

pub mod engine;
pub mod link;
pub mod query;
