//! Address-range beat lookup.
//!
//! Loads a table of street-number ranges mapped to beats and teams and
//! answers "which beat covers this address?" style queries.

pub mod cli;
pub mod export;
pub mod models;
pub mod scan;
pub mod search;
pub mod store;
