//! Core types, traits and the sync pipeline for the COVID statistics
//! service.
//!
//! This crate knows nothing about databases or HTTP. Store backends implement
//! [`store::CaseSource`] and [`store::StatsStore`]; the API and the binary
//! depend on those traits.

pub mod aggregate;
pub mod case;
pub mod district;
pub mod enrich;
pub mod error;
pub mod stats;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorKind, Result};
