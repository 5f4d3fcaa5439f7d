//! tokenops-data crate
//!
//! Boundary types for completed operations and raw logs, ABI artifact
//! loading, and a read-only RPC reader for the token contract.

pub mod abi;
pub mod reader;
pub mod types;

pub use types::{CostError, OperationCost, RawLogEntry};
