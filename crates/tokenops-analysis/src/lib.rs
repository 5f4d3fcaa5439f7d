//! tokenops-analysis crate
//!
//! Pure reporting logic over data supplied by an RPC client: batched vs.
//! sequential cost accounting, ABI-driven event classification, and the
//! presentation table that turns decoded events into readable lines.

pub mod cost;
pub mod describe;
pub mod events;
pub mod units;

pub use cost::{compare, totals, CostComparison, CostTotals, Savings, SavingsRatio};
pub use describe::{
    describe, describe_failure, DisplayUnits, EventView, FieldFormat, FieldView, ProjectionTable,
};
pub use events::{
    decode, summarize, DecodeFailure, DecodedEvent, EventCatalog, EventSummary, UNKNOWN_BUCKET,
};
