//! Core types: transactions, timestamps, tracing setup

pub mod time;
pub mod tracing;
pub mod transaction;

pub use time::parse_wire_timestamp;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use transaction::{Transaction, TransactionStatus};
