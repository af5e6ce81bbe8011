//! Angler of the Year standings reconciliation.
//!
//! Raw per-event tournament results are folded into best-N season totals
//! ([`standings::aggregate`]) and compared against a previously materialized
//! standings view ([`standings::audit`]).

pub mod config;
pub mod error;
pub mod output;
pub mod source;
pub mod standings;
pub mod telemetry;

pub use error::AuditError;
