//! Domain models consumed by the validation engine
//!
//! Entity snapshots are produced and owned by external collaborators
//! (ledger, sub-ledger, and demo-data services); the engine only reads
//! them. Everything here is serde-derived so snapshots can be loaded
//! from fixture JSON and results rendered by the reporting layer.

mod entities;
mod snapshot;

pub use entities::{
    Counterparty, Derivative, Facility, GlTransaction, JournalEntry, JournalStatus, LedgerAccount,
    LedgerAccountType, Posting, RiskClassification, SubLedgerAccount,
};
pub use snapshot::ValidationSnapshot;
