//! Composite entity-graph snapshot passed to every rule
//!
//! Rules that need more than one collection at once (related-party
//! exposure, intercompany matching, reconciliation) read whichever
//! sub-collections they declare; single-collection rules ignore the
//! rest. The snapshot is immutable from the engine's point of view.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entities::{
    Counterparty, Derivative, Facility, GlTransaction, JournalEntry, LedgerAccount,
    SubLedgerAccount,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSnapshot {
    pub counterparties: Vec<Counterparty>,
    pub facilities: Vec<Facility>,
    pub derivatives: Vec<Derivative>,
    pub transactions: Vec<GlTransaction>,
    pub ledger_accounts: Vec<LedgerAccount>,
    pub journal_entries: Vec<JournalEntry>,
    pub sub_ledger_accounts: Vec<SubLedgerAccount>,
}

impl ValidationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total record count across all collections, reported in the
    /// validation summary.
    pub fn total_records(&self) -> usize {
        self.counterparties.len()
            + self.facilities.len()
            + self.derivatives.len()
            + self.transactions.len()
            + self.ledger_accounts.len()
            + self.journal_entries.len()
            + self.sub_ledger_accounts.len()
    }

    /// Registered counterparty ids, for cross-reference rules.
    pub fn counterparty_ids(&self) -> HashSet<&str> {
        self.counterparties.iter().map(|c| c.id.as_str()).collect()
    }

    /// Sub-ledger balances grouped by parent control account. Grouping
    /// happens once per rule evaluation so each account comparison
    /// stays O(1).
    pub fn sub_ledger_totals(&self) -> HashMap<&str, Decimal> {
        let mut totals: HashMap<&str, Decimal> = HashMap::new();
        for account in &self.sub_ledger_accounts {
            *totals
                .entry(account.parent_account_id.as_str())
                .or_insert_with(Decimal::default) += account.balance;
        }
        totals
    }
}
