//! Sub-ledger to ledger reconciliation rules
//!
//! Balance comparisons at three levels: each GL control account against
//! the sum of its sub-ledger accounts, each posted journal entry's
//! debits against credits, and the ledger-wide accounting equation.
//! All three reconcile within an absolute 0.01 tolerance at
//! currency-minor-unit scale.

use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::models::{JournalStatus, LedgerAccountType, ValidationSnapshot};
use crate::rules::{declare_rule, FindingSet, Rule, ValidationResult};

/// Absolute difference at or below this reconciles.
pub fn reconciliation_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

declare_rule!(
    SubLedgerReconciliationRule,
    "RC-001",
    "Sub-ledger to control account reconciliation",
    Business,
    Critical,
    SubLedgerReconciliation,
    "Each GL control account balance must equal the sum of its sub-ledger accounts"
);

impl SubLedgerReconciliationRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        // Grouped once, then O(1) per control account.
        let totals = snapshot.sub_ledger_totals();

        for account in &snapshot.ledger_accounts {
            let Some(sub_total) = totals.get(account.id.as_str()) else {
                continue; // not a control account
            };
            let difference = (account.balance - sub_total).abs();
            if difference > reconciliation_tolerance() {
                findings
                    .fail(format!(
                        "Control account balance {} differs from sub-ledger total {} by {}",
                        account.balance, sub_total, difference
                    ))
                    .record(&account.id, "LedgerAccount")
                    .field("balance")
                    .observed(account.balance.to_string(), sub_total.to_string());
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    JournalBalanceRule,
    "RC-002",
    "Journal entry debit/credit balance",
    Business,
    High,
    SubLedgerReconciliation,
    "Posted journal entries must have equal total debits and credits"
);

impl JournalBalanceRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for entry in &snapshot.journal_entries {
            if entry.status != JournalStatus::Posted {
                continue;
            }
            let debits: Decimal = entry.postings.iter().map(|p| p.debit_amount).sum();
            let credits: Decimal = entry.postings.iter().map(|p| p.credit_amount).sum();
            let difference = (debits - credits).abs();
            if difference > reconciliation_tolerance() {
                findings
                    .fail(format!(
                        "Journal entry debits {debits} do not balance credits {credits}"
                    ))
                    .record(&entry.id, "JournalEntry")
                    .field("postings")
                    .observed(format!("debits {debits} / credits {credits}"), "balanced");
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    LedgerEquationRule,
    "RC-003",
    "Ledger-wide accounting equation",
    Business,
    High,
    SubLedgerReconciliation,
    "Total assets must equal liabilities plus equity across the ledger"
);

impl LedgerEquationRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        if snapshot.ledger_accounts.is_empty() {
            return Ok(findings.finish());
        }

        let mut assets = Decimal::ZERO;
        let mut liabilities = Decimal::ZERO;
        let mut equity = Decimal::ZERO;
        for account in &snapshot.ledger_accounts {
            match account.account_type {
                LedgerAccountType::Asset => assets += account.balance,
                LedgerAccountType::Liability => liabilities += account.balance,
                LedgerAccountType::Equity => equity += account.balance,
                LedgerAccountType::Income | LedgerAccountType::Expense => {}
            }
        }

        let difference = (assets - (liabilities + equity)).abs();
        if difference > reconciliation_tolerance() {
            findings
                .fail(format!(
                    "Assets {} do not equal liabilities {} plus equity {} (difference {})",
                    assets, liabilities, equity, difference
                ))
                .record("LEDGER", "Ledger")
                .field("balance")
                .observed(assets.to_string(), (liabilities + equity).to_string());
        }
        Ok(findings.finish())
    }
}
