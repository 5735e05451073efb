//! Financial entity types read by validation rules

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An external party (person, company, bank, government) with whom the
/// institution transacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: String,
    pub name: String,
    /// ISO 3166 alpha-2 country of incorporation or residence.
    pub country: String,
    pub entity_type: String,
    /// SSIC industry classification; mandatory for non-financial corporates.
    pub sector_code: Option<String>,
    pub segment: String,
    /// Legal Entity Identifier, when the party has one.
    pub lei: Option<String>,
    pub is_sme: bool,
    pub is_related_party: bool,
}

/// Credit-risk grading driving minimum provisioning (MAS 612 style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskClassification {
    Pass,
    SpecialMention,
    Substandard,
    Doubtful,
    Loss,
}

impl RiskClassification {
    /// Substandard and below are impaired (Stage 3) exposures.
    pub fn is_impaired(&self) -> bool {
        matches!(
            self,
            RiskClassification::Substandard | RiskClassification::Doubtful | RiskClassification::Loss
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskClassification::Pass => "Pass",
            RiskClassification::SpecialMention => "Special Mention",
            RiskClassification::Substandard => "Substandard",
            RiskClassification::Doubtful => "Doubtful",
            RiskClassification::Loss => "Loss",
        }
    }
}

/// A credit exposure (loan, overdraft, trade finance) extended to a
/// counterparty, with an outstanding balance and approved limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub counterparty_id: String,
    pub facility_type: String,
    pub origination_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub next_repricing_date: Option<NaiveDate>,
    pub outstanding_amount: Decimal,
    pub limit_amount: Decimal,
    pub currency: String,
    pub risk_classification: RiskClassification,
    pub loss_allowance: Decimal,
    pub is_secured: bool,
    pub is_restructured: bool,
    /// Collateral property value for property-secured facilities.
    pub property_value: Option<Decimal>,
    /// Loan-to-value percentage for property-secured facilities.
    pub loan_to_value: Option<Decimal>,
}

/// An off-balance-sheet contract (swap, option, forward, future) with
/// notional and fair-value exposure to a counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Derivative {
    pub trade_id: String,
    pub counterparty_id: String,
    pub risk_category: String,
    pub product_type: String,
    pub notional_amount: Decimal,
    pub positive_fair_value: Decimal,
    pub negative_fair_value: Decimal,
    pub booking_location: String,
    pub trading_location: String,
}

/// A single general-ledger movement between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlTransaction {
    pub id: String,
    pub facility_id: Option<String>,
    pub transaction_date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub debit_account: String,
    pub credit_account: String,
    pub transaction_type: String,
    pub is_intercompany: bool,
    pub entity_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerAccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

/// A general-ledger account aggregating balances by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: String,
    pub account_type: LedgerAccountType,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalStatus {
    Draft,
    Posted,
    Reversed,
}

/// One leg of a journal entry. Exactly one of the two amounts is
/// expected to be non-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub account_id: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub status: JournalStatus,
    pub postings: Vec<Posting>,
}

/// A detailed account register line whose aggregate must reconcile to a
/// single GL control account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubLedgerAccount {
    pub id: String,
    pub parent_account_id: String,
    pub balance: Decimal,
}
