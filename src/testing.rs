//! Sample-data builders shared by unit and integration tests
//!
//! Every builder returns a record that passes the standard rule set, so
//! tests mutate exactly the field under scrutiny.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    Counterparty, Derivative, Facility, GlTransaction, JournalEntry, JournalStatus, LedgerAccount,
    LedgerAccountType, Posting, RiskClassification, SubLedgerAccount, ValidationSnapshot,
};

pub fn sample_counterparty(id: &str) -> Counterparty {
    Counterparty {
        id: id.to_string(),
        name: format!("{id} Holdings Pte Ltd"),
        country: "SG".to_string(),
        entity_type: "Banks".to_string(),
        sector_code: Some("64191".to_string()),
        segment: "Corporate".to_string(),
        lei: Some("5493001RKR55V4X61F71".to_string()),
        is_sme: false,
        is_related_party: false,
    }
}

pub fn sample_facility(id: &str, counterparty_id: &str) -> Facility {
    Facility {
        id: id.to_string(),
        counterparty_id: counterparty_id.to_string(),
        facility_type: "Term Loan".to_string(),
        origination_date: NaiveDate::from_ymd_opt(2023, 3, 15).unwrap_or_default(),
        maturity_date: NaiveDate::from_ymd_opt(2028, 3, 15).unwrap_or_default(),
        next_repricing_date: None,
        outstanding_amount: Decimal::from(250_000),
        limit_amount: Decimal::from(500_000),
        currency: "SGD".to_string(),
        risk_classification: RiskClassification::Pass,
        loss_allowance: Decimal::ZERO,
        is_secured: false,
        is_restructured: false,
        property_value: None,
        loan_to_value: None,
    }
}

pub fn sample_derivative(trade_id: &str, counterparty_id: &str) -> Derivative {
    Derivative {
        trade_id: trade_id.to_string(),
        counterparty_id: counterparty_id.to_string(),
        risk_category: "Interest Rate".to_string(),
        product_type: "IRS".to_string(),
        notional_amount: Decimal::from(1_000_000),
        positive_fair_value: Decimal::from(12_500),
        negative_fair_value: Decimal::ZERO,
        booking_location: "SG".to_string(),
        trading_location: "SG".to_string(),
    }
}

pub fn sample_transaction(id: &str) -> GlTransaction {
    GlTransaction {
        id: id.to_string(),
        facility_id: None,
        transaction_date: NaiveDate::from_ymd_opt(2024, 11, 3).unwrap_or_default(),
        amount: Decimal::from(10_000),
        currency: "SGD".to_string(),
        debit_account: "GL-1000".to_string(),
        credit_account: "GL-2000".to_string(),
        transaction_type: "Disbursement".to_string(),
        is_intercompany: false,
        entity_code: "SG01".to_string(),
    }
}

/// A snapshot in which every standard rule passes: balanced ledger,
/// reconciled sub-ledger, resolvable references.
pub fn clean_snapshot() -> ValidationSnapshot {
    let mut snapshot = ValidationSnapshot::new();

    snapshot.counterparties.push(sample_counterparty("CP-001"));
    let mut corporate = sample_counterparty("CP-002");
    corporate.entity_type = "Non-financial Corporates".to_string();
    corporate.sector_code = Some("46900".to_string());
    snapshot.counterparties.push(corporate);

    snapshot.facilities.push(sample_facility("FAC-001", "CP-001"));
    snapshot.facilities.push(sample_facility("FAC-002", "CP-002"));
    snapshot
        .derivatives
        .push(sample_derivative("TRD-001", "CP-001"));
    snapshot.transactions.push(sample_transaction("TXN-001"));

    snapshot.ledger_accounts.push(LedgerAccount {
        id: "GL-1000".to_string(),
        account_type: LedgerAccountType::Asset,
        balance: Decimal::from(500_000),
    });
    snapshot.ledger_accounts.push(LedgerAccount {
        id: "GL-3000".to_string(),
        account_type: LedgerAccountType::Liability,
        balance: Decimal::from(300_000),
    });
    snapshot.ledger_accounts.push(LedgerAccount {
        id: "GL-4000".to_string(),
        account_type: LedgerAccountType::Equity,
        balance: Decimal::from(200_000),
    });

    snapshot.sub_ledger_accounts.push(SubLedgerAccount {
        id: "SL-001".to_string(),
        parent_account_id: "GL-1000".to_string(),
        balance: Decimal::from(250_000),
    });
    snapshot.sub_ledger_accounts.push(SubLedgerAccount {
        id: "SL-002".to_string(),
        parent_account_id: "GL-1000".to_string(),
        balance: Decimal::from(250_000),
    });

    snapshot.journal_entries.push(JournalEntry {
        id: "JE-001".to_string(),
        status: JournalStatus::Posted,
        postings: vec![
            Posting {
                account_id: "GL-1000".to_string(),
                debit_amount: Decimal::from(10_000),
                credit_amount: Decimal::ZERO,
            },
            Posting {
                account_id: "GL-3000".to_string(),
                debit_amount: Decimal::ZERO,
                credit_amount: Decimal::from(10_000),
            },
        ],
    });

    snapshot
}
