//! Schema and data-quality rules
//!
//! Per-field checks over individual records: mandatory fields,
//! identifier formats, enumerated code membership, decimal precision
//! and date validity. Violations here are expected, first-class
//! findings, not engine errors.

use std::collections::HashMap;

use chrono::Utc;

use crate::error::EngineError;
use crate::models::ValidationSnapshot;
use crate::rules::{declare_rule, FindingSet, Rule, ValidationResult};
use crate::validators;

declare_rule!(
    MandatoryCounterpartyFieldsRule,
    "DQ-001",
    "Mandatory counterparty fields",
    DataQuality,
    High,
    ScalarTypeCheck,
    "Counterparty id, name, country and entity type must be present and well-formed"
);

impl MandatoryCounterpartyFieldsRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for cp in &snapshot.counterparties {
            if cp.id.trim().is_empty() {
                findings
                    .fail("Counterparty is missing an identifier")
                    .record(&cp.id, "Counterparty")
                    .field("id");
                continue;
            }
            if !validators::is_valid_text(&cp.name, 140) {
                findings
                    .fail("Counterparty name is missing or exceeds 140 characters")
                    .record(&cp.id, "Counterparty")
                    .field("name")
                    .observed(cp.name.clone(), "non-empty text, at most 140 chars");
            }
            if cp.country.trim().len() != 2 {
                findings
                    .fail("Counterparty country must be an ISO 3166 alpha-2 code")
                    .record(&cp.id, "Counterparty")
                    .field("country")
                    .observed(cp.country.clone(), "2-letter country code");
            }
            if !validators::is_valid_entity_type(&cp.entity_type) {
                findings
                    .fail("Counterparty entity type is not a recognised reporting category")
                    .record(&cp.id, "Counterparty")
                    .field("entity_type")
                    .observed(cp.entity_type.clone(), validators::VALID_ENTITY_TYPES.join(" | "));
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    DuplicateIdentifierRule,
    "DQ-002",
    "Duplicate identifiers",
    DataQuality,
    High,
    CrossReference,
    "Counterparty and facility identifiers must be unique within the snapshot"
);

impl DuplicateIdentifierRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for cp in &snapshot.counterparties {
            *seen.entry(cp.id.as_str()).or_insert(0) += 1;
        }
        for (id, count) in seen.iter().filter(|(_, c)| **c > 1) {
            findings
                .fail(format!("Counterparty id appears {count} times"))
                .record(*id, "Counterparty")
                .field("id");
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for facility in &snapshot.facilities {
            *seen.entry(facility.id.as_str()).or_insert(0) += 1;
        }
        for (id, count) in seen.iter().filter(|(_, c)| **c > 1) {
            findings
                .fail(format!("Facility id appears {count} times"))
                .record(*id, "Facility")
                .field("id");
        }

        // HashMap iteration order is arbitrary; results must be stable.
        let mut results = findings.finish();
        results.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        Ok(results)
    }
}

declare_rule!(
    CurrencyCodeRule,
    "DQ-003",
    "Currency code membership",
    DataQuality,
    Medium,
    ScalarTypeCheck,
    "Facility and transaction currencies must belong to the accepted ISO 4217 subset"
);

impl CurrencyCodeRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for facility in &snapshot.facilities {
            if !validators::is_valid_currency(&facility.currency) {
                findings
                    .fail("Facility currency is not an accepted ISO 4217 code")
                    .record(&facility.id, "Facility")
                    .field("currency")
                    .observed(facility.currency.clone(), "ISO 4217 subset");
            }
        }
        for txn in &snapshot.transactions {
            if !validators::is_valid_currency(&txn.currency) {
                findings
                    .fail("Transaction currency is not an accepted ISO 4217 code")
                    .record(&txn.id, "GlTransaction")
                    .field("currency")
                    .observed(txn.currency.clone(), "ISO 4217 subset");
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    AmountPrecisionRule,
    "DQ-004",
    "Amount precision profiles",
    DataQuality,
    Medium,
    ScalarTypeCheck,
    "Monetary amounts must fit their report-field precision profiles"
);

impl AmountPrecisionRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for facility in &snapshot.facilities {
            for (field, value) in [
                ("outstanding_amount", facility.outstanding_amount),
                ("limit_amount", facility.limit_amount),
                ("loss_allowance", facility.loss_allowance),
            ] {
                if !validators::is_valid_amount(value) {
                    findings
                        .fail("Facility amount exceeds the DECIMAL(12,2) profile")
                        .record(&facility.id, "Facility")
                        .field(field)
                        .observed(value.to_string(), "at most 12 digits, 2 fractional");
                }
            }
        }
        for derivative in &snapshot.derivatives {
            if !validators::is_valid_large_amount(derivative.notional_amount) {
                findings
                    .fail("Derivative notional exceeds the DECIMAL(18,4) profile")
                    .record(&derivative.trade_id, "Derivative")
                    .field("notional_amount")
                    .observed(
                        derivative.notional_amount.to_string(),
                        "at most 18 digits, 4 fractional",
                    );
            }
        }
        for facility in &snapshot.facilities {
            if let Some(ltv) = facility.loan_to_value {
                if !validators::is_valid_percentage(ltv) {
                    findings
                        .fail("Loan-to-value exceeds the DECIMAL(5,2) percentage profile")
                        .record(&facility.id, "Facility")
                        .field("loan_to_value")
                        .observed(ltv.to_string(), "at most 5 digits, 2 fractional");
                }
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    TransactionDateRule,
    "DQ-005",
    "Transaction date validity",
    DataQuality,
    Medium,
    ScalarTypeCheck,
    "GL transaction and facility origination dates must lie in the past"
);

impl TransactionDateRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        let today = Utc::now().date_naive();

        for txn in &snapshot.transactions {
            if !validators::is_past_date(txn.transaction_date, today) {
                findings
                    .fail("Transaction date is not in the past")
                    .record(&txn.id, "GlTransaction")
                    .field("transaction_date")
                    .observed(txn.transaction_date.to_string(), format!("before {today}"));
            }
        }
        for facility in &snapshot.facilities {
            if !validators::is_past_date(facility.origination_date, today) {
                findings
                    .fail("Facility origination date is not in the past")
                    .record(&facility.id, "Facility")
                    .field("origination_date")
                    .observed(facility.origination_date.to_string(), format!("before {today}"));
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    LeiFormatRule,
    "DQ-006",
    "LEI format",
    DataQuality,
    Medium,
    ScalarTypeCheck,
    "Counterparty LEIs, when present, must be 20-character ISO 17442 identifiers"
);

impl LeiFormatRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for cp in &snapshot.counterparties {
            if let Some(lei) = &cp.lei {
                if !validators::is_valid_lei(lei) {
                    findings
                        .fail("Counterparty LEI does not match the 20-character format")
                        .record(&cp.id, "Counterparty")
                        .field("lei")
                        .observed(lei.clone(), "18 alphanumerics + 2 check digits");
                }
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    SectorCodeFormatRule,
    "DQ-007",
    "Sector code format",
    DataQuality,
    Medium,
    ScalarTypeCheck,
    "Sector codes, when present, must be fixed-width 5-digit SSIC codes"
);

impl SectorCodeFormatRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for cp in &snapshot.counterparties {
            if let Some(code) = &cp.sector_code {
                if !validators::is_valid_sector_code(code) {
                    findings
                        .fail("Sector code is not a 5-digit SSIC code")
                        .record(&cp.id, "Counterparty")
                        .field("sector_code")
                        .observed(code.clone(), "5 numeric digits");
                }
            }
        }
        Ok(findings.finish())
    }
}
