//! Business-logic and cross-reference rules
//!
//! Checks that individual exposures make commercial sense and that the
//! entity graph is internally consistent: limits respected, references
//! resolvable, dates ordered, collateral fields coherent.

use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::models::{RiskClassification, ValidationSnapshot};
use crate::rules::{declare_rule, FindingSet, Rule, RuleSeverity, ValidationResult};

declare_rule!(
    FacilityLimitRule,
    "BR-001",
    "Outstanding within approved limit",
    Business,
    Critical,
    BusinessLogic,
    "Facility outstanding amount must not exceed its approved limit"
);

impl FacilityLimitRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for facility in &snapshot.facilities {
            if facility.outstanding_amount > facility.limit_amount {
                findings
                    .fail(format!(
                        "Outstanding {} exceeds approved limit {}",
                        facility.outstanding_amount, facility.limit_amount
                    ))
                    .record(&facility.id, "Facility")
                    .field("outstanding_amount")
                    .observed(
                        facility.outstanding_amount.to_string(),
                        format!("<= {}", facility.limit_amount),
                    );
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    FacilityCounterpartyReferenceRule,
    "BR-002",
    "Facility counterparty reference",
    Business,
    High,
    CrossReference,
    "Every facility must reference a registered counterparty"
);

impl FacilityCounterpartyReferenceRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let known = snapshot.counterparty_ids();
        let mut findings = FindingSet::for_rule(self);
        for facility in &snapshot.facilities {
            if !known.contains(facility.counterparty_id.as_str()) {
                findings
                    .fail(format!(
                        "Facility references unknown counterparty '{}'",
                        facility.counterparty_id
                    ))
                    .record(&facility.id, "Facility")
                    .field("counterparty_id")
                    .observed(facility.counterparty_id.clone(), "registered counterparty id");
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    DerivativeCounterpartyReferenceRule,
    "BR-003",
    "Derivative counterparty reference",
    Business,
    High,
    CrossReference,
    "Every derivative trade must reference a registered counterparty"
);

impl DerivativeCounterpartyReferenceRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let known = snapshot.counterparty_ids();
        let mut findings = FindingSet::for_rule(self);
        for derivative in &snapshot.derivatives {
            if !known.contains(derivative.counterparty_id.as_str()) {
                findings
                    .fail(format!(
                        "Derivative references unknown counterparty '{}'",
                        derivative.counterparty_id
                    ))
                    .record(&derivative.trade_id, "Derivative")
                    .field("counterparty_id")
                    .observed(
                        derivative.counterparty_id.clone(),
                        "registered counterparty id",
                    );
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    MaturityOrderingRule,
    "BR-004",
    "Maturity after origination",
    Business,
    Medium,
    BusinessLogic,
    "Facility maturity must fall strictly after origination"
);

impl MaturityOrderingRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for facility in &snapshot.facilities {
            if facility.maturity_date <= facility.origination_date {
                findings
                    .fail("Maturity date does not fall after origination date")
                    .record(&facility.id, "Facility")
                    .field("maturity_date")
                    .observed(
                        facility.maturity_date.to_string(),
                        format!("after {}", facility.origination_date),
                    );
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    PropertyLtvRule,
    "BR-005",
    "Property collateral LTV",
    Business,
    Medium,
    BusinessLogic,
    "Secured property facilities must carry collateral value and a plausible loan-to-value"
);

impl PropertyLtvRule {
    /// LTV above this is an outright breach.
    fn ltv_ceiling() -> Decimal {
        Decimal::from(100)
    }

    /// LTV above this but within the ceiling is flagged for review.
    fn ltv_watch_level() -> Decimal {
        Decimal::from(80)
    }

    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for facility in snapshot.facilities.iter().filter(|f| f.is_secured) {
            let (Some(property_value), Some(ltv)) = (facility.property_value, facility.loan_to_value)
            else {
                findings
                    .fail("Secured facility is missing property value or loan-to-value")
                    .record(&facility.id, "Facility")
                    .field("property_value")
                    .observed("absent", "property value and LTV present");
                continue;
            };
            if property_value <= Decimal::ZERO {
                findings
                    .fail("Collateral property value must be positive")
                    .record(&facility.id, "Facility")
                    .field("property_value")
                    .observed(property_value.to_string(), "> 0");
                continue;
            }
            if ltv > Self::ltv_ceiling() {
                findings
                    .fail(format!("Loan-to-value {ltv}% exceeds 100%"))
                    .record(&facility.id, "Facility")
                    .field("loan_to_value")
                    .observed(ltv.to_string(), "<= 100");
            } else if ltv > Self::ltv_watch_level() {
                findings
                    .warn(
                        RuleSeverity::Medium,
                        format!("Loan-to-value {ltv}% is above the 80% watch level"),
                    )
                    .record(&facility.id, "Facility")
                    .field("loan_to_value")
                    .observed(ltv.to_string(), "<= 80");
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    RestructuredClassificationRule,
    "BR-006",
    "Restructured facility classification",
    Business,
    Medium,
    BusinessLogic,
    "Restructured facilities cannot retain a clean Pass risk classification"
);

impl RestructuredClassificationRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for facility in &snapshot.facilities {
            if facility.is_restructured
                && facility.risk_classification == RiskClassification::Pass
            {
                findings
                    .fail("Restructured facility still classified as Pass")
                    .record(&facility.id, "Facility")
                    .field("risk_classification")
                    .observed("Pass", "Special Mention or worse");
            }
        }
        Ok(findings.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ValidationStatus;
    use crate::testing::{sample_counterparty, sample_facility};

    #[test]
    fn test_limit_breach_yields_single_critical_fail() {
        let mut facility = sample_facility("FAC-100", "CP-001");
        facility.outstanding_amount = Decimal::from(1_100_000);
        facility.limit_amount = Decimal::from(1_000_000);
        let mut snapshot = ValidationSnapshot::new();
        snapshot.counterparties.push(sample_counterparty("CP-001"));
        snapshot.facilities.push(facility);

        let results = FacilityLimitRule.evaluate(&snapshot).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ValidationStatus::Fail);
        assert_eq!(results[0].severity, RuleSeverity::Critical);
        assert_eq!(results[0].record_id.as_deref(), Some("FAC-100"));
        assert_eq!(
            results[0].expected_value.as_deref(),
            Some("<= 1000000")
        );
    }

    #[test]
    fn test_within_limit_is_pass_singleton() {
        let mut snapshot = ValidationSnapshot::new();
        snapshot.facilities.push(sample_facility("FAC-101", "CP-001"));

        let results = FacilityLimitRule.evaluate(&snapshot).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ValidationStatus::Pass);
    }

    #[test]
    fn test_orphan_facility_reference() {
        let mut snapshot = ValidationSnapshot::new();
        snapshot.counterparties.push(sample_counterparty("CP-001"));
        snapshot.facilities.push(sample_facility("FAC-102", "CP-404"));

        let results = FacilityCounterpartyReferenceRule
            .evaluate(&snapshot)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ValidationStatus::Fail);
        assert!(results[0].message.contains("CP-404"));
    }

    #[test]
    fn test_ltv_watch_level_downgrades_to_warning() {
        let mut facility = sample_facility("FAC-103", "CP-001");
        facility.is_secured = true;
        facility.property_value = Some(Decimal::from(1_000_000));
        facility.loan_to_value = Some(Decimal::from(85));
        let mut snapshot = ValidationSnapshot::new();
        snapshot.facilities.push(facility);

        let results = PropertyLtvRule.evaluate(&snapshot).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ValidationStatus::Warning);
        assert_eq!(results[0].severity, RuleSeverity::Medium);
    }

    #[test]
    fn test_secured_without_collateral_fields_fails() {
        let mut facility = sample_facility("FAC-104", "CP-001");
        facility.is_secured = true;
        facility.property_value = None;
        facility.loan_to_value = None;
        let mut snapshot = ValidationSnapshot::new();
        snapshot.facilities.push(facility);

        let results = PropertyLtvRule.evaluate(&snapshot).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ValidationStatus::Fail);
    }

    #[test]
    fn test_restructured_pass_classification_fails() {
        let mut facility = sample_facility("FAC-105", "CP-001");
        facility.is_restructured = true;
        facility.risk_classification = RiskClassification::Pass;
        let mut snapshot = ValidationSnapshot::new();
        snapshot.facilities.push(facility);

        let results = RestructuredClassificationRule.evaluate(&snapshot).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ValidationStatus::Fail);
    }
}
