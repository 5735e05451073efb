//! Regulatory-compliance rules
//!
//! Checks lifted from the sectoral and credit-risk reporting
//! requirements: mandatory industry classification, minimum
//! provisioning for impaired exposures, related-party concentration
//! and intercompany transaction matching. Several of these read more
//! than one entity collection from the snapshot at once.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::models::{RiskClassification, ValidationSnapshot};
use crate::rules::{declare_rule, FindingSet, Rule, RuleSeverity, ValidationResult};
use crate::validators;

declare_rule!(
    MandatorySsicRule,
    "RG-001",
    "Mandatory SSIC for corporates",
    Regulatory,
    High,
    RegulatoryCompliance,
    "Non-financial corporates must carry a valid 5-digit SSIC sector code"
);

impl MandatorySsicRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for cp in &snapshot.counterparties {
            if cp.entity_type != "Non-financial Corporates" {
                continue;
            }
            match &cp.sector_code {
                Some(code) if validators::is_valid_sector_code(code) => {}
                Some(code) => {
                    findings
                        .fail("Non-financial corporate carries a malformed SSIC code")
                        .record(&cp.id, "Counterparty")
                        .field("sector_code")
                        .observed(code.clone(), "5-digit SSIC code");
                }
                None => {
                    findings
                        .fail("Non-financial corporate is missing its SSIC sector code")
                        .record(&cp.id, "Counterparty")
                        .field("sector_code")
                        .observed("null", "5-digit SSIC code");
                }
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    Stage3AllowanceRule,
    "RG-002",
    "Stage 3 minimum provisioning",
    Regulatory,
    Critical,
    RegulatoryCompliance,
    "Impaired facilities must hold at least the minimum loss allowance for their grading"
);

impl Stage3AllowanceRule {
    /// Minimum allowance as a percentage of outstanding, by grading.
    fn minimum_coverage(classification: RiskClassification) -> Option<Decimal> {
        match classification {
            RiskClassification::Substandard => Some(Decimal::from(10)),
            RiskClassification::Doubtful => Some(Decimal::from(50)),
            RiskClassification::Loss => Some(Decimal::from(100)),
            RiskClassification::Pass | RiskClassification::SpecialMention => None,
        }
    }

    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for facility in &snapshot.facilities {
            let Some(pct) = Self::minimum_coverage(facility.risk_classification) else {
                continue;
            };
            let required = facility.outstanding_amount * pct / Decimal::from(100);
            if facility.loss_allowance < required {
                findings
                    .fail(format!(
                        "{} facility holds allowance {} against a minimum of {}",
                        facility.risk_classification.as_str(),
                        facility.loss_allowance,
                        required
                    ))
                    .record(&facility.id, "Facility")
                    .field("loss_allowance")
                    .observed(facility.loss_allowance.to_string(), format!(">= {required}"));
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    RelatedPartyExposureRule,
    "RG-003",
    "Related-party exposure concentration",
    Regulatory,
    High,
    RegulatoryCompliance,
    "Aggregate exposure to any related party must stay within 10% of the total book"
);

impl RelatedPartyExposureRule {
    fn concentration_limit_pct() -> Decimal {
        Decimal::from(10)
    }

    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);

        let total_book: Decimal = snapshot
            .facilities
            .iter()
            .map(|f| f.outstanding_amount)
            .sum();
        if total_book <= Decimal::ZERO {
            return Ok(findings.finish());
        }

        let mut exposure_by_counterparty: HashMap<&str, Decimal> = HashMap::new();
        for facility in &snapshot.facilities {
            *exposure_by_counterparty
                .entry(facility.counterparty_id.as_str())
                .or_insert_with(Decimal::default) += facility.outstanding_amount;
        }

        let limit = total_book * Self::concentration_limit_pct() / Decimal::from(100);
        for cp in snapshot.counterparties.iter().filter(|c| c.is_related_party) {
            let exposure = exposure_by_counterparty
                .get(cp.id.as_str())
                .copied()
                .unwrap_or_default();
            if exposure > limit {
                findings
                    .fail(format!(
                        "Related party '{}' holds {} of a {} book (limit {})",
                        cp.id, exposure, total_book, limit
                    ))
                    .record(&cp.id, "Counterparty")
                    .field("outstanding_amount")
                    .observed(exposure.to_string(), format!("<= {limit}"));
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    IntercompanyMatchingRule,
    "RG-004",
    "Intercompany transaction matching",
    Regulatory,
    High,
    RegulatoryCompliance,
    "Intercompany GL transactions must carry an entity code and a mirror leg in another entity"
);

impl IntercompanyMatchingRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);

        // Group intercompany legs by (currency, amount); a leg is
        // matched when another entity booked the same movement.
        let mut legs: HashMap<(&str, Decimal), Vec<&str>> = HashMap::new();
        for txn in snapshot.transactions.iter().filter(|t| t.is_intercompany) {
            legs.entry((txn.currency.as_str(), txn.amount))
                .or_default()
                .push(txn.entity_code.as_str());
        }

        for txn in snapshot.transactions.iter().filter(|t| t.is_intercompany) {
            if txn.entity_code.trim().is_empty() {
                findings
                    .fail("Intercompany transaction is missing its entity code")
                    .record(&txn.id, "GlTransaction")
                    .field("entity_code");
                continue;
            }
            let matched = legs
                .get(&(txn.currency.as_str(), txn.amount))
                .map(|codes| codes.iter().any(|code| *code != txn.entity_code))
                .unwrap_or(false);
            if !matched {
                findings
                    .fail(format!(
                        "Intercompany transaction has no mirror leg for {} {}",
                        txn.amount, txn.currency
                    ))
                    .record(&txn.id, "GlTransaction")
                    .field("entity_code")
                    .observed(
                        txn.entity_code.clone(),
                        "matching leg booked by another entity",
                    );
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    DerivativeFairValueRule,
    "RG-006",
    "Derivative fair-value sanity",
    Regulatory,
    Medium,
    RegulatoryCompliance,
    "Derivative notionals must be positive and fair values reported as non-negative magnitudes"
);

impl DerivativeFairValueRule {
    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for derivative in &snapshot.derivatives {
            if derivative.notional_amount <= Decimal::ZERO {
                findings
                    .fail("Derivative notional must be positive")
                    .record(&derivative.trade_id, "Derivative")
                    .field("notional_amount")
                    .observed(derivative.notional_amount.to_string(), "> 0");
            }
            // Fair values are reported as magnitudes on both sides.
            for (field, value) in [
                ("positive_fair_value", derivative.positive_fair_value),
                ("negative_fair_value", derivative.negative_fair_value),
            ] {
                if value < Decimal::ZERO {
                    findings
                        .fail(format!("{field} reported below zero"))
                        .record(&derivative.trade_id, "Derivative")
                        .field(field)
                        .observed(value.to_string(), ">= 0");
                }
            }
        }
        Ok(findings.finish())
    }
}

declare_rule!(
    SmeSegmentRule,
    "RG-005",
    "SME flag and segment consistency",
    Regulatory,
    Medium,
    RegulatoryCompliance,
    "The SME flag must agree with the counterparty's reporting segment"
);

impl SmeSegmentRule {
    const SME_SEGMENTS: &'static [&'static str] = &["SME", "Small Business"];

    fn check(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError> {
        let mut findings = FindingSet::for_rule(self);
        for cp in &snapshot.counterparties {
            let segment_is_sme = Self::SME_SEGMENTS.contains(&cp.segment.as_str());
            if cp.is_sme != segment_is_sme {
                findings
                    .warn(
                        RuleSeverity::Medium,
                        format!(
                            "SME flag {} disagrees with segment '{}'",
                            cp.is_sme, cp.segment
                        ),
                    )
                    .record(&cp.id, "Counterparty")
                    .field("segment")
                    .observed(cp.segment.clone(), "segment consistent with SME flag");
            }
        }
        Ok(findings.finish())
    }
}
