//! Rule registry
//!
//! A flat, ordered collection of rules built once at engine
//! construction. There is no ambient global rule list: mutating
//! operations return an updated registry value, so tests never leak
//! rules into each other.

use std::sync::Arc;

use super::business::{
    DerivativeCounterpartyReferenceRule, FacilityCounterpartyReferenceRule, FacilityLimitRule,
    MaturityOrderingRule, PropertyLtvRule, RestructuredClassificationRule,
};
use super::data_quality::{
    AmountPrecisionRule, CurrencyCodeRule, DuplicateIdentifierRule, LeiFormatRule,
    MandatoryCounterpartyFieldsRule, SectorCodeFormatRule, TransactionDateRule,
};
use super::reconciliation::{JournalBalanceRule, LedgerEquationRule, SubLedgerReconciliationRule};
use super::regulatory::{
    DerivativeFairValueRule, IntercompanyMatchingRule, MandatorySsicRule,
    RelatedPartyExposureRule, SmeSegmentRule, Stage3AllowanceRule,
};
use super::{Rule, RuleCategory, RuleType};

#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Empty registry, for tests and bespoke rule sets.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The full production rule set, in stable execution order.
    pub fn standard() -> Self {
        let rules: Vec<Arc<dyn Rule>> = vec![
            // Data quality
            Arc::new(MandatoryCounterpartyFieldsRule),
            Arc::new(DuplicateIdentifierRule),
            Arc::new(CurrencyCodeRule),
            Arc::new(AmountPrecisionRule),
            Arc::new(TransactionDateRule),
            Arc::new(LeiFormatRule),
            Arc::new(SectorCodeFormatRule),
            // Business logic
            Arc::new(FacilityLimitRule),
            Arc::new(FacilityCounterpartyReferenceRule),
            Arc::new(DerivativeCounterpartyReferenceRule),
            Arc::new(MaturityOrderingRule),
            Arc::new(PropertyLtvRule),
            Arc::new(RestructuredClassificationRule),
            // Regulatory compliance
            Arc::new(MandatorySsicRule),
            Arc::new(Stage3AllowanceRule),
            Arc::new(RelatedPartyExposureRule),
            Arc::new(IntercompanyMatchingRule),
            Arc::new(SmeSegmentRule),
            Arc::new(DerivativeFairValueRule),
            // Reconciliation
            Arc::new(SubLedgerReconciliationRule),
            Arc::new(JournalBalanceRule),
            Arc::new(LedgerEquationRule),
        ];
        Self { rules }
    }

    /// Returns a registry with the rule appended. A rule with the same
    /// id replaces the existing one in place, preserving order.
    pub fn with_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        match self.rules.iter().position(|r| r.id() == rule.id()) {
            Some(index) => self.rules[index] = rule,
            None => self.rules.push(rule),
        }
        self
    }

    /// Returns a registry without the named rule. Removing an unknown
    /// id is a no-op; `by_id` is the reportable lookup path.
    pub fn without_rule(mut self, rule_id: &str) -> Self {
        self.rules.retain(|r| r.id() != rule_id);
        self
    }

    pub fn all(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn by_category(&self, category: RuleCategory) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.category() == category)
            .cloned()
            .collect()
    }

    pub fn by_type(&self, rule_type: RuleType) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.rule_type() == rule_type)
            .cloned()
            .collect()
    }

    pub fn by_id(&self, rule_id: &str) -> Option<Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.id() == rule_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_registry_ids_unique() {
        let registry = RuleRegistry::standard();
        let ids: HashSet<&str> = registry.all().iter().map(|r| r.id()).collect();
        assert_eq!(ids.len(), registry.len());
        assert!(registry.len() >= 20);
    }

    #[test]
    fn test_lookup_by_id() {
        let registry = RuleRegistry::standard();
        assert!(registry.by_id("BR-001").is_some());
        assert!(registry.by_id("BR-999").is_none());
    }

    #[test]
    fn test_filters_cover_registry() {
        let registry = RuleRegistry::standard();
        let by_category: usize = [
            RuleCategory::Business,
            RuleCategory::DataQuality,
            RuleCategory::Regulatory,
        ]
        .iter()
        .map(|c| registry.by_category(*c).len())
        .sum();
        assert_eq!(by_category, registry.len());

        assert!(!registry.by_type(RuleType::SubLedgerReconciliation).is_empty());
    }

    #[test]
    fn test_without_rule_returns_new_value() {
        let registry = RuleRegistry::standard();
        let original_len = registry.len();
        let trimmed = registry.clone().without_rule("BR-001");
        assert_eq!(trimmed.len(), original_len - 1);
        assert!(trimmed.by_id("BR-001").is_none());
        // original untouched
        assert!(registry.by_id("BR-001").is_some());
    }
}
