//! Registry statistics for observability
//!
//! Counts over the registered rules themselves, not over any run's
//! results: dashboards use these to show rule-set composition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::RuleRegistry;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryStatistics {
    pub total_rules: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
}

impl RegistryStatistics {
    pub fn for_registry(registry: &RuleRegistry) -> Self {
        let mut stats = RegistryStatistics {
            total_rules: registry.len(),
            ..Default::default()
        };
        for rule in registry.all() {
            *stats
                .by_category
                .entry(rule.category().as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_type
                .entry(rule.rule_type().as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_severity
                .entry(rule.severity().as_str().to_string())
                .or_insert(0) += 1;
        }
        stats
    }
}
