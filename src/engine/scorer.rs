//! Aggregation of raw results into a validation summary
//!
//! Scoring convention: the overall score and the passed/failed/warning
//! counters are all per rule id — a rule passes only when none of its
//! results for the run are Fail or Warning, fails when it has at least
//! one Fail, and warns otherwise. Category sub-scores deliberately stay
//! per individual result, matching the drill-down granularity the
//! report dashboards expect.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::{RuleCategory, RuleSeverity, ValidationResult, ValidationStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: RuleCategory,
    pub total_results: usize,
    pub passed_results: usize,
    /// `100 * passed_results / total_results`, over individual results.
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Rules evaluated in this run (registry size for a full run).
    pub total_rules: usize,
    pub total_records: usize,
    pub passed_rules: usize,
    pub failed_rules: usize,
    pub warning_rules: usize,
    pub critical_issues: usize,
    pub high_issues: usize,
    pub medium_issues: usize,
    pub low_issues: usize,
    /// `100 * passed_rules / total_rules`, defined as 100 when no rules ran.
    pub overall_score: f64,
    pub category_scores: Vec<CategoryScore>,
    pub results: Vec<ValidationResult>,
    /// Set when the run was cancelled between rule boundaries.
    pub incomplete: bool,
    pub execution_time_ms: u64,
    pub last_run: DateTime<Utc>,
}

impl ValidationSummary {
    /// Findings feeding a specific report line.
    pub fn results_for_rule(&self, rule_id: &str) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| r.rule_id == rule_id).collect()
    }

    /// A specific entity's compliance history within this run.
    pub fn results_for_record(&self, record_id: &str) -> Vec<&ValidationResult> {
        self.results
            .iter()
            .filter(|r| r.record_id.as_deref() == Some(record_id))
            .collect()
    }
}

/// Per-rule outcome rollup used while aggregating.
#[derive(Default)]
struct RuleOutcome {
    has_fail: bool,
    has_warning: bool,
}

pub(crate) fn build_summary(
    results: Vec<ValidationResult>,
    evaluated_rule_ids: &[String],
    total_records: usize,
    incomplete: bool,
    execution_time_ms: u64,
    last_run: DateTime<Utc>,
) -> ValidationSummary {
    let mut outcomes: HashMap<&str, RuleOutcome> = HashMap::new();
    for id in evaluated_rule_ids {
        outcomes.entry(id.as_str()).or_default();
    }
    for result in &results {
        let outcome = outcomes.entry(result.rule_id.as_str()).or_default();
        match result.status {
            ValidationStatus::Fail => outcome.has_fail = true,
            ValidationStatus::Warning => outcome.has_warning = true,
            ValidationStatus::Pass => {}
        }
    }

    let total_rules = outcomes.len();
    let failed_rules = outcomes.values().filter(|o| o.has_fail).count();
    let warning_rules = outcomes
        .values()
        .filter(|o| !o.has_fail && o.has_warning)
        .count();
    let passed_rules = total_rules - failed_rules - warning_rules;

    let overall_score = if total_rules == 0 {
        100.0
    } else {
        (100.0 * passed_rules as f64 / total_rules as f64).clamp(0.0, 100.0)
    };

    let mut per_category: BTreeMap<RuleCategory, (usize, usize)> = BTreeMap::new();
    for result in &results {
        let entry = per_category.entry(result.category).or_insert((0, 0));
        entry.0 += 1;
        if result.status == ValidationStatus::Pass {
            entry.1 += 1;
        }
    }
    let category_scores = per_category
        .into_iter()
        .map(|(category, (total, passed))| CategoryScore {
            category,
            total_results: total,
            passed_results: passed,
            score: (100.0 * passed as f64 / total as f64).clamp(0.0, 100.0),
        })
        .collect();

    let mut critical_issues = 0;
    let mut high_issues = 0;
    let mut medium_issues = 0;
    let mut low_issues = 0;
    for result in results
        .iter()
        .filter(|r| r.status == ValidationStatus::Fail)
    {
        match result.severity {
            RuleSeverity::Critical => critical_issues += 1,
            RuleSeverity::High => high_issues += 1,
            RuleSeverity::Medium => medium_issues += 1,
            RuleSeverity::Low => low_issues += 1,
        }
    }

    ValidationSummary {
        total_rules,
        total_records,
        passed_rules,
        failed_rules,
        warning_rules,
        critical_issues,
        high_issues,
        medium_issues,
        low_issues,
        overall_score,
        category_scores,
        results,
        incomplete,
        execution_time_ms,
        last_run,
    }
}
