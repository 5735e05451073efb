//! Rule taxonomy, findings and the `Rule` trait
//!
//! A rule is an independently authored check over the entity-graph
//! snapshot. Rules are immutable once registered and carry their own
//! identity, category, severity and type so results authored by
//! different rules stay consistent in the aggregate taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::ValidationSnapshot;

pub mod business;
pub mod data_quality;
pub mod reconciliation;
pub mod registry;
pub mod regulatory;

pub use registry::RuleRegistry;

// ============================================================================
// Taxonomy
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    Business,
    DataQuality,
    Regulatory,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Business => "Business",
            RuleCategory::DataQuality => "DataQuality",
            RuleCategory::Regulatory => "Regulatory",
        }
    }
}

/// Critical > High > Medium > Low, uniform across all categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl RuleSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSeverity::Critical => "Critical",
            RuleSeverity::High => "High",
            RuleSeverity::Medium => "Medium",
            RuleSeverity::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleType {
    ScalarTypeCheck,
    BusinessLogic,
    CrossReference,
    RegulatoryCompliance,
    SubLedgerReconciliation,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::ScalarTypeCheck => "ScalarTypeCheck",
            RuleType::BusinessLogic => "BusinessLogic",
            RuleType::CrossReference => "CrossReference",
            RuleType::RegulatoryCompliance => "RegulatoryCompliance",
            RuleType::SubLedgerReconciliation => "SubLedgerReconciliation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationStatus {
    Pass,
    Fail,
    Warning,
}

// ============================================================================
// Validation results
// ============================================================================

/// One finding emitted by a rule. A rule that finds nothing wrong emits
/// exactly one `Pass` result; a rule that finds violations emits one
/// result per offending record and no `Pass`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub rule_id: String,
    pub status: ValidationStatus,
    /// Seeded from the rule; an individual finding may be downgraded.
    pub severity: RuleSeverity,
    pub message: String,
    pub record_id: Option<String>,
    pub record_type: Option<String>,
    pub field_name: Option<String>,
    pub current_value: Option<String>,
    pub expected_value: Option<String>,
    pub category: RuleCategory,
    pub rule_type: RuleType,
    /// Stamped uniformly by the runner at run start.
    pub timestamp: DateTime<Utc>,
}

impl ValidationResult {
    pub fn record(&mut self, id: impl Into<String>, record_type: &str) -> &mut Self {
        self.record_id = Some(id.into());
        self.record_type = Some(record_type.to_string());
        self
    }

    pub fn field(&mut self, name: &str) -> &mut Self {
        self.field_name = Some(name.to_string());
        self
    }

    pub fn observed(&mut self, current: impl Into<String>, expected: impl Into<String>) -> &mut Self {
        self.current_value = Some(current.into());
        self.expected_value = Some(expected.into());
        self
    }

    pub fn is_issue(&self) -> bool {
        matches!(self.status, ValidationStatus::Fail | ValidationStatus::Warning)
    }
}

// ============================================================================
// Rule trait
// ============================================================================

/// An independently authored validation rule. Implementations must be
/// pure over the snapshot: no mutation, no shared state, deterministic
/// output ordering.
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn category(&self) -> RuleCategory;
    fn severity(&self) -> RuleSeverity;
    fn rule_type(&self) -> RuleType;
    fn description(&self) -> &str;

    fn evaluate(&self, snapshot: &ValidationSnapshot) -> Result<Vec<ValidationResult>, EngineError>;
}

/// Declares a rule's identity and taxonomy in one place; the rule body
/// lives in an inherent `check` method on the same type.
macro_rules! declare_rule {
    ($ty:ident, $id:literal, $name:literal, $category:ident, $severity:ident, $rule_type:ident, $desc:literal) => {
        pub struct $ty;

        impl $crate::rules::Rule for $ty {
            fn id(&self) -> &str {
                $id
            }
            fn name(&self) -> &str {
                $name
            }
            fn category(&self) -> $crate::rules::RuleCategory {
                $crate::rules::RuleCategory::$category
            }
            fn severity(&self) -> $crate::rules::RuleSeverity {
                $crate::rules::RuleSeverity::$severity
            }
            fn rule_type(&self) -> $crate::rules::RuleType {
                $crate::rules::RuleType::$rule_type
            }
            fn description(&self) -> &str {
                $desc
            }
            fn evaluate(
                &self,
                snapshot: &$crate::models::ValidationSnapshot,
            ) -> Result<Vec<$crate::rules::ValidationResult>, $crate::error::EngineError> {
                self.check(snapshot)
            }
        }
    };
}
pub(crate) use declare_rule;

// ============================================================================
// Finding accumulator
// ============================================================================

/// Accumulates per-record findings for one rule and enforces the
/// pass-singleton contract in `finish`.
pub struct FindingSet {
    rule_id: String,
    rule_name: String,
    category: RuleCategory,
    rule_type: RuleType,
    severity: RuleSeverity,
    results: Vec<ValidationResult>,
}

impl FindingSet {
    pub fn for_rule(rule: &dyn Rule) -> Self {
        Self {
            rule_id: rule.id().to_string(),
            rule_name: rule.name().to_string(),
            category: rule.category(),
            rule_type: rule.rule_type(),
            severity: rule.severity(),
            results: Vec::new(),
        }
    }

    fn push(
        &mut self,
        status: ValidationStatus,
        severity: RuleSeverity,
        message: String,
    ) -> &mut ValidationResult {
        self.results.push(ValidationResult {
            rule_id: self.rule_id.clone(),
            status,
            severity,
            message,
            record_id: None,
            record_type: None,
            field_name: None,
            current_value: None,
            expected_value: None,
            category: self.category,
            rule_type: self.rule_type,
            timestamp: DateTime::<Utc>::MIN_UTC,
        });
        let last = self.results.len() - 1;
        &mut self.results[last]
    }

    /// Record a failing finding at the rule's own severity.
    pub fn fail(&mut self, message: impl Into<String>) -> &mut ValidationResult {
        let severity = self.severity;
        self.push(ValidationStatus::Fail, severity, message.into())
    }

    /// Record a warning, optionally downgraded below the rule severity.
    pub fn warn(&mut self, severity: RuleSeverity, message: impl Into<String>) -> &mut ValidationResult {
        self.push(ValidationStatus::Warning, severity, message.into())
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Zero findings collapse to a single Pass result; otherwise the
    /// findings are returned as-is, never alongside a Pass.
    pub fn finish(mut self) -> Vec<ValidationResult> {
        if self.results.is_empty() {
            let message = format!("{}: all records passed", self.rule_name);
            let severity = self.severity;
            self.push(ValidationStatus::Pass, severity, message);
        }
        self.results
    }
}
