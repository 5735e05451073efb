//! # regval
//!
//! Rule-based data-quality and regulatory-compliance validation for a
//! banking general ledger. A [`rules::RuleRegistry`] holds independently
//! authored checks over an immutable [`models::ValidationSnapshot`]; the
//! [`engine::ValidationEngine`] executes them with per-rule isolation
//! and aggregates the findings into a scored
//! [`engine::ValidationSummary`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use regval::engine::ValidationEngine;
//! use regval::rules::RuleRegistry;
//! use regval::testing::clean_snapshot;
//!
//! let engine = ValidationEngine::new(RuleRegistry::standard());
//! let summary = engine.run_all(Arc::new(clean_snapshot()));
//!
//! assert_eq!(summary.overall_score, 100.0);
//! assert_eq!(summary.failed_rules, 0);
//! ```

pub mod engine;
pub mod error;
pub mod models;
pub mod rules;
pub mod testing;
pub mod validators;

pub use engine::{ValidationEngine, ValidationSummary};
pub use error::{EngineError, EngineResult};
pub use models::ValidationSnapshot;
pub use rules::{
    Rule, RuleCategory, RuleRegistry, RuleSeverity, RuleType, ValidationResult, ValidationStatus,
};
