//! Rule runner
//!
//! Executes registered rules against an immutable snapshot. Every rule
//! runs inside an isolating boundary: a panic, error return or timeout
//! becomes one synthetic Critical Fail result for that rule and the
//! batch carries on. Rules are partitioned across a fixed worker pool
//! and the final result list is re-ordered by registry index, so the
//! output is identical whatever the worker count.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{bounded, unbounded, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::engine::cache::{TtlCache, DEFAULT_TTL};
use crate::engine::scorer::{build_summary, ValidationSummary};
use crate::engine::stats::RegistryStatistics;
use crate::error::EngineError;
use crate::models::ValidationSnapshot;
use crate::rules::{
    Rule, RuleCategory, RuleRegistry, RuleSeverity, RuleType, ValidationResult, ValidationStatus,
};

// ============================================================================
// Run configuration
// ============================================================================

/// Cooperative cancellation flag checked between rule boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Worker threads evaluating rules. 1 reproduces the reference
    /// system's synchronous single-pass behavior.
    pub workers: usize,
    /// Budget per rule before it is treated as a failed evaluation.
    pub rule_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            rule_timeout: Duration::from_secs(5),
        }
    }
}

impl RunOptions {
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            ..Self::default()
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct ValidationEngine {
    registry: RuleRegistry,
    options: RunOptions,
    cache: Mutex<TtlCache<String, Arc<ValidationSummary>>>,
}

impl ValidationEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self::with_options(registry, RunOptions::default())
    }

    pub fn with_options(registry: RuleRegistry, options: RunOptions) -> Self {
        Self {
            registry,
            options,
            cache: Mutex::new(TtlCache::new(DEFAULT_TTL)),
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Execute every registered rule and aggregate into a summary.
    pub fn run_all(&self, snapshot: Arc<ValidationSnapshot>) -> ValidationSummary {
        self.run_all_with_cancel(snapshot, &CancellationToken::new())
    }

    /// As `run_all`, but interruptible: once the token is cancelled no
    /// further rules start and the summary comes back flagged
    /// `incomplete` with totals over the rules that did run.
    pub fn run_all_with_cancel(
        &self,
        snapshot: Arc<ValidationSnapshot>,
        cancel: &CancellationToken,
    ) -> ValidationSummary {
        let started = Instant::now();
        let stamp = Utc::now();
        let rules: Vec<Arc<dyn Rule>> = self.registry.all().to_vec();
        let total_records = snapshot.total_records();
        info!(
            rules = rules.len(),
            records = total_records,
            workers = self.options.workers,
            "starting validation run"
        );

        let (mut results, evaluated, incomplete) = self.execute(&rules, snapshot, cancel);
        for result in &mut results {
            result.timestamp = stamp;
        }

        let summary = build_summary(
            results,
            &evaluated,
            total_records,
            incomplete,
            started.elapsed().as_millis() as u64,
            stamp,
        );
        info!(
            score = summary.overall_score,
            failed_rules = summary.failed_rules,
            incomplete = summary.incomplete,
            elapsed_ms = summary.execution_time_ms,
            "validation run complete"
        );
        summary
    }

    /// Cached variant of `run_all`, keyed by a caller-supplied dataset
    /// key (e.g. a hash of the snapshot generation timestamp). Hits
    /// return the previously computed summary without re-evaluating.
    pub fn run_all_cached(
        &self,
        cache_key: &str,
        snapshot: Arc<ValidationSnapshot>,
    ) -> Arc<ValidationSummary> {
        if let Some(hit) = self.lock_cache().get(&cache_key.to_string()) {
            debug!(cache_key, "validation cache hit");
            return hit;
        }
        let summary = Arc::new(self.run_all(snapshot));
        // Incomplete runs are not worth serving for five minutes.
        if !summary.incomplete {
            self.lock_cache().insert(cache_key.to_string(), summary.clone());
        }
        summary
    }

    /// Execute only the rules in one category, in registry order.
    pub fn run_by_category(
        &self,
        category: RuleCategory,
        snapshot: Arc<ValidationSnapshot>,
    ) -> Vec<ValidationResult> {
        self.run_filtered(self.registry.by_category(category), snapshot)
    }

    /// Execute only the rules of one type, in registry order.
    pub fn run_by_type(
        &self,
        rule_type: RuleType,
        snapshot: Arc<ValidationSnapshot>,
    ) -> Vec<ValidationResult> {
        self.run_filtered(self.registry.by_type(rule_type), snapshot)
    }

    /// Execute a single rule by id. An unknown id is reported as a
    /// synthetic Critical Fail naming the id, not raised to the caller.
    pub fn run_single(&self, rule_id: &str, snapshot: Arc<ValidationSnapshot>) -> Vec<ValidationResult> {
        match self.registry.by_id(rule_id) {
            Some(rule) => self.run_filtered(vec![rule], snapshot),
            None => {
                warn!(rule_id, "requested rule not found in registry");
                vec![unknown_rule_result(rule_id)]
            }
        }
    }

    /// Rule-set composition counts over the registry (not run results).
    pub fn statistics(&self) -> RegistryStatistics {
        RegistryStatistics::for_registry(&self.registry)
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> MutexGuard<'_, TtlCache<String, Arc<ValidationSummary>>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn run_filtered(
        &self,
        rules: Vec<Arc<dyn Rule>>,
        snapshot: Arc<ValidationSnapshot>,
    ) -> Vec<ValidationResult> {
        let stamp = Utc::now();
        let (mut results, _, _) = self.execute(&rules, snapshot, &CancellationToken::new());
        for result in &mut results {
            result.timestamp = stamp;
        }
        results
    }

    /// Fan rules out over the worker pool and collect results back in
    /// registry order. Returns the ordered results, the ids of rules
    /// that actually ran, and whether the run was cut short.
    fn execute(
        &self,
        rules: &[Arc<dyn Rule>],
        snapshot: Arc<ValidationSnapshot>,
        cancel: &CancellationToken,
    ) -> (Vec<ValidationResult>, Vec<String>, bool) {
        if rules.is_empty() {
            return (Vec::new(), Vec::new(), false);
        }
        let workers = self.options.workers.clamp(1, rules.len());
        let timeout = self.options.rule_timeout;

        let (task_tx, task_rx) = unbounded::<(usize, Arc<dyn Rule>)>();
        for (index, rule) in rules.iter().enumerate() {
            // receiver outlives all sends; an error here is unreachable
            let _ = task_tx.send((index, rule.clone()));
        }
        drop(task_tx);

        let (done_tx, done_rx) = unbounded::<(usize, Vec<ValidationResult>)>();
        thread::scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let done_tx = done_tx.clone();
                let snapshot = snapshot.clone();
                let cancel = cancel.clone();
                scope.spawn(move || {
                    while let Ok((index, rule)) = task_rx.recv() {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let results = evaluate_guarded(rule, snapshot.clone(), timeout);
                        if done_tx.send((index, results)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(done_tx);

        let mut collected: Vec<(usize, Vec<ValidationResult>)> = done_rx.try_iter().collect();
        collected.sort_by_key(|(index, _)| *index);

        let incomplete = collected.len() < rules.len();
        if incomplete {
            info!(
                completed = collected.len(),
                total = rules.len(),
                "validation run cancelled before completion"
            );
        }
        let evaluated: Vec<String> = collected
            .iter()
            .map(|(index, _)| rules[*index].id().to_string())
            .collect();
        let results = collected
            .into_iter()
            .flat_map(|(_, results)| results)
            .collect();
        (results, evaluated, incomplete)
    }
}

// ============================================================================
// Isolation boundary
// ============================================================================

/// Evaluate one rule on its own thread with a timeout. Panics, error
/// returns and timeouts all collapse to a single synthetic Critical
/// Fail; the engine never re-throws.
fn evaluate_guarded(
    rule: Arc<dyn Rule>,
    snapshot: Arc<ValidationSnapshot>,
    timeout: Duration,
) -> Vec<ValidationResult> {
    let started = Instant::now();
    let (results, substituted) = evaluate_guarded_inner(rule.clone(), snapshot, timeout);
    debug!(
        rule_id = rule.id(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        results = results.len(),
        substituted,
        "rule evaluated"
    );
    results
}

fn evaluate_guarded_inner(
    rule: Arc<dyn Rule>,
    snapshot: Arc<ValidationSnapshot>,
    timeout: Duration,
) -> (Vec<ValidationResult>, bool) {
    let rule_id = rule.id().to_string();
    let (tx, rx) = bounded(1);
    let evaluated_rule = rule.clone();
    let spawned = thread::Builder::new()
        .name(format!("rule-{rule_id}"))
        .spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| evaluated_rule.evaluate(&snapshot)));
            let _ = tx.send(outcome);
        });

    let handle = match spawned {
        Ok(handle) => handle,
        Err(err) => {
            warn!(rule_id, error = %err, "could not spawn rule evaluation thread");
            return (
                vec![synthetic_failure(
                    rule.as_ref(),
                    format!("Evaluation thread could not be spawned: {err}"),
                )],
                true,
            );
        }
    };

    match rx.recv_timeout(timeout) {
        Ok(Ok(Ok(results))) => {
            let _ = handle.join();
            (results, false)
        }
        Ok(Ok(Err(err))) => {
            let _ = handle.join();
            warn!(rule_id, error = %err, "rule returned an error; substituting synthetic failure");
            (vec![synthetic_failure(rule.as_ref(), err.to_string())], true)
        }
        Ok(Err(panic)) => {
            let _ = handle.join();
            let message = panic_message(panic);
            warn!(rule_id, message, "rule panicked; substituting synthetic failure");
            (
                vec![synthetic_failure(
                    rule.as_ref(),
                    format!("Rule panicked during evaluation: {message}"),
                )],
                true,
            )
        }
        Err(RecvTimeoutError::Timeout) => {
            // The runaway thread is left detached; its eventual result
            // is discarded because the channel is bounded and dropped.
            let err = EngineError::RuleTimeout {
                rule_id: rule_id.clone(),
                timeout_ms: timeout.as_millis() as u64,
            };
            warn!(rule_id, "rule timed out; substituting synthetic failure");
            (vec![synthetic_failure(rule.as_ref(), err.to_string())], true)
        }
        Err(RecvTimeoutError::Disconnected) => (
            vec![synthetic_failure(
                rule.as_ref(),
                "Evaluation thread exited without producing a result".to_string(),
            )],
            true,
        ),
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The substituted result for a rule whose evaluation failed outright:
/// Critical Fail, category and type copied from the rule.
fn synthetic_failure(rule: &dyn Rule, message: String) -> ValidationResult {
    ValidationResult {
        rule_id: rule.id().to_string(),
        status: ValidationStatus::Fail,
        severity: RuleSeverity::Critical,
        message: format!("Rule '{}' failed to evaluate: {message}", rule.id()),
        record_id: None,
        record_type: None,
        field_name: None,
        current_value: None,
        expected_value: None,
        category: rule.category(),
        rule_type: rule.rule_type(),
        timestamp: chrono::DateTime::<Utc>::MIN_UTC,
    }
}

/// Result substituted when `run_single` is asked for an id the
/// registry does not contain.
fn unknown_rule_result(rule_id: &str) -> ValidationResult {
    ValidationResult {
        rule_id: rule_id.to_string(),
        status: ValidationStatus::Fail,
        severity: RuleSeverity::Critical,
        message: format!("Rule '{rule_id}' not found in registry"),
        record_id: None,
        record_type: None,
        field_name: None,
        current_value: None,
        expected_value: None,
        category: RuleCategory::DataQuality,
        rule_type: RuleType::ScalarTypeCheck,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FindingSet;
    use crate::testing::clean_snapshot;

    struct PanickingRule;

    impl Rule for PanickingRule {
        fn id(&self) -> &str {
            "TEST-PANIC"
        }
        fn name(&self) -> &str {
            "Always panics"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Business
        }
        fn severity(&self) -> RuleSeverity {
            RuleSeverity::Low
        }
        fn rule_type(&self) -> RuleType {
            RuleType::BusinessLogic
        }
        fn description(&self) -> &str {
            "test rule that always panics"
        }
        fn evaluate(
            &self,
            _snapshot: &ValidationSnapshot,
        ) -> Result<Vec<ValidationResult>, EngineError> {
            panic!("intentional test panic")
        }
    }

    struct ErroringRule;

    impl Rule for ErroringRule {
        fn id(&self) -> &str {
            "TEST-ERR"
        }
        fn name(&self) -> &str {
            "Always errors"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Regulatory
        }
        fn severity(&self) -> RuleSeverity {
            RuleSeverity::Low
        }
        fn rule_type(&self) -> RuleType {
            RuleType::RegulatoryCompliance
        }
        fn description(&self) -> &str {
            "test rule that always errors"
        }
        fn evaluate(
            &self,
            _snapshot: &ValidationSnapshot,
        ) -> Result<Vec<ValidationResult>, EngineError> {
            Err(EngineError::execution("TEST-ERR", "deliberate failure"))
        }
    }

    struct SlowRule;

    impl Rule for SlowRule {
        fn id(&self) -> &str {
            "TEST-SLOW"
        }
        fn name(&self) -> &str {
            "Sleeps past the timeout"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Business
        }
        fn severity(&self) -> RuleSeverity {
            RuleSeverity::Low
        }
        fn rule_type(&self) -> RuleType {
            RuleType::BusinessLogic
        }
        fn description(&self) -> &str {
            "test rule that stalls"
        }
        fn evaluate(
            &self,
            _snapshot: &ValidationSnapshot,
        ) -> Result<Vec<ValidationResult>, EngineError> {
            thread::sleep(Duration::from_secs(30));
            Ok(Vec::new())
        }
    }

    struct PassingRule;

    impl Rule for PassingRule {
        fn id(&self) -> &str {
            "TEST-PASS"
        }
        fn name(&self) -> &str {
            "Always passes"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Business
        }
        fn severity(&self) -> RuleSeverity {
            RuleSeverity::Low
        }
        fn rule_type(&self) -> RuleType {
            RuleType::BusinessLogic
        }
        fn description(&self) -> &str {
            "test rule that always passes"
        }
        fn evaluate(
            &self,
            _snapshot: &ValidationSnapshot,
        ) -> Result<Vec<ValidationResult>, EngineError> {
            Ok(FindingSet::for_rule(self).finish())
        }
    }

    fn engine_with(rules: Vec<Arc<dyn Rule>>) -> ValidationEngine {
        let mut registry = RuleRegistry::new();
        for rule in rules {
            registry = registry.with_rule(rule);
        }
        ValidationEngine::with_options(registry, RunOptions::sequential())
    }

    #[test]
    fn test_panic_is_isolated() {
        let engine = engine_with(vec![Arc::new(PanickingRule), Arc::new(PassingRule)]);
        let summary = engine.run_all(Arc::new(clean_snapshot()));

        assert_eq!(summary.total_rules, 2);
        assert_eq!(summary.failed_rules, 1);
        assert_eq!(summary.passed_rules, 1);

        let broken = summary.results_for_rule("TEST-PANIC");
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].status, ValidationStatus::Fail);
        assert_eq!(broken[0].severity, RuleSeverity::Critical);
        assert!(broken[0].message.contains("intentional test panic"));
        // category and type come from the rule, not a fixed default
        assert_eq!(broken[0].category, RuleCategory::Business);
    }

    #[test]
    fn test_error_return_substituted() {
        let engine = engine_with(vec![Arc::new(ErroringRule)]);
        let summary = engine.run_all(Arc::new(clean_snapshot()));

        assert_eq!(summary.failed_rules, 1);
        let results = summary.results_for_rule("TEST-ERR");
        assert!(results[0].message.contains("deliberate failure"));
        assert_eq!(results[0].category, RuleCategory::Regulatory);
    }

    #[test]
    fn test_timeout_substituted() {
        let mut options = RunOptions::sequential();
        options.rule_timeout = Duration::from_millis(50);
        let registry = RuleRegistry::new()
            .with_rule(Arc::new(SlowRule) as Arc<dyn Rule>)
            .with_rule(Arc::new(PassingRule) as Arc<dyn Rule>);
        let engine = ValidationEngine::with_options(registry, options);

        let summary = engine.run_all(Arc::new(clean_snapshot()));
        assert_eq!(summary.failed_rules, 1);
        assert_eq!(summary.passed_rules, 1);
        let slow = summary.results_for_rule("TEST-SLOW");
        assert!(slow[0].message.contains("timed out"));
    }

    #[test]
    fn test_unknown_rule_id_reported_not_raised() {
        let engine = ValidationEngine::new(RuleRegistry::standard());
        let results = engine.run_single("BR-999", Arc::new(clean_snapshot()));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ValidationStatus::Fail);
        assert_eq!(results[0].severity, RuleSeverity::Critical);
        assert!(results[0].message.contains("BR-999"));
    }

    #[test]
    fn test_pre_cancelled_run_is_incomplete() {
        let engine = ValidationEngine::new(RuleRegistry::standard());
        let token = CancellationToken::new();
        token.cancel();

        let summary = engine.run_all_with_cancel(Arc::new(clean_snapshot()), &token);
        assert!(summary.incomplete);
        assert_eq!(summary.total_rules, 0);
        assert!(summary.results.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential_ordering() {
        let snapshot = Arc::new(clean_snapshot());
        let sequential =
            ValidationEngine::with_options(RuleRegistry::standard(), RunOptions::sequential());
        let parallel = ValidationEngine::with_options(
            RuleRegistry::standard(),
            RunOptions {
                workers: 4,
                ..RunOptions::default()
            },
        );

        let a = sequential.run_all(snapshot.clone());
        let b = parallel.run_all(snapshot);

        let ids_a: Vec<&str> = a.results.iter().map(|r| r.rule_id.as_str()).collect();
        let ids_b: Vec<&str> = b.results.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.overall_score, b.overall_score);
    }

    #[test]
    fn test_cache_round_trip() {
        let engine = ValidationEngine::new(RuleRegistry::standard());
        let snapshot = Arc::new(clean_snapshot());

        let first = engine.run_all_cached("dataset-v1", snapshot.clone());
        let second = engine.run_all_cached("dataset-v1", snapshot.clone());
        assert!(Arc::ptr_eq(&first, &second));

        engine.clear_cache();
        let third = engine.run_all_cached("dataset-v1", snapshot);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first.overall_score, third.overall_score);
    }
}
