//! One readiness pass over a cluster.
//!
//! A pass lists namespaces, drops those that already enforce a level,
//! runs the [`Detector`] over the rest and folds every outcome into a
//! fresh [`PodSecurityConditions`]. Per-namespace failures are logged and
//! counted; only listing and publishing can fail the pass itself.

use crate::classify::{classify, NamespaceCategory};
use crate::cluster::{ClientError, ClusterClient, ConditionPublisher, PodEvaluator};
use crate::conditions::{ConditionSet, PodSecurityConditions};
use crate::detect::{DetectError, Detection, Detector, EvaluationOutcome};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use psr_common::NamespaceRecord;
use psr_config::ControllerConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("failed to list namespaces: {0}")]
    ListNamespaces(#[source] ClientError),

    #[error("failed to publish conditions: {0}")]
    Publish(#[source] ClientError),
}

/// A namespace whose evaluation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceFailure {
    pub namespace: String,
    pub category: NamespaceCategory,
    pub error: String,
}

/// Summary of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub run_id: String,
    /// Namespaces returned by the listing.
    pub listed: usize,
    /// Namespaces skipped because they already enforce a level.
    pub skipped_enforcing: usize,
    pub evaluated: usize,
    pub violating: usize,
    pub inconclusive: usize,
    pub failures: Vec<NamespaceFailure>,
    /// Per-namespace results, sorted by namespace name.
    pub detections: Vec<Detection>,
    pub conditions: ConditionSet,
}

impl PassReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Keep namespaces that do not carry an enforce label yet.
pub fn select_non_enforcing(namespaces: Vec<NamespaceRecord>) -> (Vec<NamespaceRecord>, usize) {
    let total = namespaces.len();
    let selected: Vec<_> = namespaces.into_iter().filter(|ns| !ns.is_enforcing()).collect();
    let skipped = total - selected.len();
    (selected, skipped)
}

#[derive(Default)]
struct PassState {
    conditions: PodSecurityConditions,
    detections: Vec<Detection>,
    failures: Vec<NamespaceFailure>,
}

impl PassState {
    fn record(&mut self, ns: &NamespaceRecord, result: Result<Detection, DetectError>) {
        match result {
            Ok(detection) => {
                self.conditions
                    .record(detection.category, &detection.outcome, &detection.namespace);
                self.detections.push(detection);
            }
            Err(err) => self.failures.push(NamespaceFailure {
                namespace: ns.name().to_string(),
                category: classify(ns),
                error: err.to_string(),
            }),
        }
    }
}

/// Runs readiness passes with a fixed set of collaborators.
pub struct ReadinessController<'a> {
    client: &'a dyn ClusterClient,
    evaluator: &'a dyn PodEvaluator,
    config: &'a ControllerConfig,
    ctx: LogContext,
}

impl<'a> ReadinessController<'a> {
    pub fn new(
        client: &'a dyn ClusterClient,
        evaluator: &'a dyn PodEvaluator,
        config: &'a ControllerConfig,
        ctx: LogContext,
    ) -> Self {
        Self {
            client,
            evaluator,
            config,
            ctx,
        }
    }

    fn detector(&self) -> Detector<'a> {
        Detector::new(self.client, self.evaluator, &self.config.field_manager)
            .with_pod_security_version(&self.config.pod_security_version)
            .with_user_attribution(self.config.attribute_user_workloads)
    }

    /// Evaluate every non-enforcing namespace and render the conditions.
    pub fn evaluate(&self) -> Result<PassReport, ControllerError> {
        log_event!(
            self.ctx,
            INFO,
            event_names::PASS_STARTED,
            Stage::Init,
            "starting readiness pass",
            workers = self.config.workers
        );

        let namespaces = self
            .client
            .list_namespaces()
            .map_err(ControllerError::ListNamespaces)?;
        let listed = namespaces.len();
        for ns in namespaces.iter().filter(|ns| ns.is_enforcing()) {
            log_event!(
                self.ctx,
                DEBUG,
                event_names::NAMESPACE_SKIPPED,
                Stage::Resolve,
                "namespace already enforces a level",
                namespace = ns.name()
            );
        }
        let (namespaces, skipped_enforcing) = select_non_enforcing(namespaces);
        log_event!(
            self.ctx,
            DEBUG,
            event_names::NAMESPACES_LISTED,
            Stage::Resolve,
            "selected non-enforcing namespaces",
            listed = listed,
            selected = namespaces.len(),
            skipped = skipped_enforcing
        );

        let state = self.run_workers(&namespaces);

        let mut detections = state.detections;
        detections.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        let mut failures = state.failures;
        failures.sort_by(|a, b| a.namespace.cmp(&b.namespace));

        let conditions = state.conditions.render();
        let violating = detections.iter().filter(|d| d.outcome.is_violating()).count();
        let inconclusive = detections.iter().filter(|d| d.outcome.is_inconclusive()).count();
        log_event!(
            self.ctx,
            DEBUG,
            event_names::CONDITIONS_RENDERED,
            Stage::Aggregate,
            "rendered readiness conditions",
            firing = conditions.firing().count()
        );
        log_event!(
            self.ctx,
            INFO,
            event_names::PASS_FINISHED,
            Stage::Aggregate,
            "readiness pass finished",
            evaluated = namespaces.len(),
            violating = violating,
            inconclusive = inconclusive,
            failed = failures.len()
        );

        Ok(PassReport {
            run_id: self.ctx.run_id.clone(),
            listed,
            skipped_enforcing,
            evaluated: namespaces.len(),
            violating,
            inconclusive,
            failures,
            detections,
            conditions,
        })
    }

    /// Run a pass and publish its conditions.
    pub fn sync(&self, publisher: &dyn ConditionPublisher) -> Result<PassReport, ControllerError> {
        let report = self.evaluate()?;
        if let Err(err) = publisher.publish(&report.conditions) {
            log_event!(
                self.ctx,
                ERROR,
                event_names::PUBLISH_FAILED,
                Stage::Publish,
                "failed to publish conditions",
                error = tracing::field::display(&err)
            );
            return Err(ControllerError::Publish(err));
        }
        log_event!(
            self.ctx,
            INFO,
            event_names::CONDITIONS_PUBLISHED,
            Stage::Publish,
            "readiness conditions published"
        );
        Ok(report)
    }

    fn run_workers(&self, namespaces: &[NamespaceRecord]) -> PassState {
        let detector = self.detector();
        let workers = self.config.workers.clamp(1, namespaces.len().max(1));

        if workers == 1 {
            let mut state = PassState::default();
            for ns in namespaces {
                let result = self.evaluate_one(&detector, ns);
                state.record(ns, result);
            }
            return state;
        }

        let next = AtomicUsize::new(0);
        let state = Mutex::new(PassState::default());
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let idx = next.fetch_add(1, Ordering::Relaxed);
                    let Some(ns) = namespaces.get(idx) else {
                        break;
                    };
                    let result = self.evaluate_one(&detector, ns);
                    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
                    guard.record(ns, result);
                });
            }
        });
        state.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn evaluate_one(&self, detector: &Detector<'_>, ns: &NamespaceRecord) -> Result<Detection, DetectError> {
        let result = detector.inspect(ns);
        match &result {
            Ok(detection) => {
                let outcome = match detection.outcome {
                    EvaluationOutcome::NotViolating => "not_violating",
                    EvaluationOutcome::Violating(_) => "violating",
                    EvaluationOutcome::Inconclusive(_) => "inconclusive",
                };
                log_event!(
                    self.ctx,
                    DEBUG,
                    event_names::NAMESPACE_EVALUATED,
                    Stage::Simulate,
                    "namespace evaluated",
                    namespace = ns.name(),
                    category = detection.category.name(),
                    outcome = outcome
                );
            }
            Err(err @ DetectError::Internal { .. }) => {
                log_event!(
                    self.ctx,
                    ERROR,
                    event_names::INTERNAL_ERROR,
                    Stage::Attribute,
                    "namespace evaluation hit an internal error",
                    namespace = ns.name(),
                    error = tracing::field::display(&err)
                );
            }
            Err(err) => {
                log_event!(
                    self.ctx,
                    WARN,
                    event_names::NAMESPACE_FAILED,
                    Stage::Simulate,
                    "namespace evaluation failed",
                    namespace = ns.name(),
                    error = tracing::field::display(&err)
                );
            }
        }
        result
    }
}
