//! Violation detection for a single namespace.
//!
//! The detector resolves the level to simulate, performs a dry-run apply of
//! the enforce label, and reads the admission warnings back out of a
//! [`WarningSink`] created for that one call. When warnings come back and
//! the namespace belongs to a customer, the pods admitted under a user SCC
//! are re-evaluated to decide who owns the violation.

use crate::classify::{classify, NamespaceCategory};
use crate::cluster::{ClientError, ClusterClient, DryRunRequest, PodEvaluator};
use crate::resolve::{resolve, ResolveError, ResolvedLevel};
use crate::warnings::WarningSink;
use psr_common::labels::ENFORCE_LEVEL_LABEL;
use psr_common::{LevelVersion, NamespaceRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Who is responsible for a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribution {
    /// At least one pod admitted under a user SCC fails the level.
    UserWorkload,
    /// Only operator or service account workloads fail.
    OperatorWorkload,
    /// Not attributed: non-customer namespace, or attribution switched off.
    Unknown,
}

/// Why a namespace could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InconclusiveReason {
    /// No annotation and no usable warn or audit label.
    NoSignal,
}

/// Result of evaluating one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict", content = "detail")]
pub enum EvaluationOutcome {
    NotViolating,
    Violating(Attribution),
    Inconclusive(InconclusiveReason),
}

impl EvaluationOutcome {
    pub fn is_violating(&self) -> bool {
        matches!(self, EvaluationOutcome::Violating(_))
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, EvaluationOutcome::Inconclusive(_))
    }
}

impl From<ResolveError> for EvaluationOutcome {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoSignal => EvaluationOutcome::Inconclusive(InconclusiveReason::NoSignal),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DetectError {
    #[error(transparent)]
    Collaborator(#[from] ClientError),

    #[error("namespace {namespace:?}: {message}")]
    Internal { namespace: String, message: String },
}

impl DetectError {
    fn internal(namespace: &str, message: impl Into<String>) -> Self {
        DetectError::Internal {
            namespace: namespace.to_string(),
            message: message.into(),
        }
    }
}

/// Everything learned about one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub namespace: String,
    pub category: NamespaceCategory,
    /// Enforce label value that was simulated, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub outcome: EvaluationOutcome,
    /// Admission warnings returned by the dry run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Runs the dry-run simulation for namespaces.
pub struct Detector<'a> {
    client: &'a dyn ClusterClient,
    evaluator: &'a dyn PodEvaluator,
    field_manager: &'a str,
    pod_security_version: &'a str,
    attribute_user_workloads: bool,
}

impl<'a> Detector<'a> {
    pub fn new(
        client: &'a dyn ClusterClient,
        evaluator: &'a dyn PodEvaluator,
        field_manager: &'a str,
    ) -> Self {
        Self {
            client,
            evaluator,
            field_manager,
            pod_security_version: psr_common::level::LATEST_VERSION,
            attribute_user_workloads: true,
        }
    }

    pub fn with_pod_security_version(mut self, version: &'a str) -> Self {
        self.pod_security_version = version;
        self
    }

    pub fn with_user_attribution(mut self, enabled: bool) -> Self {
        self.attribute_user_workloads = enabled;
        self
    }

    /// Evaluate `ns` and return its outcome.
    pub fn detect(&self, ns: &NamespaceRecord) -> Result<EvaluationOutcome, DetectError> {
        self.inspect(ns).map(|detection| detection.outcome)
    }

    /// Evaluate `ns` and keep the intermediate results.
    pub fn inspect(&self, ns: &NamespaceRecord) -> Result<Detection, DetectError> {
        let category = classify(ns);
        let mut detection = Detection {
            namespace: ns.name().to_string(),
            category,
            level: None,
            outcome: EvaluationOutcome::NotViolating,
            warnings: Vec::new(),
        };

        let resolved = match resolve(ns) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::debug!(namespace = ns.name(), %category, error = %err, "namespace is inconclusive");
                detection.outcome = err.into();
                return Ok(detection);
            }
        };
        detection.level = Some(resolved.value.clone());

        detection.warnings = self.simulate(ns.name(), &resolved)?;
        if detection.warnings.is_empty() {
            return Ok(detection);
        }

        let attribution = self.attribute(ns.name(), category, &resolved)?;
        tracing::debug!(
            namespace = ns.name(),
            %category,
            level = %resolved.value,
            warnings = detection.warnings.len(),
            ?attribution,
            "namespace would violate enforcement"
        );
        detection.outcome = EvaluationOutcome::Violating(attribution);
        Ok(detection)
    }

    /// Dry-run the enforce label and return the warnings it produced.
    fn simulate(&self, namespace: &str, resolved: &ResolvedLevel) -> Result<Vec<String>, DetectError> {
        let mut labels = BTreeMap::new();
        labels.insert(ENFORCE_LEVEL_LABEL.to_string(), resolved.value.clone());
        let request = DryRunRequest {
            namespace,
            labels,
            field_manager: self.field_manager,
        };

        let mut sink = WarningSink::new();
        let result = self.client.dry_run_apply(&request, &mut sink);
        let warnings = sink.drain();
        result?;
        Ok(warnings)
    }

    fn attribute(
        &self,
        namespace: &str,
        category: NamespaceCategory,
        resolved: &ResolvedLevel,
    ) -> Result<Attribution, DetectError> {
        if !category.allows_user_attribution() || !self.attribute_user_workloads {
            return Ok(Attribution::Unknown);
        }

        let level = resolved
            .level()
            .map_err(|err| DetectError::internal(namespace, err.to_string()))?;
        let level = LevelVersion::new(level, self.pod_security_version);

        for pod in self.client.list_pods(namespace)? {
            if pod.metadata.namespace.as_deref().is_some_and(|pod_ns| pod_ns != namespace) {
                return Err(DetectError::internal(
                    namespace,
                    format!(
                        "pod {:?} listed from namespace {:?}",
                        pod.name(),
                        pod.metadata.namespace.as_deref().unwrap_or_default()
                    ),
                ));
            }
            if !pod.runs_as_user_subject() {
                continue;
            }
            let results = self
                .evaluator
                .evaluate_pod(&level, &pod.metadata, &pod.spec);
            if results.iter().any(|result| !result.allowed) {
                tracing::debug!(namespace, pod = pod.name(), "user workload violates level");
                return Ok(Attribution::UserWorkload);
            }
        }
        Ok(Attribution::OperatorWorkload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::DefaultChecks;
    use crate::cluster::CheckResult;
    use psr_common::labels::{
        MINIMALLY_SUFFICIENT_ANNOTATION, USER_SUBJECT_TYPE, VALIDATED_SCC_SUBJECT_TYPE_ANNOTATION,
        WARN_LEVEL_LABEL,
    };
    use psr_common::{ObjectMeta, PodRecord, PodSpec};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCluster {
        warnings: Vec<String>,
        pods: Vec<PodRecord>,
        fail_dry_run: bool,
        requests: Mutex<Vec<(String, BTreeMap<String, String>, String)>>,
        pod_lists: AtomicUsize,
    }

    impl ClusterClient for FakeCluster {
        fn list_namespaces(&self) -> Result<Vec<NamespaceRecord>, ClientError> {
            Ok(Vec::new())
        }

        fn dry_run_apply(
            &self,
            request: &DryRunRequest<'_>,
            sink: &mut WarningSink,
        ) -> Result<(), ClientError> {
            self.requests.lock().unwrap().push((
                request.namespace.to_string(),
                request.labels.clone(),
                request.field_manager.to_string(),
            ));
            if self.fail_dry_run {
                return Err(ClientError::request("dry-run apply", request.namespace, "forbidden"));
            }
            for warning in &self.warnings {
                sink.push(warning.clone());
            }
            Ok(())
        }

        fn list_pods(&self, _namespace: &str) -> Result<Vec<PodRecord>, ClientError> {
            self.pod_lists.fetch_add(1, Ordering::SeqCst);
            Ok(self.pods.clone())
        }
    }

    /// Fails every pod whose name starts with `bad`.
    struct NameEvaluator;

    impl PodEvaluator for NameEvaluator {
        fn evaluate_pod(&self, _: &LevelVersion, metadata: &ObjectMeta, _: &PodSpec) -> Vec<CheckResult> {
            if metadata.name.starts_with("bad") {
                vec![CheckResult::forbidden("runAsNonRoot != true", "pod")]
            } else {
                vec![CheckResult::allowed()]
            }
        }
    }

    fn customer_ns() -> NamespaceRecord {
        NamespaceRecord::new("team-a").with_label(WARN_LEVEL_LABEL, "restricted")
    }

    fn user_pod(name: &str) -> PodRecord {
        PodRecord::new("team-a", name)
            .with_annotation(VALIDATED_SCC_SUBJECT_TYPE_ANNOTATION, USER_SUBJECT_TYPE)
    }

    fn violating() -> Vec<String> {
        vec!["existing pods in namespace \"team-a\" violate the new PodSecurity enforce level \"restricted:latest\"".to_string()]
    }

    #[test]
    fn test_no_warnings_is_not_violating() {
        let cluster = FakeCluster::default();
        let detector = Detector::new(&cluster, &NameEvaluator, "test-manager");
        assert_eq!(detector.detect(&customer_ns()).unwrap(), EvaluationOutcome::NotViolating);

        let requests = cluster.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "team-a");
        assert_eq!(requests[0].1.get(ENFORCE_LEVEL_LABEL).map(String::as_str), Some("restricted"));
        assert_eq!(requests[0].2, "test-manager");
    }

    #[test]
    fn test_warnings_without_user_pods_is_operator_workload() {
        let cluster = FakeCluster {
            warnings: violating(),
            pods: vec![PodRecord::new("team-a", "bad-operator-pod")],
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        assert_eq!(
            detector.detect(&customer_ns()).unwrap(),
            EvaluationOutcome::Violating(Attribution::OperatorWorkload)
        );
    }

    #[test]
    fn test_failing_user_pod_is_user_workload() {
        let cluster = FakeCluster {
            warnings: violating(),
            pods: vec![user_pod("good"), user_pod("bad-user")],
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        assert_eq!(
            detector.detect(&customer_ns()).unwrap(),
            EvaluationOutcome::Violating(Attribution::UserWorkload)
        );
    }

    #[test]
    fn test_passing_user_pods_is_operator_workload() {
        let cluster = FakeCluster {
            warnings: violating(),
            pods: vec![user_pod("good")],
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        assert_eq!(
            detector.detect(&customer_ns()).unwrap(),
            EvaluationOutcome::Violating(Attribution::OperatorWorkload)
        );
    }

    #[test]
    fn test_no_signal_skips_dry_run() {
        let cluster = FakeCluster::default();
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        let detection = detector.inspect(&NamespaceRecord::new("team-b")).unwrap();

        assert_eq!(
            detection.outcome,
            EvaluationOutcome::Inconclusive(InconclusiveReason::NoSignal)
        );
        assert_eq!(detection.category, NamespaceCategory::Customer);
        assert!(detection.level.is_none());
        assert!(cluster.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dry_run_failure_is_collaborator_error() {
        let cluster = FakeCluster {
            fail_dry_run: true,
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        let err = detector.detect(&customer_ns()).unwrap_err();
        assert!(matches!(err, DetectError::Collaborator(ClientError::Request { .. })));
    }

    #[test]
    fn test_non_customer_is_unknown_without_listing_pods() {
        let cluster = FakeCluster {
            warnings: violating(),
            pods: vec![user_pod("bad-user")],
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        let ns = NamespaceRecord::new("openshift-monitoring").with_label(WARN_LEVEL_LABEL, "restricted");

        assert_eq!(
            detector.detect(&ns).unwrap(),
            EvaluationOutcome::Violating(Attribution::Unknown)
        );
        assert_eq!(cluster.pod_lists.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_attribution_disabled_is_unknown() {
        let cluster = FakeCluster {
            warnings: violating(),
            pods: vec![user_pod("bad-user")],
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m").with_user_attribution(false);
        assert_eq!(
            detector.detect(&customer_ns()).unwrap(),
            EvaluationOutcome::Violating(Attribution::Unknown)
        );
        assert_eq!(cluster.pod_lists.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unparseable_annotation_is_internal_error() {
        let cluster = FakeCluster {
            warnings: violating(),
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        let ns = NamespaceRecord::new("team-a").with_annotation(MINIMALLY_SUFFICIENT_ANNOTATION, "strict");

        let err = detector.detect(&ns).unwrap_err();
        assert!(matches!(err, DetectError::Internal { .. }));
    }

    #[test]
    fn test_annotation_case_is_normalized_for_attribution() {
        let cluster = FakeCluster {
            warnings: violating(),
            pods: vec![user_pod("bad-user")],
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        let ns = NamespaceRecord::new("team-a").with_annotation(MINIMALLY_SUFFICIENT_ANNOTATION, "Restricted");

        assert_eq!(
            detector.detect(&ns).unwrap(),
            EvaluationOutcome::Violating(Attribution::UserWorkload)
        );
        let requests = cluster.requests.lock().unwrap();
        assert_eq!(requests[0].1.get(ENFORCE_LEVEL_LABEL).map(String::as_str), Some("Restricted"));
    }

    #[test]
    fn test_foreign_pod_is_internal_error() {
        let cluster = FakeCluster {
            warnings: violating(),
            pods: vec![PodRecord::new("team-z", "stray")],
            ..Default::default()
        };
        let detector = Detector::new(&cluster, &NameEvaluator, "m");
        let err = detector.detect(&customer_ns()).unwrap_err();
        assert!(err.to_string().contains("team-z"));
    }

    #[test]
    fn test_warnings_do_not_leak_between_namespaces() {
        let noisy = FakeCluster {
            warnings: violating(),
            ..Default::default()
        };
        let quiet = FakeCluster::default();

        let first = Detector::new(&noisy, &NameEvaluator, "m").inspect(&customer_ns()).unwrap();
        let second = Detector::new(&quiet, &NameEvaluator, "m").inspect(&customer_ns()).unwrap();
        assert_eq!(first.warnings.len(), 1);
        assert!(second.warnings.is_empty());
        assert_eq!(second.outcome, EvaluationOutcome::NotViolating);
    }

    #[test]
    fn test_default_checks_attribute_real_spec() {
        let cluster = FakeCluster {
            warnings: violating(),
            pods: vec![user_pod("web").with_spec(PodSpec {
                host_network: true,
                ..Default::default()
            })],
            ..Default::default()
        };
        let checks = DefaultChecks::new();
        let ns = NamespaceRecord::new("team-a").with_label(WARN_LEVEL_LABEL, "baseline");
        let detector = Detector::new(&cluster, &checks, "m");
        assert_eq!(
            detector.detect(&ns).unwrap(),
            EvaluationOutcome::Violating(Attribution::UserWorkload)
        );
    }
}
