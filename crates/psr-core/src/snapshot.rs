//! Offline cluster backed by a JSON snapshot.
//!
//! Two layouts are accepted:
//!
//! ```json
//! {"namespaces": [...], "pods": [...], "dry_run_failures": ["ns"]}
//! ```
//!
//! or the `List` produced by `kubectl get ns,pods -A -o json`.
//!
//! Dry-run applies are answered the way Pod Security admission answers
//! them: the namespace's pods are evaluated at the requested enforce level
//! and one warning is emitted per group of pods failing for the same
//! reasons, after a header naming the namespace and level.

use crate::checks::DefaultChecks;
use crate::cluster::{ClientError, ClusterClient, DryRunRequest};
use crate::warnings::WarningSink;
use psr_common::labels::ENFORCE_LEVEL_LABEL;
use psr_common::level::LATEST_VERSION;
use psr_common::{Error, Level, LevelVersion, NamespaceRecord, PodRecord, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ListDocument {
    items: Vec<ListItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind")]
enum ListItem {
    Namespace(NamespaceRecord),
    Pod(PodRecord),
    #[serde(other)]
    Other,
}

/// Namespaces and pods captured from a cluster.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub namespaces: Vec<NamespaceRecord>,

    #[serde(default)]
    pub pods: Vec<PodRecord>,

    /// Namespaces whose dry-run apply fails, for exercising error paths.
    #[serde(default)]
    pub dry_run_failures: BTreeSet<String>,
}

impl ClusterSnapshot {
    pub fn from_json(content: &str) -> Result<Self> {
        Self::parse(content).map_err(|e| Error::Snapshot(e.to_string()))
    }

    fn parse(content: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.get("items").is_none() {
            return serde_json::from_value(value);
        }

        let document: ListDocument = serde_json::from_value(value)?;
        let mut snapshot = ClusterSnapshot::default();
        for item in document.items {
            match item {
                ListItem::Namespace(ns) => snapshot.namespaces.push(ns),
                ListItem::Pod(pod) => snapshot.pods.push(pod),
                ListItem::Other => {}
            }
        }
        Ok(snapshot)
    }
}

/// A [`ClusterClient`] answering from a [`ClusterSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotCluster {
    snapshot: ClusterSnapshot,
    checks: DefaultChecks,
    version: String,
}

impl SnapshotCluster {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            snapshot,
            checks: DefaultChecks::new(),
            version: LATEST_VERSION.to_string(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = ClusterSnapshot::parse(&content)
            .map_err(|e| Error::Snapshot(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(
            path = %path.display(),
            namespaces = snapshot.namespaces.len(),
            pods = snapshot.pods.len(),
            "snapshot loaded"
        );
        Ok(Self::new(snapshot))
    }

    /// Policy version used when simulating admission.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn snapshot(&self) -> &ClusterSnapshot {
        &self.snapshot
    }

    fn pods_in<'s>(&'s self, namespace: &'s str) -> impl Iterator<Item = &'s PodRecord> {
        self.snapshot
            .pods
            .iter()
            .filter(move |pod| pod.metadata.namespace.as_deref() == Some(namespace))
    }
}

impl ClusterClient for SnapshotCluster {
    fn list_namespaces(&self) -> std::result::Result<Vec<NamespaceRecord>, ClientError> {
        Ok(self.snapshot.namespaces.clone())
    }

    fn dry_run_apply(
        &self,
        request: &DryRunRequest<'_>,
        sink: &mut WarningSink,
    ) -> std::result::Result<(), ClientError> {
        const OPERATION: &str = "dry-run apply";
        let namespace = request.namespace;

        if self.snapshot.dry_run_failures.contains(namespace) {
            return Err(ClientError::request(OPERATION, namespace, "simulated failure"));
        }
        if !self.snapshot.namespaces.iter().any(|ns| ns.name() == namespace) {
            return Err(ClientError::request(OPERATION, namespace, "namespace not found"));
        }

        let Some(value) = request.labels.get(ENFORCE_LEVEL_LABEL) else {
            return Ok(());
        };
        // Admission rejects label values that are not valid levels.
        let level: Level = value
            .to_ascii_lowercase()
            .parse()
            .map_err(|e: psr_common::InvalidLevel| ClientError::request(OPERATION, namespace, e.to_string()))?;
        let level = LevelVersion::new(level, self.version.clone());

        // Pods grouped by their joined forbidden reasons.
        let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for pod in self.pods_in(namespace) {
            let reasons = self.checks.forbidden_reasons(&level, &pod.metadata, &pod.spec);
            if !reasons.is_empty() {
                groups.entry(reasons.join(", ")).or_default().push(pod.name());
            }
        }
        if groups.is_empty() {
            return Ok(());
        }

        sink.push(format!(
            "existing pods in namespace {:?} violate the new PodSecurity enforce level {:?}",
            namespace,
            level.to_string()
        ));
        for (reasons, mut pods) in groups {
            pods.sort_unstable();
            let subject = match pods.len() {
                1 => pods[0].to_string(),
                2 => format!("{} (and 1 other pod)", pods[0]),
                n => format!("{} (and {} other pods)", pods[0], n - 1),
            };
            sink.push(format!("{}: {}", subject, reasons));
        }
        Ok(())
    }

    fn list_pods(&self, namespace: &str) -> std::result::Result<Vec<PodRecord>, ClientError> {
        Ok(self.pods_in(namespace).cloned().collect())
    }
}
