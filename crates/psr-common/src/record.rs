//! Namespace and pod records.
//!
//! These mirror the subset of the Kubernetes object model the readiness
//! engine reads. Field names follow the Kubernetes JSON representation so
//! snapshots taken with `kubectl get -o json` deserialize directly; unknown
//! fields are ignored.

use crate::labels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Object metadata shared by namespaces and pods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// A namespace as read from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub metadata: ObjectMeta,
}

impl NamespaceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_label(key, value);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_annotation(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata.labels.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata.annotations.get(key).map(String::as_str)
    }

    /// Whether the namespace already carries an enforce label.
    pub fn is_enforcing(&self) -> bool {
        self.metadata
            .labels
            .contains_key(labels::ENFORCE_LEVEL_LABEL)
    }
}

/// A pod as read from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRecord {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: PodSpec,
}

impl PodRecord {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let mut metadata = ObjectMeta::named(name);
        metadata.namespace = Some(namespace.into());
        Self {
            metadata,
            spec: PodSpec::default(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_annotation(key, value);
        self
    }

    pub fn with_spec(mut self, spec: PodSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Whether the pod was admitted under an end-user SCC.
    pub fn runs_as_user_subject(&self) -> bool {
        self.metadata
            .annotations
            .get(labels::VALIDATED_SCC_SUBJECT_TYPE_ANNOTATION)
            .is_some_and(|subject| subject == labels::USER_SUBJECT_TYPE)
    }
}

/// Pod spec fields relevant to Pod Security evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub host_network: bool,

    #[serde(default, rename = "hostPID")]
    pub host_pid: bool,

    #[serde(default, rename = "hostIPC")]
    pub host_ipc: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<PodSecurityContext>,

    #[serde(default)]
    pub containers: Vec<Container>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_containers: Vec<Container>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

impl PodSpec {
    /// Init containers followed by regular containers.
    pub fn all_containers(&self) -> impl Iterator<Item = &Container> {
        self.init_containers.iter().chain(self.containers.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSecurityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seccomp_profile: Option<SeccompProfile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sysctls: Vec<Sysctl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
}

impl Container {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_security_context(mut self, context: SecurityContext) -> Self {
        self.security_context = Some(context);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_privilege_escalation: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seccomp_profile: Option<SeccompProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proc_mount: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub add: Vec<String>,

    #[serde(default)]
    pub drop: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeccompProfile {
    #[serde(rename = "type")]
    pub profile_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localhost_profile: Option<String>,
}

impl SeccompProfile {
    pub fn runtime_default() -> Self {
        Self {
            profile_type: "RuntimeDefault".to_string(),
            localhost_profile: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub container_port: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sysctl {
    pub name: String,
    pub value: String,
}

/// A pod volume. Only the name of the volume source matters for
/// evaluation, so the source body is kept as opaque JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,

    #[serde(flatten)]
    pub source: BTreeMap<String, serde_json::Value>,
}

impl Volume {
    pub fn new(name: impl Into<String>, source_kind: impl Into<String>) -> Self {
        let mut source = BTreeMap::new();
        source.insert(
            source_kind.into(),
            serde_json::Value::Object(serde_json::Map::new()),
        );
        Self {
            name: name.into(),
            source,
        }
    }

    /// The volume source key, e.g. `hostPath` or `configMap`.
    pub fn source_kind(&self) -> Option<&str> {
        self.source.keys().next().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_from_kubernetes_json() {
        let ns: NamespaceRecord = serde_json::from_str(
            r#"{
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": {
                    "name": "team-a",
                    "labels": {"pod-security.kubernetes.io/warn": "baseline"},
                    "annotations": {"openshift.io/sa.scc.uid-range": "1000/10000"}
                },
                "status": {"phase": "Active"}
            }"#,
        )
        .unwrap();

        assert_eq!(ns.name(), "team-a");
        assert_eq!(ns.label(labels::WARN_LEVEL_LABEL), Some("baseline"));
        assert!(!ns.is_enforcing());
    }

    #[test]
    fn test_is_enforcing() {
        let ns = NamespaceRecord::new("ns").with_label(labels::ENFORCE_LEVEL_LABEL, "restricted");
        assert!(ns.is_enforcing());
    }

    #[test]
    fn test_pod_spec_from_kubernetes_json() {
        let pod: PodRecord = serde_json::from_str(
            r#"{
                "metadata": {"name": "web", "namespace": "team-a"},
                "spec": {
                    "hostPID": true,
                    "securityContext": {"runAsNonRoot": true, "seccompProfile": {"type": "RuntimeDefault"}},
                    "containers": [{
                        "name": "app",
                        "image": "registry.example/app:1",
                        "ports": [{"containerPort": 8080, "hostPort": 80}],
                        "securityContext": {"capabilities": {"drop": ["ALL"]}}
                    }],
                    "volumes": [{"name": "data", "hostPath": {"path": "/var/data"}}]
                }
            }"#,
        )
        .unwrap();

        assert!(pod.spec.host_pid);
        assert!(!pod.spec.host_network);
        assert_eq!(pod.spec.containers[0].ports[0].host_port, Some(80));
        assert_eq!(pod.spec.volumes[0].source_kind(), Some("hostPath"));
        assert_eq!(
            pod.spec
                .security_context
                .as_ref()
                .and_then(|sc| sc.seccomp_profile.as_ref())
                .map(|p| p.profile_type.as_str()),
            Some("RuntimeDefault")
        );
    }

    #[test]
    fn test_runs_as_user_subject() {
        let user = PodRecord::new("ns", "a")
            .with_annotation(labels::VALIDATED_SCC_SUBJECT_TYPE_ANNOTATION, "user");
        let service_account = PodRecord::new("ns", "b")
            .with_annotation(labels::VALIDATED_SCC_SUBJECT_TYPE_ANNOTATION, "serviceaccount");
        let unannotated = PodRecord::new("ns", "c");

        assert!(user.runs_as_user_subject());
        assert!(!service_account.runs_as_user_subject());
        assert!(!unannotated.runs_as_user_subject());
    }
}
