//! Well-known label and annotation keys.
//!
//! These keys are an external contract shared with the Pod Security
//! admission plugin and the label synchronization controller.

/// Label that enforces a Pod Security level on a namespace.
pub const ENFORCE_LEVEL_LABEL: &str = "pod-security.kubernetes.io/enforce";

/// Label that makes admission warn about violating pods.
pub const WARN_LEVEL_LABEL: &str = "pod-security.kubernetes.io/warn";

/// Label that makes admission audit violating pods.
pub const AUDIT_LEVEL_LABEL: &str = "pod-security.kubernetes.io/audit";

/// Alert-style labels considered when no minimally sufficient level is known.
pub const ALERT_LABELS: [&str; 2] = [WARN_LEVEL_LABEL, AUDIT_LEVEL_LABEL];

/// Annotation written by the label synchronization controller with the
/// weakest level every workload in the namespace satisfies.
pub const MINIMALLY_SUFFICIENT_ANNOTATION: &str =
    "security.openshift.io/MinimallySufficientPodSecurityStandard";

/// Label that turns off automatic Pod Security label synchronization when
/// set to `"false"`.
pub const LABEL_SYNC_CONTROL_LABEL: &str = "security.openshift.io/scc.podSecurityLabelSync";

/// Pod annotation naming the kind of subject whose SCC admitted the pod.
pub const VALIDATED_SCC_SUBJECT_TYPE_ANNOTATION: &str =
    "security.openshift.io/validated-scc-subject-type";

/// Subject type marking a pod admitted under an end-user SCC.
pub const USER_SUBJECT_TYPE: &str = "user";

/// Run-level zero namespaces.
pub const RUN_LEVEL_ZERO_NAMESPACES: [&str; 3] = ["default", "kube-system", "kube-public"];

/// Prefix reserved for platform-managed namespaces.
pub const PLATFORM_NAMESPACE_PREFIX: &str = "openshift";
