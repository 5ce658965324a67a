//! Checks enforced only at the restricted level.

use super::{containers_phrase, quoted, Check};
use crate::cluster::CheckResult;
use psr_common::record::Container;
use psr_common::{Level, ObjectMeta, PodSpec};

/// Volume sources a restricted pod may mount.
const RESTRICTED_VOLUME_KINDS: &[&str] = &[
    "configMap",
    "csi",
    "downwardAPI",
    "emptyDir",
    "ephemeral",
    "persistentVolumeClaim",
    "projected",
    "secret",
];

const SECCOMP_RUNTIME_DEFAULT: &str = "RuntimeDefault";
const SECCOMP_LOCALHOST: &str = "Localhost";

pub(super) fn checks() -> Vec<Check> {
    vec![
        Check {
            id: "allowPrivilegeEscalation",
            level: Level::Restricted,
            evaluate: privilege_escalation,
            overrides: &[],
        },
        Check {
            id: "capabilities_restricted",
            level: Level::Restricted,
            evaluate: restricted_capabilities,
            overrides: &[],
        },
        Check {
            id: "runAsNonRoot",
            level: Level::Restricted,
            evaluate: run_as_non_root,
            overrides: &[],
        },
        Check {
            id: "runAsUser",
            level: Level::Restricted,
            evaluate: run_as_user,
            overrides: &[],
        },
        Check {
            id: "seccompProfile_restricted",
            level: Level::Restricted,
            evaluate: seccomp_profile,
            overrides: &["seccompProfile_baseline"],
        },
        Check {
            id: "restrictedVolumes",
            level: Level::Restricted,
            evaluate: restricted_volumes,
            overrides: &[],
        },
    ]
}

fn names<'a>(containers: impl Iterator<Item = &'a Container>) -> Vec<&'a str> {
    containers.map(|c| c.name.as_str()).collect()
}

fn privilege_escalation(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let offenders = names(spec.all_containers().filter(|c| {
        c.security_context
            .as_ref()
            .and_then(|sc| sc.allow_privilege_escalation)
            != Some(false)
    }));

    if offenders.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden(
        "allowPrivilegeEscalation != false",
        format!(
            "{} must set securityContext.allowPrivilegeEscalation=false",
            containers_phrase(&offenders)
        ),
    )
}

fn restricted_capabilities(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let mut missing_drop = Vec::new();
    let mut extra_add = Vec::new();
    let mut added = Vec::new();

    for container in spec.all_containers() {
        let caps = container
            .security_context
            .as_ref()
            .and_then(|sc| sc.capabilities.as_ref());

        let drops_all = caps.is_some_and(|caps| caps.drop.iter().any(|cap| cap == "ALL"));
        if !drops_all {
            missing_drop.push(container.name.as_str());
        }

        let extra: Vec<&str> = caps
            .map(|caps| {
                caps.add
                    .iter()
                    .map(String::as_str)
                    .filter(|cap| *cap != "NET_BIND_SERVICE")
                    .collect()
            })
            .unwrap_or_default();
        if !extra.is_empty() {
            extra_add.push(container.name.as_str());
            added.extend(extra);
        }
    }

    if missing_drop.is_empty() && extra_add.is_empty() {
        return CheckResult::allowed();
    }

    let mut details = Vec::new();
    if !missing_drop.is_empty() {
        details.push(format!(
            "{} must set securityContext.capabilities.drop=[\"ALL\"]",
            containers_phrase(&missing_drop)
        ));
    }
    if !extra_add.is_empty() {
        added.sort_unstable();
        added.dedup();
        details.push(format!(
            "{} must not include {} in securityContext.capabilities.add",
            containers_phrase(&extra_add),
            quoted(&added)
        ));
    }
    CheckResult::forbidden("unrestricted capabilities", details.join("; "))
}

fn run_as_non_root(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let pod_value = spec.security_context.as_ref().and_then(|sc| sc.run_as_non_root);

    let explicit_false = names(spec.all_containers().filter(|c| {
        c.security_context.as_ref().and_then(|sc| sc.run_as_non_root) == Some(false)
    }));
    let implicit = names(spec.all_containers().filter(|c| {
        c.security_context
            .as_ref()
            .and_then(|sc| sc.run_as_non_root)
            .is_none()
    }));

    let mut details = Vec::new();
    if pod_value == Some(false) {
        details.push("pod must not set securityContext.runAsNonRoot=false".to_string());
    }
    if !explicit_false.is_empty() {
        details.push(format!(
            "{} must not set securityContext.runAsNonRoot=false",
            containers_phrase(&explicit_false)
        ));
    }
    if pod_value != Some(true) && !implicit.is_empty() {
        details.push(format!(
            "pod or {} must set securityContext.runAsNonRoot=true",
            containers_phrase(&implicit)
        ));
    }

    if details.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden("runAsNonRoot != true", details.join("; "))
}

fn run_as_user(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let pod_root = spec
        .security_context
        .as_ref()
        .and_then(|sc| sc.run_as_user)
        == Some(0);
    let offenders = names(spec.all_containers().filter(|c| {
        c.security_context.as_ref().and_then(|sc| sc.run_as_user) == Some(0)
    }));

    let mut details = Vec::new();
    if pod_root {
        details.push("pod must not set runAsUser=0".to_string());
    }
    if !offenders.is_empty() {
        details.push(format!(
            "{} must not set runAsUser=0",
            containers_phrase(&offenders)
        ));
    }

    if details.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden("runAsUser=0", details.join("; "))
}

fn is_valid_seccomp(profile_type: &str) -> bool {
    profile_type == SECCOMP_RUNTIME_DEFAULT || profile_type == SECCOMP_LOCALHOST
}

fn seccomp_profile(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let pod_type = spec
        .security_context
        .as_ref()
        .and_then(|sc| sc.seccomp_profile.as_ref())
        .map(|profile| profile.profile_type.as_str());

    let mut invalid = Vec::new();
    let mut unset = Vec::new();
    for container in spec.all_containers() {
        let container_type = container
            .security_context
            .as_ref()
            .and_then(|sc| sc.seccomp_profile.as_ref())
            .map(|profile| profile.profile_type.as_str());
        match container_type {
            Some(kind) if !is_valid_seccomp(kind) => invalid.push(container.name.as_str()),
            Some(_) => {}
            None => unset.push(container.name.as_str()),
        }
    }

    let mut details = Vec::new();
    if let Some(kind) = pod_type.filter(|kind| !is_valid_seccomp(kind)) {
        details.push(format!("pod must not set securityContext.seccompProfile.type to {:?}", kind));
    }
    if !invalid.is_empty() {
        details.push(format!(
            "{} must not set securityContext.seccompProfile.type to an unconfined value",
            containers_phrase(&invalid)
        ));
    }
    if pod_type.is_none() && !unset.is_empty() {
        details.push(format!(
            "pod or {} must set securityContext.seccompProfile.type to \"RuntimeDefault\" or \"Localhost\"",
            containers_phrase(&unset)
        ));
    }

    if details.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden("seccompProfile", details.join("; "))
}

fn restricted_volumes(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let mut offenders = Vec::new();
    let mut kinds = Vec::new();
    for volume in &spec.volumes {
        let kind = volume.source_kind().unwrap_or("unknown");
        if !RESTRICTED_VOLUME_KINDS.contains(&kind) {
            offenders.push(volume.name.as_str());
            kinds.push(kind);
        }
    }

    if offenders.is_empty() {
        return CheckResult::allowed();
    }
    kinds.sort_unstable();
    kinds.dedup();
    let noun = if offenders.len() == 1 { "volume" } else { "volumes" };
    CheckResult::forbidden(
        "restricted volume types",
        format!(
            "{} {} {} {}",
            noun,
            quoted(&offenders),
            if offenders.len() == 1 { "uses" } else { "use" },
            kinds.join(", ")
        ),
    )
}
