//! Checks enforced from the baseline level up.

use super::{containers_phrase, quoted, Check};
use crate::cluster::CheckResult;
use psr_common::record::SeccompProfile;
use psr_common::{Level, ObjectMeta, PodSpec};

/// Capabilities a baseline pod may add.
const BASELINE_CAPABILITIES: &[&str] = &[
    "AUDIT_WRITE",
    "CHOWN",
    "DAC_OVERRIDE",
    "FOWNER",
    "FSETID",
    "KILL",
    "MKNOD",
    "NET_BIND_SERVICE",
    "SETFCAP",
    "SETGID",
    "SETPCAP",
    "SETUID",
    "SYS_CHROOT",
];

const SECCOMP_UNCONFINED: &str = "Unconfined";

/// Namespaced sysctls considered safe.
const SAFE_SYSCTLS: &[&str] = &[
    "kernel.shm_rmid_forced",
    "net.ipv4.ip_local_port_range",
    "net.ipv4.ip_unprivileged_port_start",
    "net.ipv4.tcp_syncookies",
    "net.ipv4.ping_group_range",
];

pub(super) fn checks() -> Vec<Check> {
    vec![
        Check {
            id: "privileged",
            level: Level::Baseline,
            evaluate: privileged_containers,
            overrides: &[],
        },
        Check {
            id: "hostNamespaces",
            level: Level::Baseline,
            evaluate: host_namespaces,
            overrides: &[],
        },
        Check {
            id: "hostPathVolumes",
            level: Level::Baseline,
            evaluate: host_path_volumes,
            overrides: &[],
        },
        Check {
            id: "hostPorts",
            level: Level::Baseline,
            evaluate: host_ports,
            overrides: &[],
        },
        Check {
            id: "capabilities_baseline",
            level: Level::Baseline,
            evaluate: baseline_capabilities,
            overrides: &[],
        },
        Check {
            id: "procMount",
            level: Level::Baseline,
            evaluate: proc_mount,
            overrides: &[],
        },
        Check {
            id: "sysctls",
            level: Level::Baseline,
            evaluate: sysctls,
            overrides: &[],
        },
        Check {
            id: "seccompProfile_baseline",
            level: Level::Baseline,
            evaluate: seccomp_unconfined,
            overrides: &[],
        },
    ]
}

fn privileged_containers(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let offenders: Vec<&str> = spec
        .all_containers()
        .filter(|c| {
            c.security_context
                .as_ref()
                .and_then(|sc| sc.privileged)
                .unwrap_or(false)
        })
        .map(|c| c.name.as_str())
        .collect();

    if offenders.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden(
        "privileged",
        format!(
            "{} must not set securityContext.privileged=true",
            containers_phrase(&offenders)
        ),
    )
}

fn host_namespaces(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let mut set = Vec::new();
    if spec.host_network {
        set.push("hostNetwork=true");
    }
    if spec.host_pid {
        set.push("hostPID=true");
    }
    if spec.host_ipc {
        set.push("hostIPC=true");
    }

    if set.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden("host namespaces", set.join(", "))
}

fn host_path_volumes(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let offenders: Vec<&str> = spec
        .volumes
        .iter()
        .filter(|v| v.source_kind() == Some("hostPath"))
        .map(|v| v.name.as_str())
        .collect();

    if offenders.is_empty() {
        return CheckResult::allowed();
    }
    let noun = if offenders.len() == 1 { "volume" } else { "volumes" };
    CheckResult::forbidden("hostPath volumes", format!("{} {}", noun, quoted(&offenders)))
}

fn host_ports(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let mut offenders = Vec::new();
    let mut ports = Vec::new();
    for container in spec.all_containers() {
        let used: Vec<i32> = container
            .ports
            .iter()
            .filter_map(|p| p.host_port)
            .filter(|port| *port != 0)
            .collect();
        if !used.is_empty() {
            offenders.push(container.name.as_str());
            ports.extend(used);
        }
    }

    if offenders.is_empty() {
        return CheckResult::allowed();
    }
    let ports: Vec<String> = ports.iter().map(i32::to_string).collect();
    CheckResult::forbidden(
        "hostPort",
        format!(
            "{} use hostPorts {}",
            containers_phrase(&offenders),
            ports.join(", ")
        ),
    )
}

fn baseline_capabilities(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let mut offenders = Vec::new();
    let mut added = Vec::new();
    for container in spec.all_containers() {
        let extra: Vec<&str> = container
            .security_context
            .as_ref()
            .and_then(|sc| sc.capabilities.as_ref())
            .map(|caps| {
                caps.add
                    .iter()
                    .map(String::as_str)
                    .filter(|cap| !BASELINE_CAPABILITIES.contains(cap))
                    .collect()
            })
            .unwrap_or_default();
        if !extra.is_empty() {
            offenders.push(container.name.as_str());
            added.extend(extra);
        }
    }

    if offenders.is_empty() {
        return CheckResult::allowed();
    }
    added.sort_unstable();
    added.dedup();
    CheckResult::forbidden(
        "non-default capabilities",
        format!(
            "{} must not include {} in securityContext.capabilities.add",
            containers_phrase(&offenders),
            quoted(&added)
        ),
    )
}

fn proc_mount(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let offenders: Vec<&str> = spec
        .all_containers()
        .filter(|c| {
            c.security_context
                .as_ref()
                .and_then(|sc| sc.proc_mount.as_deref())
                .is_some_and(|mount| mount != "Default")
        })
        .map(|c| c.name.as_str())
        .collect();

    if offenders.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden(
        "procMount",
        format!(
            "{} must not set securityContext.procMount to a non-default value",
            containers_phrase(&offenders)
        ),
    )
}

fn sysctls(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let forbidden: Vec<&str> = spec
        .security_context
        .iter()
        .flat_map(|sc| sc.sysctls.iter())
        .map(|sysctl| sysctl.name.as_str())
        .filter(|name| !SAFE_SYSCTLS.contains(name))
        .collect();

    if forbidden.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden("forbidden sysctls", forbidden.join(", "))
}

fn is_unconfined(profile: Option<&SeccompProfile>) -> bool {
    profile.is_some_and(|p| p.profile_type == SECCOMP_UNCONFINED)
}

fn seccomp_unconfined(_: &ObjectMeta, spec: &PodSpec) -> CheckResult {
    let pod = is_unconfined(
        spec.security_context
            .as_ref()
            .and_then(|sc| sc.seccomp_profile.as_ref()),
    );
    let offenders: Vec<&str> = spec
        .all_containers()
        .filter(|c| {
            is_unconfined(
                c.security_context
                    .as_ref()
                    .and_then(|sc| sc.seccomp_profile.as_ref()),
            )
        })
        .map(|c| c.name.as_str())
        .collect();

    let mut details = Vec::new();
    if pod {
        details.push(
            "pod must not set securityContext.seccompProfile.type to \"Unconfined\"".to_string(),
        );
    }
    if !offenders.is_empty() {
        details.push(format!(
            "{} must not set securityContext.seccompProfile.type to \"Unconfined\"",
            containers_phrase(&offenders)
        ));
    }

    if details.is_empty() {
        return CheckResult::allowed();
    }
    CheckResult::forbidden("seccompProfile", details.join("; "))
}
