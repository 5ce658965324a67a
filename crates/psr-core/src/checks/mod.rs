//! Built-in Pod Security Standards checks.
//!
//! [`DefaultChecks`] is the stock [`PodEvaluator`]. Each check belongs to
//! the weakest level that enforces it; evaluating at a level runs every
//! check of that level and of the levels below it. `privileged` runs none.
//! A check may override weaker ones: `seccompProfile_restricted` replaces
//! `seccompProfile_baseline` once restricted is enforced.
//!
//! Not implemented, and therefore always passing: `appArmorProfile`,
//! `seLinuxOptions` and `windowsHostProcess` (baseline).

mod baseline;
mod restricted;

use crate::cluster::{CheckResult, PodEvaluator};
use psr_common::{Level, LevelVersion, ObjectMeta, PodSpec};

/// A single Pod Security check.
#[derive(Debug, Clone, Copy)]
pub struct Check {
    pub id: &'static str,
    /// Weakest level that enforces this check.
    pub level: Level,
    pub evaluate: fn(&ObjectMeta, &PodSpec) -> CheckResult,
    /// Ids of weaker checks this one replaces when both apply.
    pub overrides: &'static [&'static str],
}

/// The stock check registry.
#[derive(Debug, Clone)]
pub struct DefaultChecks {
    checks: Vec<Check>,
}

impl Default for DefaultChecks {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultChecks {
    pub fn new() -> Self {
        let mut checks = baseline::checks();
        checks.extend(restricted::checks());
        Self { checks }
    }

    /// Checks enforced at `level`, minus the ones overridden by a stronger
    /// check that is also enforced.
    pub fn checks_for(&self, level: Level) -> impl Iterator<Item = &Check> {
        let applies = move |check: &&Check| level != Level::Privileged && check.level <= level;
        let overridden: Vec<&'static str> = self
            .checks
            .iter()
            .filter(applies)
            .flat_map(|check| check.overrides.iter().copied())
            .collect();
        self.checks
            .iter()
            .filter(applies)
            .filter(move |check| !overridden.contains(&check.id))
    }

    /// Forbidden reasons for a pod, joined the way admission warnings print
    /// them. Empty when the pod is allowed.
    pub fn forbidden_reasons(
        &self,
        level: &LevelVersion,
        metadata: &ObjectMeta,
        spec: &PodSpec,
    ) -> Vec<String> {
        self.evaluate_pod(level, metadata, spec)
            .into_iter()
            .filter(|result| !result.allowed)
            .map(|result| result.forbidden_reason)
            .collect()
    }
}

impl PodEvaluator for DefaultChecks {
    fn evaluate_pod(
        &self,
        level: &LevelVersion,
        metadata: &ObjectMeta,
        spec: &PodSpec,
    ) -> Vec<CheckResult> {
        self.checks_for(level.level)
            .map(|check| (check.evaluate)(metadata, spec))
            .collect()
    }
}

/// Quote and join names: `"a", "b"`.
pub(crate) fn quoted(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("{:?}", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `container "a"` or `containers "a", "b"`.
pub(crate) fn containers_phrase(names: &[&str]) -> String {
    let noun = if names.len() == 1 { "container" } else { "containers" };
    format!("{} {}", noun, quoted(names))
}
