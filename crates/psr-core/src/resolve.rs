//! Enforcement level resolution.
//!
//! The level to simulate is taken from, in order:
//! 1. The minimally sufficient level annotation maintained by the label
//!    synchronization controller. Trusted and used verbatim.
//! 2. The strictest parseable value among the warn and audit labels.
//!
//! A namespace with neither has no signal, and its readiness cannot be
//! decided.

use psr_common::labels::{ALERT_LABELS, MINIMALLY_SUFFICIENT_ANNOTATION};
use psr_common::{InvalidLevel, Level, NamespaceRecord};
use serde::Serialize;
use thiserror::Error;

/// Where a resolved level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    MinimallySufficientAnnotation,
    AlertLabels,
}

/// The enforce label value to simulate for a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLevel {
    /// Raw label value. Annotation values are not parsed at resolution time.
    pub value: String,
    pub source: LevelSource,
}

impl ResolvedLevel {
    pub fn level(&self) -> Result<Level, InvalidLevel> {
        self.value.to_ascii_lowercase().parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unable to determine if the namespace is violating because no appropriate labels or annotations were found")]
    NoSignal,
}

/// Resolve the enforce level to simulate for `ns`.
pub fn resolve(ns: &NamespaceRecord) -> Result<ResolvedLevel, ResolveError> {
    if let Some(value) = ns.annotation(MINIMALLY_SUFFICIENT_ANNOTATION) {
        return Ok(ResolvedLevel {
            value: value.to_string(),
            source: LevelSource::MinimallySufficientAnnotation,
        });
    }

    let candidates = ALERT_LABELS
        .iter()
        .filter_map(|key| ns.label(key).map(|value| (*key, value)));

    pick_strictest(ns.name(), candidates)
        .map(|level| ResolvedLevel {
            value: level.as_str().to_string(),
            source: LevelSource::AlertLabels,
        })
        .ok_or(ResolveError::NoSignal)
}

/// Strictest level among `(label, value)` candidates. Unparseable values
/// are logged and skipped.
pub fn pick_strictest<'a, I>(namespace: &str, candidates: I) -> Option<Level>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    Level::strictest(candidates.into_iter().filter_map(|(label, value)| {
        match value.parse::<Level>() {
            Ok(level) => Some(level),
            Err(err) => {
                tracing::debug!(
                    namespace,
                    label,
                    value,
                    error = %err,
                    "ignoring invalid pod security level"
                );
                None
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use psr_common::labels::{AUDIT_LEVEL_LABEL, WARN_LEVEL_LABEL};

    fn labeled(warn: Option<&str>, audit: Option<&str>) -> NamespaceRecord {
        let mut ns = NamespaceRecord::new("team-a");
        if let Some(value) = warn {
            ns = ns.with_label(WARN_LEVEL_LABEL, value);
        }
        if let Some(value) = audit {
            ns = ns.with_label(AUDIT_LEVEL_LABEL, value);
        }
        ns
    }

    #[test]
    fn test_annotation_wins_over_labels() {
        let ns = labeled(Some("restricted"), Some("restricted"))
            .with_annotation(MINIMALLY_SUFFICIENT_ANNOTATION, "privileged");

        let resolved = resolve(&ns).unwrap();
        assert_eq!(resolved.value, "privileged");
        assert_eq!(resolved.source, LevelSource::MinimallySufficientAnnotation);
    }

    #[test]
    fn test_annotation_used_verbatim() {
        let ns = NamespaceRecord::new("team-a")
            .with_annotation(MINIMALLY_SUFFICIENT_ANNOTATION, "Restricted");

        let resolved = resolve(&ns).unwrap();
        assert_eq!(resolved.value, "Restricted");
        assert_eq!(resolved.level().unwrap(), Level::Restricted);
    }

    #[test]
    fn test_strictest_label_wins_in_either_order() {
        let a = resolve(&labeled(Some("baseline"), Some("restricted"))).unwrap();
        let b = resolve(&labeled(Some("restricted"), Some("baseline"))).unwrap();
        assert_eq!(a.value, "restricted");
        assert_eq!(b.value, "restricted");
        assert_eq!(a.source, LevelSource::AlertLabels);
    }

    #[test]
    fn test_single_label() {
        assert_eq!(resolve(&labeled(Some("baseline"), None)).unwrap().value, "baseline");
        assert_eq!(resolve(&labeled(None, Some("privileged"))).unwrap().value, "privileged");
    }

    #[test]
    fn test_invalid_label_dropped() {
        let resolved = resolve(&labeled(Some("bogus"), Some("baseline"))).unwrap();
        assert_eq!(resolved.value, "baseline");
    }

    #[test]
    fn test_no_signal_without_annotation_or_labels() {
        assert_eq!(resolve(&labeled(None, None)), Err(ResolveError::NoSignal));
    }

    #[test]
    fn test_no_signal_when_all_labels_invalid() {
        assert_eq!(
            resolve(&labeled(Some("strict"), Some(""))),
            Err(ResolveError::NoSignal)
        );
    }

    #[test]
    fn test_pick_strictest_empty() {
        assert_eq!(pick_strictest("ns", Vec::new()), None);
    }
}
