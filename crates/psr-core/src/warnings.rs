//! Per-call capture of admission warnings.
//!
//! A dry-run apply reports policy violations only as admission warnings,
//! not in its return value. The caller creates a [`WarningSink`] for a
//! single call, lends it to the client, and drains it as soon as the call
//! returns. Sinks are never shared between namespaces.

/// Collects the warnings emitted while one dry-run call is in flight.
#[derive(Debug, Default)]
pub struct WarningSink {
    warnings: Vec<String>,
}

impl WarningSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning delivered by the API server.
    pub fn push(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Take every captured warning, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sink_is_empty() {
        let sink = WarningSink::new();
        assert!(sink.is_empty());
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn test_drain_empties_sink() {
        let mut sink = WarningSink::new();
        sink.push("existing pods in namespace \"a\" violate the new PodSecurity enforce level \"restricted:latest\"");
        sink.push(String::from("web: runAsNonRoot != true"));

        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained[1].starts_with("web:"));
        assert!(sink.is_empty());
        assert!(sink.drain().is_empty());
    }
}
