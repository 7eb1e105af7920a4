use std::collections::BTreeSet;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::{Directive, ParseError};

/// Families of automatic instrumentation, each one a set of `tracing` targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Instrumentation {
    /// Inbound HTTP requests (`tower_http::trace` spans around every request).
    Http,
    /// The Kafka client library and the publisher built on it.
    Kafka,
    /// Filesystem operations. Noisy, disabled by default.
    Filesystem,
}

impl Instrumentation {
    pub const ALL: [Instrumentation; 3] = [
        Instrumentation::Http,
        Instrumentation::Kafka,
        Instrumentation::Filesystem,
    ];

    pub fn targets(&self) -> &'static [&'static str] {
        match self {
            Instrumentation::Http => &["tower_http::trace", "axum"],
            Instrumentation::Kafka => &["rdkafka", "librdkafka", "common_kafka"],
            Instrumentation::Filesystem => &["tower_http::services::fs", "tokio::fs"],
        }
    }
}

/// Targets emitted by the OpenTelemetry SDK itself. Kept at error level so the exporter's
/// own diagnostics don't flood normal operation.
const DIAGNOSTIC_TARGETS: &[&str] = &["opentelemetry", "opentelemetry_sdk", "opentelemetry_otlp"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentationSet {
    enabled: BTreeSet<Instrumentation>,
}

impl InstrumentationSet {
    pub fn empty() -> Self {
        Self {
            enabled: BTreeSet::new(),
        }
    }

    pub fn with(mut self, instrumentation: Instrumentation) -> Self {
        self.enabled.insert(instrumentation);
        self
    }

    pub fn is_enabled(&self, instrumentation: Instrumentation) -> bool {
        self.enabled.contains(&instrumentation)
    }

    /// Per-target directives: enabled families at `level`, plus [`suppressions`](Self::suppressions).
    pub fn directives(&self, level: LevelFilter) -> Result<Vec<Directive>, ParseError> {
        let mut directives = Vec::new();
        for instrumentation in Instrumentation::ALL {
            if self.is_enabled(instrumentation) {
                for target in instrumentation.targets() {
                    directives.push(format!("{target}={level}").parse()?);
                }
            }
        }
        directives.extend(self.suppressions()?);
        Ok(directives)
    }

    /// Disabled families off, SDK diagnostics at error.
    pub fn suppressions(&self) -> Result<Vec<Directive>, ParseError> {
        let mut directives = Vec::new();
        for instrumentation in Instrumentation::ALL {
            if !self.is_enabled(instrumentation) {
                for target in instrumentation.targets() {
                    directives.push(format!("{target}=off").parse()?);
                }
            }
        }
        for target in DIAGNOSTIC_TARGETS {
            directives.push(format!("{target}=error").parse()?);
        }
        Ok(directives)
    }
}

impl Default for InstrumentationSet {
    fn default() -> Self {
        Self::empty()
            .with(Instrumentation::Http)
            .with(Instrumentation::Kafka)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_is_excluded_by_default() {
        let set = InstrumentationSet::default();
        assert!(set.is_enabled(Instrumentation::Http));
        assert!(set.is_enabled(Instrumentation::Kafka));
        assert!(!set.is_enabled(Instrumentation::Filesystem));
    }

    #[test]
    fn directives_disable_filesystem_and_quiet_diagnostics() {
        let directives: Vec<String> = InstrumentationSet::default()
            .directives(LevelFilter::INFO)
            .expect("valid directives")
            .iter()
            .map(ToString::to_string)
            .collect();

        assert!(directives.contains(&"tower_http::services::fs=off".to_string()));
        assert!(directives.contains(&"rdkafka=info".to_string()));
        assert!(directives.contains(&"librdkafka=info".to_string()));
        assert!(directives.contains(&"opentelemetry_sdk=error".to_string()));
    }

    #[test]
    fn suppressions_leave_enabled_targets_alone() {
        let suppressions: Vec<String> = InstrumentationSet::default()
            .suppressions()
            .expect("valid directives")
            .iter()
            .map(ToString::to_string)
            .collect();

        assert!(suppressions.contains(&"tokio::fs=off".to_string()));
        assert!(!suppressions.iter().any(|d| d.starts_with("rdkafka")));
    }

    #[test]
    fn enabling_filesystem_drops_the_off_directive() {
        let directives: Vec<String> = InstrumentationSet::default()
            .with(Instrumentation::Filesystem)
            .directives(LevelFilter::DEBUG)
            .expect("valid directives")
            .iter()
            .map(ToString::to_string)
            .collect();

        assert!(directives.contains(&"tokio::fs=debug".to_string()));
        assert!(!directives.iter().any(|d| d.ends_with("=off")));
    }
}
