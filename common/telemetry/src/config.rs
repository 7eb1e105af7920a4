use envconfig::Envconfig;
use tracing::Level;

#[derive(Envconfig, Clone, Debug)]
pub struct TelemetryConfig {
    /// OTLP/gRPC collector for trace spans. Spans are only logged locally when unset.
    #[envconfig(from = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_url: Option<String>,

    /// Collector for periodic metric exports, falls back to `otel_url`.
    #[envconfig(from = "OTEL_EXPORTER_OTLP_ENDPOINT_HTTP")]
    pub otel_metrics_url: Option<String>,

    #[envconfig(default = "1.0")]
    pub otel_sampling_rate: f64,

    #[envconfig(default = "checkout-api")]
    pub otel_service_name: String,

    #[envconfig(default = "0.0.1")]
    pub otel_service_version: String,

    // Minimum level of the spans and events bridged to OpenTelemetry
    #[envconfig(default = "info")]
    pub otel_log_level: Level,

    #[envconfig(default = "3000")]
    pub otel_export_timeout_ms: u64,
}

impl TelemetryConfig {
    pub fn metrics_url(&self) -> Option<&str> {
        self.otel_metrics_url
            .as_deref()
            .or(self.otel_url.as_deref())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otel_url: None,
            otel_metrics_url: None,
            otel_sampling_rate: 1.0,
            otel_service_name: "checkout-api".to_string(),
            otel_service_version: "0.0.1".to_string(),
            otel_log_level: Level::INFO,
            otel_export_timeout_ms: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_url_falls_back_to_trace_endpoint() {
        let mut config = TelemetryConfig {
            otel_url: Some("http://collector:4317".to_string()),
            ..Default::default()
        };
        assert_eq!(config.metrics_url(), Some("http://collector:4317"));

        config.otel_metrics_url = Some("http://collector:4318".to_string());
        assert_eq!(config.metrics_url(), Some("http://collector:4318"));
    }
}
