use std::time::Duration;

use common_kafka::KafkaConfig;
use common_telemetry::TelemetryConfig;
use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "127.0.0.1")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3000")]
    pub port: u16,

    // Prefix the business routes are mounted under
    #[envconfig(default = "/api")]
    pub base_path: String,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    // Bound for each drain step on shutdown, unbounded when unset
    pub shutdown_step_timeout_ms: Option<u64>,

    #[envconfig(nested = true)]
    pub telemetry: TelemetryConfig,

    #[envconfig(nested = true)]
    pub kafka: KafkaConfig,
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.shutdown_step_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        let config = Config::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(config.bind(), "127.0.0.1:3000");
        assert_eq!(config.base_path, "/api");
        assert!(config.export_prometheus);
        assert_eq!(config.step_timeout(), None);
        assert_eq!(config.telemetry.otel_url, None);
    }

    #[test]
    fn step_timeout_is_read_in_milliseconds() {
        let env = HashMap::from([
            ("BIND_PORT".to_string(), "8080".to_string()),
            ("SHUTDOWN_STEP_TIMEOUT_MS".to_string(), "2500".to_string()),
        ]);
        let config = Config::init_from_hashmap(&env).unwrap();
        assert_eq!(config.bind(), "127.0.0.1:8080");
        assert_eq!(config.step_timeout(), Some(Duration::from_millis(2500)));
    }
}
