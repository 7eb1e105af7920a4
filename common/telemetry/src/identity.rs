use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;

use crate::config::TelemetryConfig;

/// Name and version attached to every exported span and metric. Fixed for the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceIdentity {
    name: String,
    version: String,
}

impl ServiceIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(&config.otel_service_name, &config.otel_service_version)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// SDK defaults merged with `service.name` and `service.version`; ours win on conflict.
    pub fn resource(&self) -> Resource {
        Resource::default().merge(&Resource::new(vec![
            KeyValue::new("service.name", self.name.clone()),
            KeyValue::new("service.version", self.version.clone()),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::{Key, Value};

    use super::*;

    #[test]
    fn resource_carries_name_and_version() {
        let identity = ServiceIdentity::new("checkout-api", "0.0.1");
        let resource = identity.resource();

        assert_eq!(
            resource.get(Key::new("service.name")),
            Some(Value::from("checkout-api"))
        );
        assert_eq!(
            resource.get(Key::new("service.version")),
            Some(Value::from("0.0.1"))
        );
    }
}
