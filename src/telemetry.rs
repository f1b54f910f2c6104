//! Telemetry records and initializers.
//!
//! Every record passes through the registered initializers before it is
//! emitted. `CloudRoleNameInitializer` stamps the logical role name so records
//! from this service can be told apart from other services sharing the sink.
//! Records are emitted as structured `tracing` events on the `telemetry` target.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{TelemetryConfig, TELEMETRY_TARGET};

/// Cloud-related context of a telemetry record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloudContext {
    /// Logical role (service) name
    pub role_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryContext {
    pub cloud: CloudContext,
}

/// A single telemetry item, such as a completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: Option<u64>,
    pub success: Option<bool>,
    pub response_code: Option<u16>,
    pub context: TelemetryContext,
    pub properties: BTreeMap<String, String>,
}

impl TelemetryRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            duration_ms: None,
            success: None,
            response_code: None,
            context: TelemetryContext::default(),
            properties: BTreeMap::new(),
        }
    }

    /// Build a request record; 5xx responses count as failures
    pub fn request(name: impl Into<String>, response_code: u16, duration_ms: u64) -> Self {
        let mut record = Self::new(name);
        record.response_code = Some(response_code);
        record.duration_ms = Some(duration_ms);
        record.success = Some(response_code < 500);
        record
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Hook run on every record before it is emitted.
pub trait TelemetryInitializer: Send + Sync {
    fn initialize(&self, record: &mut TelemetryRecord);
}

/// Sets the record's cloud role name to a fixed value.
#[derive(Debug, Clone)]
pub struct CloudRoleNameInitializer {
    role_name: String,
}

impl CloudRoleNameInitializer {
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
        }
    }
}

impl TelemetryInitializer for CloudRoleNameInitializer {
    fn initialize(&self, record: &mut TelemetryRecord) {
        record.context.cloud.role_name = Some(self.role_name.clone());
    }
}

/// Runs initializers over records and emits them.
///
/// Cheap to clone; initializers are shared behind an `Arc`.
#[derive(Clone)]
pub struct TelemetryClient {
    enabled: bool,
    initializers: Arc<Vec<Box<dyn TelemetryInitializer>>>,
}

impl TelemetryClient {
    pub fn new(enabled: bool, initializers: Vec<Box<dyn TelemetryInitializer>>) -> Self {
        Self {
            enabled,
            initializers: Arc::new(initializers),
        }
    }

    /// Client with the role-name initializer from configuration
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            config.enabled,
            vec![Box::new(CloudRoleNameInitializer::new(config.role_name.clone()))],
        )
    }

    /// Client that drops every record
    pub fn disabled() -> Self {
        Self::new(false, Vec::new())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run initializers in registration order.
    ///
    /// Returns `None` when the client is disabled.
    pub fn prepare(&self, mut record: TelemetryRecord) -> Option<TelemetryRecord> {
        if !self.enabled {
            return None;
        }
        for initializer in self.initializers.iter() {
            initializer.initialize(&mut record);
        }
        Some(record)
    }

    /// Initialize and emit a record.
    pub fn track(&self, record: TelemetryRecord) {
        let Some(record) = self.prepare(record) else {
            return;
        };

        tracing::info!(
            target: TELEMETRY_TARGET,
            name = %record.name,
            timestamp = %record.timestamp.to_rfc3339(),
            role_name = record.context.cloud.role_name.as_deref().unwrap_or(""),
            duration_ms = record.duration_ms,
            success = record.success,
            response_code = record.response_code,
            properties = ?record.properties,
            "telemetry"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PropertyInitializer(&'static str, &'static str);

    impl TelemetryInitializer for PropertyInitializer {
        fn initialize(&self, record: &mut TelemetryRecord) {
            record.properties.insert(self.0.to_string(), self.1.to_string());
        }
    }

    /// Copies the current role name into a property, to observe ordering
    struct RoleEcho;

    impl TelemetryInitializer for RoleEcho {
        fn initialize(&self, record: &mut TelemetryRecord) {
            let role = record.context.cloud.role_name.clone().unwrap_or_default();
            record.properties.insert("seen_role".to_string(), role);
        }
    }

    #[test]
    fn test_role_name_is_set() {
        let tagger = CloudRoleNameInitializer::new("carts-api");
        let mut record = TelemetryRecord::new("GET /health");

        tagger.initialize(&mut record);

        assert_eq!(record.context.cloud.role_name.as_deref(), Some("carts-api"));
    }

    #[test]
    fn test_role_name_overwrites_prior_value() {
        let tagger = CloudRoleNameInitializer::new("carts-api");
        let mut record = TelemetryRecord::new("dependency").with_property("k", "v");
        record.context.cloud.role_name = Some("products-api".to_string());

        tagger.initialize(&mut record);

        assert_eq!(record.context.cloud.role_name.as_deref(), Some("carts-api"));
        // Nothing else is touched
        assert_eq!(record.properties.get("k").map(String::as_str), Some("v"));
        assert_eq!(record.name, "dependency");
    }

    #[test]
    fn test_role_name_applies_to_every_record() {
        let tagger = CloudRoleNameInitializer::new("carts-api");
        let mut records = vec![
            TelemetryRecord::new("a"),
            TelemetryRecord::request("b", 502, 3),
            TelemetryRecord::new("c"),
        ];
        records[2].context.cloud.role_name = Some(String::new());

        for record in records.iter_mut() {
            tagger.initialize(record);
        }

        assert!(records
            .iter()
            .all(|r| r.context.cloud.role_name.as_deref() == Some("carts-api")));
    }

    #[test]
    fn test_request_record_success_from_status() {
        assert_eq!(TelemetryRecord::request("r", 200, 1).success, Some(true));
        assert_eq!(TelemetryRecord::request("r", 206, 1).success, Some(true));
        assert_eq!(TelemetryRecord::request("r", 404, 1).success, Some(true));
        assert_eq!(TelemetryRecord::request("r", 502, 1).success, Some(false));
    }

    #[test]
    fn test_client_runs_initializers_in_order() {
        let client = TelemetryClient::new(
            true,
            vec![
                Box::new(RoleEcho),
                Box::new(CloudRoleNameInitializer::new("carts-api")),
                Box::new(PropertyInitializer("env", "test")),
            ],
        );

        let record = client.prepare(TelemetryRecord::new("r")).unwrap();

        // RoleEcho ran before the role name was set
        assert_eq!(record.properties.get("seen_role").map(String::as_str), Some(""));
        assert_eq!(record.properties.get("env").map(String::as_str), Some("test"));
        assert_eq!(record.context.cloud.role_name.as_deref(), Some("carts-api"));
    }

    #[test]
    fn test_disabled_client_drops_records() {
        let client = TelemetryClient::new(
            false,
            vec![Box::new(CloudRoleNameInitializer::new("carts-api"))],
        );
        assert!(!client.is_enabled());
        assert!(client.prepare(TelemetryRecord::new("r")).is_none());
        client.track(TelemetryRecord::new("r"));
        assert!(TelemetryClient::disabled().prepare(TelemetryRecord::new("r")).is_none());
    }

    #[test]
    fn test_from_config_tags_role_name() {
        let config = TelemetryConfig {
            enabled: true,
            role_name: "contoso-carts".to_string(),
        };
        let client = TelemetryClient::from_config(&config);
        let record = client.prepare(TelemetryRecord::new("r")).unwrap();
        assert_eq!(record.context.cloud.role_name.as_deref(), Some("contoso-carts"));
    }
}
