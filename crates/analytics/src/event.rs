//! Closed event schema.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Bumped whenever an event's properties change shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Identity the events are sent under; the developer id travels in the
/// properties.
pub const SINGLE_USER: &str = "cli-user";

/// Every event the CLI can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingEvent {
    DeployRequested,
    DeployStarted,
    SceneLinkStarted,
    SceneLinkSucceeded,
    DeploySucceeded,
    ShareDataAnswered { share_data: bool },
    Error { error_type: String, message: String },
}

impl TrackingEvent {
    /// Stable event name as it appears in the tracking backend.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeployRequested => "Scene deploy requested",
            Self::DeployStarted => "Scene deploy started",
            Self::SceneLinkStarted => "Scene ethereum link started",
            Self::SceneLinkSucceeded => "Scene ethereum link succeeded",
            Self::DeploySucceeded => "Scene deploy success",
            Self::ShareDataAnswered { .. } => "Send Anonymous data",
            Self::Error { .. } => "Error",
        }
    }

    /// The opt-in answer is sent even when tracking is disabled.
    pub fn is_consent_answer(&self) -> bool {
        matches!(self, Self::ShareDataAnswered { .. })
    }

    fn properties(&self) -> Map<String, Value> {
        let value = match self {
            Self::ShareDataAnswered { share_data } => json!({ "shareData": share_data }),
            Self::Error {
                error_type,
                message,
            } => json!({ "errorType": error_type, "message": message }),
            _ => return Map::new(),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Properties attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonProperties {
    pub os: String,
    pub cli_version: String,
    #[serde(rename = "isCI")]
    pub is_ci: bool,
    pub dev_id: String,
    pub schema_version: u32,
}

impl CommonProperties {
    /// Properties for this process. `CI=true` marks continuous
    /// integration runs.
    pub fn detect(dev_id: impl Into<String>, cli_version: impl Into<String>) -> Self {
        Self {
            os: std::env::consts::OS.into(),
            cli_version: cli_version.into(),
            is_ci: std::env::var("CI").is_ok_and(|v| v == "true"),
            dev_id: dev_id.into(),
            schema_version: SCHEMA_VERSION,
        }
    }
}

/// Body of one track call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPayload {
    pub user_id: String,
    pub event: String,
    pub properties: Value,
    pub timestamp: DateTime<Utc>,
}

impl TrackPayload {
    pub fn new(event: &TrackingEvent, common: &CommonProperties) -> Self {
        let mut properties = event.properties();
        if let Ok(Value::Object(shared)) = serde_json::to_value(common) {
            properties.extend(shared);
        }
        Self {
            user_id: SINGLE_USER.into(),
            event: event.name().into(),
            properties: Value::Object(properties),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common() -> CommonProperties {
        CommonProperties {
            os: "linux".into(),
            cli_version: "0.1.0".into(),
            is_ci: false,
            dev_id: "dev-1".into(),
            schema_version: SCHEMA_VERSION,
        }
    }

    #[test]
    fn event_names_are_stable() {
        assert_eq!(TrackingEvent::DeployRequested.name(), "Scene deploy requested");
        assert_eq!(TrackingEvent::DeploySucceeded.name(), "Scene deploy success");
        assert_eq!(
            TrackingEvent::ShareDataAnswered { share_data: true }.name(),
            "Send Anonymous data"
        );
    }

    #[test]
    fn payload_merges_common_properties() {
        let payload = TrackPayload::new(
            &TrackingEvent::Error {
                error_type: "UPLOAD_ERROR".into(),
                message: "boom".into(),
            },
            &common(),
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["userId"], "cli-user");
        assert_eq!(json["event"], "Error");
        assert_eq!(json["properties"]["errorType"], "UPLOAD_ERROR");
        assert_eq!(json["properties"]["message"], "boom");
        assert_eq!(json["properties"]["devId"], "dev-1");
        assert_eq!(json["properties"]["isCI"], false);
        assert_eq!(json["properties"]["cliVersion"], "0.1.0");
        assert_eq!(json["properties"]["schemaVersion"], SCHEMA_VERSION);
    }

    #[test]
    fn plain_events_carry_only_common_properties() {
        let payload = TrackPayload::new(&TrackingEvent::DeployStarted, &common());
        let props = payload.properties.as_object().unwrap();
        assert_eq!(props.len(), 5);
        assert!(props.contains_key("os"));
    }

    #[test]
    fn consent_answer_detection() {
        assert!(TrackingEvent::ShareDataAnswered { share_data: false }.is_consent_answer());
        assert!(!TrackingEvent::DeployStarted.is_consent_answer());
    }
}
