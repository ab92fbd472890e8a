use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Table;
use crate::errors::TriggerError;

/// A standing automation rule: a condition over one device's readings paired
/// with an action on another device. `reading` is the baseline observed at
/// the previous sweep and makes the conditions edge-triggered.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trigger {
    pub id: i32,
    pub user_id: i32,
    pub sensor_id: i32,
    pub event: String,
    pub event_params: Value,
    pub actor_id: i32,
    pub action: String,
    pub action_params: Value,
    pub reading: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    MotionDetectedStart,
    MotionDetectedStop,
    TemperatureGetsHigherThan,
    TemperatureGetsLowerThan,
}

impl TriggerEvent {
    pub fn parse(tag: &str) -> Result<Self, TriggerError> {
        match tag {
            "motion_detected_start" => Ok(Self::MotionDetectedStart),
            "motion_detected_stop" => Ok(Self::MotionDetectedStop),
            "temperature_gets_higher_than" => Ok(Self::TemperatureGetsHigherThan),
            "temperature_gets_lower_than" => Ok(Self::TemperatureGetsLowerThan),
            _ => Err(TriggerError::InvalidEvent(tag.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MotionDetectedStart => "motion_detected_start",
            Self::MotionDetectedStop => "motion_detected_stop",
            Self::TemperatureGetsHigherThan => "temperature_gets_higher_than",
            Self::TemperatureGetsLowerThan => "temperature_gets_lower_than",
        }
    }

    /// Edge detection against the previous sweep's baseline. A condition that
    /// already held at the baseline does not fire again until it has reset.
    pub fn fires(
        &self,
        event_params: &Value,
        baseline: f64,
        reading: f64,
    ) -> Result<bool, TriggerError> {
        match self {
            Self::MotionDetectedStart => Ok(baseline == 0.0 && reading != 0.0),
            Self::MotionDetectedStop => Ok(baseline != 0.0 && reading == 0.0),
            Self::TemperatureGetsHigherThan => {
                let threshold = required_number(event_params, "threshold")?;
                Ok(baseline <= threshold && reading > threshold)
            }
            Self::TemperatureGetsLowerThan => {
                let threshold = required_number(event_params, "threshold")?;
                Ok(baseline >= threshold && reading < threshold)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    SetTargetTemperature,
    SetLightSwitch,
}

impl TriggerAction {
    pub fn parse(tag: &str) -> Result<Self, TriggerError> {
        match tag {
            "set_target_temperature" => Ok(Self::SetTargetTemperature),
            "set_light_switch" => Ok(Self::SetLightSwitch),
            _ => Err(TriggerError::InvalidAction(tag.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetTargetTemperature => "set_target_temperature",
            Self::SetLightSwitch => "set_light_switch",
        }
    }
}

pub(crate) fn required_number(params: &Value, key: &'static str) -> Result<f64, TriggerError> {
    params
        .get(key)
        .and_then(Value::as_f64)
        .ok_or(TriggerError::MissingParameter(key))
}

#[derive(Clone)]
pub struct TriggerTable;

impl Table for TriggerTable {
    fn name(&self) -> &'static str {
        "triggers"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS triggers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                sensor_id INTEGER NOT NULL,
                event VARCHAR(64) NOT NULL,
                event_params JSON NOT NULL,
                actor_id INTEGER NOT NULL,
                action VARCHAR(64) NOT NULL,
                action_params JSON NOT NULL,
                reading DOUBLE,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (sensor_id) REFERENCES devices (id) ON DELETE CASCADE,
                FOREIGN KEY (actor_id) REFERENCES devices (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS triggers;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users", "devices"]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_motion_start_fires_only_on_rising_edge() {
        let event = TriggerEvent::MotionDetectedStart;
        let params = json!({});

        assert!(event.fires(&params, 0.0, 1.0).unwrap());
        assert!(!event.fires(&params, 1.0, 1.0).unwrap());
        assert!(!event.fires(&params, 0.0, 0.0).unwrap());
    }

    #[test]
    fn test_temperature_threshold_requires_crossing() {
        let event = TriggerEvent::TemperatureGetsHigherThan;
        let params = json!({"threshold": 24.0});

        assert!(event.fires(&params, 22.0, 25.0).unwrap());
        // Already above at the baseline: no new edge.
        assert!(!event.fires(&params, 25.0, 26.0).unwrap());
        assert!(!event.fires(&params, 22.0, 23.0).unwrap());
    }

    #[test]
    fn test_missing_threshold_is_reported() {
        let event = TriggerEvent::TemperatureGetsLowerThan;

        assert!(matches!(
            event.fires(&json!({}), 22.0, 18.0),
            Err(TriggerError::MissingParameter("threshold"))
        ));
    }

    #[test]
    fn test_unknown_event_tag_is_rejected() {
        assert!(matches!(
            TriggerEvent::parse("humidity_spike"),
            Err(TriggerError::InvalidEvent(_))
        ));
    }
}
