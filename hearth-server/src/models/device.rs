use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Table;
use crate::errors::DeviceError;

/// Closed set of device variants. The stored `device_type` tag is mapped to
/// this enum at load time, so adding a variant is an exhaustive-match change
/// rather than a string comparison scattered across the codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Thermostat,
    MotionSensor,
    LightSwitch,
    OpenSensor,
}

impl DeviceKind {
    pub fn parse(tag: &str) -> Result<Self, DeviceError> {
        match tag {
            "thermostat" => Ok(Self::Thermostat),
            "motion_sensor" => Ok(Self::MotionSensor),
            "light_switch" => Ok(Self::LightSwitch),
            "open_sensor" => Ok(Self::OpenSensor),
            _ => Err(DeviceError::InvalidDeviceType),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thermostat => "thermostat",
            Self::MotionSensor => "motion_sensor",
            Self::LightSwitch => "light_switch",
            Self::OpenSensor => "open_sensor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureScale {
    Celsius,
    Fahrenheit,
}

impl TemperatureScale {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "C" => Some(Self::Celsius),
            "F" => Some(Self::Fahrenheit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

pub fn celsius_to_fahrenheit(value: f64) -> f64 {
    value * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(value: f64) -> f64 {
    (value - 32.0) * 5.0 / 9.0
}

/// One physical or virtual device. `target` holds the settable fields,
/// `status` the last observed ones, `configuration` the vendor-specific
/// connection blob. A non-null `locking_theme_id` means the device is under
/// exclusive control of that theme and direct control calls are suppressed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: i32,
    pub house_id: i32,
    pub room_id: Option<i32>,
    pub name: String,
    pub device_type: String,
    pub vendor: String,
    pub configuration: Value,
    pub target: Value,
    pub status: Value,
    pub temperature_scale: Option<String>,
    pub locking_theme_id: Option<i32>,
}

fn number_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn set_number_field(value: &mut Value, key: &str, number: f64) {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    value[key] = Value::from(number);
}

impl Device {
    pub fn kind(&self) -> Result<DeviceKind, DeviceError> {
        DeviceKind::parse(&self.device_type)
    }

    pub fn scale(&self) -> Option<TemperatureScale> {
        self.temperature_scale
            .as_deref()
            .and_then(TemperatureScale::parse)
    }

    pub fn target_temperature(&self) -> Option<f64> {
        number_field(&self.target, "target_temperature")
    }

    pub fn locked_min_temperature(&self) -> Option<f64> {
        number_field(&self.target, "locked_min_temperature")
    }

    pub fn locked_max_temperature(&self) -> Option<f64> {
        number_field(&self.target, "locked_max_temperature")
    }

    pub fn last_temperature(&self) -> Option<f64> {
        number_field(&self.status, "last_temperature")
    }

    pub fn last_read(&self) -> Option<f64> {
        number_field(&self.status, "last_read")
    }

    pub fn sensor_data(&self) -> Option<f64> {
        number_field(&self.status, "sensor_data")
    }

    pub fn power_state(&self) -> Option<i64> {
        self.status.get("power_state").and_then(Value::as_i64)
    }

    pub fn set_last_read(&mut self, reading: f64) {
        set_number_field(&mut self.status, "last_read", reading);
    }

    pub fn set_sensor_data(&mut self, reading: f64) {
        set_number_field(&mut self.status, "sensor_data", reading);
    }

    /// Switch-only. Fails on any other variant, and on values outside {0, 1}.
    pub fn configure_power_state(&mut self, state: i64) -> Result<(), DeviceError> {
        if self.kind()? != DeviceKind::LightSwitch {
            return Err(DeviceError::WrongDeviceType);
        }
        if state != 0 && state != 1 {
            return Err(DeviceError::InvalidValue);
        }
        if !self.status.is_object() {
            self.status = Value::Object(Map::new());
        }
        self.status["power_state"] = Value::from(state);

        Ok(())
    }

    /// Thermostat-only. Locked bounds are inclusive on both ends.
    pub fn configure_target_temperature(&mut self, temp: f64) -> Result<(), DeviceError> {
        if self.kind()? != DeviceKind::Thermostat {
            return Err(DeviceError::WrongDeviceType);
        }
        if let Some(min) = self.locked_min_temperature() {
            if temp < min {
                return Err(DeviceError::OutOfRange);
            }
        }
        if let Some(max) = self.locked_max_temperature() {
            if temp > max {
                return Err(DeviceError::OutOfRange);
            }
        }
        set_number_field(&mut self.target, "target_temperature", temp);

        Ok(())
    }

    /// The control-state side of a reading. Thermostats and switches report
    /// their own target/power value as the "read" state; sensors have no
    /// control state and are read from the vendor source instead.
    pub fn control_state(&self) -> Result<Option<f64>, DeviceError> {
        match self.kind()? {
            DeviceKind::Thermostat => Ok(self.target_temperature()),
            DeviceKind::LightSwitch => Ok(self.power_state().map(|state| state as f64)),
            DeviceKind::MotionSensor | DeviceKind::OpenSensor => Ok(None),
        }
    }

    /// Liveness/sanity check used by fleet-health scans.
    pub fn is_faulty(&self) -> bool {
        let Ok(kind) = self.kind() else {
            return true;
        };

        match kind {
            DeviceKind::Thermostat => {
                let plausible = self
                    .last_temperature()
                    .is_some_and(|temp| (-40.0..=100.0).contains(&temp));
                self.last_read().is_none() || !plausible
            }
            DeviceKind::MotionSensor | DeviceKind::OpenSensor => !self
                .last_read()
                .is_some_and(|reading| (0.0..=1.0).contains(&reading)),
            DeviceKind::LightSwitch => !matches!(self.power_state(), Some(0) | Some(1)),
        }
    }

    /// Toggles between Celsius and Fahrenheit, rewriting the target
    /// temperature, locked bounds and last observed temperature with full
    /// precision. Returns the new scale.
    pub fn convert_temperature_scale(&mut self) -> Result<TemperatureScale, DeviceError> {
        if self.kind()? != DeviceKind::Thermostat {
            return Err(DeviceError::WrongDeviceType);
        }
        let scale = self.scale().ok_or(DeviceError::InvalidValue)?;

        let (next, convert): (TemperatureScale, fn(f64) -> f64) = match scale {
            TemperatureScale::Celsius => (TemperatureScale::Fahrenheit, celsius_to_fahrenheit),
            TemperatureScale::Fahrenheit => (TemperatureScale::Celsius, fahrenheit_to_celsius),
        };

        for key in [
            "target_temperature",
            "locked_min_temperature",
            "locked_max_temperature",
        ] {
            if let Some(value) = number_field(&self.target, key) {
                set_number_field(&mut self.target, key, convert(value));
            }
        }
        if let Some(value) = self.last_temperature() {
            set_number_field(&mut self.status, "last_temperature", convert(value));
        }
        self.temperature_scale = Some(next.as_str().to_string());

        Ok(next)
    }
}

#[derive(Clone)]
pub struct DeviceTable;

impl Table for DeviceTable {
    fn name(&self) -> &'static str {
        "devices"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                house_id INTEGER NOT NULL,
                room_id INTEGER,
                name VARCHAR(255) NOT NULL,
                device_type VARCHAR(32) NOT NULL,
                vendor VARCHAR(32) NOT NULL,
                configuration JSON NOT NULL,
                target JSON NOT NULL,
                status JSON NOT NULL,
                temperature_scale VARCHAR(1),
                locking_theme_id INTEGER,
                UNIQUE (house_id, name),
                FOREIGN KEY (house_id) REFERENCES houses (id) ON DELETE CASCADE,
                FOREIGN KEY (room_id) REFERENCES rooms (id) ON DELETE SET NULL,
                FOREIGN KEY (locking_theme_id) REFERENCES themes (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS devices;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["houses", "rooms", "themes"]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn thermostat() -> Device {
        Device {
            id: 1,
            house_id: 1,
            room_id: None,
            name: "Therm1".to_string(),
            device_type: "thermostat".to_string(),
            vendor: "OWN".to_string(),
            configuration: json!({"url": "http://x"}),
            target: json!({
                "target_temperature": 25.0,
                "locked_min_temperature": 0.0,
                "locked_max_temperature": 50.0
            }),
            status: json!({"last_read": 25.0, "last_temperature": 21.5}),
            temperature_scale: Some("C".to_string()),
            locking_theme_id: None,
        }
    }

    #[test]
    fn test_target_temperature_bounds_are_inclusive() {
        let mut device = thermostat();

        assert!(device.configure_target_temperature(0.0).is_ok());
        assert!(device.configure_target_temperature(50.0).is_ok());
        assert!(matches!(
            device.configure_target_temperature(-0.5),
            Err(DeviceError::OutOfRange)
        ));
        assert!(matches!(
            device.configure_target_temperature(50.5),
            Err(DeviceError::OutOfRange)
        ));
    }

    #[test]
    fn test_power_state_rejected_on_thermostat() {
        let mut device = thermostat();

        assert!(matches!(
            device.configure_power_state(1),
            Err(DeviceError::WrongDeviceType)
        ));
    }

    #[test]
    fn test_scale_conversion_round_trip_keeps_precision() {
        let mut device = thermostat();
        device
            .configure_target_temperature(21.3)
            .expect("in bounds");

        assert_eq!(
            device.convert_temperature_scale().unwrap(),
            TemperatureScale::Fahrenheit
        );
        assert_eq!(device.target_temperature(), Some(21.3 * 9.0 / 5.0 + 32.0));

        assert_eq!(
            device.convert_temperature_scale().unwrap(),
            TemperatureScale::Celsius
        );
        assert!((device.target_temperature().unwrap() - 21.3).abs() < f64::EPSILON * 100.0);
        assert!((device.locked_max_temperature().unwrap() - 50.0).abs() < f64::EPSILON * 100.0);
        assert!((device.locked_min_temperature().unwrap() - 0.0).abs() < f64::EPSILON * 100.0);
        assert!((device.last_temperature().unwrap() - 21.5).abs() < f64::EPSILON * 100.0);
    }

    #[test]
    fn test_unknown_device_type_is_faulty() {
        let mut device = thermostat();
        device.device_type = "toaster".to_string();

        assert!(device.is_faulty());
    }

    #[test]
    fn test_sensor_reading_out_of_range_is_faulty() {
        let mut device = thermostat();
        device.device_type = "motion_sensor".to_string();
        device.status = json!({"last_read": 0.0, "sensor_data": 0.0});
        assert!(!device.is_faulty());

        device.set_last_read(3.0);
        assert!(device.is_faulty());
    }
}
