use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;

use crate::configs::Storage;
use crate::errors::DeviceError;
use crate::models::{Device, DeviceKind, TemperatureScale};
use crate::repositories::{
    DeviceRepository, HouseRepository, ThemeRepository, TriggerRepository, UserRepository,
};
use crate::services::vendor::{self, ReadingSource};

/// Entities touched by a cascading device removal.
#[derive(Debug)]
pub struct CascadeReport {
    pub device: Device,
    pub themes: Vec<i32>,
    pub triggers: Vec<i32>,
}

/// The only mutation path for device state. Control operations serialize on
/// a per-device mutex so the lock check and the write cannot interleave with
/// another caller; vendor reads happen before the mutex is taken.
pub struct DeviceService {
    storage: Arc<Storage>,
    device_repository: Arc<DeviceRepository>,
    house_repository: Arc<HouseRepository>,
    user_repository: Arc<UserRepository>,
    theme_repository: Arc<ThemeRepository>,
    trigger_repository: Arc<TriggerRepository>,
    reading_source: Arc<dyn ReadingSource>,
    device_locks: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl DeviceService {
    pub fn new(
        storage: Arc<Storage>,
        device_repository: Arc<DeviceRepository>,
        house_repository: Arc<HouseRepository>,
        user_repository: Arc<UserRepository>,
        theme_repository: Arc<ThemeRepository>,
        trigger_repository: Arc<TriggerRepository>,
        reading_source: Arc<dyn ReadingSource>,
    ) -> Self {
        Self {
            storage,
            device_repository,
            house_repository,
            user_repository,
            theme_repository,
            trigger_repository,
            reading_source,
            device_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, device_id: i32) -> Arc<Mutex<()>> {
        let mut locks = self.device_locks.lock().await;
        locks.entry(device_id).or_default().clone()
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_device(
        &self,
        house_id: i32,
        room_id: Option<i32>,
        name: &str,
        kind: DeviceKind,
        target: serde_json::Value,
        status: serde_json::Value,
        configuration: serde_json::Value,
        vendor: &str,
    ) -> Result<Device, DeviceError> {
        if self
            .device_repository
            .find_by_house_and_name(house_id, name)
            .await?
            .is_some()
        {
            return Err(DeviceError::DuplicateName);
        }
        vendor::validate_configuration(vendor, &configuration)?;

        let mut device = Device {
            id: 0,
            house_id,
            room_id,
            name: name.to_string(),
            device_type: kind.as_str().to_string(),
            vendor: vendor.to_string(),
            configuration,
            target,
            status,
            temperature_scale: None,
            locking_theme_id: None,
        };
        apply_type_defaults(&mut device, kind);

        let mut tx = self.storage.get_pool().begin().await?;
        let device_id = self.device_repository.create(&device, &mut tx).await?;
        tx.commit().await?;

        // Initial reading is best effort: a device whose vendor endpoint is
        // down at creation time is still created.
        if let Err(error) = self.update_device_reading(device_id).await {
            tracing::warn!(device_id, "initial reading failed: {error}");
        }

        self.get_device_by_id(device_id).await
    }

    pub async fn get_device_by_id(&self, device_id: i32) -> Result<Device, DeviceError> {
        self.device_repository
            .find_by_id(device_id)
            .await?
            .ok_or(DeviceError::DeviceNotFound)
    }

    pub async fn get_devices_for_house(&self, house_id: i32) -> Result<Vec<Device>, DeviceError> {
        Ok(self.device_repository.find_by_house_id(house_id).await?)
    }

    pub async fn get_devices_for_room(&self, room_id: i32) -> Result<Vec<Device>, DeviceError> {
        Ok(self.device_repository.find_by_room_id(room_id).await?)
    }

    pub async fn get_all_devices(&self) -> Result<Vec<Device>, DeviceError> {
        Ok(self.device_repository.find_all().await?)
    }

    pub async fn link_device_to_room(
        &self,
        room_id: i32,
        device_id: i32,
    ) -> Result<Device, DeviceError> {
        let _ = self.get_device_by_id(device_id).await?;

        let mut tx = self.storage.get_pool().begin().await?;
        self.device_repository
            .update_room_id(device_id, Some(room_id), &mut tx)
            .await?;
        tx.commit().await?;

        self.get_device_by_id(device_id).await
    }

    /// Called when a room is removed: the device survives, unlinked.
    pub async fn unlink_device_from_room(&self, device_id: i32) -> Result<(), DeviceError> {
        let mut tx = self.storage.get_pool().begin().await?;
        self.device_repository
            .update_room_id(device_id, None, &mut tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Removes a device and cleans every reference to it: theme settings lose
    /// the device's pairs, triggers sensing or actuating it are deleted. The
    /// report lists what was touched so callers can reconcile.
    pub async fn remove_device(&self, device_id: i32) -> Result<CascadeReport, DeviceError> {
        let lock = self.lock_for(device_id).await;
        let _guard = lock.lock().await;

        let device = self.get_device_by_id(device_id).await?;

        let mut tx = self.storage.get_pool().begin().await?;

        let mut themes = Vec::new();
        for theme in self.theme_repository.find_all().await? {
            let Ok(settings) = theme.parsed_settings() else {
                tracing::warn!(theme_id = theme.id, "skipping theme with malformed settings");
                continue;
            };
            if settings.iter().any(|pair| pair.device_id == device_id) {
                let remaining: Vec<_> = settings
                    .into_iter()
                    .filter(|pair| pair.device_id != device_id)
                    .collect();
                let value =
                    serde_json::to_value(&remaining).map_err(|_| DeviceError::InvalidValue)?;
                self.theme_repository
                    .update_settings(theme.id, &value, &mut tx)
                    .await?;
                themes.push(theme.id);
            }
        }

        let mut triggers = Vec::new();
        for trigger in self.trigger_repository.find_by_sensor_id(device_id).await? {
            triggers.push(trigger.id);
        }
        for trigger in self.trigger_repository.find_by_actor_id(device_id).await? {
            if !triggers.contains(&trigger.id) {
                triggers.push(trigger.id);
            }
        }
        for trigger_id in &triggers {
            self.trigger_repository.delete(*trigger_id, &mut tx).await?;
        }

        self.device_repository.delete(device_id, &mut tx).await?;
        tx.commit().await?;

        Ok(CascadeReport {
            device,
            themes,
            triggers,
        })
    }

    /// The device's current reading: sensors come from the vendor source,
    /// thermostats and switches reflect their own control state.
    pub async fn read_current_state(&self, device: &Device) -> Result<f64, DeviceError> {
        match device.kind()? {
            DeviceKind::MotionSensor | DeviceKind::OpenSensor => {
                Ok(self.reading_source.read_current_value(device).await?)
            }
            DeviceKind::Thermostat | DeviceKind::LightSwitch => {
                Ok(device.control_state()?.unwrap_or(0.0))
            }
        }
    }

    /// Fetches the reading without holding the device mutex, then takes it
    /// only for the write.
    pub async fn update_device_reading(&self, device_id: i32) -> Result<f64, DeviceError> {
        let device = self.get_device_by_id(device_id).await?;
        let reading = self.read_current_state(&device).await?;

        let lock = self.lock_for(device_id).await;
        let _guard = lock.lock().await;

        let mut device = self.get_device_by_id(device_id).await?;
        device.set_last_read(reading);
        if matches!(
            device.kind()?,
            DeviceKind::MotionSensor | DeviceKind::OpenSensor
        ) {
            device.set_sensor_data(reading);
        }

        let mut tx = self.storage.get_pool().begin().await?;
        self.device_repository
            .update_status(device_id, &device.status, &mut tx)
            .await?;
        tx.commit().await?;

        Ok(reading)
    }

    pub async fn update_all_device_readings(&self) -> Result<(), DeviceError> {
        for device in self.device_repository.find_all().await? {
            if let Err(error) = self.update_device_reading(device.id).await {
                tracing::warn!(device_id = device.id, "reading refresh failed: {error}");
            }
        }

        Ok(())
    }

    /// Returns whether the value was applied. A device locked by a theme
    /// swallows the write without error; type and value validation still
    /// happen first.
    pub async fn set_power_state(
        &self,
        device_id: i32,
        power_state: i64,
    ) -> Result<bool, DeviceError> {
        let lock = self.lock_for(device_id).await;
        let _guard = lock.lock().await;

        let mut device = self.get_device_by_id(device_id).await?;
        device.configure_power_state(power_state)?;

        if device.locking_theme_id.is_some() {
            tracing::debug!(device_id, "power write suppressed: device is theme-locked");
            return Ok(false);
        }

        device.set_last_read(power_state as f64);

        let mut tx = self.storage.get_pool().begin().await?;
        self.device_repository
            .update_status(device_id, &device.status, &mut tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }

    /// Same contract as [`Self::set_power_state`], for thermostats.
    pub async fn set_target_temperature(
        &self,
        device_id: i32,
        temp: f64,
    ) -> Result<bool, DeviceError> {
        let lock = self.lock_for(device_id).await;
        let _guard = lock.lock().await;

        let mut device = self.get_device_by_id(device_id).await?;
        device.configure_target_temperature(temp)?;

        if device.locking_theme_id.is_some() {
            tracing::debug!(
                device_id,
                "temperature write suppressed: device is theme-locked"
            );
            return Ok(false);
        }

        device.set_last_read(temp);

        let mut tx = self.storage.get_pool().begin().await?;
        self.device_repository
            .update_target(device_id, &device.target, &mut tx)
            .await?;
        self.device_repository
            .update_status(device_id, &device.status, &mut tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }

    /// Unconditional: themes claim and release devices through this, so it
    /// must not itself be subject to the lock check. State is re-read after
    /// the change.
    pub async fn set_locking_theme_id(
        &self,
        device_id: i32,
        locking_theme_id: Option<i32>,
    ) -> Result<Device, DeviceError> {
        {
            let lock = self.lock_for(device_id).await;
            let _guard = lock.lock().await;

            let _ = self.get_device_by_id(device_id).await?;

            let mut tx = self.storage.get_pool().begin().await?;
            self.device_repository
                .update_locking_theme_id(device_id, locking_theme_id, &mut tx)
                .await?;
            tx.commit().await?;
        }

        if let Err(error) = self.update_device_reading(device_id).await {
            tracing::warn!(device_id, "reading refresh after lock change failed: {error}");
        }

        self.get_device_by_id(device_id).await
    }

    pub async fn change_temperature_scale(
        &self,
        device_id: i32,
    ) -> Result<Device, DeviceError> {
        let lock = self.lock_for(device_id).await;
        let _guard = lock.lock().await;

        let mut device = self.get_device_by_id(device_id).await?;
        let scale: TemperatureScale = device.convert_temperature_scale()?;

        let mut tx = self.storage.get_pool().begin().await?;
        self.device_repository
            .update_target(device_id, &device.target, &mut tx)
            .await?;
        self.device_repository
            .update_status(device_id, &device.status, &mut tx)
            .await?;
        self.device_repository
            .update_temperature_scale(device_id, scale.as_str(), &mut tx)
            .await?;
        tx.commit().await?;

        Ok(device)
    }

    pub async fn get_faulty_devices(&self) -> Result<Vec<Device>, DeviceError> {
        let devices = self.device_repository.find_all().await?;

        Ok(devices.into_iter().filter(Device::is_faulty).collect())
    }

    /// Fleet scan restricted to one user's houses; the result is cached on
    /// the user row as a cheap health flag.
    pub async fn get_faulty_devices_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<Device>, DeviceError> {
        let mut faulty = Vec::new();
        for house in self.house_repository.find_by_user_id(user_id).await? {
            for device in self.device_repository.find_by_house_id(house.id).await? {
                if device.is_faulty() {
                    faulty.push(device);
                }
            }
        }

        let mut tx = self.storage.get_pool().begin().await?;
        self.user_repository
            .update_faulty(user_id, !faulty.is_empty(), &mut tx)
            .await?;
        tx.commit().await?;

        Ok(faulty)
    }

    /// Per-device daily consumption, oldest date first.
    pub async fn get_energy_consumption(
        &self,
        device_id: i32,
    ) -> Result<Vec<(Date, f64)>, DeviceError> {
        let device = self.get_device_by_id(device_id).await?;
        let series = self.reading_source.read_energy_series(&device).await?;

        // Vendors report newest first.
        let mut consumption = Vec::with_capacity(series.len());
        for (timestamp, value) in series.into_iter().rev() {
            let date = OffsetDateTime::from_unix_timestamp(timestamp)
                .map_err(|_| DeviceError::InvalidValue)?
                .date();
            consumption.push((date, value));
        }

        Ok(consumption)
    }

    /// Per-date sums across the whole fleet. Dates are outer-joined: a date
    /// missing from one device's series contributes zero for that device
    /// instead of dropping the day. Devices whose vendor is unreachable are
    /// skipped.
    pub async fn get_overall_consumption(&self) -> Result<Vec<(Date, f64)>, DeviceError> {
        let mut merged: BTreeMap<Date, f64> = BTreeMap::new();

        for device in self.device_repository.find_all().await? {
            match self.get_energy_consumption(device.id).await {
                Ok(consumption) => {
                    for (date, value) in consumption {
                        *merged.entry(date).or_insert(0.0) += value;
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        device_id = device.id,
                        "device skipped in overall consumption: {error}"
                    );
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}

fn apply_type_defaults(device: &mut Device, kind: DeviceKind) {
    if !device.target.is_object() {
        device.target = serde_json::Value::Object(serde_json::Map::new());
    }
    device.set_last_read(0.0);

    match kind {
        DeviceKind::Thermostat => {
            device.target["locked_min_temperature"] = serde_json::Value::from(0.0);
            device.target["locked_max_temperature"] = serde_json::Value::from(50.0);
            device.target["target_temperature"] = serde_json::Value::from(25.0);
            device.status["last_temperature"] = serde_json::Value::from(0.0);
            device.temperature_scale = Some(TemperatureScale::Celsius.as_str().to_string());
        }
        DeviceKind::MotionSensor | DeviceKind::OpenSensor => {
            device.set_sensor_data(0.0);
        }
        DeviceKind::LightSwitch => {
            device.status["power_state"] = serde_json::Value::from(0);
        }
    }
}
