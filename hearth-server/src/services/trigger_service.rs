use std::sync::Arc;

use serde_json::Value;

use crate::configs::Storage;
use crate::errors::TriggerError;
use crate::models::{Trigger, TriggerAction, TriggerEvent, required_number};
use crate::repositories::TriggerRepository;
use crate::services::DeviceService;

/// Edge-triggered automation. Rules are evaluated by a periodic sweep: each
/// rule compares the sensor's fresh reading against the baseline recorded at
/// the previous sweep, fires its action on a crossing, and stores the fresh
/// reading as the next baseline.
pub struct TriggerService {
    storage: Arc<Storage>,
    trigger_repository: Arc<TriggerRepository>,
    device_service: Arc<DeviceService>,
}

impl TriggerService {
    pub fn new(
        storage: Arc<Storage>,
        trigger_repository: Arc<TriggerRepository>,
        device_service: Arc<DeviceService>,
    ) -> Self {
        Self {
            storage,
            trigger_repository,
            device_service,
        }
    }

    pub async fn get_trigger_by_id(&self, trigger_id: i32) -> Result<Trigger, TriggerError> {
        self.trigger_repository
            .find_by_id(trigger_id)
            .await?
            .ok_or(TriggerError::TriggerNotFound)
    }

    pub async fn get_triggers_for_user(&self, user_id: i32) -> Result<Vec<Trigger>, TriggerError> {
        Ok(self.trigger_repository.find_by_user_id(user_id).await?)
    }

    /// Rules sensing this device.
    pub async fn get_triggers_for_device(
        &self,
        device_id: i32,
    ) -> Result<Vec<Trigger>, TriggerError> {
        Ok(self.trigger_repository.find_by_sensor_id(device_id).await?)
    }

    /// Rules acting on this device.
    pub async fn get_actions_for_device(
        &self,
        device_id: i32,
    ) -> Result<Vec<Trigger>, TriggerError> {
        Ok(self.trigger_repository.find_by_actor_id(device_id).await?)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_trigger(
        &self,
        user_id: i32,
        sensor_id: i32,
        event: &str,
        event_params: Value,
        actor_id: i32,
        action: &str,
        action_params: Value,
    ) -> Result<Trigger, TriggerError> {
        let event = TriggerEvent::parse(event)?;
        let action = TriggerAction::parse(action)?;
        validate_params(event, &event_params, action, &action_params)?;

        let _ = self.device_service.get_device_by_id(sensor_id).await?;
        let _ = self.device_service.get_device_by_id(actor_id).await?;

        let trigger = Trigger {
            id: 0,
            user_id,
            sensor_id,
            event: event.as_str().to_string(),
            event_params,
            actor_id,
            action: action.as_str().to_string(),
            action_params,
            reading: None,
        };

        let mut tx = self.storage.get_pool().begin().await?;
        let trigger_id = self.trigger_repository.create(&trigger, &mut tx).await?;
        tx.commit().await?;

        self.get_trigger_by_id(trigger_id).await
    }

    pub async fn edit_trigger(
        &self,
        trigger_id: i32,
        event: &str,
        event_params: Value,
        action: &str,
        action_params: Value,
    ) -> Result<Trigger, TriggerError> {
        let _ = self.get_trigger_by_id(trigger_id).await?;
        let event = TriggerEvent::parse(event)?;
        let action = TriggerAction::parse(action)?;
        validate_params(event, &event_params, action, &action_params)?;

        let mut tx = self.storage.get_pool().begin().await?;
        self.trigger_repository
            .update_rule(
                trigger_id,
                event.as_str(),
                &event_params,
                action.as_str(),
                &action_params,
                &mut tx,
            )
            .await?;
        // The rule changed, so the old baseline no longer means anything.
        self.trigger_repository
            .update_reading(trigger_id, None, &mut tx)
            .await?;
        tx.commit().await?;

        self.get_trigger_by_id(trigger_id).await
    }

    pub async fn remove_trigger(&self, trigger_id: i32) -> Result<(), TriggerError> {
        let _ = self.get_trigger_by_id(trigger_id).await?;

        let mut tx = self.storage.get_pool().begin().await?;
        self.trigger_repository.delete(trigger_id, &mut tx).await?;
        tx.commit().await?;

        Ok(())
    }

    /// One polling sweep over every rule. A failing rule is logged and
    /// skipped. Returns the ids of the triggers that fired.
    pub async fn check_all_triggers(&self) -> Result<Vec<i32>, TriggerError> {
        let mut fired = Vec::new();
        for trigger in self.trigger_repository.find_all().await? {
            match self.evaluate_trigger(&trigger).await {
                Ok(true) => fired.push(trigger.id),
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(trigger_id = trigger.id, "trigger sweep failed: {error}");
                }
            }
        }

        Ok(fired)
    }

    /// A rule with no baseline only records one: the first sweep after
    /// creation never fires, whatever the sensor says.
    async fn evaluate_trigger(&self, trigger: &Trigger) -> Result<bool, TriggerError> {
        let event = TriggerEvent::parse(&trigger.event)?;
        let reading = self
            .device_service
            .update_device_reading(trigger.sensor_id)
            .await?;

        let fired = match trigger.reading {
            Some(baseline) => event.fires(&trigger.event_params, baseline, reading)?,
            None => false,
        };

        if fired {
            self.dispatch_action(trigger).await?;
        }

        let mut tx = self.storage.get_pool().begin().await?;
        self.trigger_repository
            .update_reading(trigger.id, Some(reading), &mut tx)
            .await?;
        tx.commit().await?;

        Ok(fired)
    }

    /// Actions go through the device service's normal control path, so a
    /// theme-locked actor silently swallows the action.
    async fn dispatch_action(&self, trigger: &Trigger) -> Result<(), TriggerError> {
        match TriggerAction::parse(&trigger.action)? {
            TriggerAction::SetTargetTemperature => {
                let temp = required_number(&trigger.action_params, "target_temperature")?;
                let applied = self
                    .device_service
                    .set_target_temperature(trigger.actor_id, temp)
                    .await?;
                if !applied {
                    tracing::debug!(
                        trigger_id = trigger.id,
                        actor_id = trigger.actor_id,
                        "trigger action suppressed by theme lock"
                    );
                }
            }
            TriggerAction::SetLightSwitch => {
                let state = required_number(&trigger.action_params, "power_state")? as i64;
                let applied = self
                    .device_service
                    .set_power_state(trigger.actor_id, state)
                    .await?;
                if !applied {
                    tracing::debug!(
                        trigger_id = trigger.id,
                        actor_id = trigger.actor_id,
                        "trigger action suppressed by theme lock"
                    );
                }
            }
        }

        Ok(())
    }
}

/// Parameter presence is checked at rule creation so a sweep never trips over
/// a rule that could never fire or act.
fn validate_params(
    event: TriggerEvent,
    event_params: &Value,
    action: TriggerAction,
    action_params: &Value,
) -> Result<(), TriggerError> {
    match event {
        TriggerEvent::TemperatureGetsHigherThan | TriggerEvent::TemperatureGetsLowerThan => {
            required_number(event_params, "threshold")?;
        }
        TriggerEvent::MotionDetectedStart | TriggerEvent::MotionDetectedStop => {}
    }
    match action {
        TriggerAction::SetTargetTemperature => {
            required_number(action_params, "target_temperature")?;
        }
        TriggerAction::SetLightSwitch => {
            required_number(action_params, "power_state")?;
        }
    }

    Ok(())
}
