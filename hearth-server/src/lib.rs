use std::sync::Arc;
use std::time::Duration;

use crate::app::create_app;
use crate::configs::settings::Settings;

pub mod app;
pub mod configs;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;

/// Runs the polling loop: refresh every device's reading, then sweep the
/// trigger rules against the fresh baselines.
pub async fn run(settings: &Arc<Settings>) {
    let app = create_app(settings).await;

    let mut interval = tokio::time::interval(Duration::from_secs(settings.poller.interval_secs));

    tracing::info!(
        interval_secs = settings.poller.interval_secs,
        "poller started"
    );

    loop {
        interval.tick().await;

        if let Err(error) = app.device_service.update_all_device_readings().await {
            tracing::error!("reading sweep failed: {error}");
        }
        match app.trigger_service.check_all_triggers().await {
            Ok(fired) if !fired.is_empty() => {
                tracing::info!(?fired, "triggers fired");
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!("trigger sweep failed: {error}");
            }
        }
    }
}
