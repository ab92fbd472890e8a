use crate::errors::DeviceError;

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Trigger not found")]
    TriggerNotFound,

    #[error("Unknown trigger event `{0}`")]
    InvalidEvent(String),

    #[error("Unknown trigger action `{0}`")]
    InvalidAction(String),

    #[error("Missing trigger parameter `{0}`")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
