use crate::errors::DeviceError;

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("Theme not found")]
    ThemeNotFound,

    #[error("Theme setting payload is malformed")]
    InvalidSetting,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
