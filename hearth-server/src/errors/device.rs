use crate::services::vendor::VendorError;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Device name already exists in this house")]
    DuplicateName,

    #[error("Unknown device type")]
    InvalidDeviceType,

    #[error("Operation not supported by this device type")]
    WrongDeviceType,

    #[error("Value outside the accepted domain")]
    InvalidValue,

    #[error("Value outside the locked temperature bounds")]
    OutOfRange,

    #[error("Missing required configuration key `{0}`")]
    InvalidConfiguration(&'static str),

    #[error(transparent)]
    Vendor(#[from] VendorError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
