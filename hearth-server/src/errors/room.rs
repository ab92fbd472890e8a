use crate::errors::DeviceError;

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room name already exists in this house")]
    DuplicateName,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
