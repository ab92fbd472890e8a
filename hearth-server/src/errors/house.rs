#[derive(Debug, thiserror::Error)]
pub enum HouseError {
    #[error("House not found")]
    HouseNotFound,

    #[error("House name already exists for this user")]
    DuplicateName,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
