#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Email address is already registered")]
    EmailExists,

    #[error("Password is incorrect")]
    InvalidCredentials,

    #[error("Token is invalid")]
    InvalidToken,

    #[error("Password hashing failed")]
    Hash,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
