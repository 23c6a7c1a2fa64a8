use crate::error::{AppError, GENERIC_FAILURE};
use bcrypt::{hash, verify};

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(hash(password, cost)?)
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    Ok(verify(password, hashed_password)?)
}

/// `hash_password` on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(join_failure)?
}

/// `verify_password` on the blocking pool.
pub async fn verify_password_blocking(password: String, hashed_password: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hashed_password))
        .await
        .map_err(join_failure)?
}

fn join_failure(error: tokio::task::JoinError) -> AppError {
    log::error!("password hashing task failed: {}", error);
    AppError::InternalServerError(GENERIC_FAILURE.into())
}
