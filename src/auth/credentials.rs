use crate::auth::password::{hash_password, hash_password_blocking, verify_password_blocking};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::store::{SharedStore, StoreError};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const USERNAME_TAKEN: &str = "Username already taken";
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Hashed-credential storage on top of the user table.
pub struct Credentials {
    store: SharedStore,
    bcrypt_cost: u32,
    /// Verified against when the username is unknown, so both failure paths cost the same.
    dummy_hash: String,
}

impl Credentials {
    pub fn new(store: SharedStore, bcrypt_cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash_password("taskdesk-no-such-user", bcrypt_cost)?;
        Ok(Self {
            store,
            bcrypt_cost,
            dummy_hash,
        })
    }

    /// Hashes the password and inserts the user. The username's uniqueness is
    /// enforced by the store in the same statement as the insert.
    pub async fn create(&self, username: &str, email: &str, password: &str) -> Result<User, AppError> {
        let password_hash = hash_password_blocking(password.to_owned(), self.bcrypt_cost).await?;
        let new_user = NewUser {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash,
        };

        match self.store.insert_user(new_user).await {
            Ok(user) => Ok(user),
            Err(StoreError::Duplicate(_)) => Err(AppError::Conflict(USERNAME_TAKEN.into())),
            Err(e) => {
                log::error!("user creation error: {}", e);
                Err(AppError::InternalServerError(REGISTRATION_FAILED.into()))
            }
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.store.find_user_by_username(username).await?)
    }

    /// Returns the user if the password matches. Unknown users and wrong
    /// passwords fail identically.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = self.find_by_username(username).await?;
        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());

        let matches = match verify_password_blocking(password.to_owned(), hash).await {
            Ok(matches) => matches,
            Err(e) => {
                log::error!("credential verification error: {}", e);
                false
            }
        };

        match user {
            Some(user) if matches => Ok(user),
            _ => {
                log::warn!("failed login attempt");
                Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()))
            }
        }
    }
}
