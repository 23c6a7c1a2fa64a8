use validator::Validate;

use super::credentials::{Credentials, INVALID_CREDENTIALS, USERNAME_TAKEN};
use super::{LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::models::User;
use crate::session::{Session, USERNAME_KEY, USER_ID_KEY};
use crate::store::SharedStore;

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required";
pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const PASSWORD_TOO_LONG: &str = "Password must be at most 72 bytes";
/// Both bounds count UTF-8 bytes. bcrypt ignores everything past byte 72.
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 72;

/// Registration, login and logout.
pub struct AuthService {
    credentials: Credentials,
}

impl AuthService {
    pub fn new(store: SharedStore, bcrypt_cost: u32) -> Result<Self, AppError> {
        Ok(Self {
            credentials: Credentials::new(store, bcrypt_cost)?,
        })
    }

    /// Creates an account. Checks run in a fixed order and the first failure
    /// is returned; nothing is written unless every check passes.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        let username = request.username.trim();
        let email = request.email.trim();

        if username.is_empty()
            || email.is_empty()
            || request.password.is_empty()
            || request.confirm_password.is_empty()
        {
            return Err(AppError::BadRequest(ALL_FIELDS_REQUIRED.into()));
        }
        if request.password != request.confirm_password {
            return Err(AppError::BadRequest(PASSWORDS_DO_NOT_MATCH.into()));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(PASSWORD_TOO_SHORT.into()));
        }
        if request.password.len() > MAX_PASSWORD_LEN {
            return Err(AppError::BadRequest(PASSWORD_TOO_LONG.into()));
        }
        request.validate()?;

        if self.credentials.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }

        let user = self.credentials.create(username, email, &request.password).await?;
        log::info!("registered user {}", user.id);
        Ok(user)
    }

    /// Authenticates and binds the user to the session under a fresh token.
    pub async fn login(&self, session: &Session, request: LoginRequest) -> Result<User, AppError> {
        let username = request.username.trim();
        if username.is_empty() || request.password.is_empty() {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let user = self.credentials.verify(username, &request.password).await?;

        session.renew();
        session.set(USER_ID_KEY, user.id)?;
        session.set(USERNAME_KEY, &user.username)?;
        log::info!("user {} logged in", user.id);
        Ok(user)
    }

    pub fn logout(&self, session: &Session) {
        if let Some(user_id) = session.user_id() {
            log::info!("user {} logged out", user_id);
        }
        session.destroy();
    }
}
