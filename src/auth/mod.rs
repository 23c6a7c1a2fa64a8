pub mod credentials;
pub mod middleware;
pub mod password;
pub mod service;

use serde::Deserialize;
use validator::Validate;

// Re-export necessary items
pub use credentials::{Credentials, INVALID_CREDENTIALS};
pub use middleware::RequireLogin;
pub use password::{hash_password, verify_password};
pub use service::AuthService;

/// Message for any request that needs a logged-in session and has none.
pub const UNAUTHORIZED: &str = "Unauthorized";

/// Represents the payload for a new user registration request.
///
/// Missing fields deserialize as empty strings; emptiness, matching passwords
/// and the minimum password length are checked by [`AuthService::register`]
/// so each failure keeps its own message.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username. At most 50 characters.
    #[serde(default)]
    #[validate(length(max = 50))]
    pub username: String,
    /// Contact address. At most 255 characters.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: String,
}

/// Represents the payload for a user login request.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let long_username = RegisterRequest {
            username: "a".repeat(51),
            ..Default::default()
        };
        assert!(long_username.validate().is_err());

        let long_email = RegisterRequest {
            email: format!("{}@example.com", "e".repeat(250)),
            ..Default::default()
        };
        assert!(long_email.validate().is_err());
    }

    #[test]
    fn test_register_request_field_names() {
        let request: RegisterRequest = serde_json::from_value(json!({
            "username": "alice",
            "password": "secret1",
            "confirmPassword": "secret1"
        }))
        .unwrap();
        assert_eq!(request.confirm_password, "secret1");
        assert_eq!(request.email, "");
    }

    #[test]
    fn test_login_request_defaults_missing_fields() {
        let request: LoginRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.username.is_empty());
        assert!(request.password.is_empty());
    }
}
