pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;
use serde::{Deserialize, Serialize};

use crate::auth::RequireLogin;
use crate::error::AppError;

pub const INVALID_BODY: &str = "Invalid request body";

/// The `{success, message}` body shared by most endpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Registers the `/auth` and `/tasks` scopes. Expects to be mounted under a
/// scope wrapped in [`crate::session::SessionMiddleware`].
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("rejecting request body: {}", err);
        AppError::BadRequest(INVALID_BODY.into()).into()
    }))
    .service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::logout)
            .service(auth::session_info),
    )
    .service(
        web::scope("/tasks")
            .wrap(RequireLogin)
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::update_task)
            .service(tasks::complete_task)
            .service(tasks::delete_task)
            .service(tasks::delete_task_by_body),
    );
}
