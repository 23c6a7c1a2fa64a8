use crate::{
    auth::{AuthService, LoginRequest, RegisterRequest},
    error::AppError,
    routes::ApiMessage,
    session::Session,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;

/// Register a new user
///
/// Creates the account only; the caller still has to log in.
///
/// ## Responses:
/// - `201 Created`: `{"success": true, "message": "Registration successful"}`.
/// - `400 Bad Request`: missing fields, mismatched or short password.
/// - `409 Conflict`: the username is taken.
/// - `422 Unprocessable Entity`: username or email too long.
#[post("/register")]
pub async fn register(
    service: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    service.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiMessage::ok("Registration successful")))
}

/// Login user
///
/// On success the response carries a fresh session cookie.
#[post("/login")]
pub async fn login(
    service: web::Data<AuthService>,
    session: Session,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    service.login(&session, login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiMessage::ok("Login successful")))
}

/// Logout user
///
/// Always succeeds, whether or not a session existed.
#[post("/logout")]
pub async fn logout(service: web::Data<AuthService>, session: Session) -> impl Responder {
    service.logout(&session);
    HttpResponse::Ok().json(ApiMessage::ok("Logged out successfully"))
}

/// Reports whether the caller is logged in, and as whom.
#[get("/session")]
pub async fn session_info(session: Session) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "logged_in": session.is_logged_in(),
        "username": session.username(),
    }))
}
