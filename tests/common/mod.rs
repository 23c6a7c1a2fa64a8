#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::{body::MessageBody, http::StatusCode, test, web};
use serde_json::{json, Value};
use std::sync::Arc;

use taskdesk::auth::AuthService;
use taskdesk::store::{MemoryStore, SharedStore};
use taskdesk::tasks::TaskService;

pub const SESSION_COOKIE: &str = "taskdesk_session";
pub const TEST_BCRYPT_COST: u32 = 4;

pub fn memory_store() -> SharedStore {
    Arc::new(MemoryStore::new())
}

pub fn services(store: SharedStore) -> (web::Data<AuthService>, web::Data<TaskService>) {
    let auth = AuthService::new(store.clone(), TEST_BCRYPT_COST).expect("auth service");
    (web::Data::new(auth), web::Data::new(TaskService::new(store)))
}

/// Builds the full application over the given store, wired like `main`.
macro_rules! init_app {
    ($store:expr) => {{
        let store: taskdesk::store::SharedStore = $store;
        let (auth, tasks) = common::services(store.clone());
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(auth)
                .app_data(tasks)
                .service(taskdesk::routes::health::health)
                .service(
                    actix_web::web::scope("/api")
                        .wrap(taskdesk::session::SessionMiddleware::new(
                            store,
                            taskdesk::session::SessionSettings::default(),
                        ))
                        .configure(taskdesk::routes::config),
                ),
        )
        .await
    }};
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
}

/// Sends a request and returns the status, the session cookie it set, and the JSON body.
pub async fn send(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    req: test::TestRequest,
) -> (StatusCode, Option<Cookie<'static>>, Value) {
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let cookie = session_cookie(&resp);
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            panic!("non-JSON body ({}): {}", e, String::from_utf8_lossy(&bytes))
        })
    };
    (status, cookie, body)
}

pub async fn register(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post().uri("/api/auth/register").set_json(json!({
        "username": username,
        "email": email,
        "password": password,
        "confirmPassword": confirm
    }));
    let (status, _, body) = send(app, req).await;
    (status, body)
}

pub async fn login(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
    password: &str,
) -> (StatusCode, Option<Cookie<'static>>, Value) {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": password }));
    send(app, req).await
}

/// Registers the user and logs in, returning the session cookie.
pub async fn signed_in(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
    password: &str,
) -> Cookie<'static> {
    let email = format!("{}@example.com", username);
    let (status, body) = register(app, username, &email, password, password).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let (status, cookie, body) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    cookie.expect("login sets a session cookie")
}
