use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use chrono::Utc;
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use super::{Session, SessionChanges, SessionSettings, SessionStatus, USER_ID_KEY};
use crate::error::{AppError, GENERIC_FAILURE};
use crate::models::SessionRecord;
use crate::security::{generate_session_token, hash_token};
use crate::store::SharedStore;

/// Binds a [`Session`] to the lifetime of each request.
///
/// On the way in the session cookie is resolved against the store; unknown or
/// expired tokens yield an empty session and are never adopted. On the way out
/// the session is saved, renewed under a new token, or deleted, and the cookie
/// is set or removed accordingly.
pub struct SessionMiddleware {
    store: SharedStore,
    settings: Rc<SessionSettings>,
}

impl SessionMiddleware {
    pub fn new(store: SharedStore, settings: SessionSettings) -> Self {
        Self {
            store,
            settings: Rc::new(settings),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            store: self.store.clone(),
            settings: Rc::clone(&self.settings),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    store: SharedStore,
    settings: Rc<SessionSettings>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let store = self.store.clone();
        let settings = Rc::clone(&self.settings);

        Box::pin(async move {
            restore(&store, &settings, &req).await;

            let mut res = service.call(req).await?;

            if let Some(changes) = Session::take_changes(res.request()) {
                finalize(&store, &settings, &mut res, changes).await?;
            }
            Ok(res)
        })
    }
}

async fn restore(store: &SharedStore, settings: &SessionSettings, req: &ServiceRequest) {
    let Some(cookie) = req.cookie(&settings.cookie_name) else {
        return;
    };
    let token = cookie.value().to_owned();

    match store.load_session(&hash_token(&token)).await {
        Ok(Some(record)) => Session::attach(req, token, record.state),
        Ok(None) => log::debug!("ignoring unknown or expired session token"),
        // Fall back to an anonymous session; guarded routes will answer 401.
        Err(e) => log::error!("failed to load session: {}", e),
    }
}

async fn finalize<B>(
    store: &SharedStore,
    settings: &SessionSettings,
    res: &mut ServiceResponse<B>,
    changes: SessionChanges,
) -> Result<(), Error> {
    let SessionChanges { token, state, status } = changes;

    match status {
        SessionStatus::Unchanged => Ok(()),
        SessionStatus::Changed | SessionStatus::Renewed => {
            let token = match (status, token) {
                (SessionStatus::Changed, Some(token)) => token,
                (_, previous) => {
                    if let Some(previous) = previous {
                        delete(store, &previous).await?;
                    }
                    generate_session_token()
                }
            };

            let record = SessionRecord {
                token_hash: hash_token(&token),
                user_id: state
                    .get(USER_ID_KEY)
                    .and_then(|v| serde_json::from_value(v.clone()).ok()),
                state,
                expires_at: Utc::now() + settings.ttl,
            };
            store.save_session(&record).await.map_err(AppError::from)?;

            res.response_mut()
                .add_cookie(&settings.cookie(token))
                .map_err(cookie_failure)
        }
        SessionStatus::Purged => {
            if let Some(previous) = token {
                delete(store, &previous).await?;
            }
            res.response_mut()
                .add_removal_cookie(&settings.removal_cookie())
                .map_err(cookie_failure)
        }
    }
}

fn cookie_failure(error: impl std::fmt::Display) -> Error {
    log::error!("failed to set session cookie: {}", error);
    AppError::InternalServerError(GENERIC_FAILURE.into()).into()
}

async fn delete(store: &SharedStore, token: &str) -> Result<(), AppError> {
    Ok(store.delete_session(&hash_token(token)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionState;
    use crate::store::{MemoryStore, SessionStore};
    use actix_web::{test, web, App, HttpResponse};
    use serde_json::json;
    use std::sync::Arc;

    async fn write(session: Session) -> HttpResponse {
        session.set("counter", 1).unwrap();
        HttpResponse::Ok().finish()
    }

    async fn read(session: Session) -> HttpResponse {
        HttpResponse::Ok().json(json!({ "counter": session.get::<i32>("counter") }))
    }

    async fn forget(session: Session) -> HttpResponse {
        session.destroy();
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_session_round_trip_through_cookie() {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let settings = SessionSettings::default();

        let app = test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(store, settings.clone()))
                .route("/write", web::post().to(write))
                .route("/read", web::get().to(read))
                .route("/forget", web::post().to(forget)),
        )
        .await;

        // Untouched sessions are never persisted.
        let resp = test::call_service(&app, test::TestRequest::get().uri("/read").to_request()).await;
        assert!(resp.response().cookies().next().is_none());
        assert_eq!(memory.session_count(), 0);

        let resp = test::call_service(&app, test::TestRequest::post().uri("/write").to_request()).await;
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == settings.cookie_name)
            .expect("session cookie")
            .into_owned();
        assert_eq!(memory.session_count(), 1);

        let req = test::TestRequest::get().uri("/read").cookie(cookie.clone()).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["counter"], 1);

        let req = test::TestRequest::post().uri("/forget").cookie(cookie.clone()).to_request();
        let resp = test::call_service(&app, req).await;
        let removal = resp
            .response()
            .cookies()
            .find(|c| c.name() == settings.cookie_name)
            .expect("removal cookie");
        assert_eq!(removal.value(), "");
        assert_eq!(memory.session_count(), 0);

        // The stale token no longer resolves.
        let req = test::TestRequest::get().uri("/read").cookie(cookie).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["counter"].is_null());
    }

    #[actix_web::test]
    async fn test_forged_token_is_not_adopted() {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let settings = SessionSettings::default();

        let app = test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(store, settings.clone()))
                .route("/write", web::post().to(write)),
        )
        .await;

        let forged = settings.cookie("attacker-chosen".to_string());
        let req = test::TestRequest::post().uri("/write").cookie(forged).to_request();
        let resp = test::call_service(&app, req).await;
        let issued = resp
            .response()
            .cookies()
            .find(|c| c.name() == settings.cookie_name)
            .expect("session cookie")
            .into_owned();

        assert_ne!(issued.value(), "attacker-chosen");
        assert!(memory
            .load_session(&hash_token("attacker-chosen"))
            .await
            .unwrap()
            .is_none());
        let stored: SessionState = memory
            .load_session(&hash_token(issued.value()))
            .await
            .unwrap()
            .expect("stored session")
            .state;
        assert_eq!(stored.get("counter"), Some(&json!(1)));
    }
}
