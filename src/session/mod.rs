//! Server-side sessions.
//!
//! A [`Session`] is the per-request context identifying the caller. The
//! [`SessionMiddleware`] loads it from the session cookie when the request
//! enters and persists, renews or deletes it when the response leaves. Handlers
//! and services receive it through the [`Session`] extractor and read or mutate
//! it synchronously; nothing touches the store until the response is finalized.

pub mod middleware;
pub mod purge;

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::dev::{Extensions, Payload};
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::future::{ready, Ready};
use std::mem;
use std::rc::Rc;

use crate::config::Config;
use crate::error::{AppError, GENERIC_FAILURE};
use crate::models::SessionState;

pub use middleware::SessionMiddleware;
pub use purge::spawn_expired_purge;

/// Session key holding the authenticated user's id.
pub const USER_ID_KEY: &str = "user_id";
/// Session key holding the authenticated user's name, for display.
pub const USERNAME_KEY: &str = "username";

/// What has to happen to the stored session when the response is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Unchanged,
    /// State changed; saved under the current token (or a new one if there is none).
    Changed,
    /// State must be saved under a fresh token; the old one is deleted.
    Renewed,
    /// The session is gone; the stored record is deleted and the cookie removed.
    Purged,
}

#[derive(Debug, Default)]
struct SessionInner {
    /// Token presented by the client, only if it matched a live stored session.
    token: Option<String>,
    state: SessionState,
    status: SessionStatus,
}

/// Everything the middleware needs to finalize a session.
#[derive(Debug)]
pub(crate) struct SessionChanges {
    pub token: Option<String>,
    pub state: SessionState,
    pub status: SessionStatus,
}

/// Per-request session context. Cloning shares the same context.
#[derive(Debug, Clone, Default)]
pub struct Session(Rc<RefCell<SessionInner>>);

impl Session {
    /// Returns the session attached to the request, attaching an empty one first
    /// if there is none. Calling it repeatedly yields the same context.
    pub fn start<M: HttpMessage>(req: &M) -> Session {
        Self::get_or_insert(&mut req.extensions_mut())
    }

    fn get_or_insert(extensions: &mut Extensions) -> Session {
        if let Some(session) = extensions.get::<Session>() {
            return session.clone();
        }
        let session = Session::default();
        extensions.insert(session.clone());
        session
    }

    /// Attaches a session restored from the store.
    pub(crate) fn attach<M: HttpMessage>(req: &M, token: String, state: SessionState) {
        let session = Session(Rc::new(RefCell::new(SessionInner {
            token: Some(token),
            state,
            status: SessionStatus::Unchanged,
        })));
        req.extensions_mut().insert(session);
    }

    /// Detaches the session from a finished request.
    pub(crate) fn take_changes<M: HttpMessage>(req: &M) -> Option<SessionChanges> {
        let session = req.extensions_mut().remove::<Session>()?;
        let mut inner = session.0.borrow_mut();
        Some(SessionChanges {
            token: inner.token.take(),
            state: mem::take(&mut inner.state),
            status: inner.status,
        })
    }

    /// Reads a value; a missing key or a value of another shape reads as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let inner = self.0.borrow();
        let value = inner.state.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("session value {:?} has an unexpected shape: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), AppError> {
        let value = serde_json::to_value(value).map_err(|e| {
            log::error!("failed to serialize session value {:?}: {}", key, e);
            AppError::InternalServerError(GENERIC_FAILURE.into())
        })?;
        let mut inner = self.0.borrow_mut();
        inner.state.insert(key.to_owned(), value);
        inner.mark_changed();
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        let mut inner = self.0.borrow_mut();
        let removed = inner.state.remove(key);
        if removed.is_some() {
            inner.mark_changed();
        }
        removed
    }

    pub fn user_id(&self) -> Option<i32> {
        self.get(USER_ID_KEY)
    }

    pub fn username(&self) -> Option<String> {
        self.get(USERNAME_KEY)
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id().is_some()
    }

    /// Keeps the state but moves it to a fresh token when the response is sent.
    pub fn renew(&self) {
        self.0.borrow_mut().status = SessionStatus::Renewed;
    }

    /// Wipes all state and invalidates the token, server side and client side.
    pub fn destroy(&self) {
        let mut inner = self.0.borrow_mut();
        inner.state.clear();
        inner.status = SessionStatus::Purged;
    }

    pub fn status(&self) -> SessionStatus {
        self.0.borrow().status
    }

    pub fn entries(&self) -> SessionState {
        self.0.borrow().state.clone()
    }
}

impl SessionInner {
    fn mark_changed(&mut self) {
        self.status = match self.status {
            SessionStatus::Unchanged => SessionStatus::Changed,
            // Writing into a destroyed session starts a new one.
            SessionStatus::Purged => SessionStatus::Renewed,
            other => other,
        };
    }
}

impl FromRequest for Session {
    type Error = ActixError;
    type Future = Ready<Result<Session, ActixError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Session::start(req)))
    }
}

/// Cookie and lifetime settings for sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl: chrono::Duration,
    pub secure: bool,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cookie_name: config.session_cookie_name.clone(),
            ttl: chrono::Duration::hours(config.session_ttl_hours),
            secure: config.session_cookie_secure,
        }
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.ttl.num_seconds()))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.cookie_name.clone(), "")
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "taskdesk_session".to_string(),
            ttl: chrono::Duration::hours(24),
            secure: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use serde_json::json;

    #[test]
    fn test_start_is_idempotent() {
        let req = TestRequest::default().to_http_request();
        let first = Session::start(&req);
        first.set("theme", "dark").unwrap();

        let second = Session::start(&req);
        assert_eq!(second.get::<String>("theme").as_deref(), Some("dark"));
        assert_eq!(second.status(), SessionStatus::Changed);
    }

    #[test]
    fn test_logged_in_tracks_user_id() {
        let session = Session::default();
        assert!(!session.is_logged_in());

        session.set(USER_ID_KEY, 42).unwrap();
        session.set(USERNAME_KEY, "alice").unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.user_id(), Some(42));
        assert_eq!(session.username().as_deref(), Some("alice"));
    }

    #[test]
    fn test_wrong_shape_reads_as_absent() {
        let session = Session::default();
        session.set(USER_ID_KEY, "not a number").unwrap();
        assert_eq!(session.user_id(), None);
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_destroy_wipes_state() {
        let req = TestRequest::default().to_http_request();
        Session::attach(
            &req,
            "token".to_string(),
            SessionState::from([(USER_ID_KEY.to_string(), json!(7))]),
        );

        let session = Session::start(&req);
        assert!(session.is_logged_in());
        assert_eq!(session.status(), SessionStatus::Unchanged);

        session.destroy();
        assert!(!session.is_logged_in());
        assert!(session.entries().is_empty());
        assert_eq!(session.status(), SessionStatus::Purged);

        let changes = Session::take_changes(&req).unwrap();
        assert_eq!(changes.token.as_deref(), Some("token"));
        assert_eq!(changes.status, SessionStatus::Purged);
        assert!(Session::take_changes(&req).is_none());
    }

    #[test]
    fn test_status_transitions() {
        let session = Session::default();
        assert!(session.remove("missing").is_none());
        assert_eq!(session.status(), SessionStatus::Unchanged);

        session.renew();
        session.set(USER_ID_KEY, 1).unwrap();
        assert_eq!(session.status(), SessionStatus::Renewed);

        session.destroy();
        session.set("flash", "hello").unwrap();
        assert_eq!(session.status(), SessionStatus::Renewed);
    }

    #[test]
    fn test_cookies() {
        let settings = SessionSettings::default();
        let cookie = settings.cookie("abc".to_string());
        assert_eq!(cookie.name(), "taskdesk_session");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));

        let removal = settings.removal_cookie();
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(time::Duration::ZERO));
    }
}
