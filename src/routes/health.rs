use actix_web::{get, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Facts about the running instance, registered once at startup.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// `"postgres"` or `"memory"`.
    pub store: &'static str,
    pub started_at: DateTime<Utc>,
}

impl ServiceInfo {
    pub fn new(store: &'static str) -> Self {
        Self {
            store,
            started_at: Utc::now(),
        }
    }
}

/// Liveness check. Answers even when no [`ServiceInfo`] is registered.
#[get("/health")]
pub async fn health(info: Option<web::Data<ServiceInfo>>) -> impl Responder {
    let now = Utc::now();
    let mut body = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": now,
    });
    if let Some(info) = info {
        body["store"] = json!(info.store);
        body["uptime_seconds"] = json!((now - info.started_at).num_seconds().max(0));
    }
    HttpResponse::Ok().json(body)
}
