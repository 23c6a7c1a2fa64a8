use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use taskdesk::auth::AuthService;
use taskdesk::config::Config;
use taskdesk::routes::{self, health::{self, ServiceInfo}};
use taskdesk::session::{spawn_expired_purge, SessionMiddleware, SessionSettings};
use taskdesk::store::{MemoryStore, PgStore, SharedStore};
use taskdesk::tasks::TaskService;

fn io_error(context: &str, error: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, error))
}

async fn build_store(config: &Config) -> io::Result<SharedStore> {
    if config.uses_memory_store() {
        log::warn!("using the in-memory store; data is lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect(&config.database_url)
        .await
        .map_err(|e| io_error("failed to connect to database", e))?;
    store
        .migrate()
        .await
        .map_err(|e| io_error("failed to run migrations", e))?;
    Ok(Arc::new(store))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io_error("invalid configuration", e))?;
    let store = build_store(&config).await?;

    spawn_expired_purge(
        store.clone(),
        Duration::from_secs(config.session_purge_minutes * 60),
    );

    let auth_service = web::Data::new(
        AuthService::new(store.clone(), config.bcrypt_cost)
            .map_err(|e| io_error("failed to initialise authentication", e))?,
    );
    let task_service = web::Data::new(TaskService::new(store.clone()));
    let service_info = web::Data::new(ServiceInfo::new(if config.uses_memory_store() {
        "memory"
    } else {
        "postgres"
    }));
    let settings = SessionSettings::from_config(&config);

    log::info!("Starting TaskDesk server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(auth_service.clone())
            .app_data(task_service.clone())
            .app_data(service_info.clone())
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(SessionMiddleware::new(store.clone(), settings.clone()))
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
