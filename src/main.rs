use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::clock::SystemClock;
use crate::service::recovery::{BulkRecovery, ManualCloseOperator};
use crate::service::report::ReportAggregator;
use crate::service::tracker::SessionTracker;
use crate::store::mysql::MySqlAttendanceStore;
use crate::utils::card_filter;
use crate::utils::student_cache;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "📚 Library Attendance System Backend Running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();
    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = card_filter::warmup_card_filter(&pool_for_filter_warmup, 100).await {
            eprintln!("Failed to warmup card filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        if let Err(e) = student_cache::warmup_student_cache(&pool_for_cache_warmup, 250).await {
            eprintln!("Failed to warmup student cache: {:?}", e);
        }
    });

    // One store handle per service. The tracker also owns the per-card
    // locks, so it must be shared app-wide, not rebuilt per request.
    let store = MySqlAttendanceStore::new(pool.clone());
    let tracker = Data::new(SessionTracker::new(store.clone(), SystemClock));
    let recovery = Data::new(BulkRecovery::new(store.clone(), SystemClock));
    let manual_close = Data::new(ManualCloseOperator::new(store.clone(), SystemClock));
    let aggregator = Data::new(ReportAggregator::new(store, SystemClock));

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(tracker.clone())
            .app_data(recovery.clone())
            .app_data(manual_close.clone())
            .app_data(aggregator.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
