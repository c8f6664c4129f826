use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use hrm_leave::config::Config;
use hrm_leave::db::init_db;
use hrm_leave::docs::ApiDoc;
use hrm_leave::leave::LeaveWorkflow;
use hrm_leave::notify;
use hrm_leave::routes;
use hrm_leave::store::{CachedUserDirectory, MySqlStore, NotificationFeed};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
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

    info!(
        addr = %config.server_addr,
        balance_policy = %config.balance_policy,
        "Server starting..."
    );

    let pool = init_db(&config.database_url).await?;
    let store = Arc::new(MySqlStore::new(pool.clone()));
    let directory = Arc::new(CachedUserDirectory::new(
        MySqlStore::new(pool),
        config.user_cache_ttl,
    ));

    let (sink, notices) = notify::channel();
    let feed: Arc<dyn NotificationFeed> = store.clone();
    actix_web::rt::spawn(notify::run_dispatcher(notices, feed.clone()));

    let workflow = LeaveWorkflow::new(directory, store, Arc::new(sink), config.balance_policy);
    let limiter = Arc::new(routes::build_limiter(config.rate_protected_per_min)?);

    let server_addr = config.server_addr.clone();
    let api_prefix = config.api_prefix.clone();
    let config_data = Data::new(config);
    let workflow_data = Data::new(workflow);
    let feed_data: Data<dyn NotificationFeed> = Data::from(feed);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(workflow_data.clone())
            .app_data(feed_data.clone())
            .configure(|cfg| routes::configure(cfg, &api_prefix, limiter.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
