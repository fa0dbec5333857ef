use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use campus_feed_service::db::{ContentRepository, PgFeedStore, PgUserGraph};
use campus_feed_service::services::{FanoutEngine, FeedReader};
use campus_feed_service::state::AppState;
use campus_feed_service::{config, db, error, handlers, logging};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let pool = db::init_pool(&cfg.database_url, cfg.database_max_connections)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    let graph = Arc::new(PgUserGraph::new(pool.clone()));
    let feeds = Arc::new(PgFeedStore::new(pool.clone()));
    let content = ContentRepository::new(pool.clone());

    let fanout = Arc::new(FanoutEngine::new(
        graph,
        feeds.clone(),
        cfg.fanout_concurrency,
    ));
    let reader = Arc::new(FeedReader::new(feeds, Arc::new(content.clone())));

    let state = AppState {
        db: pool,
        config: cfg.clone(),
        content,
        fanout,
        reader,
    };

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting campus-feed-service");

    let cors_origin = cfg.cors_origin.clone();
    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => actix_cors::Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
                .max_age(3600),
            None => actix_cors::Cors::permissive(),
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .service(handlers::posts::create_post)
            .service(handlers::posts::get_post)
            .service(handlers::posts::get_posts_by_forum)
            .service(handlers::posts::update_post)
            .service(handlers::posts::delete_post)
            .service(handlers::replies::create_reply)
            .service(handlers::replies::get_replies_by_post)
            .service(handlers::replies::update_reply)
            .service(handlers::replies::delete_reply)
            .service(handlers::feed::get_user_feed)
            .route("/health", web::get().to(|| async { "OK" }))
    })
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind: {e}")))?
    .run()
    .await
    .map_err(|e| error::AppError::StartServer(format!("run: {e}")))
}
