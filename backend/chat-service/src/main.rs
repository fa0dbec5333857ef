use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use campus_chat_service::services::MessageService;
use campus_chat_service::state::AppState;
use campus_chat_service::websocket::ConnectionRegistry;
use campus_chat_service::{config, db, error, logging, routes};

#[actix_web::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let pool = db::init_pool(&cfg.database_url, cfg.database_max_connections)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    let registry = ConnectionRegistry::new();
    let messages = MessageService::new(pool.clone());

    let state = AppState {
        db: pool,
        config: cfg.clone(),
        registry,
        messages,
    };

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting campus-chat-service");

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
            .service(routes::ws::ws_connect)
            .service(routes::messages::get_direct_messages)
            .service(routes::messages::get_group_messages)
            .service(routes::messages::create_message)
            .service(routes::groups::create_group)
            .service(routes::events::poll_expired)
            .route("/health", web::get().to(|| async { "OK" }))
    })
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind: {e}")))?
    .run()
    .await
    .map_err(|e| error::AppError::StartServer(format!("run: {e}")))
}
