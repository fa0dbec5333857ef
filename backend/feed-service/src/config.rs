use dotenvy::dotenv;
use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    /// Upper bound on concurrent per-recipient feed writes during fan-out.
    pub fanout_concurrency: usize,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("invalid APP_PORT: {e}")))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL is required".to_string()))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("invalid DATABASE_MAX_CONNECTIONS: {e}")))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET is required".to_string()))?;

        let fanout_concurrency: usize = env::var("FANOUT_CONCURRENCY")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("invalid FANOUT_CONCURRENCY: {e}")))?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            jwt_secret,
            fanout_concurrency: fanout_concurrency.max(1),
            cors_origin: env::var("CORS_ORIGIN").ok(),
        })
    }
}
