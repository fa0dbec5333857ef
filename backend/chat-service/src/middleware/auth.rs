use std::future::{ready, Ready};

use actix_web::{http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Bearer-token claims shared with the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a UUID string.
    pub sub: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthorized)
    }
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Mint a token the way the identity service does. Used by local tooling and
/// the test suite; production tokens come from the identity service itself.
pub fn issue_token(
    user_id: Uuid,
    role: &str,
    name: &str,
    email: &str,
    secret: &str,
    ttl_seconds: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::Internal)
}

/// Authenticated caller extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let result: Result<AuthenticatedUser, AppError> = (|| {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or(AppError::Internal)?;
            let token = bearer_token(req).ok_or(AppError::Unauthorized)?;
            let claims = verify_token(token, &state.config.jwt_secret)?;
            Ok(AuthenticatedUser {
                id: claims.user_id()?,
                role: claims.role,
            })
        })();

        ready(result.map_err(actix_web::Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trips_claims() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "student", "Ada", "ada@campus.dev", SECRET, 3600).unwrap();

        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, "student");
        assert_eq!(claims.email, "ada@campus.dev");
    }

    #[test]
    fn rejects_expired_token() {
        let token =
            issue_token(Uuid::new_v4(), "student", "Ada", "ada@campus.dev", SECRET, -3600).unwrap();

        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let token =
            issue_token(Uuid::new_v4(), "student", "Ada", "ada@campus.dev", SECRET, 3600).unwrap();

        assert!(verify_token(&token, "other-secret").is_err());
    }
}
