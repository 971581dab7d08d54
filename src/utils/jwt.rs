use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Admin ID
    pub exp: usize,  // Expiration timestamp
}

pub fn generate_token(
    admin_id: Uuid,
    secret: &str,
    ttl_days: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: admin_id.to_string(),
        exp: (OffsetDateTime::now_utc() + Duration::days(ttl_days)).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(jsonwebtoken::Algorithm::HS256),
    )
    .map(|data| data.claims)
}

/// The authenticated admin behind a request. Directory operations take it
/// explicitly; the public verification routes never ask for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    pub admin_id: Uuid,
}

impl AdminContext {
    pub fn from_request_headers(req: &HttpRequest) -> Result<Self, AppError> {
        let config = req
            .app_data::<web::Data<AppConfig>>()
            .ok_or_else(|| AppError::InternalServerError("Configuration missing".to_string()))?;

        let token = req.headers().get("Authorization")
            .and_then(|auth| auth.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

        let claims = validate_token(token, &config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

        let admin_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid admin ID in token".to_string()))?;

        Ok(AdminContext { admin_id })
    }
}

impl FromRequest for AdminContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(AdminContext::from_request_headers(req))
    }
}
