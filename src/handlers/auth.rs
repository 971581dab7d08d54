use std::sync::Arc;

use actix_web::{web, HttpResponse};
use argon2::{Argon2, password_hash::PasswordHasher, password_hash::SaltString, PasswordVerifier};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::store::{AdminStore, StoreError};
use crate::utils;
use crate::utils::validation::validate_payload;

#[derive(Deserialize, Validate)]
pub struct AuthRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 8, max = 32))]
    password: String,
    #[validate(custom = "validate_action")]
    action: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    email: String,
    token: String,
}

fn validate_action(action: &str) -> Result<(), validator::ValidationError> {
    if action != "create" && action != "login" {
        return Err(validator::ValidationError::new("Invalid action"));
    }
    Ok(())
}

fn map_store_error(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate(_) => AppError::Conflict("Email already exists".to_string()),
        StoreError::Backend(msg) => AppError::DatabaseError(msg),
    }
}

fn issue_token(admin_id: uuid::Uuid, config: &AppConfig) -> Result<String, AppError> {
    utils::jwt::generate_token(admin_id, &config.jwt_secret, config.token_ttl_days)
        .map_err(|_| AppError::InternalServerError("Token generation error".to_string()))
}

/// Admin sign-up (when enabled) and login. Both answer with a bearer token
/// for the `/v1/employee` routes.
pub async fn auth_handler(
    req: web::Json<AuthRequest>,
    admins: web::Data<Arc<dyn AdminStore>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&req.0).map_err(AppError::BadRequest)?;

    match req.action.as_str() {
        "create" => {
            if !config.allow_admin_signup {
                return Err(AppError::Forbidden("Admin sign-up is disabled".to_string()));
            }

            let salt = SaltString::generate(&mut rand::thread_rng());
            let password_hash = Argon2::default()
                .hash_password(req.password.as_bytes(), &salt)
                .map_err(|_| AppError::InternalServerError("Hashing error".to_string()))?
                .to_string();

            let admin = admins
                .insert_admin(&req.email, &password_hash)
                .await
                .map_err(map_store_error)?;
            info!("Admin account created: {}", admin.admin_id);

            Ok(HttpResponse::Created().json(AuthResponse {
                email: admin.email,
                token: issue_token(admin.admin_id, &config)?,
            }))
        }
        "login" => {
            let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

            let admin = admins
                .find_admin_by_email(&req.email)
                .await
                .map_err(map_store_error)?
                .ok_or_else(invalid)?;

            let parsed_hash = argon2::PasswordHash::new(&admin.password)
                .map_err(|_| AppError::InternalServerError("Invalid password hash".to_string()))?;
            Argon2::default()
                .verify_password(req.password.as_bytes(), &parsed_hash)
                .map_err(|_| {
                    warn!("Failed login for admin {}", admin.admin_id);
                    invalid()
                })?;

            Ok(HttpResponse::Ok().json(AuthResponse {
                email: admin.email.clone(),
                token: issue_token(admin.admin_id, &config)?,
            }))
        }
        _ => Err(AppError::BadRequest("Invalid action".to_string())),
    }
}
