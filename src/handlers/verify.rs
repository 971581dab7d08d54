//! Public, unauthenticated routes: verification and the scan redirect.

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use log::error;
use serde_json::json;
use url::Url;

use crate::config::AppConfig;
use crate::services::verification::{TokenSources, Verification, VerificationResolver};

fn verification_response(outcome: Verification) -> HttpResponse {
    match outcome {
        Verification::Verified(_) => HttpResponse::Ok().json(&outcome),
        Verification::NotFound => HttpResponse::NotFound().json(&outcome),
        Verification::MalformedInput => HttpResponse::BadRequest().json(&outcome),
    }
}

async fn resolve(resolver: &VerificationResolver, token: Option<&str>) -> HttpResponse {
    match resolver.resolve(token).await {
        Ok(outcome) => verification_response(outcome),
        Err(err) => {
            error!("Verification lookup failed: {}", err);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "UNAVAILABLE",
                "error": "Verification is temporarily unavailable",
            }))
        }
    }
}

/// `/v/{employee_number}` and `/verify/{employee_number}`. A scanner may also
/// have appended `?id=` or `?scan=`, which wins over the path.
pub async fn verify_by_path(
    req: HttpRequest,
    resolver: web::Data<VerificationResolver>,
    employee_number: web::Path<String>,
) -> HttpResponse {
    let sources = TokenSources::from_query(req.query_string());
    resolve(&resolver, sources.select(Some(employee_number.as_str()))).await
}

/// `/v?id=...`, `/verify?scan=...`.
pub async fn verify_by_query(
    req: HttpRequest,
    resolver: web::Data<VerificationResolver>,
) -> HttpResponse {
    let sources = TokenSources::from_query(req.query_string());
    resolve(&resolver, sources.select(None)).await
}

/// `/scan?id=...` or `/scan?scan=...`: redirects to the canonical
/// verification route, or to the landing page when nothing was scanned.
pub async fn scan_redirect(req: HttpRequest, config: web::Data<AppConfig>) -> HttpResponse {
    let sources = TokenSources::from_query(req.query_string());
    let location = sources
        .select(None)
        .and_then(|scanned| verification_path(scanned.trim()))
        .unwrap_or_else(|| config.landing_url.clone());

    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// `/v/<token>` with the token percent-encoded as a single path segment.
fn verification_path(token: &str) -> Option<String> {
    let mut url = Url::parse("http://localhost/").ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().push("v").push(token);
    Some(url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_path_encodes_the_token_as_one_segment() {
        assert_eq!(verification_path("DI-3001").as_deref(), Some("/v/DI-3001"));
        assert_eq!(verification_path("DI/3001 x").as_deref(), Some("/v/DI%2F3001%20x"));
    }
}
