use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::Matcher;
use crate::models::{ErrorResponse, HealthResponse, NearestProvidersQuery, NearestProvidersResponse};
use crate::services::{PostgresClient, ProviderCache};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<ProviderCache>,
    pub matcher: Matcher,
}

/// Configure all provider-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/referrals/{id}/providers/nearest", web::get().to(nearest_providers));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Nearest providers for a referral
///
/// GET /api/v1/referrals/{id}/providers/nearest?limit=10
///
/// A referral without usable coordinates gets an empty `providers` list,
/// not an error.
async fn nearest_providers(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<NearestProvidersQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_response(HttpResponse::BadRequest(), "Validation failed", errors.to_string(), 400);
    }

    let referral_id = path.into_inner();

    let referral = match state.postgres.get_referral_location(referral_id).await {
        Ok(Some(referral)) => referral,
        Ok(None) => {
            return error_response(
                HttpResponse::NotFound(),
                "Referral not found",
                format!("No referral with id {}", referral_id),
                404,
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch referral {}: {}", referral_id, e);
            return error_response(
                HttpResponse::InternalServerError(),
                "Failed to fetch referral",
                e.to_string(),
                500,
            );
        }
    };

    let postgres = state.postgres.clone();
    let providers = match state.cache.providers(|| async move { postgres.list_providers().await }).await {
        Ok(providers) => providers,
        Err(e) => {
            tracing::error!("Failed to load providers: {}", e);
            return error_response(
                HttpResponse::InternalServerError(),
                "Failed to load providers",
                e.to_string(),
                500,
            );
        }
    };

    let limit = query.limit.map(usize::from).unwrap_or(state.matcher.max_results());
    let reference = referral.point();
    let result = state.matcher.find_nearest_limited(reference, &providers, limit);

    tracing::info!(
        "Returning {} providers for referral {} (from {} candidates, {} with coordinates)",
        result.matches.len(),
        referral_id,
        result.total_candidates,
        result.valid_candidates
    );

    HttpResponse::Ok().json(NearestProvidersResponse {
        referral_id,
        reference,
        providers: result.matches,
        total_candidates: result.total_candidates,
        valid_candidates: result.valid_candidates,
    })
}

fn error_response(
    mut builder: actix_web::HttpResponseBuilder,
    error: &str,
    message: String,
    status_code: u16,
) -> HttpResponse {
    builder.json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code,
    })
}
