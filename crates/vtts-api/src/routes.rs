//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::audio::{concatenate, concatenate_upload, trim};
use crate::handlers::outputs::{delete_output, download_output, list_outputs};
use crate::handlers::speech::{tts, voice_convert};
use crate::handlers::voices::{create_voice, delete_voice, get_voice, list_voices};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let audio_routes = Router::new()
        .route("/audio/concatenate", post(concatenate))
        .route("/audio/concatenate/upload", post(concatenate_upload))
        .route("/audio/trim", post(trim));

    let speech_routes = Router::new()
        .route("/tts", post(tts))
        .route("/voice-convert", post(voice_convert));

    let voice_routes = Router::new()
        .route("/voices", get(list_voices))
        .route("/voices", post(create_voice))
        .route("/voices/:name", get(get_voice))
        .route("/voices/:name", delete(delete_voice));

    let output_routes = Router::new()
        .route("/outputs", get(list_outputs))
        .route("/outputs/:filename", get(download_output))
        .route("/outputs/:filename", delete(delete_output));

    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(audio_routes)
        .merge(speech_routes)
        .merge(voice_routes)
        .merge(output_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Body size limit: uploads carry raw audio but must stay bounded
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
