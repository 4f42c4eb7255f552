//! Routing module for the produce inventory service

use crate::inventory::{
    handlers::ApiError, state::SharedState, BootstrapOutcome, LatchState,
};
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

/// Creates and configures the application router with all routes and middleware
pub fn create_app_router(state: SharedState) -> Router {
    // Middleware: Log requests
    let log_layer = middleware::from_fn(|req: Request<Body>, next: Next| async move {
        tracing::debug!("REQ: {} {}", req.method(), req.uri());
        let res = next.run(req).await;
        if !res.status().is_success() {
            tracing::info!("RES: {} (Error)", res.status());
        }
        res
    });

    // Middleware: CORS (Permissive for local dev)
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes. The bootstrap layer wraps every route added before it,
    // fallback included; `/health` is added after and never imports.
    Router::new()
        .merge(crate::inventory::routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), bootstrap))
        .route("/health", get(health))
        .layer(log_layer)
        .layer(cors_layer)
        .with_state(state)
}

/// Runs the one-time bootstrap import before handing the request on.
///
/// Requests that arrive while another request is importing wait on the
/// latch's notifier until the import settles, so nobody observes a
/// half-seeded inventory.
async fn bootstrap(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    loop {
        let notified = state.importer.latch().settled().notified();

        if state.importer.bootstrap_state() == LatchState::Loading {
            notified.await;
            continue;
        }
        if !state.importer.bootstrap_pending() {
            break;
        }

        let task_state = state.clone();
        let attempt = tokio::task::spawn_blocking(move || {
            task_state
                .importer
                .load_once_from_file(&task_state.dataset_path)
        })
        .await;

        match attempt {
            // Lost the claim to a concurrent request; wait for it above
            Ok(Ok(BootstrapOutcome::Skipped(_))) => continue,
            Ok(Ok(BootstrapOutcome::Imported(_))) => break,
            // Dataset problems are the server's, not the client's
            Ok(Err(e)) => return ApiError::Internal(e.to_string()).into_response(),
            Err(e) => return ApiError::Internal(e.to_string()).into_response(),
        }
    }

    next.run(req).await
}

/// Fallback for unmatched paths
async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
        .into_response()
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint; does not trigger the bootstrap
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
