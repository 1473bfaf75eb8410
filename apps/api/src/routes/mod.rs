pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::middleware::require_session;
use crate::records::handlers;
use crate::state::AppState;

/// Room for multipart framing around a maximum-size resume, so an oversized
/// file is rejected by the size check rather than by the body limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.resume_max_bytes.saturating_mul(2) + MULTIPART_OVERHEAD;

    let api = Router::new()
        .route(
            "/:collection",
            get(handlers::handle_list).post(handlers::handle_create),
        )
        .route(
            "/:collection/:id",
            get(handlers::handle_get)
                .put(handlers::handle_update)
                .delete(handlers::handle_delete),
        )
        .route(
            "/:collection/:id/resume",
            post(handlers::handle_upload_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/v1", api)
        .with_state(state)
}
