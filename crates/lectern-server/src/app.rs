//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::pages;
use crate::middleware::{mode, security};
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `request_timeout` - Upper bound of one request
pub(crate) fn create_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(pages::root))
        .route("/{name}", get(pages::root_item))
        .route("/{segment}/{*item}", get(pages::group_item))
        .nest_service("/static", static_files::static_service(&state.static_dir))
        .fallback(pages::fallback)
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            mode::confirm_mode,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}
