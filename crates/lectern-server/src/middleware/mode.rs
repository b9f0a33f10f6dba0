//! Server mode detection.
//!
//! Every request confirms the server mode from its `Host` header before it
//! reaches a handler. Handlers read the outcome from [`RequestMode`].

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::mode::is_local_host;
use crate::state::AppState;

/// Server mode in effect for one request.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RequestMode {
    pub(crate) is_local: bool,
}

/// Confirm the server mode and attach it to the request.
pub(crate) async fn confirm_mode(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default();
    let is_local = state
        .mode
        .confirm(is_local_host(host), || state.site.invalidate());

    request.extensions_mut().insert(RequestMode { is_local });
    next.run(request).await
}
