//! Static file serving.
//!
//! Theme assets live under `/static/` and each page group may carry a
//! `res/` directory of images. Both are served from disk with a one year
//! `Cache-Control`.

use std::path::Path;

use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tower::{Layer, ServiceExt};
use tower_http::services::ServeDir;
use tower_http::set_header::{SetResponseHeader, SetResponseHeaderLayer};

use crate::state::ONE_YEAR;

/// Service serving theme assets from `dir`.
pub(crate) fn static_service(dir: &Path) -> SetResponseHeader<ServeDir, HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, HeaderValue::from_static(ONE_YEAR))
        .layer(ServeDir::new(dir))
}

/// Serve a group resource.
///
/// The first `prefix_segments` segments of the request path (the group
/// prefix and `res`) are stripped before the path is resolved in `dir`.
pub(crate) async fn serve_resource(
    dir: Option<&Path>,
    prefix_segments: usize,
    mut request: Request,
) -> Response {
    let Some(dir) = dir else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let relative = strip_segments(request.uri().path(), prefix_segments);
    let Ok(uri) = format!("/{relative}").parse::<Uri>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    *request.uri_mut() = uri;

    let mut response = match ServeDir::new(dir).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(ONE_YEAR));
    response
}

/// Drop the first `count` segments of an absolute URL path.
fn strip_segments(path: &str, count: usize) -> &str {
    path.splitn(count + 2, '/').nth(count + 1).unwrap_or_default()
}
