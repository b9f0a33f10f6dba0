//! HTTP request handlers.

pub(crate) mod goget;
pub(crate) mod pages;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use lectern_site::Rendered;

use crate::state::{AppState, NO_CACHE};

const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

/// Turn a render outcome into a response.
///
/// Missing pages redirect to the default page with a 404 status. A failed
/// render shows its error text, with a 500 status in production mode.
pub(crate) fn page_response(state: &AppState, rendered: Rendered, is_local: bool) -> Response {
    match rendered {
        Rendered::Page(page) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(HTML)),
                (header::CACHE_CONTROL, state.page_cache_control(is_local)),
            ],
            page,
        )
            .into_response(),
        Rendered::NotFound => not_found(&state.default_page),
        Rendered::Failed(message) => {
            let status = if is_local {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(TEXT)),
                    (header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE)),
                ],
                message,
            )
                .into_response()
        }
    }
}

/// 404 response pointing the browser at `location`.
pub(crate) fn not_found(location: &str) -> Response {
    let Ok(target) = HeaderValue::from_str(location) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    (
        StatusCode::NOT_FOUND,
        [
            (header::LOCATION, target),
            (header::CONTENT_TYPE, HeaderValue::from_static(HTML)),
        ],
        format!("<a href=\"{location}\">Not Found</a>.\n"),
    )
        .into_response()
}
