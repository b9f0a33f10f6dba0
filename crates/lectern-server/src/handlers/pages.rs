//! Article, print book and resource requests.

use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Redirect, Response};
use lectern_site::WEBSITE_GROUP;

use crate::handlers::{goget, not_found, page_response};
use crate::middleware::mode::RequestMode;
use crate::state::AppState;
use crate::static_files;

/// First path segment of group resources.
const RESOURCE_SEGMENT: &str = "res";
/// Item prefixes of print pages.
const PRINT_PREFIXES: [&str; 2] = ["print-", "pdf-"];

/// Handle GET /.
pub(crate) async fn root(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&state.default_page)
}

/// Handle GET /{name}.
pub(crate) async fn root_item(
    State(state): State<Arc<AppState>>,
    Extension(mode): Extension<RequestMode>,
    Path(name): Path<String>,
) -> Response {
    goget::serve(&state, &name.to_lowercase(), "", mode.is_local)
}

/// Handle GET /{segment}/{*item}.
pub(crate) async fn group_item(
    State(state): State<Arc<AppState>>,
    Extension(mode): Extension<RequestMode>,
    Path((segment, item)): Path<(String, String)>,
    request: Request,
) -> Response {
    let segment = segment.to_lowercase();

    if let Some(group) = state.site.resolve_group(&segment) {
        let item = item.to_lowercase();
        if item.starts_with("res/") {
            return static_files::serve_resource(group.resource_dir.as_deref(), 2, request).await;
        }
        if mode.is_local
            && let Some((target, book)) = print_target(&item)
        {
            let rendered = state.site.render_print(&group.name, target, book, true);
            return page_response(&state, rendered, true);
        }
        let rendered = state.site.render_article(&group.name, &item, mode.is_local);
        return page_response(&state, rendered, mode.is_local);
    }

    if segment == RESOURCE_SEGMENT
        && let Some(website) = state.site.group(WEBSITE_GROUP)
    {
        return static_files::serve_resource(website.resource_dir.as_deref(), 1, request).await;
    }

    goget::serve(&state, &segment, &item, mode.is_local)
}

/// Handle requests no route matches.
pub(crate) async fn fallback(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    not_found(&state.default_page)
}

/// Split `pdf-book101` into `("pdf", "book101")`.
fn print_target(item: &str) -> Option<(&str, &str)> {
    if !PRINT_PREFIXES.iter().any(|prefix| item.starts_with(prefix)) {
        return None;
    }
    item.split_once('-')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_print_target() {
        assert_eq!(print_target("pdf-book101"), Some(("pdf", "book101")));
        assert_eq!(print_target("print-book101"), Some(("print", "book101")));
        assert_eq!(print_target("pdf-"), Some(("pdf", "")));
        assert_eq!(print_target("101.html"), None);
        assert_eq!(print_target("epub-book101"), None);
    }
}
