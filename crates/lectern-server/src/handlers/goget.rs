//! Go vanity import pages and root-level website items.

use axum::response::Response;
use lectern_site::{GoGetRequest, WEBSITE_GROUP};

use crate::handlers::{not_found, page_response};
use crate::state::AppState;

/// Page of the website group served when a root request names no package.
const WEBSITE_INDEX: &str = "index.html";

/// Serve `/<name>[/<sub>]` for a name that is not a page group.
///
/// Configured go-get roots get their import page. Otherwise a single-segment
/// path is a website item and anything deeper is not found.
pub(crate) fn serve(state: &AppState, name: &str, sub: &str, is_local: bool) -> Response {
    let request = GoGetRequest::parse(name, sub);
    if let Some(rendered) = state.site.render_goget(&request, is_local) {
        return page_response(state, rendered, is_local);
    }

    if request.sub.is_empty() {
        let item = if request.name.is_empty() {
            WEBSITE_INDEX
        } else {
            request.name
        };
        let rendered = state.site.render_article(WEBSITE_GROUP, item, is_local);
        page_response(state, rendered, is_local)
    } else {
        tracing::debug!(name, sub, "unknown go-get package");
        not_found("/")
    }
}
