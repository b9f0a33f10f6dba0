//! Navigation index handling.
//!
//! Every group's root article embeds its table of contents between two sentinel
//! comments. The web variant of that fragment is parsed once per group at
//! startup; the print variant is rebuilt for every composite book render.

/// Start of the index fragment in a root article.
pub const INDEX_START: &str = "<!-- index starts (don't remove) -->";
/// End of the index fragment in a root article.
pub const INDEX_END: &str = "<!-- index ends (don't remove) -->";

/// Marker for lines that only exist on the web, never in print.
pub const PRINT_LINE_MARKER: &str = "(to remove)";

/// Comment markers hiding print-only lines; blanked for the web index.
const PRINT_COMMENT_MARKERS: [&str; 2] = ["<!-- (to remove) for printing", "(to remove) -->"];

const INDEX_ANCHOR: &str = r#"<li><a class="index" href=""#;
const INDEX_ANCHOR_END: &str = r#"">"#;

/// Bound on index walks over malformed content.
const MAX_INDEX_ENTRIES: usize = 1000;

/// Fragment strictly between the index sentinels.
///
/// Returns `None` if either sentinel is missing.
#[must_use]
pub fn extract_index(content: &str) -> Option<&str> {
    let start = content.find(INDEX_START)? + INDEX_START.len();
    let len = content[start..].find(INDEX_END)?;
    Some(&content[start..start + len])
}

/// Web index of a root article.
///
/// The first occurrence of each print comment marker is overwritten with
/// spaces, which turns print-hidden lines into visible web lines without
/// changing the fragment length. Empty if the article has no index.
#[must_use]
pub fn web_index(content: &str) -> String {
    let Some(fragment) = extract_index(content) else {
        return String::new();
    };

    let mut index = fragment.to_owned();
    for marker in PRINT_COMMENT_MARKERS {
        if let Some(at) = index.find(marker) {
            index.replace_range(at..at + marker.len(), &" ".repeat(marker.len()));
        }
    }
    index
}

/// Copy of `index` with the link to `page` turned into a non-link.
///
/// `<a class="index" href="PAGE">...</a>` becomes
/// `<b class="index" id="i-PAGE">...</b>`. The result has the same byte length
/// as the input and every other anchor is left untouched.
#[must_use]
pub fn disable_self_link(index: &str, page: &str) -> String {
    let anchor = format!(r#"<a class="index" href="{page}">"#);
    let Some(start) = index.find(&anchor) else {
        return index.to_owned();
    };
    let inner = start + anchor.len();
    let Some(len) = index[inner..].find("</a>") else {
        return index.to_owned();
    };
    let close = inner + len;

    let mut disabled = String::with_capacity(index.len());
    disabled.push_str(&index[..start]);
    disabled.push_str("<b");
    disabled.push_str(&anchor[2..].replacen(r#"href=""#, r#"id="i-"#, 1));
    disabled.push_str(&index[inner..close]);
    disabled.push_str("</b>");
    disabled.push_str(&index[close + "</a>".len()..]);
    disabled
}

/// Print index of a root article.
///
/// Requires the start sentinel; a missing end sentinel keeps the rest of the
/// content. Every line containing [`PRINT_LINE_MARKER`] is dropped.
#[must_use]
pub fn print_index(content: &str) -> Option<String> {
    let start = content.find(INDEX_START)? + INDEX_START.len();
    let fragment = &content[start..];
    let fragment = fragment
        .find(INDEX_END)
        .map_or(fragment, |end| &fragment[..end]);
    Some(strip_marked_lines(fragment))
}

/// Drop every line that contains [`PRINT_LINE_MARKER`].
#[must_use]
pub fn strip_marked_lines(content: &str) -> String {
    content
        .split_inclusive('\n')
        .filter(|line| !line.contains(PRINT_LINE_MARKER))
        .collect()
}

/// Targets of the `<li><a class="index" href="...">` entries, in order.
#[must_use]
pub fn index_links(index: &str) -> Vec<&str> {
    let mut links = Vec::new();
    let mut rest = index;
    for _ in 0..MAX_INDEX_ENTRIES {
        let Some(at) = rest.find(INDEX_ANCHOR) else {
            break;
        };
        rest = &rest[at + INDEX_ANCHOR.len()..];
        let Some(end) = rest.find(INDEX_ANCHOR_END) else {
            break;
        };
        links.push(&rest[..end]);
        rest = &rest[end + INDEX_ANCHOR_END.len()..];
    }
    links
}
