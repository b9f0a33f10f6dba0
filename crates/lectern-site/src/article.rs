//! Article parsing.
//!
//! An [`Article`] is derived from the raw bytes of one HTML file: the first
//! `<h1>` heading (or `<h2>` when the file has no usable `<h1>`) is split off as
//! the title, everything after it becomes the body. Articles are built on a cache
//! miss and dropped once the page is rendered.

/// How far past the opening tag the closing tag may appear.
const TITLE_WINDOW: usize = 128;

/// Heading tags tried in order.
const HEADINGS: [(&str, &str); 2] = [("<h1>", "</h1>"), ("<h2>", "</h2>")];

/// A parsed article.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Article {
    /// Article file name, e.g. `101.html`.
    pub file: String,
    /// Title heading including its markup, e.g. `<h1>Go 101</h1>`.
    pub title: String,
    /// Title with every tag removed.
    pub title_plain: String,
    /// Everything after the title heading.
    pub body: String,
}

impl Article {
    /// Parse raw article bytes.
    ///
    /// Invalid UTF-8 sequences are replaced. A file without a recognizable
    /// heading keeps its whole content as body and gets an empty title.
    #[must_use]
    pub fn parse(file: &str, raw: &[u8]) -> Self {
        let content = String::from_utf8_lossy(raw);
        let (title, body) = match split_title(&content) {
            Some((title, body)) => (title, body),
            None => {
                tracing::debug!(file = %file, "no title heading found");
                ("", content.as_ref())
            }
        };

        Self {
            file: file.to_owned(),
            title: title.to_owned(),
            title_plain: strip_tags(title),
            body: body.to_owned(),
        }
    }

    /// File name without the `.html` extension.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        self.file.strip_suffix(".html").unwrap_or(&self.file)
    }
}

/// Split `html` into `(title markup, body)`.
///
/// Returns `None` if neither heading is found or its closing tag is not within
/// [`TITLE_WINDOW`] bytes of the opening tag.
#[must_use]
pub fn split_title(html: &str) -> Option<(&str, &str)> {
    HEADINGS
        .iter()
        .find_map(|(open, close)| split_heading(html, open, close))
}

fn split_heading<'a>(html: &'a str, open: &str, close: &str) -> Option<(&'a str, &'a str)> {
    let start = html.find(open)?;
    let inner = start + open.len();
    let window_end = (inner + TITLE_WINDOW).min(html.len());
    let close_at = find_bytes(&html.as_bytes()[inner..window_end], close.as_bytes())?;
    let end = inner + close_at + close.len();
    Some((&html[start..end], &html[end..]))
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Remove tag markup with a two-state scan.
///
/// Outside a tag every character except `<` is kept; inside a tag everything
/// up to the next `>` is dropped. Bracket balance is not checked.
#[must_use]
pub fn strip_tags(markup: &str) -> String {
    let mut plain = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        let toggle = if in_tag { '>' } else { '<' };
        if c == toggle {
            in_tag = !in_tag;
        } else if !in_tag {
            plain.push(c);
        }
    }
    plain
}
