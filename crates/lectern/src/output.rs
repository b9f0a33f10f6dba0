//! Styled status lines on stderr.

use console::{Style, Term};

pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    url: Style,
    note: Style,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
            url: Style::new().cyan().bold(),
            note: Style::new().dim(),
        }
    }

    // Terminal write errors are not worth aborting a command for.
    fn line(&self, text: &str) {
        self.term.write_line(text).ok();
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(&self.ok.apply_to(msg).to_string());
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(&self.warn.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.fail.apply_to(msg).to_string());
    }

    /// Print both addresses of a running server.
    ///
    /// `localhost` switches the server to local mode; the loopback IP keeps
    /// production caching.
    pub(crate) fn server_urls(&self, port: u16) {
        self.line("Server started:");
        for (host, note) in [("localhost", "non-cached version"), ("127.0.0.1", "cached version")] {
            let url = format!("http://{host}:{port}");
            self.line(&format!(
                "   {} {}",
                self.url.apply_to(url),
                self.note.apply_to(format!("({note})"))
            ));
        }
    }

    pub(crate) fn generated(&self, name: &str, size: usize) {
        let size = self.note.apply_to(format!("({size} bytes)"));
        self.line(&format!("Generated {name} {size}"));
    }
}
