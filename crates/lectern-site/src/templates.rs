//! Page template registry.
//!
//! One parsed template per [`TemplateKind`], built lazily and kept until
//! [`TemplateRegistry::unload`] drops them all. Callers decide per lookup
//! whether a freshly parsed template is kept: local development passes
//! `cache = false` so every request sees the templates currently on disk.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use minijinja::Environment;
use serde::Serialize;

/// Page template kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// A single article page.
    Article,
    /// A composite print or e-book page.
    PrintBook,
    /// A go-get vanity import page.
    GoGet,
    /// A stub page redirecting a legacy article URL.
    Redirect,
    /// Renders nothing.
    Blank,
}

impl TemplateKind {
    /// Every kind, in slot order.
    pub const ALL: [Self; 5] = [
        Self::Article,
        Self::PrintBook,
        Self::GoGet,
        Self::Redirect,
        Self::Blank,
    ];

    /// Template file name.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Article => "article.html",
            Self::PrintBook => "pdf.html",
            Self::GoGet => "go-get.html",
            Self::Redirect => "redirect.html",
            Self::Blank => "blank",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Error loading or rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template file could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Template source is not registered.
    #[error("template {0} is not available")]
    Missing(TemplateKind),
    /// Template failed to parse or render.
    #[error(transparent)]
    Syntax(#[from] minijinja::Error),
}

/// A parsed page template.
pub struct PageTemplate {
    kind: TemplateKind,
    env: Environment<'static>,
}

impl PageTemplate {
    fn parse(kind: TemplateKind, source: String) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.add_template_owned(kind.file_name(), source)?;
        Ok(Self { kind, env })
    }

    fn blank() -> Self {
        Self {
            kind: TemplateKind::Blank,
            env: Environment::new(),
        }
    }

    /// Kind this template was parsed for.
    #[must_use]
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Render with the given context.
    ///
    /// Strings in the context are HTML-escaped; markup must be passed as
    /// [`minijinja::Value::from_safe_string`].
    pub fn render<S: Serialize>(&self, ctx: S) -> Result<String, TemplateError> {
        if self.kind == TemplateKind::Blank {
            return Ok(String::new());
        }
        let template = self.env.get_template(self.kind.file_name())?;
        Ok(template.render(ctx)?)
    }
}

impl fmt::Debug for PageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageTemplate")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum TemplateSource {
    Dir(PathBuf),
    Memory(HashMap<TemplateKind, String>),
}

impl TemplateSource {
    fn load(&self, kind: TemplateKind) -> Result<String, TemplateError> {
        match self {
            Self::Dir(dir) => {
                let path = dir.join(kind.file_name());
                std::fs::read_to_string(&path).map_err(|source| TemplateError::Io { path, source })
            }
            Self::Memory(sources) => sources
                .get(&kind)
                .cloned()
                .ok_or(TemplateError::Missing(kind)),
        }
    }
}

type Slots = [Option<Arc<PageTemplate>>; TemplateKind::ALL.len()];

/// Lazily parsed page templates.
#[derive(Debug)]
pub struct TemplateRegistry {
    source: TemplateSource,
    loaded: Mutex<Slots>,
}

impl TemplateRegistry {
    /// Registry reading `<dir>/article.html`, `<dir>/pdf.html` and so on.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self::with_source(TemplateSource::Dir(dir))
    }

    /// Registry over in-memory template sources.
    #[must_use]
    pub fn from_sources(sources: impl IntoIterator<Item = (TemplateKind, String)>) -> Self {
        Self::with_source(TemplateSource::Memory(sources.into_iter().collect()))
    }

    fn with_source(source: TemplateSource) -> Self {
        Self {
            source,
            loaded: Mutex::new(Slots::default()),
        }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Template of the given kind.
    ///
    /// Parses the template if it is not loaded; the result is kept only when
    /// `cache` is set. Parsing happens outside the lock, so two callers racing
    /// on an empty slot may both parse.
    pub fn get(&self, kind: TemplateKind, cache: bool) -> Result<Arc<PageTemplate>, TemplateError> {
        if let Some(template) = &self.slots()[kind.slot()] {
            return Ok(Arc::clone(template));
        }

        let template = Arc::new(match kind {
            TemplateKind::Blank => PageTemplate::blank(),
            _ => PageTemplate::parse(kind, self.source.load(kind)?)?,
        });
        tracing::debug!(template = %kind, cache, "parsed template");

        if cache {
            self.slots()[kind.slot()] = Some(Arc::clone(&template));
        }
        Ok(template)
    }

    /// Parse and keep every template.
    ///
    /// # Errors
    ///
    /// Returns the first template that fails to load or parse.
    pub fn preload(&self) -> Result<(), TemplateError> {
        for kind in TemplateKind::ALL {
            self.get(kind, true)?;
        }
        Ok(())
    }

    /// Drop every loaded template; the next `get` parses again.
    pub fn unload(&self) {
        *self.slots() = Slots::default();
    }

    /// Number of templates currently kept.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.slots().iter().flatten().count()
    }
}
