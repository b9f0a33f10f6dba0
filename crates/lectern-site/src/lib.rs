//! Page groups, templates and article rendering for lectern.
//!
//! This crate provides:
//! - [`Site`]: page groups discovered at startup plus the render pipeline for
//!   articles, redirect stubs, composite print books and go-get pages
//! - [`TemplateRegistry`]: lazily parsed page templates with unload support
//! - [`Article`]: title/body split of a raw article file
//! - index helpers for the navigation fragment embedded in root articles
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use lectern_site::{Rendered, Site, SiteConfig, TemplateRegistry};
//! use lectern_storage::FsStorage;
//!
//! let storage = Arc::new(FsStorage::new(PathBuf::from("pages")));
//! let templates = TemplateRegistry::new(PathBuf::from("web/templates"));
//! let site = Site::new(storage, templates, SiteConfig::default())?;
//!
//! if let Rendered::Page(html) = site.render_article("fundamentals", "101.html", false) {
//!     tracing::info!(bytes = html.len(), "rendered");
//! }
//! # Ok(())
//! # }
//! ```

mod article;
mod goget;
mod group;
pub mod index;
mod redirects;
mod site;
mod templates;

pub use article::{Article, split_title, strip_tags};
pub use goget::{GoGetPackage, GoGetPage, GoGetRequest};
pub use group::{ARTICLE_GROUP, ARTICLE_SEGMENT, PageGroup, WEBSITE_GROUP, url_prefix};
pub use redirects::{ArticleRef, RedirectTable};
pub use site::{RenderError, Rendered, Site, SiteConfig, SiteError};
pub use templates::{PageTemplate, TemplateError, TemplateKind, TemplateRegistry};
