//! Internationalization (i18n): choosing the page language and localizing content.
//!
//! # Architecture
//!
//! - `registry`: the closed set of supported languages and the default
//! - `language`: validated `Language` type
//! - `resolver`: picks the active language from URL, stored preference, browser locale
//! - `store`: persisted language preference (memory and cookie backends)
//! - `bundle`: per-language, per-namespace text tables
//! - `source`: bundle sources and bundle-set initialization with default-language fallback
//! - `document`: page snapshot the localizer works on
//! - `localizer`: pure plan/apply pass over annotated elements
//! - `session`: the active language of one page view, initial load and switches
//! - `validator`: completeness check of bundle trees
//! - `metrics`: bundle loading counters
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::i18n::{
//!     DirectorySource, LanguageRegistry, LocalizationSession, MemoryStore, PageContext,
//! };
//!
//! let mut session = LocalizationSession::new(
//!     LanguageRegistry::get().clone(),
//!     vec!["main".to_string(), "about".to_string()],
//!     MemoryStore::new(),
//! );
//! let page = PageContext { url_query: "?lang=ja".into(), browser_locales: vec![] };
//! session.load(&page, &DirectorySource::new("dist/locales"), &mut document).await;
//! ```

mod bundle;
mod document;
mod language;
pub mod localizer;
mod metrics;
mod registry;
pub mod resolver;
pub mod session;
pub mod source;
mod store;
mod validator;

pub use bundle::{BundleSet, LoadedBundle, ResourceBundle, DEFAULT_NAMESPACE};
pub use document::{Content, Document, Element, ElementPath};
pub use language::{Language, LanguageError};
pub use metrics::{BundleMetrics, MetricsReport};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use resolver::{resolve_and_persist, resolve_language, LanguageSource, Resolution};
pub use session::{LocalizationSession, PageContext, SwitchTicket};
pub use source::{init_bundles, BundleError, BundleSource, DirectorySource, HttpSource, InitError};
pub use store::{CookieStore, MemoryStore, PreferenceStore, StoreError, StoredPreference};
pub use validator::{BundleValidator, KeyDiff, ValidationReport};
