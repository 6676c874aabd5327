//! Bundle sources and bundle-set initialization.
//!
//! Bundles are addressed by `(language, namespace)` and published as
//! `<root>/<language>/<namespace>.json`. [`DirectorySource`] reads them from
//! disk (build output, preview server); [`HttpSource`] fetches them from a
//! published site the way the browser's XHR backend does.

use std::future::Future;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::i18n::{BundleMetrics, BundleSet, Language, LoadedBundle, ResourceBundle};

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Invalid namespace name: '{0}'")]
    InvalidNamespace(String),

    #[error("Failed to read bundle {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed bundle {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Bundle request to {url} failed: {message}")]
    Http { url: String, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
    #[error("No bundle could be loaded for '{language}' or the default language")]
    NoBundles { language: Language },
}

/// Somewhere bundles can be loaded from.
///
/// `Ok(None)` means the bundle does not exist; errors are reserved for
/// sources that exist but cannot be read.
pub trait BundleSource {
    fn load(
        &self,
        language: Language,
        namespace: &str,
    ) -> impl Future<Output = Result<Option<ResourceBundle>, BundleError>> + Send;
}

/// Namespaces are plain names: ASCII letters, digits, `-` and `_`.
pub fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Bundles stored as `<root>/<language>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bundle_path(&self, language: Language, namespace: &str) -> PathBuf {
        self.root
            .join(language.code())
            .join(format!("{}.json", namespace))
    }
}

impl BundleSource for DirectorySource {
    async fn load(
        &self,
        language: Language,
        namespace: &str,
    ) -> Result<Option<ResourceBundle>, BundleError> {
        if !is_valid_namespace(namespace) {
            return Err(BundleError::InvalidNamespace(namespace.to_string()));
        }

        let path = self.bundle_path(language, namespace);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BundleError::Io { path, source }),
        };

        ResourceBundle::from_json(&text)
            .map(Some)
            .map_err(|source| BundleError::Parse {
                location: path.display().to_string(),
                source,
            })
    }
}

/// Bundles fetched from `<base_url>/<language>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn bundle_url(&self, language: Language, namespace: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, language.code(), namespace)
    }
}

impl BundleSource for HttpSource {
    async fn load(
        &self,
        language: Language,
        namespace: &str,
    ) -> Result<Option<ResourceBundle>, BundleError> {
        if !is_valid_namespace(namespace) {
            return Err(BundleError::InvalidNamespace(namespace.to_string()));
        }

        let url = self.bundle_url(language, namespace);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BundleError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BundleError::Http {
                url,
                message: format!("status {}", response.status()),
            });
        }

        let text = response.text().await.map_err(|e| BundleError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;

        ResourceBundle::from_json(&text)
            .map(Some)
            .map_err(|source| BundleError::Parse {
                location: url,
                source,
            })
    }
}

/// Load one bundle per namespace for `language`.
///
/// A namespace without a usable bundle for `language` falls back to the
/// `default` language's bundle. Namespaces with no bundle in either language
/// are listed in [`BundleSet::missing`]. All namespaces are loaded before the
/// set is returned, so nothing is localized from a partial set.
///
/// # Errors
/// [`InitError::NoBundles`] when not a single namespace could be loaded.
pub async fn init_bundles<S, N>(
    source: &S,
    language: Language,
    namespaces: &[N],
    default: Language,
) -> Result<BundleSet, InitError>
where
    S: BundleSource + Sync,
    N: AsRef<str>,
{
    let mut unique: Vec<&str> = Vec::new();
    for namespace in namespaces {
        if !unique.contains(&namespace.as_ref()) {
            unique.push(namespace.as_ref());
        }
    }

    let loads = unique
        .iter()
        .map(|namespace| load_namespace(source, language, namespace, default));
    let results = join_all(loads).await;

    let mut set = BundleSet::new(language);
    for (namespace, loaded) in unique.iter().zip(results) {
        match loaded {
            Some(loaded) => set.insert(namespace, loaded),
            None => set.missing.push(namespace.to_string()),
        }
    }

    if set.is_empty() {
        warn!("No bundles available for {} ({:?})", language, set.missing);
        return Err(InitError::NoBundles { language });
    }

    if !set.missing.is_empty() {
        warn!(
            "Bundles for {} missing namespaces {:?}; their elements keep static content",
            language, set.missing
        );
    }
    info!(
        "Loaded {} bundle(s) for {}",
        set.namespaces.len(),
        language
    );

    Ok(set)
}

async fn load_namespace<S: BundleSource + Sync>(
    source: &S,
    language: Language,
    namespace: &str,
    default: Language,
) -> Option<LoadedBundle> {
    let metrics = BundleMetrics::global();

    if let Some(bundle) = try_load(source, language, namespace).await {
        metrics.record_load();
        return Some(LoadedBundle { language, bundle });
    }

    if language != default {
        if let Some(bundle) = try_load(source, default, namespace).await {
            debug!(
                "Namespace '{}' has no {} bundle, using {}",
                namespace, language, default
            );
            metrics.record_fallback();
            return Some(LoadedBundle {
                language: default,
                bundle,
            });
        }
    }

    metrics.record_missing();
    None
}

async fn try_load<S: BundleSource + Sync>(
    source: &S,
    language: Language,
    namespace: &str,
) -> Option<ResourceBundle> {
    match source.load(language, namespace).await {
        Ok(bundle) => bundle,
        Err(e) => {
            BundleMetrics::global().record_error();
            warn!("Treating bundle {}/{} as absent: {}", language, namespace, e);
            None
        }
    }
}
