//! Preview server for the development and published site trees.
//!
//! Besides static files it answers two localization endpoints:
//! - `GET /api/locale` resolves the visitor's language and refreshes the `lang` cookie
//! - `GET /api/bundles/:lang?ns=main,about` returns the bundle set for a language

use crate::config::{Config, LOCALES_DIR};
use crate::i18n::resolver::browser_locales_from_accept_language;
use crate::i18n::{
    init_bundles, resolve_and_persist, BundleMetrics, CookieStore, DirectorySource, Language,
    LanguageRegistry, LanguageSource, ResourceBundle,
};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const INDEX_FILE: &str = "index.html";

/// Which tree the server exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeMode {
    /// Built assets first, then the raw source tree.
    Dev { temporary: PathBuf, source: PathBuf },
    /// The publish tree only.
    Dist { publish: PathBuf },
}

impl ServeMode {
    pub fn dev(config: &Config) -> Self {
        ServeMode::Dev {
            temporary: config.temporary_dir.clone(),
            source: config.source_dir.clone(),
        }
    }

    pub fn dist(config: &Config) -> Self {
        ServeMode::Dist {
            publish: config.publish_dir.clone(),
        }
    }

    /// Directory the bundle endpoint reads `<lang>/<ns>.json` from.
    pub fn locales_root(&self) -> PathBuf {
        match self {
            ServeMode::Dev { source, .. } => source.join(LOCALES_DIR),
            ServeMode::Dist { publish } => publish.join(LOCALES_DIR),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    registry: &'static LanguageRegistry,
    locales: Arc<DirectorySource>,
    namespaces: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(mode: &ServeMode, namespaces: Vec<String>) -> Self {
        Self {
            registry: LanguageRegistry::get(),
            locales: Arc::new(DirectorySource::new(mode.locales_root())),
            namespaces: Arc::new(namespaces),
        }
    }
}

#[derive(Debug, Serialize)]
struct LocaleResponse {
    lang: Language,
    source: LanguageSource,
}

#[derive(Debug, Deserialize)]
struct BundlesQuery {
    ns: Option<String>,
}

#[derive(Debug, Serialize)]
struct BundlesResponse {
    lang: Language,
    namespaces: BTreeMap<String, ResourceBundle>,
    fallbacks: Vec<String>,
    missing: Vec<String>,
}

pub fn router(mode: &ServeMode, namespaces: Vec<String>) -> Router {
    let state = AppState::new(mode, namespaces);

    let api = Router::new()
        .route("/health", get(health))
        .route("/api/locale", get(locale))
        .route("/api/bundles/:lang", get(bundles))
        .with_state(state);

    let api = match mode {
        ServeMode::Dev { temporary, source } => api.fallback_service(
            ServeDir::new(temporary).fallback(
                ServeDir::new(source).fallback(ServeFile::new(source.join(INDEX_FILE))),
            ),
        ),
        ServeMode::Dist { publish } => api.fallback_service(
            ServeDir::new(publish).fallback(ServeFile::new(publish.join(INDEX_FILE))),
        ),
    };

    api.layer(TraceLayer::new_for_http())
}

/// Bind `port` on all interfaces and serve until the process stops.
pub async fn serve(mode: ServeMode, namespaces: Vec<String>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(&mode, namespaces);

    info!("Serving {:?} on http://{}", mode, addr);
    let listener = TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server terminated")?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "bundles": BundleMetrics::global().report(),
    }))
}

async fn locale(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    let browser_locales = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(browser_locales_from_accept_language)
        .unwrap_or_default();

    let mut store = CookieStore::from_cookie_header(cookie);
    let resolution = resolve_and_persist(
        query.as_deref().unwrap_or(""),
        &browser_locales,
        state.registry,
        &mut store,
    );

    let mut response = Json(LocaleResponse {
        lang: resolution.language,
        source: resolution.source,
    })
    .into_response();

    if let Some(cookie) = store.set_cookie_header() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Invalid Set-Cookie value {:?}: {}", cookie, e),
        }
    }
    response
}

async fn bundles(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<BundlesQuery>,
) -> Response {
    let Some(language) = state.registry.language(&code) else {
        return not_found(format!("Unsupported language '{}'", code));
    };

    let namespaces: Vec<String> = match params.ns.as_deref() {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .collect(),
        None => state.namespaces.as_ref().clone(),
    };

    let set = match init_bundles(
        state.locales.as_ref(),
        language,
        namespaces.as_slice(),
        state.registry.default_language(),
    )
    .await
    {
        Ok(set) => set,
        Err(e) => return not_found(e.to_string()),
    };

    let fallbacks = set
        .namespaces
        .iter()
        .filter(|(_, loaded)| loaded.is_fallback(language))
        .map(|(namespace, _)| namespace.clone())
        .collect();

    Json(BundlesResponse {
        lang: set.language,
        namespaces: set
            .namespaces
            .into_iter()
            .map(|(namespace, loaded)| (namespace, loaded.bundle))
            .collect(),
        fallbacks,
        missing: set.missing,
    })
    .into_response()
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn write(root: &std::path::Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn dev_site() -> (TempDir, ServeMode) {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let temporary = dir.path().join(".tmp");
        write(&source, "index.html", "<html>home</html>");
        write(&source, "js/main.js", "main();");
        write(&source, "css/main.css", "raw{}");
        write(&temporary, "css/main.css", "built{}");
        write(&source, "locales/en/main.json", r#"{"title":"Hello"}"#);
        write(&source, "locales/en/about.json", r#"{"bio":"About me"}"#);
        write(&source, "locales/ja/main.json", r#"{"title":"こんにちは"}"#);
        (dir, ServeMode::Dev { temporary, source })
    }

    fn app(mode: &ServeMode) -> Router {
        router(mode, vec!["main".to_string(), "about".to_string()])
    }

    async fn send(app: Router, uri: &str, headers: &[(&str, &str)]) -> Response {
        let mut request = Request::builder().uri(uri);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ==================== Health Tests ====================

    #[tokio::test]
    async fn test_health() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/health", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    // ==================== Locale Endpoint Tests ====================

    #[tokio::test]
    async fn test_locale_query_wins_and_sets_cookie() {
        let (_dir, mode) = dev_site();
        let response = send(
            app(&mode),
            "/api/locale?lang=ko",
            &[("cookie", "lang=ja"), ("accept-language", "en-US,en;q=0.9")],
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("lang=ko;"));
        assert!(cookie.contains("Max-Age=31536000"));

        let body = body_json(response).await;
        assert_eq!(body["lang"], "ko");
        assert_eq!(body["source"], "query");
    }

    #[tokio::test]
    async fn test_locale_from_cookie() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/api/locale", &[("cookie", "theme=dark; lang=ja")]).await;
        let body = body_json(response).await;
        assert_eq!(body["lang"], "ja");
        assert_eq!(body["source"], "stored");
    }

    #[tokio::test]
    async fn test_locale_from_accept_language() {
        let (_dir, mode) = dev_site();
        let response = send(
            app(&mode),
            "/api/locale",
            &[("accept-language", "ko;q=0.8, ja")],
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["lang"], "ja");
        assert_eq!(body["source"], "browser");
    }

    #[tokio::test]
    async fn test_locale_regional_tag_falls_to_default() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/api/locale", &[("accept-language", "ja-JP")]).await;
        let body = body_json(response).await;
        assert_eq!(body["lang"], "en");
        assert_eq!(body["source"], "default");
    }

    // ==================== Bundle Endpoint Tests ====================

    #[tokio::test]
    async fn test_bundles_with_fallback() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/api/bundles/ja", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["lang"], "ja");
        assert_eq!(body["namespaces"]["main"]["title"], "こんにちは");
        assert_eq!(body["namespaces"]["about"]["bio"], "About me");
        assert_eq!(body["fallbacks"], serde_json::json!(["about"]));
        assert_eq!(body["missing"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_bundles_namespace_selection_and_missing() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/api/bundles/en?ns=main,resume", &[]).await;
        let body = body_json(response).await;
        assert_eq!(body["namespaces"]["main"]["title"], "Hello");
        assert!(body["namespaces"].get("about").is_none());
        assert_eq!(body["missing"], serde_json::json!(["resume"]));
    }

    #[tokio::test]
    async fn test_bundles_unknown_language() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/api/bundles/fr", &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bundles_nothing_loadable() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/api/bundles/ko?ns=resume", &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ==================== Static File Tests ====================

    #[tokio::test]
    async fn test_dev_prefers_temporary_tree() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/css/main.css", &[]).await;
        assert_eq!(body_text(response).await, "built{}");

        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/js/main.js", &[]).await;
        assert_eq!(body_text(response).await, "main();");
    }

    #[tokio::test]
    async fn test_history_fallback_to_index() {
        let (_dir, mode) = dev_site();
        let response = send(app(&mode), "/about/me", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<html>home</html>");
    }

    #[tokio::test]
    async fn test_dist_serves_publish_tree() {
        let dir = TempDir::new().unwrap();
        let publish = dir.path().join("dist");
        write(&publish, "index.html", "<html>dist</html>");
        write(&publish, "locales/en/main.json", r#"{"title":"Hi"}"#);
        let mode = ServeMode::Dist { publish };

        let response = send(app(&mode), "/", &[]).await;
        assert_eq!(body_text(response).await, "<html>dist</html>");

        let response = send(app(&mode), "/api/bundles/en?ns=main", &[]).await;
        assert_eq!(body_json(response).await["namespaces"]["main"]["title"], "Hi");
    }
}
