use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory, under any site root, holding `<lang>/<namespace>.json` bundles.
pub const LOCALES_DIR: &str = "locales";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DIST_PORT: u16 = 5001;

/// Layout of `config.yml`.
#[derive(Debug, Clone, Deserialize)]
struct SiteFile {
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_temporary")]
    temporary: String,
    #[serde(default = "default_publish")]
    publish: String,
    #[serde(default = "default_namespaces")]
    namespaces: Vec<String>,
}

fn default_source() -> String {
    "site".to_string()
}

fn default_temporary() -> String {
    ".tmp".to_string()
}

fn default_publish() -> String {
    "dist".to_string()
}

fn default_namespaces() -> Vec<String> {
    vec!["main".to_string(), "about".to_string(), "resume".to_string()]
}

impl Default for SiteFile {
    fn default() -> Self {
        Self {
            source: default_source(),
            temporary: default_temporary(),
            publish: default_publish(),
            namespaces: default_namespaces(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Site layout
    pub source_dir: PathBuf,
    pub temporary_dir: PathBuf,
    pub publish_dir: PathBuf,

    // Localization
    pub namespaces: Vec<String>,

    // Preview server
    pub port: u16,
    pub dist_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let path = std::env::var("SITE_CONFIG").unwrap_or_else(|_| "config.yml".to_string());
        let site = if Path::new(&path).exists() {
            let text = std::fs::read_to_string(&path)
                .context(format!("Failed to read site config at {}", path))?;
            serde_yaml::from_str(&text).context(format!("Invalid site config at {}", path))?
        } else {
            info!("No site config at {}, using default layout", path);
            SiteFile::default()
        };

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let dist_port = std::env::var("DIST_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DIST_PORT);

        Ok(Self::from_site(site, port, dist_port))
    }

    /// Parse `config.yml` text, keeping default ports.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let site: SiteFile = serde_yaml::from_str(text).context("Invalid site config")?;
        Ok(Self::from_site(site, DEFAULT_PORT, DEFAULT_DIST_PORT))
    }

    fn from_site(site: SiteFile, port: u16, dist_port: u16) -> Self {
        Self {
            source_dir: PathBuf::from(site.source),
            temporary_dir: PathBuf::from(site.temporary),
            publish_dir: PathBuf::from(site.publish),
            namespaces: site.namespaces,
            port,
            dist_port,
        }
    }
}
