//! Resource bundles: per-language, per-namespace text tables.
//!
//! A bundle is a JSON object whose leaves are strings. Keys are
//! dot-addressable into nested objects (`"nav.about"` finds
//! `{"nav": {"about": "..."}}`); a flat key containing dots is matched first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::i18n::Language;

/// Namespace shared by every page.
pub const DEFAULT_NAMESPACE: &str = "main";

/// Separator between path segments of a key.
pub const KEY_SEPARATOR: char = '.';

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceBundle {
    entries: Map<String, Value>,
}

impl ResourceBundle {
    pub fn new(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Parse a bundle from JSON text. The top level must be an object.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Look up a localized string. Non-string leaves and objects are misses.
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(Value::String(text)) = self.entries.get(key) {
            return Some(text);
        }

        let mut segments = key.split(KEY_SEPARATOR);
        let first = segments.next()?;
        let mut node = self.entries.get(first)?;
        for segment in segments {
            node = node.as_object()?.get(segment)?;
        }
        node.as_str()
    }

    /// All leaf keys in dot notation, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.entries, "", &mut keys);
        keys.sort();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collect_keys(map: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (name, value) in map {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}{}{}", prefix, KEY_SEPARATOR, name)
        };
        match value {
            Value::Object(children) => collect_keys(children, &key, out),
            Value::String(_) => out.push(key),
            _ => {}
        }
    }
}

/// A bundle as loaded for one namespace, with the language it actually came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedBundle {
    pub language: Language,
    pub bundle: ResourceBundle,
}

impl LoadedBundle {
    pub fn is_fallback(&self, requested: Language) -> bool {
        self.language != requested
    }
}

/// The bundles active for one language activation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleSet {
    pub language: Language,
    pub namespaces: BTreeMap<String, LoadedBundle>,
    pub missing: Vec<String>,
}

impl BundleSet {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            namespaces: BTreeMap::new(),
            missing: Vec::new(),
        }
    }

    pub fn insert(&mut self, namespace: &str, loaded: LoadedBundle) {
        self.namespaces.insert(namespace.to_string(), loaded);
    }

    /// Look up `key` in `namespace`, or in the default namespace when `None`.
    pub fn lookup(&self, namespace: Option<&str>, key: &str) -> Option<&str> {
        self.namespaces
            .get(namespace.unwrap_or(DEFAULT_NAMESPACE))
            .and_then(|loaded| loaded.bundle.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}
