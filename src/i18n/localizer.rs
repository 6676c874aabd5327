//! Content localization as a declarative pass over a page snapshot.
//!
//! [`plan`] enumerates every element annotated with `data-i18n`, resolves its
//! keys against a [`BundleSet`] and returns the mutations to perform;
//! [`apply`] performs them.
//!
//! The first pass over an element records the static value of each of its
//! targets in `data-i18n-orig` (an absent attribute is recorded as absent).
//! A key that cannot be resolved puts that recorded value back, so the page
//! only ever shows the active language's text or its static content.
//!
//! Annotation syntax (one or more entries separated by `;`):
//!
//! ```text
//! data-i18n="nav.about"                 text of the element, namespace "main"
//! data-i18n="about:bio"                 text, namespace "about"
//! data-i18n="[title]nav.tip;nav.about"  title attribute, then text
//! data-i18n="[html]resume:summary"      raw HTML content
//! ```
//!
//! `data-i18n-target="title"` sets the target for entries without a
//! `[...]` prefix.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::i18n::{BundleSet, Content, Document, Element, ElementPath, Language};

/// Attribute holding the localization key(s).
pub const KEY_ATTR: &str = "data-i18n";

/// Attribute naming the default target of an element's entries.
pub const TARGET_ATTR: &str = "data-i18n-target";

/// Attribute recording the static values of an element's localized targets.
pub const ORIGINAL_ATTR: &str = "data-i18n-orig";

/// Class marking links that point to a language-specific variant.
pub const LANGUAGE_LINK_CLASS: &str = "linkedInLang";

/// Attribute remembering a language link's original `href`.
pub const ORIGINAL_LINK_ATTR: &str = "data-org-link";

static ENTRY_REGEX: OnceLock<Regex> = OnceLock::new();

/// Where a localized value is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Text,
    Html,
    Attribute(String),
}

impl Target {
    fn parse(name: &str) -> Self {
        match name.trim() {
            "" | "text" => Target::Text,
            "html" => Target::Html,
            other => Target::Attribute(other.to_string()),
        }
    }
}

/// One parsed entry of a `data-i18n` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRef {
    pub target: Target,
    pub namespace: Option<String>,
    pub key: String,
}

/// What a mutation does to its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Content(Content),
    SetAttribute { name: String, value: String },
    RemoveAttribute(String),
}

/// A single change to apply to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub path: ElementPath,
    pub change: Change,
}

impl Mutation {
    fn set_attribute(path: ElementPath, name: &str, value: String) -> Self {
        Self {
            path,
            change: Change::SetAttribute {
                name: name.to_string(),
                value,
            },
        }
    }
}

/// Static values of an element's targets, as stored in [`ORIGINAL_ATTR`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Originals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Content>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Option<String>>,
}

impl Originals {
    fn read(element: &Element) -> Self {
        let Some(recorded) = element.attribute(ORIGINAL_ATTR) else {
            return Self::default();
        };
        serde_json::from_str(recorded).unwrap_or_else(|e| {
            warn!("Ignoring unreadable {} value: {}", ORIGINAL_ATTR, e);
            Self::default()
        })
    }
}

/// Parse a `data-i18n` value. Blank entries are skipped.
pub fn parse_annotation(annotation: &str, default_target: Option<&str>) -> Vec<KeyRef> {
    let regex = ENTRY_REGEX.get_or_init(|| {
        Regex::new(r"^(?:\[(?P<target>[^\]]*)\])?(?:(?P<ns>[A-Za-z0-9_-]+):)?(?P<key>.+)$")
            .expect("annotation pattern is valid")
    });

    annotation
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let caps = regex.captures(entry)?;
            let target = caps
                .name("target")
                .map(|m| m.as_str())
                .or(default_target)
                .map(Target::parse)
                .unwrap_or(Target::Text);
            Some(KeyRef {
                target,
                namespace: caps.name("ns").map(|m| m.as_str().to_string()),
                key: caps.name("key")?.as_str().trim().to_string(),
            })
        })
        .collect()
}

/// Compute the mutations that bring `document` in line with `bundles`.
///
/// Targets whose key resolves get the bundle's value; all others get their
/// recorded static value. The result depends only on the static page and
/// `bundles`, never on a previously applied language. Values already in
/// place produce no mutation, so planning again after [`apply`] yields an
/// empty list.
pub fn plan(document: &Document, bundles: &BundleSet) -> Vec<Mutation> {
    let mut mutations = Vec::new();

    for (path, element) in document.elements() {
        let Some(annotation) = element.attribute(KEY_ATTR) else {
            continue;
        };

        let recorded = Originals::read(element);
        let mut originals = recorded.clone();

        for key_ref in parse_annotation(annotation, element.attribute(TARGET_ATTR)) {
            let value = bundles.lookup(key_ref.namespace.as_deref(), &key_ref.key);
            if value.is_none() {
                debug!(
                    "No {} text for '{}' in namespace {:?}, using static content",
                    bundles.language, key_ref.key, key_ref.namespace
                );
            }

            match &key_ref.target {
                Target::Attribute(name) => {
                    let current = element.attribute(name).map(str::to_string);
                    let original = originals
                        .attributes
                        .entry(name.clone())
                        .or_insert_with(|| current.clone())
                        .clone();
                    let desired = value.map(str::to_string).or(original);
                    if desired == current {
                        continue;
                    }

                    mutations.push(Mutation {
                        path: path.clone(),
                        change: match desired {
                            Some(value) => Change::SetAttribute {
                                name: name.clone(),
                                value,
                            },
                            None => Change::RemoveAttribute(name.clone()),
                        },
                    });
                }
                target => {
                    let current = &element.content;
                    let original = originals
                        .content
                        .get_or_insert_with(|| current.clone())
                        .clone();
                    let desired = match (value, target) {
                        (Some(value), Target::Html) => Content::Html(value.to_string()),
                        (Some(value), _) => Content::Text(value.to_string()),
                        (None, _) => original,
                    };
                    if &desired == current {
                        continue;
                    }

                    mutations.push(Mutation {
                        path: path.clone(),
                        change: Change::Content(desired),
                    });
                }
            }
        }

        if originals != recorded {
            match serde_json::to_string(&originals) {
                Ok(json) => mutations.push(Mutation::set_attribute(path, ORIGINAL_ATTR, json)),
                Err(e) => warn!("Could not record static content: {}", e),
            }
        }
    }

    mutations
}

/// Compute the `href` rewrites of language-aware links.
///
/// A link shows its original `href` for the default language and
/// `<original>/<code>` otherwise. The original is recorded in
/// `data-org-link` on first use.
pub fn plan_language_links(
    document: &Document,
    language: Language,
    default: Language,
) -> Vec<Mutation> {
    let mut mutations = Vec::new();

    for path in document.find_by_class(LANGUAGE_LINK_CLASS) {
        let Some(element) = document.get(&path) else {
            continue;
        };

        let original = match element.attribute(ORIGINAL_LINK_ATTR) {
            Some(original) => original.to_string(),
            None => {
                let Some(href) = element.attribute("href") else {
                    continue;
                };
                mutations.push(Mutation::set_attribute(
                    path.clone(),
                    ORIGINAL_LINK_ATTR,
                    href.to_string(),
                ));
                href.to_string()
            }
        };

        let href = if language == default {
            original
        } else {
            format!("{}/{}", original, language.code())
        };

        if element.attribute("href") != Some(href.as_str()) {
            mutations.push(Mutation::set_attribute(path, "href", href));
        }
    }

    mutations
}

/// Perform mutations in order. Mutations for paths that do not exist are skipped.
pub fn apply(document: &mut Document, mutations: &[Mutation]) {
    for mutation in mutations {
        let Some(element) = document.get_mut(&mutation.path) else {
            continue;
        };
        match &mutation.change {
            Change::Content(content) => element.content = content.clone(),
            Change::SetAttribute { name, value } => element.set_attribute(name, value),
            Change::RemoveAttribute(name) => {
                element.remove_attribute(name);
            }
        }
    }
}

/// Localize every annotated element of `document`. Returns the number of changes.
pub fn localize(document: &mut Document, bundles: &BundleSet) -> usize {
    let mutations = plan(document, bundles);
    apply(document, &mutations);
    mutations.len()
}

/// Put every localized target back to its static value.
pub fn restore(document: &mut Document, language: Language) -> usize {
    localize(document, &BundleSet::new(language))
}
