//! Bundle completeness validation.
//!
//! Every namespace of the default language is the reference. Other languages
//! are checked for missing namespaces, missing keys and keys the reference
//! does not know. Gaps are warnings: at runtime they fall back to the default
//! language or to the page's static text. Unreadable bundles are errors.

use std::collections::BTreeSet;
use std::path::Path;

use crate::i18n::{LanguageRegistry, ResourceBundle};

/// Validation report containing errors and warnings about a bundle tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Bundles that cannot be used at all
    pub errors: Vec<String>,

    /// Gaps that degrade to fallback content
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

/// Key differences between a reference bundle and a translation of it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyDiff {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

pub struct BundleValidator;

impl BundleValidator {
    /// Compare the keys of `candidate` against `reference`.
    pub fn compare(reference: &ResourceBundle, candidate: &ResourceBundle) -> KeyDiff {
        let expected: BTreeSet<String> = reference.keys().into_iter().collect();
        let actual: BTreeSet<String> = candidate.keys().into_iter().collect();

        KeyDiff {
            missing: expected.difference(&actual).cloned().collect(),
            extra: actual.difference(&expected).cloned().collect(),
        }
    }

    /// Validate a `<root>/<language>/<namespace>.json` tree.
    pub fn validate_directory(root: &Path, registry: &LanguageRegistry) -> ValidationReport {
        let mut report = ValidationReport::new();
        let default = registry.default_language();

        let namespaces = match list_namespaces(&root.join(default.code())) {
            Ok(namespaces) => namespaces,
            Err(e) => {
                report.errors.push(format!(
                    "Cannot list {} bundles in {}: {}",
                    default,
                    root.display(),
                    e
                ));
                return report;
            }
        };

        for namespace in &namespaces {
            let reference = match read_bundle(root, default.code(), namespace) {
                Ok(Some(bundle)) => bundle,
                Ok(None) => continue,
                Err(e) => {
                    report.errors.push(e);
                    continue;
                }
            };

            for language in registry.languages().filter(|lang| *lang != default) {
                let candidate = match read_bundle(root, language.code(), namespace) {
                    Ok(Some(bundle)) => bundle,
                    Ok(None) => {
                        report.warnings.push(format!(
                            "{}/{}: bundle missing, {} will be used",
                            language, namespace, default
                        ));
                        continue;
                    }
                    Err(e) => {
                        report.errors.push(e);
                        continue;
                    }
                };

                let diff = Self::compare(&reference, &candidate);
                if !diff.missing.is_empty() {
                    report.warnings.push(format!(
                        "{}/{}: missing keys {:?}",
                        language, namespace, diff.missing
                    ));
                }
                if !diff.extra.is_empty() {
                    report.warnings.push(format!(
                        "{}/{}: keys not in {} {:?}",
                        language, namespace, default, diff.extra
                    ));
                }
            }
        }

        report
    }
}

fn list_namespaces(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut namespaces = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                namespaces.push(stem.to_string());
            }
        }
    }
    namespaces.sort();
    Ok(namespaces)
}

fn read_bundle(
    root: &Path,
    language: &str,
    namespace: &str,
) -> Result<Option<ResourceBundle>, String> {
    let path = root.join(language).join(format!("{}.json", namespace));
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(format!("{}: {}", path.display(), e)),
    };
    ResourceBundle::from_json(&text)
        .map(Some)
        .map_err(|e| format!("{}: malformed bundle: {}", path.display(), e))
}
