//! Localization session: the active language of one page view.
//!
//! A session owns everything that changes while a page is open: the active
//! language, the bundles in use, the preference store and a switch
//! generation counter. Initial load and user-initiated switches go through
//! the same activation path, so both end in the same state for the same
//! language.
//!
//! Switching is split in two so a slow bundle load cannot clobber a newer
//! choice: [`LocalizationSession::begin_switch`] updates state synchronously
//! and hands out a [`SwitchTicket`]; [`LocalizationSession::complete_switch`]
//! applies the loaded bundles only if no later switch has begun.

use tracing::{debug, info, warn};

use crate::i18n::localizer::{apply, localize, plan_language_links, restore};
use crate::i18n::resolver::{resolve_language, Resolution};
use crate::i18n::source::{init_bundles, BundleSource, InitError};
use crate::i18n::{BundleSet, Document, Language, LanguageRegistry, PreferenceStore};

/// Class marking the control of the active language.
pub const SELECTED_CLASS: &str = "lang-button-select";

/// Class prefix of per-language switch controls (`lang-en`, `lang-ja`, ...).
pub const CONTROL_CLASS_PREFIX: &str = "lang-";

/// What the page knows about the visitor before any language is chosen.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Raw query string of the page URL, with or without the leading `?`
    pub url_query: String,

    /// Browser locale preferences, most preferred first
    pub browser_locales: Vec<String>,
}

/// Proof that a switch was started; redeemed by `complete_switch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a switch is only finished by complete_switch"]
pub struct SwitchTicket {
    generation: u64,
    language: Language,
}

impl SwitchTicket {
    pub fn language(&self) -> Language {
        self.language
    }
}

pub struct LocalizationSession<P: PreferenceStore> {
    registry: LanguageRegistry,
    namespaces: Vec<String>,
    store: P,
    language: Language,
    bundles: Option<BundleSet>,
    generation: u64,
}

impl<P: PreferenceStore> LocalizationSession<P> {
    /// Create a session that will load `namespaces`. Until a language is
    /// activated the session reports the registry default.
    pub fn new(registry: LanguageRegistry, namespaces: Vec<String>, store: P) -> Self {
        let language = registry.default_language();
        Self {
            registry,
            namespaces,
            store,
            language,
            bundles: None,
            generation: 0,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn bundles(&self) -> Option<&BundleSet> {
        self.bundles.as_ref()
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Resolve the initial language and start activating it.
    pub fn begin_load(
        &mut self,
        page: &PageContext,
        document: &mut Document,
    ) -> (Resolution, SwitchTicket) {
        let stored = self.store.load();
        let resolution = resolve_language(
            &page.url_query,
            stored.as_deref(),
            &page.browser_locales,
            &self.registry,
        );
        info!(
            "Resolved page language {} from {:?}",
            resolution.language, resolution.source
        );

        let ticket = self.begin_switch(resolution.language, document);
        (resolution, ticket)
    }

    /// Update the active language, the switch controls, the stored
    /// preference and the root `lang` attribute.
    pub fn begin_switch(&mut self, language: Language, document: &mut Document) -> SwitchTicket {
        self.generation += 1;
        self.language = language;

        for path in document.find_by_class(SELECTED_CLASS) {
            if let Some(element) = document.get_mut(&path) {
                element.remove_class(SELECTED_CLASS);
            }
        }
        let control = format!("{}{}", CONTROL_CLASS_PREFIX, language.code());
        for path in document.find_by_class(&control) {
            if let Some(element) = document.get_mut(&path) {
                element.add_class(SELECTED_CLASS);
            }
        }

        if let Err(e) = self.store.save(language) {
            warn!(
                "Could not persist language {}, keeping it for this page only: {}",
                language, e
            );
        }

        document.root.set_attribute("lang", language.code());

        SwitchTicket {
            generation: self.generation,
            language,
        }
    }

    /// Finish a switch with the outcome of its bundle load.
    ///
    /// Returns `false` when the ticket was superseded by a later switch; the
    /// bundles are then discarded and nothing is touched.
    pub fn complete_switch(
        &mut self,
        ticket: SwitchTicket,
        loaded: Result<BundleSet, InitError>,
        document: &mut Document,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding bundles for {}: superseded by {}",
                ticket.language, self.language
            );
            return false;
        }

        let default = self.registry.default_language();
        let links = plan_language_links(document, ticket.language, default);
        apply(document, &links);

        match loaded {
            Ok(bundles) => {
                let changed = localize(document, &bundles);
                debug!("Localized {} value(s) for {}", changed, ticket.language);
                self.bundles = Some(bundles);
            }
            Err(e) => {
                warn!("{}; page shows its static content", e);
                restore(document, ticket.language);
                self.bundles = None;
            }
        }
        true
    }

    /// Resolve, load and apply the initial language of the page.
    pub async fn load<S: BundleSource + Sync>(
        &mut self,
        page: &PageContext,
        source: &S,
        document: &mut Document,
    ) -> Resolution {
        let (resolution, ticket) = self.begin_load(page, document);
        let loaded = self.load_bundles(source, ticket.language).await;
        self.complete_switch(ticket, loaded, document);
        resolution
    }

    /// Switch to `language` in response to a user action.
    pub async fn switch_language<S: BundleSource + Sync>(
        &mut self,
        language: Language,
        source: &S,
        document: &mut Document,
    ) -> bool {
        let ticket = self.begin_switch(language, document);
        let loaded = self.load_bundles(source, ticket.language).await;
        self.complete_switch(ticket, loaded, document)
    }

    /// Load the session's namespaces for `language` without touching state.
    pub async fn load_bundles<S: BundleSource + Sync>(
        &self,
        source: &S,
        language: Language,
    ) -> Result<BundleSet, InitError> {
        init_bundles(
            source,
            language,
            self.namespaces.as_slice(),
            self.registry.default_language(),
        )
        .await
    }
}
