//! Locales, the translation dictionary, and the immutable [`SiteContext`] built from them at startup.
//!
//! Everything downstream (slugs, routes, templates) reads locale state from a [`SiteContext`] passed explicitly,
//! which is produced once by [`SiteContext::initialize`] before any content is fetched.
use std::sync::Arc;

use log::info;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::content::ContentSource;
use crate::errors::{InitError, TranslationError};

/// Translation key holding the path segment of blog posts and of the blog index, e.g. `blog` / `blogg`.
pub const BLOG_KEY: &str = "blog";
/// Translation key holding the path segment of the categories index.
pub const CATEGORIES_KEY: &str = "categories";
/// Translation key holding the path segment of single categories.
pub const CATEGORY_KEY: &str = "category";

/// Translation key of the label of the language switcher.
pub const LANGUAGES_KEY: &str = "languages";

/// Keys that routing depends on. They must be translated for every locale.
pub const ROUTING_KEYS: [&str; 3] = [BLOG_KEY, CATEGORIES_KEY, CATEGORY_KEY];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "default")]
    pub is_default: bool,
}

impl Locale {
    pub fn new(code: impl Into<String>, is_default: bool) -> Self {
        Self {
            code: code.into(),
            name: None,
            is_default,
        }
    }
}

/// UI strings for every locale, keyed by translation key then by locale code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationDictionary(FxHashMap<String, FxHashMap<String, String>>);

impl TranslationDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        locale: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.0
            .entry(key.into())
            .or_default()
            .insert(locale.into(), value.into());
    }

    pub fn translate(&self, key: &str, locale: &str) -> Result<&str, TranslationError> {
        let values = self.0.get(key).ok_or_else(|| TranslationError::MissingKey {
            key: key.to_string(),
        })?;

        values
            .get(locale)
            .map(String::as_str)
            .ok_or_else(|| TranslationError::MissingLocale {
                key: key.to_string(),
                locale: locale.to_string(),
            })
    }

    /// Lenient lookup for templates: falls back to the key itself.
    pub fn translate_or_key<'a>(&'a self, key: &'a str, locale: &str) -> &'a str {
        self.translate(key, locale).unwrap_or(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, L, V> FromIterator<(K, L, V)> for TranslationDictionary
where
    K: Into<String>,
    L: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, L, V)>>(iter: I) -> Self {
        let mut dictionary = TranslationDictionary::new();
        for (key, locale, value) in iter {
            dictionary.insert(key, locale, value);
        }
        dictionary
    }
}

/// Process-wide, read-only state resolved before page generation.
#[derive(Debug, Clone)]
pub struct SiteContext {
    locales: Vec<Locale>,
    default_index: usize,
    translations: Arc<TranslationDictionary>,
}

impl SiteContext {
    /// Fetches locales and translations from `source` exactly once and validates them.
    pub fn initialize(source: &dyn ContentSource) -> Result<Self, InitError> {
        let locales = source.locales().map_err(InitError::Locales)?;
        let translations = source.translations().map_err(InitError::Translations)?;

        let context = Self::new(locales, translations)?;

        info!(target: "content", "{} locale(s), default is {}", context.locales.len(), context.default_locale().code);

        Ok(context)
    }

    pub fn new(
        locales: Vec<Locale>,
        translations: TranslationDictionary,
    ) -> Result<Self, InitError> {
        if locales.is_empty() {
            return Err(InitError::NoLocales);
        }

        let defaults: Vec<usize> = locales
            .iter()
            .enumerate()
            .filter(|(_, locale)| locale.is_default)
            .map(|(index, _)| index)
            .collect();

        let default_index = match defaults.as_slice() {
            [index] => *index,
            [] => {
                return Err(InitError::NoDefaultLocale(
                    locales.iter().map(|l| l.code.clone()).collect(),
                ));
            }
            _ => {
                return Err(InitError::MultipleDefaultLocales(
                    defaults.iter().map(|&i| locales[i].code.clone()).collect(),
                ));
            }
        };

        for key in ROUTING_KEYS {
            for locale in &locales {
                let Ok(word) = translations.translate(key, &locale.code) else {
                    return Err(InitError::MissingTranslation {
                        key: key.to_string(),
                        locale: locale.code.clone(),
                    });
                };

                if word.split('/').any(|segment| segment == "." || segment == "..") {
                    return Err(InitError::InvalidRoutingTranslation {
                        key: key.to_string(),
                        locale: locale.code.clone(),
                        value: word.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            locales,
            default_index,
            translations: Arc::new(translations),
        })
    }

    /// Locales in the order the content source returned them.
    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    pub fn default_locale(&self) -> &Locale {
        &self.locales[self.default_index]
    }

    pub fn translations(&self) -> &Arc<TranslationDictionary> {
        &self.translations
    }

    pub fn translate(&self, key: &str, locale_code: &str) -> Result<&str, TranslationError> {
        self.translations.translate(key, locale_code)
    }
}
