//! Error types for Vellum.
use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use thiserror::Error;

macro_rules! impl_debug_for_error {
    ($($t:ty),*) => {
        $(
            impl Debug for $t {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    // Errors returned from main are shown through Debug, thiserror only gives us Display.
                    write!(f, "{}", self)
                }
            }
        )*
    };
}

#[derive(Error)]
pub enum ConfigError {
    #[error("Missing required environment variable `{0}`")]
    MissingEnv(&'static str),
    #[error("Invalid build options: {0}")]
    InvalidOptions(String),
}

/// Failure while talking to a content source.
#[derive(Error)]
pub enum FetchError {
    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("Content API returned {status} for {url}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },
    #[error("Could not decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to read content snapshot: {path}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed content: {0}")]
    Malformed(String),
}

#[derive(Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("No translation for `{key}`")]
    MissingKey { key: String },
    #[error("Translation `{key}` has no value for locale `{locale}`")]
    MissingLocale { key: String, locale: String },
}

/// Why an entry could not be given a public path.
#[derive(Error, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error("Path `{0}` contains a `.` or `..` segment")]
    RelativeSegment(String),
}

/// Failure of the startup phase. Always fatal: nothing can be routed without locales and translations.
#[derive(Error)]
pub enum InitError {
    #[error("Failed to fetch locales")]
    Locales(#[source] FetchError),
    #[error("Failed to fetch the translation dictionary")]
    Translations(#[source] FetchError),
    #[error("The content source returned no locales")]
    NoLocales,
    #[error("No default locale among {0:?}")]
    NoDefaultLocale(Vec<String>),
    #[error("More than one default locale: {0:?}")]
    MultipleDefaultLocales(Vec<String>),
    #[error("Translation dictionary is incomplete: translation `{key}` has no value for locale `{locale}`")]
    MissingTranslation { key: String, locale: String },
    #[error("Translation `{key}` for locale `{locale}` cannot be used as a path segment: `{value}`")]
    InvalidRoutingTranslation {
        key: String,
        locale: String,
        value: String,
    },
}

#[derive(Error, Clone)]
pub enum QueryError {
    #[error("Unknown locale `{0}`")]
    UnknownLocale(String),
    #[error("Content for locale `{locale}` could not be fetched: {message}")]
    FetchFailed { locale: String, message: String },
    #[error("{} node(s) in locale `{locale}` could not be resolved: {}", .errors.len(), .errors.join("; "))]
    UnresolvedNodes { locale: String, errors: Vec<String> },
}

#[derive(Error)]
pub enum BuildError {
    #[error("Two routes resolve to `{path}`: {first} and {second}")]
    DuplicateRoute {
        path: String,
        first: String,
        second: String,
    },
    #[error("Failed to write page file: {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum VellumError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl_debug_for_error!(
    ConfigError,
    FetchError,
    TranslationError,
    SlugError,
    InitError,
    QueryError,
    BuildError
);
