//! Content model and the sources it is fetched from.
//!
//! A [`ContentSource`] provides the locale list, the translation dictionary and, per locale, the typed
//! content collections of the site. Two sources ship with Vellum: [`ContentfulClient`], which talks to the
//! Contentful Content Delivery API, and [`ContentSnapshot`], an in-memory set of entries usually loaded from
//! a JSON file.
use std::time::Instant;

use log::{error, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::FetchError;
use crate::i18n::{Locale, SiteContext, TranslationDictionary};
use crate::logging::{FormatElapsedTimeOptions, format_elapsed_time};

pub mod contentful;
pub mod markdown;
pub mod snapshot;

pub use contentful::{ContentfulClient, ContentfulConfig};
pub use snapshot::ContentSnapshot;

/// The kinds of entries a site is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Page,
    BlogPost,
    Category,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Page, ContentKind::BlogPost, ContentKind::Category];

    /// The content type identifier used by the content API.
    pub fn content_type(&self) -> &'static str {
        match self {
            ContentKind::Page => "page",
            ContentKind::BlogPost => "blogPost",
            ContentKind::Category => "category",
        }
    }
}

/// A linked media file, such as a featured image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub id: String,
    pub locale: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Markdown.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub featured_image: Option<MediaAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPostEntry {
    pub id: String,
    pub locale: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Markdown.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub featured_image: Option<MediaAsset>,
    /// Ids of the categories this post is filed under.
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: String,
    pub locale: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    /// Markdown.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub featured_image: Option<MediaAsset>,
}

/// One localized entry fetched from a content source.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    Page(PageEntry),
    BlogPost(BlogPostEntry),
    Category(CategoryEntry),
}

impl ContentNode {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentNode::Page(_) => ContentKind::Page,
            ContentNode::BlogPost(_) => ContentKind::BlogPost,
            ContentNode::Category(_) => ContentKind::Category,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ContentNode::Page(page) => &page.id,
            ContentNode::BlogPost(post) => &post.id,
            ContentNode::Category(category) => &category.id,
        }
    }

    pub fn locale(&self) -> &str {
        match self {
            ContentNode::Page(page) => &page.locale,
            ContentNode::BlogPost(post) => &post.locale,
            ContentNode::Category(category) => &category.locale,
        }
    }

    pub fn raw_slug(&self) -> Option<&str> {
        match self {
            ContentNode::Page(page) => page.slug.as_deref(),
            ContentNode::BlogPost(post) => post.slug.as_deref(),
            ContentNode::Category(category) => category.slug.as_deref(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentNode::Page(page) => &page.title,
            ContentNode::BlogPost(post) => &post.title,
            ContentNode::Category(category) => &category.title,
        }
    }
}

/// Must be implemented by every provider of site content.
///
/// Sources are only read from: once for locales and translations during [`SiteContext::initialize`], then
/// once per locale and content kind by [`fetch_all`]. Calls for different locales may happen concurrently.
pub trait ContentSource: Send + Sync {
    /// Name shown in logs.
    fn name(&self) -> &str;

    fn locales(&self) -> Result<Vec<Locale>, FetchError>;

    fn translations(&self) -> Result<TranslationDictionary, FetchError>;

    /// Entries of one kind for one locale, in the order the source defines.
    fn entries(&self, kind: ContentKind, locale: &str) -> Result<Vec<ContentNode>, FetchError>;
}

/// Result of fetching every content kind for a single locale.
#[derive(Debug)]
pub struct LocaleFetch {
    pub locale: String,
    pub nodes: Result<Vec<ContentNode>, String>,
}

/// Fetches the content of every known locale, one locale per task.
///
/// A failing locale does not stop its siblings: its error is logged and kept in the returned [`LocaleFetch`].
pub fn fetch_all(source: &dyn ContentSource, context: &SiteContext) -> Vec<LocaleFetch> {
    context
        .locales()
        .par_iter()
        .map(|locale| {
            let fetch_start = Instant::now();
            let nodes = fetch_locale(source, &locale.code);

            match &nodes {
                Ok(nodes) => {
                    info!(target: "content", "{} {} entries from {} in {}", locale.code, nodes.len(), source.name(), format_elapsed_time(fetch_start.elapsed(), &FormatElapsedTimeOptions::default()));
                }
                Err(err) => {
                    error!(target: "content", "{} could not be fetched from {}: {}", locale.code, source.name(), err);
                }
            }

            LocaleFetch {
                locale: locale.code.clone(),
                nodes: nodes.map_err(|err| error_chain(&err)),
            }
        })
        .collect()
}

fn fetch_locale(source: &dyn ContentSource, locale: &str) -> Result<Vec<ContentNode>, FetchError> {
    let mut nodes = Vec::new();
    for kind in ContentKind::ALL {
        nodes.extend(source.entries(kind, locale)?);
    }
    Ok(nodes)
}

/// Formats an error together with its sources, e.g. `Request to … failed: connection refused`.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
