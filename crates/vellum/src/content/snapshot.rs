//! In-memory [`ContentSource`], usually loaded from a JSON export of the content space.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{BlogPostEntry, CategoryEntry, ContentKind, ContentNode, ContentSource, PageEntry};
use crate::errors::FetchError;
use crate::i18n::{Locale, TranslationDictionary};

/// A complete, already localized copy of the site content.
///
/// ## Example
/// ```json
/// {
///   "locales": [{ "code": "en", "default": true }, { "code": "is" }],
///   "translations": {
///     "blog": { "en": "blog", "is": "blogg" },
///     "categories": { "en": "categories", "is": "flokkar" },
///     "category": { "en": "category", "is": "flokkur" }
///   },
///   "blog_posts": [{ "id": "1", "locale": "is", "title": "Hin Dásamlega!" }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSnapshot {
    pub locales: Vec<Locale>,
    #[serde(default)]
    pub translations: TranslationDictionary,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
    #[serde(default)]
    pub blog_posts: Vec<BlogPostEntry>,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

impl ContentSnapshot {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| FetchError::SnapshotRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content, &path.to_string_lossy())
    }

    pub fn from_json(content: &str, origin: &str) -> Result<Self, FetchError> {
        serde_json::from_str(content).map_err(|source| FetchError::Decode {
            url: origin.to_string(),
            source,
        })
    }

    /// Adds an entry of any kind, keeping insertion order within its kind.
    pub fn push(&mut self, node: ContentNode) {
        match node {
            ContentNode::Page(page) => self.pages.push(page),
            ContentNode::BlogPost(post) => self.blog_posts.push(post),
            ContentNode::Category(category) => self.categories.push(category),
        }
    }
}

impl ContentSource for ContentSnapshot {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn locales(&self) -> Result<Vec<Locale>, FetchError> {
        Ok(self.locales.clone())
    }

    fn translations(&self) -> Result<TranslationDictionary, FetchError> {
        if self.translations.is_empty() {
            return Err(FetchError::Malformed(
                "the snapshot has no translations".to_string(),
            ));
        }
        Ok(self.translations.clone())
    }

    fn entries(&self, kind: ContentKind, locale: &str) -> Result<Vec<ContentNode>, FetchError> {
        let nodes = match kind {
            ContentKind::Page => self
                .pages
                .iter()
                .filter(|page| page.locale == locale)
                .cloned()
                .map(ContentNode::Page)
                .collect(),
            ContentKind::BlogPost => self
                .blog_posts
                .iter()
                .filter(|post| post.locale == locale)
                .cloned()
                .map(ContentNode::BlogPost)
                .collect(),
            ContentKind::Category => self
                .categories
                .iter()
                .filter(|category| category.locale == locale)
                .cloned()
                .map(ContentNode::Category)
                .collect(),
        };

        Ok(nodes)
    }
}
