//! Fetched content with computed paths, and the per-locale view of it used to emit routes.
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::build::options::RoutingOptions;
use crate::content::{
    BlogPostEntry, CategoryEntry, ContentNode, LocaleFetch, PageEntry, error_chain,
};
use crate::errors::QueryError;
use crate::i18n::SiteContext;
use crate::slug::resolve_path;

/// Fields computed for a node before any page is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFields {
    /// Public path of the node, see [`resolve_path`].
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
    pub node: ContentNode,
    pub fields: NodeFields,
}

#[derive(Debug)]
enum LocaleNodes {
    Fetched {
        nodes: Vec<ResolvedNode>,
        errors: Vec<String>,
    },
    FetchFailed(String),
}

/// Every fetched node, grouped by locale, with its slug attached.
#[derive(Debug)]
pub struct ContentGraph {
    context: SiteContext,
    locales: FxHashMap<String, LocaleNodes>,
}

/// A category as referenced from a blog post.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRef {
    pub id: String,
    pub title: String,
    pub slug: String,
}

/// A blog post as referenced from a category.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRef {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageItem {
    pub entry: PageEntry,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostItem {
    pub entry: BlogPostEntry,
    pub slug: String,
    pub categories: Vec<CategoryRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryItem {
    pub entry: CategoryEntry,
    pub slug: String,
    /// Posts filed under this category, in source order.
    pub posts: Vec<PostRef>,
}

/// Everything needed to emit the pages of one locale, in source order.
#[derive(Debug, Clone, Default)]
pub struct LocaleContent {
    pub locale: String,
    pub pages: Vec<PageItem>,
    pub posts: Vec<PostItem>,
    pub categories: Vec<CategoryItem>,
}

impl ContentGraph {
    /// Computes the slug of every fetched node.
    ///
    /// Failures never abort the whole graph: a locale whose fetch failed is recorded as such, and a node whose slug
    /// cannot be computed is recorded as an error of its locale.
    pub fn build(context: &SiteContext, fetched: Vec<LocaleFetch>, options: &RoutingOptions) -> Self {
        let mut locales = FxHashMap::default();

        for LocaleFetch { locale, nodes } in fetched {
            let state = match nodes {
                Err(message) => LocaleNodes::FetchFailed(message),
                Ok(nodes) => {
                    let mut resolved = Vec::with_capacity(nodes.len());
                    let mut errors = Vec::new();

                    for node in nodes {
                        match resolve_path(
                            node.kind(),
                            node.raw_slug(),
                            node.title(),
                            node.locale(),
                            context,
                            options,
                        ) {
                            Ok(slug) => {
                                debug!(target: "routes", "{} {} -> {}", node.kind().content_type(), node.id(), slug);
                                resolved.push(ResolvedNode {
                                    node,
                                    fields: NodeFields { slug },
                                });
                            }
                            Err(err) => errors.push(format!(
                                "{} {}: {}",
                                node.kind().content_type(),
                                node.id(),
                                error_chain(&err)
                            )),
                        }
                    }

                    LocaleNodes::Fetched {
                        nodes: resolved,
                        errors,
                    }
                }
            };

            locales.insert(locale, state);
        }

        Self {
            context: context.clone(),
            locales,
        }
    }

    pub fn context(&self) -> &SiteContext {
        &self.context
    }

    /// Pages, posts and categories of `locale` with their cross references resolved.
    ///
    /// Links to entries missing from the locale are dropped with a warning.
    pub fn query(&self, locale: &str) -> Result<LocaleContent, QueryError> {
        let (nodes, errors) = match self.locales.get(locale) {
            None => return Err(QueryError::UnknownLocale(locale.to_string())),
            Some(LocaleNodes::FetchFailed(message)) => {
                return Err(QueryError::FetchFailed {
                    locale: locale.to_string(),
                    message: message.clone(),
                });
            }
            Some(LocaleNodes::Fetched { nodes, errors }) => (nodes, errors),
        };

        if !errors.is_empty() {
            return Err(QueryError::UnresolvedNodes {
                locale: locale.to_string(),
                errors: errors.clone(),
            });
        }

        let mut content = LocaleContent {
            locale: locale.to_string(),
            ..Default::default()
        };

        for resolved in nodes {
            let slug = resolved.fields.slug.clone();
            match &resolved.node {
                ContentNode::Page(page) => content.pages.push(PageItem {
                    entry: page.clone(),
                    slug,
                }),
                ContentNode::BlogPost(post) => content.posts.push(PostItem {
                    entry: post.clone(),
                    slug,
                    categories: Vec::new(),
                }),
                ContentNode::Category(category) => content.categories.push(CategoryItem {
                    entry: category.clone(),
                    slug,
                    posts: Vec::new(),
                }),
            }
        }

        let category_index: FxHashMap<String, usize> = content
            .categories
            .iter()
            .enumerate()
            .map(|(index, category)| (category.entry.id.clone(), index))
            .collect();

        for post in &mut content.posts {
            for category_id in &post.entry.category_ids {
                let Some(&index) = category_index.get(category_id) else {
                    warn!(target: "content", "Blog post {} in {} links to missing category {}, skipping link", post.entry.id, locale, category_id);
                    continue;
                };

                let category = &mut content.categories[index];
                post.categories.push(CategoryRef {
                    id: category.entry.id.clone(),
                    title: category.entry.title.clone(),
                    slug: category.slug.clone(),
                });
                category.posts.push(PostRef {
                    id: post.entry.id.clone(),
                    title: post.entry.title.clone(),
                    slug: post.slug.clone(),
                    created_at: post.entry.created_at.clone(),
                });
            }
        }

        Ok(content)
    }
}
