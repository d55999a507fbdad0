//! Routes emitted for a site, their render contexts, and pagination.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::errors::BuildError;
use crate::graph::{CategoryItem, PageItem, PostItem};
use crate::i18n::{Locale, TranslationDictionary};

/// Template a route is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Page,
    BlogPost,
    Blog,
    Category,
    Categories,
}

/// Locale information shared by every route context.
#[derive(Debug, Clone)]
pub struct LocaleInfo {
    pub code: String,
    pub default_code: String,
    /// Every locale of the site, in source order, for links to the other languages.
    pub locales: Arc<[Locale]>,
    pub translations: Arc<TranslationDictionary>,
}

impl LocaleInfo {
    /// Translates a UI string, falling back to the key when it has no value for this locale.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.translations.translate_or_key(key, &self.code)
    }
}

#[derive(Debug, Clone)]
pub struct PageContext {
    pub locale: LocaleInfo,
    pub page: PageItem,
}

#[derive(Debug, Clone)]
pub struct BlogPostContext {
    pub locale: LocaleInfo,
    pub post: PostItem,
}

#[derive(Debug, Clone)]
pub struct BlogContext {
    pub locale: LocaleInfo,
    pub posts: PaginationPage<PostItem>,
    pub num_pages: usize,
    /// 1-based.
    pub current_page: usize,
}

#[derive(Debug, Clone)]
pub struct CategoryContext {
    pub locale: LocaleInfo,
    pub category: CategoryItem,
}

#[derive(Debug, Clone)]
pub struct CategoriesContext {
    pub locale: LocaleInfo,
    pub categories: Vec<CategoryItem>,
}

/// Everything a template needs to render a route.
#[derive(Debug, Clone)]
pub enum RouteContext {
    Page(PageContext),
    BlogPost(BlogPostContext),
    Blog(BlogContext),
    Category(CategoryContext),
    Categories(CategoriesContext),
}

impl RouteContext {
    pub fn template(&self) -> Template {
        match self {
            RouteContext::Page(_) => Template::Page,
            RouteContext::BlogPost(_) => Template::BlogPost,
            RouteContext::Blog(_) => Template::Blog,
            RouteContext::Category(_) => Template::Category,
            RouteContext::Categories(_) => Template::Categories,
        }
    }

    pub fn locale(&self) -> &LocaleInfo {
        match self {
            RouteContext::Page(ctx) => &ctx.locale,
            RouteContext::BlogPost(ctx) => &ctx.locale,
            RouteContext::Blog(ctx) => &ctx.locale,
            RouteContext::Category(ctx) => &ctx.locale,
            RouteContext::Categories(ctx) => &ctx.locale,
        }
    }
}

/// A single page of the output site.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub template: Template,
    pub context: RouteContext,
}

impl Route {
    pub fn new(path: impl Into<String>, context: RouteContext) -> Self {
        Self {
            path: path.into(),
            template: context.template(),
            context,
        }
    }

    /// Short human readable description of what the route renders, used in logs and errors.
    pub fn describe(&self) -> String {
        let locale = &self.context.locale().code;
        match &self.context {
            RouteContext::Page(ctx) => format!("page {} ({})", ctx.page.entry.id, locale),
            RouteContext::BlogPost(ctx) => format!("blog post {} ({})", ctx.post.entry.id, locale),
            RouteContext::Blog(ctx) => format!("blog page {} ({})", ctx.current_page, locale),
            RouteContext::Category(ctx) => {
                format!("category {} ({})", ctx.category.entry.id, locale)
            }
            RouteContext::Categories(_) => format!("categories index ({})", locale),
        }
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// Where the route is written: `<output_dir>/<path segments>/index.html`.
    pub fn file_path(&self, output_dir: &Path) -> PathBuf {
        let mut file_path = output_dir.to_path_buf();
        file_path.extend(self.segments());
        file_path.push("index.html");
        file_path
    }

    /// The path with empty segments dropped. Two routes with the same key are written to the same file.
    fn output_key(&self) -> String {
        self.segments().collect::<Vec<_>>().join("/")
    }
}

/// Routes of a build, guaranteed to be written to distinct files.
#[derive(Debug, Default)]
pub struct RouteSet {
    routes: Vec<Route>,
    outputs: FxHashMap<String, usize>,
}

impl RouteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, route: Route) -> Result<(), BuildError> {
        let key = route.output_key();
        if let Some(&existing) = self.outputs.get(&key) {
            return Err(BuildError::DuplicateRoute {
                path: route.path.clone(),
                first: self.routes[existing].describe(),
                second: route.describe(),
            });
        }

        self.outputs.insert(key, self.routes.len());
        self.routes.push(route);
        Ok(())
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl TryFrom<Vec<Route>> for RouteSet {
    type Error = BuildError;

    fn try_from(routes: Vec<Route>) -> Result<Self, Self::Error> {
        let mut set = RouteSet::new();
        for route in routes {
            set.insert(route)?;
        }
        Ok(set)
    }
}

/// Pagination page for any type of items
#[derive(Clone)]
pub struct PaginationPage<T> {
    /// 0-based.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub items: Vec<T>,
}

impl<T> PaginationPage<T> {
    pub fn new(page: usize, per_page: usize, total_items: usize, page_items: Vec<T>) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(per_page)
        };

        Self {
            page,
            per_page,
            total_items,
            total_pages,
            has_next: page < total_pages - 1,
            has_prev: page > 0,
            items: page_items,
        }
    }
}

impl<T> std::fmt::Debug for PaginationPage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationPage")
            .field("page", &self.page)
            .field("per_page", &self.per_page)
            .field("total_items", &self.total_items)
            .field("total_pages", &self.total_pages)
            .field("has_next", &self.has_next)
            .field("has_prev", &self.has_prev)
            .field("items", &format!("[{} items]", self.items.len()))
            .finish()
    }
}

/// Splits `items` into consecutive pages of `per_page` items, keeping their order.
///
/// Returns no pages at all for an empty input, or when `per_page` is 0.
pub fn paginate<T, I>(items: I, per_page: usize) -> Vec<PaginationPage<T>>
where
    I: IntoIterator<Item = T>,
    T: Clone,
{
    let items: Vec<T> = items.into_iter().collect();

    if items.is_empty() || per_page == 0 {
        return vec![];
    }

    let total_items = items.len();

    items
        .chunks(per_page)
        .enumerate()
        .map(|(page, chunk)| PaginationPage::new(page, per_page, total_items, chunk.to_vec()))
        .collect()
}
