//! Turns the content graph into routes, one locale at a time.
use std::time::Instant;

use log::{error, info};
use rayon::prelude::*;

use crate::build::options::RoutingOptions;
use crate::content::error_chain;
use crate::errors::ConfigError;
use crate::graph::{ContentGraph, LocaleContent};
use crate::i18n::{BLOG_KEY, CATEGORIES_KEY, SiteContext};
use crate::logging::{FormatElapsedTimeOptions, format_elapsed_time};
use crate::route::{
    BlogContext, BlogPostContext, CategoriesContext, CategoryContext, LocaleInfo, PageContext, Route, RouteContext,
    paginate,
};
use crate::slug::{blog_index_path, categories_index_path, paginated_path};

#[derive(Debug, Clone, PartialEq)]
pub enum LocaleOutcome {
    /// Every route of the locale was handed to the page-creation callback. `routes` may be zero if the locale has
    /// no content.
    Emitted { routes: usize },
    /// Nothing was emitted for the locale.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocaleReport {
    pub locale: String,
    pub outcome: LocaleOutcome,
}

/// Per-locale result of [`PageEmitter::emit`], in locale order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitReport {
    pub locales: Vec<LocaleReport>,
}

impl EmitReport {
    pub fn emitted_routes(&self) -> usize {
        self.locales
            .iter()
            .map(|report| match report.outcome {
                LocaleOutcome::Emitted { routes } => routes,
                LocaleOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &LocaleReport> {
        self.locales
            .iter()
            .filter(|report| matches!(report.outcome, LocaleOutcome::Failed { .. }))
    }
}

pub struct PageEmitter<'a> {
    options: &'a RoutingOptions,
}

impl<'a> PageEmitter<'a> {
    pub fn new(options: &'a RoutingOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Emits the routes of every locale of `graph` through `create_page`.
    ///
    /// Locales are processed in parallel. The routes of a locale are all computed before the first one is passed
    /// to `create_page`, so a failing locale emits nothing while its siblings proceed. Within a locale, calls to
    /// `create_page` happen in order: pages, blog posts, blog index pages, categories, then the categories index.
    pub fn emit(&self, graph: &ContentGraph, create_page: impl Fn(Route) + Sync) -> EmitReport {
        let context = graph.context();

        let locales = context
            .locales()
            .par_iter()
            .map(|locale| {
                let locale_start = Instant::now();

                let routes = graph
                    .query(&locale.code)
                    .map_err(|err| error_chain(&err))
                    .and_then(|content| self.locale_routes(context, content));

                let outcome = match routes {
                    Ok(routes) => {
                        let count = routes.len();
                        routes.into_iter().for_each(&create_page);

                        info!(target: "routes", "{} {} routes in {}", locale.code, count, format_elapsed_time(locale_start.elapsed(), &FormatElapsedTimeOptions::default()));
                        LocaleOutcome::Emitted { routes: count }
                    }
                    Err(error) => {
                        error!(target: "routes", "{} skipped: {}", locale.code, error);
                        LocaleOutcome::Failed { error }
                    }
                };

                LocaleReport {
                    locale: locale.code.clone(),
                    outcome,
                }
            })
            .collect();

        EmitReport { locales }
    }

    fn locale_routes(&self, context: &SiteContext, content: LocaleContent) -> Result<Vec<Route>, String> {
        let locale_info = LocaleInfo {
            code: content.locale.clone(),
            default_code: context.default_locale().code.clone(),
            locales: context.locales().into(),
            translations: context.translations().clone(),
        };

        let blog_word = context
            .translate(BLOG_KEY, &content.locale)
            .map_err(|err| error_chain(&err))?;
        let categories_word = context
            .translate(CATEGORIES_KEY, &content.locale)
            .map_err(|err| error_chain(&err))?;

        let mut routes = Vec::new();

        for page in content.pages {
            routes.push(Route::new(
                page.slug.clone(),
                RouteContext::Page(PageContext {
                    locale: locale_info.clone(),
                    page,
                }),
            ));
        }

        for post in &content.posts {
            routes.push(Route::new(
                post.slug.clone(),
                RouteContext::BlogPost(BlogPostContext {
                    locale: locale_info.clone(),
                    post: post.clone(),
                }),
            ));
        }

        let blog_path = blog_index_path(&locale_info.code, &locale_info.default_code, blog_word);
        let blog_pages = paginate(content.posts, self.options.posts_per_page);
        let num_pages = blog_pages.len();
        for posts in blog_pages {
            let current_page = posts.page + 1;
            routes.push(Route::new(
                paginated_path(&blog_path, current_page),
                RouteContext::Blog(BlogContext {
                    locale: locale_info.clone(),
                    posts,
                    num_pages,
                    current_page,
                }),
            ));
        }

        for category in &content.categories {
            routes.push(Route::new(
                category.slug.clone(),
                RouteContext::Category(CategoryContext {
                    locale: locale_info.clone(),
                    category: category.clone(),
                }),
            ));
        }

        routes.push(Route::new(
            categories_index_path(&locale_info.code, &locale_info.default_code, categories_word),
            RouteContext::Categories(CategoriesContext {
                locale: locale_info,
                categories: content.categories,
            }),
        ));

        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::content::{BlogPostEntry, CategoryEntry, ContentNode, LocaleFetch, PageEntry};
    use crate::i18n::{Locale, TranslationDictionary};
    use crate::route::{RouteSet, Template};

    fn context() -> SiteContext {
        let translations: TranslationDictionary = [
            ("blog", "en", "blog"),
            ("blog", "is", "blogg"),
            ("categories", "en", "categories"),
            ("categories", "is", "flokkar"),
            ("category", "en", "category"),
            ("category", "is", "flokkur"),
        ]
        .into_iter()
        .collect();

        SiteContext::new(
            vec![Locale::new("en", true), Locale::new("is", false)],
            translations,
        )
        .unwrap()
    }

    fn post(id: &str, locale: &str, title: &str) -> ContentNode {
        ContentNode::BlogPost(BlogPostEntry {
            id: id.to_string(),
            locale: locale.to_string(),
            slug: None,
            title: title.to_string(),
            created_at: None,
            author: None,
            excerpt: None,
            body: None,
            featured_image: None,
            category_ids: vec!["veg".to_string()],
            tags: vec![],
        })
    }

    fn nodes(locale: &str) -> Vec<ContentNode> {
        vec![
            ContentNode::Page(PageEntry {
                id: "home".to_string(),
                locale: locale.to_string(),
                slug: Some("/".to_string()),
                title: "Home".to_string(),
                created_at: None,
                body: None,
                featured_image: None,
            }),
            post("p1", locale, "Carrot"),
            post("p2", locale, "Spinach"),
            post("p3", locale, "Turnip"),
            ContentNode::Category(CategoryEntry {
                id: "veg".to_string(),
                locale: locale.to_string(),
                slug: Some("/graenmeti".to_string()),
                title: "Grænmeti".to_string(),
                description: None,
                featured_image: None,
            }),
        ]
    }

    fn emit(fetched: Vec<LocaleFetch>, options: &RoutingOptions) -> (Vec<Route>, EmitReport) {
        let graph = ContentGraph::build(&context(), fetched, options);
        let routes = Mutex::new(Vec::new());
        let report = PageEmitter::new(options)
            .unwrap()
            .emit(&graph, |route| routes.lock().unwrap().push(route));
        (routes.into_inner().unwrap(), report)
    }

    #[test]
    fn test_emit_default_locale() {
        let (routes, report) = emit(
            vec![LocaleFetch {
                locale: "en".to_string(),
                nodes: Ok(nodes("en")),
            }],
            &RoutingOptions::default(),
        );

        let paths: Vec<_> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/",
                "/blog/carrot",
                "/blog/spinach",
                "/blog/turnip",
                "/blog",
                "/blog/2",
                "/blog/3",
                "/category/graenmeti",
                "/categories",
            ]
        );

        assert_eq!(report.locales[0].outcome, LocaleOutcome::Emitted { routes: 9 });
        // "is" was never fetched
        assert!(matches!(report.locales[1].outcome, LocaleOutcome::Failed { .. }));
        assert_eq!(report.emitted_routes(), 9);
    }

    #[test]
    fn test_blog_pagination_contexts() {
        let options = RoutingOptions {
            posts_per_page: 2,
            ..Default::default()
        };
        let (routes, _) = emit(
            vec![LocaleFetch {
                locale: "is".to_string(),
                nodes: Ok(nodes("is")),
            }],
            &options,
        );

        let blog: Vec<_> = routes
            .iter()
            .filter_map(|route| match &route.context {
                RouteContext::Blog(ctx) => Some((route.path.as_str(), ctx)),
                _ => None,
            })
            .collect();

        assert_eq!(blog.len(), 2);
        assert_eq!(blog[0].0, "/is/blogg");
        assert_eq!(blog[0].1.current_page, 1);
        assert_eq!(blog[0].1.num_pages, 2);
        assert_eq!(blog[0].1.posts.items.len(), 2);
        assert_eq!(blog[0].1.locale.default_code, "en");
        assert_eq!(blog[1].0, "/is/blogg/2");
        assert_eq!(blog[1].1.current_page, 2);
        assert_eq!(blog[1].1.posts.items[0].entry.id, "p3");
    }

    #[test]
    fn test_failing_locale_emits_nothing() {
        let (routes, report) = emit(
            vec![
                LocaleFetch {
                    locale: "en".to_string(),
                    nodes: Ok(nodes("en")),
                },
                LocaleFetch {
                    locale: "is".to_string(),
                    nodes: Err("connection reset".to_string()),
                },
            ],
            &RoutingOptions::default(),
        );

        assert!(routes.iter().all(|route| route.context.locale().code == "en"));
        assert_eq!(report.failed().count(), 1);
        assert!(matches!(
            &report.locales[1].outcome,
            LocaleOutcome::Failed { error } if error.contains("connection reset")
        ));
    }

    #[test]
    fn test_empty_locale_still_gets_categories_index() {
        let (routes, report) = emit(
            vec![
                LocaleFetch {
                    locale: "en".to_string(),
                    nodes: Ok(vec![]),
                },
                LocaleFetch {
                    locale: "is".to_string(),
                    nodes: Ok(vec![]),
                },
            ],
            &RoutingOptions::default(),
        );

        assert_eq!(routes.len(), 2);
        assert!(routes.iter().all(|route| route.template == Template::Categories));
        assert!(report.failed().next().is_none());
    }

    #[test]
    fn test_emitted_paths_are_unique() {
        let (routes, _) = emit(
            vec![
                LocaleFetch {
                    locale: "en".to_string(),
                    nodes: Ok(nodes("en")),
                },
                LocaleFetch {
                    locale: "is".to_string(),
                    nodes: Ok(nodes("is")),
                },
            ],
            &RoutingOptions::default(),
        );

        assert_eq!(routes.len(), 18);
        assert!(RouteSet::try_from(routes).is_ok());
    }

    #[test]
    fn test_category_segment_disabled() {
        let options = RoutingOptions {
            category_segment: false,
            ..Default::default()
        };
        let (routes, _) = emit(
            vec![LocaleFetch {
                locale: "en".to_string(),
                nodes: Ok(nodes("en")),
            }],
            &options,
        );

        assert!(routes.iter().any(|route| route.path == "/graenmeti" && route.template == Template::Category));
    }

    #[test]
    fn test_emitter_rejects_empty_blog_pages() {
        let options = RoutingOptions {
            posts_per_page: 0,
            ..Default::default()
        };
        assert!(matches!(PageEmitter::new(&options), Err(ConfigError::InvalidOptions(_))));
    }

    #[test]
    fn test_routes_know_every_locale() {
        let (routes, _) = emit(
            vec![LocaleFetch {
                locale: "is".to_string(),
                nodes: Ok(nodes("is")),
            }],
            &RoutingOptions::default(),
        );

        let codes: Vec<_> = routes[0].context.locale().locales.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["en", "is"]);
    }
}
