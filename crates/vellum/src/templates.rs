//! HTML templates, one per [`Template`](crate::route::Template).
use chrono::DateTime;
use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::GENERATOR;
use crate::build::options::BuildOptions;
use crate::content::MediaAsset;
use crate::content::markdown::{excerpt, render_markdown};
use crate::graph::{CategoryItem, PostItem};
use crate::i18n::{BLOG_KEY, CATEGORIES_KEY, LANGUAGES_KEY};
use crate::route::{
    BlogContext, BlogPostContext, CategoriesContext, CategoryContext, LocaleInfo, PageContext, Route, RouteContext,
};
use crate::slug::{blog_index_path, categories_index_path, locale_root_path, paginated_path};

const EXCERPT_LENGTH: usize = 200;

/// Can be used to create a generator tag in the output HTML. See [`GENERATOR`](crate::GENERATOR).
pub fn generator() -> Markup {
    html! {
        meta name="generator" content=(GENERATOR);
    }
}

/// Renders a route with the template matching its context.
pub fn render_route(route: &Route, options: &BuildOptions) -> Markup {
    let canonical = options
        .canonical_base()
        .map(|base| format!("{}{}", base, route.path));

    let (title, content) = match &route.context {
        RouteContext::Page(ctx) => (ctx.page.entry.title.clone(), page(ctx)),
        RouteContext::BlogPost(ctx) => (ctx.post.entry.title.clone(), blog_post(ctx)),
        RouteContext::Blog(ctx) => (ctx.locale.t(BLOG_KEY).to_string(), blog(ctx)),
        RouteContext::Category(ctx) => (ctx.category.entry.title.clone(), category(ctx)),
        RouteContext::Categories(ctx) => (ctx.locale.t(CATEGORIES_KEY).to_string(), categories(ctx)),
    };

    layout(&title, route.context.locale(), canonical.as_deref(), content)
}

pub fn layout(title: &str, locale: &LocaleInfo, canonical: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(locale.code) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                (generator())
                @if let Some(canonical) = canonical {
                    link rel="canonical" href=(canonical);
                }
                title { (title) }
            }
            body {
                header {
                    nav {
                        ul {
                            li { a href=(locale_root_path(&locale.code, &locale.default_code)) { (locale.t("home")) } }
                            li { a href=(blog_index_path(&locale.code, &locale.default_code, locale.t(BLOG_KEY))) { (locale.t(BLOG_KEY)) } }
                            li { a href=(categories_index_path(&locale.code, &locale.default_code, locale.t(CATEGORIES_KEY))) { (locale.t(CATEGORIES_KEY)) } }
                        }
                    }
                    (language_switcher(locale))
                }
                main {
                    (content)
                }
            }
        }
    }
}

/// Links to the home of every other locale of the site, labelled with the locale's name when it has one.
fn language_switcher(locale: &LocaleInfo) -> Markup {
    if locale.locales.len() < 2 {
        return html! {};
    }

    html! {
        nav.languages aria-label=(locale.t(LANGUAGES_KEY)) {
            span { (locale.t(LANGUAGES_KEY)) ": " }
            ul {
                @for other in locale.locales.iter() {
                    li {
                        @if other.code == locale.code {
                            span aria-current="true" lang=(other.code) { (other.name.as_deref().unwrap_or(other.code.as_str())) }
                        } @else {
                            a href=(locale_root_path(&other.code, &locale.default_code)) hreflang=(other.code) lang=(other.code) {
                                (other.name.as_deref().unwrap_or(other.code.as_str()))
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn page(ctx: &PageContext) -> Markup {
    let page = &ctx.page.entry;
    html! {
        div.section {
            @if let Some(image) = &page.featured_image {
                (featured_image(image))
            }
            div.title {
                h1 { (page.title) }
            }
            @if let Some(body) = &page.body {
                article.content { (PreEscaped(render_markdown(body))) }
            }
        }
    }
}

pub fn blog_post(ctx: &BlogPostContext) -> Markup {
    let post = &ctx.post.entry;
    html! {
        div.section {
            @if let Some(image) = &post.featured_image {
                (featured_image(image))
            }
            div.title {
                h1 { (post.title) }
                (byline(&ctx.locale, post.author.as_deref(), post.created_at.as_deref()))
            }
            @if !ctx.post.categories.is_empty() {
                ul.categories {
                    @for category in &ctx.post.categories {
                        li { a href=(category.slug) { (category.title) } }
                    }
                }
            }
            @if let Some(body) = &post.body {
                article.content { (PreEscaped(render_markdown(body))) }
            }
            @if !post.tags.is_empty() {
                div.tags {
                    strong { (ctx.locale.t("tags")) ": " }
                    @for tag in &post.tags {
                        span.tag { (tag) }
                        " "
                    }
                }
            }
        }
    }
}

/// One page of the blog index, with links to the previous and next pages.
pub fn blog(ctx: &BlogContext) -> Markup {
    let base = blog_index_path(&ctx.locale.code, &ctx.locale.default_code, ctx.locale.t(BLOG_KEY));

    html! {
        div.section {
            div.title {
                h1 { (ctx.locale.t(BLOG_KEY)) }
            }
            div.container {
                @for post in &ctx.posts.items {
                    (post_card(&ctx.locale, post))
                }
            }
            @if ctx.num_pages > 1 {
                nav.pagination {
                    @if ctx.current_page > 1 {
                        a rel="prev" href=(paginated_path(&base, ctx.current_page - 1)) { "←" }
                    }
                    span { (ctx.current_page) " / " (ctx.num_pages) }
                    @if ctx.current_page < ctx.num_pages {
                        a rel="next" href=(paginated_path(&base, ctx.current_page + 1)) { "→" }
                    }
                }
            }
        }
    }
}

pub fn category(ctx: &CategoryContext) -> Markup {
    let category = &ctx.category.entry;
    html! {
        div.section {
            @if let Some(image) = &category.featured_image {
                (featured_image(image))
            }
            div.title {
                h1 { (category.title) }
            }
            @if let Some(description) = &category.description {
                article.content { (PreEscaped(render_markdown(description))) }
            }
            ul.posts {
                @for post in &ctx.category.posts {
                    li {
                        a href=(post.slug) { (post.title) }
                        @if let Some(date) = &post.created_at {
                            " "
                            time datetime=(date) { (format_date(date)) }
                        }
                    }
                }
            }
        }
    }
}

pub fn categories(ctx: &CategoriesContext) -> Markup {
    html! {
        div.section {
            div.title {
                h1 { (ctx.locale.t(CATEGORIES_KEY)) }
            }
            div.container {
                @for category in &ctx.categories {
                    (category_card(category))
                }
            }
        }
    }
}

fn post_card(locale: &LocaleInfo, post: &PostItem) -> Markup {
    let summary = post
        .entry
        .excerpt
        .clone()
        .or_else(|| post.entry.body.as_deref().map(|body| excerpt(body, EXCERPT_LENGTH)));

    html! {
        div.card {
            @if let Some(image) = &post.entry.featured_image {
                (featured_image(image))
            }
            h2.title { a href=(post.slug) { (post.entry.title) } }
            (byline(locale, post.entry.author.as_deref(), post.entry.created_at.as_deref()))
            @if let Some(summary) = summary {
                p { (summary) }
            }
        }
    }
}

fn category_card(category: &CategoryItem) -> Markup {
    html! {
        div.card {
            @if let Some(image) = &category.entry.featured_image {
                (featured_image(image))
            }
            h2.title { a href=(category.slug) { (category.entry.title) } }
            @if let Some(description) = &category.entry.description {
                article.content { (PreEscaped(render_markdown(description))) }
            }
        }
    }
}

fn featured_image(image: &MediaAsset) -> Markup {
    let alt = image
        .description
        .as_deref()
        .or(image.title.as_deref())
        .unwrap_or_default();

    html! {
        div.featured-image {
            img src=(image.url) alt=(alt) width=[image.width] height=[image.height] loading="lazy";
        }
    }
}

/// Fills the `{author}` and `{date}` placeholders of the `writtenByAuthorOnDate` string. When the locale has no such
/// string, the author and date are shown on their own.
fn byline(locale: &LocaleInfo, author: Option<&str>, created_at: Option<&str>) -> Markup {
    if author.is_none() && created_at.is_none() {
        return html! {};
    }

    let author = author.unwrap_or_default();
    let date = created_at.map(format_date).unwrap_or_default();
    let template = locale.t("writtenByAuthorOnDate");

    let text = if template.contains("{author}") || template.contains("{date}") {
        template.replace("{author}", author).replace("{date}", &date)
    } else {
        [author, date.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    };

    html! {
        p.byline { (text) }
    }
}

/// Formats an RFC 3339 timestamp like `1 Mar 2020, 10:00`, leaving anything else untouched.
fn format_date(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date) {
        Ok(date) => date.format("%-d %b %Y, %H:%M").to_string(),
        Err(_) => date.to_string(),
    }
}
