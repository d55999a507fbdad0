//! [`ContentSource`] backed by the Contentful Content Delivery API.
use std::env;
use std::time::Duration;

use log::{debug, trace};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{
    BlogPostEntry, CategoryEntry, ContentKind, ContentNode, ContentSource, MediaAsset, PageEntry,
};
use crate::errors::{ConfigError, FetchError};
use crate::i18n::{Locale, TranslationDictionary};

/// Content type of the single entry holding every UI string.
pub const TRANSLATIONS_CONTENT_TYPE: &str = "translations";

/// Contentful refuses pages larger than this.
const PAGE_LIMIT: usize = 1000;

/// Connection settings for a Contentful space.
#[derive(Clone)]
pub struct ContentfulConfig {
    pub space_id: String,
    pub access_token: String,
    /// Defaults to `master`.
    pub environment: String,
    /// Defaults to `cdn.contentful.com`. Use `preview.contentful.com` together with a preview token to build drafts.
    pub host: String,
}

impl ContentfulConfig {
    pub fn new(space_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            access_token: access_token.into(),
            environment: "master".to_string(),
            host: "cdn.contentful.com".to_string(),
        }
    }

    /// Reads `CONTENTFUL_SPACE_ID` and `CONTENTFUL_ACCESS_TOKEN`, and optionally `CONTENTFUL_ENVIRONMENT` and `CONTENTFUL_HOST`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let space_id = env::var("CONTENTFUL_SPACE_ID")
            .map_err(|_| ConfigError::MissingEnv("CONTENTFUL_SPACE_ID"))?;
        let access_token = env::var("CONTENTFUL_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnv("CONTENTFUL_ACCESS_TOKEN"))?;

        let mut config = Self::new(space_id, access_token);
        if let Ok(environment) = env::var("CONTENTFUL_ENVIRONMENT") {
            config.environment = environment;
        }
        if let Ok(host) = env::var("CONTENTFUL_HOST") {
            config.host = host;
        }

        Ok(config)
    }

    fn base_url(&self) -> String {
        format!(
            "https://{}/spaces/{}/environments/{}",
            self.host, self.space_id, self.environment
        )
    }
}

// The access token must never end up in logs.
impl std::fmt::Debug for ContentfulConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentfulConfig")
            .field("space_id", &self.space_id)
            .field("environment", &self.environment)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

pub struct ContentfulClient {
    config: ContentfulConfig,
    agent: ureq::Agent,
}

impl ContentfulClient {
    pub fn new(config: ContentfulConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(30)))
            .build()
            .into();

        Self { config, agent }
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let url = format!("{}{}", self.config.base_url(), path);
        trace!(target: "content", "GET {} {:?}", url, query);

        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.access_token));
        for (key, value) in query {
            request = request.query(key, value);
        }

        let mut response = request.call().map_err(|e| FetchError::Request {
            url: url.clone(),
            source: Box::new(e),
        })?;

        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| FetchError::Request {
                url: url.clone(),
                source: Box::new(e),
            })?;

        if !status.is_success() {
            return Err(FetchError::Api {
                url,
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        Ok(body)
    }

    fn get_entries(&self, kind: ContentKind, locale: &str) -> Result<Vec<ContentNode>, FetchError> {
        let mut nodes = Vec::new();
        let mut skip = 0;

        loop {
            let body = self.get(
                "/entries",
                &[
                    ("content_type", kind.content_type().to_string()),
                    ("locale", locale.to_string()),
                    ("include", "1".to_string()),
                    ("limit", PAGE_LIMIT.to_string()),
                    ("skip", skip.to_string()),
                ],
            )?;

            let page = decode_entries(kind, locale, &body)?;
            let fetched = page.nodes.len();
            nodes.extend(page.nodes);
            skip += fetched;

            if fetched == 0 || skip >= page.total {
                break;
            }
            debug!(target: "content", "{} {}: fetched {} of {}", locale, kind.content_type(), skip, page.total);
        }

        Ok(nodes)
    }
}

impl ContentSource for ContentfulClient {
    fn name(&self) -> &str {
        "contentful"
    }

    fn locales(&self) -> Result<Vec<Locale>, FetchError> {
        let body = self.get("/locales", &[])?;
        decode_locales(&body)
    }

    fn translations(&self) -> Result<TranslationDictionary, FetchError> {
        let body = self.get(
            "/entries",
            &[
                ("content_type", TRANSLATIONS_CONTENT_TYPE.to_string()),
                ("locale", "*".to_string()),
                ("limit", "1".to_string()),
            ],
        )?;
        decode_translations(&body)
    }

    fn entries(&self, kind: ContentKind, locale: &str) -> Result<Vec<ContentNode>, FetchError> {
        self.get_entries(kind, locale)
    }
}

// Wire format

#[derive(Deserialize)]
struct Collection<T> {
    #[serde(default)]
    total: Option<usize>,
    items: Vec<T>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Deserialize, Default)]
struct Includes {
    #[serde(default, rename = "Asset")]
    assets: Vec<RawAsset>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sys {
    id: String,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Deserialize)]
struct RawEntry<F> {
    sys: Sys,
    fields: F,
}

#[derive(Deserialize)]
struct Link {
    sys: LinkSys,
}

#[derive(Deserialize)]
struct LinkSys {
    id: String,
}

#[derive(Deserialize)]
struct RawAsset {
    sys: Sys,
    #[serde(default)]
    fields: AssetFields,
}

#[derive(Deserialize, Default)]
struct AssetFields {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    file: Option<AssetFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetFile {
    url: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    details: Option<FileDetails>,
}

#[derive(Deserialize)]
struct FileDetails {
    #[serde(default)]
    image: Option<ImageDetails>,
}

#[derive(Deserialize)]
struct ImageDetails {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageFields {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    featured_image: Option<Link>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlogPostFields {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    featured_image: Option<Link>,
    #[serde(default)]
    categories: Vec<Link>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryFields {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    featured_image: Option<Link>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn parse<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode {
        url: what.to_string(),
        source,
    })
}

pub(crate) struct EntriesPage {
    pub(crate) nodes: Vec<ContentNode>,
    pub(crate) total: usize,
}

fn resolve_assets(includes: Includes) -> FxHashMap<String, MediaAsset> {
    includes
        .assets
        .into_iter()
        .filter_map(|asset| {
            let file = asset.fields.file?;
            // Asset URLs are protocol-relative
            let url = if file.url.starts_with("//") {
                format!("https:{}", file.url)
            } else {
                file.url
            };
            let image = file.details.and_then(|details| details.image);

            Some((
                asset.sys.id.clone(),
                MediaAsset {
                    id: asset.sys.id,
                    url,
                    title: asset.fields.title,
                    description: asset.fields.description,
                    content_type: file.content_type,
                    width: image.as_ref().map(|i| i.width),
                    height: image.as_ref().map(|i| i.height),
                },
            ))
        })
        .collect()
}

fn link_asset(link: Option<Link>, assets: &FxHashMap<String, MediaAsset>) -> Option<MediaAsset> {
    // Links to unpublished assets are not included, treat them as absent
    link.and_then(|link| assets.get(&link.sys.id).cloned())
}

pub(crate) fn decode_entries(
    kind: ContentKind,
    locale: &str,
    body: &str,
) -> Result<EntriesPage, FetchError> {
    let what = format!("{} entries ({})", kind.content_type(), locale);

    match kind {
        ContentKind::Page => {
            let collection: Collection<RawEntry<PageFields>> = parse(body, &what)?;
            let total = collection.total.unwrap_or(collection.items.len());
            let assets = resolve_assets(collection.includes);
            let nodes = collection
                .items
                .into_iter()
                .map(|entry| {
                    ContentNode::Page(PageEntry {
                        id: entry.sys.id,
                        locale: locale.to_string(),
                        slug: entry.fields.slug,
                        title: entry.fields.title,
                        created_at: entry.sys.created_at,
                        body: entry.fields.body,
                        featured_image: link_asset(entry.fields.featured_image, &assets),
                    })
                })
                .collect();
            Ok(EntriesPage { nodes, total })
        }
        ContentKind::BlogPost => {
            let collection: Collection<RawEntry<BlogPostFields>> = parse(body, &what)?;
            let total = collection.total.unwrap_or(collection.items.len());
            let assets = resolve_assets(collection.includes);
            let nodes = collection
                .items
                .into_iter()
                .map(|entry| {
                    ContentNode::BlogPost(BlogPostEntry {
                        id: entry.sys.id,
                        locale: locale.to_string(),
                        slug: entry.fields.slug,
                        title: entry.fields.title,
                        created_at: entry.sys.created_at,
                        author: entry.fields.author,
                        excerpt: entry.fields.excerpt,
                        body: entry.fields.body,
                        featured_image: link_asset(entry.fields.featured_image, &assets),
                        category_ids: entry
                            .fields
                            .categories
                            .into_iter()
                            .map(|link| link.sys.id)
                            .collect(),
                        tags: entry.fields.tags,
                    })
                })
                .collect();
            Ok(EntriesPage { nodes, total })
        }
        ContentKind::Category => {
            let collection: Collection<RawEntry<CategoryFields>> = parse(body, &what)?;
            let total = collection.total.unwrap_or(collection.items.len());
            let assets = resolve_assets(collection.includes);
            let nodes = collection
                .items
                .into_iter()
                .map(|entry| {
                    ContentNode::Category(CategoryEntry {
                        id: entry.sys.id,
                        locale: locale.to_string(),
                        slug: entry.fields.slug,
                        title: entry.fields.title,
                        description: entry.fields.description,
                        featured_image: link_asset(entry.fields.featured_image, &assets),
                    })
                })
                .collect();
            Ok(EntriesPage { nodes, total })
        }
    }
}

pub(crate) fn decode_locales(body: &str) -> Result<Vec<Locale>, FetchError> {
    let collection: Collection<Locale> = parse(body, "locales")?;
    Ok(collection.items)
}

/// Decodes the `translations` entry fetched with `locale=*`, where every field maps locale codes to values.
pub(crate) fn decode_translations(body: &str) -> Result<TranslationDictionary, FetchError> {
    let collection: Collection<RawEntry<FxHashMap<String, serde_json::Value>>> =
        parse(body, "translations")?;

    let entry = collection.items.into_iter().next().ok_or_else(|| {
        FetchError::Malformed(format!(
            "no `{}` entry found in the content source",
            TRANSLATIONS_CONTENT_TYPE
        ))
    })?;

    let mut dictionary = TranslationDictionary::new();
    for (key, values) in entry.fields {
        let serde_json::Value::Object(values) = values else {
            return Err(FetchError::Malformed(format!(
                "translation `{}` is not localized",
                key
            )));
        };

        // Non-text fields (e.g. the list of language names) are not UI strings
        for (locale, value) in values {
            if let serde_json::Value::String(value) = value {
                dictionary.insert(key.clone(), locale, value);
            }
        }
    }

    Ok(dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOG_POSTS: &str = r#"{
        "sys": { "type": "Array" },
        "total": 3,
        "skip": 0,
        "limit": 2,
        "items": [
            {
                "sys": { "id": "carrot", "type": "Entry", "createdAt": "2020-05-02T10:00:00.000Z", "locale": "is" },
                "fields": {
                    "slug": "/hin-yndislega-gulrot",
                    "title": "Hin yndislega gulrót",
                    "author": "Prófessor Hvítkál",
                    "body": "Allir elska gulrætur.",
                    "tags": ["gulrót", "grænmeti"],
                    "featuredImage": { "sys": { "type": "Link", "linkType": "Asset", "id": "img-1" } },
                    "categories": [
                        { "sys": { "type": "Link", "linkType": "Entry", "id": "vegetables" } }
                    ]
                }
            },
            {
                "sys": { "id": "spinach", "type": "Entry" },
                "fields": {
                    "title": "Mögnuð spínat",
                    "featuredImage": { "sys": { "type": "Link", "linkType": "Asset", "id": "unpublished" } }
                }
            }
        ],
        "includes": {
            "Asset": [
                {
                    "sys": { "id": "img-1", "type": "Asset" },
                    "fields": {
                        "title": "Gulrót",
                        "file": {
                            "url": "//images.ctfassets.net/space/img-1/carrot.png",
                            "contentType": "image/png",
                            "details": { "size": 1024, "image": { "width": 800, "height": 600 } }
                        }
                    }
                }
            ]
        }
    }"#;

    #[test]
    fn test_decode_blog_posts() {
        let page = decode_entries(ContentKind::BlogPost, "is", BLOG_POSTS).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.nodes.len(), 2);

        let ContentNode::BlogPost(carrot) = &page.nodes[0] else {
            panic!("expected a blog post");
        };
        assert_eq!(carrot.id, "carrot");
        assert_eq!(carrot.locale, "is");
        assert_eq!(carrot.slug.as_deref(), Some("/hin-yndislega-gulrot"));
        assert_eq!(carrot.author.as_deref(), Some("Prófessor Hvítkál"));
        assert_eq!(carrot.created_at.as_deref(), Some("2020-05-02T10:00:00.000Z"));
        assert_eq!(carrot.category_ids, vec!["vegetables"]);
        assert_eq!(carrot.tags, vec!["gulrót", "grænmeti"]);

        let image = carrot.featured_image.as_ref().unwrap();
        assert_eq!(image.url, "https://images.ctfassets.net/space/img-1/carrot.png");
        assert_eq!(image.width, Some(800));
        assert_eq!(image.height, Some(600));

        let ContentNode::BlogPost(spinach) = &page.nodes[1] else {
            panic!("expected a blog post");
        };
        assert_eq!(spinach.slug, None);
        assert_eq!(spinach.featured_image, None);
        assert!(spinach.category_ids.is_empty());
    }

    #[test]
    fn test_decode_entries_rejects_entry_without_title() {
        let body = r#"{ "total": 1, "items": [ { "sys": { "id": "x" }, "fields": { "slug": "/x" } } ] }"#;
        let result = decode_entries(ContentKind::Category, "en", body);
        assert!(matches!(result, Err(FetchError::Decode { .. })));
    }

    #[test]
    fn test_decode_locales() {
        let body = r#"{
            "sys": { "type": "Array" },
            "total": 2,
            "items": [
                { "code": "is", "name": "Icelandic", "default": true, "fallbackCode": null, "sys": { "id": "1" } },
                { "code": "en", "name": "English", "default": false, "fallbackCode": "is", "sys": { "id": "2" } }
            ]
        }"#;

        let locales = decode_locales(body).unwrap();
        assert_eq!(locales.len(), 2);
        assert!(locales[0].is_default);
        assert_eq!(locales[1].code, "en");
    }

    #[test]
    fn test_decode_translations() {
        let body = r#"{
            "total": 1,
            "items": [
                {
                    "sys": { "id": "translations" },
                    "fields": {
                        "blog": { "is": "blogg", "en": "blog" },
                        "categories": { "is": "flokkar", "en": "categories" },
                        "languages": { "is": ["Íslenska", "Enska"], "en": ["Icelandic", "English"] }
                    }
                }
            ]
        }"#;

        let dictionary = decode_translations(body).unwrap();
        assert_eq!(dictionary.translate("blog", "is").unwrap(), "blogg");
        assert_eq!(dictionary.translate("categories", "en").unwrap(), "categories");
        assert!(dictionary.translate("languages", "en").is_err());
    }

    #[test]
    fn test_decode_translations_requires_entry() {
        let result = decode_translations(r#"{ "total": 0, "items": [] }"#);
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{ "sys": { "type": "Error", "id": "AccessTokenInvalid" }, "message": "The access token you sent could not be found or is invalid." }"#),
            "The access token you sent could not be found or is invalid."
        );
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_config_debug_hides_token() {
        let config = ContentfulConfig::new("space", "super-secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("space"));
        assert!(!debug.contains("super-secret"));
        assert_eq!(config.base_url(), "https://cdn.contentful.com/spaces/space/environments/master");
    }
}
