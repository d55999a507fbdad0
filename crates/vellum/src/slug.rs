//! Public paths of content entries and of the aggregate pages built from them.
//!
//! A path is made of up to three parts: a locale prefix (`/is`, absent for the default locale), a localized
//! segment for the kind of entry (`/blogg` for Icelandic blog posts), and the entry's own slug, either taken
//! verbatim from the content source or derived from its title.
//!
//! ```text
//! post "Hin Dásamlega!", no slug, locale is  ->  /is/blogg/hin-dásamlega
//! category slug "/graenmeti", default locale  ->  /category/graenmeti
//! root page (slug "/"), locale is            ->  /is
//! ```
use crate::build::options::RoutingOptions;
use crate::content::ContentKind;
use crate::errors::SlugError;
use crate::i18n::{BLOG_KEY, CATEGORY_KEY, SiteContext};

/// Turns a title into a slug: ASCII punctuation is removed, whitespace runs become a single `-`, and the result
/// is lower-cased. Non-ASCII letters are kept as they are.
pub fn slugify_title(title: &str) -> String {
    let stripped: String = title.chars().filter(|c| !c.is_ascii_punctuation()).collect();

    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// The part of the path owned by the entry itself, starting with `/`, or empty for the root page.
///
/// Raw slugs keep their case and characters, but empty segments are dropped: `/about/`, `//about` and `about`
/// all give `/about`.
fn entry_suffix(raw_slug: Option<&str>, title: &str) -> String {
    match raw_slug {
        Some(slug) => slug
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(String::new(), |mut suffix, segment| {
                suffix.push('/');
                suffix.push_str(segment);
                suffix
            }),
        None => {
            let derived = slugify_title(title);
            if derived.is_empty() {
                String::new()
            } else {
                format!("/{}", derived)
            }
        }
    }
}

fn join_path(prefix: &str, segment: Option<&str>, suffix: &str) -> String {
    let mut path = prefix.to_string();

    if let Some(segment) = segment {
        let segment = segment.trim_matches('/');
        if !segment.is_empty() {
            path.push('/');
            path.push_str(segment);
        }
    }

    path.push_str(suffix);

    if path.is_empty() {
        path.push('/');
    }

    path
}

/// Translation key of the path segment placed in front of entries of `kind`, if any.
fn segment_key(kind: ContentKind, options: &RoutingOptions) -> Option<&'static str> {
    match kind {
        ContentKind::Page => None,
        ContentKind::BlogPost => Some(BLOG_KEY),
        ContentKind::Category if options.category_segment => Some(CATEGORY_KEY),
        ContentKind::Category => None,
    }
}

/// Computes the public path of an entry.
///
/// The same inputs always give the same path. Fails if the segment of `kind` has no translation for `locale`, or
/// if the path would contain a `.` or `..` segment.
pub fn resolve_path(
    kind: ContentKind,
    raw_slug: Option<&str>,
    title: &str,
    locale: &str,
    context: &SiteContext,
    options: &RoutingOptions,
) -> Result<String, SlugError> {
    let segment = segment_key(kind, options)
        .map(|key| context.translate(key, locale))
        .transpose()?;

    let path = join_path(
        &default_aware_prefix(locale, &context.default_locale().code),
        segment,
        &entry_suffix(raw_slug, title),
    );

    // Paths become directories under the output dir
    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(SlugError::RelativeSegment(path));
    }

    Ok(path)
}

fn default_aware_prefix(locale: &str, default_locale: &str) -> String {
    if locale == default_locale {
        String::new()
    } else {
        format!("/{}", locale)
    }
}

/// Home of a locale: `/` for the default locale, `/<code>` otherwise.
pub fn locale_root_path(locale: &str, default_locale: &str) -> String {
    join_path(&default_aware_prefix(locale, default_locale), None, "")
}

/// Path of the first page of a locale's blog index, e.g. `/blog` or `/is/blogg`.
pub fn blog_index_path(locale: &str, default_locale: &str, blog_word: &str) -> String {
    join_path(
        &default_aware_prefix(locale, default_locale),
        Some(blog_word),
        "",
    )
}

/// Path of the `page`-th (1-based) page of a paginated listing whose first page lives at `base`.
pub fn paginated_path(base: &str, page: usize) -> String {
    if page <= 1 {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), page)
    }
}

/// Path of a locale's categories index, e.g. `/categories` or `/is/flokkar`.
pub fn categories_index_path(locale: &str, default_locale: &str, categories_word: &str) -> String {
    join_path(
        &default_aware_prefix(locale, default_locale),
        Some(categories_word),
        "",
    )
}
