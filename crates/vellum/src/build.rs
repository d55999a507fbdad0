use std::{
    env,
    fs::{self},
    io::{self},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use colored::{ColoredString, Colorize};
use log::{info, trace, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::{
    BuildOptions, BuildOutput,
    content::{ContentSource, error_chain, fetch_all},
    emitter::{LocaleOutcome, PageEmitter},
    errors::{BuildError, VellumError},
    graph::ContentGraph,
    i18n::SiteContext,
    logging::{FormatElapsedTimeOptions, format_elapsed_time, print_title},
    route::{Route, RouteSet},
    templates::render_route,
};

pub mod metadata;
pub mod options;

pub fn execute_build(
    source: &dyn ContentSource,
    options: &BuildOptions,
    async_runtime: &tokio::runtime::Runtime,
) -> Result<BuildOutput, VellumError> {
    async_runtime.block_on(async { build(source, options).await })
}

pub async fn build(
    source: &dyn ContentSource,
    options: &BuildOptions,
) -> Result<BuildOutput, VellumError> {
    options.validate()?;

    let build_start = Instant::now();
    let mut build_metadata = BuildOutput::new(build_start);

    trace!(target: "build", "Setting up required directories...");

    let old_dist_tmp_dir = if options.clean_output_dir && options.output_dir.exists() {
        let num = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| (duration.as_secs() + duration.subsec_nanos() as u64) % 100000)
            .unwrap_or_default();
        let new_dir_for_old_dist = env::temp_dir().join(format!("vellum_old_dist_{}", num));
        match fs::rename(&options.output_dir, &new_dir_for_old_dist) {
            Ok(()) => Some(new_dir_for_old_dist),
            // Likely on another filesystem than the temp dir, delete in place instead
            Err(_) => {
                fs::remove_dir_all(&options.output_dir)?;
                None
            }
        }
    } else {
        None
    };

    let clean_up_handle = tokio::spawn(async move {
        if let Some(old_dist) = old_dist_tmp_dir {
            let _ = fs::remove_dir_all(old_dist);
        }
    });

    info!(target: "build", "Output directory: {}", options.output_dir.display());

    let section_format_options = FormatElapsedTimeOptions::section();

    print_title("initializing content");
    let content_start = Instant::now();

    let context = SiteContext::initialize(source)?;
    let fetched = fetch_all(source, &context);

    info!(target: "content", "{}", format!("Content fetched from {} in {}", source.name(), format_elapsed_time(content_start.elapsed(), &section_format_options)).bold());

    print_title("resolving routes");
    let routes_start = Instant::now();

    let graph = ContentGraph::build(&context, fetched, &options.routing);

    let collected = Mutex::new(Vec::new());
    let report = PageEmitter::new(&options.routing)?.emit(&graph, |route| {
        collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route)
    });

    let mut routes = collected.into_inner().unwrap_or_else(PoisonError::into_inner);
    sort_by_locale(&mut routes, &context);
    let route_set = RouteSet::try_from(routes)?;

    for locale in report.locales {
        build_metadata.add_locale(locale.locale, locale.outcome);
    }

    info!(target: "routes", "{}", format!("{} routes resolved in {}", route_set.len(), format_elapsed_time(routes_start.elapsed(), &section_format_options)).bold());

    print_title("generating pages");
    let pages_start = Instant::now();

    let route_format_options = FormatElapsedTimeOptions {
        additional_fn: Some(&|msg: ColoredString| {
            let formatted_msg = format!("(+{})", msg);
            if msg.fgcolor.is_none() {
                formatted_msg.dimmed()
            } else {
                formatted_msg.into()
            }
        }),
        ..Default::default()
    };

    let written = route_set
        .routes()
        .par_iter()
        .map(|route| -> Result<_, BuildError> {
            let route_start = Instant::now();

            let html = render_route(route, options);
            let file_path = route.file_path(&options.output_dir);

            write_route_file(html.into_string().as_bytes(), &file_path).map_err(|source| {
                BuildError::WriteFailed {
                    path: file_path.clone(),
                    source,
                }
            })?;

            info!(target: "pages", "{} -> {} {}", route.path, file_path.to_string_lossy().dimmed(), format_elapsed_time(route_start.elapsed(), &route_format_options));

            Ok((route, file_path))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (route, file_path) in written {
        build_metadata.add_page(
            route.path.clone(),
            file_path.to_string_lossy().to_string(),
            route.template,
            route.context.locale().code.clone(),
        );
    }

    info!(target: "pages", "{}", format!("{} pages generated in {}", build_metadata.pages.len(), format_elapsed_time(pages_start.elapsed(), &section_format_options)).bold());

    // Check if static directory exists
    if options.static_dir.exists() {
        let assets_start = Instant::now();
        print_title("copying assets");

        copy_recursively(
            &options.static_dir,
            &options.output_dir,
            &mut build_metadata,
        )?;

        info!(target: "build", "{}", format!("Assets copied in {}", format_elapsed_time(assets_start.elapsed(), &FormatElapsedTimeOptions::default())).bold());
    }

    for locale in build_metadata.failed_locales() {
        if let LocaleOutcome::Failed { error } = &locale.outcome {
            warn!(target: "build", "No pages were generated for locale {}: {}", locale.locale.bold(), error);
        }
    }

    info!(target: "SKIP_FORMAT", "{}", "");
    info!(target: "build", "{}", format!("Build completed in {}", format_elapsed_time(build_start.elapsed(), &section_format_options)).bold());

    if let Err(err) = clean_up_handle.await {
        warn!(target: "build", "Failed to remove the previous output directory: {}", error_chain(&err));
    }

    Ok(build_metadata)
}

/// Orders routes by the position of their locale, keeping the emission order within a locale.
fn sort_by_locale(routes: &mut [Route], context: &SiteContext) {
    let positions: FxHashMap<&str, usize> = context
        .locales()
        .iter()
        .enumerate()
        .map(|(index, locale)| (locale.code.as_str(), index))
        .collect();

    routes.sort_by_key(|route| {
        positions
            .get(route.context.locale().code.as_str())
            .copied()
            .unwrap_or(usize::MAX)
    });
}

fn copy_recursively(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    build_metadata: &mut BuildOutput,
) -> io::Result<()> {
    fs::create_dir_all(&destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let filetype = entry.file_type()?;
        if filetype.is_dir() {
            copy_recursively(
                entry.path(),
                destination.as_ref().join(entry.file_name()),
                build_metadata,
            )?;
        } else {
            fs::copy(entry.path(), destination.as_ref().join(entry.file_name()))?;

            build_metadata.add_static_file(
                destination
                    .as_ref()
                    .join(entry.file_name())
                    .to_string_lossy()
                    .to_string(),
                entry.path().to_string_lossy().to_string(),
            );
        }
    }
    Ok(())
}

fn write_route_file(content: &[u8], file_path: &PathBuf) -> Result<(), io::Error> {
    // Create the parent directories if it doesn't exist
    if let Some(parent_dir) = file_path.parent() {
        fs::create_dir_all(parent_dir)?
    }

    fs::write(file_path, content)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BlogPostEntry, CategoryEntry, ContentNode, ContentSnapshot, PageEntry};
    use crate::i18n::{Locale, TranslationDictionary};
    use crate::route::Template;
    use tempfile::TempDir;

    fn translations() -> TranslationDictionary {
        [
            ("blog", "en", "blog"),
            ("blog", "is", "blogg"),
            ("categories", "en", "categories"),
            ("categories", "is", "flokkar"),
            ("category", "en", "category"),
            ("category", "is", "flokkur"),
        ]
        .into_iter()
        .collect()
    }

    fn snapshot() -> ContentSnapshot {
        let mut snapshot = ContentSnapshot {
            locales: vec![Locale::new("en", true), Locale::new("is", false)],
            translations: translations(),
            ..Default::default()
        };

        for (locale, title) in [("en", "Home"), ("is", "Heim")] {
            snapshot.push(ContentNode::Page(PageEntry {
                id: "home".to_string(),
                locale: locale.to_string(),
                slug: Some("/".to_string()),
                title: title.to_string(),
                created_at: None,
                body: Some(format!("# {}", title)),
                featured_image: None,
            }));
        }

        for (locale, title) in [("en", "The wonderful carrot"), ("is", "Hin Dásamlega!")] {
            snapshot.push(ContentNode::BlogPost(BlogPostEntry {
                id: "carrot".to_string(),
                locale: locale.to_string(),
                slug: None,
                title: title.to_string(),
                created_at: Some("2020-03-01T10:00:00Z".to_string()),
                author: Some("Prófessor Hvítkál".to_string()),
                excerpt: None,
                body: Some("Everyone loves carrots.".to_string()),
                featured_image: None,
                category_ids: vec!["veg".to_string()],
                tags: vec![],
            }));
        }

        snapshot.push(ContentNode::Category(CategoryEntry {
            id: "veg".to_string(),
            locale: "en".to_string(),
            slug: Some("/graenmeti".to_string()),
            title: "Vegetables".to_string(),
            description: None,
            featured_image: None,
        }));

        snapshot
    }

    fn options(output: &TempDir) -> BuildOptions {
        BuildOptions {
            output_dir: output.path().join("dist"),
            static_dir: output.path().join("static"),
            ..Default::default()
        }
    }

    fn run(source: &dyn ContentSource, options: &BuildOptions) -> Result<BuildOutput, VellumError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        execute_build(source, options, &runtime)
    }

    #[test]
    fn test_build_writes_every_route() {
        let temp = TempDir::new().unwrap();
        let options = options(&temp);

        let output = run(&snapshot(), &options).unwrap();

        let dist = &options.output_dir;
        for path in [
            "index.html",
            "blog/the-wonderful-carrot/index.html",
            "blog/index.html",
            "category/graenmeti/index.html",
            "categories/index.html",
            "is/index.html",
            "is/blogg/hin-dásamlega/index.html",
            "is/blogg/index.html",
            "is/flokkar/index.html",
        ] {
            assert!(dist.join(path).is_file(), "missing {}", path);
        }

        assert_eq!(output.pages.len(), 9);
        assert!(output.failed_locales().next().is_none());

        let post = fs::read_to_string(dist.join("is/blogg/hin-dásamlega/index.html")).unwrap();
        assert!(post.contains("<html lang=\"is\">"));
        assert!(post.contains("Hin Dásamlega!"));

        // The category links back to its post
        let category = fs::read_to_string(dist.join("category/graenmeti/index.html")).unwrap();
        assert!(category.contains("href=\"/blog/the-wonderful-carrot\""));
    }

    #[test]
    fn test_build_pages_follow_locale_order() {
        let temp = TempDir::new().unwrap();
        let output = run(&snapshot(), &options(&temp)).unwrap();

        let locales: Vec<_> = output.pages.iter().map(|page| page.locale.as_str()).collect();
        let first_is = locales.iter().position(|l| *l == "is").unwrap();
        assert!(locales[..first_is].iter().all(|l| *l == "en"));
        assert!(locales[first_is..].iter().all(|l| *l == "is"));
        assert_eq!(output.pages[0].template, Template::Page);
    }

    #[test]
    fn test_build_rejects_duplicate_paths() {
        let temp = TempDir::new().unwrap();
        let mut snapshot = snapshot();
        snapshot.push(ContentNode::Page(PageEntry {
            id: "impostor".to_string(),
            locale: "en".to_string(),
            slug: Some("/blog".to_string()),
            title: "Not the blog".to_string(),
            created_at: None,
            body: None,
            featured_image: None,
        }));

        let result = run(&snapshot, &options(&temp));

        assert!(matches!(
            result,
            Err(VellumError::Build(BuildError::DuplicateRoute { path, .. })) if path == "/blog"
        ));
    }

    #[test]
    fn test_build_rejects_slugs_sharing_a_file() {
        let temp = TempDir::new().unwrap();
        let mut snapshot = snapshot();
        for (id, slug) in [("about", "/about"), ("about-again", "/about/")] {
            snapshot.push(ContentNode::Page(PageEntry {
                id: id.to_string(),
                locale: "en".to_string(),
                slug: Some(slug.to_string()),
                title: "About".to_string(),
                created_at: None,
                body: None,
                featured_image: None,
            }));
        }

        let result = run(&snapshot, &options(&temp));

        assert!(matches!(
            result,
            Err(VellumError::Build(BuildError::DuplicateRoute { path, .. })) if path == "/about"
        ));
    }

    #[test]
    fn test_build_never_writes_outside_output_dir() {
        let temp = TempDir::new().unwrap();
        let options = options(&temp);
        let mut snapshot = snapshot();
        snapshot.push(ContentNode::Page(PageEntry {
            id: "escaped".to_string(),
            locale: "en".to_string(),
            slug: Some("/../escaped".to_string()),
            title: "Escaped".to_string(),
            created_at: None,
            body: None,
            featured_image: None,
        }));

        let output = run(&snapshot, &options).unwrap();

        assert!(!temp.path().join("escaped").exists());
        assert!(!options.output_dir.join("index.html").exists());
        assert!(options.output_dir.join("is/index.html").is_file());

        let failed: Vec<_> = output.failed_locales().map(|l| l.locale.as_str()).collect();
        assert_eq!(failed, vec!["en"]);
    }

    #[test]
    fn test_build_fails_without_routing_translations() {
        let temp = TempDir::new().unwrap();
        let mut snapshot = snapshot();
        snapshot.translations = [("blog", "en", "blog"), ("blog", "is", "blogg")]
            .into_iter()
            .collect();

        let result = run(&snapshot, &options(&temp));
        assert!(matches!(result, Err(VellumError::Init(_))));
    }

    #[test]
    fn test_build_rejects_invalid_options() {
        let temp = TempDir::new().unwrap();
        let mut options = options(&temp);
        options.routing.posts_per_page = 0;

        let result = run(&snapshot(), &options);
        assert!(matches!(result, Err(VellumError::Config(_))));
    }

    #[test]
    fn test_build_cleans_and_copies_static_files() {
        let temp = TempDir::new().unwrap();
        let options = options(&temp);

        fs::create_dir_all(options.output_dir.join("stale")).unwrap();
        fs::write(options.output_dir.join("stale/index.html"), "old").unwrap();
        fs::create_dir_all(options.static_dir.join("css")).unwrap();
        fs::write(options.static_dir.join("css/site.css"), "body {}").unwrap();

        let output = run(&snapshot(), &options).unwrap();

        assert!(!options.output_dir.join("stale").exists());
        assert!(options.output_dir.join("css/site.css").is_file());
        assert_eq!(output.static_files.len(), 1);
    }
}
