use std::path::PathBuf;

use crate::errors::ConfigError;

/// Vellum build options. Should be passed to [`coronate()`](crate::coronate()).
///
/// ## Examples
/// Default values:
/// ```rs
/// use vellum::{coronate, BuildOptions, BuildOutput, content::ContentSnapshot};
///
/// fn main() -> Result<BuildOutput, Box<dyn std::error::Error>> {
///   coronate(ContentSnapshot::from_file("content/snapshot.json")?, BuildOptions::default())
/// }
/// ```
/// Custom values:
/// ```rs
/// use vellum::{coronate, BuildOptions, BuildOutput, RoutingOptions, content::ContentSnapshot};
///
/// fn main() -> Result<BuildOutput, Box<dyn std::error::Error>> {
///   coronate(
///     ContentSnapshot::from_file("content/snapshot.json")?,
///     BuildOptions {
///       output_dir: "public".into(),
///       routing: RoutingOptions {
///         posts_per_page: 10,
///         ..Default::default()
///       },
///       ..Default::default()
///     },
///   )
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Base URL for the site, e.g. `https://example.com`. Used for canonical links when set.
    pub base_url: Option<String>,

    pub output_dir: PathBuf,
    pub static_dir: PathBuf,

    /// Whether to clean the output directory before building.
    pub clean_output_dir: bool,

    pub routing: RoutingOptions,
}

/// Options affecting the paths of generated pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingOptions {
    /// Number of posts on each page of the blog index. Must be at least 1.
    pub posts_per_page: usize,

    /// Whether category paths include the localized `category` segment, e.g. `/category/graenmeti` rather than
    /// `/graenmeti`. Set it to `false` to serve a category with slug `/graenmeti` at `/graenmeti` in the default
    /// locale and at `/is/graenmeti` in the others.
    pub category_segment: bool,
}

impl Default for RoutingOptions {
    fn default() -> Self {
        Self {
            posts_per_page: 1,
            category_segment: true,
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            output_dir: "dist".into(),
            static_dir: "static".into(),
            clean_output_dir: true,
            routing: RoutingOptions::default(),
        }
    }
}

impl RoutingOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.posts_per_page == 0 {
            return Err(ConfigError::InvalidOptions(
                "`posts_per_page` must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl BuildOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.routing.validate()?;

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidOptions(
                "`output_dir` cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Base URL without its trailing slash, if any was configured.
    pub fn canonical_base(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}
