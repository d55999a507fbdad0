#![doc = include_str!("../README.md")]

// Modules the end-user will interact directly or indirectly with
pub mod content;
pub mod emitter;
pub mod errors;
pub mod graph;
pub mod i18n;
pub mod route;
pub mod slug;
pub mod templates;

// Exports for end-users
pub use build::metadata::{BuildOutput, LocaleOutput, PageOutput, StaticAssetOutput};
pub use build::options::{BuildOptions, RoutingOptions};

mod build;

// Internal modules
mod logging;

use build::execute_build;
use content::ContentSource;
use logging::init_logging;

/// The version of Vellum being used.
///
/// Can be used to create a generator tag in the output HTML.
///
/// ## Example
/// ```rs
/// use vellum::GENERATOR;
///
/// format!("<meta name=\"generator\" content=\"{}\">", GENERATOR);
/// ```
pub const GENERATOR: &str = concat!("Vellum v", env!("CARGO_PKG_VERSION"));

/// Vellum entrypoint. Fetches the content from `source` and generates the output files.
///
/// ## Example
/// Should be called from the main function of the binary crate.
/// ```rs
/// use vellum::{coronate, BuildOptions, BuildOutput, content::{ContentfulClient, ContentfulConfig}};
///
/// fn main() -> Result<BuildOutput, Box<dyn std::error::Error>> {
///   let client = ContentfulClient::new(ContentfulConfig::from_env()?);
///   coronate(client, BuildOptions::default())
/// }
/// ```
pub fn coronate(
    source: impl ContentSource,
    options: BuildOptions,
) -> Result<BuildOutput, Box<dyn std::error::Error>> {
    init_logging();

    let async_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    Ok(execute_build(&source, &options, &async_runtime)?)
}
