use std::env;

use vellum::{
    BuildOptions, BuildOutput, coronate,
    content::{ContentSnapshot, ContentfulClient, ContentfulConfig},
};

fn main() -> Result<BuildOutput, Box<dyn std::error::Error>> {
    let options = BuildOptions {
        base_url: env::var("SITE_URL").ok(),
        ..Default::default()
    };

    // Build offline from a snapshot when one is given, from the Contentful space otherwise.
    match env::var("VELLUM_SNAPSHOT") {
        Ok(path) => coronate(ContentSnapshot::from_file(path)?, options),
        Err(_) => coronate(ContentfulClient::new(ContentfulConfig::from_env()?), options),
    }
}
