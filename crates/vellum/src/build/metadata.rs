use std::{process::Termination, time::Instant};

use crate::emitter::LocaleOutcome;
use crate::route::Template;

/// Metadata returned by [`coronate()`](crate::coronate) for a single page after a successful build.
#[derive(Debug)]
pub struct PageOutput {
    pub route: String,
    pub file_path: String,
    pub template: Template,
    pub locale: String,
}

/// Metadata returned by [`coronate()`](crate::coronate) for a single static asset after a successful build.
///
/// A static asset is a file that is copied to the output directory without any processing.
#[derive(Debug)]
pub struct StaticAssetOutput {
    pub file_path: String,
    pub original_path: String,
}

/// What happened to a locale during a build.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleOutput {
    pub locale: String,
    pub outcome: LocaleOutcome,
}

/// Metadata returned by [`coronate()`](crate::coronate) after a successful build.
///
/// A build can succeed while some locales failed: check [`BuildOutput::failed_locales`].
#[derive(Debug)]
pub struct BuildOutput {
    pub start_time: Instant,
    pub pages: Vec<PageOutput>,
    pub static_files: Vec<StaticAssetOutput>,
    pub locales: Vec<LocaleOutput>,
}

impl BuildOutput {
    pub fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            pages: Vec::new(),
            static_files: Vec::new(),
            locales: Vec::new(),
        }
    }

    pub(crate) fn add_page(&mut self, route: String, file_path: String, template: Template, locale: String) {
        self.pages.push(PageOutput {
            route,
            file_path,
            template,
            locale,
        });
    }

    pub(crate) fn add_static_file(&mut self, file_path: String, original_path: String) {
        self.static_files.push(StaticAssetOutput {
            file_path,
            original_path,
        });
    }

    pub(crate) fn add_locale(&mut self, locale: String, outcome: LocaleOutcome) {
        self.locales.push(LocaleOutput { locale, outcome });
    }

    pub fn failed_locales(&self) -> impl Iterator<Item = &LocaleOutput> {
        self.locales
            .iter()
            .filter(|locale| matches!(locale.outcome, LocaleOutcome::Failed { .. }))
    }
}

impl Default for BuildOutput {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Termination for BuildOutput {
    fn report(self) -> std::process::ExitCode {
        if self.failed_locales().next().is_some() {
            1.into()
        } else {
            0.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_locales() {
        let mut output = BuildOutput::default();
        output.add_locale("en".to_string(), LocaleOutcome::Emitted { routes: 4 });
        output.add_locale(
            "is".to_string(),
            LocaleOutcome::Failed {
                error: "timeout".to_string(),
            },
        );

        let failed: Vec<_> = output.failed_locales().map(|l| l.locale.as_str()).collect();
        assert_eq!(failed, vec!["is"]);
    }
}
