//! Glue between the bundle, the suggested index and the report files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::StructureRecord;
use crate::config::ContestConfig;
use crate::error::Result;
use crate::report::{contest_categories_report, participant_report, wikitext_table, DEFAULT_TABLE_TITLE};
use crate::suggested::{structure_page_countries, IdentifierHarvester, StructurePage, SuggestedIndex};
use crate::validate::ValidationOutcome;

pub const RESULTS_FILE: &str = "results.txt";
pub const PARTICIPANTS_FILE: &str = "participant_report.txt";
pub const CATEGORIES_FILE: &str = "contest_categories.txt";
pub const VALIDATION_FILE: &str = "validation_report.txt";
pub const SUGGESTED_IDS_FILE: &str = "suggested_wikidata_ids.txt";

/// Suggested index over the non-redirect structure pages of this year's
/// contest. Pages outside the structure prefix are ignored.
pub fn build_index(structures: &[StructureRecord], config: &ContestConfig) -> Result<SuggestedIndex> {
    let harvester = IdentifierHarvester::new(&config.table_macros)?;
    let prefix = config.structure_page_prefix();

    let pages: Vec<StructurePage> = structures.iter().map(StructureRecord::page).collect();
    let content: HashMap<&str, &str> = structures
        .iter()
        .map(|s| (s.title.as_str(), s.content.as_str()))
        .collect();

    let countries = structure_page_countries(&pages, &prefix);
    let index = SuggestedIndex::build(
        countries.into_iter().filter_map(|country| {
            let title = format!("{}{}", prefix, country);
            content.get(title.as_str()).map(|markup| (country, *markup))
        }),
        &harvester,
    );

    tracing::info!(
        ids = index.total_ids(),
        countries = index.countries().len(),
        "suggested index built"
    );
    Ok(index)
}

/// Rendered contents of every output file.
#[derive(Debug, Clone)]
pub struct Reports {
    pub results: String,
    pub participants: String,
    pub categories: String,
    pub validation: String,
    pub suggested_ids: String,
}

impl Reports {
    pub fn render(outcome: &ValidationOutcome, index: &SuggestedIndex, config: &ContestConfig) -> Self {
        Reports {
            results: wikitext_table(&outcome.articles, DEFAULT_TABLE_TITLE, config),
            participants: participant_report(&outcome.articles),
            categories: contest_categories_report(&outcome.articles, config),
            validation: outcome.render(),
            suggested_ids: index.render_listing(&config.year),
        }
    }

    /// Write all files into `dir`, creating it if needed. Returns the paths
    /// written, results first.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;

        let files = [
            (RESULTS_FILE, &self.results),
            (PARTICIPANTS_FILE, &self.participants),
            (CATEGORIES_FILE, &self.categories),
            (VALIDATION_FILE, &self.validation),
            (SUGGESTED_IDS_FILE, &self.suggested_ids),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (name, content) in files {
            let path = dir.join(name);
            fs::write(&path, content)?;
            tracing::debug!(path = %path.display(), bytes = content.len(), "report written");
            written.push(path);
        }
        Ok(written)
    }
}

/// Render and write the reports unless validation found errors. Returns
/// `None` without touching `dir` when there are errors.
pub fn generate_reports(
    outcome: &ValidationOutcome,
    index: &SuggestedIndex,
    config: &ContestConfig,
    dir: &Path,
) -> Result<Option<Vec<PathBuf>>> {
    if !outcome.is_ok() {
        tracing::warn!(errors = outcome.errors.len(), "validation failed, reports not written");
        return Ok(None);
    }
    Reports::render(outcome, index, config).write_to(dir).map(Some)
}
