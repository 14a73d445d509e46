//! Suggested-article identifiers harvested from Meta-Wiki structure pages.
//!
//! Structure pages list suggested subjects as Wikidata item ids inside
//! `{{#invoke:WikimediaCEETable|table|Q1|Q2...}}` (or `UCDMtable`) blocks,
//! often with `<!--XX-->` country comments wedged between the pipes.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

use crate::error::{Error, Result};

lazy_static! {
    static ref BLOCK_COMMENT: Regex = Regex::new(r"<!--[^>]*?-->").unwrap();
    static ref DEFAULT_HARVESTER: IdentifierHarvester =
        IdentifierHarvester::new(&["WikimediaCEETable", "UCDMtable"]).unwrap();
}

/// Finds table-macro blocks and pulls `Q<digits>` tokens out of them.
#[derive(Debug, Clone)]
pub struct IdentifierHarvester {
    block: Regex,
}

impl IdentifierHarvester {
    /// Build a harvester for the given module names (matched case-insensitively).
    pub fn new<S: AsRef<str>>(table_macros: &[S]) -> Result<Self> {
        if table_macros.is_empty() {
            return Err(Error::Config("at least one table macro name is required".to_string()));
        }
        let names: Vec<String> = table_macros
            .iter()
            .map(|name| regex::escape(name.as_ref()))
            .collect();
        // A block ends at the first "}}" after the table marker
        let pattern = format!(r"(?is)\{{\{{#invoke:(?:{})\|table[^}}]*?\}}\}}", names.join("|"));
        let block = Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("invalid table macro pattern: {}", e)))?;
        Ok(IdentifierHarvester { block })
    }

    /// All well-formed identifiers from every matching block on the page.
    pub fn harvest(&self, markup: &str) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        for block in self.block.find_iter(markup) {
            let cleaned = BLOCK_COMMENT.replace_all(block.as_str(), "");
            ids.extend(cleaned.split('|').filter_map(identifier_token));
        }
        ids
    }
}

impl Default for IdentifierHarvester {
    fn default() -> Self {
        DEFAULT_HARVESTER.clone()
    }
}

/// Harvest with the standard `WikimediaCEETable` / `UCDMtable` macro names.
pub fn harvest(markup: &str) -> BTreeSet<String> {
    DEFAULT_HARVESTER.harvest(markup)
}

/// Reduce a pipe-separated token to `Q<digits>`, or reject it.
///
/// Every character other than `Q` and ASCII digits is dropped first, so
/// trailing `}}` or stray whitespace do not matter.
fn identifier_token(token: &str) -> Option<String> {
    let kept: String = token
        .trim()
        .chars()
        .filter(|c| *c == 'Q' || c.is_ascii_digit())
        .collect();
    let digits = kept.strip_prefix('Q')?;
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(kept)
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Structure page listing
// ─────────────────────────────────────────────────────────────────────────────

/// One entry of the structure page listing (`list=allpages`).
#[derive(Debug, Clone, Deserialize)]
pub struct StructurePage {
    pub title: String,
    #[serde(default)]
    pub redirect: bool,
}

/// Country (or topic) names of the non-redirect structure pages, in listing order.
pub fn structure_page_countries(pages: &[StructurePage], prefix: &str) -> Vec<String> {
    let mut redirects = 0usize;
    let countries: Vec<String> = pages
        .iter()
        .filter(|page| {
            if page.redirect {
                redirects += 1;
                false
            } else {
                true
            }
        })
        .filter_map(|page| page.title.strip_prefix(prefix))
        .map(str::to_string)
        .collect();

    if redirects > 0 {
        tracing::info!(redirects, "filtered out redirect structure pages");
    }
    tracing::info!(count = countries.len(), "non-redirect structure pages");
    countries
}

// ─────────────────────────────────────────────────────────────────────────────
// Cross-reference index
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier sets per structure page plus the reverse identifier → page index.
#[derive(Debug, Clone, Default)]
pub struct SuggestedIndex {
    by_country: BTreeMap<String, BTreeSet<String>>,
    by_id: HashMap<String, String>,
}

impl SuggestedIndex {
    /// Harvest every `(country, markup)` page in the given order. Pages
    /// yielding no identifiers are left out with a warning. When an identifier
    /// is listed on several pages, the last page in the input owns it.
    pub fn build<I, C, M>(pages: I, harvester: &IdentifierHarvester) -> Self
    where
        I: IntoIterator<Item = (C, M)>,
        C: Into<String>,
        M: AsRef<str>,
    {
        let mut by_country: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut by_id = HashMap::new();
        for (country, markup) in pages {
            let country = country.into();
            let markup = markup.as_ref();
            if markup.trim().is_empty() {
                tracing::warn!(country = %country, "structure page has no content");
                continue;
            }
            let ids = harvester.harvest(markup);
            if ids.is_empty() {
                tracing::warn!(
                    country = %country,
                    "no Wikidata IDs found, page may be empty or have formatting issues"
                );
                continue;
            }
            tracing::debug!(country = %country, count = ids.len(), "harvested suggested ids");
            for id in &ids {
                by_id.insert(id.clone(), country.clone());
            }
            by_country.entry(country).or_default().extend(ids);
        }

        SuggestedIndex { by_country, by_id }
    }

    /// Structure page (country) an identifier was suggested on
    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn countries(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.by_country
    }

    pub fn total_ids(&self) -> usize {
        self.by_id.len()
    }

    pub fn all_ids(&self) -> BTreeSet<&str> {
        self.by_id.keys().map(String::as_str).collect()
    }

    /// Plain-text reference listing of every harvested identifier.
    pub fn render_listing(&self, year: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "# Suggested Article Wikidata IDs from CEE Spring {} Structure Pages\n",
            year
        );
        let _ = writeln!(out, "Total suggested articles: {}", self.total_ids());
        let _ = writeln!(out, "Countries with suggestions: {}\n", self.by_country.len());

        for (country, ids) in &self.by_country {
            let _ = writeln!(out, "== {} ({} articles) ==", country, ids.len());
            for id in ids {
                let _ = writeln!(out, "* {}", id);
            }
            out.push('\n');
        }

        out.push_str("== All Suggested IDs (for reference) ==\n");
        for id in self.all_ids() {
            let _ = writeln!(out, "{}", id);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    const ROMANIAN: &str = "
=== [[File:P art-green.png|30px]] '''Culture''' ===
{{#invoke:WikimediaCEETable|table<!--
RO-->|Q18539344|Q12730061|Q12736402|Q12741766|Q20479854|Q3295106|Q1502282|Q130108154|Q121200137|Q5584324<!--
MD-->|Q12730266|Q28589212|Q128603529|Q110127447}}

=== [[File:P biology-green.png|30px]] '''Nature / Geography''' ===
{{#invoke:WikimediaCEETable|table<!--
RO-->|Q929095|Q3078828|Q3081107|Q12731895<!--
MD-->|Q6271715|Q28861917|Q28721500}}
";

    const UKRAINE: &str = "
==== [[File:P art-green.png|30px]] '''Voices of Donetsk Oblast''' ====

{{#invoke:WikimediaCEETable|table|Q237276|Q6351|Q3350307|Q85989211|Q4244705|Q2033316|Q30238440|Q4424614|Q1988030|Q640995}}

{{#invoke:WikimediaCEETable|table|Q12111436|Q4480299|Q4458479|Q426509|Q12111100|Q3888681|Q4059753|Q2025771}}

==== [[File:P art-green.png|30px]] '''Voices of Luhansk Oblast''' ====

{{#invoke:WikimediaCEETable|table|Q640995|Q545793|Q458209|Q4154638|Q28484008|Q14637670|Q7453603|Q51129696}}
";

    // ─────────────────────────────────────────────────────────────
    // Harvesting
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn comment_interleaved_block() {
        let markup = "{{#invoke:WikimediaCEETable|table<!--RO-->|Q18539344|Q12730061<!--MD-->|Q12730266|Q110127447}}";
        assert_eq!(
            harvest(markup),
            set(&["Q18539344", "Q12730061", "Q12730266", "Q110127447"])
        );
    }

    #[test]
    fn romanian_page_with_multiline_comments() {
        let expected = set(&[
            "Q18539344", "Q12730061", "Q12736402", "Q12741766", "Q20479854",
            "Q3295106", "Q1502282", "Q130108154", "Q121200137", "Q5584324",
            "Q12730266", "Q28589212", "Q128603529", "Q110127447",
            "Q929095", "Q3078828", "Q3081107", "Q12731895",
            "Q6271715", "Q28861917", "Q28721500",
        ]);
        assert_eq!(harvest(ROMANIAN), expected);
    }

    #[test]
    fn ukraine_page_deduplicates_across_blocks() {
        let ids = harvest(UKRAINE);
        // Q640995 appears in two blocks
        assert_eq!(ids.len(), 25);
        assert!(ids.contains("Q640995"));
        assert!(ids.contains("Q51129696"));
    }

    #[test]
    fn comments_do_not_change_result() {
        let with = "{{#invoke:WikimediaCEETable|table<!--LV-->|Q1|Q22<!--EE-->|Q333}}";
        let without = "{{#invoke:WikimediaCEETable|table|Q1|Q22|Q333}}";
        assert_eq!(harvest(with), harvest(without));
    }

    #[test]
    fn ucdm_table_and_case_insensitive_marker() {
        let markup = "{{#INVOKE:ucdmtable|TABLE|Q4051116|Q200892}}";
        assert_eq!(harvest(markup), set(&["Q4051116", "Q200892"]));
    }

    #[test]
    fn other_modules_are_ignored() {
        assert!(harvest("{{#invoke:OtherTable|table|Q1|Q2}}").is_empty());
        assert!(harvest("Q1 Q2 plain text").is_empty());
    }

    #[test]
    fn malformed_tokens_rejected() {
        let ids = harvest("{{#invoke:WikimediaCEETable|table|QABC|123Q||Q|Q12Q3| Q42 }}");
        assert_eq!(ids, set(&["Q42"]));
    }

    #[test]
    fn block_stops_at_first_closing_braces() {
        // The first "}}" ends the block; later ids are outside it
        let markup = "{{#invoke:WikimediaCEETable|table|Q1|{{x}}|Q2}}";
        assert_eq!(harvest(markup), set(&["Q1"]));
    }

    #[test]
    fn empty_page_yields_empty_set() {
        assert!(harvest("").is_empty());
    }

    #[test]
    fn custom_macro_names() {
        let harvester = IdentifierHarvester::new(&["My.Table"]).unwrap();
        assert_eq!(harvester.harvest("{{#invoke:My.Table|table|Q7}}"), set(&["Q7"]));
        // The dot is literal
        assert!(harvester.harvest("{{#invoke:MyxTable|table|Q7}}").is_empty());
    }

    #[test]
    fn no_macro_names_is_an_error() {
        let names: [&str; 0] = [];
        assert!(IdentifierHarvester::new(&names).is_err());
    }

    #[test]
    fn identifier_token_filter() {
        assert_eq!(identifier_token(" Q5}}"), Some("Q5".to_string()));
        assert_eq!(identifier_token("QABC"), None);
        assert_eq!(identifier_token("123Q"), None);
        assert_eq!(identifier_token(""), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Structure pages and index
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn structure_pages_skip_redirects_and_foreign_titles() {
        let prefix = "Wikimedia CEE Spring 2025/Structure/";
        let pages = vec![
            StructurePage { title: format!("{}Armenia", prefix), redirect: false },
            StructurePage { title: format!("{}Old name", prefix), redirect: true },
            StructurePage { title: "Something else".to_string(), redirect: false },
            StructurePage { title: format!("{}Romania", prefix), redirect: false },
        ];
        assert_eq!(structure_page_countries(&pages, prefix), vec!["Armenia", "Romania"]);
    }

    #[test]
    fn index_reverse_lookup() {
        let pages = vec![
            ("Romania", ROMANIAN),
            ("Ukraine", UKRAINE),
            ("Empty", "no tables here"),
        ];
        let index = SuggestedIndex::build(pages, &IdentifierHarvester::default());
        assert_eq!(index.countries().len(), 2);
        assert_eq!(index.lookup("Q929095"), Some("Romania"));
        assert_eq!(index.lookup("Q640995"), Some("Ukraine"));
        assert_eq!(index.lookup("Q1"), None);
        assert_eq!(index.total_ids(), 21 + 25);
    }

    #[test]
    fn shared_id_belongs_to_last_listed_page() {
        let block = "{{#invoke:WikimediaCEETable|table|Q9}}";
        let harvester = IdentifierHarvester::default();

        let index = SuggestedIndex::build(vec![("Alpha", block), ("Zeta", block)], &harvester);
        assert_eq!(index.lookup("Q9"), Some("Zeta"));
        assert_eq!(index.total_ids(), 1);
        assert_eq!(index.countries().len(), 2);

        let index = SuggestedIndex::build(vec![("Zeta", block), ("Alpha", block)], &harvester);
        assert_eq!(index.lookup("Q9"), Some("Alpha"));
    }

    #[test]
    fn listing_format() {
        let pages = vec![("Latvia", "{{#invoke:WikimediaCEETable|table|Q2|Q10}}")];
        let index = SuggestedIndex::build(pages, &IdentifierHarvester::default());
        let listing = index.render_listing("2025");
        assert!(listing.starts_with(
            "# Suggested Article Wikidata IDs from CEE Spring 2025 Structure Pages\n\n"
        ));
        assert!(listing.contains("Total suggested articles: 2\n"));
        assert!(listing.contains("== Latvia (2 articles) ==\n* Q10\n* Q2\n"));
        assert!(listing.ends_with("== All Suggested IDs (for reference) ==\nQ10\nQ2\n"));
    }
}
