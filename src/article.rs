use serde::{Deserialize, Serialize};

use crate::config::ContestConfig;
use crate::readable::readable_length;
use crate::submission::normalize;
use crate::suggested::SuggestedIndex;
use crate::wikitext::find_template;

const TALK_PREFIX: &str = "Diskusija:";

/// Page metadata reported by the wiki API (`prop=info|pageprops`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "pageid")]
    pub page_id: u64,
    #[serde(default)]
    pub wikidata_id: Option<String>,
}

/// One contest submission with everything the reports need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub participant: String,
    pub topics: Vec<String>,
    pub countries: Vec<String>,
    pub readable_length: usize,
    pub size_bytes: u64,
    pub page_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_id: Option<String>,
    #[serde(default)]
    pub from_suggested_list: bool,
    #[serde(default)]
    pub suggested_country: String,
    #[serde(default)]
    pub valid_countries: Vec<String>,
    #[serde(default)]
    pub invalid_countries: Vec<String>,
    #[serde(default)]
    pub eligible_for_contest: bool,
}

/// Article title for a talk page title, `None` outside the talk namespace.
pub fn talk_to_article_title(talk_title: &str) -> Option<&str> {
    talk_title.strip_prefix(TALK_PREFIX)
}

/// Build the record for one article from its talk page, body and metadata.
///
/// `None` when the talk page carries no contest template.
pub fn extract_article(
    title: &str,
    talk_markup: &str,
    article_markup: &str,
    info: &PageInfo,
    config: &ContestConfig,
) -> Option<ArticleRecord> {
    let invocation = find_template(talk_markup, &config.template_name())?;
    let submission = normalize(&invocation, &config.fields);

    let readable_length = if article_markup.is_empty() {
        tracing::warn!(title, "no article content, readable length is 0");
        0
    } else {
        readable_length(article_markup)
    };

    Some(ArticleRecord {
        title: title.to_string(),
        participant: submission.participant,
        topics: submission.topics,
        countries: submission.countries,
        readable_length,
        size_bytes: info.size,
        page_id: info.page_id,
        wikidata_id: info.wikidata_id.clone(),
        ..ArticleRecord::default()
    })
}

/// Flag the record when its Wikidata item is on a suggested list.
pub fn mark_suggested(record: &mut ArticleRecord, index: &SuggestedIndex) {
    let country = record
        .wikidata_id
        .as_deref()
        .and_then(|id| index.lookup(id));
    match country {
        Some(country) => {
            record.from_suggested_list = true;
            record.suggested_country = country.to_string();
        }
        None => {
            record.from_suggested_list = false;
            record.suggested_country.clear();
        }
    }
}

/// Split declared countries by allow-list membership. Eligible for contest
/// categories iff at least one declared country is allowed.
pub fn classify_countries(record: &mut ArticleRecord, allowed: &[String]) {
    let (valid, invalid): (Vec<String>, Vec<String>) = record
        .countries
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .partition(|c| allowed.iter().any(|a| a == c));

    record.eligible_for_contest = !valid.is_empty();
    record.valid_countries = valid;
    record.invalid_countries = invalid;
}
