//! Data quality checks run between extraction and reporting.

use std::collections::{HashMap, HashSet};

use crate::article::ArticleRecord;
use crate::report::{ranked, tally};

/// Number of duplicate titles named in the duplicate warning.
const DUPLICATES_SHOWN: usize = 5;
/// Multiple of the mean beyond which a length or size is flagged.
const OUTLIER_FACTOR: f64 = 10.0;

/// Cleaned records plus everything noticed while cleaning them.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub articles: Vec<ArticleRecord>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Text of the validation report file.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("VALIDATION ERRORS:".to_string());
            lines.extend(self.errors.iter().map(|e| format!("  ❌ {}", e)));
            lines.push(String::new());
        }

        if !self.warnings.is_empty() {
            lines.push("WARNINGS:".to_string());
            lines.extend(self.warnings.iter().map(|w| format!("  ⚠️  {}", w)));
            lines.push(String::new());
        }

        if self.errors.is_empty() && self.warnings.is_empty() {
            lines.push("✅ All data validation checks passed!".to_string());
        }

        lines.join("\n")
    }
}

/// Deduplicate by title, drop untitled records, trim fields and collect
/// warnings about suspicious data.
pub fn validate_articles(articles: Vec<ArticleRecord>) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    if articles.is_empty() {
        outcome.errors.push("No articles data provided".to_string());
        return outcome;
    }

    let unique = remove_duplicates(articles, &mut outcome);

    for article in unique {
        check_article(&article, &mut outcome.warnings);
        outcome.articles.push(clean_article(article));
    }

    check_consistency(&outcome.articles, &mut outcome.warnings);
    tracing::info!(
        articles = outcome.articles.len(),
        errors = outcome.errors.len(),
        warnings = outcome.warnings.len(),
        "validation finished"
    );
    outcome
}

fn remove_duplicates(
    articles: Vec<ArticleRecord>,
    outcome: &mut ValidationOutcome,
) -> Vec<ArticleRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = Vec::new();
    let mut unique = Vec::with_capacity(articles.len());

    for article in articles {
        let title = article.title.trim().to_string();
        if title.is_empty() {
            outcome.errors.push("Article with empty title found".to_string());
            continue;
        }
        if !seen.insert(title.clone()) {
            duplicates.push(title);
            continue;
        }
        unique.push(article);
    }

    if !duplicates.is_empty() {
        let shown: Vec<&str> = duplicates
            .iter()
            .take(DUPLICATES_SHOWN)
            .map(String::as_str)
            .collect();
        outcome.warnings.push(format!(
            "Removed {} duplicate articles: {}",
            duplicates.len(),
            shown.join(", ")
        ));
        if duplicates.len() > DUPLICATES_SHOWN {
            outcome.warnings.push(format!(
                "... and {} more duplicates",
                duplicates.len() - DUPLICATES_SHOWN
            ));
        }
    }

    unique
}

fn check_article(article: &ArticleRecord, warnings: &mut Vec<String>) {
    let title = article.title.trim();

    if article.participant.trim().is_empty() {
        warnings.push(format!("Article '{}' has no participant specified", title));
    }

    if article.readable_length as u64 > article.size_bytes.saturating_mul(2) {
        warnings.push(format!(
            "Article '{}' has readable_length ({}) much larger than size_bytes ({})",
            title, article.readable_length, article.size_bytes
        ));
    }

    if article.topics.is_empty() {
        warnings.push(format!("Article '{}' has no topics specified", title));
    }
    if article.countries.is_empty() {
        warnings.push(format!("Article '{}' has no countries specified", title));
    }
}

fn clean_article(mut article: ArticleRecord) -> ArticleRecord {
    fn clean_list(items: Vec<String>) -> Vec<String> {
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    article.title = article.title.trim().to_string();
    article.participant = article.participant.trim().to_string();
    article.topics = clean_list(article.topics);
    article.countries = clean_list(article.countries);
    article
}

fn check_consistency(articles: &[ArticleRecord], warnings: &mut Vec<String>) {
    if articles.is_empty() {
        return;
    }

    // Participant names that differ only by case
    let mut order: Vec<String> = Vec::new();
    let mut variations: HashMap<String, Vec<String>> = HashMap::new();
    for article in articles {
        let participant = article.participant.trim();
        if participant.is_empty() {
            continue;
        }
        let key = participant.to_lowercase();
        let group = variations.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if !group.iter().any(|v| v == participant) {
            group.push(participant.to_string());
        }
    }
    for key in &order {
        if let Some(group) = variations.get(key) {
            if group.len() > 1 {
                warnings.push(format!(
                    "Potential participant name variations: {}",
                    group.join(", ")
                ));
            }
        }
    }

    let count = articles.len() as f64;
    let avg_readable = articles.iter().map(|a| a.readable_length as f64).sum::<f64>() / count;
    for article in articles {
        if article.readable_length as f64 > avg_readable * OUTLIER_FACTOR {
            warnings.push(format!(
                "Unusually long article: '{}' ({} chars)",
                article.title, article.readable_length
            ));
        }
    }

    let avg_size = articles.iter().map(|a| a.size_bytes as f64).sum::<f64>() / count;
    for article in articles {
        if article.size_bytes as f64 > avg_size * OUTLIER_FACTOR {
            warnings.push(format!(
                "Unusually large article: '{}' ({} bytes)",
                article.title, article.size_bytes
            ));
        }
    }

    let topics = ranked(tally(
        articles.iter().flat_map(|a| a.topics.iter()).map(|t| (t.as_str(), 1)),
    ));
    if !topics.is_empty() {
        warnings.push(format!("Most common topics: {}", top_five(&topics)));
    }

    let countries = ranked(tally(
        articles.iter().flat_map(|a| a.countries.iter()).map(|c| (c.as_str(), 1)),
    ));
    if !countries.is_empty() {
        warnings.push(format!("Most common countries: {}", top_five(&countries)));
    }
}

fn top_five(counts: &[(String, u64)]) -> String {
    counts
        .iter()
        .take(5)
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect::<Vec<_>>()
        .join(", ")
}
