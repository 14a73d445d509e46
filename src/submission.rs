use serde::{Deserialize, Serialize};

use crate::config::FieldNames;
use crate::wikitext::TemplateInvocation;

/// Participation declaration taken from one contest template on a talk page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub participant: String,
    /// Declaration order, duplicates kept
    pub topics: Vec<String>,
    pub countries: Vec<String>,
}

/// Map the template's parameters onto a submission record.
///
/// Parameter names are trimmed and compared code point for code point, so a
/// decomposed `te\u{304}ma` is not a topic field. Field families have no upper
/// index: any name starting with the topic or country prefix is accepted.
pub fn normalize(invocation: &TemplateInvocation, fields: &FieldNames) -> SubmissionRecord {
    let mut record = SubmissionRecord::default();

    for param in &invocation.params {
        let name = param.name.trim();
        let value = param.value.trim();
        if value.is_empty() {
            continue;
        }

        if name == fields.participant {
            record.participant = value.to_string();
        } else if name.starts_with(fields.topic_prefix.as_str()) {
            record.topics.push(normalize_topic(value));
        } else if name.starts_with(fields.country_prefix.as_str()) {
            record.countries.push(value.to_string());
        }
    }

    record
}

/// Trim, then uppercase only the first character: `kultūra` → `Kultūra`,
/// `POLITIKA` stays as is.
pub fn normalize_topic(topic: &str) -> String {
    let trimmed = topic.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
