//! Wikitext and console reports built from validated article records.
//!
//! Everything here is a pure function of the records and the contest
//! configuration; writing the results to disk is left to the binary.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::article::ArticleRecord;
use crate::config::ContestConfig;

pub const DEFAULT_TABLE_TITLE: &str = "Konkursā iesniegtie raksti";
const NO_ARTICLES: &str = "Nav atrasti raksti ar norādīto veidni.";
const MANUAL_FILL: &str = "''(Aizpildīt manuāli)''";
const TABLE_HEADERS: [&str; 8] = [
    "Raksts",
    "Dalībnieks",
    "Tēma",
    "Valsts",
    "Lasāmā teksta garums",
    "Raksta garums baitos",
    "Wikidata ID",
    "No ieteikumu saraksta",
];

// ─────────────────────────────────────────────────────────────
// Counting helpers
// ─────────────────────────────────────────────────────────────

/// Sum weights per key, keys kept in first-appearance order.
pub(crate) fn tally<I, S>(items: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = (S, u64)>,
    S: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();

    for (key, weight) in items {
        let key = key.as_ref();
        match index.get(key) {
            Some(&i) => counts[i].1 += weight,
            None => {
                index.insert(key.to_string(), counts.len());
                counts.push((key.to_string(), weight));
            }
        }
    }

    counts
}

/// Highest count first. Stable, so ties keep first-appearance order.
pub(crate) fn ranked(mut counts: Vec<(String, u64)>) -> Vec<(String, u64)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// `1234567` → `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn user(participant: &str) -> String {
    format!("{{{{U|{}}}}}", participant)
}

fn non_blank<'a>(items: &'a [String]) -> impl Iterator<Item = &'a str> + 'a {
    items.iter().map(|s| s.trim()).filter(|s| !s.is_empty())
}

// ─────────────────────────────────────────────────────────────
// Main table
// ─────────────────────────────────────────────────────────────

/// Sortable wikitable of all articles followed by the statistics section.
pub fn wikitext_table(articles: &[ArticleRecord], title: &str, config: &ContestConfig) -> String {
    if articles.is_empty() {
        return format!("== {} ==\n{}\n", title, NO_ARTICLES);
    }

    let mut sorted: Vec<&ArticleRecord> = articles.iter().collect();
    sorted.sort_by_cached_key(|a| (a.participant.to_lowercase(), a.title.to_lowercase()));

    let mut out = format!("== {} ==\n", title);
    out.push_str("{| class=\"sortable wikitable\"\n");
    out.push_str("|-\n");
    out.push_str(&format!("! {}\n", TABLE_HEADERS.join(" !! ")));
    out.push_str("|-\n");

    for article in &sorted {
        out.push_str(&table_row(article, config));
        out.push_str("\n|-\n");
    }

    out.push_str("|}\n");
    out.push_str(&statistics(&sorted, config));
    out
}

fn table_row(article: &ArticleRecord, config: &ContestConfig) -> String {
    let participant = if article.participant.is_empty() {
        String::new()
    } else {
        user(&article.participant)
    };

    let topics = non_blank(&article.topics).collect::<Vec<_>>().join(", ");

    let countries = article
        .valid_countries
        .iter()
        .cloned()
        .chain(
            article
                .invalid_countries
                .iter()
                .map(|c| format!("<span style=\"color:red\">{}</span>", c)),
        )
        .collect::<Vec<_>>()
        .join(", ");

    let wikidata = match article.wikidata_id.as_deref() {
        Some(id) if !id.is_empty() => format!("[[d:{}|{}]]", id, id),
        _ => String::new(),
    };

    let suggested = if article.from_suggested_list && !article.suggested_country.is_empty() {
        format!(
            "[[m:{}{}|{}]]",
            config.structure_page_prefix(),
            article.suggested_country,
            article.suggested_country
        )
    } else {
        String::new()
    };

    let cells = [
        format!("[[{}]]", article.title),
        participant,
        topics,
        countries,
        article.readable_length.to_string(),
        article.size_bytes.to_string(),
        wikidata,
        suggested,
    ];
    format!("| {}", cells.join(" || "))
}

fn statistics(articles: &[&ArticleRecord], config: &ContestConfig) -> String {
    let total = articles.len();
    let participants: HashSet<&str> = articles
        .iter()
        .map(|a| a.participant.trim())
        .filter(|p| !p.is_empty())
        .collect();
    let topics = ranked(tally(
        articles.iter().flat_map(|a| non_blank(&a.topics)).map(|t| (t, 1)),
    ));
    let countries = ranked(tally(
        articles.iter().flat_map(|a| non_blank(&a.countries)).map(|c| (c, 1)),
    ));
    let total_readable: u64 = articles.iter().map(|a| a.readable_length as u64).sum();
    let suggested = articles.iter().filter(|a| a.from_suggested_list).count();
    let category = config.category_prefix();

    let mut out = String::from("\n== Statistika ==\n");
    out.push_str(&format!("* '''Kopējais rakstu skaits:''' {}\n", total));
    out.push_str(&format!("* '''Dalībnieku skaits:''' {}\n", participants.len()));

    out.push_str(&format!("* '''Dažādu tēmu skaits:''' {}\n", topics.len()));
    if !topics.is_empty() {
        let links: Vec<String> = topics
            .iter()
            .map(|(topic, count)| {
                format!(
                    "[[:Kategorija:{} — {}|{}]] ({})",
                    category,
                    topic.to_lowercase(),
                    topic,
                    count
                )
            })
            .collect();
        out.push_str(&format!("** {}\n", links.join(", ")));
    }

    out.push_str(&format!("* '''Dažādu valstu skaits:''' {}\n", countries.len()));
    if !countries.is_empty() {
        let links: Vec<String> = countries
            .iter()
            .map(|(country, count)| {
                format!("[[:Kategorija:{} — {}|{}]] ({})", category, country, country, count)
            })
            .collect();
        out.push_str(&format!("** {}\n", links.join(", ")));
    }

    out.push_str(&format!(
        "* '''Kopējais lasāmā teksta garums:''' {} rakstzīmes\n",
        group_thousands(total_readable)
    ));
    out.push_str(&format!(
        "* '''Raksti no ieteikumu saraksta:''' {} no {} ({:.1}%)\n",
        suggested,
        total,
        suggested as f64 / total as f64 * 100.0
    ));

    let contributors = top_contributors(articles);
    if !contributors.is_empty() {
        out.push_str("\n=== Aktīvākie dalībnieki ===\n");
        for (participant, count, readable) in contributors {
            out.push_str(&format!(
                "# {} - {} raksti, {} rakstzīmes\n",
                user(participant),
                count,
                group_thousands(readable)
            ));
        }
    }

    out
}

/// (participant, article count, readable characters), most articles first,
/// then most readable text.
fn top_contributors<'a>(articles: &[&'a ArticleRecord]) -> Vec<(&'a str, u64, u64)> {
    let mut order: Vec<&'a str> = Vec::new();
    let mut totals: HashMap<&'a str, (u64, u64)> = HashMap::new();

    for &article in articles {
        let participant = article.participant.trim();
        if participant.is_empty() {
            continue;
        }
        let entry = totals.entry(participant).or_insert_with(|| {
            order.push(participant);
            (0, 0)
        });
        entry.0 += 1;
        entry.1 += article.readable_length as u64;
    }

    let mut contributors: Vec<(&str, u64, u64)> = order
        .into_iter()
        .map(|p| {
            let (count, readable) = totals[&p];
            (p, count, readable)
        })
        .collect();
    contributors.sort_by(|a, b| (b.1, b.2).cmp(&(a.1, a.2)));
    contributors
}

// ─────────────────────────────────────────────────────────────
// Participant and category reports
// ─────────────────────────────────────────────────────────────

/// Articles grouped under each participant, both sorted by name.
pub fn participant_report(articles: &[ArticleRecord]) -> String {
    if articles.is_empty() {
        return format!("{}\n", NO_ARTICLES);
    }

    let mut by_participant: BTreeMap<&str, Vec<&ArticleRecord>> = BTreeMap::new();
    for article in articles {
        let participant = article.participant.trim();
        if !participant.is_empty() {
            by_participant.entry(participant).or_default().push(article);
        }
    }

    let mut out = String::from("== Dalībnieku saraksts ==\n");
    for (participant, mut list) in by_participant {
        out.push_str(&format!("=== {} ===\n", user(participant)));
        out.push_str(&format!("Rakstu skaits: {}\n\n", list.len()));

        list.sort_by(|a, b| a.title.cmp(&b.title));
        for article in list {
            out.push_str(&format!("* [[{}]] - ", article.title));
            if !article.topics.is_empty() {
                out.push_str(&format!("Tēmas: {}; ", article.topics.join(", ")));
            }
            if !article.countries.is_empty() {
                out.push_str(&format!("Valstis: {}; ", article.countries.join(", ")));
            }
            out.push_str(&format!(
                "Lasāmais teksts: {} rakstzīmes\n",
                article.readable_length
            ));
        }
        out.push('\n');
    }
    out
}

/// Rankings for the contest's award categories. Only articles with at least
/// one allowed country take part; categories judged by people get a
/// placeholder.
pub fn contest_categories_report(articles: &[ArticleRecord], config: &ContestConfig) -> String {
    if articles.is_empty() {
        return format!("{}\n", NO_ARTICLES);
    }

    let eligible: Vec<&ArticleRecord> =
        articles.iter().filter(|a| a.eligible_for_contest).collect();
    let min_length = config.min_readable_length;
    let threshold_note = format!(
        "''Minimālais lasāmā teksta apjoms ir {} rakstzīmes''\n\n",
        min_length
    );
    let long_enough = |a: &&ArticleRecord| a.readable_length >= min_length;

    let mut out = String::from("== Konkursa kategorijas ==\n");
    out.push_str(
        "''Tikai raksti ar derīgām konkursa valstīm tiek iekļauti šajās kategorijās. ",
    );
    out.push_str(&format!(
        "No {} kopējiem rakstiem, {} atbilst kritērijiem.''\n\n",
        articles.len(),
        eligible.len()
    ));

    out.push_str("=== Labākais konkursa gaitā tapušais raksts žūrijas vērtējumā ===\n");
    out.push_str(&format!("{}\n\n", MANUAL_FILL));

    out.push_str("=== Lielākais devums konkursa gaitā ===\n");
    let bytes = participant_ranking(eligible.iter().copied(), |a| a.size_bytes);
    for (participant, total) in bytes {
        out.push_str(&format!(
            "# {} - {} baiti\n",
            user(&participant),
            group_thousands(total)
        ));
    }
    out.push('\n');

    out.push_str("=== Lielākais devums konkursa gaitā jaunam lietotājam ===\n");
    out.push_str(&format!("{}\n\n", MANUAL_FILL));

    out.push_str("=== Visvairāk izveidoto rakstu no tēmu sarakstiem ===\n");
    out.push_str(&threshold_note);
    let suggested = participant_ranking(
        eligible
            .iter()
            .copied()
            .filter(long_enough)
            .filter(|a| a.from_suggested_list),
        |_| 1,
    );
    for (participant, count) in suggested {
        out.push_str(&format!(
            "# {} - {} raksti (no ieteikumu sarakstiem, {}+ rakstzīmes)\n",
            user(&participant),
            count,
            min_length
        ));
    }
    out.push('\n');

    out.push_str("=== Visvairāk izveidoto rakstu no tēmu sarakstiem jaunam dalībniekam ===\n");
    out.push_str(&threshold_note);
    out.push_str(&format!("{}\n\n", MANUAL_FILL));

    let topic_categories = [
        ("=== Visvairāk izveidoto sieviešu biogrāfiju rakstu ===\n", &config.women_topic),
        ("=== Visvairāk izveidoto cilvēktiesību tēmas rakstu ===\n", &config.human_rights_topic),
    ];
    for (heading, topic) in topic_categories {
        out.push_str(heading);
        out.push_str(&threshold_note);
        let ranking = participant_ranking(
            eligible
                .iter()
                .copied()
                .filter(long_enough)
                .filter(|a| a.topics.iter().any(|t| t == topic)),
            |_| 1,
        );
        for (participant, count) in ranking {
            out.push_str(&format!("# {} - {} raksti\n", user(&participant), count));
        }
        out.push('\n');
    }

    out
}

fn participant_ranking<'a, I, F>(articles: I, weight: F) -> Vec<(String, u64)>
where
    I: Iterator<Item = &'a ArticleRecord>,
    F: Fn(&ArticleRecord) -> u64,
{
    ranked(tally(
        articles
            .map(|a| (a.participant.trim(), weight(a)))
            .filter(|(p, _)| !p.is_empty()),
    ))
}

// ─────────────────────────────────────────────────────────────
// Console summary
// ─────────────────────────────────────────────────────────────

/// Plain-text overview printed at the end of a run.
pub fn summary(articles: &[ArticleRecord]) -> String {
    if articles.is_empty() {
        return "No data to summarize.\n".to_string();
    }

    let participants = ranked(tally(
        articles
            .iter()
            .map(|a| a.participant.trim())
            .filter(|p| !p.is_empty())
            .map(|p| (p, 1)),
    ));
    let topics: HashSet<&str> = articles.iter().flat_map(|a| non_blank(&a.topics)).collect();
    let countries: HashSet<&str> = articles
        .iter()
        .flat_map(|a| non_blank(&a.countries))
        .collect();
    let total_readable: u64 = articles.iter().map(|a| a.readable_length as u64).sum();
    let total_bytes: u64 = articles.iter().map(|a| a.size_bytes).sum();

    let rule = "=".repeat(50);
    let mut out = format!("\n{}\nCOLLECTION SUMMARY\n{}\n", rule, rule);
    out.push_str(&format!("Total articles: {}\n", articles.len()));
    out.push_str(&format!("Unique participants: {}\n", participants.len()));
    out.push_str(&format!("Unique topics: {}\n", topics.len()));
    out.push_str(&format!("Unique countries: {}\n", countries.len()));
    out.push_str(&format!(
        "Total readable text: {} characters\n",
        group_thousands(total_readable)
    ));
    out.push_str(&format!(
        "Total article size: {} bytes\n",
        group_thousands(total_bytes)
    ));

    if !participants.is_empty() {
        out.push_str("\nTop 5 participants:\n");
        for (i, (participant, count)) in participants.iter().take(5).enumerate() {
            out.push_str(&format!("  {}. {}: {} articles\n", i + 1, participant, count));
        }
    }

    out
}
