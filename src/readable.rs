//! Readable text length of an article.
//!
//! Templates are removed structurally first, then the remaining markup is
//! cleaned by an ordered list of regex rules. The order matters: templates go
//! before tag/link cleanup so their contents never count as prose, and
//! self-closing `<ref/>` tags go before paired ones so the lazy paired pattern
//! cannot start at a self-closing tag and swallow the text after it.

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::panic;

use crate::wikitext::strip_templates;

lazy_static! {
    /// Applied in order to the template-free markup.
    static ref CLEANUP_RULES: Vec<(&'static str, Regex, &'static str)> = vec![
        ("gallery", Regex::new(r"(?is)<gallery[^>]*>.*?</gallery>").unwrap(), ""),

        // Self-closing references first, then paired ones with content
        ("ref self-closing", Regex::new(r"(?i)<ref[^>]*/\s*>").unwrap(), ""),
        ("ref paired", Regex::new(r"(?is)<ref[^>]*>.*?</ref>").unwrap(), ""),

        ("comment", Regex::new(r"(?s)<!--.*?-->").unwrap(), ""),

        ("nowiki", Regex::new(r"(?is)<nowiki[^>]*>.*?</nowiki>").unwrap(), ""),
        ("pre", Regex::new(r"(?is)<pre[^>]*>.*?</pre>").unwrap(), ""),
        ("code", Regex::new(r"(?is)<code[^>]*>.*?</code>").unwrap(), ""),
        ("math", Regex::new(r"(?is)<math[^>]*>.*?</math>").unwrap(), ""),

        ("category", Regex::new(r"(?i)\[\[Category:.*?\]\]").unwrap(), ""),
        ("kategorija", Regex::new(r"(?i)\[\[Kategorija:.*?\]\]").unwrap(), ""),

        ("file", Regex::new(r"(?is)\[\[File:.*?\]\]").unwrap(), ""),
        ("attēls", Regex::new(r"(?is)\[\[Attēls:.*?\]\]").unwrap(), ""),
        ("image", Regex::new(r"(?is)\[\[Image:.*?\]\]").unwrap(), ""),

        // [https://x label] -> label, bare [https://x] dropped
        ("external labelled", Regex::new(r"\[https?://[^\s\]]+\s+([^\]]+)\]").unwrap(), "${1}"),
        ("external bare", Regex::new(r"\[https?://[^\s\]]+\]").unwrap(), ""),

        // [[target|label]] -> label, [[target]] -> target
        ("link piped", Regex::new(r"\[\[([^|\]]+)\|([^\]]+)\]\]").unwrap(), "${2}"),
        ("link", Regex::new(r"\[\[([^\]]+)\]\]").unwrap(), "${1}"),

        ("bold", Regex::new(r"'''([^']+)'''").unwrap(), "${1}"),
        ("italic", Regex::new(r"''([^']+)''").unwrap(), "${1}"),

        ("heading", Regex::new(r"(?m)^=+\s*.*?\s*=+\s*$").unwrap(), ""),

        ("table", Regex::new(r"(?ms)^\{\|.*?\|\}").unwrap(), ""),
        ("table row", Regex::new(r"(?m)^\|-.*?$").unwrap(), ""),
        ("table cell", Regex::new(r"(?m)^\|.*?$").unwrap(), ""),
        ("table header", Regex::new(r"(?m)^!.*?$").unwrap(), ""),

        // Whatever brace constructs survived the structural pass
        ("leftover template", Regex::new(r"\{\{[^}]*\}\}").unwrap(), ""),
    ];

    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n").unwrap();
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
}

/// Plain prose left after stripping markup, with whitespace collapsed.
pub fn readable_text(markup: &str) -> String {
    let mut text = strip_templates(markup);

    for (name, pattern, replacement) in CLEANUP_RULES.iter() {
        if let Cow::Owned(replaced) = pattern.replace_all(&text, *replacement) {
            tracing::trace!(
                rule = *name,
                removed = text.len().saturating_sub(replaced.len()),
                "cleanup rule applied"
            );
            text = replaced;
        }
    }

    let text = BLANK_LINES.replace_all(&text, "\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Character count of [`readable_text`].
///
/// Best effort: an internal failure yields 0 rather than an error.
pub fn readable_length(markup: &str) -> usize {
    match panic::catch_unwind(|| readable_text(markup).chars().count()) {
        Ok(length) => length,
        Err(_) => {
            tracing::warn!(
                bytes = markup.len(),
                "readable length computation failed, counting as 0"
            );
            0
        }
    }
}
