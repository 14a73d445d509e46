//! Template invocation scanning for wikitext.
//!
//! Only the subset needed here is recognized: `{{...}}` invocations (nested),
//! `[[...]]` links (so a pipe inside a link does not split a parameter) and
//! `<!-- -->` comments (so a template inside a comment is not a template).
//! `{{{...}}}` parameter references are kept as text; templates inside their
//! defaults still count. Everything else is opaque text.

use serde::Serialize;
use std::collections::HashSet;

/// Nesting depth beyond which `{{` is treated as plain text.
const MAX_NESTING: usize = 64;

/// A single `name = value` (or positional) parameter of a template invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParam {
    pub name: String,
    pub value: String,
}

/// A parsed `{{name|param|key=value}}` invocation.
///
/// Parameters keep declaration order. Positional parameters are named `1`,
/// `2`, ... counting positional ones only. Parameters whose trimmed value is
/// empty are not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInvocation {
    pub name: String,
    pub params: Vec<TemplateParam>,
}

impl TemplateInvocation {
    /// Value of the first parameter with this exact name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Template found in the source, with its byte span and nested templates.
#[derive(Debug)]
struct TemplateNode {
    start: usize,
    end: usize,
    invocation: TemplateInvocation,
    children: Vec<TemplateNode>,
}

/// Byte range of one `|`-separated segment, with the first top-level `=`.
struct Segment {
    start: usize,
    end: usize,
    equals: Option<usize>,
}

impl Segment {
    fn at(start: usize) -> Self {
        Segment { start, end: start, equals: None }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recursive descent scanner
// ─────────────────────────────────────────────────────────────────────────────

/// Recursive descent scanner over template invocations.
/// Uses the call stack for template nesting; link depth is a counter since
/// links only matter for where a pipe belongs.
struct WikitextParser<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
    /// Openers already known not to form a template
    rejected: HashSet<usize>,
    /// `{{{` openers already known never to close
    rejected_args: HashSet<usize>,
}

impl<'a> WikitextParser<'a> {
    fn new(text: &'a str) -> Self {
        WikitextParser {
            text,
            pos: 0,
            depth: 0,
            rejected: HashSet::new(),
            rejected_args: HashSet::new(),
        }
    }

    fn at(&self, token: &str) -> bool {
        self.text[self.pos..].starts_with(token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Advance over an ASCII token of `n` bytes
    fn consume(&mut self, n: usize) {
        self.pos += n;
    }

    fn consume_char(&mut self) {
        if let Some(c) = self.text[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip `<!-- ... -->`. An unterminated comment opener is ordinary text.
    fn skip_comment(&mut self) {
        match self.text[self.pos + 4..].find("-->") {
            Some(offset) => self.pos += 4 + offset + 3,
            None => self.consume(4),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // document ::= (comment | argument | template | char)*
    // ─────────────────────────────────────────────────────────────
    fn parse_document(&mut self) -> Vec<TemplateNode> {
        let mut nodes = Vec::new();
        while !self.at_end() {
            if self.at("<!--") {
                self.skip_comment();
            } else if self.at("{{{") {
                self.parse_argument(&mut nodes);
            } else if self.at("{{") {
                let start = self.pos;
                match self.parse_template() {
                    Some(node) => nodes.push(node),
                    None => {
                        self.pos = start;
                        self.consume(2);
                    }
                }
            } else {
                self.consume_char();
            }
        }
        nodes
    }

    // ─────────────────────────────────────────────────────────────
    // template ::= "{{" segment ("|" segment)* "}}"
    // Returns None (position restored by the caller) when the braces
    // never close or the name is blank.
    // ─────────────────────────────────────────────────────────────
    fn parse_template(&mut self) -> Option<TemplateNode> {
        if self.depth >= MAX_NESTING || self.rejected.contains(&self.pos) {
            return None;
        }
        let start = self.pos;
        self.consume(2); // consume "{{"
        self.depth += 1;

        let mut segments = vec![Segment::at(self.pos)];
        let mut children = Vec::new();
        let mut link_depth = 0usize;

        let closed = loop {
            if self.at_end() {
                break false;
            }
            if self.at("}}") {
                if let Some(last) = segments.last_mut() {
                    last.end = self.pos;
                }
                self.consume(2);
                break true;
            } else if self.at("{{{") {
                self.parse_argument(&mut children);
            } else if self.at("{{") {
                let nested_start = self.pos;
                match self.parse_template() {
                    Some(child) => children.push(child), // RECURSIVE!
                    None => {
                        self.pos = nested_start;
                        self.consume(2);
                    }
                }
            } else if self.at("<!--") {
                self.skip_comment();
            } else if self.at("[[") {
                link_depth += 1;
                self.consume(2);
            } else if self.at("]]") && link_depth > 0 {
                link_depth -= 1;
                self.consume(2);
            } else if self.at("|") && link_depth == 0 {
                if let Some(last) = segments.last_mut() {
                    last.end = self.pos;
                }
                self.consume(1);
                segments.push(Segment::at(self.pos));
            } else if self.at("=") && link_depth == 0 && segments.len() > 1 {
                if let Some(last) = segments.last_mut() {
                    last.equals.get_or_insert(self.pos);
                }
                self.consume(1);
            } else {
                self.consume_char();
            }
        };

        self.depth -= 1;
        let invocation = if closed {
            self.build_invocation(&segments)
        } else {
            None
        };
        let Some(invocation) = invocation else {
            self.rejected.insert(start);
            return None;
        };
        Some(TemplateNode {
            start,
            end: self.pos,
            invocation,
            children,
        })
    }

    // ─────────────────────────────────────────────────────────────
    // argument ::= "{{{" (comment | argument | template | char)* "}}}"
    // The argument itself stays text; templates inside it are pushed
    // onto `out`. An unclosed opener gives up a single "{".
    // ─────────────────────────────────────────────────────────────
    fn parse_argument(&mut self, out: &mut Vec<TemplateNode>) {
        let start = self.pos;
        if self.depth >= MAX_NESTING || self.rejected_args.contains(&start) {
            self.consume(1);
            return;
        }
        self.consume(3); // consume "{{{"
        self.depth += 1;

        let mut inner = Vec::new();
        let closed = loop {
            if self.at_end() {
                break false;
            }
            if self.at("}}}") {
                self.consume(3);
                break true;
            } else if self.at("<!--") {
                self.skip_comment();
            } else if self.at("{{{") {
                self.parse_argument(&mut inner);
            } else if self.at("{{") {
                let nested_start = self.pos;
                match self.parse_template() {
                    Some(child) => inner.push(child),
                    None => {
                        self.pos = nested_start;
                        self.consume(2);
                    }
                }
            } else {
                self.consume_char();
            }
        };

        self.depth -= 1;
        if closed {
            out.extend(inner);
        } else {
            self.rejected_args.insert(start);
            self.pos = start;
            self.consume(1);
        }
    }

    fn build_invocation(&self, segments: &[Segment]) -> Option<TemplateInvocation> {
        let (head, rest) = segments.split_first()?;
        let name = self.text[head.start..head.end].trim();
        if name.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        let mut positional = 0usize;
        for segment in rest {
            let (key, value) = match segment.equals {
                Some(eq) => (
                    self.text[segment.start..eq].trim().to_string(),
                    self.text[eq + 1..segment.end].trim(),
                ),
                None => {
                    positional += 1;
                    (
                        positional.to_string(),
                        self.text[segment.start..segment.end].trim(),
                    )
                }
            };
            if value.is_empty() {
                continue;
            }
            params.push(TemplateParam {
                name: key,
                value: value.to_string(),
            });
        }

        Some(TemplateInvocation {
            name: name.to_string(),
            params,
        })
    }
}

fn collect_preorder(nodes: Vec<TemplateNode>, out: &mut Vec<TemplateInvocation>) {
    for node in nodes {
        out.push(node.invocation);
        collect_preorder(node.children, out);
    }
}

/// All template invocations in document order, outer before inner.
pub fn templates(markup: &str) -> Vec<TemplateInvocation> {
    let nodes = WikitextParser::new(markup).parse_document();
    let mut out = Vec::new();
    collect_preorder(nodes, &mut out);
    out
}

/// Find the first invocation whose trimmed name equals `template_name` exactly.
///
/// Returns `None` when nothing matches, including for empty or malformed input.
pub fn find_template(markup: &str, template_name: &str) -> Option<TemplateInvocation> {
    let found = templates(markup)
        .into_iter()
        .find(|t| t.name == template_name);
    if found.is_none() {
        tracing::debug!(template = template_name, "template not found in markup");
    }
    found
}

/// Remove every template invocation (nested ones go with their parent).
/// Unclosed `{{` openers are left in place as text.
pub fn strip_templates(markup: &str) -> String {
    let nodes = WikitextParser::new(markup).parse_document();
    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;
    for node in &nodes {
        out.push_str(&markup[cursor..node.start]);
        cursor = node.end;
    }
    out.push_str(&markup[cursor..]);
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn param_pairs(t: &TemplateInvocation) -> Vec<(&str, &str)> {
        t.params
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_str()))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // find_template
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn finds_named_parameters_in_order() {
        let markup = "\n{{CEE Spring 2025\n|dalībnieks = Votre Provocateur\n|tēma     = Sievietes\n|tēma2    = kultūra\n|valsts     = Čuvašija\n}}\n";
        let t = find_template(markup, "CEE Spring 2025").unwrap();
        assert_eq!(t.name, "CEE Spring 2025");
        assert_eq!(
            param_pairs(&t),
            vec![
                ("dalībnieks", "Votre Provocateur"),
                ("tēma", "Sievietes"),
                ("tēma2", "kultūra"),
                ("valsts", "Čuvašija"),
            ]
        );
    }

    #[test]
    fn absent_when_no_match() {
        assert!(find_template("{{Other|a=b}} text", "CEE Spring 2025").is_none());
    }

    #[test]
    fn absent_for_empty_input() {
        assert!(find_template("", "CEE Spring 2025").is_none());
    }

    #[test]
    fn name_match_is_case_sensitive() {
        assert!(find_template("{{cee spring 2025|a=b}}", "CEE Spring 2025").is_none());
    }

    #[test]
    fn name_is_trimmed() {
        let t = find_template("{{  CEE Spring 2025 \n|a=b}}", "CEE Spring 2025").unwrap();
        assert_eq!(t.get("a"), Some("b"));
    }

    #[test]
    fn first_matching_invocation_wins() {
        let markup = "{{X|n=1}} {{X|n=2}}";
        let t = find_template(markup, "X").unwrap();
        assert_eq!(t.get("n"), Some("1"));
    }

    #[test]
    fn empty_values_are_omitted() {
        let t = find_template("{{X|a=|b = \n|c=1}}", "X").unwrap();
        assert_eq!(param_pairs(&t), vec![("c", "1")]);
        assert_eq!(t.get("a"), None);
    }

    #[test]
    fn positional_parameters_are_numbered() {
        let t = find_template("{{X|first|k=v|second}}", "X").unwrap();
        assert_eq!(
            param_pairs(&t),
            vec![("1", "first"), ("k", "v"), ("2", "second")]
        );
    }

    #[test]
    fn value_may_contain_equals() {
        let t = find_template("{{X|url=a=b}}", "X").unwrap();
        assert_eq!(t.get("url"), Some("a=b"));
    }

    #[test]
    fn unclosed_template_is_absent() {
        assert!(find_template("{{X|a=b", "X").is_none());
    }

    #[test]
    fn malformed_prefix_does_not_hide_later_template() {
        let t = find_template("{{broken {{X|a=b}}", "X").unwrap();
        assert_eq!(t.get("a"), Some("b"));
    }

    // ─────────────────────────────────────────────────────────────
    // Nesting, links, comments
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn nested_template_found_inside_outer() {
        let t = find_template("{{Outer|x={{Inner|y=1}}}}", "Inner").unwrap();
        assert_eq!(t.get("y"), Some("1"));
    }

    #[test]
    fn nested_template_kept_verbatim_in_value() {
        let t = find_template("{{Outer|x={{Inner|y=1}} tail}}", "Outer").unwrap();
        assert_eq!(t.get("x"), Some("{{Inner|y=1}} tail"));
    }

    #[test]
    fn pipe_inside_link_does_not_split() {
        let t = find_template("{{X|a=[[Rīga|galvaspilsēta]]|b=2}}", "X").unwrap();
        assert_eq!(
            param_pairs(&t),
            vec![("a", "[[Rīga|galvaspilsēta]]"), ("b", "2")]
        );
    }

    #[test]
    fn template_inside_comment_is_ignored() {
        assert!(find_template("<!-- {{X|a=b}} -->", "X").is_none());
    }

    #[test]
    fn pipe_inside_comment_does_not_split() {
        let t = find_template("{{X|a=1<!-- | -->|b=2}}", "X").unwrap();
        assert_eq!(t.get("a"), Some("1<!-- | -->"));
        assert_eq!(t.get("b"), Some("2"));
    }

    #[test]
    fn templates_are_listed_outer_first() {
        let names: Vec<String> = templates("{{A|{{B|{{C}}}}}} {{D}}")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn blank_name_is_not_a_template() {
        assert!(templates("{{ |a=b}}").is_empty());
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let markup = format!("{}x{}", "{{".repeat(500), "}}".repeat(500));
        let _ = templates(&markup);
        let _ = strip_templates(&markup);
    }

    #[test]
    fn many_unclosed_openers_scan_quickly() {
        let markup = format!("{}{{{{a}}}}", "{{ x ".repeat(50));
        let found = templates(&markup);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "a");
    }

    #[test]
    fn parameter_reference_kept_verbatim_in_value() {
        let t = find_template("{{X|a={{{1}}} b|c={{{nosaukums|}}}}}", "X").unwrap();
        assert_eq!(t.get("a"), Some("{{{1}}} b"));
        assert_eq!(t.get("c"), Some("{{{nosaukums|}}}"));
        assert_eq!(templates("{{X|a={{{1}}}}}").len(), 1);
    }

    #[test]
    fn template_inside_parameter_default_is_found() {
        let names: Vec<String> = templates("{{{1|{{Y|z=2}}}}}")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Y"]);
    }

    #[test]
    fn unclosed_parameter_reference_falls_back_to_template() {
        let t = find_template("{{{X|a=b}}", "X").unwrap();
        assert_eq!(t.get("a"), Some("b"));
    }

    // ─────────────────────────────────────────────────────────────
    // strip_templates
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn strip_removes_nested_templates() {
        assert_eq!(
            strip_templates("a {{Infobox|x={{b|c}}}} b {{d}}c"),
            "a  b c"
        );
    }

    #[test]
    fn strip_leaves_unclosed_opener() {
        assert_eq!(strip_templates("a {{b c"), "a {{b c");
    }

    #[test]
    fn strip_keeps_parameter_references() {
        assert_eq!(strip_templates("a {{{1}}} {{b}}c"), "a {{{1}}} c");
        assert_eq!(strip_templates("{{{1|{{b}}}}}"), "{{{1|}}}");
    }

    #[test]
    fn strip_keeps_comments_untouched() {
        assert_eq!(strip_templates("a<!-- {{x}} -->b"), "a<!-- {{x}} -->b");
    }
}
