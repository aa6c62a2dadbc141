//! Markdown renderers for the `ruleset-to-docs` and `generate-index`
//! templates.
//!
//! Both are pure functions from a document to page text. Example and XPath
//! text arrives already entity-escaped, so it goes into raw `<pre>` HTML
//! blocks where Markdown leaves it alone and the browser decodes it.
//!
//! ## Rule-set page
//!
//! ```text
//! # Braces                                 ← ruleset name
//! Rules about braces.                      ← ruleset description
//! ## IfStmtsMustUseBraces                  ← one section per rule
//! *Since: 1.0 | Priority: 3 | Class: ...*
//! description, deprecation notice, XPath, examples, property table
//! ```
//!
//! ## Index page
//!
//! Grouped by category in merged order. Each rule-set links to its page and
//! each rule to its anchor on that page, with the first sentence of its
//! description.

use crate::convert::{XPATH_PROPERTY, escape_markup};
use crate::naming;
use crate::xml::{Document, Element};

pub const INDEX_TITLE: &str = "Rule Set Index";

/// Render one rule-set document as a Markdown page.
pub fn render_ruleset_page(doc: &Document) -> String {
    let root = &doc.root;
    let mut lines = vec![format!("# {}", root.attribute("name").unwrap_or("Rule Set"))];

    if let Some(description) = root.child_text("description") {
        push_paragraph(&mut lines, &dedent(&description));
    }

    for rule in root.descendants_named("rule") {
        render_rule(rule, &mut lines);
    }

    let mut page = lines.join("\n");
    page.push('\n');
    page
}

fn render_rule(rule: &Element, lines: &mut Vec<String>) {
    lines.push(String::new());
    lines.push(format!("## {}", rule_name(rule)));

    let facts: Vec<String> = [
        rule.attribute("since").map(|v| format!("Since: {v}")),
        rule.child_text("priority").map(|v| format!("Priority: {}", v.trim())),
        rule.attribute("class").map(|v| format!("Class: `{v}`")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !facts.is_empty() {
        push_paragraph(lines, &format!("*{}*", facts.join(" | ")));
    }

    let deprecated = rule.attribute("deprecated") == Some("true");
    match (deprecated, rule.attribute("ref")) {
        (true, Some(target)) => push_paragraph(
            lines,
            &format!("> **Deprecated.** This rule has been moved to `{target}`."),
        ),
        (true, None) => push_paragraph(lines, "> **Deprecated.**"),
        (false, Some(target)) => {
            push_paragraph(lines, &format!("> This rule is defined in `{target}`."))
        }
        (false, None) => {}
    }

    if let Some(description) = rule.child_text("description") {
        push_paragraph(lines, &dedent(&description));
    }
    if let Some(message) = rule.attribute("message") {
        push_paragraph(lines, &format!("Violation message: *{message}*"));
    }

    for xpath in xpath_expressions(rule) {
        push_paragraph(lines, "**This rule is defined by the following XPath expression:**");
        push_pre(lines, &xpath);
    }

    let examples: Vec<&Element> = rule.children_named("example").collect();
    if !examples.is_empty() {
        push_paragraph(lines, "**Example(s):**");
        for example in examples {
            push_pre(lines, &example.text_content());
        }
    }

    let properties = documented_properties(rule);
    if !properties.is_empty() {
        push_paragraph(lines, "**This rule has the following properties:**");
        lines.push(String::new());
        lines.push("| Name | Default value | Description |".to_string());
        lines.push("|------|---------------|-------------|".to_string());
        for property in properties {
            lines.push(format!(
                "| {} | {} | {} |",
                table_cell(property.attribute("name").unwrap_or_default()),
                table_cell(&property_value(property).unwrap_or_default()),
                table_cell(&property_description(property)),
            ));
        }
    }

    if let Some(url) = rule.attribute("externalInfoUrl") {
        push_paragraph(lines, &format!("[More information]({url})"));
    }
}

/// Render the merged rule-set as the Markdown index page.
pub fn render_index(merged: &Document) -> String {
    let mut lines = vec![format!("# {INDEX_TITLE}")];
    let rulesets: Vec<&Element> = merged.root.children_named("ruleset").collect();

    let mut categories: Vec<&str> = Vec::new();
    for ruleset in &rulesets {
        let category = ruleset.attribute("category").unwrap_or_default();
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    for category in categories {
        lines.push(String::new());
        lines.push(format!("## {category}"));
        for ruleset in rulesets
            .iter()
            .filter(|r| r.attribute("category").unwrap_or_default() == category)
        {
            let name = ruleset.attribute("name").unwrap_or("Rule Set");
            let page = ruleset.attribute("page").unwrap_or_default();
            lines.push(String::new());
            lines.push(format!("### [{name}]({page})"));
            if let Some(description) = ruleset.child_text("description") {
                let summary = first_sentence(&description);
                if !summary.is_empty() {
                    push_paragraph(&mut lines, &summary);
                }
            }

            let rules = ruleset.descendants_named("rule");
            if rules.is_empty() {
                continue;
            }
            lines.push(String::new());
            for rule in rules {
                let rule_name = rule_name(rule);
                let summary = rule
                    .child_text("description")
                    .map(|d| first_sentence(&d))
                    .unwrap_or_default();
                let link = format!("[{rule_name}]({page}#{})", naming::anchor(&rule_name));
                if summary.is_empty() {
                    lines.push(format!("- {link}"));
                } else {
                    lines.push(format!("- {link}: {summary}"));
                }
            }
        }
    }

    let mut page = lines.join("\n");
    page.push('\n');
    page
}

/// Display name of a rule: its `name`, or the last segment of its `ref`.
pub fn rule_name(rule: &Element) -> String {
    if let Some(name) = rule.attribute("name") {
        return name.to_string();
    }
    rule.attribute("ref")
        .and_then(|r| r.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("(unnamed rule)")
        .to_string()
}

/// XPath expressions of a rule, entity-escaped.
///
/// `<value>` children were escaped during conversion; a `value` attribute is
/// escaped here.
fn xpath_expressions(rule: &Element) -> Vec<String> {
    let mut found = Vec::new();
    for property in rule
        .children_named("properties")
        .flat_map(|p| p.children_named("property"))
        .filter(|p| p.attribute("name") == Some(XPATH_PROPERTY))
    {
        if let Some(value) = property.attribute("value") {
            found.push(escape_markup(value));
        }
        for value in property.children_named("value") {
            found.push(value.text_content());
        }
    }
    found
}

fn documented_properties(rule: &Element) -> Vec<&Element> {
    rule.children_named("properties")
        .flat_map(|p| p.children_named("property"))
        .filter(|p| p.attribute("name") != Some(XPATH_PROPERTY))
        .collect()
}

fn property_value(property: &Element) -> Option<String> {
    property
        .attribute("value")
        .map(str::to_string)
        .or_else(|| property.child_text("value"))
}

fn property_description(property: &Element) -> String {
    property
        .attribute("description")
        .map(str::to_string)
        .or_else(|| property.child_text("description"))
        .unwrap_or_default()
}

fn push_paragraph(lines: &mut Vec<String>, text: &str) {
    if text.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.extend(text.lines().map(str::to_string));
}

fn push_pre(lines: &mut Vec<String>, text: &str) {
    lines.push(String::new());
    lines.push("<pre>".to_string());
    lines.extend(dedent(text).lines().map(str::to_string));
    lines.push("</pre>".to_string());
}

fn table_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

/// Strip leading and trailing blank lines and the indentation common to
/// every non-blank line.
pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(first);
    let body = &lines[first..=last];
    let indent = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    body.iter()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(indent..).unwrap_or(l.trim_start()).trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The first sentence of a description, on one line.
pub fn first_sentence(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.find(". ") {
        Some(end) => flat[..=end].to_string(),
        None => flat,
    }
}
