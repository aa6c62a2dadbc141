//! CLI output formatting for all pipeline stages.
//!
//! # Output Format
//!
//! Output is information-first: each rule-set leads with its positional
//! index and name, with file paths shown as indented `Source:` context lines.
//!
//! ## Scan
//!
//! ```text
//! basic
//!     001 Braces
//!         Source: basic/Braces.xml
//!     002 EmptyRules
//!         Source: basic/EmptyRules.xml
//! design
//!     001 Design
//!         Source: design/Design.xml
//!
//! Found 3 rule-sets in 2 categories
//! ```
//!
//! ## Convert
//!
//! ```text
//! 001 Braces (2 rules) → basic/Braces.md
//! 002 EmptyRules (0 rules) → basic/EmptyRules.md
//!
//! Converted 2 rule-sets, 2 rules → target/generated-site/rules
//! ```
//!
//! ## Site
//!
//! ```text
//! Merged → target/generated-site/mergedruleset.xml
//!     Namespace declarations removed: 3
//! Index → target/generated-site/rules/index.md
//! Menu "Rule Sets" (3 rule-sets) → src/site/site.xml
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::convert::ConvertReport;
use crate::site::SiteReport;
use crate::types::RulesetEntry;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 rule`, `2 rules`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Show `path` relative to `root` when it lives under it.
fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Group entries by category, categories in first-seen order.
fn by_category(entries: &[RulesetEntry]) -> Vec<(&str, Vec<&RulesetEntry>)> {
    let mut groups: Vec<(&str, Vec<&RulesetEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(c, _)| *c == entry.category) {
            Some((_, members)) => members.push(entry),
            None => groups.push((entry.category.as_str(), vec![entry])),
        }
    }
    groups
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the rule-sets found by the walker, grouped by category.
pub fn format_scan_output(entries: &[RulesetEntry], rules_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let groups = by_category(entries);

    for (category, members) in &groups {
        lines.push(category.to_string());
        for (i, entry) in members.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(i + 1), entry.name));
            lines.push(format!(
                "{}Source: {}",
                indent(2),
                display_relative(&entry.source, rules_root)
            ));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Found {} in {}",
        count(entries.len(), "rule-set", "rule-sets"),
        count(groups.len(), "category", "categories")
    ));
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(entries: &[RulesetEntry], rules_root: &Path) {
    for line in format_scan_output(entries, rules_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Convert output
// ============================================================================

/// Format the pages written by the converter, in conversion order.
pub fn format_convert_output(report: &ConvertReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, page) in report.pages.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}) → {}",
            format_index(i + 1),
            page.entry.name,
            count(page.rule_count, "rule", "rules"),
            page.entry.page_href()
        ));
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Converted {}, {} → {}",
        count(report.pages.len(), "rule-set", "rule-sets"),
        count(report.rule_count(), "rule", "rules"),
        report.target_dir.display()
    ));
    lines
}

/// Print convert output to stdout.
pub fn print_convert_output(report: &ConvertReport) {
    for line in format_convert_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Site output
// ============================================================================

/// Format what the site stage wrote.
pub fn format_site_output(report: &SiteReport) -> Vec<String> {
    let mut lines = vec![format!("Merged → {}", report.merged.display())];
    if report.namespace_declarations_removed > 0 {
        lines.push(format!(
            "{}Namespace declarations removed: {}",
            indent(1),
            report.namespace_declarations_removed
        ));
    }
    lines.push(format!("Index → {}", report.index.display()));
    lines.push(format!(
        "Menu \"{}\" ({}) → {}",
        report.menu_name,
        count(report.menu_entries, "rule-set", "rule-sets"),
        report.descriptor.display()
    ));
    lines
}

/// Print site output to stdout.
pub fn print_site_output(report: &SiteReport) {
    for line in format_site_output(report) {
        println!("{}", line);
    }
}
