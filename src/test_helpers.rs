//! Shared test utilities for the ruleset-docs test suite.
//!
//! Provides rule-set builders, fixture setup, and lookup helpers that panic
//! with a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = fixture_config(tmp.path());
//!
//! write_ruleset(tmp.path(), "rulesets/extra/More.xml", &[r#"<rule name="X"/>"#]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::DocsConfig;
use crate::convert::{ConvertReport, ConvertedPage};

/// Namespace used by every generated test rule-set.
pub const NAMESPACE: &str = "http://pmd.sourceforge.net/ruleset/2.0.0";

// =========================================================================
// Rule-set builders
// =========================================================================

/// A complete rule-set document named `name` wrapping the given `<rule>` fragments.
pub fn ruleset_xml(name: &str, rules: &[&str]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\"?>\n<ruleset name=\"{name}\" xmlns=\"{NAMESPACE}\">\n  <description>{name} rules</description>\n"
    );
    for rule in rules {
        xml.push_str("  ");
        xml.push_str(rule);
        xml.push('\n');
    }
    xml.push_str("</ruleset>\n");
    xml
}

/// Write a rule-set at `root/relative`, creating parent directories.
///
/// The rule-set name is the file stem.
pub fn write_ruleset(root: &Path, relative: &str, rules: &[&str]) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let name = path.file_stem().unwrap().to_string_lossy().into_owned();
    fs::write(&path, ruleset_xml(&name, rules)).unwrap();
    path
}

/// Read a file to a string, panicking with the path on failure.
pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Config whose paths all live under `root`, matching the fixture layout.
pub fn fixture_config(root: &Path) -> DocsConfig {
    let mut config = DocsConfig {
        rules_dir: root.join("rulesets"),
        target_dir: root.join("target/site/rules"),
        ..DocsConfig::default()
    };
    config.site.descriptor = root.join("site/site.pre.xml");
    config.site.descriptor_target = root.join("site/site.xml");
    config
}

// =========================================================================
// Report lookups
// =========================================================================

/// Find a converted page by rule-set name. Panics if not found.
pub fn find_page<'a>(report: &'a ConvertReport, name: &str) -> &'a ConvertedPage {
    report
        .pages
        .iter()
        .find(|p| p.entry.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = report.pages.iter().map(|p| p.entry.name.as_str()).collect();
            panic!("page '{name}' not found. Available: {names:?}")
        })
}

/// Relative page hrefs in report order.
pub fn page_hrefs(report: &ConvertReport) -> Vec<String> {
    report.pages.iter().map(|p| p.entry.page_href()).collect()
}
