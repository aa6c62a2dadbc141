//! Centralized naming for generated pages and links.
//!
//! Every rule-set file is addressed by two names: its *category* (the name of
//! the directory holding it) and its *name* (the file stem). The converted
//! page mirrors that pair one level deep:
//!
//! - `rulesets/basic/EmptyRules.xml` → `<target>/basic/EmptyRules.md`
//! - `rulesets/java/strings/Strings.xml` → `<target>/strings/Strings.md`
//!
//! Two files with the same stem in different directories never collide
//! (`a/Foo.xml`, `b/Foo.xml` → `a/Foo.md`, `b/Foo.md`). Two files with the
//! same stem in same-named directories at different depths do; the walker
//! warns when that happens.

use std::path::{Component, Path, PathBuf};

/// Extension of generated documentation pages.
pub const PAGE_EXTENSION: &str = "md";

/// Category of a rule-set file: the name of its parent directory.
///
/// Falls back to an empty string for paths without a named parent
/// (`/Foo.xml`); the walker canonicalizes paths so this does not happen in
/// practice.
pub fn category_of(ruleset: &Path) -> String {
    ruleset
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File stem of a rule-set file.
pub fn name_of(ruleset: &Path) -> String {
    ruleset
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Page path relative to the target root: `<category>/<name>.md`.
pub fn relative_page_path(ruleset: &Path) -> PathBuf {
    Path::new(&category_of(ruleset)).join(format!("{}.{}", name_of(ruleset), PAGE_EXTENSION))
}

/// Absolute page path for a rule-set file under `target_root`.
pub fn target_page_path(target_root: &Path, ruleset: &Path) -> PathBuf {
    target_root.join(relative_page_path(ruleset))
}

/// Render a relative path as a `/`-separated link.
pub fn href(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Markdown heading anchor for a rule name: lowercase, spaces become dashes,
/// anything else that is not alphanumeric, `-` or `_` is dropped.
///
/// - `EmptyCatchBlock` → `emptycatchblock`
/// - `Avoid Using Hard Coded IP` → `avoid-using-hard-coded-ip`
pub fn anchor(rule_name: &str) -> String {
    rule_name
        .trim()
        .chars()
        .flat_map(|c| match c {
            ' ' => vec!['-'],
            c if c.is_alphanumeric() || c == '-' || c == '_' => c.to_lowercase().collect(),
            _ => Vec::new(),
        })
        .collect()
}
