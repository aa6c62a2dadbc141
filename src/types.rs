//! Shared types passed between the scan, convert and site stages.
//!
//! [`RulesetEntry`] is also what `ruleset-docs scan --json` prints, so it
//! serializes to a stable JSON shape.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A rule-set file found by the directory walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetEntry {
    /// Name of the directory holding the file (`basic` for `rulesets/basic/Empty.xml`).
    pub category: String,
    /// File stem (`Empty` for `rulesets/basic/Empty.xml`).
    pub name: String,
    /// Absolute path of the rule-set file.
    pub source: PathBuf,
    /// Page path relative to the target root (`basic/Empty.md`).
    pub page: PathBuf,
}

impl RulesetEntry {
    /// Page path with `/` separators, as used in links.
    pub fn page_href(&self) -> String {
        crate::naming::href(&self.page)
    }
}
