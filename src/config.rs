//! Run configuration.
//!
//! Handles loading, validating, and layering `ruleset-docs.toml`. Three layers
//! are merged, each overriding the one before:
//!
//! ```text
//! stock defaults  →  ruleset-docs.toml  →  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! rules_dir = "rulesets"                       # Root of the rule-set tree
//! target_dir = "target/generated-site/rules"   # Where pages and the index go
//! index_filename = "index.md"                  # Index page, inside target_dir
//! merged_ruleset_filename = "mergedruleset.xml" # Merged file, next to target_dir
//! namespace = "http://pmd.sourceforge.net/ruleset/2.0.0"
//!
//! [filter]
//! extension = "xml"
//! exclude_files = []
//! exclude_dirs = [".svn", ".git"]
//!
//! [site]
//! descriptor = "src/site/site.pre.xml"
//! descriptor_target = "src/site/site.xml"
//! menu_name = "Rule Sets"
//! href_prefix = "rules"
//! page_extension = "html"
//!
//! [transform]
//! engine = "native"          # or "xsltproc"
//! templates_dir = "etc/xslt"
//! command = "xsltproc"
//!
//! [analyzer]
//! property_catalogs = []
//! ```
//!
//! Unknown keys are rejected to catch typos early. Relative paths are resolved
//! against the working directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default file name looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ruleset-docs.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocsConfig {
    /// Root directory of the rule-set tree.
    pub rules_dir: PathBuf,
    /// Directory receiving converted pages and the index.
    pub target_dir: PathBuf,
    /// File name of the index page, written inside `target_dir`.
    pub index_filename: String,
    /// File name of the merged rule-set, written in the parent of `target_dir`.
    pub merged_ruleset_filename: String,
    /// Rule-set namespace whose `xmlns="..."` declaration is stripped from the merged file.
    pub namespace: String,
    /// Which files count as rule-sets.
    pub filter: FilterConfig,
    /// Site descriptor and menu settings.
    pub site: SiteConfig,
    /// Transform engine selection.
    pub transform: TransformConfig,
    /// Rule analyzer settings.
    pub analyzer: AnalyzerConfig,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("rulesets"),
            target_dir: PathBuf::from("target/generated-site/rules"),
            index_filename: "index.md".to_string(),
            merged_ruleset_filename: "mergedruleset.xml".to_string(),
            namespace: "http://pmd.sourceforge.net/ruleset/2.0.0".to_string(),
            filter: FilterConfig::default(),
            site: SiteConfig::default(),
            transform: TransformConfig::default(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl DocsConfig {
    /// Validate values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("index_filename", &self.index_filename),
            ("merged_ruleset_filename", &self.merged_ruleset_filename),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a plain file name, got '{value}'"
                )));
            }
        }
        if self.filter.extension.trim().is_empty() {
            return Err(ConfigError::Validation(
                "filter.extension must not be empty".into(),
            ));
        }
        if self.filter.extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "filter.extension is written without the leading dot".into(),
            ));
        }
        if self.site.menu_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.menu_name must not be empty".into(),
            ));
        }
        if self.transform.engine == Engine::Xsltproc && self.transform.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "transform.command must not be empty for the xsltproc engine".into(),
            ));
        }
        Ok(())
    }

    /// Where the merged rule-set is written: next to `target_dir`.
    pub fn merged_ruleset_path(&self) -> PathBuf {
        let parent = self
            .target_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        parent.join(&self.merged_ruleset_filename)
    }

    /// Where the index page is written: inside `target_dir`.
    pub fn index_path(&self) -> PathBuf {
        self.target_dir.join(&self.index_filename)
    }
}

/// Which files count as rule-set files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Extension of rule-set files, without the dot. Matched case-insensitively.
    pub extension: String,
    /// File names skipped even when the extension matches.
    pub exclude_files: Vec<String>,
    /// Directory names the walker never descends into.
    pub exclude_dirs: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            extension: "xml".to_string(),
            exclude_files: Vec::new(),
            exclude_dirs: vec![".svn".to_string(), ".git".to_string()],
        }
    }
}

/// Site descriptor and menu settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site descriptor the menu is added to (left untouched).
    pub descriptor: PathBuf,
    /// Where the updated descriptor is written, overwriting any existing file.
    pub descriptor_target: PathBuf,
    /// `name` of the generated `<menu>`; an existing menu with this name is replaced.
    pub menu_name: String,
    /// Prefix of menu links, relative to the site root.
    pub href_prefix: String,
    /// Extension the site renders pages to (menu links point at rendered pages).
    pub page_extension: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            descriptor: PathBuf::from("src/site/site.pre.xml"),
            descriptor_target: PathBuf::from("src/site/site.xml"),
            menu_name: "Rule Sets".to_string(),
            href_prefix: "rules".to_string(),
            page_extension: "html".to_string(),
        }
    }
}

/// Transform engine used for every templated step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Built-in renderers.
    Native,
    /// External `xsltproc` with templates from `templates_dir`.
    Xsltproc,
}

/// Transform engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    pub engine: Engine,
    /// Directory holding `<template>.xsl` files (xsltproc engine only).
    pub templates_dir: PathBuf,
    /// Executable invoked by the xsltproc engine.
    pub command: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Native,
            templates_dir: PathBuf::from("etc/xslt"),
            command: "xsltproc".to_string(),
        }
    }
}

/// Rule analyzer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// TOML property catalogs describing properties rules declare at runtime.
    /// Empty means rules are documented exactly as written.
    pub property_catalogs: Vec<PathBuf>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user files and flags are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(DocsConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<DocsConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: DocsConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file (stock defaults when it does not exist).
pub fn load_config(path: &Path) -> Result<DocsConfig, ConfigError> {
    load_config_with(path, None)
}

/// Load config from a file and apply a final overlay (typically CLI flags).
pub fn load_config_with(
    path: &Path,
    overrides: Option<toml::Value>,
) -> Result<DocsConfig, ConfigError> {
    let base = stock_defaults_value();
    let file = load_raw_config(path)?;
    resolve_config(base, file.into_iter().chain(overrides))
}

/// Build the overlay for path flags given on the command line.
///
/// Returns `None` when no flag was given so callers can skip the layer.
pub fn path_overrides(
    rules_dir: Option<&Path>,
    target_dir: Option<&Path>,
) -> Option<toml::Value> {
    let mut table = toml::map::Map::new();
    if let Some(dir) = rules_dir {
        table.insert(
            "rules_dir".to_string(),
            toml::Value::String(dir.to_string_lossy().into_owned()),
        );
    }
    if let Some(dir) = target_dir {
        table.insert(
            "target_dir".to_string(),
            toml::Value::String(dir.to_string_lossy().into_owned()),
        );
    }
    (!table.is_empty()).then_some(toml::Value::Table(table))
}

/// Returns a fully-commented stock `ruleset-docs.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# ruleset-docs configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
# Relative paths are resolved against the working directory.

# Root of the rule-set tree. Every sub-directory is searched.
rules_dir = "rulesets"

# Converted pages land in <target_dir>/<directory>/<file stem>.md.
target_dir = "target/generated-site/rules"

# Index page generated from the merged rule-set, inside target_dir.
index_filename = "index.md"

# All rule-sets merged into one file, written next to target_dir.
merged_ruleset_filename = "mergedruleset.xml"

# The xmlns="..." declaration for this namespace is removed from the merged file.
namespace = "http://pmd.sourceforge.net/ruleset/2.0.0"

# ---------------------------------------------------------------------------
# Rule-set file filter
# ---------------------------------------------------------------------------
[filter]
# Extension of rule-set files, without the dot (case-insensitive).
extension = "xml"

# File names skipped even when the extension matches.
exclude_files = []

# Directory names never descended into.
exclude_dirs = [".svn", ".git"]

# ---------------------------------------------------------------------------
# Site descriptor
# ---------------------------------------------------------------------------
[site]
# Descriptor the generated menu is added to. Not modified.
descriptor = "src/site/site.pre.xml"

# Where the updated descriptor is written (overwritten).
descriptor_target = "src/site/site.xml"

# Name of the generated <menu>. An existing menu with this name is replaced.
menu_name = "Rule Sets"

# Menu links: <href_prefix>/<directory>/<file stem>.<page_extension>
href_prefix = "rules"
page_extension = "html"

# ---------------------------------------------------------------------------
# Transform engine
# ---------------------------------------------------------------------------
[transform]
# "native" renders with the built-in templates.
# "xsltproc" runs <command> with <templates_dir>/<template>.xsl for each of:
#   ruleset-to-docs, merge-ruleset, generate-index,
#   create-ruleset-menu, add-to-site-descriptor
engine = "native"
templates_dir = "etc/xslt"
command = "xsltproc"

# ---------------------------------------------------------------------------
# Rule analyzer
# ---------------------------------------------------------------------------
[analyzer]
# TOML catalogs of properties that rule classes declare at runtime.
# Matching rules get the missing <property> entries added before rendering.
property_catalogs = []
"##
}
