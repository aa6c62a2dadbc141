//! Per-file conversion: rule-set XML → documentation page.
//!
//! Stage 2 of the pipeline. For every scanned rule-set:
//!
//! 1. Compute the target page (`<target>/<category>/<name>.md`) and create
//!    its directory.
//! 2. Parse the file.
//! 3. For each `<rule>`, in document order: run the [`RuleAnalyzer`], then
//!    entity-escape the text of its `<example>` children and of the `<value>`
//!    children of its `xpath` property.
//! 4. Hand the mutated document to the [`Transformer`] with the
//!    `ruleset-to-docs` template.
//!
//! The document is dropped after the transform. Escaping happens exactly
//! once per node: the converter never re-reads its own output.

use crate::analyzer::{AnalyzeError, RuleAnalyzer};
use crate::config::DocsConfig;
use crate::naming;
use crate::scan::{RulesetFilter, ScanError, scan_rulesets};
use crate::transform::{Params, Template, TransformError, TransformSource, Transformer};
use crate::types::RulesetEntry;
use crate::xml::{Document, Element, XmlError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the rule property holding an XPath expression.
pub const XPATH_PROPERTY: &str = "xpath";

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ScanError),
    #[error("Cannot read rule-set {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: XmlError,
    },
    #[error("Rule analysis failed for {path}: {source}")]
    Analyze {
        path: PathBuf,
        #[source]
        source: AnalyzeError,
    },
    #[error("Transform failed for {path}: {source}")]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Escape markup in text: every `&` becomes `&amp;`, then every `<`
/// becomes `&lt;`. One pass; never apply twice to the same text.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

/// One converted rule-set.
#[derive(Debug, Clone)]
pub struct ConvertedPage {
    pub entry: RulesetEntry,
    /// Page written for the rule-set.
    pub target: PathBuf,
    /// Number of `<rule>` elements processed.
    pub rule_count: usize,
}

/// Result of converting every rule-set.
#[derive(Debug, Default)]
pub struct ConvertReport {
    pub target_dir: PathBuf,
    pub pages: Vec<ConvertedPage>,
}

impl ConvertReport {
    pub fn rule_count(&self) -> usize {
        self.pages.iter().map(|p| p.rule_count).sum()
    }

    /// The converted rule-sets, in conversion order.
    pub fn entries(&self) -> Vec<RulesetEntry> {
        self.pages.iter().map(|p| p.entry.clone()).collect()
    }
}

/// Converts rule-set files with a given transformer and analyzer.
pub struct RulesetConverter<'a> {
    config: &'a DocsConfig,
    transformer: &'a dyn Transformer,
    analyzer: &'a dyn RuleAnalyzer,
}

impl<'a> RulesetConverter<'a> {
    pub fn new(
        config: &'a DocsConfig,
        transformer: &'a dyn Transformer,
        analyzer: &'a dyn RuleAnalyzer,
    ) -> Self {
        Self {
            config,
            transformer,
            analyzer,
        }
    }

    /// Scan the rules directory and convert everything found.
    ///
    /// A missing or invalid rules directory fails before the target
    /// directory is created.
    pub fn convert_rulesets(&self) -> Result<ConvertReport, ConvertError> {
        let filter = RulesetFilter::new(&self.config.filter);
        let entries = scan_rulesets(&self.config.rules_dir, &filter)?;
        self.convert_entries(&entries)
    }

    /// Convert already-scanned rule-sets, in order.
    pub fn convert_entries(&self, entries: &[RulesetEntry]) -> Result<ConvertReport, ConvertError> {
        let target_dir = &self.config.target_dir;
        fs::create_dir_all(target_dir).map_err(|source| ConvertError::Io {
            path: target_dir.clone(),
            source,
        })?;
        info!(
            "converting {} rule-sets into {}",
            entries.len(),
            target_dir.display()
        );

        let mut report = ConvertReport {
            target_dir: target_dir.clone(),
            pages: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            let target = naming::target_page_path(target_dir, &entry.source);
            let rule_count = self.convert_file(&entry.source, &target)?;
            report.pages.push(ConvertedPage {
                entry: entry.clone(),
                target,
                rule_count,
            });
        }
        Ok(report)
    }

    /// Convert one rule-set file into `target`. Returns the number of rules.
    pub fn convert_file(&self, ruleset: &Path, target: &Path) -> Result<usize, ConvertError> {
        debug!("processing {}", ruleset.display());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ConvertError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut doc = Document::parse_file(ruleset).map_err(|source| ConvertError::Input {
            path: ruleset.to_path_buf(),
            source,
        })?;
        let rule_count =
            prepare_document(&mut doc, self.analyzer).map_err(|source| ConvertError::Analyze {
                path: ruleset.to_path_buf(),
                source,
            })?;

        debug!("writing {} ({rule_count} rules)", target.display());
        self.transformer
            .transform(
                TransformSource::Document(&doc),
                target,
                Template::RulesetToDocs,
                &Params::new(),
            )
            .map_err(|source| ConvertError::Transform {
                path: ruleset.to_path_buf(),
                source,
            })?;
        Ok(rule_count)
    }
}

/// Analyze and escape every `<rule>` in document order. Returns the number
/// of rules.
pub fn prepare_document(
    doc: &mut Document,
    analyzer: &dyn RuleAnalyzer,
) -> Result<usize, AnalyzeError> {
    let mut count = 0;
    doc.for_each_element_mut("rule", |rule| {
        count += 1;
        analyzer.analyze(rule)?;
        escape_rule(rule);
        Ok(())
    })?;
    Ok(count)
}

fn escape_rule(rule: &mut Element) {
    for example in rule.children_named_mut("example") {
        escape_text_content(example);
    }
    for properties in rule.children_named_mut("properties") {
        for property in properties.children_named_mut("property") {
            if property.attribute("name") != Some(XPATH_PROPERTY) {
                continue;
            }
            for value in property.children_named_mut("value") {
                escape_text_content(value);
            }
        }
    }
}

fn escape_text_content(element: &mut Element) {
    let escaped = escape_markup(&element.text_content());
    element.set_text_content(escaped);
}
