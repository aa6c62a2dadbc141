//! Full build: convert every rule-set, then run the site stage.
//!
//! ```text
//! scan → convert (per file) → merge → index → menu
//! ```
//!
//! The rules directory is scanned once; the site stage reuses the converted
//! entries. The first error aborts the build.

use crate::analyzer::{self, AnalyzeError, RuleAnalyzer};
use crate::config::DocsConfig;
use crate::convert::{ConvertError, ConvertReport, RulesetConverter};
use crate::site::{SiteError, SiteGenerator, SiteReport};
use crate::transform::{self, Transformer};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error(transparent)]
    Analyzer(#[from] AnalyzeError),
}

/// The transformer and analyzer selected by config.
pub struct Engines {
    pub transformer: Box<dyn Transformer>,
    pub analyzer: Box<dyn RuleAnalyzer>,
}

impl Engines {
    pub fn from_config(config: &DocsConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            transformer: transform::from_config(&config.transform),
            analyzer: analyzer::from_config(&config.analyzer)?,
        })
    }
}

#[derive(Debug)]
pub struct BuildReport {
    pub convert: ConvertReport,
    pub site: SiteReport,
}

pub fn build(
    config: &DocsConfig,
    transformer: &dyn Transformer,
    analyzer: &dyn RuleAnalyzer,
) -> Result<BuildReport, PipelineError> {
    info!("converting rule-sets from {}", config.rules_dir.display());
    let convert = RulesetConverter::new(config, transformer, analyzer).convert_rulesets()?;

    let entries = convert.entries();
    let site = SiteGenerator::new(config, transformer).generate(&entries)?;
    Ok(BuildReport { convert, site })
}
