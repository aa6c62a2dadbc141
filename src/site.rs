//! Site stage: merged rule-set, index page and site menu.
//!
//! Stage 3 of the pipeline, run after every page is converted:
//!
//! 1. Build the backbone from the scanned entries.
//! 2. `merge-ruleset`: backbone → `<target parent>/<merged_ruleset_filename>`,
//!    then strip every literal `xmlns="<namespace>"` from the written file.
//! 3. `generate-index`: merged file → `<target>/<index_filename>`.
//! 4. `create-ruleset-menu`: backbone → temp file `menu*.xml`.
//! 5. `add-to-site-descriptor`: site descriptor → temp file `site*.xml`, with
//!    `menufile` set to the absolute path of the menu temp file.
//! 6. Copy the updated descriptor over `site.descriptor_target`.
//!
//! Both temp files are [`NamedTempFile`]s and are deleted when this stage
//! returns, whether it succeeded or not.

use crate::backbone;
use crate::config::DocsConfig;
use crate::scan::{RulesetFilter, ScanError, scan_rulesets};
use crate::transform::menu::{MenuOptions, PARAM_MENUFILE};
use crate::transform::{Params, Template, TransformError, TransformSource, Transformer};
use crate::types::RulesetEntry;
use crate::xml::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ScanError),
    #[error("Template {template} failed: {source}")]
    Transform {
        template: Template,
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

/// What the site stage wrote.
#[derive(Debug, Clone)]
pub struct SiteReport {
    pub merged: PathBuf,
    /// Namespace declarations stripped from the merged file.
    pub namespace_declarations_removed: usize,
    pub index: PathBuf,
    pub descriptor: PathBuf,
    pub menu_name: String,
    /// Rule-sets listed in the menu.
    pub menu_entries: usize,
}

pub struct SiteGenerator<'a> {
    config: &'a DocsConfig,
    transformer: &'a dyn Transformer,
}

impl<'a> SiteGenerator<'a> {
    pub fn new(config: &'a DocsConfig, transformer: &'a dyn Transformer) -> Self {
        Self {
            config,
            transformer,
        }
    }

    /// Scan the rules directory and run the site stage on the result.
    pub fn run(&self) -> Result<SiteReport, SiteError> {
        let filter = RulesetFilter::new(&self.config.filter);
        let entries = scan_rulesets(&self.config.rules_dir, &filter)?;
        self.generate(&entries)
    }

    /// Run the site stage for already-scanned entries.
    pub fn generate(&self, entries: &[RulesetEntry]) -> Result<SiteReport, SiteError> {
        let backbone = backbone::build(entries);
        debug!("backbone:\n{}", backbone.to_xml_string());

        let (merged, removed) = self.create_merged_file(&backbone)?;
        let index = self.create_index(&merged)?;
        let descriptor = self.add_rulesets_to_site(&backbone)?;

        Ok(SiteReport {
            merged,
            namespace_declarations_removed: removed,
            index,
            descriptor,
            menu_name: self.config.site.menu_name.clone(),
            menu_entries: entries.len(),
        })
    }

    fn create_merged_file(&self, backbone: &Document) -> Result<(PathBuf, usize), SiteError> {
        let merged = self.config.merged_ruleset_path();
        info!("creating merged rule-set {}", merged.display());
        create_parent(&merged)?;
        self.apply(
            TransformSource::Document(backbone),
            &merged,
            Template::MergeRuleset,
            &Params::new(),
        )?;

        let needle = format!("xmlns=\"{}\"", self.config.namespace);
        let removed = strip_literal(&merged, &needle).map_err(|source| SiteError::Io {
            path: merged.clone(),
            source,
        })?;
        debug!("removed {removed} namespace declarations from {}", merged.display());
        Ok((merged, removed))
    }

    fn create_index(&self, merged: &Path) -> Result<PathBuf, SiteError> {
        let index = self.config.index_path();
        info!("generating index {}", index.display());
        create_parent(&index)?;
        self.apply(
            TransformSource::File(merged),
            &index,
            Template::GenerateIndex,
            &Params::new(),
        )?;
        Ok(index)
    }

    fn add_rulesets_to_site(&self, backbone: &Document) -> Result<PathBuf, SiteError> {
        let site = &self.config.site;
        info!("adding menu '{}' to {}", site.menu_name, site.descriptor.display());

        let menu_file = scratch_file("menu")?;
        debug!("menu file: {}", menu_file.path().display());
        let options = MenuOptions {
            menu_name: site.menu_name.clone(),
            href_prefix: site.href_prefix.clone(),
            page_extension: site.page_extension.clone(),
        };
        self.apply(
            TransformSource::Document(backbone),
            menu_file.path(),
            Template::CreateRulesetMenu,
            &options.to_params(),
        )?;

        let site_file = scratch_file("site")?;
        debug!("site file: {}", site_file.path().display());
        let menufile = std::path::absolute(menu_file.path()).map_err(|source| SiteError::Io {
            path: menu_file.path().to_path_buf(),
            source,
        })?;
        let params = Params::from([(
            PARAM_MENUFILE.to_string(),
            menufile.to_string_lossy().into_owned(),
        )]);
        self.apply(
            TransformSource::File(&site.descriptor),
            site_file.path(),
            Template::AddToSiteDescriptor,
            &params,
        )?;

        create_parent(&site.descriptor_target)?;
        fs::copy(site_file.path(), &site.descriptor_target).map_err(|source| SiteError::Io {
            path: site.descriptor_target.clone(),
            source,
        })?;
        Ok(site.descriptor_target.clone())
    }

    fn apply(
        &self,
        source: TransformSource<'_>,
        target: &Path,
        template: Template,
        params: &Params,
    ) -> Result<(), SiteError> {
        self.transformer
            .transform(source, target, template, params)
            .map_err(|source| SiteError::Transform { template, source })
    }
}

/// Remove every occurrence of `needle` from the file at `path`, returning
/// how many were removed. The file is only rewritten when something matched.
pub fn strip_literal(path: &Path, needle: &str) -> std::io::Result<usize> {
    let content = fs::read_to_string(path)?;
    let count = content.matches(needle).count();
    if count > 0 {
        fs::write(path, content.replace(needle, ""))?;
    }
    Ok(count)
}

fn scratch_file(prefix: &str) -> Result<NamedTempFile, SiteError> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".xml")
        .tempfile()
        .map_err(|source| SiteError::Io {
            path: std::env::temp_dir(),
            source,
        })
}

fn create_parent(path: &Path) -> Result<(), SiteError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| SiteError::Io {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}
