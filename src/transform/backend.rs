//! Transform trait and shared types.
//!
//! The [`Transformer`] trait is the one seam between the pipeline and the
//! engine that turns XML into pages, indexes and menus. A transform reads a
//! source (an in-memory [`Document`] or a file), applies a named
//! [`Template`] with string parameters, and writes the result to a target
//! path. Whatever the target held before is replaced.
//!
//! Engines:
//! - [`NativeTransformer`](super::native::NativeTransformer): built-in
//!   renderers, no external tools.
//! - [`XsltprocTransformer`](super::xsltproc::XsltprocTransformer): runs an
//!   external XSLT processor over `<templates_dir>/<template>.xsl`.

use crate::xml::{Document, XmlError};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
    #[error("Template {template} requires parameter '{name}'")]
    MissingParameter { template: Template, name: String },
    #[error("Template file not found: {0}")]
    TemplateNotFound(PathBuf),
    #[error("Template {template} failed ({status}): {stderr}")]
    Engine {
        template: Template,
        status: String,
        stderr: String,
    },
    #[error("Cannot run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// The templates the pipeline applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// One rule-set document → one documentation page.
    RulesetToDocs,
    /// Backbone → merged rule-set.
    MergeRuleset,
    /// Merged rule-set → index page.
    GenerateIndex,
    /// Backbone → site menu fragment.
    CreateRulesetMenu,
    /// Site descriptor + menu fragment (`menufile`) → updated descriptor.
    AddToSiteDescriptor,
}

impl Template {
    pub const ALL: [Template; 5] = [
        Template::RulesetToDocs,
        Template::MergeRuleset,
        Template::GenerateIndex,
        Template::CreateRulesetMenu,
        Template::AddToSiteDescriptor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Template::RulesetToDocs => "ruleset-to-docs",
            Template::MergeRuleset => "merge-ruleset",
            Template::GenerateIndex => "generate-index",
            Template::CreateRulesetMenu => "create-ruleset-menu",
            Template::AddToSiteDescriptor => "add-to-site-descriptor",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input of a transform.
#[derive(Debug, Clone, Copy)]
pub enum TransformSource<'a> {
    Document(&'a Document),
    File(&'a Path),
}

impl<'a> TransformSource<'a> {
    /// The source as a document, parsing it when it is a file.
    pub fn load(self) -> Result<Cow<'a, Document>, XmlError> {
        match self {
            TransformSource::Document(doc) => Ok(Cow::Borrowed(doc)),
            TransformSource::File(path) => Document::parse_file(path).map(Cow::Owned),
        }
    }
}

/// Template parameters, passed in key order.
pub type Params = BTreeMap<String, String>;

/// A template engine.
pub trait Transformer {
    /// Apply `template` to `source` and write the result to `target`,
    /// replacing its previous contents.
    fn transform(
        &self,
        source: TransformSource<'_>,
        target: &Path,
        template: Template,
        params: &Params,
    ) -> Result<(), TransformError>;
}

/// Look up a required parameter.
pub fn required_param<'p>(
    params: &'p Params,
    template: Template,
    name: &str,
) -> Result<&'p str, TransformError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| TransformError::MissingParameter {
            template,
            name: name.to_string(),
        })
}
