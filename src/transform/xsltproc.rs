//! External XSLT engine.
//!
//! Runs `xsltproc` (or any command taking the same arguments) once per
//! transform:
//!
//! ```text
//! xsltproc [--stringparam <key> <value>]... -o <target> <templates_dir>/<template>.xsl <source>
//! ```
//!
//! Document sources are serialized to a scratch file first; the scratch file
//! is removed when the call returns.

use super::backend::{Params, Template, TransformError, TransformSource, Transformer};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct XsltprocTransformer {
    command: String,
    templates_dir: PathBuf,
}

impl XsltprocTransformer {
    pub fn new(command: impl Into<String>, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            templates_dir: templates_dir.into(),
        }
    }

    pub fn template_path(&self, template: Template) -> PathBuf {
        self.templates_dir.join(format!("{}.xsl", template.name()))
    }

    /// Command-line arguments for one transform.
    pub fn command_args(
        &self,
        stylesheet: &Path,
        source: &Path,
        target: &Path,
        params: &Params,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        for (key, value) in params {
            args.push("--stringparam".into());
            args.push(key.into());
            args.push(value.into());
        }
        args.push("-o".into());
        args.push(target.into());
        args.push(stylesheet.into());
        args.push(source.into());
        args
    }
}

impl Transformer for XsltprocTransformer {
    fn transform(
        &self,
        source: TransformSource<'_>,
        target: &Path,
        template: Template,
        params: &Params,
    ) -> Result<(), TransformError> {
        let stylesheet = self.template_path(template);
        if !stylesheet.is_file() {
            return Err(TransformError::TemplateNotFound(stylesheet));
        }

        let scratch;
        let source_path = match source {
            TransformSource::File(path) => path,
            TransformSource::Document(doc) => {
                scratch = tempfile::Builder::new()
                    .prefix("ruleset-docs")
                    .suffix(".xml")
                    .tempfile()?;
                doc.write_to(scratch.path())?;
                scratch.path()
            }
        };

        let args = self.command_args(&stylesheet, source_path, target, params);
        debug!("{template}: {} {:?}", self.command, args);
        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|source| TransformError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransformError::Engine {
                template,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
