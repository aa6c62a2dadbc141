//! Rule analysis: augmenting a `<rule>` with facts the static file lacks.
//!
//! The [`RuleAnalyzer`] trait is called once per `<rule>` element, in
//! document order, before escaping and rendering. Implementations edit the
//! element in place.
//!
//! Two implementations ship:
//!
//! - [`NoopAnalyzer`] documents rules exactly as written.
//! - [`CatalogAnalyzer`] adds the properties a rule's implementation class
//!   declares at runtime, read from TOML property catalogs:
//!
//! ```toml
//! [[rule]]
//! class = "net.sourceforge.pmd.lang.java.rule.design.EmptyCatchBlockRule"
//!
//! [[rule.property]]
//! name = "allowCommentedBlocks"
//! type = "Boolean"
//! description = "Empty blocks containing comments will be skipped"
//! default = "false"
//! ```
//!
//! A rule whose `class` attribute matches a catalog entry gets one
//! `<property name=".." type=".." description=".." value=".."/>` per catalog
//! property it does not already declare, inside its `<properties>` element
//! (created when missing). Properties declared in the rule-set file win.

use crate::config::AnalyzerConfig;
use crate::xml::Element;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Cannot read property catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid property catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Inspects and augments a single `<rule>` element.
pub trait RuleAnalyzer {
    fn analyze(&self, rule: &mut Element) -> Result<(), AnalyzeError>;
}

/// Leaves every rule untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalyzer;

impl RuleAnalyzer for NoopAnalyzer {
    fn analyze(&self, _rule: &mut Element) -> Result<(), AnalyzeError> {
        Ok(())
    }
}

/// One property a rule class declares.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogProperty {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogRule {
    class: String,
    #[serde(default, rename = "property")]
    properties: Vec<CatalogProperty>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default, rename = "rule")]
    rules: Vec<CatalogRule>,
}

/// Adds runtime-declared properties from TOML catalogs.
#[derive(Debug, Default, Clone)]
pub struct CatalogAnalyzer {
    classes: HashMap<String, Vec<CatalogProperty>>,
}

impl CatalogAnalyzer {
    /// Load and combine catalogs. A class listed in several catalogs keeps
    /// the first definition of each property name.
    pub fn load(paths: &[PathBuf]) -> Result<Self, AnalyzeError> {
        let mut analyzer = Self::default();
        for path in paths {
            let content = fs::read_to_string(path).map_err(|source| AnalyzeError::Io {
                path: path.clone(),
                source,
            })?;
            analyzer.add_catalog(&content, path)?;
        }
        Ok(analyzer)
    }

    fn add_catalog(&mut self, content: &str, path: &Path) -> Result<(), AnalyzeError> {
        let catalog: CatalogFile = toml::from_str(content).map_err(|source| AnalyzeError::Catalog {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "loaded {} rule classes from {}",
            catalog.rules.len(),
            path.display()
        );
        for rule in catalog.rules {
            let known = self.classes.entry(rule.class).or_default();
            for property in rule.properties {
                if !known.iter().any(|p| p.name == property.name) {
                    known.push(property);
                }
            }
        }
        Ok(())
    }

    /// Number of rule classes known.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Properties known for a rule class.
    pub fn properties_of(&self, class: &str) -> &[CatalogProperty] {
        self.classes.get(class).map(Vec::as_slice).unwrap_or_default()
    }
}

impl RuleAnalyzer for CatalogAnalyzer {
    fn analyze(&self, rule: &mut Element) -> Result<(), AnalyzeError> {
        let Some(class) = rule.attribute("class") else {
            return Ok(());
        };
        let known = self.properties_of(class);
        if known.is_empty() {
            return Ok(());
        }

        let declared: HashSet<String> = rule
            .children_named("properties")
            .flat_map(|properties| properties.children_named("property"))
            .filter_map(|property| property.attribute("name").map(str::to_string))
            .collect();
        let missing: Vec<&CatalogProperty> = known
            .iter()
            .filter(|property| !declared.contains(&property.name))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        debug!(
            "rule {}: adding {} runtime properties",
            rule.attribute("name").unwrap_or("?"),
            missing.len()
        );
        let properties = rule.child_or_insert("properties");
        for property in missing {
            properties.push_element(property_element(property));
        }
        Ok(())
    }
}

fn property_element(property: &CatalogProperty) -> Element {
    let mut element = Element::new("property").with_attribute("name", property.name.as_str());
    if let Some(kind) = &property.kind {
        element.set_attribute("type", kind.as_str());
    }
    if let Some(description) = &property.description {
        element.set_attribute("description", description.as_str());
    }
    if let Some(default) = &property.default {
        element.set_attribute("value", default.as_str());
    }
    element
}

/// Build the analyzer selected by config: a catalog analyzer when catalogs
/// are configured, otherwise the no-op analyzer.
pub fn from_config(config: &AnalyzerConfig) -> Result<Box<dyn RuleAnalyzer>, AnalyzeError> {
    if config.property_catalogs.is_empty() {
        return Ok(Box::new(NoopAnalyzer));
    }
    Ok(Box::new(CatalogAnalyzer::load(&config.property_catalogs)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Document;
    use tempfile::TempDir;

    const CATALOG: &str = r#"
[[rule]]
class = "x.EmptyCatch"

[[rule.property]]
name = "allowCommentedBlocks"
type = "Boolean"
description = "Skip commented blocks"
default = "false"

[[rule.property]]
name = "allowExceptionNameRegex"
type = "Regex"
default = "^ignored$"
"#;

    fn analyzer() -> CatalogAnalyzer {
        let mut analyzer = CatalogAnalyzer::default();
        analyzer.add_catalog(CATALOG, Path::new("test.toml")).unwrap();
        analyzer
    }

    fn property_names(rule: &Element) -> Vec<String> {
        rule.children_named("properties")
            .flat_map(|p| p.children_named("property"))
            .map(|p| p.attribute("name").unwrap().to_string())
            .collect()
    }

    #[test]
    fn noop_leaves_rule_untouched() {
        let mut doc = Document::parse_str(r#"<rule name="A" class="x.EmptyCatch"/>"#).unwrap();
        let before = doc.clone();
        NoopAnalyzer.analyze(&mut doc.root).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn adds_missing_properties_in_catalog_order() {
        let mut doc = Document::parse_str(r#"<rule name="A" class="x.EmptyCatch"/>"#).unwrap();
        analyzer().analyze(&mut doc.root).unwrap();
        assert_eq!(
            property_names(&doc.root),
            vec!["allowCommentedBlocks", "allowExceptionNameRegex"]
        );
        let added = doc.root.child("properties").unwrap().child("property").unwrap();
        assert_eq!(added.attribute("type"), Some("Boolean"));
        assert_eq!(added.attribute("description"), Some("Skip commented blocks"));
        assert_eq!(added.attribute("value"), Some("false"));
    }

    #[test]
    fn declared_properties_win() {
        let mut doc = Document::parse_str(
            r#"<rule name="A" class="x.EmptyCatch"><properties><property name="allowCommentedBlocks" value="true"/></properties></rule>"#,
        )
        .unwrap();
        analyzer().analyze(&mut doc.root).unwrap();

        assert_eq!(doc.root.children_named("properties").count(), 1);
        assert_eq!(
            property_names(&doc.root),
            vec!["allowCommentedBlocks", "allowExceptionNameRegex"]
        );
        let first = doc.root.child("properties").unwrap().child("property").unwrap();
        assert_eq!(first.attribute("value"), Some("true"));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let mut doc = Document::parse_str(r#"<rule class="x.EmptyCatch"/>"#).unwrap();
        analyzer().analyze(&mut doc.root).unwrap();
        let regex = doc
            .root
            .child("properties")
            .unwrap()
            .children_named("property")
            .nth(1)
            .unwrap();
        assert_eq!(regex.attribute("description"), None);
    }

    #[test]
    fn unknown_class_untouched() {
        let mut doc = Document::parse_str(r#"<rule name="A" class="y.Other"/>"#).unwrap();
        let before = doc.clone();
        analyzer().analyze(&mut doc.root).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn rule_without_class_untouched() {
        let mut doc = Document::parse_str(r#"<rule ref="rulesets/basic.xml/A"/>"#).unwrap();
        let before = doc.clone();
        analyzer().analyze(&mut doc.root).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn later_catalogs_extend_earlier_ones() {
        let mut analyzer = analyzer();
        analyzer
            .add_catalog(
                r#"
[[rule]]
class = "x.EmptyCatch"

[[rule.property]]
name = "allowCommentedBlocks"
default = "true"

[[rule.property]]
name = "extra"
"#,
                Path::new("second.toml"),
            )
            .unwrap();
        let names: Vec<&str> = analyzer
            .properties_of("x.EmptyCatch")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["allowCommentedBlocks", "allowExceptionNameRegex", "extra"]);
        assert_eq!(
            analyzer.properties_of("x.EmptyCatch")[0].default.as_deref(),
            Some("false")
        );
    }

    #[test]
    fn load_reads_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("catalog.toml");
        fs::write(&path, CATALOG).unwrap();
        let analyzer = CatalogAnalyzer::load(&[path]).unwrap();
        assert_eq!(analyzer.len(), 1);
    }

    #[test]
    fn load_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.toml");
        let err = CatalogAnalyzer::load(&[missing.clone()]).unwrap_err();
        assert!(matches!(err, AnalyzeError::Io { path, .. } if path == missing));
    }

    #[test]
    fn unknown_catalog_key_is_error() {
        let mut analyzer = CatalogAnalyzer::default();
        let err = analyzer
            .add_catalog("[[rule]]\nclass = \"a\"\nclas = \"typo\"", Path::new("bad.toml"))
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::Catalog { .. }));
    }

    #[test]
    fn from_config_without_catalogs_is_noop() {
        let analyzer = from_config(&AnalyzerConfig::default()).unwrap();
        let mut doc = Document::parse_str(r#"<rule class="x.EmptyCatch"/>"#).unwrap();
        analyzer.analyze(&mut doc.root).unwrap();
        assert!(doc.root.children.is_empty());
    }
}
