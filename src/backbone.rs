//! The backbone document: one `<rulesetfile>` per discovered rule-set.
//!
//! ```xml
//! <rulesets>
//!   <rulesetfile category="basic" name="Braces" source="/abs/rulesets/basic/Braces.xml" page="basic/Braces.md"/>
//!   ...
//! </rulesets>
//! ```
//!
//! Entries keep traversal order. The merge and menu templates take the
//! backbone as input, so both see the rule-sets in the same order as the
//! converted pages.

use crate::types::RulesetEntry;
use crate::xml::{Document, Element, XmlError};
use std::path::PathBuf;

pub const ROOT: &str = "rulesets";
pub const ENTRY: &str = "rulesetfile";

/// Build the backbone from scanned entries.
pub fn build(entries: &[RulesetEntry]) -> Document {
    let mut root = Element::new(ROOT);
    for entry in entries {
        root.push_element(
            Element::new(ENTRY)
                .with_attribute("category", entry.category.as_str())
                .with_attribute("name", entry.name.as_str())
                .with_attribute("source", entry.source.to_string_lossy())
                .with_attribute("page", entry.page_href()),
        );
    }
    Document::new(root)
}

/// Read the entries back out of a backbone document.
pub fn entries(backbone: &Document) -> Result<Vec<RulesetEntry>, XmlError> {
    if backbone.root.name != ROOT {
        return Err(XmlError::Malformed(format!(
            "expected <{ROOT}> backbone root, found <{}>",
            backbone.root.name
        )));
    }
    backbone
        .root
        .children_named(ENTRY)
        .map(|element| {
            let attr = |name: &str| {
                element.attribute(name).map(str::to_string).ok_or_else(|| {
                    XmlError::Malformed(format!("<{ENTRY}> without '{name}' attribute"))
                })
            };
            Ok(RulesetEntry {
                category: attr("category")?,
                name: attr("name")?,
                source: PathBuf::from(attr("source")?),
                page: PathBuf::from(attr("page")?),
            })
        })
        .collect()
}
