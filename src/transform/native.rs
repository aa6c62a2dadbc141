//! Built-in transform engine.
//!
//! | Template | Input | Output |
//! |---|---|---|
//! | `ruleset-to-docs` | rule-set | Markdown page ([`pages::render_ruleset_page`]) |
//! | `merge-ruleset` | backbone | `<rulesets>` holding every referenced rule-set |
//! | `generate-index` | merged rule-set | Markdown index ([`pages::render_index`]) |
//! | `create-ruleset-menu` | backbone | `<menu>` fragment ([`menu::create_menu`]) |
//! | `add-to-site-descriptor` | site descriptor | descriptor with the `menufile` menu spliced in |

use super::backend::{Params, Template, TransformError, TransformSource, Transformer, required_param};
use super::{menu, pages};
use crate::backbone;
use crate::xml::{Document, Element};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeTransformer;

impl NativeTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for NativeTransformer {
    fn transform(
        &self,
        source: TransformSource<'_>,
        target: &Path,
        template: Template,
        params: &Params,
    ) -> Result<(), TransformError> {
        let doc = source.load()?;
        debug!("{template}: writing {}", target.display());
        match template {
            Template::RulesetToDocs => fs::write(target, pages::render_ruleset_page(&doc))?,
            Template::GenerateIndex => fs::write(target, pages::render_index(&doc))?,
            Template::MergeRuleset => merge(&doc)?.write_to(target)?,
            Template::CreateRulesetMenu => {
                let options = menu::MenuOptions::from_params(params)?;
                menu::create_menu(&doc, &options)?.write_to(target)?;
            }
            Template::AddToSiteDescriptor => {
                let menufile = required_param(params, template, menu::PARAM_MENUFILE)?;
                let fragment = Document::parse_file(Path::new(menufile))?;
                menu::add_menu_to_site(doc.into_owned(), fragment.root)?.write_to(target)?;
            }
        }
        Ok(())
    }
}

/// Merge every rule-set the backbone references into one document.
///
/// Each rule-set root is annotated with its `category` and `page` so the
/// index can group and link without the backbone.
fn merge(backbone_doc: &Document) -> Result<Document, TransformError> {
    let mut merged = Element::new("rulesets");
    for entry in backbone::entries(backbone_doc)? {
        let mut ruleset = Document::parse_file(&entry.source)?.root;
        if ruleset.attribute("name").is_none() {
            ruleset.set_attribute("name", entry.name.as_str());
        }
        ruleset.set_attribute("category", entry.category.as_str());
        ruleset.set_attribute("page", entry.page_href());
        merged.push_element(ruleset);
    }
    Ok(Document::new(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::types::RulesetEntry;
    use tempfile::TempDir;

    fn entry_for(path: &Path) -> RulesetEntry {
        RulesetEntry {
            category: crate::naming::category_of(path),
            name: crate::naming::name_of(path),
            source: path.to_path_buf(),
            page: crate::naming::relative_page_path(path),
        }
    }

    #[test]
    fn merge_wraps_rulesets_in_backbone_order() {
        let tmp = TempDir::new().unwrap();
        let b = write_ruleset(tmp.path(), "b/Foo.xml", &[r#"<rule name="B"/>"#]);
        let a = write_ruleset(tmp.path(), "a/Foo.xml", &[r#"<rule name="A"/>"#]);
        let backbone = backbone::build(&[entry_for(&b), entry_for(&a)]);

        let target = tmp.path().join("merged.xml");
        NativeTransformer
            .transform(
                TransformSource::Document(&backbone),
                &target,
                Template::MergeRuleset,
                &Params::new(),
            )
            .unwrap();

        let merged = Document::parse_file(&target).unwrap();
        let pages: Vec<_> = merged
            .root
            .children_named("ruleset")
            .map(|r| r.attribute("page").unwrap())
            .collect();
        assert_eq!(pages, vec!["b/Foo.md", "a/Foo.md"]);
        assert_eq!(merged.root.descendants_named("rule").len(), 2);
        assert_eq!(
            read(&target).matches(&format!("xmlns=\"{NAMESPACE}\"")).count(),
            2
        );
    }

    #[test]
    fn merge_missing_ruleset_is_error() {
        let tmp = TempDir::new().unwrap();
        let backbone = backbone::build(&[entry_for(&tmp.path().join("a/Gone.xml"))]);
        let result = NativeTransformer.transform(
            TransformSource::Document(&backbone),
            &tmp.path().join("merged.xml"),
            Template::MergeRuleset,
            &Params::new(),
        );
        assert!(matches!(result, Err(TransformError::Xml(_))));
    }

    #[test]
    fn ruleset_page_from_file_source() {
        let tmp = TempDir::new().unwrap();
        let source = write_ruleset(tmp.path(), "basic/Small.xml", &[r#"<rule name="One"/>"#]);
        let target = tmp.path().join("Small.md");
        NativeTransformer
            .transform(
                TransformSource::File(&source),
                &target,
                Template::RulesetToDocs,
                &Params::new(),
            )
            .unwrap();
        let page = read(&target);
        assert!(page.starts_with("# Small\n"));
        assert!(page.contains("## One"));
    }

    #[test]
    fn site_descriptor_requires_menufile() {
        let tmp = TempDir::new().unwrap();
        let site = Document::parse_str("<project/>").unwrap();
        let result = NativeTransformer.transform(
            TransformSource::Document(&site),
            &tmp.path().join("site.xml"),
            Template::AddToSiteDescriptor,
            &Params::new(),
        );
        assert!(matches!(result, Err(TransformError::MissingParameter { .. })));
    }

    #[test]
    fn site_descriptor_reads_menufile() {
        let tmp = TempDir::new().unwrap();
        let menufile = tmp.path().join("menu.xml");
        std::fs::write(&menufile, r#"<menu name="Rule Sets"><item name="x"/></menu>"#).unwrap();
        let site = Document::parse_str("<project><body/></project>").unwrap();
        let target = tmp.path().join("site.xml");
        let params = Params::from([(
            menu::PARAM_MENUFILE.to_string(),
            menufile.to_string_lossy().into_owned(),
        )]);
        NativeTransformer
            .transform(
                TransformSource::Document(&site),
                &target,
                Template::AddToSiteDescriptor,
                &params,
            )
            .unwrap();
        let updated = Document::parse_file(&target).unwrap();
        assert_eq!(
            updated.root.child("body").unwrap().child("menu").unwrap().attribute("name"),
            Some("Rule Sets")
        );
    }
}
