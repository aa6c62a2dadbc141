//! Site menu templates: `create-ruleset-menu` and `add-to-site-descriptor`.
//!
//! The menu is a small XML fragment built from the backbone:
//!
//! ```xml
//! <menu name="Rule Sets">
//!   <item name="basic">
//!     <item name="Braces" href="rules/basic/Braces.html"/>
//!   </item>
//! </menu>
//! ```
//!
//! Splicing it into the site descriptor replaces any menu with the same name
//! under `<body>`, so re-running the pipeline does not stack menus.

use super::backend::{Params, Template, TransformError, required_param};
use crate::backbone;
use crate::xml::{Document, Element, Node, XmlError};

/// Parameter naming the file that holds the menu fragment.
pub const PARAM_MENUFILE: &str = "menufile";
pub const PARAM_MENU_NAME: &str = "menu_name";
pub const PARAM_HREF_PREFIX: &str = "href_prefix";
pub const PARAM_PAGE_EXTENSION: &str = "page_extension";

/// Settings of the `create-ruleset-menu` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOptions {
    pub menu_name: String,
    pub href_prefix: String,
    pub page_extension: String,
}

impl MenuOptions {
    pub fn from_params(params: &Params) -> Result<Self, TransformError> {
        let template = Template::CreateRulesetMenu;
        Ok(Self {
            menu_name: required_param(params, template, PARAM_MENU_NAME)?.to_string(),
            href_prefix: params.get(PARAM_HREF_PREFIX).cloned().unwrap_or_default(),
            page_extension: required_param(params, template, PARAM_PAGE_EXTENSION)?.to_string(),
        })
    }

    pub fn to_params(&self) -> Params {
        Params::from([
            (PARAM_MENU_NAME.to_string(), self.menu_name.clone()),
            (PARAM_HREF_PREFIX.to_string(), self.href_prefix.clone()),
            (PARAM_PAGE_EXTENSION.to_string(), self.page_extension.clone()),
        ])
    }

    fn href(&self, category: &str, name: &str) -> String {
        let page = format!("{category}/{name}.{}", self.page_extension);
        let prefix = self.href_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            page
        } else {
            format!("{prefix}/{page}")
        }
    }
}

/// Build the menu fragment for a backbone.
///
/// One `<item>` per category in first-seen order, each holding one `<item>`
/// per rule-set in backbone order.
pub fn create_menu(backbone_doc: &Document, options: &MenuOptions) -> Result<Document, XmlError> {
    let mut categories: Vec<Element> = Vec::new();
    for entry in backbone::entries(backbone_doc)? {
        let item = Element::new("item")
            .with_attribute("name", entry.name.as_str())
            .with_attribute("href", options.href(&entry.category, &entry.name));
        match categories
            .iter_mut()
            .find(|c| c.attribute("name") == Some(entry.category.as_str()))
        {
            Some(category) => category.push_element(item),
            None => categories.push(
                Element::new("item")
                    .with_attribute("name", entry.category.as_str())
                    .with_child(item),
            ),
        }
    }

    let mut menu = Element::new("menu").with_attribute("name", options.menu_name.as_str());
    for category in categories {
        menu.push_element(category);
    }
    Ok(Document::new(menu))
}

/// Splice a `<menu>` into a site descriptor's `<body>`.
///
/// `<body>` is created when missing. Menus with the same `name` are removed
/// before the new one is appended.
pub fn add_menu_to_site(mut site: Document, menu: Element) -> Result<Document, XmlError> {
    if menu.name != "menu" {
        return Err(XmlError::Malformed(format!(
            "menu fragment root must be <menu>, found <{}>",
            menu.name
        )));
    }
    let name = menu.attribute("name").map(str::to_string);
    let body = site.root.child_or_insert("body");
    body.children.retain(|node| match node {
        Node::Element(existing) if existing.name == "menu" => {
            existing.attribute("name").map(str::to_string) != name
        }
        _ => true,
    });
    body.push_element(menu);
    Ok(site)
}
