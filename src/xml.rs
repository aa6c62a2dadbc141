//! Owned XML tree.
//!
//! Rule-set files, the backbone, the merged file and the site descriptor are
//! all small documents that get read, edited in place and written back. This
//! module gives them one representation: an [`Element`] owns its attributes
//! and its children, and a [`Document`] owns the root element. There is no
//! parent pointer and no shared ownership: a document is mutated through
//! `&mut` and handed to a transformer through `&`.
//!
//! Parsing uses the `quick-xml` pull reader. Files are decoded with the
//! encoding named in their XML declaration (or BOM) and always written back
//! as UTF-8. Comments and processing instructions ahead of the root element
//! are kept in [`Document::prolog`]; the declaration and doctype are dropped.
//! Whitespace text between elements is kept so a parse/serialize pass
//! preserves the layout of the source file.
//!
//! ## Text content
//!
//! [`Element::text_content`] concatenates every text and CDATA node below an
//! element, in document order, ignoring comments.
//! [`Element::set_text_content`] replaces *all* children with a single text
//! node. Together they give the same read-modify-write behavior as the DOM
//! `textContent` property.
//!
//! ## Serialization
//!
//! Text nodes are written with `&`, `<` and `>` escaped; attribute values are
//! fully escaped; CDATA sections are written verbatim (a `]]>` inside is split
//! across two sections). Childless elements are written self-closed.

use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use std::fs;
use std::io::BufRead;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error at byte {position}: {source}")]
    Parse {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// Target and data of `<?target data?>`.
    ProcessingInstruction(String),
}

/// An element with its attributes (in source order) and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Qualified name as written in the source, prefix included.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder form of [`push_element`](Self::push_element).
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_element(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Direct child elements with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |element| element.name == name)
    }

    /// Mutable form of [`children_named`](Self::children_named).
    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.children.iter_mut().filter_map(move |node| match node {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    /// First direct child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    /// First direct child element with the given name, appended if missing.
    pub fn child_or_insert(&mut self, name: &str) -> &mut Element {
        let position = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(element) if element.name == name));
        let index = match position {
            Some(index) => index,
            None => {
                self.push_element(Element::new(name));
                self.children.len() - 1
            }
        };
        match &mut self.children[index] {
            Node::Element(element) => element,
            _ => unreachable!("index points at an element child"),
        }
    }

    /// Text content of the first direct child with the given name.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text_content)
    }

    /// Concatenated text and CDATA of all descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Element(element) => element.collect_text(out),
                Node::Text(text) | Node::CData(text) => out.push_str(text),
                Node::Comment(_) | Node::ProcessingInstruction(_) => {}
            }
        }
    }

    /// Replace every child with a single text node.
    pub fn set_text_content(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(Node::Text(text.into()));
    }

    /// Visit every element named `name` in this subtree, pre-order.
    ///
    /// The element itself is visited before its children, so a callback that
    /// rewrites children sees the rewritten subtree walked afterwards.
    pub fn for_each_element_mut<E>(
        &mut self,
        name: &str,
        f: &mut impl FnMut(&mut Element) -> Result<(), E>,
    ) -> Result<(), E> {
        if self.name == name {
            f(self)?;
        }
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.for_each_element_mut(name, f)?;
            }
        }
        Ok(())
    }

    /// All elements named `name` in this subtree, pre-order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.name == name {
            found.push(self);
        }
        for element in self.elements() {
            element.collect_named(name, found);
        }
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Comments and processing instructions before the root element.
    pub prolog: Vec<Node>,
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
        }
    }

    /// Parse a file, honoring its declared encoding.
    pub fn parse_file(path: &Path) -> Result<Self, XmlError> {
        let bytes = fs::read(path)?;
        Self::parse_reader(Reader::from_reader(bytes.as_slice()))
    }

    pub fn parse_str(input: &str) -> Result<Self, XmlError> {
        Self::parse_reader(Reader::from_str(input))
    }

    fn parse_reader<R: BufRead>(mut reader: Reader<R>) -> Result<Self, XmlError> {
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut prolog: Vec<Node> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            buf.clear();
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(XmlError::Parse {
                        position: reader.buffer_position(),
                        source,
                    });
                }
            };
            let position = reader.buffer_position();

            match event {
                Event::Start(start) => stack.push(element_from_start(&reader, &start, position)?),
                Event::Empty(start) => {
                    let element = element_from_start(&reader, &start, position)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        XmlError::Malformed(format!("closing tag without opening tag at byte {position}"))
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|source| XmlError::Parse { position, source })?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(value.into_owned()),
                        None if value.trim().is_empty() => {}
                        None => {
                            return Err(XmlError::Malformed(format!(
                                "text outside the root element at byte {position}"
                            )));
                        }
                    }
                }
                Event::CData(data) => {
                    let value = decode(&reader, &data, position)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::CData(value));
                    }
                }
                Event::Comment(comment) => {
                    let node = Node::Comment(decode(&reader, &comment, position)?);
                    push_misc(&mut stack, &mut prolog, &root, node);
                }
                Event::PI(pi) => {
                    let node = Node::ProcessingInstruction(decode(&reader, &pi, position)?);
                    push_misc(&mut stack, &mut prolog, &root, node);
                }
                Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Malformed(format!(
                "element <{}> is never closed",
                open.name
            )));
        }
        let root =
            root.ok_or_else(|| XmlError::Malformed("document has no root element".to_string()))?;
        Ok(Document { prolog, root })
    }

    /// Serialize with an XML declaration.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        for node in &self.prolog {
            write_node(node, &mut out);
            out.push('\n');
        }
        write_element(&self.root, &mut out);
        out.push('\n');
        out
    }

    pub fn write_to(&self, path: &Path) -> Result<(), XmlError> {
        fs::write(path, self.to_xml_string())?;
        Ok(())
    }

    /// See [`Element::for_each_element_mut`].
    pub fn for_each_element_mut<E>(
        &mut self,
        name: &str,
        mut f: impl FnMut(&mut Element) -> Result<(), E>,
    ) -> Result<(), E> {
        self.root.for_each_element_mut(name, &mut f)
    }
}

fn element_from_start<R>(
    reader: &Reader<R>,
    start: &BytesStart,
    position: usize,
) -> Result<Element, XmlError> {
    let name = decode(reader, start.name().as_ref(), position)?;
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Parse {
            position,
            source: e.into(),
        })?;
        let key = decode(reader, attr.key.as_ref(), position)?;
        let value = attr
            .decode_and_unescape_value(reader)
            .map_err(|source| XmlError::Parse { position, source })?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

/// Decode raw bytes with the encoding the reader has detected so far.
fn decode<R>(reader: &Reader<R>, bytes: &[u8], position: usize) -> Result<String, XmlError> {
    reader
        .decoder()
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|source| XmlError::Parse { position, source })
}

/// Comments and processing instructions go to the open element, or to the
/// prolog while no root has been seen. Ones after the root are dropped.
fn push_misc(stack: &mut [Element], prolog: &mut Vec<Node>, root: &Option<Element>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => prolog.push(node),
        None => {}
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_element(element);
    } else if root.is_some() {
        return Err(XmlError::Malformed(format!(
            "second root element <{}>",
            element.name
        )));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(element) => write_element(element, out),
        Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
        Node::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::ProcessingInstruction(text) => {
            out.push_str("<?");
            out.push_str(text);
            out.push_str("?>");
        }
    }
}
