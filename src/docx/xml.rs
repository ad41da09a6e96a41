// 🌳 XML Tree - owned element tree over quick-xml events
//
// Word parts are small enough to hold entirely in memory. Elements keep
// their qualified names ("w:p") and attribute order; comments and
// processing instructions are dropped, the declaration is rewritten.

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder pattern: add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder pattern: add a child element
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder pattern: add a text node
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key, value)),
        }
    }

    // ------------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------------

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(name))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.is(name))
    }

    /// First child with `name`, created (appended) if missing
    pub fn child_or_insert(&mut self, name: &str) -> &mut XmlElement {
        let index = match self.child_index(name) {
            Some(index) => index,
            None => {
                self.children.push(XmlNode::Element(XmlElement::new(name)));
                self.children.len() - 1
            }
        };

        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            XmlNode::Text(_) => unreachable!("child_index only returns element positions"),
        }
    }

    /// Node index of the first child element with `name`
    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is(name)))
    }

    pub fn remove_children_named(&mut self, name: &str) {
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(e) if e.is(name)));
    }

    /// All descendants with `name`, document order, self excluded
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if child.is(name) {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }

    /// Visit every descendant element mutably, depth first
    pub fn visit_mut<F: FnMut(&mut XmlElement)>(&mut self, f: &mut F) {
        for child in self.elements_mut() {
            f(child);
            child.visit_mut(f);
        }
    }

    /// Concatenated text of all direct and nested text nodes
    pub fn inner_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Replace all children with one text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }
}

// ============================================================================
// PARSE
// ============================================================================

pub fn parse(xml: &[u8]) -> Result<XmlElement> {
    let text = std::str::from_utf8(xml).context("XML part is not valid UTF-8")?;
    let mut reader = Reader::from_str(text);
    reader.trim_text(false);

    // Open elements; the bottom entry collects the root
    let mut stack: Vec<XmlElement> = vec![XmlElement::new("#document")];

    loop {
        match reader.read_event().context("Malformed XML")? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                push_node(&mut stack, XmlNode::Element(element));
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    bail!("Unbalanced closing tag");
                }
                if let Some(element) = stack.pop() {
                    push_node(&mut stack, XmlNode::Element(element));
                }
            }
            Event::Text(text) => {
                let text = text.unescape().context("Invalid text escape")?;
                if stack.len() > 1 {
                    push_node(&mut stack, XmlNode::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_node(&mut stack, XmlNode::Text(text));
            }
            Event::Eof => break,
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    if stack.len() != 1 {
        bail!("Unclosed element in XML part");
    }

    let document = stack.pop().unwrap_or_else(|| XmlElement::new("#document"));
    let root = document.children.into_iter().find_map(|node| match node {
        XmlNode::Element(element) => Some(element),
        XmlNode::Text(_) => None,
    });

    root.context("XML part has no root element")
}

fn element_from(start: &BytesStart) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);

    for attr in start.attributes() {
        let attr = attr.context("Malformed attribute")?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().context("Invalid attribute escape")?;
        element.attrs.push((key, value.into_owned()));
    }

    Ok(element)
}

fn push_node(stack: &mut [XmlElement], node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

// ============================================================================
// SERIALIZE
// ============================================================================

/// Standalone UTF-8 declaration followed by the tree
pub fn serialize(root: &XmlElement) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Text(BytesText::from_escaped("\r\n")))?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let start = BytesStart::new(element.name.as_str()).with_attributes(
        element
            .attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for node in &element.children {
        match node {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;

    Ok(())
}
