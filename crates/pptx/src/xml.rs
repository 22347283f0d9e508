//! A small owned XML tree for editing package parts.
//!
//! Parts are parsed with quick-xml into elements, text, and opaque events
//! (declarations, comments, CDATA, processing instructions). Writing the
//! tree back reproduces everything that was not edited.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use redact_core::{Error, Result};
use std::fmt::Display;

fn xml_error(e: impl Display) -> Error {
    Error::XmlError(e.to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// Extract the namespace prefix from an element name, if any.
pub fn prefix(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data.
    Text(String),
    /// Any other event, written back verbatim.
    Other(Event<'static>),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Qualified name, e.g. `a:r`.
    pub name: String,
    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Name of a sibling element in the same namespace, e.g. `a:t` for `a:r`.
    pub fn sibling_name(&self, local: &str) -> String {
        match prefix(&self.name) {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.local_name() == local)
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// Follow a path of local names through first-matching children.
    pub fn descendant(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |element, local| element.child(local))
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![XmlNode::Text(text.to_string())];
    }

    /// Remove every child element with the given local name.
    pub fn remove_children(&mut self, local: &str) {
        self.children
            .retain(|node| node.as_element().map_or(true, |e| e.local_name() != local));
    }

    /// Element reached by following child-node indices.
    pub fn find_path(&self, path: &[usize]) -> Option<&XmlElement> {
        path.iter()
            .try_fold(self, |element, &i| element.children.get(i)?.as_element())
    }

    pub fn find_path_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut element = self;
        for &i in path {
            element = element.children.get_mut(i)?.as_element_mut()?;
        }
        Some(element)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(xml_error);
        }

        writer.write_event(Event::Start(start)).map_err(xml_error)?;
        for child in &self.children {
            write_node(writer, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(xml_error)
    }
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element(element) => element.write(writer),
        XmlNode::Text(text) => writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error),
        XmlNode::Other(event) => writer.write_event(event).map_err(xml_error),
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlDocument {
    /// Top-level nodes: declaration, root element, surrounding whitespace.
    pub nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a document, keeping whitespace and non-element content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut nodes = Vec::new();

        let mut push = |stack: &mut Vec<XmlElement>, node: XmlNode| match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => nodes.push(node),
        };

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(XmlElement::from_start(e)?),
                Ok(Event::Empty(ref e)) => {
                    let element = XmlElement::from_start(e)?;
                    push(&mut stack, XmlNode::Element(element));
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| xml_error("closing tag without an open element"))?;
                    push(&mut stack, XmlNode::Element(element));
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().map_err(xml_error)?.into_owned();
                    push(&mut stack, XmlNode::Text(text));
                }
                Ok(Event::Eof) => break,
                Ok(event) => push(&mut stack, XmlNode::Other(event.into_owned())),
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::XmlError(format!("Unclosed element '{}'", open.name)));
        }

        Ok(Self { nodes })
    }

    /// Parse a document from raw part bytes.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes).map_err(xml_error)?;
        Self::parse(xml.trim_start_matches('\u{FEFF}'))
    }

    /// The root element.
    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(XmlNode::as_element)
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(XmlNode::as_element_mut)
    }

    /// Serialize the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}
