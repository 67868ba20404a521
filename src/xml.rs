//! Generic XML element tree with verbatim serialization.
//!
//! The wire protocol is whitespace-sensitive on the consumer side, so trees
//! are written exactly as built: no pretty-printing, no inserted whitespace,
//! attributes and children in insertion order.
use std::{io, str};

use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event as XmlEvent},
    Reader, Writer,
};

#[derive(Debug)]
pub enum XmlError {
    Io(io::Error),
    Xml(quick_xml::Error),
    InvalidUtf8(str::Utf8Error),
    UnexpectedEof,
    UnexpectedContent,
}

impl std::fmt::Display for XmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for XmlError {}

impl From<io::Error> for XmlError {
    fn from(value: io::Error) -> Self {
        XmlError::Io(value)
    }
}

impl From<quick_xml::Error> for XmlError {
    fn from(value: quick_xml::Error) -> Self {
        XmlError::Xml(value)
    }
}

impl From<str::Utf8Error> for XmlError {
    fn from(value: str::Utf8Error) -> Self {
        XmlError::InvalidUtf8(value)
    }
}

/// A child of an [Element]: either a nested element or a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with positional attributes and children.
///
/// Attributes and children are kept in plain vectors so that serialization
/// order is exactly insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Make a leaf element holding a single text run.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.push_text(text);
        element
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Serialize the tree to `output`, verbatim.
    ///
    /// Childless elements are written self-closing; text runs and attribute
    /// values are XML-escaped.
    pub fn write_to<W: io::Write>(&self, output: &mut W) -> Result<(), XmlError> {
        let mut writer = Writer::new(output);
        self.write_element(&mut writer)
    }

    fn write_element<W: io::Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());

        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(XmlEvent::Empty(start))?;
            return Ok(());
        }

        writer.write_event(XmlEvent::Start(start))?;

        for child in &self.children {
            match child {
                Node::Element(element) => element.write_element(writer)?,
                Node::Text(text) => writer.write_event(XmlEvent::Text(BytesText::new(text)))?,
            }
        }

        writer.write_event(XmlEvent::End(BytesEnd::new(self.name.as_str())))?;

        Ok(())
    }

    /// Parse the first top-level element of `input`.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        // Text runs are kept verbatim, padding and whitespace-only runs
        // included; the serializer never inserts whitespace of its own.
        let mut reader = Reader::from_str(input);

        // Ancestors of the element currently being read.
        let mut stack: Vec<Element> = vec![];

        loop {
            match reader.read_event()? {
                XmlEvent::Start(start) => stack.push(element_from_start(&start)?),
                XmlEvent::Empty(start) => {
                    let element = element_from_start(&start)?;

                    match stack.last_mut() {
                        Some(parent) => parent.push_element(element),
                        None => return Ok(element),
                    }
                }
                XmlEvent::End(_) => {
                    let element = stack.pop().ok_or(XmlError::UnexpectedContent)?;

                    match stack.last_mut() {
                        Some(parent) => parent.push_element(element),
                        None => return Ok(element),
                    }
                }
                XmlEvent::Text(text) => {
                    let parent = stack.last_mut().ok_or(XmlError::UnexpectedContent)?;
                    parent.push_text(text.unescape()?.into_owned());
                }
                XmlEvent::CData(data) => {
                    let parent = stack.last_mut().ok_or(XmlError::UnexpectedContent)?;
                    parent.push_text(str::from_utf8(&data.into_inner())?.to_string());
                }
                XmlEvent::Decl(_) | XmlEvent::Comment(_) | XmlEvent::PI(_) | XmlEvent::DocType(_) => {}
                XmlEvent::Eof => return Err(XmlError::UnexpectedEof),
            }
        }
    }

    /// Serialize to an in-memory string, mostly for diagnostics and tests.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut buffer = vec![];
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| XmlError::InvalidUtf8(e.utf8_error()))
    }
}

fn element_from_start(start: &BytesStart) -> Result<Element, XmlError> {
    let mut element = Element::new(str::from_utf8(start.name().as_ref())?);

    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::InvalidAttr)?;

        element.set_attribute(
            str::from_utf8(attribute.key.as_ref())?,
            attribute.unescape_value()?.into_owned(),
        );
    }

    Ok(element)
}
