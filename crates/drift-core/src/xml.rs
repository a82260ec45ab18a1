//! Minimal XML element tree
//!
//! Built on quick-xml's namespace-aware reader. The tree keeps element
//! names with their resolved namespace URI, attributes in document order,
//! text and (optionally) comments. Processing instructions,
//! declarations and doctypes are dropped; they never take part in a
//! comparison.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

/// Errors raised while building an XML tree
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("document has no root element")]
    NoRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("unclosed element <{name}>")]
    Unclosed { name: String },

    #[error("text content outside the root element")]
    TextOutsideRoot,
}

/// How the tree is normalised while parsing
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Trim text nodes and drop whitespace-only ones
    pub ignore_whitespace: bool,
    /// Drop comment nodes
    pub ignore_comments: bool,
}

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

/// An element with its attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name as written, `prefix:local` or `local`
    pub name: String,
    /// Namespace URI the name resolves to, `None` when unbound
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without its prefix
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn from_start(start: &BytesStart<'_>, namespace: Option<String>) -> Result<Self, XmlError> {
        let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
        element.namespace = namespace;
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

/// Parse a complete document into its root element
pub fn parse_document(input: &str, options: ParseOptions) -> Result<XmlElement, XmlError> {
    let mut reader = NsReader::from_str(input);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = namespace_uri(resolved);
        match event {
            Event::Start(start) => stack.push(XmlElement::from_start(&start, namespace)?),
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start, namespace)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                // quick-xml already rejects mismatched end tags
                let element = stack.pop().ok_or(XmlError::NoRoot)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                push_text(&mut stack, &text, options)?;
            }
            Event::CData(data) => {
                let data = data.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&data), options)?;
            }
            Event::Comment(comment) => {
                if !options.ignore_comments {
                    if let Some(parent) = stack.last_mut() {
                        let body = String::from_utf8_lossy(&comment.into_inner()).into_owned();
                        parent.children.push(XmlNode::Comment(body));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed { name: open.name });
    }
    root.ok_or(XmlError::NoRoot)
}

/// Undeclared prefixes resolve to no namespace rather than failing the parse
fn namespace_uri(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.into_inner()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None if root.is_some() => Err(XmlError::MultipleRoots),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}

fn push_text(stack: &mut [XmlElement], text: &str, options: ParseOptions) -> Result<(), XmlError> {
    let Some(parent) = stack.last_mut() else {
        return if text.trim().is_empty() {
            Ok(())
        } else {
            Err(XmlError::TextOutsideRoot)
        };
    };

    let text = if options.ignore_whitespace {
        text.trim()
    } else {
        text
    };
    if text.is_empty() {
        return Ok(());
    }

    // Text split by CDATA sections or entities is one logical node
    if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
    Ok(())
}
