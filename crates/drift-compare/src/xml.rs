//! XML tree diff
//!
//! Both documents are parsed with whitespace between elements dropped, then
//! walked in document order. Children compare by position. Elements match
//! on local name; namespace URI and prefix are compared separately, and
//! `xmlns` declarations themselves are not treated as attributes. Paths are
//! XPath-like on local names: `/Envelope[1]/Body[1]/status[1]/text()[1]`.

use crate::error::ParseError;
use crate::verdict::{DiffKind, Difference};
use crate::CompareOptions;
use drift_core::xml::{parse_document, ParseOptions, XmlElement, XmlNode};

pub(crate) fn compare(
    left: &str,
    right: &str,
    options: &CompareOptions,
) -> Result<Vec<Difference>, ParseError> {
    let parse_options = ParseOptions {
        ignore_whitespace: true,
        ignore_comments: options.ignore_comments,
    };
    let left = parse_document(left, parse_options)?;
    let right = parse_document(right, parse_options)?;

    let mut differ = Differ::new(options.xml_diff_limit);
    differ.element(&format!("/{}[1]", left.local_name()), &left, &right);
    Ok(differ.differences)
}

struct Differ {
    limit: Option<usize>,
    differences: Vec<Difference>,
}

impl Differ {
    fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            differences: Vec::new(),
        }
    }

    fn full(&self) -> bool {
        self.limit.is_some_and(|limit| self.differences.len() >= limit)
    }

    fn push(&mut self, path: &str, kind: DiffKind, what: String) {
        if !self.full() {
            self.differences.push(Difference::new(
                path,
                kind,
                format!("{} - comparing at {}", what, path),
            ));
        }
    }

    fn element(&mut self, path: &str, left: &XmlElement, right: &XmlElement) {
        if self.full() {
            return;
        }
        if left.local_name() != right.local_name() {
            self.push(
                path,
                DiffKind::ValueMismatch,
                format!(
                    "Expected element tag name '{}' but was '{}'",
                    left.local_name(),
                    right.local_name()
                ),
            );
            return;
        }
        if left.namespace != right.namespace {
            self.push(
                path,
                DiffKind::ValueMismatch,
                format!(
                    "Expected namespace URI '{}' but was '{}'",
                    left.namespace.as_deref().unwrap_or_default(),
                    right.namespace.as_deref().unwrap_or_default()
                ),
            );
        }
        if left.prefix() != right.prefix() {
            self.push(
                path,
                DiffKind::ValueMismatch,
                format!(
                    "Expected namespace prefix '{}' but was '{}'",
                    left.prefix().unwrap_or_default(),
                    right.prefix().unwrap_or_default()
                ),
            );
        }

        self.attributes(path, left, right);
        self.children(path, left, right);
    }

    fn attributes(&mut self, path: &str, left: &XmlElement, right: &XmlElement) {
        for (name, left_value) in left.attributes.iter().filter(|(k, _)| !is_namespace(k)) {
            let attr_path = format!("{}/@{}", path, name);
            match right.attribute(name) {
                Some(right_value) if right_value == left_value => {}
                Some(right_value) => self.push(
                    &attr_path,
                    DiffKind::ValueMismatch,
                    format!(
                        "Expected attribute value '{}' but was '{}'",
                        left_value, right_value
                    ),
                ),
                None => self.push(
                    &attr_path,
                    DiffKind::MissingInRight,
                    format!("Expected attribute '{}' but was missing", name),
                ),
            }
        }

        for (name, _) in right
            .attributes
            .iter()
            .filter(|(k, _)| !is_namespace(k) && left.attribute(k).is_none())
        {
            self.push(
                &format!("{}/@{}", path, name),
                DiffKind::MissingInLeft,
                format!("Unexpected attribute '{}'", name),
            );
        }
    }

    fn children(&mut self, path: &str, left: &XmlElement, right: &XmlElement) {
        let left_steps = steps(&left.children);
        let right_steps = steps(&right.children);

        for i in 0..left.children.len().max(right.children.len()) {
            if self.full() {
                return;
            }
            match (left.children.get(i), right.children.get(i)) {
                (Some(l), Some(r)) => {
                    let child_path = format!("{}/{}", path, left_steps[i]);
                    self.node(&child_path, l, r);
                }
                (Some(l), None) => self.push(
                    &format!("{}/{}", path, left_steps[i]),
                    DiffKind::MissingInRight,
                    format!("Expected child '{}' but was missing", describe(l)),
                ),
                (None, Some(r)) => self.push(
                    &format!("{}/{}", path, right_steps[i]),
                    DiffKind::MissingInLeft,
                    format!("Unexpected child '{}'", describe(r)),
                ),
                (None, None) => {}
            }
        }
    }

    fn node(&mut self, path: &str, left: &XmlNode, right: &XmlNode) {
        match (left, right) {
            (XmlNode::Element(l), XmlNode::Element(r)) => self.element(path, l, r),
            (XmlNode::Text(l), XmlNode::Text(r)) => {
                if l != r {
                    self.push(
                        path,
                        DiffKind::ValueMismatch,
                        format!("Expected text value '{}' but was '{}'", l, r),
                    );
                }
            }
            (XmlNode::Comment(l), XmlNode::Comment(r)) => {
                if l != r {
                    self.push(
                        path,
                        DiffKind::ValueMismatch,
                        format!("Expected comment value '{}' but was '{}'", l, r),
                    );
                }
            }
            (l, r) => self.push(
                path,
                DiffKind::ValueMismatch,
                format!(
                    "Expected child node type '{}' but was '{}'",
                    kind_name(l),
                    kind_name(r)
                ),
            ),
        }
    }
}

/// `xmlns` and `xmlns:*` declarations; their effect is compared on elements
fn is_namespace(attribute: &str) -> bool {
    attribute == "xmlns" || attribute.starts_with("xmlns:")
}

/// Location step for every child: `name[n]`, `text()[n]` or `comment()[n]`,
/// numbered among siblings of the same kind and name
fn steps(children: &[XmlNode]) -> Vec<String> {
    let mut seen: Vec<(String, usize)> = Vec::new();
    children
        .iter()
        .map(|child| {
            let test = match child {
                XmlNode::Element(e) => e.local_name().to_string(),
                XmlNode::Text(_) => "text()".to_string(),
                XmlNode::Comment(_) => "comment()".to_string(),
            };
            let position = match seen.iter_mut().find(|(name, _)| *name == test) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    seen.push((test.clone(), 1));
                    1
                }
            };
            format!("{}[{}]", test, position)
        })
        .collect()
}

fn describe(node: &XmlNode) -> String {
    match node {
        XmlNode::Element(e) => e.name.clone(),
        XmlNode::Text(t) => t.clone(),
        XmlNode::Comment(c) => c.clone(),
    }
}

fn kind_name(node: &XmlNode) -> &'static str {
    match node {
        XmlNode::Element(_) => "element",
        XmlNode::Text(_) => "text",
        XmlNode::Comment(_) => "comment",
    }
}
