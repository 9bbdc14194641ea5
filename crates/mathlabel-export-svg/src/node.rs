//! A minimal SVG element tree

use std::fmt::{self, Write};

/// One node of an SVG document
#[derive(Debug, Clone, PartialEq)]
pub enum SvgNode {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<SvgNode>,
    },
    /// Character data, escaped on output
    Text(String),
    /// Markup copied through as is
    Raw(String),
}

impl SvgNode {
    pub fn element(name: impl Into<String>) -> Self {
        SvgNode::Element {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing any earlier value
    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl ToString) {
        if let SvgNode::Element { attrs, .. } = self {
            let value = value.to_string();
            match attrs.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value,
                None => attrs.push((key.to_string(), value)),
            }
        }
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        match self {
            SvgNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn child(mut self, node: SvgNode) -> Self {
        self.push(node);
        self
    }

    /// Append a child; ignored for non-element nodes
    pub fn push(&mut self, node: SvgNode) {
        if let SvgNode::Element { children, .. } = self {
            children.push(node);
        }
    }

    pub fn children(&self) -> &[SvgNode] {
        match self {
            SvgNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SvgNode::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn write_to(&self, out: &mut impl Write) -> fmt::Result {
        match self {
            SvgNode::Text(text) => out.write_str(&escape(text, false)),
            SvgNode::Raw(raw) => out.write_str(raw),
            SvgNode::Element {
                name,
                attrs,
                children,
            } => {
                write!(out, "<{}", name)?;
                for (key, value) in attrs {
                    write!(out, r#" {}="{}""#, key, escape(value, true))?;
                }
                if children.is_empty() {
                    return out.write_str("/>");
                }
                out.write_char('>')?;
                for child in children {
                    child.write_to(out)?;
                }
                write!(out, "</{}>", name)
            },
        }
    }
}

impl fmt::Display for SvgNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

pub(crate) fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
