//! Order-preserving XML tree construction.
//!
//! Children are serialized exactly in insertion order, empty elements are
//! kept (`<SubnetNames/>`), and output is compact and deterministic, which is
//! what schema-ordered vendor payloads need.
//!
//! # Example
//!
//! ```
//! use rivet_core::XmlElement;
//!
//! let xml = XmlElement::new("ConfigurationSet")
//!     .child(XmlElement::leaf("ConfigurationSetType", "NetworkConfiguration"))
//!     .child(XmlElement::new("SubnetNames"))
//!     .to_xml_string();
//! assert_eq!(
//!     xml,
//!     "<ConfigurationSet><ConfigurationSetType>NetworkConfiguration</ConfigurationSetType><SubnetNames/></ConfigurationSet>"
//! );
//! ```

use std::fmt::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// An empty element.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// An element holding a single text node.
    #[must_use]
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).text(text)
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Appends a text node. Empty text adds nothing.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Appends the child if present.
    #[must_use]
    pub fn child_opt(self, child: Option<Self>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }

    /// Appends every child in iteration order.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children
            .extend(children.into_iter().map(XmlNode::Element));
        self
    }

    /// Element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements in order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child with the name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        self.child_elements().find(|child| child.name == name)
    }

    /// Every element with the name anywhere below this one, in document order.
    #[must_use]
    pub fn descendants_named(&self, name: &str) -> Vec<&Self> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Self>) {
        for child in self.child_elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }

    /// Concatenated direct text content.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Serialize to a compact string without an XML declaration.
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        self.to_string()
    }

    fn write_into<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(out, " {name}=\"{}\"", escape(value))?;
        }
        if self.children.is_empty() {
            return out.write_str("/>");
        }
        out.write_char('>')?;
        for node in &self.children {
            match node {
                XmlNode::Element(element) => element.write_into(out)?,
                XmlNode::Text(text) => out.write_str(&escape(text))?,
            }
        }
        write!(out, "</{}>", self.name)
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_into(f)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_elements_are_self_closing() {
        assert_eq!(XmlElement::new("SSH").to_xml_string(), "<SSH/>");
        assert_eq!(XmlElement::leaf("Label", "").to_xml_string(), "<Label/>");
    }

    #[test]
    fn attributes_and_text_are_escaped() {
        let xml = XmlElement::new("Deployment")
            .attr("xmlns", "http://schemas.example.com/a?b=1&c=\"2\"")
            .child(XmlElement::leaf("Name", "<web & db>"))
            .to_xml_string();

        assert_eq!(
            xml,
            "<Deployment xmlns=\"http://schemas.example.com/a?b=1&amp;c=&quot;2&quot;\"><Name>&lt;web &amp; db&gt;</Name></Deployment>"
        );
    }

    #[test]
    fn children_keep_insertion_order() {
        let element = XmlElement::new("InputEndpoint")
            .child(XmlElement::leaf("LocalPort", "22"))
            .child(XmlElement::leaf("Name", "ssh"))
            .child(XmlElement::leaf("Port", "2222"));

        let names: Vec<_> = element.child_elements().map(XmlElement::name).collect();
        assert_eq!(names, ["LocalPort", "Name", "Port"]);
    }

    #[test]
    fn child_opt_and_children() {
        let element = XmlElement::new("Set")
            .child_opt(None)
            .child_opt(Some(XmlElement::new("Present")))
            .children((0..3).map(|i| XmlElement::leaf("Item", i.to_string())));

        assert!(element.find("Present").is_some());
        let items: Vec<_> = element
            .descendants_named("Item")
            .into_iter()
            .map(XmlElement::text_content)
            .collect();
        assert_eq!(items, ["0", "1", "2"]);
    }

    #[test]
    fn serialization_is_deterministic() {
        let build = || {
            XmlElement::new("Role")
                .attr("a", "1")
                .child(XmlElement::leaf("RoleName", "web"))
                .to_xml_string()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn lookup_helpers() {
        let element = XmlElement::new("Root")
            .attr("xmlns", "urn:x")
            .child(XmlElement::new("A").child(XmlElement::leaf("B", "deep")));

        assert_eq!(element.attribute("xmlns"), Some("urn:x"));
        assert_eq!(element.name(), "Root");
        assert!(element.find("B").is_none());
        assert_eq!(element.descendants_named("B").len(), 1);
    }
}
