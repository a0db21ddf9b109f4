use serde::{Deserialize, Serialize};

/// Parsed XML document
///
/// Only the root element is addressable by paths. Prolog and epilog carry
/// the XML declaration, processing instructions and comments that sit
/// outside the root so that export reproduces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub prolog: Vec<Node>,
    pub doctype: Option<String>,
    pub root: Element,
    pub epilog: Vec<Node>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            doctype: None,
            root,
            epilog: Vec::new(),
        }
    }
}

/// Attribute on an element (document order is preserved)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Instruction { target: String, data: String },
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    /// Tag name without its namespace prefix (`tei:div` -> `div`)
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|attr| attr.name == name)?;
        Some(self.attributes.remove(pos).value)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
                Node::Comment(_) | Node::Instruction { .. } => {}
            }
        }
    }

    /// Merge adjacent text nodes and drop empty ones, recursively
    pub fn normalize(&mut self) {
        let children = std::mem::take(&mut self.children);
        let mut merged: Vec<Node> = Vec::with_capacity(children.len());

        for child in children {
            match child {
                Node::Text(text) if text.is_empty() => {}
                Node::Text(text) => match merged.last_mut() {
                    Some(Node::Text(prev)) => prev.push_str(&text),
                    _ => merged.push(Node::Text(text)),
                },
                Node::Element(mut element) => {
                    element.normalize();
                    merged.push(Node::Element(element));
                }
                other => merged.push(other),
            }
        }

        self.children = merged;
    }

    /// Pre-order iterator over descendant elements (self excluded)
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Node::Element(element) = node {
                self.stack.extend(element.children.iter().rev());
                return Some(element);
            }
        }
        None
    }
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(content.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            _ => &[],
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Element(element) => element.text_content(),
            Node::Text(text) => text.clone(),
            Node::Comment(_) | Node::Instruction { .. } => String::new(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name_strips_prefix() {
        assert_eq!(Element::new("tei:div").local_name(), "div");
        assert_eq!(Element::new("p").local_name(), "p");
    }

    #[test]
    fn test_set_attribute_keeps_order() {
        let mut element = Element::new("div")
            .with_attribute("n", "1")
            .with_attribute("type", "chapter");
        element.set_attribute("n", "2");

        assert_eq!(element.attributes[0], Attribute::new("n", "2"));
        assert_eq!(element.attributes[1], Attribute::new("type", "chapter"));
        assert_eq!(element.remove_attribute("n"), Some("2".to_string()));
        assert_eq!(element.attribute("n"), None);
    }

    #[test]
    fn test_normalize_merges_adjacent_text() {
        let mut element = Element::new("p")
            .with_text("Hello ")
            .with_text("")
            .with_text("John")
            .with_child(Element::new("lb"))
            .with_text("!");
        element.normalize();

        assert_eq!(element.children.len(), 3);
        assert_eq!(element.children[0], Node::text("Hello John"));
        assert_eq!(element.children[2], Node::text("!"));
    }

    #[test]
    fn test_text_content_skips_comments() {
        let element = Element::new("p")
            .with_text("a")
            .with_child(Node::Comment("ignored".to_string()))
            .with_child(Element::new("hi").with_text("b"));

        assert_eq!(element.text_content(), "ab");
    }

    #[test]
    fn test_descendants_pre_order() {
        let element = Element::new("body")
            .with_child(Element::new("div").with_child(Element::new("p")))
            .with_child(Element::new("div"));

        let names: Vec<&str> = element.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["div", "p", "div"]);
    }
}
