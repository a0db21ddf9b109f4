use crate::ast::*;

/// Serializer converts the tree back to XML text
///
/// Text is written verbatim (escaped), so whitespace inside the root
/// survives a parse/serialize cycle. Whitespace between prolog items is
/// not part of the tree and is re-emitted as single newlines.
pub struct Serializer {
    output: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    /// Serialize a Document to XML
    pub fn serialize(mut self, doc: &Document) -> String {
        for node in &doc.prolog {
            self.write_node(node);
            self.output.push('\n');
        }

        if let Some(doctype) = &doc.doctype {
            self.output.push_str(doctype);
            self.output.push('\n');
        }

        self.write_element(&doc.root);

        for node in &doc.epilog {
            self.output.push('\n');
            self.write_node(node);
        }

        self.output
    }

    /// Serialize a sequence of sibling nodes
    pub fn serialize_nodes(mut self, nodes: &[Node]) -> String {
        for node in nodes {
            self.write_node(node);
        }
        self.output
    }

    fn write_node(&mut self, node: &Node) {
        match node {
            Node::Element(element) => self.write_element(element),
            Node::Text(text) => escape_text(text, &mut self.output),
            Node::Comment(comment) => {
                self.output.push_str("<!--");
                self.output.push_str(comment);
                self.output.push_str("-->");
            }
            Node::Instruction { target, data } => {
                self.output.push_str("<?");
                self.output.push_str(target);
                if !data.is_empty() {
                    self.output.push(' ');
                    self.output.push_str(data);
                }
                self.output.push_str("?>");
            }
        }
    }

    fn write_element(&mut self, element: &Element) {
        self.output.push('<');
        self.output.push_str(&element.name);

        for attr in &element.attributes {
            self.output.push(' ');
            self.output.push_str(&attr.name);
            self.output.push_str("=\"");
            escape_attribute(&attr.value, &mut self.output);
            self.output.push('"');
        }

        if element.children.is_empty() {
            self.output.push_str("/>");
            return;
        }

        self.output.push('>');
        for child in &element.children {
            self.write_node(child);
        }
        self.output.push_str("</");
        self.output.push_str(&element.name);
        self.output.push('>');
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}

/// Serialize a document to XML
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}

/// Serialize a single node (and its subtree)
pub fn serialize_node(node: &Node) -> String {
    Serializer::new().serialize_nodes(std::slice::from_ref(node))
}

/// Serialize sibling nodes as a fragment
pub fn serialize_nodes(nodes: &[Node]) -> String {
    Serializer::new().serialize_nodes(nodes)
}
