use crate::ast::*;
use crate::error::{ParseError, ParseResult, TokenSpan};
use crate::tokenizer::{tokenize, tokenize_tag, TagToken, Token};
use std::ops::Range;
use tracing::{debug, instrument};

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Recursive-descent parser over the markup token stream
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

/// A start or empty tag after its internals are split
struct OpenTag {
    name: String,
    attributes: Vec<Attribute>,
}

impl<'src> Parser<'src> {
    /// Lex the source; any unrecognised input fails up front.
    ///
    /// A leading byte order mark is skipped. Spans still index `source`.
    pub fn new(source: &'src str) -> ParseResult<Self> {
        let bom = if source.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };

        let mut tokens = Vec::new();
        for (token, span) in tokenize(&source[bom..]) {
            let span = span.start + bom..span.end + bom;
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    let found = source.get(span.clone()).unwrap_or("").to_string();
                    return Err(ParseError::lex_error(
                        span,
                        format!("unrecognised markup '{}'", found),
                    ));
                }
            }
        }

        Ok(Self { tokens, pos: 0 })
    }

    /// Parse a complete document with exactly one root element
    #[instrument(skip(self), fields(tokens = self.tokens.len()))]
    pub fn parse_document(&mut self) -> ParseResult<Document> {
        let mut prolog = Vec::new();
        let mut doctype = None;
        let mut root = None;
        let mut epilog = Vec::new();

        while let Some((token, span)) = self.advance() {
            match token {
                Token::Text(_) if token.is_blank() => {}
                Token::Comment(raw) | Token::Instruction(raw) => {
                    let node = if matches!(token, Token::Comment(_)) {
                        comment_node(raw)
                    } else {
                        instruction_node(raw)
                    };
                    if root.is_none() {
                        prolog.push(node);
                    } else {
                        epilog.push(node);
                    }
                }
                Token::Doctype(raw) if root.is_none() && doctype.is_none() => {
                    doctype = Some(raw.to_string());
                }
                Token::StartTag(raw) | Token::EmptyTag(raw) if root.is_none() => {
                    let empty = matches!(token, Token::EmptyTag(_));
                    root = Some(self.parse_element(raw, span, empty)?);
                }
                other => {
                    let expected = if root.is_none() {
                        "root element"
                    } else {
                        "end of document"
                    };
                    return Err(ParseError::unexpected_token(span, expected, other.to_string()));
                }
            }
        }

        let root = root.ok_or_else(|| ParseError::unexpected_eof("root element"))?;
        debug!(root = %root.name, "Parsed document");

        Ok(Document {
            prolog,
            doctype,
            root,
            epilog,
        })
    }

    /// Parse a fragment: any sequence of text, elements, comments and
    /// processing instructions
    pub fn parse_fragment(&mut self) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();

        while let Some((token, span)) = self.advance() {
            match token {
                Token::EndTag(raw) => {
                    return Err(ParseError::unexpected_token(
                        span,
                        "content",
                        format!("unmatched {}", raw),
                    ));
                }
                Token::Doctype(_) => {
                    return Err(ParseError::invalid_syntax(span, "doctype inside fragment"));
                }
                _ => {
                    if let Some(node) = self.parse_content(token, span)? {
                        push_node(&mut nodes, node);
                    }
                }
            }
        }

        Ok(nodes)
    }

    /// Parse one element whose start tag has just been consumed
    fn parse_element(&mut self, raw: &str, span: Range<usize>, empty: bool) -> ParseResult<Element> {
        let open = parse_open_tag(raw, &span)?;
        let mut element = Element {
            name: open.name,
            attributes: open.attributes,
            children: Vec::new(),
        };

        if empty {
            return Ok(element);
        }

        loop {
            let Some((token, token_span)) = self.advance() else {
                return Err(ParseError::unexpected_eof(format!("</{}>", element.name)));
            };

            match token {
                Token::EndTag(end_raw) => {
                    let found = end_tag_name(end_raw);
                    if found != element.name {
                        return Err(ParseError::MismatchedTag {
                            span: token_span.into(),
                            expected: element.name,
                            found: found.to_string(),
                        });
                    }
                    return Ok(element);
                }
                Token::Doctype(_) => {
                    return Err(ParseError::invalid_syntax(token_span, "doctype inside element"));
                }
                _ => {
                    if let Some(node) = self.parse_content(token, token_span)? {
                        push_node(&mut element.children, node);
                    }
                }
            }
        }
    }

    /// Turn one content token into a node (recursing for elements)
    fn parse_content(&mut self, token: Token<'src>, span: Range<usize>) -> ParseResult<Option<Node>> {
        let node = match token {
            Token::Text(raw) => Node::Text(decode_entities(raw, span.start)?),
            Token::CData(raw) => {
                let inner = &raw["<![CDATA[".len()..raw.len() - "]]>".len()];
                Node::Text(inner.to_string())
            }
            Token::Comment(raw) => comment_node(raw),
            Token::Instruction(raw) => instruction_node(raw),
            Token::StartTag(raw) => Node::Element(self.parse_element(raw, span, false)?),
            Token::EmptyTag(raw) => Node::Element(self.parse_element(raw, span, true)?),
            Token::EndTag(_) | Token::Doctype(_) => return Ok(None),
        };
        Ok(Some(node))
    }

    fn advance(&mut self) -> Option<(Token<'src>, Range<usize>)> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }
}

/// Adjacent text from text and CDATA tokens lands in a single node
fn push_node(nodes: &mut Vec<Node>, node: Node) {
    if let (Some(Node::Text(prev)), Node::Text(text)) = (nodes.last_mut(), &node) {
        prev.push_str(text);
        return;
    }
    nodes.push(node);
}

fn comment_node(raw: &str) -> Node {
    Node::Comment(raw["<!--".len()..raw.len() - "-->".len()].to_string())
}

fn instruction_node(raw: &str) -> Node {
    let inner = &raw["<?".len()..raw.len() - "?>".len()];
    match inner.split_once(|c: char| c.is_whitespace()) {
        Some((target, data)) => Node::Instruction {
            target: target.to_string(),
            data: data.trim_start().to_string(),
        },
        None => Node::Instruction {
            target: inner.to_string(),
            data: String::new(),
        },
    }
}

fn end_tag_name(raw: &str) -> &str {
    raw["</".len()..raw.len() - 1].trim_end()
}

/// Split a start/empty tag slice into its name and attributes
fn parse_open_tag(raw: &str, span: &Range<usize>) -> ParseResult<OpenTag> {
    let offset = span.start;
    let mut tokens = tokenize_tag(raw).into_iter();

    let name = match (tokens.next(), tokens.next()) {
        (Some((TagToken::Open, _)), Some((TagToken::Name(name), _))) => name.to_string(),
        _ => return Err(ParseError::invalid_syntax(span.clone(), "malformed start tag")),
    };

    let mut attributes: Vec<Attribute> = Vec::new();
    loop {
        match tokens.next() {
            Some((TagToken::Close, _)) | Some((TagToken::SelfClose, _)) => break,
            Some((TagToken::Name(attr_name), attr_span)) => {
                let value = match (tokens.next(), tokens.next()) {
                    (Some((TagToken::Equals, _)), Some((TagToken::Quoted(value), value_span))) => {
                        decode_entities(value, offset + value_span.start + 1)?
                    }
                    _ => {
                        return Err(ParseError::invalid_syntax(
                            offset + attr_span.start..offset + attr_span.end,
                            format!("attribute '{}' has no quoted value", attr_name),
                        ))
                    }
                };

                if attributes.iter().any(|attr| attr.name == attr_name) {
                    return Err(ParseError::DuplicateAttribute {
                        span: TokenSpan::new(offset + attr_span.start, offset + attr_span.end),
                        name: attr_name.to_string(),
                    });
                }
                attributes.push(Attribute::new(attr_name, value));
            }
            Some((other, other_span)) => {
                return Err(ParseError::unexpected_token(
                    offset + other_span.start..offset + other_span.end,
                    "attribute or '>'",
                    format!("{:?}", other),
                ))
            }
            None => return Err(ParseError::unexpected_eof("'>'")),
        }
    }

    Ok(OpenTag { name, attributes })
}

/// Decode the predefined entities and character references
pub fn decode_entities(raw: &str, offset: usize) -> ParseResult<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut consumed = 0;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let start = offset + consumed + amp;

        let Some(semi) = after.find(';') else {
            return Err(ParseError::invalid_syntax(
                start..start + 1,
                "unterminated entity reference",
            ));
        };

        let name = &after[..semi];
        let end = start + semi + 2;
        out.push(resolve_entity(name).ok_or_else(|| ParseError::UnknownEntity {
            span: TokenSpan::new(start, end),
            name: name.to_string(),
        })?);

        let advance = amp + semi + 2;
        consumed += advance;
        rest = &rest[advance..];
    }

    out.push_str(rest);
    Ok(out)
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Parse a complete document
pub fn parse(source: &str) -> ParseResult<Document> {
    Parser::new(source)?.parse_document()
}

/// Parse a markup fragment into a node list
pub fn parse_fragment(source: &str) -> ParseResult<Vec<Node>> {
    Parser::new(source)?.parse_fragment()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = parse(r#"<TEI><text><body><p n="1">Hello</p></body></text></TEI>"#).unwrap();

        assert_eq!(doc.root.name, "TEI");
        let p = doc.root.children[0].children()[0].children()[0]
            .as_element()
            .unwrap();
        assert_eq!(p.name, "p");
        assert_eq!(p.attribute("n"), Some("1"));
        assert_eq!(p.children[0], Node::text("Hello"));
    }

    #[test]
    fn test_prolog_and_epilog() {
        let source = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE TEI>\n<!-- head -->\n<TEI/>\n<!-- tail -->\n";
        let doc = parse(source).unwrap();

        assert_eq!(doc.prolog.len(), 2);
        assert_eq!(
            doc.prolog[0],
            Node::Instruction {
                target: "xml".to_string(),
                data: "version=\"1.0\" encoding=\"UTF-8\"".to_string(),
            }
        );
        assert_eq!(doc.doctype.as_deref(), Some("<!DOCTYPE TEI>"));
        assert_eq!(doc.epilog, vec![Node::Comment(" tail ".to_string())]);
    }

    #[test]
    fn test_entities_decoded() {
        let doc = parse(r#"<p title="a &quot;b&quot;">x &lt; y &amp; z &#65;&#x42;</p>"#).unwrap();

        assert_eq!(doc.root.attribute("title"), Some("a \"b\""));
        assert_eq!(doc.root.children[0], Node::text("x < y & z AB"));
    }

    #[test]
    fn test_cdata_merges_with_text() {
        let doc = parse("<p>a<![CDATA[<b>]]>c</p>").unwrap();
        assert_eq!(doc.root.children, vec![Node::text("a<b>c")]);
    }

    #[test]
    fn test_whitespace_preserved() {
        let doc = parse("<p>  <hi>x</hi>\n</p>").unwrap();
        assert_eq!(doc.root.children[0], Node::text("  "));
        assert_eq!(doc.root.children[2], Node::text("\n"));
    }

    #[test]
    fn test_byte_order_mark_skipped() {
        let doc = parse("\u{FEFF}<?xml version=\"1.0\"?>\n<TEI><p>x</p></TEI>").unwrap();

        assert_eq!(doc.root.name, "TEI");
        assert_eq!(doc.prolog.len(), 1);
    }

    #[test]
    fn test_byte_order_mark_keeps_error_spans() {
        let err = parse("\u{FEFF}<p>&nbsp;</p>").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownEntity {
                span: TokenSpan::new(6, 12),
                name: "nbsp".to_string(),
            }
        );
    }

    #[test]
    fn test_cdata_and_instruction_ending_in_delimiter_runs() {
        let doc = parse("<p><?note ok??><![CDATA[a]]]></p>").unwrap();

        assert_eq!(
            doc.root.children[0],
            Node::Instruction {
                target: "note".to_string(),
                data: "ok?".to_string(),
            }
        );
        assert_eq!(doc.root.children[1], Node::text("a]"));
    }

    #[test]
    fn test_mismatched_tag() {
        let err = parse("<p><hi>x</p></hi>").unwrap_err();
        assert!(matches!(err, ParseError::MismatchedTag { .. }));
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse("<p><hi>x</hi>").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_unknown_entity() {
        let err = parse("<p>&nbsp;</p>").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownEntity {
                span: TokenSpan::new(3, 9),
                name: "nbsp".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = parse(r#"<p n="1" n="2"/>"#).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateAttribute { .. }));
    }

    #[test]
    fn test_two_roots_rejected() {
        assert!(parse("<a/><b/>").is_err());
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(parse("  ").unwrap_err(), ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_parse_fragment_mixed_content() {
        let nodes = parse_fragment("I met <persName>John</persName> in <placeName>Rome</placeName>.").unwrap();

        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[0], Node::text("I met "));
        assert_eq!(nodes[1].as_element().unwrap().name, "persName");
        assert_eq!(nodes[4], Node::text("."));
    }

    #[test]
    fn test_parse_fragment_rejects_unmatched_end() {
        assert!(parse_fragment("text</p>").is_err());
        assert!(parse_fragment("<p>text").is_err());
    }
}
