use logos::Logos;
use std::fmt;

/// Top-level markup tokens
///
/// Tags are lexed whole; their internals are split by [`TagToken`].
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    #[regex(r"<!--([^-]|-[^-])*-->", |lex| lex.slice())]
    Comment(&'src str),

    #[regex(r"<!\[CDATA\[([^\]]|\][^\]]|\]\]+[^\]>])*\]\]+>", |lex| lex.slice())]
    CData(&'src str),

    #[regex(r"<\?([^?]|\?+[^?>])*\?+>", |lex| lex.slice())]
    Instruction(&'src str),

    #[regex(r"<!DOCTYPE[^>\[]*(\[[^\]]*\])?[^>]*>", |lex| lex.slice())]
    Doctype(&'src str),

    #[regex(
        r#"<[A-Za-z_:][A-Za-z0-9_:.\-]*(\s+[A-Za-z_:][A-Za-z0-9_:.\-]*\s*=\s*("[^"<]*"|'[^'<]*'))*\s*>"#,
        |lex| lex.slice()
    )]
    StartTag(&'src str),

    #[regex(
        r#"<[A-Za-z_:][A-Za-z0-9_:.\-]*(\s+[A-Za-z_:][A-Za-z0-9_:.\-]*\s*=\s*("[^"<]*"|'[^'<]*'))*\s*/>"#,
        |lex| lex.slice()
    )]
    EmptyTag(&'src str),

    #[regex(r"</[A-Za-z_:][A-Za-z0-9_:.\-]*\s*>", |lex| lex.slice())]
    EndTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens inside a single start, end or empty tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum TagToken<'src> {
    #[token("<")]
    Open,

    #[token(">")]
    Close,

    #[token("/>")]
    SelfClose,

    #[token("=")]
    Equals,

    #[regex(r"[A-Za-z_:][A-Za-z0-9_:.\-]*", |lex| lex.slice())]
    Name(&'src str),

    #[regex(r#""[^"]*""#, |lex| &lex.slice()[1..lex.slice().len() - 1])]
    #[regex(r"'[^']*'", |lex| &lex.slice()[1..lex.slice().len() - 1])]
    Quoted(&'src str),
}

impl<'src> Token<'src> {
    /// Whitespace-only text between top-level constructs
    pub fn is_blank(&self) -> bool {
        matches!(self, Token::Text(text) if text.trim().is_empty())
    }
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Comment(_) => write!(f, "comment"),
            Token::CData(_) => write!(f, "CDATA section"),
            Token::Instruction(s) => write!(f, "processing instruction {}", s),
            Token::Doctype(_) => write!(f, "doctype"),
            Token::StartTag(s) => write!(f, "start tag {}", s),
            Token::EmptyTag(s) => write!(f, "empty tag {}", s),
            Token::EndTag(s) => write!(f, "end tag {}", s),
            Token::Text(_) => write!(f, "text"),
        }
    }
}

/// Tokenize a source string
///
/// Unrecognised input (a stray `<`, an unterminated tag) is reported as
/// `Err(range)` so the parser can point at it.
pub fn tokenize(source: &str) -> Vec<(Result<Token<'_>, ()>, std::ops::Range<usize>)> {
    Token::lexer(source).spanned().collect()
}

/// Tokenize the inside of one tag slice
pub fn tokenize_tag(tag: &str) -> Vec<(TagToken<'_>, std::ops::Range<usize>)> {
    TagToken::lexer(tag)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, span)))
        .collect()
}

/// Whether `name` is usable as an element or attribute name
pub fn is_valid_name(name: &str) -> bool {
    let mut lexer = TagToken::lexer(name).spanned();
    match (lexer.next(), lexer.next()) {
        (Some((Ok(TagToken::Name(_)), span)), None) => span == (0..name.len()),
        _ => false,
    }
}
