//! Error types for the markup parser

use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Byte range into the parsed source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl From<std::ops::Range<usize>> for TokenSpan {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Parse error with location and context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected token at {span:?}: expected {expected}, found {found}")]
    UnexpectedToken {
        span: TokenSpan,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Invalid syntax at {span:?}: {message}")]
    InvalidSyntax { span: TokenSpan, message: String },

    #[error("Lexer error at {span:?}: {message}")]
    LexError { span: TokenSpan, message: String },

    #[error("Mismatched end tag at {span:?}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        span: TokenSpan,
        expected: String,
        found: String,
    },

    #[error("Unknown entity reference &{name}; at {span:?}")]
    UnknownEntity { span: TokenSpan, name: String },

    #[error("Duplicate attribute '{name}' at {span:?}")]
    DuplicateAttribute { span: TokenSpan, name: String },
}

impl ParseError {
    pub fn unexpected_token(
        span: impl Into<TokenSpan>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            span: span.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(span: impl Into<TokenSpan>, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span: span.into(),
            message: message.into(),
        }
    }

    pub fn lex_error(span: impl Into<TokenSpan>, message: impl Into<String>) -> Self {
        Self::LexError {
            span: span.into(),
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<TokenSpan> {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::LexError { span, .. }
            | ParseError::MismatchedTag { span, .. }
            | ParseError::UnknownEntity { span, .. }
            | ParseError::DuplicateAttribute { span, .. } => Some(*span),
            ParseError::UnexpectedEof { .. } => None,
        }
    }

    /// Short label used under the caret in pretty reports
    fn label(&self) -> String {
        match self {
            ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
            ParseError::UnexpectedEof { expected } => format!("expected {}", expected),
            ParseError::InvalidSyntax { message, .. } => message.clone(),
            ParseError::LexError { message, .. } => message.clone(),
            ParseError::MismatchedTag { expected, .. } => format!("expected </{}>", expected),
            ParseError::UnknownEntity { name, .. } => format!("unknown entity '{}'", name),
            ParseError::DuplicateAttribute { name, .. } => format!("'{}' already set", name),
        }
    }
}

/// Pretty-print an error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = error.span().unwrap_or(TokenSpan {
        start: source.len().saturating_sub(1),
        end: source.len(),
    });

    let report = Report::build(ReportKind::Error, filename, span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, span.start..span.end))
                .with_color(Color::Red)
                .with_message(error.label()),
        )
        .finish();

    let mut output = Vec::new();
    if report
        .write((filename, Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}

/// Plain fallback when ariadne is disabled
#[cfg(not(feature = "pretty-errors"))]
pub fn format_error(_source: &str, filename: &str, error: &ParseError) -> String {
    format!("{}: {}", filename, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_accessor() {
        let err = ParseError::invalid_syntax(3..7, "bad");
        assert_eq!(err.span(), Some(TokenSpan::new(3, 7)));
        assert_eq!(ParseError::unexpected_eof("</p>").span(), None);
    }

    #[test]
    fn test_format_error_mentions_message() {
        let source = "<p>a</q>";
        let err = ParseError::MismatchedTag {
            span: TokenSpan::new(4, 8),
            expected: "p".to_string(),
            found: "q".to_string(),
        };

        let report = format_error(source, "doc.xml", &err);
        assert!(report.contains("Mismatched end tag"));
    }
}
