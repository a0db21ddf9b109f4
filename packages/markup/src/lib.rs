//! # Marginalia Markup
//!
//! Owned XML tree model plus the tokenizer, parser and serializer that
//! move documents in and out of it.
//!
//! ```text
//! XML text ──tokenize──▶ tokens ──parse──▶ Document ──serialize──▶ XML text
//! ```
//!
//! Every node is owned by exactly one parent, so `Clone` on a
//! [`Document`] yields a fully independent copy.

pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{Attribute, Document, Element, Node};
pub use error::{format_error, ParseError, ParseResult, TokenSpan};
pub use parser::{parse, parse_fragment, Parser};
pub use serializer::{serialize, serialize_node, serialize_nodes, Serializer};
pub use tokenizer::{is_valid_name, tokenize, Token};
