//! Error types for the editor

use crate::mutations::MutationError;
use crate::service::ServiceError;
use marginalia_markup::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Annotation service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Annotation service returned malformed markup: {0}")]
    MalformedResponse(ParseError),

    #[error("Page not found: {0}")]
    PageNotFound(usize),

    #[error("Selection no longer matches the document at {0}")]
    StaleSelection(crate::Path),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document is not file-backed")]
    NotFileBacked,
}
