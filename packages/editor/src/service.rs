//! # Annotation Service
//!
//! The external annotator/reviewer the editor hands text and markup to.
//! How it is reached (prompting, transport, retries) is up to the
//! implementation; the editor only applies what comes back.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait AnnotationService: Send + Sync {
    /// Annotate plain text, returning a markup fragment covering it
    async fn annotate(&self, text: &str) -> Result<String, ServiceError>;

    /// Review a page (`full_document == false`) or a whole document,
    /// returning the reviewed markup, usually with suggestion elements
    async fn review(&self, markup: &str, full_document: bool) -> Result<String, ServiceError>;
}
