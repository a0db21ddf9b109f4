//! # Marginalia Editor
//!
//! Editing engine for TEI-style scholarly documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: XML text → Document tree            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: path-addressed edits on the tree    │
//! │  - Wrap, unwrap, replace and retext nodes   │
//! │  - Split the document into pages            │
//! │  - Accept or decline review suggestions     │
//! │  - Snapshot history for undo/redo           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ markup: Document tree → XML text            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Copies, not edits**: every mutation returns a new document
//! 2. **Positional addressing**: a [`Path`] is only valid for the tree it
//!    was computed against
//! 3. **Fail soft**: an edit whose target cannot be found is a no-op
//! 4. **Suggestions are terminal**: resolving one removes its wrapper
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marginalia_editor::{EditSession, MarkupProfile, Mutation, Path};
//!
//! let mut session = EditSession::load("letter.xml", MarkupProfile::default())?;
//!
//! session.apply(&Mutation::WrapRange {
//!     path: "/1/0/0/0/0".parse()?,
//!     start: 5,
//!     end: 9,
//!     tag: "persName".to_string(),
//! })?;
//!
//! session.apply(&Mutation::AcceptAll { scope: Path::root() })?;
//! session.save()?;
//! ```

mod errors;
mod history;
mod mutations;
mod pages;
mod path;
mod profile;
mod service;
mod session;
mod suggestions;

pub use errors::EditorError;
pub use history::{History, HistoryEntry};
pub use mutations::{
    replace_subtree, set_text, splice_fragment, text_in_range, unwrap, wrap_range, wrapped_element_path, Mutation,
    MutationError,
};
pub use pages::{segment, Page};
pub use path::{child_path, resolve, resolve_element, resolve_element_mut, resolve_mut, Path, PathParseError};
pub use profile::{ContainerRole, EntityKind, EntityTags, MarkupProfile, NodeKind, SuggestionMode};
pub use service::{AnnotationService, ServiceError};
pub use session::{EditSession, MutationOutcome, Selection};
pub use suggestions::{accept, accept_all_in_scope, decline, decline_all_in_scope, find_suggestions, SuggestionRef};

// Re-export the tree types for convenience
pub use marginalia_markup::{Document, Element, Node};
