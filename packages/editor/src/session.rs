//! # Edit Session
//!
//! One open document plus everything needed to edit it: the live tree,
//! the tree as it was loaded, the undo ledger and the markup profile.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Parse → Mutate → Commit → Save
//!   ↓      ↓        ↓        ↓       ↓
//! File  Document  copy    History   File
//! ```
//!
//! Every edit is computed on a copy and committed in a single assignment,
//! so a failed or abandoned edit leaves the session exactly as it was.
//! That includes the async service calls: the request is built from the
//! current tree, and nothing is written until the response has parsed and
//! applied cleanly. Dropping one of those futures mid-flight is harmless.

use crate::history::History;
use crate::mutations::{text_in_range, Mutation};
use crate::pages::{segment, Page};
use crate::path::Path;
use crate::profile::MarkupProfile;
use crate::service::AnnotationService;
use crate::suggestions::{find_suggestions, SuggestionRef};
use crate::EditorError;
use marginalia_markup::{parse, parse_fragment, serialize, serialize_node, Document, Node, ParseError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// A character range inside one text node, plus the text it covered when
/// it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub path: Path,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Result of an edit: the session version after it, and whether the tree
/// actually changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    pub version: u64,
    pub changed: bool,
}

pub struct EditSession {
    /// Increments on every committed change, including undo and redo
    pub version: u64,

    document: Document,

    /// Tree as loaded, used by page resets
    original: Document,

    history: History,
    profile: MarkupProfile,

    /// Backing file, if any
    path: Option<PathBuf>,
    dirty: bool,
}

impl EditSession {
    /// Open an in-memory session
    pub fn from_source(source: &str, profile: MarkupProfile) -> Result<Self, EditorError> {
        let document = parse(source)?;
        Ok(Self::with_document(document, profile, None))
    }

    /// Open a file-backed session
    pub fn load(path: impl Into<PathBuf>, profile: MarkupProfile) -> Result<Self, EditorError> {
        let path = path.into();
        let source = std::fs::read_to_string(&path)?;
        let document = parse(&source)?;
        info!(path = %path.display(), "Loaded document");
        Ok(Self::with_document(document, profile, Some(path)))
    }

    fn with_document(document: Document, profile: MarkupProfile, path: Option<PathBuf>) -> Self {
        Self {
            version: 0,
            history: History::new(serialize(&document)),
            original: document.clone(),
            document,
            profile,
            path,
            dirty: false,
        }
    }

    /// Write the current tree back to the backing file
    pub fn save(&mut self) -> Result<(), EditorError> {
        let path = self.path.as_ref().ok_or(EditorError::NotFileBacked)?;
        std::fs::write(path, serialize(&self.document))?;
        self.dirty = false;
        info!(path = %path.display(), version = self.version, "Saved document");
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn original(&self) -> &Document {
        &self.original
    }

    pub fn profile(&self) -> &MarkupProfile {
        &self.profile
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// Unsaved changes exist
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a mutation with fail-soft semantics. Only a changed tree is
    /// committed to history.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<MutationOutcome, EditorError> {
        let updated = mutation.apply(&self.document, &self.profile)?;
        Ok(self.commit(updated, mutation.name()))
    }

    /// Like [`apply`](Self::apply), but unresolvable targets are errors
    pub fn try_apply(&mut self, mutation: &Mutation) -> Result<MutationOutcome, EditorError> {
        let updated = mutation.try_apply(&self.document, &self.profile)?;
        Ok(self.commit(updated, mutation.name()))
    }

    fn commit(&mut self, updated: Document, description: &str) -> MutationOutcome {
        if updated == self.document {
            debug!(description, "Edit left the document unchanged");
            return MutationOutcome {
                version: self.version,
                changed: false,
            };
        }

        self.history.push_with_description(serialize(&updated), description);
        self.document = updated;
        self.version += 1;
        self.dirty = true;
        debug!(description, version = self.version, "Committed edit");

        MutationOutcome {
            version: self.version,
            changed: true,
        }
    }

    /// Step back one version. Returns `false` at the start of history.
    ///
    /// The cursor only moves once the snapshot has parsed.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let Some(snapshot) = self.history.peek_undo() else {
            return Ok(false);
        };
        let document = parse(snapshot)?;
        self.history.undo();
        self.restore(document);
        Ok(true)
    }

    /// Step forward one version. Returns `false` when nothing was undone.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let Some(snapshot) = self.history.peek_redo() else {
            return Ok(false);
        };
        let document = parse(snapshot)?;
        self.history.redo();
        self.restore(document);
        Ok(true)
    }

    fn restore(&mut self, document: Document) {
        self.document = document;
        self.version += 1;
        self.dirty = true;
    }

    pub fn pages(&self) -> Vec<Page> {
        segment(&self.document, &self.profile)
    }

    pub fn page(&self, index: usize) -> Result<Page, EditorError> {
        self.pages()
            .into_iter()
            .nth(index)
            .ok_or(EditorError::PageNotFound(index))
    }

    pub fn suggestions(&self, scope: &Path) -> Vec<SuggestionRef> {
        find_suggestions(&self.document, scope, &self.profile)
    }

    /// Serialized form of the current tree
    pub fn export(&self) -> String {
        serialize(&self.document)
    }

    /// Put page `index` back the way it was when the document was loaded
    pub fn reset_page(&mut self, index: usize) -> Result<MutationOutcome, EditorError> {
        let current = self.page(index)?;
        let loaded = segment(&self.original, &self.profile)
            .into_iter()
            .nth(index)
            .ok_or(EditorError::PageNotFound(index))?;

        let updated = replace_page(&self.document, &current.path, loaded.node.into(), &self.profile)?;
        Ok(self.commit(updated, "reset_page"))
    }

    /// Send the selected text to the annotator and splice the returned
    /// fragment over the selection
    #[instrument(skip(self, service), fields(path = %selection.path))]
    pub async fn annotate_selection(
        &mut self,
        service: &dyn AnnotationService,
        selection: &Selection,
    ) -> Result<MutationOutcome, EditorError> {
        let current = text_in_range(&self.document, &selection.path, selection.start, selection.end)
            .map_err(|_| EditorError::StaleSelection(selection.path.clone()))?;
        if current != selection.text {
            return Err(EditorError::StaleSelection(selection.path.clone()));
        }

        let response = service.annotate(&current).await?;
        let nodes = parse_fragment(&response).map_err(EditorError::MalformedResponse)?;

        let returned: String = nodes.iter().map(Node::text_content).collect();
        if returned != current {
            warn!(sent = %current, returned = %returned, "Annotator changed the selected text");
        }

        let mutation = Mutation::ReplaceRange {
            path: selection.path.clone(),
            start: selection.start,
            end: selection.end,
            nodes,
        };
        let updated = mutation.try_apply(&self.document, &self.profile)?;
        Ok(self.commit(updated, "annotate_selection"))
    }

    /// Send one page to the reviewer and replace it with the result
    #[instrument(skip(self, service))]
    pub async fn review_page(
        &mut self,
        service: &dyn AnnotationService,
        index: usize,
    ) -> Result<MutationOutcome, EditorError> {
        let page = self.page(index)?;
        let markup = serialize_node(&Node::Element(page.node));

        let response = service.review(&markup, false).await?;
        let reviewed = single_element(&response)?;

        let updated = replace_page(&self.document, &page.path, reviewed, &self.profile)?;
        Ok(self.commit(updated, "review_page"))
    }

    /// Send the whole document to the reviewer and adopt the result
    #[instrument(skip(self, service))]
    pub async fn review_document(&mut self, service: &dyn AnnotationService) -> Result<MutationOutcome, EditorError> {
        let markup = serialize(&self.document);

        let response = service.review(&markup, true).await?;
        let reviewed = parse(&response).map_err(EditorError::MalformedResponse)?;

        Ok(self.commit(reviewed, "review_document"))
    }
}

/// Parse a response that must hold exactly one element (blank text around
/// it is allowed)
fn single_element(response: &str) -> Result<Node, EditorError> {
    let nodes = parse_fragment(response).map_err(EditorError::MalformedResponse)?;
    let mut elements = nodes
        .into_iter()
        .filter(|node| !matches!(node, Node::Text(text) if text.trim().is_empty()));

    match (elements.next(), elements.next()) {
        (Some(node @ Node::Element(_)), None) => Ok(node),
        _ => Err(EditorError::MalformedResponse(ParseError::invalid_syntax(
            0..response.len(),
            "expected a single element",
        ))),
    }
}

/// Swap the page at `path` for `node`. The root page replaces the root.
fn replace_page(doc: &Document, path: &Path, node: Node, profile: &MarkupProfile) -> Result<Document, EditorError> {
    if path.is_root() {
        let mut updated = doc.clone();
        if let Node::Element(root) = node {
            updated.root = root;
        }
        return Ok(updated);
    }

    let mutation = Mutation::ReplaceSubtree {
        path: path.clone(),
        node,
    };
    Ok(mutation.try_apply(doc, profile)?)
}
