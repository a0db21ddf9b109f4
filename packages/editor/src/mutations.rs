//! # Tree Mutations
//!
//! Structural edits on a document, addressed by [`Path`].
//!
//! ## Protocol
//!
//! Every mutation follows the same steps:
//!
//! 1. Copy the document (the caller's value is never touched)
//! 2. Resolve the path in the copy
//! 3. Validate, then mutate the copy in place
//! 4. Normalize the affected parent so adjacent text runs merge
//!
//! Validation happens before the first write, so a failing mutation never
//! leaves a half-edited copy behind.
//!
//! ## Failure modes
//!
//! - Resolution failures (missing node, wrong node kind, no parent) are
//!   fail-soft: [`Mutation::apply`] logs them and hands back an unchanged
//!   copy. [`Mutation::try_apply`] reports them.
//! - [`MutationError::InvalidRange`] is always reported: offsets are
//!   counted in characters and must satisfy `start < end <= len`.
//! - [`MutationError::InvalidName`] is always reported: a new element or
//!   attribute name must serialize back into parseable markup.

use crate::path::{resolve, resolve_element, resolve_element_mut, resolve_mut, Path};
use crate::profile::MarkupProfile;
use crate::suggestions;
use marginalia_markup::{is_valid_name, Document, Element, Node};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Structural edits (serializable so they can be logged or sent over a wire)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Mutation {
    /// Wrap characters `[start, end)` of a text node in a new element
    WrapRange {
        path: Path,
        start: usize,
        end: usize,
        tag: String,
    },

    /// Replace characters `[start, end)` of a text node with a node sequence
    ReplaceRange {
        path: Path,
        start: usize,
        end: usize,
        nodes: Vec<Node>,
    },

    /// Splice an element's children into its parent and drop the element
    Unwrap { path: Path },

    /// Substitute a whole subtree
    ReplaceSubtree { path: Path, node: Node },

    /// Replace a node with a sequence of nodes
    SpliceFragment { path: Path, nodes: Vec<Node> },

    /// Replace the entire text content of a text node or element
    SetText { path: Path, text: String },

    SetAttribute {
        path: Path,
        name: String,
        value: String,
    },

    AcceptSuggestion { path: Path },

    DeclineSuggestion { path: Path },

    /// Accept every suggestion at or below `scope`
    AcceptAll { scope: Path },

    /// Decline every suggestion at or below `scope`
    DeclineAll { scope: Path },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(Path),

    #[error("Node has no parent: {0}")]
    NoParent(Path),

    #[error("Node at {path} is not {expected}")]
    WrongNodeKind { path: Path, expected: &'static str },

    #[error("Node at {0} is not a resolvable suggestion")]
    NotASuggestion(Path),

    #[error("Range {start}..{end} is invalid for text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("'{0}' is not a valid element or attribute name")]
    InvalidName(String),
}

impl MutationError {
    /// Errors the fail-soft layer swallows
    pub fn is_resolution_failure(&self) -> bool {
        !matches!(
            self,
            MutationError::InvalidRange { .. } | MutationError::InvalidName(_)
        )
    }
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::WrapRange { .. } => "wrap_range",
            Mutation::ReplaceRange { .. } => "replace_range",
            Mutation::Unwrap { .. } => "unwrap",
            Mutation::ReplaceSubtree { .. } => "replace_subtree",
            Mutation::SpliceFragment { .. } => "splice_fragment",
            Mutation::SetText { .. } => "set_text",
            Mutation::SetAttribute { .. } => "set_attribute",
            Mutation::AcceptSuggestion { .. } => "accept_suggestion",
            Mutation::DeclineSuggestion { .. } => "decline_suggestion",
            Mutation::AcceptAll { .. } => "accept_all",
            Mutation::DeclineAll { .. } => "decline_all",
        }
    }

    /// Apply to a copy, reporting every failure
    pub fn try_apply(&self, doc: &Document, profile: &MarkupProfile) -> Result<Document, MutationError> {
        let mut copy = doc.clone();
        self.apply_in_place(&mut copy, profile)?;
        Ok(copy)
    }

    /// Apply to a copy; resolution failures return the document unchanged
    pub fn apply(&self, doc: &Document, profile: &MarkupProfile) -> Result<Document, MutationError> {
        match self.try_apply(doc, profile) {
            Ok(updated) => Ok(updated),
            Err(err) if err.is_resolution_failure() => {
                debug!(mutation = self.name(), error = %err, "Mutation skipped");
                Ok(doc.clone())
            }
            Err(err) => Err(err),
        }
    }

    /// Mutate `doc` directly. Validation runs before any write.
    pub fn apply_in_place(&self, doc: &mut Document, profile: &MarkupProfile) -> Result<(), MutationError> {
        match self {
            Mutation::WrapRange { path, start, end, tag } => {
                ensure_name(tag)?;
                wrap_range_in_place(doc, path, *start, *end, tag)
            }
            Mutation::ReplaceRange { path, start, end, nodes } => {
                replace_range_in_place(doc, path, *start, *end, nodes.clone())
            }
            Mutation::Unwrap { path } => unwrap_in_place(doc, path),
            Mutation::ReplaceSubtree { path, node } => {
                splice_in_place(doc, path, vec![node.clone()])
            }
            Mutation::SpliceFragment { path, nodes } => splice_in_place(doc, path, nodes.clone()),
            Mutation::SetText { path, text } => set_text_in_place(doc, path, text),
            Mutation::SetAttribute { path, name, value } => {
                ensure_name(name)?;
                let element = resolve_element_mut(doc, path).ok_or_else(|| not_an_element(path.clone()))?;
                element.set_attribute(name.clone(), value.clone());
                Ok(())
            }
            Mutation::AcceptSuggestion { path } => suggestions::accept_in_place(doc, path, profile),
            Mutation::DeclineSuggestion { path } => suggestions::decline_in_place(doc, path, profile),
            Mutation::AcceptAll { scope } => {
                ensure_element(doc, scope)?;
                suggestions::accept_all_in_scope(doc, scope, profile);
                Ok(())
            }
            Mutation::DeclineAll { scope } => {
                ensure_element(doc, scope)?;
                suggestions::decline_all_in_scope(doc, scope, profile);
                Ok(())
            }
        }
    }
}

fn ensure_name(name: &str) -> Result<(), MutationError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(MutationError::InvalidName(name.to_string()))
    }
}

fn not_an_element(path: Path) -> MutationError {
    MutationError::WrongNodeKind {
        path,
        expected: "an element",
    }
}

fn ensure_element(doc: &Document, path: &Path) -> Result<(), MutationError> {
    resolve_element(doc, path)
        .map(|_| ())
        .ok_or_else(|| not_an_element(path.clone()))
}

/// Children of the parent of `path`, plus the node's index in them
pub(crate) fn parent_children_mut<'a>(
    doc: &'a mut Document,
    path: &Path,
) -> Result<(&'a mut Vec<Node>, usize), MutationError> {
    let (parent_path, index) = path.parent().ok_or_else(|| MutationError::NoParent(path.clone()))?;
    let parent = resolve_element_mut(doc, &parent_path)
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;

    if index >= parent.children.len() {
        return Err(MutationError::NodeNotFound(path.clone()));
    }
    Ok((&mut parent.children, index))
}

/// Normalize the parent of `path` (or the root for the root path)
pub(crate) fn normalize_parent(doc: &mut Document, path: &Path) {
    let parent_path = path.parent().map(|(parent, _)| parent).unwrap_or_default();
    if let Some(parent) = resolve_element_mut(doc, &parent_path) {
        parent.normalize();
    }
}

/// Replace the node at `path` with `nodes`, in order
pub(crate) fn splice_in_place(doc: &mut Document, path: &Path, nodes: Vec<Node>) -> Result<(), MutationError> {
    let (children, index) = parent_children_mut(doc, path)?;
    children.splice(index..=index, nodes);
    normalize_parent(doc, path);
    Ok(())
}

/// Split a text node at character offsets
fn split_text(text: &str, start: usize, end: usize) -> Result<(&str, &str, &str), MutationError> {
    let len = text.chars().count();
    if start >= end || end > len {
        return Err(MutationError::InvalidRange { start, end, len });
    }

    let byte_at = |offset: usize| {
        text.char_indices()
            .nth(offset)
            .map(|(byte, _)| byte)
            .unwrap_or(text.len())
    };
    let (start_byte, end_byte) = (byte_at(start), byte_at(end));

    Ok((
        &text[..start_byte],
        &text[start_byte..end_byte],
        &text[end_byte..],
    ))
}

/// Characters `[start, end)` of the text node at `path`
pub fn text_in_range(doc: &Document, path: &Path, start: usize, end: usize) -> Result<String, MutationError> {
    match resolve(doc, path) {
        Some(Node::Text(text)) => split_text(text, start, end).map(|(_, selected, _)| selected.to_string()),
        Some(_) => Err(MutationError::WrongNodeKind {
            path: path.clone(),
            expected: "a text node",
        }),
        None => Err(MutationError::NodeNotFound(path.clone())),
    }
}

fn replace_range_in_place(
    doc: &mut Document,
    path: &Path,
    start: usize,
    end: usize,
    nodes: Vec<Node>,
) -> Result<(), MutationError> {
    replace_range_with(doc, path, start, end, |_| nodes)
}

fn wrap_range_in_place(
    doc: &mut Document,
    path: &Path,
    start: usize,
    end: usize,
    tag: &str,
) -> Result<(), MutationError> {
    replace_range_with(doc, path, start, end, |selected| {
        vec![Node::Element(Element::new(tag).with_text(selected))]
    })
}

/// Shared body of wrap/replace: `[before] + middle(selected) + [after]`
fn replace_range_with(
    doc: &mut Document,
    path: &Path,
    start: usize,
    end: usize,
    middle: impl FnOnce(&str) -> Vec<Node>,
) -> Result<(), MutationError> {
    let text = match resolve_mut(doc, path) {
        Some(Node::Text(text)) => text.clone(),
        Some(_) => {
            return Err(MutationError::WrongNodeKind {
                path: path.clone(),
                expected: "a text node",
            })
        }
        None => return Err(MutationError::NodeNotFound(path.clone())),
    };

    let (before, selected, after) = split_text(&text, start, end)?;

    let mut replacement = Vec::with_capacity(3);
    if !before.is_empty() {
        replacement.push(Node::text(before));
    }
    replacement.extend(middle(selected));
    if !after.is_empty() {
        replacement.push(Node::text(after));
    }

    splice_in_place(doc, path, replacement)
}

pub(crate) fn unwrap_in_place(doc: &mut Document, path: &Path) -> Result<(), MutationError> {
    let (children, index) = parent_children_mut(doc, path)?;
    let Node::Element(element) = &mut children[index] else {
        return Err(not_an_element(path.clone()));
    };

    let inner = std::mem::take(&mut element.children);
    children.splice(index..=index, inner);
    normalize_parent(doc, path);
    Ok(())
}

fn set_text_in_place(doc: &mut Document, path: &Path, text: &str) -> Result<(), MutationError> {
    if path.is_root() {
        doc.root.children = vec![Node::text(text)];
        doc.root.normalize();
        return Ok(());
    }

    match resolve_mut(doc, path) {
        Some(Node::Text(content)) => *content = text.to_string(),
        Some(Node::Element(element)) => element.children = vec![Node::text(text)],
        Some(_) => {
            return Err(MutationError::WrongNodeKind {
                path: path.clone(),
                expected: "a text node or element",
            })
        }
        None => return Err(MutationError::NodeNotFound(path.clone())),
    }

    normalize_parent(doc, path);
    Ok(())
}

/// Path of the element created by `wrap_range(path, start, ..)`
pub fn wrapped_element_path(path: &Path, start: usize) -> Path {
    match path.parent() {
        Some((parent, index)) => parent.child(if start > 0 { index + 1 } else { index }),
        None => path.clone(),
    }
}

/// Wrap characters `[start, end)` of the text node at `path` in `<tag>`.
/// Returns the document unchanged when `path` is not a text node.
pub fn wrap_range(
    doc: &Document,
    path: &Path,
    start: usize,
    end: usize,
    tag: &str,
) -> Result<Document, MutationError> {
    Mutation::WrapRange {
        path: path.clone(),
        start,
        end,
        tag: tag.to_string(),
    }
    .apply(doc, &MarkupProfile::default())
}

/// Splice the element's children into its parent and drop the element
pub fn unwrap(doc: &Document, path: &Path) -> Document {
    fail_soft(doc, |copy| unwrap_in_place(copy, path))
}

/// Substitute `node` for the subtree at `path`
pub fn replace_subtree(doc: &Document, path: &Path, node: Node) -> Document {
    fail_soft(doc, |copy| splice_in_place(copy, path, vec![node]))
}

/// Replace the node at `path` with a sequence of nodes
pub fn splice_fragment(doc: &Document, path: &Path, nodes: Vec<Node>) -> Document {
    fail_soft(doc, |copy| splice_in_place(copy, path, nodes))
}

/// Replace the whole text content at `path`; element markup is discarded
pub fn set_text(doc: &Document, path: &Path, text: &str) -> Document {
    fail_soft(doc, |copy| set_text_in_place(copy, path, text))
}

pub(crate) fn fail_soft(doc: &Document, edit: impl FnOnce(&mut Document) -> Result<(), MutationError>) -> Document {
    let mut copy = doc.clone();
    match edit(&mut copy) {
        Ok(()) => copy,
        Err(err) => {
            debug!(error = %err, "Mutation skipped");
            doc.clone()
        }
    }
}
