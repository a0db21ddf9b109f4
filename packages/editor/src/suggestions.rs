//! # Suggestion Lifecycle
//!
//! A suggestion is a wrapper element proposing an edit to the annotation
//! of its content:
//!
//! - `addition` / `correction`: wrap the content in a `type` element
//! - `deletion`: strip entity annotations from the content
//!
//! Each one is resolved exactly once. Accepting or declining removes the
//! wrapper, so a resolved suggestion no longer exists in the tree.

use crate::mutations::{fail_soft, normalize_parent, parent_children_mut, MutationError};
use crate::path::{resolve_element, resolve_element_mut, Path};
use crate::profile::{MarkupProfile, NodeKind, SuggestionMode};
use marginalia_markup::{Document, Element, Node};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A pending suggestion found in the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRef {
    pub path: Path,
    pub mode: SuggestionMode,
    pub target_type: Option<String>,
    pub reason: Option<String>,
    /// Plain text of the suggestion's content
    pub text: String,
}

/// Every suggestion at or below `scope`, in document order
pub fn find_suggestions(doc: &Document, scope: &Path, profile: &MarkupProfile) -> Vec<SuggestionRef> {
    let mut found = Vec::new();
    if let Some(element) = resolve_element(doc, scope) {
        collect(element, scope.clone(), profile, &mut found);
    }
    found
}

fn collect(element: &Element, path: Path, profile: &MarkupProfile, found: &mut Vec<SuggestionRef>) {
    if let NodeKind::Suggestion(mode) = profile.classify_element(element) {
        found.push(SuggestionRef {
            path: path.clone(),
            mode,
            target_type: element.attribute("type").map(str::to_string),
            reason: element.attribute("reason").map(str::to_string),
            text: element.text_content(),
        });
    }

    for (index, child) in element.children.iter().enumerate() {
        if let Node::Element(child) = child {
            collect(child, path.child(index), profile, found);
        }
    }
}

/// The suggestion element at `path` and its mode
fn suggestion_at<'a>(
    doc: &'a Document,
    path: &Path,
    profile: &MarkupProfile,
) -> Result<(&'a Element, SuggestionMode), MutationError> {
    if path.is_root() {
        return Err(MutationError::NoParent(path.clone()));
    }

    let element = resolve_element(doc, path).ok_or_else(|| MutationError::NotASuggestion(path.clone()))?;
    match profile.classify_element(element) {
        NodeKind::Suggestion(mode) => Ok((element, mode)),
        _ => Err(MutationError::NotASuggestion(path.clone())),
    }
}

/// Accept the suggestion at `path`, optionally normalizing its parent
fn accept_with(
    doc: &mut Document,
    path: &Path,
    profile: &MarkupProfile,
    normalize: bool,
) -> Result<(), MutationError> {
    let (suggestion, mode) = suggestion_at(doc, path, profile)?;

    let replacement = match mode {
        SuggestionMode::Deletion => suggestion
            .children
            .iter()
            .cloned()
            .map(|child| strip_entities(child, profile))
            .collect::<Vec<_>>(),
        SuggestionMode::Addition | SuggestionMode::Correction => {
            let target = suggestion
                .attribute("type")
                .filter(|target| !target.is_empty())
                .ok_or_else(|| MutationError::NotASuggestion(path.clone()))?;

            let mut annotated = Element::new(target);
            annotated.children = suggestion.children.clone();
            vec![Node::Element(annotated)]
        }
    };

    debug!(%path, %mode, "Accepting suggestion");
    let (children, index) = parent_children_mut(doc, path)?;
    children.splice(index..=index, replacement);
    if normalize {
        normalize_parent(doc, path);
    }
    Ok(())
}

/// Replace entity annotations with their plain text, at any depth
fn strip_entities(node: Node, profile: &MarkupProfile) -> Node {
    match node {
        Node::Element(element) if profile.is_entity(&element) => Node::Text(element.text_content()),
        Node::Element(mut element) => {
            element.children = element
                .children
                .into_iter()
                .map(|child| strip_entities(child, profile))
                .collect();
            Node::Element(element)
        }
        other => other,
    }
}

fn decline_with(
    doc: &mut Document,
    path: &Path,
    profile: &MarkupProfile,
    normalize: bool,
) -> Result<(), MutationError> {
    let (_, mode) = suggestion_at(doc, path, profile)?;
    debug!(%path, %mode, "Declining suggestion");

    let (children, index) = parent_children_mut(doc, path)?;
    let inner = match &mut children[index] {
        Node::Element(element) => std::mem::take(&mut element.children),
        _ => return Err(MutationError::NotASuggestion(path.clone())),
    };
    children.splice(index..=index, inner);
    if normalize {
        normalize_parent(doc, path);
    }
    Ok(())
}

pub(crate) fn accept_in_place(doc: &mut Document, path: &Path, profile: &MarkupProfile) -> Result<(), MutationError> {
    accept_with(doc, path, profile, true)
}

pub(crate) fn decline_in_place(doc: &mut Document, path: &Path, profile: &MarkupProfile) -> Result<(), MutationError> {
    decline_with(doc, path, profile, true)
}

/// Accept the suggestion at `path`; unchanged when it is not one
pub fn accept(doc: &Document, path: &Path, profile: &MarkupProfile) -> Document {
    fail_soft(doc, |copy| accept_in_place(copy, path, profile))
}

/// Drop the suggestion wrapper at `path`, keeping its content as it was
pub fn decline(doc: &Document, path: &Path, profile: &MarkupProfile) -> Document {
    fail_soft(doc, |copy| decline_in_place(copy, path, profile))
}

/// Accept every suggestion at or below `scope`, in place.
///
/// Suggestions are resolved in reverse document order: resolving one only
/// shifts the indices of nodes after it, so the paths still waiting to be
/// visited stay valid. Text runs are merged once at the end.
pub fn accept_all_in_scope(doc: &mut Document, scope: &Path, profile: &MarkupProfile) -> usize {
    resolve_all(doc, scope, profile, accept_with)
}

/// Decline every suggestion at or below `scope`, in place
pub fn decline_all_in_scope(doc: &mut Document, scope: &Path, profile: &MarkupProfile) -> usize {
    resolve_all(doc, scope, profile, decline_with)
}

fn resolve_all(
    doc: &mut Document,
    scope: &Path,
    profile: &MarkupProfile,
    resolve: fn(&mut Document, &Path, &MarkupProfile, bool) -> Result<(), MutationError>,
) -> usize {
    let pending = find_suggestions(doc, scope, profile);
    let mut resolved = 0;

    for suggestion in pending.iter().rev() {
        match resolve(doc, &suggestion.path, profile, false) {
            Ok(()) => resolved += 1,
            Err(err) => debug!(path = %suggestion.path, error = %err, "Suggestion left pending"),
        }
    }

    match scope.parent() {
        Some(_) => normalize_parent(doc, scope),
        None => {
            if let Some(root) = resolve_element_mut(doc, scope) {
                root.normalize();
            }
        }
    }

    info!(%scope, found = pending.len(), resolved, "Resolved suggestions in scope");
    resolved
}
