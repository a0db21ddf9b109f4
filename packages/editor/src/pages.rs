//! # Page Segmentation
//!
//! Splits a document into navigable pages with one pre-order walk. A page
//! is any element whose local name is the profile's page tag. Pages never
//! nest: the walk does not descend into a page, and it skips the header
//! entirely.

use crate::path::Path;
use crate::profile::{ContainerRole, MarkupProfile, NodeKind};
use marginalia_markup::{Document, Element, Node};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A page boundary container and where it sits in the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Identifying attribute, or `page-N` (1-based) when absent
    pub id: String,
    pub path: Path,
    pub node: Element,
}

/// All pages of `doc`, in document order. Ids are not deduplicated.
pub fn segment(doc: &Document, profile: &MarkupProfile) -> Vec<Page> {
    let mut pages = Vec::new();
    visit(&doc.root, Path::root(), profile, &mut pages);
    debug!(pages = pages.len(), "Segmented document");
    pages
}

fn visit(element: &Element, path: Path, profile: &MarkupProfile, pages: &mut Vec<Page>) {
    match profile.classify_element(element) {
        NodeKind::Container(ContainerRole::Page) => {
            let id = element
                .attribute(&profile.id_attribute)
                .map(str::to_string)
                .unwrap_or_else(|| format!("page-{}", pages.len() + 1));

            pages.push(Page {
                id,
                path,
                node: element.clone(),
            });
        }
        NodeKind::Container(ContainerRole::Header) => {}
        _ => {
            for (index, child) in element.children.iter().enumerate() {
                if let Node::Element(child) = child {
                    visit(child, path.child(index), profile, pages);
                }
            }
        }
    }
}
