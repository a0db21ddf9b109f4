//! # Path Addressing
//!
//! A [`Path`] names a node by the child indices walked from the root
//! element. Paths are only valid for the document version they were
//! computed on: any edit that changes sibling counts before an index
//! shifts every later path, so callers recompute paths with a fresh walk
//! after each update instead of patching them.

use marginalia_markup::{Document, Element, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ordered child indices from the root element; empty = root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid path '{input}': {reason}")]
pub struct PathParseError {
    pub input: String,
    pub reason: String,
}

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Path of the `index`-th child of this node
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Parent path and this node's index within it; `None` for the root
    pub fn parent(&self) -> Option<(Path, usize)> {
        let (last, rest) = self.0.split_last()?;
        Some((Path(rest.to_vec()), *last))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `other` lies strictly below this path
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }

    /// True for this path itself or anything below it
    pub fn contains(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    /// Accepts `/0/3/1`, `0/3/1` and `0.3.1`; empty or `/` is the root
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Ok(Path::root());
        }

        trimmed
            .split(|c| c == '/' || c == '.')
            .map(|segment| {
                segment.parse::<usize>().map_err(|_| PathParseError {
                    input: s.to_string(),
                    reason: format!("'{}' is not a child index", segment),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Path)
    }
}

/// Walk `path` from the root element; `None` when any index is out of range.
///
/// The root element itself is not a child node, so the empty path only
/// resolves through [`resolve_element`].
pub fn resolve<'a>(doc: &'a Document, path: &Path) -> Option<&'a Node> {
    let mut indices = path.0.iter();
    let Some(&first) = indices.next() else {
        return None;
    };

    let mut node = doc.root.children.get(first)?;
    for &index in indices {
        node = node.as_element()?.children.get(index)?;
    }
    Some(node)
}

/// Mutable counterpart of [`resolve`]
pub fn resolve_mut<'a>(doc: &'a mut Document, path: &Path) -> Option<&'a mut Node> {
    let mut indices = path.0.iter();
    let Some(&first) = indices.next() else {
        return None;
    };

    let mut node = doc.root.children.get_mut(first)?;
    for &index in indices {
        node = node.as_element_mut()?.children.get_mut(index)?;
    }
    Some(node)
}

/// Resolve to an element, treating the empty path as the root element
pub fn resolve_element<'a>(doc: &'a Document, path: &Path) -> Option<&'a Element> {
    if path.is_root() {
        return Some(&doc.root);
    }
    resolve(doc, path)?.as_element()
}

/// Mutable counterpart of [`resolve_element`]
pub fn resolve_element_mut<'a>(
    doc: &'a mut Document,
    path: &Path,
) -> Option<&'a mut Element> {
    if path.is_root() {
        return Some(&mut doc.root);
    }
    resolve_mut(doc, path)?.as_element_mut()
}

/// Appends `index` to `parent`; paths are assigned during one walk and
/// never cached across walks
pub fn child_path(parent: &Path, index: usize) -> Path {
    parent.child(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_markup::parse;

    #[test]
    fn test_display_and_parse() {
        let path = Path::new(vec![0, 3, 1]);
        assert_eq!(path.to_string(), "/0/3/1");
        assert_eq!("/0/3/1".parse::<Path>().unwrap(), path);
        assert_eq!("0/3/1".parse::<Path>().unwrap(), path);
        assert_eq!("0.3.1".parse::<Path>().unwrap(), path);
        assert_eq!("/".parse::<Path>().unwrap(), Path::root());
        assert_eq!("".parse::<Path>().unwrap(), Path::root());
        assert_eq!(Path::root().to_string(), "/");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("/0/x".parse::<Path>().is_err());
        assert!("0//1".parse::<Path>().is_err());
        assert!("-1".parse::<Path>().is_err());
    }

    #[test]
    fn test_parent_and_child() {
        let path = Path::root().child(2).child(5);
        assert_eq!(path.parent(), Some((Path::new(vec![2]), 5)));
        assert_eq!(Path::root().parent(), None);
        assert!(Path::new(vec![2]).is_ancestor_of(&path));
        assert!(!path.is_ancestor_of(&path));
        assert!(path.contains(&path));
    }

    #[test]
    fn test_resolve_walks_children() {
        let doc = parse("<TEI><text><p>Hello <hi>there</hi></p></text></TEI>").unwrap();

        let hi = resolve(&doc, &Path::new(vec![0, 0, 1])).unwrap();
        assert_eq!(hi.as_element().unwrap().name, "hi");

        let text = resolve(&doc, &Path::new(vec![0, 0, 1, 0])).unwrap();
        assert_eq!(text.as_text(), Some("there"));
    }

    #[test]
    fn test_resolve_out_of_range() {
        let doc = parse("<TEI><p>Hello</p></TEI>").unwrap();

        assert!(resolve(&doc, &Path::new(vec![1])).is_none());
        assert!(resolve(&doc, &Path::new(vec![0, 0, 0])).is_none());
        assert!(resolve(&doc, &Path::root()).is_none());
        assert_eq!(resolve_element(&doc, &Path::root()).unwrap().name, "TEI");
    }

    #[test]
    fn test_serde_as_array() {
        let path = Path::new(vec![1, 2]);
        assert_eq!(serde_json::to_string(&path).unwrap(), "[1,2]");
    }
}
