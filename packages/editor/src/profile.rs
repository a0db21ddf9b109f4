//! # Markup Profile
//!
//! Which tag names carry editor meaning, and the one place where a node's
//! tag name is turned into a [`NodeKind`]. Everything downstream matches on
//! the kind instead of comparing strings.

use marginalia_markup::{Element, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Tag names recognised by the editor (compared by local name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkupProfile {
    /// Page boundary container
    pub page_tag: String,

    pub paragraph_tag: String,

    /// Never descended into during page segmentation
    pub header_tag: String,

    /// Attribute holding a page's identifier
    pub id_attribute: String,

    /// Ephemeral wrapper carrying `mode`, `type` and `reason`
    pub suggestion_tag: String,

    pub entity_tags: EntityTags,
}

/// Entity annotation tags per [`EntityKind`]; any listed name matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityTags {
    pub person: Vec<String>,
    pub place: Vec<String>,
    pub generic_name: Vec<String>,
}

impl Default for MarkupProfile {
    fn default() -> Self {
        Self {
            page_tag: "div".to_string(),
            paragraph_tag: "p".to_string(),
            header_tag: "teiHeader".to_string(),
            id_attribute: "xml:id".to_string(),
            suggestion_tag: "suggestion".to_string(),
            entity_tags: EntityTags::default(),
        }
    }
}

impl Default for EntityTags {
    fn default() -> Self {
        let tags = |names: &[&str]| names.iter().map(|name| name.to_string()).collect();
        Self {
            person: tags(&["persName", "person"]),
            place: tags(&["placeName", "place"]),
            generic_name: tags(&["name", "generic-name"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Person,
    Place,
    GenericName,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Person, EntityKind::Place, EntityKind::GenericName];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionMode {
    Addition,
    Correction,
    Deletion,
}

impl SuggestionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionMode::Addition => "addition",
            SuggestionMode::Correction => "correction",
            SuggestionMode::Deletion => "deletion",
        }
    }
}

impl fmt::Display for SuggestionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "addition" => Ok(SuggestionMode::Addition),
            "correction" => Ok(SuggestionMode::Correction),
            "deletion" => Ok(SuggestionMode::Deletion),
            other => Err(format!("unknown suggestion mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerRole {
    Page,
    Paragraph,
    Header,
    /// Any other element
    Block,
}

/// Editor meaning of a node, resolved once from its tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Container(ContainerRole),
    Entity(EntityKind),
    Suggestion(SuggestionMode),
    /// Text, comments and processing instructions
    Leaf,
}

impl MarkupProfile {
    /// Every tag name recognised as `kind`
    pub fn entity_tags(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::Person => &self.entity_tags.person,
            EntityKind::Place => &self.entity_tags.place,
            EntityKind::GenericName => &self.entity_tags.generic_name,
        }
    }


    pub fn classify(&self, node: &Node) -> NodeKind {
        match node {
            Node::Element(element) => self.classify_element(element),
            Node::Text(_) | Node::Comment(_) | Node::Instruction { .. } => NodeKind::Leaf,
        }
    }

    pub fn classify_element(&self, element: &Element) -> NodeKind {
        let name = element.local_name();

        if name == self.suggestion_tag {
            let mode = element.attribute("mode").unwrap_or_default();
            return match mode.parse::<SuggestionMode>() {
                Ok(mode) => NodeKind::Suggestion(mode),
                Err(reason) => {
                    debug!(%reason, "Suggestion element ignored");
                    NodeKind::Container(ContainerRole::Block)
                }
            };
        }

        if let Some(kind) = EntityKind::ALL
            .into_iter()
            .find(|kind| self.entity_tags(*kind).iter().any(|tag| tag == name))
        {
            return NodeKind::Entity(kind);
        }

        let role = if name == self.page_tag {
            ContainerRole::Page
        } else if name == self.paragraph_tag {
            ContainerRole::Paragraph
        } else if name == self.header_tag {
            ContainerRole::Header
        } else {
            ContainerRole::Block
        };
        NodeKind::Container(role)
    }

    pub fn is_entity(&self, element: &Element) -> bool {
        matches!(self.classify_element(element), NodeKind::Entity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_structural_tags() {
        let profile = MarkupProfile::default();

        assert_eq!(
            profile.classify_element(&Element::new("div")),
            NodeKind::Container(ContainerRole::Page)
        );
        assert_eq!(
            profile.classify_element(&Element::new("tei:p")),
            NodeKind::Container(ContainerRole::Paragraph)
        );
        assert_eq!(
            profile.classify_element(&Element::new("teiHeader")),
            NodeKind::Container(ContainerRole::Header)
        );
        assert_eq!(
            profile.classify_element(&Element::new("hi")),
            NodeKind::Container(ContainerRole::Block)
        );
        assert_eq!(profile.classify(&Node::text("x")), NodeKind::Leaf);
    }

    #[test]
    fn test_classify_entities() {
        let profile = MarkupProfile::default();

        assert_eq!(
            profile.classify_element(&Element::new("persName")),
            NodeKind::Entity(EntityKind::Person)
        );
        assert_eq!(
            profile.classify_element(&Element::new("placeName")),
            NodeKind::Entity(EntityKind::Place)
        );
        assert_eq!(
            profile.classify_element(&Element::new("name")),
            NodeKind::Entity(EntityKind::GenericName)
        );
    }

    #[test]
    fn test_classify_short_entity_names() {
        let profile = MarkupProfile::default();

        assert_eq!(
            profile.classify_element(&Element::new("person")),
            NodeKind::Entity(EntityKind::Person)
        );
        assert_eq!(
            profile.classify_element(&Element::new("place")),
            NodeKind::Entity(EntityKind::Place)
        );
        assert_eq!(
            profile.classify_element(&Element::new("generic-name")),
            NodeKind::Entity(EntityKind::GenericName)
        );
        assert_eq!(profile.entity_tags(EntityKind::Person), ["persName", "person"]);
    }

    #[test]
    fn test_classify_suggestions() {
        let profile = MarkupProfile::default();

        let deletion = Element::new("suggestion").with_attribute("mode", "deletion");
        assert_eq!(
            profile.classify_element(&deletion),
            NodeKind::Suggestion(SuggestionMode::Deletion)
        );

        let bogus = Element::new("suggestion").with_attribute("mode", "rewrite");
        assert_eq!(
            profile.classify_element(&bogus),
            NodeKind::Container(ContainerRole::Block)
        );
    }

    #[test]
    fn test_profile_from_partial_json() {
        let json = r#"{ "pageTag": "pb", "entityTags": { "person": ["rs"] } }"#;
        let profile: MarkupProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.page_tag, "pb");
        assert_eq!(profile.paragraph_tag, "p");
        assert_eq!(profile.entity_tags.person, vec!["rs".to_string()]);
        assert_eq!(profile.entity_tags(EntityKind::Place), ["placeName", "place"]);
        assert_eq!(
            profile.classify_element(&Element::new("persName")),
            NodeKind::Container(ContainerRole::Block)
        );
    }
}
