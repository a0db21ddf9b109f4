use marginalia_editor::MarkupProfile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "marginalia.config.json";

/// Marginalia configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory searched by `check` when no input is given
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// File extensions treated as documents
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Tag names the editor recognises
    #[serde(default)]
    pub profile: MarkupProfile,
}

fn default_src_dir() -> String {
    ".".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["xml".to_string(), "tei".to_string()]
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "Loaded config");
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn get_src_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.src_dir)
    }

    pub fn is_document(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            extensions: default_extensions(),
            profile: MarkupProfile::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "srcDir": "letters",
            "extensions": ["xml"],
            "profile": { "pageTag": "pb", "entityTags": { "person": ["persName", "rs"] } }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.src_dir, "letters");
        assert_eq!(config.extensions, vec!["xml"]);
        assert_eq!(config.profile.page_tag, "pb");
        assert_eq!(config.profile.entity_tags.person, vec!["persName", "rs"]);
        assert_eq!(config.profile.suggestion_tag, "suggestion");
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.src_dir, ".");
        assert_eq!(config.profile, MarkupProfile::default());
        assert!(config.is_document(Path::new("letters/a.xml")));
        assert!(config.is_document(Path::new("b.tei")));
        assert!(!config.is_document(Path::new("notes.txt")));
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert_eq!(config.extensions, vec!["xml", "tei"]);
    }
}
