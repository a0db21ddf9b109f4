pub mod check;
pub mod edit;
pub mod init;
pub mod inspect;

pub use check::{check, CheckArgs};
pub use edit::{edit, EditCommand};
pub use init::{init, InitArgs};
pub use inspect::{pages, suggestions, PagesArgs, SuggestionsArgs};

use anyhow::{anyhow, Result};
use clap::Args;
use marginalia_editor::{EditSession, EditorError, MarkupProfile, Path as NodePath};
use marginalia_markup::{format_error, ParseError};
use std::path::Path;

/// Where to look for suggestions or apply scope-wide edits
#[derive(Debug, Clone, Args)]
pub struct ScopeArgs {
    /// Node path, e.g. /1/0/2 (defaults to the whole document)
    #[arg(long, conflicts_with = "page")]
    pub scope: Option<NodePath>,

    /// Page index (0-based) instead of a path
    #[arg(long)]
    pub page: Option<usize>,
}

impl ScopeArgs {
    pub fn resolve(&self, session: &EditSession) -> Result<NodePath> {
        match (&self.scope, self.page) {
            (Some(scope), _) => Ok(scope.clone()),
            (None, Some(index)) => Ok(session.page(index)?.path),
            (None, None) => Ok(NodePath::root()),
        }
    }
}

/// Open a file-backed session, rendering parse errors against the source
pub fn open_session(file: &Path, profile: MarkupProfile) -> Result<EditSession> {
    EditSession::load(file, profile).map_err(|err| match err {
        EditorError::Parse(parse_err) => {
            let source = std::fs::read_to_string(file).unwrap_or_default();
            pretty_parse_error(file, &source, &parse_err)
        }
        other => other.into(),
    })
}

pub fn pretty_parse_error(file: &Path, source: &str, err: &ParseError) -> anyhow::Error {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown");
    anyhow!("\n{}", format_error(source, file_name, err))
}
