//! Mutation subcommands. Each one loads a document, applies its edits and
//! writes the result to stdout, a file, or back in place.

use super::{open_session, ScopeArgs};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use marginalia_editor::{EditSession, Mutation, Path as NodePath};
use std::fs;
use std::path::PathBuf;

/// Where an edited document goes
#[derive(Debug, Args)]
pub struct EditTarget {
    /// Document to edit
    pub file: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long, conflicts_with = "in_place")]
    pub output: Option<PathBuf>,

    /// Overwrite the input file
    #[arg(short, long)]
    pub in_place: bool,

    /// Fail instead of skipping edits whose target cannot be found
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct NodeArgs {
    #[command(flatten)]
    pub target: EditTarget,

    /// Node path, e.g. /1/0/2
    #[arg(long)]
    pub path: NodePath,
}

#[derive(Debug, Args)]
pub struct TagArgs {
    #[command(flatten)]
    pub target: EditTarget,

    /// Path of a text node
    #[arg(long)]
    pub path: NodePath,

    /// First character to wrap (0-based)
    #[arg(long)]
    pub start: usize,

    /// One past the last character to wrap
    #[arg(long)]
    pub end: usize,

    /// Element to wrap the range in
    #[arg(long, default_value = "persName")]
    pub tag: String,
}

#[derive(Debug, Args)]
pub struct SetTextArgs {
    #[command(flatten)]
    pub target: EditTarget,

    #[arg(long)]
    pub path: NodePath,

    #[arg(long)]
    pub text: String,
}

#[derive(Debug, Args)]
pub struct SetAttributeArgs {
    #[command(flatten)]
    pub target: EditTarget,

    #[arg(long)]
    pub path: NodePath,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub value: String,
}

#[derive(Debug, Args)]
pub struct ScopedArgs {
    #[command(flatten)]
    pub target: EditTarget,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: EditTarget,

    /// JSON file holding an array of mutations
    #[arg(long)]
    pub mutations: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum EditCommand {
    /// Wrap a character range of a text node in an element
    Tag(TagArgs),

    /// Remove an element, keeping its content
    Unwrap(NodeArgs),

    /// Replace the text content of a node
    SetText(SetTextArgs),

    /// Set an attribute on an element
    SetAttr(SetAttributeArgs),

    /// Accept one suggestion
    Accept(NodeArgs),

    /// Decline one suggestion
    Decline(NodeArgs),

    /// Accept every suggestion in a scope
    AcceptAll(ScopedArgs),

    /// Decline every suggestion in a scope
    DeclineAll(ScopedArgs),

    /// Apply a JSON list of mutations in order
    Apply(ApplyArgs),
}

impl EditCommand {
    fn target(&self) -> &EditTarget {
        match self {
            EditCommand::Tag(args) => &args.target,
            EditCommand::Unwrap(args) | EditCommand::Accept(args) | EditCommand::Decline(args) => &args.target,
            EditCommand::SetText(args) => &args.target,
            EditCommand::SetAttr(args) => &args.target,
            EditCommand::AcceptAll(args) | EditCommand::DeclineAll(args) => &args.target,
            EditCommand::Apply(args) => &args.target,
        }
    }

    /// Mutations to run, computed against the freshly loaded document
    fn mutations(&self, session: &EditSession) -> Result<Vec<Mutation>> {
        let mutation = match self {
            EditCommand::Tag(args) => Mutation::WrapRange {
                path: args.path.clone(),
                start: args.start,
                end: args.end,
                tag: args.tag.clone(),
            },
            EditCommand::Unwrap(args) => Mutation::Unwrap { path: args.path.clone() },
            EditCommand::SetText(args) => Mutation::SetText {
                path: args.path.clone(),
                text: args.text.clone(),
            },
            EditCommand::SetAttr(args) => Mutation::SetAttribute {
                path: args.path.clone(),
                name: args.name.clone(),
                value: args.value.clone(),
            },
            EditCommand::Accept(args) => Mutation::AcceptSuggestion { path: args.path.clone() },
            EditCommand::Decline(args) => Mutation::DeclineSuggestion { path: args.path.clone() },
            EditCommand::AcceptAll(args) => Mutation::AcceptAll {
                scope: args.scope.resolve(session)?,
            },
            EditCommand::DeclineAll(args) => Mutation::DeclineAll {
                scope: args.scope.resolve(session)?,
            },
            EditCommand::Apply(args) => {
                let content = fs::read_to_string(&args.mutations)
                    .with_context(|| format!("Cannot read {}", args.mutations.display()))?;
                return serde_json::from_str(&content)
                    .with_context(|| format!("Invalid mutation list in {}", args.mutations.display()));
            }
        };
        Ok(vec![mutation])
    }
}

pub fn edit(command: EditCommand, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let target = command.target();
    let mut session = open_session(&target.file, config.profile)?;
    let mutations = command.mutations(&session)?;

    let changed = run_mutations(&mut session, &mutations, target.strict)?;
    let pending = session.suggestions(&NodePath::root()).len();

    if target.in_place {
        session.save()?;
    } else if let Some(output) = &target.output {
        fs::write(output, session.export())?;
    } else {
        println!("{}", session.export());
    }

    // stdout may carry the document, so status goes to stderr
    eprintln!(
        "{} {}/{} edits changed the document ({} suggestions pending)",
        if changed > 0 { "✓".green() } else { "•".dimmed() },
        changed,
        mutations.len(),
        pending
    );
    Ok(())
}

/// Apply `mutations` in order; returns how many changed the tree
fn run_mutations(session: &mut EditSession, mutations: &[Mutation], strict: bool) -> Result<usize> {
    let mut changed = 0;
    for mutation in mutations {
        let outcome = if strict {
            session.try_apply(mutation)
        } else {
            session.apply(mutation)
        }
        .with_context(|| format!("{} failed", mutation.name()))?;

        if outcome.changed {
            changed += 1;
        } else {
            tracing::warn!(mutation = mutation.name(), "Edit did not change the document");
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_editor::MarkupProfile;

    fn session(source: &str) -> EditSession {
        EditSession::from_source(source, MarkupProfile::default()).unwrap()
    }

    #[test]
    fn test_run_mutations_counts_changes() {
        let mut session = session("<p>Hello John</p>");
        let mutations = vec![
            Mutation::WrapRange {
                path: NodePath::new(vec![0]),
                start: 6,
                end: 10,
                tag: "persName".to_string(),
            },
            Mutation::Unwrap {
                path: NodePath::new(vec![5]),
            },
        ];

        let changed = run_mutations(&mut session, &mutations, false).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(session.export(), "<p>Hello <persName>John</persName></p>");
    }

    #[test]
    fn test_strict_mode_fails_on_missing_target() {
        let mut session = session("<p>Hello</p>");
        let mutations = vec![Mutation::Unwrap {
            path: NodePath::new(vec![5]),
        }];

        assert!(run_mutations(&mut session, &mutations, true).is_err());
    }

    #[test]
    fn test_mutation_list_from_json() {
        let json = r#"[
            { "kind": "wrapRange", "path": [0], "start": 0, "end": 5, "tag": "name" },
            { "kind": "acceptAll", "scope": [] }
        ]"#;
        let mutations: Vec<Mutation> = serde_json::from_str(json).unwrap();

        assert_eq!(mutations.len(), 2);
        assert_eq!(mutations[1], Mutation::AcceptAll { scope: NodePath::root() });
    }
}
