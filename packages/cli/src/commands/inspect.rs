use super::{open_session, ScopeArgs};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use marginalia_editor::{Page, Path as NodePath, SuggestionMode, SuggestionRef};
use serde::Serialize;
use std::path::PathBuf;

const PREVIEW_CHARS: usize = 48;

#[derive(Args, Debug)]
pub struct PagesArgs {
    /// Document to inspect
    pub file: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SuggestionsArgs {
    /// Document to inspect
    pub file: PathBuf,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Print JSON instead of a list
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PageSummary {
    index: usize,
    id: String,
    path: NodePath,
    preview: String,
}

impl PageSummary {
    fn new(index: usize, page: &Page) -> Self {
        Self {
            index,
            id: page.id.clone(),
            path: page.path.clone(),
            preview: preview(&page.node.text_content()),
        }
    }
}

pub fn pages(args: PagesArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let session = open_session(&args.file, config.profile)?;

    let summaries: Vec<PageSummary> = session
        .pages()
        .iter()
        .enumerate()
        .map(|(index, page)| PageSummary::new(index, page))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("{}", "⚠️  No pages found".yellow());
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "{:>4}  {:<16} {:<16} {}",
            summary.index,
            summary.id.bright_white(),
            summary.path.to_string().dimmed(),
            summary.preview
        );
    }
    Ok(())
}

pub fn suggestions(args: SuggestionsArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let session = open_session(&args.file, config.profile)?;
    let scope = args.scope.resolve(&session)?;
    let found = session.suggestions(&scope);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("{} No pending suggestions", "✓".green());
        return Ok(());
    }

    for suggestion in &found {
        print_suggestion(suggestion);
    }
    println!();
    println!("{} pending", found.len());
    Ok(())
}

fn print_suggestion(suggestion: &SuggestionRef) {
    let mode = match suggestion.mode {
        SuggestionMode::Addition => "addition".green(),
        SuggestionMode::Correction => "correction".yellow(),
        SuggestionMode::Deletion => "deletion".red(),
    };
    let target = suggestion
        .target_type
        .as_deref()
        .map(|target| format!(" → <{}>", target))
        .unwrap_or_default();

    println!("{} {}{} \"{}\"", suggestion.path.to_string().dimmed(), mode.bold(), target, preview(&suggestion.text));
    if let Some(reason) = &suggestion.reason {
        println!("    {} {}", "💡".dimmed(), reason.dimmed());
    }
}

/// Single-line, shortened text for terminal output
fn preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_CHARS {
        return collapsed;
    }
    let mut short: String = collapsed.chars().take(PREVIEW_CHARS - 1).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_collapses_whitespace() {
        assert_eq!(preview("  Dear\n   Anna  "), "Dear Anna");
    }

    #[test]
    fn test_preview_truncates() {
        let long = "word ".repeat(30);
        let short = preview(&long);
        assert_eq!(short.chars().count(), PREVIEW_CHARS);
        assert!(short.ends_with('…'));
    }
}
