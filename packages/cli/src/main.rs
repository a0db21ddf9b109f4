mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, edit, init, pages, suggestions, CheckArgs, EditCommand, InitArgs, PagesArgs, SuggestionsArgs};

/// Marginalia CLI - annotate and review TEI editions
#[derive(Parser, Debug)]
#[command(name = "marginalia")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a marginalia.config.json for this directory
    Init(InitArgs),

    /// Parse documents and report pages and pending suggestions
    Check(CheckArgs),

    /// List the pages of a document
    Pages(PagesArgs),

    /// List pending suggestions
    Suggestions(SuggestionsArgs),

    #[command(flatten)]
    Edit(EditCommand),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Check(args) => check(args, &cwd),
        Command::Pages(args) => pages(args, &cwd),
        Command::Suggestions(args) => suggestions(args, &cwd),
        Command::Edit(command) => edit(command, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
