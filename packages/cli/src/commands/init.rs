use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use marginalia_editor::MarkupProfile;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory holding the edition's documents
    #[arg(short, long, default_value = ".")]
    pub src_dir: String,

    /// Tag used for page boundaries
    #[arg(long, default_value = "div")]
    pub page_tag: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Marginalia edition...".bright_blue().bold());

    let src_dir = PathBuf::from(cwd).join(&args.src_dir);
    if !src_dir.exists() {
        fs::create_dir_all(&src_dir)?;
        println!("  {} Created {}/", "✓".green(), args.src_dir);
    }

    let config = Config {
        src_dir: args.src_dir.clone(),
        profile: MarkupProfile {
            page_tag: args.page_tag.clone(),
            ..MarkupProfile::default()
        },
        ..Config::default()
    };

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Edition initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Put your TEI documents in {}/", args.src_dir);
    println!("  2. Run: marginalia check");
    println!("  3. Run: marginalia pages <file>");

    Ok(())
}
