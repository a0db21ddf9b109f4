use super::pretty_parse_error;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use marginalia_editor::{find_suggestions, segment, MarkupProfile, Path as NodePath};
use marginalia_markup::parse;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document or directory to check (defaults to the configured source dir)
    pub input: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Outcome of checking one document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file: PathBuf,
    pub pages: usize,
    pub pending_suggestions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let input = args.input.clone().unwrap_or_else(|| config.get_src_dir(cwd));
    let json = args.format == "json";

    let files = if input.is_file() {
        vec![input.clone()]
    } else if input.is_dir() {
        find_documents(&input, &config)
    } else {
        return Err(anyhow::anyhow!("Input path does not exist: {}", input.display()));
    };

    if !json {
        println!("🔍 {} Marginalia check", "Starting".green().bold());
        println!("   Input: {}", input.display());
        println!("   Found {} documents", files.len());
        println!();
    }

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let (report, rendered) = check_file(file, &config.profile)?;
        if !json {
            print_report(&report, rendered.as_deref());
        }
        reports.push(report);
    }

    let failed = reports.iter().filter(|report| report.error.is_some()).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        let pending: usize = reports.iter().map(|report| report.pending_suggestions).sum();
        println!();
        println!(
            "✨ {} Check complete!",
            if failed > 0 {
                "Done".red().bold()
            } else {
                "Done".green().bold()
            }
        );
        println!("   Documents checked: {}", reports.len());
        println!("   Pending suggestions: {}", pending);
        if failed > 0 {
            println!("   {} {}", "Failed to parse:".red(), failed);
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Parse one document; the second value is the rendered error.
///
/// Unreadable bytes are reported like a parse failure so one bad file does
/// not stop the walk.
pub fn check_file(file: &Path, profile: &MarkupProfile) -> Result<(FileReport, Option<String>)> {
    let bytes = fs::read(file)?;
    let source = match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(err) => {
            let message = format!("not valid UTF-8: {}", err.utf8_error());
            let rendered = format!(": {}", message);
            return Ok((FileReport::failed(file, message), Some(rendered)));
        }
    };

    match parse(&source) {
        Ok(doc) => Ok((
            FileReport {
                file: file.to_path_buf(),
                pages: segment(&doc, profile).len(),
                pending_suggestions: find_suggestions(&doc, &NodePath::root(), profile).len(),
                error: None,
            },
            None,
        )),
        Err(err) => Ok((
            FileReport::failed(file, err.to_string()),
            Some(pretty_parse_error(file, &source, &err).to_string()),
        )),
    }
}

impl FileReport {
    fn failed(file: &Path, error: String) -> Self {
        Self {
            file: file.to_path_buf(),
            pages: 0,
            pending_suggestions: 0,
            error: Some(error),
        }
    }
}

fn print_report(report: &FileReport, rendered: Option<&str>) {
    match rendered {
        Some(rendered) => {
            eprintln!("{} {}{}", "✗".red(), report.file.display(), rendered);
        }
        None => {
            let pending = if report.pending_suggestions > 0 {
                format!("{} pending suggestions", report.pending_suggestions).yellow()
            } else {
                "no pending suggestions".dimmed()
            };
            println!(
                "{} {} ({} pages, {})",
                "✓".green(),
                report.file.display(),
                report.pages,
                pending
            );
        }
    }
}

fn find_documents(dir: &Path, config: &Config) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && config.is_document(path))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_file_counts() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("letter.xml");
        fs::write(
            &file,
            r#"<body><div><p><suggestion mode="deletion">x</suggestion></p></div><div/></body>"#,
        )
        .unwrap();

        let (report, rendered) = check_file(&file, &MarkupProfile::default()).unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.pending_suggestions, 1);
        assert!(report.error.is_none());
        assert!(rendered.is_none());
    }

    #[test]
    fn test_check_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.xml");
        fs::write(&file, "<body><p></body>").unwrap();

        let (report, rendered) = check_file(&file, &MarkupProfile::default()).unwrap();
        assert!(report.error.is_some());
        assert!(rendered.is_some());
    }

    #[test]
    fn test_check_file_reports_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("latin1.xml");
        fs::write(&file, b"<p>Caf\xe9</p>").unwrap();

        let (report, rendered) = check_file(&file, &MarkupProfile::default()).unwrap();
        assert!(report.error.unwrap().contains("UTF-8"));
        assert!(rendered.is_some());
        assert_eq!(report.pages, 0);
    }

    #[test]
    fn test_find_documents_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("vol1")).unwrap();
        fs::write(dir.path().join("vol1/a.xml"), "<a/>").unwrap();
        fs::write(dir.path().join("b.tei"), "<b/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = find_documents(dir.path(), &Config::default());
        assert_eq!(files.len(), 2);
    }
}
