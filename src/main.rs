//! marginalia: annotate markdown documents with inline review comments.
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use marginalia::app_state::AppState;
use marginalia::config::Config;
use marginalia::store::FsStore;
use marginalia::{marker, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "marginalia")]
#[command(about = "Review comments kept inline in markdown documents", long_about = None)]
struct Args {
    /// Directory holding the documents
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// File extensions to match
    #[arg(long, short = 'e', value_name = "EXT")]
    ext: Vec<String>,

    /// Author recorded on new comments
    #[arg(long)]
    author: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the documents under the docs root
    List,
    /// Show a document's sections and their comments
    Show {
        /// Document path relative to the docs root
        doc: String,
        /// Print the scan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a comment after a section
    Add {
        /// Document path relative to the docs root
        doc: String,
        /// Section index as printed by `show`
        section: usize,
        /// Comment text
        text: String,
    },
    /// Replace the text of a comment
    Edit {
        /// Document path relative to the docs root
        doc: String,
        /// Comment id
        id: String,
        /// New comment text
        text: String,
    },
    /// Delete a comment
    Delete {
        /// Document path relative to the docs root
        doc: String,
        /// Comment id
        id: String,
    },
    /// Check a document for malformed comment markers
    Check {
        /// Document path relative to the docs root
        doc: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marginalia=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut cfg = Config::load()?;

    // Override config with command line args
    if let Some(root) = args.root {
        cfg.docs_root = root.to_string_lossy().to_string();
    }
    if !args.ext.is_empty() {
        cfg.file_extensions = args.ext;
    }
    if let Some(author) = args.author {
        cfg.author = author;
    }

    let store = FsStore::new(&cfg.docs_root, cfg.file_extensions.clone());
    let mut app = AppState::new(store, cfg.author.clone());

    match args.command {
        Command::List => {
            let documents = app.documents()?;
            if documents.is_empty() {
                eprintln!("No matching files found in {}", cfg.docs_root);
            }
            for doc in documents {
                println!("{}\t{}", doc.path, doc.title);
            }
        }
        Command::Show { doc, json } => {
            app.open(&doc)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&app.document)?);
            } else {
                print_sections(&app);
            }
        }
        Command::Add { doc, section, text } => {
            app.open(&doc)?;
            let comment = app.add_comment_to(section, &text)?;
            println!("{}", comment.id);
        }
        Command::Edit { doc, id, text } => {
            app.open(&doc)?;
            app.edit_comment(&id, &text)?;
        }
        Command::Delete { doc, id } => {
            app.open(&doc)?;
            app.delete_comment(&id)?;
        }
        Command::Check { doc } => {
            app.open(&doc)?;
            marker::validate(app.body())?;
            println!(
                "{doc}: {} sections, {} comments",
                app.document.sections.len(),
                app.document.comment_count()
            );
        }
    }

    if let Some(message) = &app.message {
        eprintln!("{message}");
    }
    Ok(())
}

fn print_sections(app: &AppState<FsStore>) {
    for section in &app.document.sections {
        println!("[{}] {}  {}", section.index, section.section_id, section.title());
        for comment in &section.comments {
            let date = comment
                .timestamp()
                .map_or_else(|| comment.date.clone(), |ts| ts.format("%b %-d, %Y").to_string());
            println!("    {} ({date}) [{}]", comment.author, comment.id);
            for line in comment.content.lines() {
                println!("      {line}");
            }
        }
    }
    if app.document.dropped > 0 {
        eprintln!(
            "{} comment(s) precede every section and were not shown",
            app.document.dropped
        );
    }
    for skipped in &app.document.skipped {
        eprintln!(
            "Unreadable comment marker at lines {}-{}",
            skipped.start_line + 1,
            skipped.end_line + 1
        );
    }
}
