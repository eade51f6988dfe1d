//! StudyNote command-line entry point.
//!
//! # Responsibility
//! - Drive the document store against the configured SQLite file.
//! - Move whole documents in and out as JSON snapshots or markdown.

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use studynote_core::config::CONFIG_FILE_NAME;
use studynote_core::{
    init_logging, open_db, DocumentService, DocumentStore, EntityId, EntityKind, SearchQuery,
    SqliteDocumentRepository, StudyConfig,
};
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// StudyNote - organize study notes into boards, subjects and chapters.
#[derive(Debug, Parser)]
#[command(name = "studynote")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file path
    #[arg(short, long, global = true, env = "STUDYNOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the configured data directory
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check core linkage
    Ping,
    /// Print the hierarchy with identifiers
    Outline,
    /// Create a board, or a child under `--parent`
    Add(AddArgs),
    /// Rename any entity
    Rename { id: Uuid, name: String },
    /// Move a subject, chapter or note under a new parent
    Move {
        id: Uuid,
        #[arg(long)]
        parent: Uuid,
        /// Position among the new siblings; appends when omitted
        #[arg(long)]
        index: Option<usize>,
    },
    /// Delete an entity and everything beneath it
    Delete { id: Uuid },
    /// Create a note from a markdown file
    ImportMd {
        #[arg(long)]
        chapter: Uuid,
        #[arg(long)]
        title: Option<String>,
        file: PathBuf,
    },
    /// Write the document as a JSON snapshot
    Export { out: PathBuf },
    /// Replace the document with a JSON snapshot
    Import { input: PathBuf },
    /// Keyword search over notes
    Search {
        query: String,
        #[arg(long)]
        board: Option<Uuid>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Debug, Parser)]
struct AddArgs {
    #[arg(value_enum)]
    kind: AddKind,
    name: String,
    /// Parent board, subject or chapter
    #[arg(long)]
    parent: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AddKind {
    Board,
    Subject,
    Chapter,
    Note,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    if matches!(cli.command, Command::Ping) {
        println!("studynote_core ping={}", studynote_core::ping());
        println!("studynote_core version={}", studynote_core::core_version());
        return Ok(());
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Path::new("data").join(CONFIG_FILE_NAME));
    let config = StudyConfig::load_or_default(&config_path);
    let log_dir = absolute(&config.log_dir())?;
    if let Err(err) = init_logging(&config.log_level, &log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let conn = open_db(&db_path)?;
    let service = DocumentService::open(SqliteDocumentRepository::try_new(&conn)?)?;
    info!(
        "event=cli_start module=cli status=ok db={}",
        db_path.display()
    );

    match cli.command {
        Command::Ping => {}
        Command::Outline => {
            let outline = service.read(render_outline)?;
            print!("{outline}");
        }
        Command::Add(args) => {
            let id = service.write("add", |store| match (args.kind, args.parent) {
                (AddKind::Board, _) => store.create_board(args.name),
                (AddKind::Subject, Some(parent)) => store.create_subject(parent, args.name),
                (AddKind::Chapter, Some(parent)) => store.create_chapter(parent, args.name),
                (AddKind::Note, Some(parent)) => store.create_note(parent, args.name),
                (_, None) => Err(studynote_core::StoreError::Validation(
                    "--parent is required for subjects, chapters and notes".to_string(),
                )),
            })?;
            service.commit()?;
            println!("{id}");
        }
        Command::Rename { id, name } => {
            service.write("rename", |store| store.rename_entity(id, name))?;
            service.commit()?;
        }
        Command::Move { id, parent, index } => {
            service.write("move", |store| {
                let index = match index {
                    Some(index) => index,
                    None => append_index(store, id, parent)?,
                };
                store.move_entity(id, parent, index)
            })?;
            service.commit()?;
        }
        Command::Delete { id } => {
            service.write("delete", |store| store.delete_entity(id))?;
            service.commit()?;
        }
        Command::ImportMd {
            chapter,
            title,
            file,
        } => {
            let markdown = fs::read_to_string(&file)?;
            let title = title.unwrap_or_else(|| {
                file.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let id = service.write("import_md", |store| {
                store.import_markdown_note(chapter, title, &markdown)
            })?;
            service.commit()?;
            println!("{id}");
        }
        Command::Export { out } => {
            let bytes = service.read(DocumentStore::serialize)??;
            fs::write(&out, bytes)?;
            println!("exported {}", out.display());
        }
        Command::Import { input } => {
            let bytes = fs::read(&input)?;
            service.write("import", |store| store.restore(&bytes))?;
            service.commit()?;
            println!("imported {}", input.display());
        }
        Command::Search {
            query,
            board,
            limit,
        } => {
            let hits = service.search(&SearchQuery {
                text: query,
                board,
                limit,
            })?;
            for hit in hits {
                println!("{}  {}  [{}]", hit.note_id, hit.title, hit.path.join(" / "));
                println!("    {}", hit.snippet);
            }
        }
    }
    Ok(())
}

/// Index that appends `id` to the end of `parent`'s children.
fn append_index(
    store: &DocumentStore,
    id: EntityId,
    parent: EntityId,
) -> studynote_core::StoreResult<usize> {
    let count = match store.kind_of(parent) {
        Some(EntityKind::Board) => store.subjects_of(parent)?.len(),
        Some(EntityKind::Subject) => store.chapters_of(parent)?.len(),
        Some(EntityKind::Chapter) => store.notes_of(parent)?.len(),
        Some(EntityKind::Note) | None => 0,
    };
    let already_there = store.parent_of(id)? == Some(parent);
    Ok(if already_there {
        count.saturating_sub(1)
    } else {
        count
    })
}

fn render_outline(store: &DocumentStore) -> String {
    let mut out = String::new();
    for board in store.boards() {
        out.push_str(&format!("{}  {}\n", board.id, board.name));
        for todo in &board.todos {
            let mark = if todo.done { "x" } else { " " };
            out.push_str(&format!("  [{mark}] {}\n", todo.text));
        }
        for subject in board.subjects.iter().filter_map(|id| store.subject(*id)) {
            out.push_str(&format!("  {}  {}\n", subject.id, subject.name));
            for chapter in subject.chapters.iter().filter_map(|id| store.chapter(*id)) {
                out.push_str(&format!("    {}  {}\n", chapter.id, chapter.name));
                for note in chapter.notes.iter().filter_map(|id| store.note(*id)) {
                    out.push_str(&format!(
                        "      {}  {} ({} blocks)\n",
                        note.id,
                        note.title,
                        note.blocks.len()
                    ));
                }
            }
        }
    }
    out
}

fn absolute(path: &Path) -> CliResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
