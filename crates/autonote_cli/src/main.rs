//! Command-line front end for the AutoNote collection store.
//!
//! # Responsibility
//! - Parse connection, logging and command arguments.
//! - Drive one store operation per invocation and print the resulting view.

mod demo;

use autonote_core::gateway::config::{
    API_TIMEOUT_ENV, API_URL_ENV, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS,
};
use autonote_core::logging::{LOG_DIR_ENV, LOG_LEVEL_ENV};
use autonote_core::{
    excerpt, init_logging, GatewayConfig, HttpNotesGateway, LoggingConfig, Note, NoteDraft,
    NoteId, NotePatch, NoteStore, NotesGateway, Session, SortKey, ViewQuery,
};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const LIST_EXCERPT_CHARS: usize = 72;

#[derive(Debug, Parser)]
#[command(name = "autonote", version, about = "Browse and edit AutoNote notes")]
struct Cli {
    /// Base URL of the notes API.
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Bearer credential sent with every request.
    #[arg(long, env = "AUTONOTE_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = API_TIMEOUT_ENV, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Run against a seeded in-process collection instead of the API.
    #[arg(long)]
    demo: bool,

    #[arg(long, env = LOG_LEVEL_ENV)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when omitted.
    #[arg(long, env = LOG_DIR_ENV)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List notes matching a query.
    List {
        /// Case-insensitive text matched against title and content.
        #[arg(short, long, default_value = "")]
        query: String,
        /// Required tag; repeat to require several.
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(short, long, default_value_t = SortKey::Newest)]
        sort: SortKey,
    },
    /// Print every tag in use.
    Tags,
    /// Show one note in full.
    Show { id: NoteId },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Update selected fields of a note.
    Update {
        id: NoteId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Replaces the tag list; repeat for several tags.
        #[arg(short, long = "tag")]
        tags: Option<Vec<String>>,
    },
    Delete { id: NoteId },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if cli.log_dir.is_some() {
        logging.log_dir = cli.log_dir.clone();
    }
    if let Err(err) = init_logging(&logging) {
        eprintln!("autonote: {err}");
        return ExitCode::FAILURE;
    }

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("autonote: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    if cli.demo {
        info!("event=cli_start module=cli mode=demo");
        return run(NoteStore::new(demo::seeded_gateway()), cli.command).await;
    }

    let config = GatewayConfig::new(&cli.api_url, cli.timeout_secs)?;
    let session = match cli.token {
        Some(token) => Session::new(token),
        None => Session::anonymous(),
    };
    info!(
        "event=cli_start module=cli mode=http authenticated={}",
        session.is_authenticated()
    );
    let gateway = HttpNotesGateway::new(&config, session)?;
    run(NoteStore::new(gateway), cli.command).await
}

async fn run<G: NotesGateway>(store: NoteStore<G>, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List { query, tags, sort } => {
            store.load_all().await?;
            let query = ViewQuery::new()
                .with_text(query)
                .with_tags(tags)
                .sorted_by(sort);
            let notes = store.view(&query);
            for note in &notes {
                print_row(note);
            }
            println!("{} of {} notes", notes.len(), store.len());
        }
        Command::Tags => {
            store.load_all().await?;
            for tag in store.tag_universe() {
                println!("{tag}");
            }
        }
        Command::Show { id } => {
            let note = store.load_one(&id).await?;
            print_note(&note);
        }
        Command::Create {
            title,
            content,
            tags,
        } => {
            let note = store.create(NoteDraft::new(title, content).with_tags(tags)).await?;
            print_note(&note);
        }
        Command::Update {
            id,
            title,
            content,
            tags,
        } => {
            let patch = NotePatch {
                title,
                content,
                tags,
                ..NotePatch::default()
            };
            if patch.is_empty() {
                return Err("nothing to update; pass --title, --content or --tag".into());
            }
            let note = store.update(&id, patch).await?;
            print_note(&note);
        }
        Command::Delete { id } => {
            store.remove(&id).await?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn print_row(note: &Note) {
    let tags = if note.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", note.tags.join(", "))
    };
    println!(
        "{:>6}  {}  {}{tags}",
        note.id,
        note.created_at.format("%Y-%m-%d"),
        note.title
    );
    let preview = excerpt(&note.content, LIST_EXCERPT_CHARS);
    if !preview.is_empty() {
        println!("        {preview}");
    }
}

fn print_note(note: &Note) {
    println!("id:       {}", note.id);
    println!("title:    {}", note.title);
    println!("source:   {}", note.source_type);
    if let Some(url) = &note.source_url {
        println!("url:      {url}");
    }
    if !note.tags.is_empty() {
        println!("tags:     {}", note.tags.join(", "));
    }
    println!("created:  {}", note.created_at.to_rfc3339());
    println!("updated:  {}", note.updated_at.to_rfc3339());
    println!();
    println!("{}", note.content);
}
