//! Terminal host for the Glance reading engine.

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use glance_core::{
    app::ReaderApp,
    document::{Document, DocumentId},
    input::{CommandQueue, ReaderCommand},
    pages::SegmentOptions,
    settings::{ReaderSettings, SettingsStore},
    store::DocumentStore,
};
use log::{info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    time::{Instant, sleep_until},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use file_store::{FileStore, slug_id};
use paged_text::{looks_paginated, pages_from_text};
use settings_sync::SettingsSyncState;
use terminal::{HELP, Input, describe, parse_line};

#[path = "main/file_store.rs"]
mod file_store;
#[path = "main/paged_text.rs"]
mod paged_text;
#[path = "main/settings_sync.rs"]
mod settings_sync;
#[path = "main/terminal.rs"]
mod terminal;

const SETTINGS_SAVE_DEBOUNCE_MS: u64 = 1_500;
const DATA_DIR_ENV: &str = "GLANCE_HOME";
const LOG_ENV: &str = "GLANCE_LOG";
const DEFAULT_DATA_DIR: &str = ".glance";

type App = ReaderApp<FileStore, CommandQueue>;

#[derive(Parser)]
#[command(name = "glance")]
#[command(about = "Speed-read documents one word at a time", long_about = None)]
struct Cli {
    /// Data directory (defaults to $GLANCE_HOME, then ./.glance)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Reading speed in words per minute (150-1200)
    #[arg(long, global = true)]
    wpm: Option<u16>,

    /// Punctuation pause strength (0-200, 100 = unscaled)
    #[arg(long, global = true)]
    pause_intensity: Option<u16>,

    /// Turn punctuation pauses off
    #[arg(long, global = true)]
    no_auto_pause: bool,

    /// Words shown per step (1-4)
    #[arg(long, global = true)]
    chunk: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a plain or form-feed paginated text file
    Import {
        file: PathBuf,

        /// Document id (defaults to a slug of the file name)
        #[arg(long)]
        id: Option<String>,

        /// Display title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,

        /// Keep running heads, feet and page numbers
        #[arg(long)]
        keep_margins: bool,

        /// Phrase to drop wherever it appears (repeatable)
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },

    /// List imported documents
    List,

    /// Read a document by id, or import and read a file
    Read { target: String },

    /// Remove a document and its reading position
    Remove { id: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let data_dir = data_dir(cli.data_dir.clone());
    let mut store = FileStore::open(&data_dir)
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;

    let stored = match SettingsStore::load(&mut store) {
        Ok(stored) => stored.unwrap_or_default(),
        Err(error) => {
            warn!("settings: load failed, using defaults: {error}");
            ReaderSettings::default()
        }
    };
    let settings = apply_overrides(stored.clone(), &cli);

    match cli.command {
        Commands::Import {
            file,
            id,
            title,
            keep_margins,
            ignore,
        } => {
            let mut options = SegmentOptions::from_settings(&settings);
            options.strip_headers_footers &= !keep_margins;
            options.ignore_phrases.extend(ignore);

            let document = import_file(&file, id.map(DocumentId::new), title, &options)?;
            store
                .save_document(&document)
                .with_context(|| format!("saving document {}", document.id))?;
            println!(
                "imported {} ({} words{})",
                document.id,
                document.word_count(),
                page_suffix(&document)
            );
        }
        Commands::List => list_documents(&mut store)?,
        Commands::Read { target } => read(store, stored, settings, &target).await?,
        Commands::Remove { id } => {
            let id = DocumentId::new(id);
            store
                .delete_document(&id)
                .with_context(|| format!("removing document {id}"))?;
            println!("removed {id}");
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn apply_overrides(mut settings: ReaderSettings, cli: &Cli) -> ReaderSettings {
    if let Some(wpm) = cli.wpm {
        settings.wpm = wpm;
    }
    if let Some(intensity) = cli.pause_intensity {
        settings.pause_intensity = intensity;
    }
    if cli.no_auto_pause {
        settings.auto_pause = false;
    }
    if let Some(chunk) = cli.chunk {
        settings.chunk_size = chunk;
    }
    settings.sanitized()
}

fn import_file(
    path: &Path,
    id: Option<DocumentId>,
    title: Option<String>,
    options: &SegmentOptions,
) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("document"));

    let id = id.unwrap_or_else(|| slug_id(&stem));
    let title = title.unwrap_or(stem);

    let document = if looks_paginated(&text) {
        Document::from_pages(id, title, &pages_from_text(&text), options)
    } else {
        Document::from_text(id, title, &text)
    };
    info!(
        "import: id={} words={} tokens={} paginated={}",
        document.id,
        document.word_count(),
        document.tokens.len(),
        document.page_ranges.is_some()
    );
    Ok(document)
}

fn page_suffix(document: &Document) -> String {
    match &document.page_ranges {
        Some(ranges) => format!(", {} pages", ranges.len()),
        None => String::new(),
    }
}

fn list_documents(store: &mut FileStore) -> Result<()> {
    let ids = store.document_ids().context("listing documents")?;
    if ids.is_empty() {
        println!("no documents in {}", store.root().display());
        return Ok(());
    }

    for id in ids {
        match store.load_document(&id) {
            Ok(Some(document)) => {
                let total = document.word_count().max(1);
                let read_words = store
                    .load_progress(&id)
                    .ok()
                    .flatten()
                    .map_or(0, |progress| progress.word_index + 1);
                println!(
                    "{id}\t{}\t{} words{}\t{}%",
                    document.title,
                    document.word_count(),
                    page_suffix(&document),
                    read_words.min(total) * 100 / total
                );
            }
            Ok(None) => {}
            Err(error) => println!("{id}\t<unreadable: {error}>"),
        }
    }
    Ok(())
}

/// A known document id, or a file to import under its slug.
fn resolve_target(store: &mut FileStore, target: &str) -> Result<(DocumentId, Option<PathBuf>)> {
    let known = store.document_ids().context("listing documents")?;
    let id = DocumentId::new(target);
    if known.contains(&id) {
        return Ok((id, None));
    }

    let path = Path::new(target);
    if path.is_file() {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = slug_id(&stem);
        let pending = (!known.contains(&id)).then(|| path.to_path_buf());
        return Ok((id, pending));
    }

    bail!(
        "no document {target:?} in {} and no such file",
        store.root().display()
    )
}

async fn read(
    mut store: FileStore,
    stored: ReaderSettings,
    settings: ReaderSettings,
    target: &str,
) -> Result<()> {
    let (id, pending_import) = resolve_target(&mut store, target)?;
    let options = SegmentOptions::from_settings(&settings);
    let mut settings_sync = SettingsSyncState::new(stored);

    let start = Instant::now();
    let mut app: App = ReaderApp::new(store, CommandQueue::new(), settings);
    app.commands_mut().push(ReaderCommand::Open(id.clone()));
    app.tick(0);
    print_events(&mut app);

    // The engine waits on the id while the file is segmented.
    if let Some(path) = pending_import {
        let document = import_file(&path, Some(id), None, &options)?;
        app.provide_document(document, elapsed_ms(start));
        print_events(&mut app);
    }
    println!("type ? for help, enter to play or pause");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdin_open = true;
    loop {
        let wakeup = app.next_wakeup();
        if !stdin_open && wakeup.is_none() {
            break;
        }

        let deadline_ms = [wakeup.map(|wakeup| wakeup.at_ms), settings_sync.due_at()]
            .into_iter()
            .flatten()
            .min();
        let sleep = async move {
            match deadline_ms {
                Some(at_ms) => sleep_until(start + Duration::from_millis(at_ms)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            line = rx.recv(), if stdin_open => {
                let now_ms = elapsed_ms(start);
                match line {
                    Some(line) => match parse_line(&line, app.settings()) {
                        Ok(Input::Command(command)) => {
                            app.commands_mut().push(command);
                            app.tick(now_ms);
                        }
                        Ok(Input::Info) => print_info(&mut app, now_ms),
                        Ok(Input::Help) => println!("{HELP}"),
                        Ok(Input::Quit) => break,
                        Err(message) => println!("{message}"),
                    },
                    None => stdin_open = false,
                }
            }
            () = sleep => {
                let now_ms = elapsed_ms(start);
                if let Some(wakeup) = wakeup.filter(|wakeup| wakeup.at_ms <= now_ms) {
                    app.on_wakeup(wakeup, now_ms);
                }
            }
        }

        print_events(&mut app);
        let now_ms = elapsed_ms(start);
        settings_sync.track_current(app.settings(), now_ms);
        settings_sync.flush_if_due(app.store_mut(), now_ms);
    }

    let now_ms = elapsed_ms(start);
    app.commands_mut().push(ReaderCommand::Pause);
    app.tick(now_ms);
    print_events(&mut app);
    print_info(&mut app, now_ms);

    settings_sync.track_current(app.settings(), now_ms);
    settings_sync.flush_now(app.store_mut());
    Ok(())
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn print_events(app: &mut App) {
    for event in app.drain_events() {
        if let Some(line) = describe(&event) {
            println!("{line}");
        }
    }
}

fn print_info(app: &mut App, now_ms: u64) {
    if let Some(progress) = app.progress() {
        let page = progress
            .page
            .map(|page| format!(", page {page}"))
            .unwrap_or_default();
        println!(
            "word {}/{} ({}%){page}",
            progress.word_index + 1,
            progress.total_words,
            progress.percent_complete
        );
    }

    let stats = app.session_stats(now_ms);
    println!(
        "session: {} words, {} pauses, {:.1}s, {} wpm (set {})",
        stats.words_shown,
        stats.pause_count,
        stats.elapsed_ms as f64 / 1_000.0,
        stats.average_wpm,
        app.settings().wpm
    );

    for (slot, bookmark) in app.bookmarks().iter().enumerate() {
        match &bookmark.note {
            Some(note) => println!("  [{slot}] word {}: {note}", bookmark.word_index),
            None => println!("  [{slot}] word {}", bookmark.word_index),
        }
    }
}
