use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use voxedit::buffer::TextBuffer;
use voxedit::clipboard::{ClipboardReader, ClipboardStore};
use voxedit::config::{Config, DEFAULT_CONFIG_PATH};
use voxedit::interpret::{Interpreter, Normalizer, Tokenizer};
use voxedit::llm;
use voxedit::notify::StatusLine;
use voxedit::session::{spawn_line_source, SessionCommand, SessionManager};

#[derive(Parser)]
#[command(name = "voxedit", about = "Edit a document with spoken commands")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Document to edit (created on save if missing)
    document: Option<PathBuf>,

    /// Read utterances from a file, one per line, instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the normalized tokens for a transcript
    Tokens {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn tokenizer(config: &Config) -> Tokenizer {
    Tokenizer::new(Normalizer::new().with_corrections(&config.corrections))
}

#[cfg(feature = "system-clipboard")]
fn clipboards() -> (Arc<dyn ClipboardStore>, Arc<dyn ClipboardReader>) {
    let clipboard = Arc::new(voxedit::clipboard::SystemClipboard);
    let store: Arc<dyn ClipboardStore> = clipboard.clone();
    let reader: Arc<dyn ClipboardReader> = clipboard;
    (store, reader)
}

#[cfg(not(feature = "system-clipboard"))]
fn clipboards() -> (Arc<dyn ClipboardStore>, Arc<dyn ClipboardReader>) {
    let clipboard = Arc::new(voxedit::clipboard::LocalClipboard::new());
    let store: Arc<dyn ClipboardStore> = clipboard.clone();
    let reader: Arc<dyn ClipboardReader> = clipboard;
    (store, reader)
}

#[hotpath::main]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load(&cli.config);

    if let Some(Command::Tokens { text }) = &cli.command {
        let tokens = tokenizer(&config).tokenize(&text.join(" "));
        println!("{}", tokens.join(" "));
        return Ok(());
    }

    let document = cli
        .document
        .clone()
        .context("a document path is required (see --help)")?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?
        .block_on(run(&cli, &document, config))
}

async fn run(cli: &Cli, document: &Path, config: Config) -> Result<()> {
    let (clipboard_store, clipboard_reader) = clipboards();
    let editor = TextBuffer::open(document)
        .with_context(|| format!("failed to open {}", document.display()))?
        .with_clipboard(clipboard_store)
        .with_interpreters(config.compile.clone());

    let generator = llm::create_backend(&config.llm).context("failed to set up code generation")?;
    let interpreter = Interpreter::new(tokenizer(&config))
        .with_feedback_duration(config.notifications.duration());

    let (cmd_tx, cmd_rx) = flume::unbounded::<SessionCommand>();

    let ctrlc_tx = cmd_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(SessionCommand::Stop);
    })
    .context("failed to install Ctrl-C handler")?;

    // One utterance per line from the speech source
    let _source = match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            spawn_line_source(BufReader::new(file), cmd_tx.clone())
        }
        None => {
            eprintln!("Listening on stdin, one utterance per line. Say \"stop\" to finish.");
            spawn_line_source(BufReader::new(io::stdin()), cmd_tx.clone())
        }
    };

    let manager = SessionManager::new(
        interpreter,
        editor,
        Arc::new(StatusLine::new("Listening...")),
        clipboard_reader,
        generator,
        cmd_tx,
    );
    let editor = manager.run(cmd_rx).await;
    eprintln!();

    editor
        .save()
        .with_context(|| format!("failed to save {}", document.display()))?;
    tracing::info!("saved {}", document.display());
    Ok(())
}
