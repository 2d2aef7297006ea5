//! Patchwise CLI entry point.
//!
//! Drives the engine from a terminal: watch an analyzer's progress, stream a
//! replacement into a file for review, or check a payload against the shape
//! guards. Sync messages are printed to stdout as JSON lines.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use patchwise::application::{AnalysisTracker, ApplyOptions, DiffManager};
use patchwise::domain::{ApplyStatus, ServerState};
use patchwise::infra::app_config::{AppConfig, load_config};
use patchwise::infra::document::InMemoryDocuments;
use patchwise::infra::logging::init_logging;
use patchwise::infra::progress::monitor_progress;
use patchwise::infra::validation::{validate_rule_sets, validate_solution_response};
use patchwise::state::StateStore;
use patchwise::sync::{SyncReceiver, sync_channel};

const STDIN_CHUNK: usize = 4 * 1024;

#[derive(Parser, Debug)]
#[command(name = "patchwise")]
#[command(version)]
#[command(about = "Streamed edit application and review", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an analyzer and report its progress as sync messages
    Progress {
        /// Analyzer command line (after `--`)
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Stream replacement text from stdin into FILE and review the result
    Apply {
        file: PathBuf,

        /// Accept every block and write the file
        #[arg(long, conflicts_with = "reject_all")]
        accept_all: bool,

        /// Reject every block and write the file
        #[arg(long)]
        reject_all: bool,
    },

    /// Check a JSON payload against its shape guard
    Validate {
        #[arg(value_enum)]
        kind: PayloadKind,
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PayloadKind {
    Solution,
    RuleSets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config();
    init_logging(&config);

    match args.command {
        Commands::Progress { command } => run_progress(&config, command).await,
        Commands::Apply {
            file,
            accept_all,
            reject_all,
        } => run_apply(&config, file, accept_all, reject_all).await,
        Commands::Validate { kind, file } => run_validate(kind, file).await,
    }
}

fn new_store(config: &AppConfig) -> (Arc<StateStore>, tokio::task::JoinHandle<()>) {
    let (publisher, receiver) = sync_channel();
    let store = StateStore::new(publisher).with_debug_mutations(config.debug_state_mutations);
    (Arc::new(store), tokio::spawn(print_messages(receiver)))
}

async fn print_messages(mut receiver: SyncReceiver) {
    while let Some(message) = receiver.recv().await {
        match message.encode() {
            Ok(line) => println!("{line}"),
            Err(err) => log::warn!("failed to encode {}: {err}", message.message_type()),
        }
    }
}

async fn run_progress(config: &AppConfig, command: Vec<String>) -> Result<()> {
    let Some((program, program_args)) = command.split_first() else {
        bail!("No analyzer command given");
    };

    let (store, printer) = new_store(config);
    let tracker = AnalysisTracker::new(store.clone());
    store.publish_full_state();
    store.set_server_state(ServerState::Starting, None);

    let mut child = Command::new(program)
        .args(program_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to spawn analyzer: {}", command.join(" ")))?;
    log::info!("spawned analyzer pid: {}", child.id().unwrap_or(0));
    store.set_server_state(ServerState::Running, None);
    tracker.start();

    let stderr = child
        .stderr
        .take()
        .context("Failed to capture analyzer stderr")?;
    let mut stdout = child
        .stdout
        .take()
        .context("Failed to capture analyzer stdout")?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let (parser, forwarder) = tracker.progress_parser();
    let monitor = tokio::spawn(monitor_progress(stderr, parser, Some(cancel.clone())));

    let mut output = String::new();
    tokio::select! {
        res = stdout.read_to_string(&mut output) => {
            res.context("Failed to read analyzer output")?;
        }
        _ = cancel.cancelled() => {
            log::warn!("interrupted; stopping analyzer");
            child.start_kill().ok();
        }
    }
    let status = child.wait().await.context("Failed to wait for analyzer")?;

    let parser = monitor.await??;
    log::debug!(
        "progress lines: {} events, {} ignored",
        parser.delivered(),
        parser.dropped()
    );
    drop(parser);
    forwarder.await?;

    store.set_server_state(ServerState::Stopping, None);
    if !status.success() {
        tracker.fail(format!("Analyzer exited with {status}"));
    } else if output.trim().is_empty() {
        tracker.fail("Analyzer produced no results");
    } else {
        match serde_json::from_str(&output) {
            Ok(results) => {
                if let Err(err) = tracker.complete(&results) {
                    log::warn!("rejected analyzer results: {err}");
                }
            }
            Err(err) => tracker.fail(format!("Analyzer output is not JSON: {err}")),
        }
    }
    store.set_server_state(ServerState::Stopped, None);

    drop(tracker);
    drop(store);
    printer.await?;
    Ok(())
}

/// Reads stdin in chunks, holding back a trailing partial UTF-8 sequence.
async fn next_stdin_chunk(
    stdin: &mut tokio::io::Stdin,
    carry: &mut Vec<u8>,
) -> Result<Option<String>> {
    let mut buf = vec![0u8; STDIN_CHUNK];
    let read = stdin.read(&mut buf).await.context("Failed to read stdin")?;
    if read == 0 {
        if carry.is_empty() {
            return Ok(None);
        }
        let rest = String::from_utf8_lossy(carry).into_owned();
        carry.clear();
        return Ok(Some(rest));
    }
    carry.extend_from_slice(&buf[..read]);
    let valid = match std::str::from_utf8(carry) {
        Ok(text) => text.len(),
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        Err(err) => bail!("stdin is not valid UTF-8: {err}"),
    };
    let rest = carry.split_off(valid);
    let text = String::from_utf8(std::mem::replace(carry, rest))
        .context("stdin is not valid UTF-8")?;
    Ok(Some(text))
}

async fn run_apply(
    config: &AppConfig,
    file: PathBuf,
    accept_all: bool,
    reject_all: bool,
) -> Result<()> {
    let original = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let uri = format!("file://{}", file.display());

    let (store, printer) = new_store(config);
    let docs = Arc::new(InMemoryDocuments::new());
    docs.open(uri.clone(), &original);
    let manager = DiffManager::new(docs.clone(), store.clone())
        .with_options(ApplyOptions::from_config(config));

    let mut stdin = tokio::io::stdin();
    let mut carry = Vec::new();
    while let Some(chunk) = next_stdin_chunk(&mut stdin, &mut carry).await? {
        manager.apply_chunk(&uri, &original, &chunk).await?;
    }
    let state = manager.finalize(&uri).await?;

    for (index, block) in manager.blocks(&uri).await.iter().enumerate() {
        eprintln!(
            "block {index}: line {} -{} +{}",
            block.start_line, block.removed_count, block.added_count
        );
    }

    if state.status == ApplyStatus::Done && (accept_all || reject_all) {
        if accept_all {
            manager.accept_all(&uri).await?;
        } else {
            manager.reject_all(&uri).await?;
        }
        let text = docs
            .text(&uri)
            .with_context(|| format!("Document {uri} was closed"))?;
        let mut out = tokio::fs::File::create(&file)
            .await
            .with_context(|| format!("Failed to write {}", file.display()))?;
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
        eprintln!("wrote {}", file.display());
    } else if state.status == ApplyStatus::Done {
        eprintln!(
            "{} blocks pending review; file left unchanged",
            state.diff_block_count.unwrap_or(0)
        );
    } else {
        eprintln!("no changes to review");
    }

    drop(manager);
    drop(store);
    printer.await?;
    Ok(())
}

async fn run_validate(kind: PayloadKind, file: PathBuf) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", file.display()))?;

    let result = match kind {
        PayloadKind::Solution => validate_solution_response(&value),
        PayloadKind::RuleSets => validate_rule_sets(&value),
    };
    match result {
        Ok(()) => {
            println!("valid");
            Ok(())
        }
        Err(err) => bail!("invalid {kind:?} payload: {err}"),
    }
}
