use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::browser::session::BrowserSession;
use crate::cli::config::{AppConfig, Cli};
use crate::dom::host::FormsHost;
use crate::dom::page::Page;
use crate::dom::snapshot::SnapshotNode;
use crate::dom::Document;
use crate::field::field_model::FieldRecord;
use crate::orchestrator::{Orchestrator, Registry, handle_line};
use crate::report::console::{format_detection_report, format_fill_report, format_saved_report};
use crate::store::{FormStore, JsonFileStore, SAVED_FORM_DATA, persistable};
use crate::trace::logger::TraceLogger;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// Page source
// ============================================================================

/// The page a command works on: an in-memory snapshot or a browser tab.
pub enum PageSource {
    Snapshot { document: Document, out: Option<PathBuf> },
    Browser(BrowserSession),
}

impl PageSource {
    pub fn open(cli: &Cli, config: &AppConfig) -> CliResult<Self> {
        if let Some(path) = &cli.snapshot {
            let document = load_snapshot(path)?;
            info!(path = %path.display(), "loaded snapshot");
            return Ok(PageSource::Snapshot {
                document,
                out: cli.out.clone(),
            });
        }
        if let Some(url) = &cli.url {
            let mut session = BrowserSession::launch(&config.browser)?;
            session.navigate(url)?;
            info!(url = %url, "opened page");
            return Ok(PageSource::Browser(session));
        }
        Err("a page is required: pass --snapshot <file> or --url <url>".into())
    }

    pub fn page(&mut self) -> &mut dyn Page {
        match self {
            PageSource::Snapshot { document, .. } => document,
            PageSource::Browser(session) => session,
        }
    }

    /// Writes the snapshot back when `--out` was given and closes the browser.
    pub fn finish(self) -> CliResult<()> {
        match self {
            PageSource::Snapshot { document, out } => {
                if let Some(out) = out {
                    save_snapshot(&document, &out)?;
                    info!(path = %out.display(), "wrote snapshot");
                }
                Ok(())
            }
            PageSource::Browser(mut session) => Ok(session.quit()?),
        }
    }
}

/// Reads a JSON DOM snapshot into a document driven by the forms host.
pub fn load_snapshot(path: &Path) -> CliResult<Document> {
    let content = std::fs::read_to_string(path)?;
    let root: SnapshotNode = serde_json::from_str(&content)?;
    Ok(Document::from_snapshot(&root).with_host(FormsHost::new()))
}

pub fn save_snapshot(document: &Document, path: &Path) -> CliResult<()> {
    let root = document.to_snapshot().ok_or("document has no root element")?;
    std::fs::write(path, serde_json::to_string_pretty(&root)?)?;
    Ok(())
}

pub fn load_records(path: &Path) -> CliResult<Vec<FieldRecord>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn open_tracer(cli: &Cli, config: &AppConfig) -> Option<TraceLogger> {
    config.trace_path(cli).map(TraceLogger::new)
}

fn build_orchestrator<'a>(registry: &'a Registry, tracer: Option<&'a TraceLogger>) -> Orchestrator<'a> {
    let orchestrator = Orchestrator::new(registry);
    match tracer {
        Some(tracer) => orchestrator.with_tracer(tracer),
        None => orchestrator,
    }
}

// ============================================================================
// detect subcommand
// ============================================================================

pub fn cmd_detect(cli: &Cli, config: &AppConfig, format: &str) -> CliResult<()> {
    let registry = Registry::standard(&config.timing);
    let mut source = PageSource::open(cli, config)?;
    let fields = Orchestrator::new(&registry).detect_all(source.page())?;
    source.finish()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&fields)?),
        _ => print!("{}", format_detection_report(&fields)),
    }
    Ok(())
}

// ============================================================================
// save subcommand
// ============================================================================

pub fn cmd_save(cli: &Cli, config: &AppConfig, data: Option<&Path>) -> CliResult<()> {
    let records = match data {
        Some(path) => persistable(SAVED_FORM_DATA, &load_records(path)?),
        None => {
            let registry = Registry::standard(&config.timing);
            let mut source = PageSource::open(cli, config)?;
            let fields = Orchestrator::new(&registry).detect_all(source.page())?;
            source.finish()?;
            fields
        }
    };
    if records.is_empty() {
        return Err("no fields to save".into());
    }

    let mut store = JsonFileStore::new(config.store_path(cli));
    store.save(SAVED_FORM_DATA, &records)?;
    println!("Saved {} fields to {}", records.len(), store.path().display());
    Ok(())
}

// ============================================================================
// fill / load-and-fill subcommands
// ============================================================================

/// Fill `records` and return whether every one of them succeeded.
fn run_fill(cli: &Cli, config: &AppConfig, records: &[FieldRecord], format: &str) -> CliResult<bool> {
    let registry = Registry::standard(&config.timing);
    let tracer = open_tracer(cli, config);
    let mut source = PageSource::open(cli, config)?;

    let summary = build_orchestrator(&registry, tracer.as_ref()).fill_all(source.page(), records);
    source.finish()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => print!("{}", format_fill_report(&summary)),
    }
    Ok(summary.all_filled())
}

pub fn cmd_fill(cli: &Cli, config: &AppConfig, data: &Path, format: &str) -> CliResult<bool> {
    let records = load_records(data)?;
    run_fill(cli, config, &records, format)
}

pub fn cmd_load_and_fill(cli: &Cli, config: &AppConfig, format: &str) -> CliResult<bool> {
    let store = JsonFileStore::new(config.store_path(cli));
    let records = store.load(SAVED_FORM_DATA)?.unwrap_or_default();
    if records.is_empty() {
        eprintln!("No saved data found in {}", store.path().display());
        return Ok(true);
    }
    run_fill(cli, config, &records, format)
}

// ============================================================================
// show subcommand
// ============================================================================

pub fn cmd_show(cli: &Cli, config: &AppConfig, format: &str) -> CliResult<()> {
    let store = JsonFileStore::new(config.store_path(cli));
    let records = store.load(SAVED_FORM_DATA)?.unwrap_or_default();
    info!(path = %store.path().display(), count = records.len(), "loaded saved records");

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&records)?),
        _ => print!("{}", format_saved_report(&records)),
    }
    Ok(())
}

// ============================================================================
// clear subcommand
// ============================================================================

pub fn cmd_clear(cli: &Cli, config: &AppConfig) -> CliResult<()> {
    let mut store = JsonFileStore::new(config.store_path(cli));
    if store.remove(SAVED_FORM_DATA)? {
        println!("Cleared saved form data");
    } else {
        println!("Nothing saved");
    }
    Ok(())
}

// ============================================================================
// serve subcommand
// ============================================================================

/// Reads one JSON command per line and writes one JSON response per line.
pub fn cmd_serve(cli: &Cli, config: &AppConfig) -> CliResult<()> {
    let registry = Registry::standard(&config.timing);
    let tracer = open_tracer(cli, config);
    let orchestrator = build_orchestrator(&registry, tracer.as_ref());
    let mut store = JsonFileStore::new(config.store_path(cli));
    let mut source = PageSource::open(cli, config)?;

    serve(&orchestrator, source.page(), &mut store, std::io::stdin().lock(), std::io::stdout().lock())?;
    source.finish()
}

pub fn serve(
    orchestrator: &Orchestrator<'_>,
    page: &mut dyn Page,
    store: &mut dyn FormStore,
    input: impl BufRead,
    mut output: impl Write,
) -> CliResult<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(orchestrator, page, store, &line);
        writeln!(output, "{}", serde_json::to_string(&response)?)?;
        output.flush()?;
    }
    Ok(())
}
