use std::io::Cursor;
use std::path::PathBuf;

use clap::Parser;
use form_autofill::cli::commands::{load_records, load_snapshot, save_snapshot, serve};
use form_autofill::cli::config::{AppConfig, Cli, Commands, load_config, parse_config};
use form_autofill::fill::Timing;
use form_autofill::orchestrator::{Orchestrator, Registry};
use form_autofill::store::MemoryStore;

mod common;
use common::forms::*;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_detect_with_snapshot() {
    let cli = Cli::parse_from(["form-autofill", "detect", "--snapshot", "page.json"]);
    match cli.command {
        Commands::Detect { format } => assert_eq!(format, "console"),
        _ => panic!("Expected Detect command"),
    }
    assert_eq!(cli.snapshot, Some(PathBuf::from("page.json")));
    assert_eq!(cli.verbose, 0);
}

#[test]
fn cli_parse_fill_all_args() {
    let cli = Cli::parse_from([
        "form-autofill",
        "-vv",
        "fill",
        "--data",
        "answers.json",
        "--format",
        "json",
        "--url",
        "https://forms.example/abc",
        "--store",
        "/tmp/store.json",
        "--trace",
        "trace.jsonl",
    ]);
    match cli.command {
        Commands::Fill { data, format } => {
            assert_eq!(data, PathBuf::from("answers.json"));
            assert_eq!(format, "json");
        }
        _ => panic!("Expected Fill command"),
    }
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.url.as_deref(), Some("https://forms.example/abc"));
    assert_eq!(cli.store, Some(PathBuf::from("/tmp/store.json")));
    assert_eq!(cli.trace, Some(PathBuf::from("trace.jsonl")));
}

#[test]
fn cli_parse_remaining_subcommands() {
    assert!(matches!(
        Cli::parse_from(["form-autofill", "load-and-fill"]).command,
        Commands::LoadAndFill { .. }
    ));
    assert!(matches!(Cli::parse_from(["form-autofill", "clear"]).command, Commands::Clear));
    match Cli::parse_from(["form-autofill", "show", "--format", "json"]).command {
        Commands::Show { format } => assert_eq!(format, "json"),
        other => panic!("Expected Show command, got {:?}", other),
    }
    assert!(matches!(Cli::parse_from(["form-autofill", "serve"]).command, Commands::Serve));
    assert!(matches!(
        Cli::parse_from(["form-autofill", "save"]).command,
        Commands::Save { data: None }
    ));
}

#[test]
fn cli_rejects_conflicting_page_sources() {
    let result = Cli::try_parse_from([
        "form-autofill",
        "detect",
        "--snapshot",
        "page.json",
        "--url",
        "https://forms.example",
    ]);
    assert!(result.is_err(), "Snapshot and URL are exclusive");

    let result = Cli::try_parse_from(["form-autofill", "detect", "--out", "after.json"]);
    assert!(result.is_err(), "--out needs --snapshot");

    let result = Cli::try_parse_from(["form-autofill", "fill"]);
    assert!(result.is_err(), "fill needs --data");
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_defaults_when_file_missing() {
    let config = load_config(Some("/nonexistent/path/form-autofill.yaml"));
    assert_eq!(config.timing, Timing::default());
    assert!(config.store.path.is_none());
    assert!(config.browser.headless);
}

#[test]
fn config_partial_yaml_keeps_other_defaults() {
    let yaml = r#"
timing:
  medium_ms: 250
  max_wait_attempts: 4
store:
  path: /var/lib/forms/store.json
browser:
  headless: false
"#;
    let config = parse_config(yaml).unwrap();
    assert_eq!(config.timing.medium_ms, 250);
    assert_eq!(config.timing.max_wait_attempts, 4);
    assert_eq!(config.timing.short_ms, Timing::default().short_ms, "Unset fields keep defaults");
    assert_eq!(config.store.path, Some(PathBuf::from("/var/lib/forms/store.json")));
    assert!(!config.browser.headless);
}

#[test]
fn config_empty_and_malformed() {
    assert_eq!(parse_config("").unwrap().timing, Timing::default());
    assert!(parse_config("timing: [1, 2").is_err());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "timing: {medium_ms: lots}").unwrap();
    let config = load_config(path.to_str());
    assert_eq!(config.timing, Timing::default(), "Malformed file falls back to defaults");
}

#[test]
fn cli_flags_override_config_paths() {
    let config = AppConfig {
        store: form_autofill::cli::config::StoreConfig {
            path: Some(PathBuf::from("from-config.json")),
        },
        ..Default::default()
    };
    let plain = Cli::parse_from(["form-autofill", "clear"]);
    assert_eq!(config.store_path(&plain), PathBuf::from("from-config.json"));
    assert_eq!(config.trace_path(&plain), None);

    let flagged = Cli::parse_from(["form-autofill", "clear", "--store", "from-flag.json"]);
    assert_eq!(config.store_path(&flagged), PathBuf::from("from-flag.json"));
}

// ============================================================================
// Files and the serve loop
// ============================================================================

#[test]
fn snapshot_files_round_trip_filled_values() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.json");
    std::fs::write(&input, serde_json::to_string(&survey()).unwrap()).unwrap();

    let mut doc = load_snapshot(&input).unwrap();
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let records: Vec<_> = serde_json::from_str(
        r#"[{"type":"text","question":"Full Name","value":"Jane Doe"}]"#,
    )
    .unwrap();
    assert!(orchestrator.fill_all(&mut doc, &records).all_filled());

    let output = dir.path().join("after.json");
    save_snapshot(&doc, &output).unwrap();
    let mut reloaded = load_snapshot(&output).unwrap();
    let fields = orchestrator.detect_all(&mut reloaded).unwrap();
    assert_eq!(fields[0].value.as_single(), "Jane Doe", "Live value persisted");
}

#[test]
fn load_records_reads_a_record_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("answers.json");
    std::fs::write(
        &path,
        r#"[{"type":"checkbox","question":"Pets","options":["Cat"],"value":["Cat"]}]"#,
    )
    .unwrap();
    let records = load_records(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value.as_list(), vec!["Cat"]);
}

#[test]
fn serve_answers_one_line_per_request() {
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let mut doc = page(&survey());
    let mut store = MemoryStore::new();

    let input = Cursor::new(
        [
            r#"{"action":"detectFields"}"#,
            "",
            r#"{"action":"fillForm","data":[{"type":"text","question":"Full Name","value":"Jane"}]}"#,
            r#"{"action":"nope"}"#,
        ]
        .join("\n"),
    );
    let mut output = Vec::new();
    serve(&orchestrator, &mut doc, &mut store, input, &mut output).unwrap();

    let lines: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3, "Blank line skipped");
    assert_eq!(lines[0]["fields"].as_array().map(Vec::len), Some(8));
    assert_eq!(lines[1]["filledCount"], 1);
    assert_eq!(lines[2]["success"], false);
}
