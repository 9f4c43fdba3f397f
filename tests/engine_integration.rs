//! Engine integration tests
//!
//! These exercise the full scan → index → render → publish flow on real
//! temporary trees, plus the live watch path end to end.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use tagscan::config::{Config, DirectoryConfig, PatternConfig, Settings};
use tagscan::engine::Engine;
use tagscan::render::{render_channel, Publication, RenderReceiver, Style};
use tagscan::watch::{ChangeEvent, Notifier};

fn config_for(root: &Path) -> Config {
    Config {
        settings: Settings::default(),
        directories: vec![DirectoryConfig {
            name: "test".to_string(),
            path: root.to_path_buf(),
            ignore_paths: vec!["build".to_string()],
            ignore_types: vec![".log".to_string()],
        }],
        patterns: vec![
            PatternConfig {
                name: "TODO".to_string(),
                regex: "TODO:(.*)".to_string(),
            },
            PatternConfig {
                name: "FIX".to_string(),
                regex: "FIX:(.*)".to_string(),
            },
        ],
        fences: HashMap::from([("c".to_string(), "*/".to_string())]),
    }
}

fn scanned_engine(config: &Config) -> (Engine, RenderReceiver) {
    let (queue, receiver) = render_channel();
    let mut engine = Engine::from_config(config, queue).unwrap();
    engine.initial_scan();
    (engine, receiver)
}

#[test]
fn test_full_scan_builds_the_expected_index() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "x\ny\n# TODO: fix X\n").unwrap();
    fs::write(dir.path().join("b.log"), "# TODO: ignored\n").unwrap();

    let config = config_for(dir.path());
    let (engine, _receiver) = scanned_engine(&config);

    let files = engine.index().files(dir.path()).unwrap();
    assert_eq!(files.len(), 1);

    let tasks = files["a.py"].tasks_for("TODO");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].line, 3);
    assert_eq!(tasks[0].text, "fix X");
    assert_eq!(tasks[0].path, "a.py");
}

#[test]
fn test_ignore_type_beats_valid_markers() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("only.log"), "# TODO: never indexed\n").unwrap();

    let config = config_for(dir.path());
    let (engine, _receiver) = scanned_engine(&config);

    assert!(engine.index().is_empty());
}

#[test]
fn test_fence_stripping_end_to_end() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("x.c"), "/* FIX: fix this */\n").unwrap();

    let config = config_for(dir.path());
    let (engine, _receiver) = scanned_engine(&config);

    let tasks = engine.index().files(dir.path()).unwrap()["x.c"].tasks_for("FIX");
    assert_eq!(tasks[0].text, "fix this");
}

#[test]
fn test_rescan_is_idempotent() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "# TODO: one\n# FIX: two\n").unwrap();

    let config = config_for(dir.path());
    let (mut engine, _receiver) = scanned_engine(&config);
    let first = engine.index().snapshot();

    engine.initial_scan();

    assert_eq!(&first, engine.index());
}

#[test]
fn test_alignment_spans_the_whole_snapshot() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("deeply/nested")).unwrap();
    fs::write(dir.path().join("a.py"), "# TODO: short\n").unwrap();
    fs::write(
        dir.path().join("deeply/nested/long_name.py"),
        "# TODO: long\n",
    )
    .unwrap();

    let config = config_for(dir.path());
    let (_engine, receiver) = scanned_engine(&config);
    let publication = receiver.latest().unwrap();

    let text: String = publication
        .records
        .iter()
        .map(|r| r.text.as_str())
        .collect();

    // "deeply/nested/long_name.py:1" is the longest location; the short
    // row's gap is its length minus "a.py:1" plus the base four.
    let long = "deeply/nested/long_name.py:1";
    let expected_gap = long.len() - "a.py:1".len() + 4;
    assert!(text.contains(&format!("a.py:1{}short", " ".repeat(expected_gap))));
    assert!(text.contains(&format!("{}{}long", long, " ".repeat(4))));
}

#[test]
fn test_publication_styles_follow_the_contract() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "# TODO: fix X\n").unwrap();

    let config = config_for(dir.path());
    let (_engine, receiver) = scanned_engine(&config);
    let Publication { records, .. } = receiver.latest().unwrap();

    assert_eq!(records[0].style, Style::Heading);
    assert!(records[0].text.starts_with("DIRECTORY: "));
    assert_eq!(records[1].style, Style::Bold);
    assert_eq!(records[1].text, "TODO\n");
    assert_eq!(records[3].style, Style::Italic);
    assert_eq!(records[3].text, "a.py:1");
}

#[test]
fn test_snapshot_resolves_selection_tokens() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/a.py"), "# TODO: fix X\n").unwrap();

    let config = config_for(dir.path());
    let (_engine, receiver) = scanned_engine(&config);
    let publication = receiver.latest().unwrap();

    assert_eq!(
        publication.snapshot.resolve("src/a.py"),
        Some(dir.path().join("src/a.py"))
    );
    assert_eq!(publication.snapshot.resolve("missing.py"), None);
}

#[test]
fn test_back_to_back_events_settle_on_the_final_state() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.py");
    fs::write(&file, "# TODO: first\n").unwrap();

    let config = config_for(dir.path());
    let (mut engine, receiver) = scanned_engine(&config);

    fs::write(&file, "# TODO: second\n# TODO: third\n").unwrap();
    engine.handle_event(&ChangeEvent {
        path: file.clone(),
        is_dir: false,
    });
    fs::remove_file(&file).unwrap();
    engine.handle_event(&ChangeEvent {
        path: file,
        is_dir: false,
    });

    assert!(engine.index().is_empty());

    let publication = receiver.latest().unwrap();
    assert!(publication.records.is_empty());
    assert_eq!(publication.snapshot.task_count(), 0);
}

#[test]
fn test_watch_end_to_end_indexes_a_new_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("seed.py"), "# TODO: seed\n").unwrap();

    let config = config_for(dir.path());
    let (queue, receiver) = render_channel();
    let mut engine = Engine::from_config(&config, queue).unwrap();
    engine.initial_scan();
    assert_eq!(receiver.latest().unwrap().snapshot.task_count(), 1);

    let (event_tx, event_rx) = mpsc::channel();
    let notifier = Notifier::start(&[dir.path().to_path_buf()], event_tx).unwrap();
    let reconciler = thread::spawn(move || engine.run(event_rx));

    fs::write(dir.path().join("fresh.py"), "# TODO: via watch\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = false;
    while Instant::now() < deadline && !seen {
        if let Some(publication) = receiver.latest() {
            seen = publication
                .snapshot
                .files(dir.path())
                .map(|files| files.contains_key("fresh.py"))
                .unwrap_or(false);
        }
        thread::sleep(Duration::from_millis(100));
    }
    assert!(seen, "watched file never reached the index");

    // Notifier teardown closes the channel and the reconciler drains out.
    drop(notifier);
    reconciler.join().unwrap();
}
