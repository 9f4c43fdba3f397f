//! Live watch mode
//!
//! Runs the initial scan, starts the notifier and the reconciler loop, then
//! keeps a terminal viewer current by polling the render queue. The viewer
//! never touches the index itself; it only consumes publications.

mod app;
mod event;
mod ui;

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::output::Output;
use crate::config::Config;
use crate::engine::Engine;
use crate::render::{render_channel, RenderReceiver};
use crate::watch::Notifier;
use app::App;
use event::EventHandler;

pub fn run(output: &Output, config: &Config, plain: bool) -> Result<()> {
    let (queue, receiver) = render_channel();
    let mut engine = Engine::from_config(config, queue)?;

    output.verbose(&format!("watching {} directories", engine.directories().len()));
    engine.initial_scan();

    let roots: Vec<_> = engine.directories().iter().map(|d| d.root.clone()).collect();
    let (event_tx, event_rx) = mpsc::channel();
    let notifier = Notifier::start(&roots, event_tx)?;
    let reconciler = thread::spawn(move || engine.run(event_rx));

    let poll_interval = Duration::from_millis(config.settings.poll_interval_ms);
    let result = if plain {
        run_plain(&receiver, poll_interval)
    } else {
        run_viewer(config, &receiver, poll_interval)
    };

    // Tear down event delivery first; the reconciler finishes whatever
    // event it is on and drains out once its channel closes.
    drop(notifier);
    if reconciler.join().is_err() {
        return Err(anyhow!("reconciler thread panicked"));
    }

    result
}

/// Stdout fallback: prints each new publication, timestamped, until killed
fn run_plain(receiver: &RenderReceiver, poll_interval: Duration) -> Result<()> {
    loop {
        if let Some(publication) = receiver.latest() {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            println!("[{}] {} tasks", timestamp, publication.snapshot.task_count());
            for record in &publication.records {
                print!("{}", record.text);
            }
        }
        thread::sleep(poll_interval);
    }
}

/// Full-screen viewer with panic-safe terminal restore
fn run_viewer(config: &Config, receiver: &RenderReceiver, poll_interval: Duration) -> Result<()> {
    let mut terminal = ui::init_terminal()?;

    let mut app = App::new(config.settings.editor.clone());
    if let Some(publication) = receiver.latest() {
        app.apply(publication);
    }

    let events = EventHandler::new(poll_interval.as_millis() as u64);

    // Terminal must be restored even if the viewer panics.
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        app.run(&mut terminal, events, receiver)
    }));

    let restore_result = ui::restore_terminal();

    match result {
        Ok(inner_result) => {
            restore_result?;
            inner_result
        }
        Err(panic_payload) => {
            let _ = restore_result;
            if let Some(s) = panic_payload.downcast_ref::<&str>() {
                Err(anyhow!("viewer panicked: {}", s))
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                Err(anyhow!("viewer panicked: {}", s))
            } else {
                Err(anyhow!("viewer panicked with unknown error"))
            }
        }
    }
}
