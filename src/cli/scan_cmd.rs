//! `tagscan scan` - one-shot scan of every configured directory

use anyhow::Result;
use crossterm::style::Stylize;

use super::output::Output;
use crate::config::Config;
use crate::engine::Engine;
use crate::render::{render_channel, DisplayRecord, Style};

pub fn run(output: &Output, config: &Config) -> Result<()> {
    let (queue, receiver) = render_channel();
    let mut engine = Engine::from_config(config, queue)?;

    output.verbose(&format!(
        "scanning {} directories with {} patterns",
        engine.directories().len(),
        config.patterns.len()
    ));
    engine.initial_scan();

    if output.is_json() {
        output.data(engine.index());
        return Ok(());
    }

    if let Some(publication) = receiver.latest() {
        print_records(&publication.records);
    }

    Ok(())
}

/// Styled terminal rendition of the display records
fn print_records(records: &[DisplayRecord]) {
    for record in records {
        match record.style {
            Style::Heading => print!("{}", record.text.as_str().bold().underlined()),
            Style::Bold => print!("{}", record.text.as_str().bold()),
            Style::Italic => print!("{}", record.text.as_str().italic()),
            Style::Plain => print!("{}", record.text),
        }
    }
}
