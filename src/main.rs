//! tagscan - annotation comment scanner and watcher

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = tagscan::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
