//! `tagscan init` - write a starter configuration file

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use crate::config::{CONFIG_FILE_NAME, STARTER_CONFIG};

pub fn run(output: &Output, path: &str) -> Result<()> {
    let dir = Path::new(path);
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        // Never clobber an edited config; init is safe to re-run.
        if output.is_json() {
            output.data(&serde_json::json!({
                "status": "exists",
                "path": config_path.display().to_string(),
            }));
        } else {
            output.success(&format!("{} already exists, leaving it alone", config_path.display()));
        }
        return Ok(());
    }

    fs::write(&config_path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "status": "created",
            "path": config_path.display().to_string(),
        }));
    } else {
        output.success(&format!("Wrote {}", config_path.display()));
        output.success("Edit it to add the directories you want scanned.");
    }

    Ok(())
}
