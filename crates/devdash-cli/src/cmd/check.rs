use crate::output::print_json;
use anyhow::Context;
use devdash_core::config::{Config, ConfigWarning, WarnLevel};
use std::path::Path;

/// Validate `devdash.yaml` plus the environment it depends on.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let mut warnings = config.validate();

    if let Some(program) = config.build.command.first().filter(|p| !p.trim().is_empty()) {
        if which::which(program).is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("build program '{program}' not found on PATH"),
            });
        }
    }

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "config": Config::path(root).exists(),
            "warnings": warnings,
        }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
