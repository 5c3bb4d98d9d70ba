pub mod check;
pub mod eval;
pub mod run;

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use pasture_rules::{EngineConfig, InnerTable, RuleEngine};
use tracing::debug;

/// Build the engine from an optional TOML config file.
pub fn load_engine(path: Option<&Path>) -> anyhow::Result<RuleEngine> {
    let config = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            EngineConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    debug!(?config, "engine config loaded");
    Ok(RuleEngine::from_config(&config)?)
}

/// Parse a `name=value` reading.
pub fn parse_reading(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid NAME=VALUE: no `=` found in `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid NAME=VALUE: empty name in `{s}`"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for `{name}`: {e}"))?;
    Ok((name.to_owned(), value))
}

/// Merge readings from an optional TOML file with `--reading` pairs.
///
/// Pairs given on the command line override the file.
pub fn load_readings(file: Option<&Path>, pairs: &[(String, f64)]) -> anyhow::Result<InnerTable> {
    let mut table = InnerTable::new();
    if let Some(path) = file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read readings {}", path.display()))?;
        let parsed: HashMap<String, f64> = toml::from_str(&contents)
            .with_context(|| format!("invalid readings file {}", path.display()))?;
        table.extend(parsed);
    }
    table.extend(pairs.iter().cloned());
    debug!(readings = table.len(), "symbol table built");
    Ok(table)
}
