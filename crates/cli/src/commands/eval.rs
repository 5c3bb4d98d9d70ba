use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use pasture_rules::RuleEngine;

use super::{load_readings, parse_reading};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Rule expression, e.g. `temp > 38.5 AND humidity < 60`.
    pub rule: String,
    /// A reading (name=value). Repeatable.
    #[arg(long = "reading", short = 'r', value_parser = parse_reading)]
    pub readings: Vec<(String, f64)>,
    /// TOML file of `name = value` readings.
    #[arg(long = "readings")]
    pub readings_file: Option<PathBuf>,
}

pub fn run(engine: &RuleEngine, args: &EvalArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let table = load_readings(args.readings_file.as_deref(), &args.readings)?;
    let matched = engine
        .evaluate(&args.rule, &table)
        .with_context(|| format!("failed to evaluate `{}`", args.rule))?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({ "rule": args.rule, "matched": matched });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!("{matched}"),
    }
    Ok(())
}
