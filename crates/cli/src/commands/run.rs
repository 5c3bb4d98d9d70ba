use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use pasture_rules::{RuleEngine, RuleSet};

use super::{load_readings, parse_reading};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// TOML file of `[[rules]]` tables.
    #[arg(long)]
    pub rules: PathBuf,
    /// A reading (name=value). Repeatable.
    #[arg(long = "reading", short = 'r', value_parser = parse_reading)]
    pub readings: Vec<(String, f64)>,
    /// TOML file of `name = value` readings.
    #[arg(long = "readings")]
    pub readings_file: Option<PathBuf>,
    /// Stop at the first matching rule.
    #[arg(long)]
    pub first_match: bool,
}

pub fn run(engine: &RuleEngine, args: &RunArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&args.rules)
        .with_context(|| format!("failed to read rules {}", args.rules.display()))?;
    let set = RuleSet::from_toml_str(&contents)
        .with_context(|| format!("invalid rules file {}", args.rules.display()))?;
    let table = load_readings(args.readings_file.as_deref(), &args.readings)?;

    if args.first_match {
        let hit = set.first_match(engine, &table)?;
        match format {
            OutputFormat::Json => {
                let out = serde_json::json!({ "matched": hit.map(|r| &r.name) });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Text => match hit {
                Some(rule) => println!("{}", rule.name),
                None => println!("no rule matched"),
            },
        }
        return Ok(());
    }

    let outcomes = set.evaluate_all(engine, &table);
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    match format {
        OutputFormat::Json => {
            let out: Vec<_> = outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(matched) => serde_json::json!({ "rule": o.rule, "matched": matched }),
                    Err(e) => serde_json::json!({ "rule": o.rule, "error": e.to_string() }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{} rules evaluated:", outcomes.len());
            for o in &outcomes {
                match &o.result {
                    Ok(true) => println!("  [MATCH] {}", o.rule),
                    Ok(false) => println!("  [     ] {}", o.rule),
                    Err(e) => println!("  [ERROR] {}: {e}", o.rule),
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} rules failed to evaluate", outcomes.len());
    }
    Ok(())
}
