use clap::Args;
use pasture_rules::RuleEngine;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Rule expressions to compile.
    #[arg(required = true)]
    pub rules: Vec<String>,
}

pub fn run(engine: &RuleEngine, args: &CheckArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let results: Vec<_> = args
        .rules
        .iter()
        .map(|rule| (rule, engine.compile(rule)))
        .collect();
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    match format {
        OutputFormat::Json => {
            let out: Vec<_> = results
                .iter()
                .map(|(rule, result)| match result {
                    Ok(compiled) => serde_json::json!({
                        "rule": rule,
                        "ok": true,
                        "canonical": compiled.expr().to_source(),
                        "condition_types": compiled.expr().condition_types(),
                    }),
                    Err(e) => serde_json::json!({
                        "rule": rule,
                        "ok": false,
                        "error": e.to_string(),
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for (rule, result) in &results {
                match result {
                    Ok(compiled) => println!(
                        "  [ok ] {rule} ({types})",
                        types = compiled.expr().condition_types().join(", ")
                    ),
                    Err(e) => println!("  [err] {rule}: {e}"),
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} rules failed to compile", results.len());
    }
    Ok(())
}
