use chip_core::chip::snapshot::ChipSnapshot;
use chip_core::{BatchOutcome, ChipResult};
use clap::ValueEnum;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

pub fn render_result(
    result: &ChipResult,
    snapshot: Option<&ChipSnapshot>,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(result)?;
            if let (Some(snap), Value::Object(obj)) = (snapshot, &mut value) {
                obj.insert("peak_price".to_string(), json!(snap.peak_price()));
                obj.insert("distribution".to_string(), serde_json::to_value(snap.levels())?);
            }
            serde_json::to_string_pretty(&value)
        }
        OutputFormat::Text => {
            let mut out = result.summary();
            if let Some(snap) = snapshot {
                if let Some(peak) = snap.peak_price() {
                    out.push_str(&format!("\npeak_price={:.2}", peak));
                }
                for level in snap.levels().iter().filter(|l| l.mass > 0.0) {
                    out.push_str(&format!("\n{:>10.2} {:.6}", level.price, level.mass));
                }
            }
            Ok(out)
        }
    }
}

/// Failed symbols render as `null` (JSON) or a "no result" line.
pub fn render_batch(batch: &BatchOutcome, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => {
            let mut obj = Map::new();
            for (code, result) in &batch.entries {
                obj.insert(code.clone(), serde_json::to_value(result)?);
            }
            serde_json::to_string_pretty(&Value::Object(obj))
        }
        OutputFormat::Text => {
            let lines: Vec<String> = batch
                .entries
                .iter()
                .map(|(code, result)| match result {
                    Some(r) => r.summary(),
                    None => match batch.error(code) {
                        Some(e) => format!("{}: no result ({})", code, e),
                        None => format!("{}: no result", code),
                    },
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}
