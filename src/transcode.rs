use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::info;
use serde_json::Value;

use crate::cli::TranscodeArgs;

pub fn execute(args: &TranscodeArgs) -> Result<()> {
    for input in &args.inputs {
        let output = transcode_file(input, args.outdir.as_deref())
            .with_context(|| format!("Transcoding {input:?}"))?;
        info!("{input:?} -> {output:?}");
    }
    Ok(())
}

/// Converts one line-delimited JSON export into a CSV export with the
/// same column shape. The header is the key order of the first record;
/// keys missing from later records become empty cells, while a key the
/// header does not cover is an error.
pub fn transcode_file(input: &Path, out_dir: Option<&Path>) -> Result<PathBuf> {
    let raw = fs::read_to_string(input).with_context(|| format!("Reading {input:?}"))?;
    let mut records = Vec::new();
    let mut headers: Vec<String> = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(line).with_context(|| format!("Parsing line {}", line_no + 1))?;
        let map = match value {
            Value::Object(map) => map,
            other => bail!("Line {} is not a JSON object: {other}", line_no + 1),
        };
        if headers.is_empty() {
            headers = map.keys().cloned().collect();
        } else if let Some(stray) = map.keys().find(|key| !headers.contains(key)) {
            bail!("Line {} has key '{stray}' not present in the header", line_no + 1);
        }
        records.push(map);
    }
    if records.is_empty() {
        bail!("No records found");
    }
    let output = output_path(input, out_dir);
    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("Creating CSV file {output:?}"))?;
    writer.write_record(&headers)?;
    for record in &records {
        let row: Vec<String> = headers
            .iter()
            .map(|key| record.get(key).map(render_value).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(output)
}

fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(format!("{stem}_json.csv"))
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
