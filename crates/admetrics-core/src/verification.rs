use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::ingestion::try_parse_date;

/// The four source files a data directory is expected to carry.
pub const SOURCE_FILENAMES: [&str; 4] = ["business.csv", "Facebook.csv", "Google.csv", "TikTok.csv"];

/// Shape report for one source file, before any normalization: columns are
/// listed exactly as found in the header.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub date_range: Option<(String, String)>,
    pub tactics: Vec<String>,
    pub states: Vec<String>,
}

pub fn inspect_table(file: &str, content: &str) -> Result<FileReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let header = records
        .next()
        .ok_or_else(|| PipelineError::Validation(format!("{file}: file contained no header row")))?
        .map_err(PipelineError::from)?;
    let columns: Vec<String> = header.iter().map(|name| name.to_string()).collect();

    let date_idx = columns.iter().position(|name| name.trim() == "date");
    let tactic_idx = columns.iter().position(|name| name.trim() == "tactic");
    let state_idx = columns.iter().position(|name| name.trim() == "state");

    let mut rows = 0;
    let mut dates: Vec<String> = Vec::new();
    let mut tactics: Vec<String> = Vec::new();
    let mut states: Vec<String> = Vec::new();

    for record in records {
        let record = record?;
        rows += 1;

        if let Some(idx) = date_idx {
            dates.push(record.get(idx).unwrap_or("").to_string());
        }
        push_distinct(&mut tactics, tactic_idx, &record);
        push_distinct(&mut states, state_idx, &record);
    }

    Ok(FileReport {
        file: file.to_string(),
        rows,
        columns,
        date_range: date_span(&dates),
        tactics,
        states,
    })
}

/// Inspect every expected source file in `dir`. A missing or malformed file
/// yields a per-file error instead of aborting the other reports.
pub fn verify_data_dir(dir: &Path) -> Vec<(String, Result<FileReport>)> {
    SOURCE_FILENAMES
        .iter()
        .map(|file| {
            let report = fs::read_to_string(dir.join(file))
                .map_err(PipelineError::from)
                .and_then(|content| inspect_table(file, &content));
            ((*file).to_string(), report)
        })
        .collect()
}

/// Distinct values in first-seen order, mirroring how the raw exports are
/// usually eyeballed.
fn push_distinct(values: &mut Vec<String>, idx: Option<usize>, record: &csv::StringRecord) {
    let Some(idx) = idx else { return };
    let value = record.get(idx).unwrap_or("").to_string();
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Calendar ordering when every value parses as a date; lexicographic raw
/// strings otherwise, so a report still comes out for malformed files.
fn date_span(raw: &[String]) -> Option<(String, String)> {
    if raw.is_empty() {
        return None;
    }

    let parsed: Option<Vec<chrono::NaiveDate>> =
        raw.iter().map(|value| try_parse_date(value)).collect();

    match parsed {
        Some(dates) => {
            let min = dates.iter().min()?;
            let max = dates.iter().max()?;
            Some((
                min.format("%Y-%m-%d").to_string(),
                max.format("%Y-%m-%d").to_string(),
            ))
        }
        None => {
            let min = raw.iter().min()?;
            let max = raw.iter().max()?;
            Some((min.clone(), max.clone()))
        }
    }
}
