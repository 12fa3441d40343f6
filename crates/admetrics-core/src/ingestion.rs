use std::collections::HashSet;

use chrono::NaiveDate;
use csv::StringRecord;
use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::types::{date_to_days, Platform, BUSINESS_MEASURES, MARKETING_MEASURES};

/// Accepted `date` renderings across the source exports.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Clone, Copy)]
enum HeaderRules {
    Marketing,
    Business,
}

pub(crate) fn try_parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

fn parse_date(file: &str, value: &str, line_index: usize) -> Result<NaiveDate> {
    try_parse_date(value).ok_or_else(|| PipelineError::MalformedDate {
        file: file.to_string(),
        line_index,
        value: value.trim().to_string(),
    })
}

/// Empty, unparseable, and literal NaN cells all normalize to an absent
/// value; sums downstream treat absence as zero contribution.
pub(crate) fn parse_optional_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn normalize_headers(record: &StringRecord, rules: HeaderRules) -> Vec<String> {
    record
        .iter()
        .map(|name| {
            let trimmed = name.trim();
            let remapped = match rules {
                HeaderRules::Business => match trimmed {
                    "# of orders" => "num_of_orders",
                    "# of new orders" => "num_of_new_orders",
                    other => other,
                },
                HeaderRules::Marketing => trimmed,
            };
            remapped.replace(' ', "_")
        })
        .collect()
}

fn column_index(file: &str, headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| {
            PipelineError::Validation(format!("{file}: missing required column '{name}'"))
        })
}

fn read_header(file: &str, records: &mut csv::StringRecordsIter<'_, &[u8]>) -> Result<StringRecord> {
    records
        .next()
        .ok_or_else(|| PipelineError::Validation(format!("{file}: file contained no header row")))?
        .map_err(PipelineError::from)
}

/// Parse one platform export into a normalized marketing frame with columns
/// `date, platform, state, tactic, impression, clicks, spend,
/// attributed_revenue`. The platform label comes from the caller, never from
/// file content.
pub fn read_platform_table(content: &str, platform: Platform) -> Result<DataFrame> {
    let file = platform.source_filename();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let header = read_header(file, &mut records)?;
    let headers = normalize_headers(&header, HeaderRules::Marketing);

    let date_idx = column_index(file, &headers, "date")?;
    let state_idx = column_index(file, &headers, "state")?;
    let tactic_idx = column_index(file, &headers, "tactic")?;
    let measure_idx = MARKETING_MEASURES
        .iter()
        .map(|name| column_index(file, &headers, name))
        .collect::<Result<Vec<_>>>()?;

    let mut dates: Vec<i32> = Vec::new();
    let mut states: Vec<String> = Vec::new();
    let mut tactics: Vec<String> = Vec::new();
    let mut measures: Vec<Vec<Option<f64>>> = vec![Vec::new(); MARKETING_MEASURES.len()];

    for (row_idx, record) in records.enumerate() {
        let record = record?;
        let line_index = row_idx + 2; // 1-indexed, after the header row

        let date = parse_date(file, record.get(date_idx).unwrap_or(""), line_index)?;
        dates.push(date_to_days(date));
        states.push(record.get(state_idx).unwrap_or("").to_string());
        tactics.push(record.get(tactic_idx).unwrap_or("").to_string());

        for (values, idx) in measures.iter_mut().zip(&measure_idx) {
            values.push(parse_optional_f64(record.get(*idx).unwrap_or("")));
        }
    }

    let height = dates.len();
    let date_series = Series::new("date".into(), dates).cast(&DataType::Date)?;

    let mut columns: Vec<Column> = vec![
        date_series.into(),
        Series::new("platform".into(), vec![platform.as_str(); height]).into(),
        Series::new("state".into(), states).into(),
        Series::new("tactic".into(), tactics).into(),
    ];
    for (name, values) in MARKETING_MEASURES.iter().zip(measures) {
        columns.push(Series::new((*name).into(), values).into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Parse the business export into a normalized frame with columns
/// `date, num_of_orders, num_of_new_orders, new_customers, total_revenue,
/// gross_profit, COGS`. Dates must be unique; a duplicate calendar date is a
/// contract violation, not a mergeable state.
pub fn read_business_table(content: &str) -> Result<DataFrame> {
    let file = "business.csv";
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let header = read_header(file, &mut records)?;
    let headers = normalize_headers(&header, HeaderRules::Business);

    let date_idx = column_index(file, &headers, "date")?;
    let measure_idx = BUSINESS_MEASURES
        .iter()
        .map(|name| column_index(file, &headers, name))
        .collect::<Result<Vec<_>>>()?;

    let mut dates: Vec<i32> = Vec::new();
    let mut seen_dates: HashSet<NaiveDate> = HashSet::new();
    let mut measures: Vec<Vec<Option<f64>>> = vec![Vec::new(); BUSINESS_MEASURES.len()];

    for (row_idx, record) in records.enumerate() {
        let record = record?;
        let line_index = row_idx + 2;

        let date = parse_date(file, record.get(date_idx).unwrap_or(""), line_index)?;
        if !seen_dates.insert(date) {
            return Err(PipelineError::Validation(format!(
                "{file} line {line_index}: duplicate business date {date}"
            )));
        }
        dates.push(date_to_days(date));

        for (values, idx) in measures.iter_mut().zip(&measure_idx) {
            values.push(parse_optional_f64(record.get(*idx).unwrap_or("")));
        }
    }

    let date_series = Series::new("date".into(), dates).cast(&DataType::Date)?;

    let mut columns: Vec<Column> = vec![date_series.into()];
    for (name, values) in BUSINESS_MEASURES.iter().zip(measures) {
        columns.push(Series::new((*name).into(), values).into());
    }

    Ok(DataFrame::new(columns)?)
}
