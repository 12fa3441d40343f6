use std::collections::HashMap;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use admetrics_core::metrics::round2;
use admetrics_core::types::{days_to_date, Platform};

use crate::error::{InsightsError, Result};

/// Inclusive reporting window over the `date` column.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(InsightsError::Summary(format!(
                "date range ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Keep the rows whose `date` falls inside the range, bounds inclusive.
pub fn filter_by_date(df: &DataFrame, range: DateRange) -> Result<DataFrame> {
    let date = df.column("date")?.date()?;
    let mut mask = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let keep = date
            .get(idx)
            .and_then(days_to_date)
            .map(|value| range.contains(value))
            .unwrap_or(false);
        mask.push(keep);
    }

    let mask = Series::new("mask".into(), mask);
    Ok(df.filter(mask.bool()?)?)
}

/// Keep the marketing rows belonging to the given platforms. An empty
/// platform list keeps everything.
pub fn filter_platforms(df: &DataFrame, platforms: &[Platform]) -> Result<DataFrame> {
    if platforms.is_empty() {
        return Ok(df.clone());
    }

    let column = df.column("platform")?.str()?;
    let mut mask = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let keep = column
            .get(idx)
            .map(|name| platforms.iter().any(|platform| platform.as_str() == name))
            .unwrap_or(false);
        mask.push(keep);
    }

    let mask = Series::new("mask".into(), mask);
    Ok(df.filter(mask.bool()?)?)
}

/// Earliest and latest date present in a frame, if it has any rows.
pub fn date_span(df: &DataFrame) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let date = df.column("date")?.date()?;
    let mut span: Option<(NaiveDate, NaiveDate)> = None;
    for idx in 0..df.height() {
        let Some(value) = date.get(idx).and_then(days_to_date) else {
            continue;
        };
        span = Some(match span {
            None => (value, value),
            Some((min, max)) => (min.min(value), max.max(value)),
        });
    }
    Ok(span)
}

/// Headline totals over the joined business table for one reporting window.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub total_revenue: f64,
    pub total_spend: f64,
    pub roas: f64,
    pub total_orders: f64,
    pub new_customers: f64,
    pub avg_order_value: f64,
}

pub fn performance_summary(joined: &DataFrame) -> Result<PerformanceSummary> {
    let total_revenue = column_sum(joined, "total_revenue")?;
    let total_spend = column_sum(joined, "spend")?;
    let attributed_revenue = column_sum(joined, "attributed_revenue")?;
    let total_orders = column_sum(joined, "num_of_orders")?;
    let new_customers = column_sum(joined, "new_customers")?;

    Ok(PerformanceSummary {
        total_revenue,
        total_spend,
        roas: safe_div(attributed_revenue, total_spend),
        total_orders,
        new_customers,
        avg_order_value: safe_div(total_revenue, total_orders),
    })
}

/// Per-platform totals and mean KPIs over the marketing aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformRollup {
    pub platform: String,
    pub spend: f64,
    pub attributed_revenue: f64,
    pub impressions: f64,
    pub mean_roas: f64,
    pub mean_ctr: f64,
    pub mean_cpc: f64,
}

pub fn platform_rollups(marketing: &DataFrame) -> Result<Vec<PlatformRollup>> {
    let len = marketing.height();
    let platform = marketing.column("platform")?.str()?;
    let spend = marketing.column("spend")?.f64()?;
    let attributed_revenue = marketing.column("attributed_revenue")?.f64()?;
    let impressions = marketing.column("impression")?.f64()?;
    let roas = marketing.column("roas")?.f64()?;
    let ctr = marketing.column("ctr")?.f64()?;
    let cpc = marketing.column("cpc")?.f64()?;

    #[derive(Default)]
    struct Accumulator {
        spend: f64,
        attributed_revenue: f64,
        impressions: f64,
        roas: Vec<f64>,
        ctr: Vec<f64>,
        cpc: Vec<f64>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Accumulator> = HashMap::new();

    for idx in 0..len {
        let Some(name) = platform.get(idx) else {
            continue;
        };
        if !order.iter().any(|existing| existing == name) {
            order.push(name.to_string());
        }
        let acc = groups.entry(name.to_string()).or_default();
        acc.spend += spend.get(idx).unwrap_or(0.0);
        acc.attributed_revenue += attributed_revenue.get(idx).unwrap_or(0.0);
        acc.impressions += impressions.get(idx).unwrap_or(0.0);
        if let Some(value) = roas.get(idx) {
            acc.roas.push(value);
        }
        if let Some(value) = ctr.get(idx) {
            acc.ctr.push(value);
        }
        if let Some(value) = cpc.get(idx) {
            acc.cpc.push(value);
        }
    }

    Ok(order
        .into_iter()
        .map(|name| {
            let acc = groups.remove(&name).unwrap_or_default();
            PlatformRollup {
                platform: name,
                spend: round2(acc.spend),
                attributed_revenue: round2(acc.attributed_revenue),
                impressions: acc.impressions,
                mean_roas: round2(mean(&acc.roas)),
                mean_ctr: round2(mean(&acc.ctr)),
                mean_cpc: round2(mean(&acc.cpc)),
            }
        })
        .collect())
}

/// Per-(platform, tactic) mean ROAS and spend.
#[derive(Debug, Clone, Serialize)]
pub struct TacticRollup {
    pub platform: String,
    pub tactic: String,
    pub mean_roas: f64,
    pub spend: f64,
}

pub fn tactic_rollups(marketing: &DataFrame) -> Result<Vec<TacticRollup>> {
    let len = marketing.height();
    let platform = marketing.column("platform")?.str()?;
    let tactic = marketing.column("tactic")?.str()?;
    let spend = marketing.column("spend")?.f64()?;
    let roas = marketing.column("roas")?.f64()?;

    #[derive(Default)]
    struct Accumulator {
        spend: f64,
        roas: Vec<f64>,
    }

    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Accumulator> = HashMap::new();

    for idx in 0..len {
        let (Some(platform_name), Some(tactic_name)) = (platform.get(idx), tactic.get(idx)) else {
            continue;
        };
        let key = (platform_name.to_string(), tactic_name.to_string());
        if !order.contains(&key) {
            order.push(key.clone());
        }
        let acc = groups.entry(key).or_default();
        acc.spend += spend.get(idx).unwrap_or(0.0);
        if let Some(value) = roas.get(idx) {
            acc.roas.push(value);
        }
    }

    Ok(order
        .into_iter()
        .map(|key| {
            let acc = groups.remove(&key).unwrap_or_default();
            TacticRollup {
                platform: key.0,
                tactic: key.1,
                mean_roas: round2(mean(&acc.roas)),
                spend: round2(acc.spend),
            }
        })
        .collect())
}

/// Mean KPIs per weekday over the joined table.
#[derive(Debug, Clone, Serialize)]
pub struct WeekdayRollup {
    pub day: String,
    pub mean_revenue: f64,
    pub mean_roas: f64,
}

/// Day-over-day drift and weekday seasonality over the joined table.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub revenue_trend_pct: f64,
    pub spend_trend_pct: f64,
    pub roas_trend_pct: f64,
    pub best_day: String,
    pub worst_day: String,
    pub weekdays: Vec<WeekdayRollup>,
}

pub fn trend_summary(joined: &DataFrame) -> Result<TrendSummary> {
    let sorted = joined
        .clone()
        .lazy()
        .sort(["date"], SortMultipleOptions::default())
        .collect()?;

    let revenue = column_values(&sorted, "total_revenue")?;
    let spend = column_values(&sorted, "spend")?;
    let roas = column_values(&sorted, "total_roas")?;
    let weekday = sorted.column("day_of_week")?.str()?;

    #[derive(Default)]
    struct Accumulator {
        revenue: Vec<f64>,
        roas: Vec<f64>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Accumulator> = HashMap::new();
    for idx in 0..sorted.height() {
        let Some(day) = weekday.get(idx) else {
            continue;
        };
        if !order.iter().any(|existing| existing == day) {
            order.push(day.to_string());
        }
        let acc = groups.entry(day.to_string()).or_default();
        acc.revenue.push(revenue.get(idx).copied().unwrap_or(0.0));
        acc.roas.push(roas.get(idx).copied().unwrap_or(0.0));
    }

    let weekdays: Vec<WeekdayRollup> = order
        .into_iter()
        .map(|day| {
            let acc = groups.remove(&day).unwrap_or_default();
            WeekdayRollup {
                day,
                mean_revenue: round2(mean(&acc.revenue)),
                mean_roas: round2(mean(&acc.roas)),
            }
        })
        .collect();

    let best_day = weekdays
        .iter()
        .max_by(|a, b| a.mean_revenue.total_cmp(&b.mean_revenue))
        .map(|rollup| rollup.day.clone())
        .unwrap_or_else(|| "n/a".to_string());
    let worst_day = weekdays
        .iter()
        .min_by(|a, b| a.mean_revenue.total_cmp(&b.mean_revenue))
        .map(|rollup| rollup.day.clone())
        .unwrap_or_else(|| "n/a".to_string());

    Ok(TrendSummary {
        revenue_trend_pct: round2(mean_pct_change(&revenue)),
        spend_trend_pct: round2(mean_pct_change(&spend)),
        roas_trend_pct: round2(mean_pct_change(&roas)),
        best_day,
        worst_day,
        weekdays,
    })
}

/// Distinct values of a string column in first-seen order.
pub fn distinct_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let values = df.column(column)?.str()?;
    let mut seen: Vec<String> = Vec::new();
    for idx in 0..df.height() {
        let Some(value) = values.get(idx) else {
            continue;
        };
        if !seen.iter().any(|existing| existing == value) {
            seen.push(value.to_string());
        }
    }
    Ok(seen)
}

fn column_sum(df: &DataFrame, name: &str) -> Result<f64> {
    Ok(df.column(name)?.f64()?.sum().unwrap_or(0.0))
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name)?.f64()?;
    Ok((0..df.height())
        .map(|idx| column.get(idx).unwrap_or(0.0))
        .collect())
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Mean day-over-day percent change. Steps whose previous value is zero are
/// skipped rather than producing an unbounded ratio.
fn mean_pct_change(values: &[f64]) -> f64 {
    let mut changes = Vec::new();
    for window in values.windows(2) {
        let (prev, curr) = (window[0], window[1]);
        if prev != 0.0 {
            changes.push((curr - prev) / prev * 100.0);
        }
    }
    mean(&changes)
}
