use chrono::Datelike;
use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::metrics::ratio;
use crate::types::{days_to_date, GapPolicy};

/// Collapse the marketing aggregate to one row per date, summing the four
/// base measures across platform, state, and tactic.
pub fn daily_marketing_totals(marketing: &DataFrame) -> Result<DataFrame> {
    let totals = marketing
        .clone()
        .lazy()
        .group_by([col("date")])
        .agg([
            col("impression").sum(),
            col("clicks").sum(),
            col("spend").sum(),
            col("attributed_revenue").sum(),
        ])
        .sort(["date"], SortMultipleOptions::default())
        .collect()?;

    Ok(totals)
}

/// Left-join the daily marketing totals onto the business frame (business
/// side drives: every business date appears exactly once), then attach the
/// blended KPIs and calendar attributes.
///
/// With `GapPolicy::ZeroFill` a business date with no marketing activity
/// carries explicit zeros in the four measures; with `GapPolicy::Absent`
/// those cells stay null and the blended ratios resolve to zero anyway.
pub fn join_business_marketing(
    business: &DataFrame,
    marketing: &DataFrame,
    gaps: GapPolicy,
) -> Result<DataFrame> {
    let daily = daily_marketing_totals(marketing)?;

    let mut joined = business.clone().lazy().join(
        daily.lazy(),
        [col("date")],
        [col("date")],
        JoinArgs::new(JoinType::Left),
    );

    if gaps == GapPolicy::ZeroFill {
        joined = joined.with_columns([
            col("impression").fill_null(lit(0.0)),
            col("clicks").fill_null(lit(0.0)),
            col("spend").fill_null(lit(0.0)),
            col("attributed_revenue").fill_null(lit(0.0)),
        ]);
    }

    let joined = joined
        .sort(["date"], SortMultipleOptions::default())
        .collect()?;

    attach_join_metrics(&joined)
}

/// Blended KPIs plus `day_of_week`, `week` (ISO), and `month`, all derived
/// from `date` alone.
fn attach_join_metrics(df: &DataFrame) -> Result<DataFrame> {
    let len = df.height();

    let impression = df.column("impression")?.f64()?;
    let clicks = df.column("clicks")?.f64()?;
    let spend = df.column("spend")?.f64()?;
    let attributed_revenue = df.column("attributed_revenue")?.f64()?;
    let total_revenue = df.column("total_revenue")?.f64()?;
    let date = df.column("date")?.date()?;

    let mut total_roas = Vec::with_capacity(len);
    let mut marketing_contribution = Vec::with_capacity(len);
    let mut total_ctr = Vec::with_capacity(len);
    let mut day_of_week: Vec<String> = Vec::with_capacity(len);
    let mut week: Vec<u32> = Vec::with_capacity(len);
    let mut month: Vec<u32> = Vec::with_capacity(len);

    for idx in 0..len {
        total_roas.push(ratio(attributed_revenue.get(idx), spend.get(idx), 1.0));
        marketing_contribution.push(ratio(
            attributed_revenue.get(idx),
            total_revenue.get(idx),
            100.0,
        ));
        total_ctr.push(ratio(clicks.get(idx), impression.get(idx), 100.0));

        let days = date.get(idx).ok_or_else(|| {
            PipelineError::Processing("joined table contained a null date".to_string())
        })?;
        let calendar = days_to_date(days).ok_or_else(|| {
            PipelineError::Processing(format!(
                "day offset {days} is outside the supported calendar range"
            ))
        })?;
        day_of_week.push(calendar.format("%A").to_string());
        week.push(calendar.iso_week().week());
        month.push(calendar.month());
    }

    let mut output = df.clone();
    output.hstack_mut(&mut [
        Series::new("total_roas".into(), total_roas).into(),
        Series::new("marketing_contribution".into(), marketing_contribution).into(),
        Series::new("total_ctr".into(), total_ctr).into(),
        Series::new("day_of_week".into(), day_of_week).into(),
        Series::new("week".into(), week).into(),
        Series::new("month".into(), month).into(),
    ])?;

    Ok(output)
}
