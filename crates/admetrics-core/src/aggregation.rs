use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::types::{GapPolicy, MARKETING_GRAIN};

/// Union the normalized platform frames and re-aggregate to the canonical
/// grain `(date, platform, state, tactic)`, summing the four measures.
///
/// Only `GapPolicy::Absent` is valid here: a grain combination that never
/// occurred in any source stays out of the output, and callers that need
/// zeros must ask for them at the join stage. The output is sorted by the
/// full grain so identical inputs serialize identically regardless of the
/// order the platform frames arrive in.
pub fn aggregate_marketing(frames: &[DataFrame], gaps: GapPolicy) -> Result<DataFrame> {
    if frames.is_empty() {
        return Err(PipelineError::Processing(
            "no platform tables to aggregate".to_string(),
        ));
    }
    if gaps == GapPolicy::ZeroFill {
        return Err(PipelineError::Processing(
            "the aggregation stage does not zero-fill unobserved grain combinations; \
             request zero-fill at the join stage instead"
                .to_string(),
        ));
    }

    let lazyframes: Vec<LazyFrame> = frames.iter().map(|df| df.clone().lazy()).collect();
    let unified = concat(&lazyframes, UnionArgs::default())?;

    let aggregated = unified
        .group_by([col("date"), col("platform"), col("state"), col("tactic")])
        .agg([
            col("impression").sum(),
            col("clicks").sum(),
            col("spend").sum(),
            col("attributed_revenue").sum(),
        ])
        .sort(MARKETING_GRAIN, SortMultipleOptions::default())
        .collect()?;

    Ok(aggregated)
}
