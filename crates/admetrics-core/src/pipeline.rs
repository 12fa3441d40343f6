// crates/admetrics-core/src/pipeline.rs

use std::fs;
use std::path::Path;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::aggregation::aggregate_marketing;
use crate::error::Result;
use crate::ingestion::{read_business_table, read_platform_table};
use crate::join::join_business_marketing;
use crate::metrics::{attach_business_metrics, attach_marketing_metrics};
use crate::types::{GapPolicy, Platform};

pub const BUSINESS_SOURCE_FILENAME: &str = "business.csv";

/// Raw file contents for one pipeline run, read once up front. Every stage
/// after this is a deterministic function of these four strings.
#[derive(Debug, Clone)]
pub struct RawSources {
    pub facebook: String,
    pub google: String,
    pub tiktok: String,
    pub business: String,
}

impl RawSources {
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            facebook: fs::read_to_string(dir.join(Platform::Facebook.source_filename()))?,
            google: fs::read_to_string(dir.join(Platform::Google.source_filename()))?,
            tiktok: fs::read_to_string(dir.join(Platform::TikTok.source_filename()))?,
            business: fs::read_to_string(dir.join(BUSINESS_SOURCE_FILENAME))?,
        })
    }

    fn platform_content(&self, platform: Platform) -> &str {
        match platform {
            Platform::Facebook => &self.facebook,
            Platform::Google => &self.google,
            Platform::TikTok => &self.tiktok,
        }
    }
}

/// Row cardinalities observed during one run, for the run log.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunSummary {
    pub raw_platform_rows: usize,
    pub aggregated_rows: usize,
    pub business_rows: usize,
    pub joined_rows: usize,
}

pub struct PipelineOutput {
    /// Marketing aggregate at `(date, platform, state, tactic)` grain with
    /// derived KPIs.
    pub marketing: DataFrame,
    /// Business table joined with daily marketing totals, one row per
    /// business date.
    pub joined: DataFrame,
    pub summary: PipelineRunSummary,
}

/// Run the four transformation stages in order:
/// ingestion → aggregation → derived metrics → join.
pub fn run(sources: &RawSources) -> Result<PipelineOutput> {
    let mut platform_frames = Vec::with_capacity(Platform::ALL.len());
    let mut raw_platform_rows = 0;
    for platform in Platform::ALL {
        let frame = read_platform_table(sources.platform_content(platform), platform)?;
        info!(
            platform = platform.as_str(),
            rows = frame.height(),
            "normalized platform table"
        );
        raw_platform_rows += frame.height();
        platform_frames.push(frame);
    }

    let business = read_business_table(&sources.business)?;
    info!(rows = business.height(), "normalized business table");

    let aggregated = aggregate_marketing(&platform_frames, GapPolicy::Absent)?;
    info!(rows = aggregated.height(), "aggregated marketing table");

    let marketing = attach_marketing_metrics(&aggregated)?;
    let business = attach_business_metrics(&business)?;

    let joined = join_business_marketing(&business, &marketing, GapPolicy::ZeroFill)?;
    info!(rows = joined.height(), "joined business and marketing tables");

    let summary = PipelineRunSummary {
        raw_platform_rows,
        aggregated_rows: marketing.height(),
        business_rows: business.height(),
        joined_rows: joined.height(),
    };

    Ok(PipelineOutput {
        marketing,
        joined,
        summary,
    })
}
