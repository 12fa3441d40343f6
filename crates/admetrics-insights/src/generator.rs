use polars::prelude::DataFrame;
use tracing::warn;

use admetrics_core::types::Platform;

use crate::client::{GeminiClient, TextModel};
use crate::error::Result;
use crate::prompt;
use crate::summary::{self, DateRange, PerformanceSummary, TrendSummary};

/// Narrates the pipeline's output tables. With a configured remote model the
/// prose comes from the model; without one, or whenever the remote call
/// fails, every entry point degrades to a deterministic statistic-only
/// summary. Callers always get a non-empty string.
pub struct InsightsGenerator {
    model: Option<Box<dyn TextModel>>,
}

impl InsightsGenerator {
    pub fn new(model: Option<Box<dyn TextModel>>) -> Self {
        Self { model }
    }

    /// Environment-configured generator: remote-backed when credentials are
    /// present, offline otherwise.
    pub fn from_env() -> Self {
        match GeminiClient::from_env() {
            Ok(client) => Self::new(Some(Box::new(client))),
            Err(err) => {
                warn!(error = %err, "remote text model unavailable, using local summaries");
                Self::new(None)
            }
        }
    }

    pub fn performance_summary(
        &self,
        joined: &DataFrame,
        marketing: &DataFrame,
        range: DateRange,
    ) -> Result<String> {
        let joined = summary::filter_by_date(joined, range)?;
        let marketing = summary::filter_by_date(marketing, range)?;

        let stats = summary::performance_summary(&joined)?;
        let rollups = summary::platform_rollups(&marketing)?;
        let prompt = prompt::performance_prompt(&range, &stats, &rollups);

        Ok(self
            .ask(&prompt)
            .unwrap_or_else(|| fallback_performance(&range, &stats)))
    }

    pub fn trend_analysis(&self, joined: &DataFrame, range: DateRange) -> Result<String> {
        let joined = summary::filter_by_date(joined, range)?;
        let trends = summary::trend_summary(&joined)?;
        let prompt = prompt::trend_prompt(&range, &trends);

        Ok(self
            .ask(&prompt)
            .unwrap_or_else(|| fallback_trends(&range, &trends)))
    }

    pub fn platform_recommendations(
        &self,
        marketing: &DataFrame,
        range: DateRange,
        platforms: &[Platform],
    ) -> Result<String> {
        let marketing = summary::filter_by_date(marketing, range)?;
        let marketing = summary::filter_platforms(&marketing, platforms)?;

        let rollups = summary::platform_rollups(&marketing)?;
        let tactics = summary::tactic_rollups(&marketing)?;
        let prompt = prompt::platform_prompt(&rollups, &tactics);

        Ok(self.ask(&prompt).unwrap_or_else(|| {
            let lines = rollups
                .iter()
                .map(|rollup| {
                    format!(
                        "{}: spend ${:.2} | revenue ${:.2} | ROAS {:.2}x",
                        rollup.platform, rollup.spend, rollup.attributed_revenue, rollup.mean_roas
                    )
                })
                .collect::<Vec<_>>();
            if lines.is_empty() {
                format!(
                    "Platform performance ({} to {})\nNo platform activity in range.",
                    range.start, range.end
                )
            } else {
                format!(
                    "Platform performance ({} to {})\n{}",
                    range.start,
                    range.end,
                    lines.join("\n")
                )
            }
        }))
    }

    pub fn answer_question(
        &self,
        question: &str,
        joined: &DataFrame,
        marketing: &DataFrame,
        range: DateRange,
    ) -> Result<String> {
        let joined = summary::filter_by_date(joined, range)?;
        let marketing = summary::filter_by_date(marketing, range)?;

        let stats = summary::performance_summary(&joined)?;
        let platforms = summary::distinct_values(&marketing, "platform")?;
        let states = summary::distinct_values(&marketing, "state")?;
        let tactics = summary::distinct_values(&marketing, "tactic")?;
        let prompt =
            prompt::question_prompt(question, &range, &stats, &platforms, &states, &tactics);

        Ok(self.ask(&prompt).unwrap_or_else(|| {
            format!(
                "{}\n\nAsked: {question}\nA remote model is required for free-text answers; \
                 the numbers above cover the same window.",
                fallback_performance(&range, &stats)
            )
        }))
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        let model = self.model.as_ref()?;
        match model.generate(prompt) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(model = model.name(), error = %err, "remote generation failed, falling back to local summary");
                None
            }
        }
    }
}

/// Statistic-only summary with no remote dependency.
pub fn fallback_performance(range: &DateRange, stats: &PerformanceSummary) -> String {
    let efficiency = if stats.roas > 2.5 {
        "Strong"
    } else if stats.roas > 2.0 {
        "Moderate"
    } else {
        "Needs improvement"
    };

    format!(
        "Performance summary ({start} to {end})\n\
         Revenue: ${revenue:.0} | Spend: ${spend:.0} | ROAS: {roas:.2}x | \
         Orders: {orders:.0} | AOV: ${aov:.0}\n\
         Efficiency: {efficiency}",
        start = range.start,
        end = range.end,
        revenue = stats.total_revenue,
        spend = stats.total_spend,
        roas = stats.roas,
        orders = stats.total_orders,
        aov = stats.avg_order_value,
    )
}

fn fallback_trends(range: &DateRange, trends: &TrendSummary) -> String {
    format!(
        "Trend summary ({start} to {end})\n\
         Revenue: {revenue:.1}% daily | Spend: {spend:.1}% daily | ROAS: {roas:.1}% daily\n\
         Best day: {best} | Worst day: {worst}",
        start = range.start,
        end = range.end,
        revenue = trends.revenue_trend_pct,
        spend = trends.spend_trend_pct,
        roas = trends.roas_trend_pct,
        best = trends.best_day,
        worst = trends.worst_day,
    )
}
