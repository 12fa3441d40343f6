//! Deterministic prompt templates. Everything the remote model sees is
//! computed locally first, so a transcript of the statistics is always
//! available for the offline fallback.

use crate::summary::{
    DateRange, PerformanceSummary, PlatformRollup, TacticRollup, TrendSummary,
};

pub fn performance_prompt(
    range: &DateRange,
    summary: &PerformanceSummary,
    platforms: &[PlatformRollup],
) -> String {
    format!(
        "Analyze this marketing data and provide concise insights:\n\n\
         METRICS ({start} to {end}):\n\
         Revenue: ${revenue:.0} | Spend: ${spend:.0} | ROAS: {roas:.2}x | \
         Orders: {orders:.0} | AOV: ${aov:.0}\n\n\
         PLATFORMS:\n{platforms}\n\n\
         Provide:\n\
         1. Executive summary (1-2 sentences)\n\
         2. Top 3 recommendations\n\
         3. Key risks/opportunities\n\
         4. Budget allocation\n\n\
         Keep response under 200 words. Be direct and actionable.",
        start = range.start,
        end = range.end,
        revenue = summary.total_revenue,
        spend = summary.total_spend,
        roas = summary.roas,
        orders = summary.total_orders,
        aov = summary.avg_order_value,
        platforms = platform_block(platforms),
    )
}

pub fn trend_prompt(range: &DateRange, trends: &TrendSummary) -> String {
    let weekday_lines = trends
        .weekdays
        .iter()
        .map(|rollup| {
            format!(
                "{}: revenue ${:.2} | ROAS {:.2}x",
                rollup.day, rollup.mean_revenue, rollup.mean_roas
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze trends and provide concise insights:\n\n\
         TRENDS ({start} to {end}):\n\
         Revenue: {revenue:.1}% daily | Spend: {spend:.1}% daily | ROAS: {roas:.1}% daily\n\
         Best day: {best} | Worst day: {worst}\n\n\
         WEEKLY DATA:\n{weekday_lines}\n\n\
         Provide:\n\
         1. Trend summary (1-2 sentences)\n\
         2. Timing recommendations\n\
         3. Budget optimization\n\
         4. Specific actions\n\n\
         Keep response under 150 words. Be direct.",
        start = range.start,
        end = range.end,
        revenue = trends.revenue_trend_pct,
        spend = trends.spend_trend_pct,
        roas = trends.roas_trend_pct,
        best = trends.best_day,
        worst = trends.worst_day,
    )
}

pub fn platform_prompt(platforms: &[PlatformRollup], tactics: &[TacticRollup]) -> String {
    let tactic_lines = if tactics.is_empty() {
        "(no tactic activity in range)".to_string()
    } else {
        tactics
            .iter()
            .map(|rollup| {
                format!(
                    "{} / {}: ROAS {:.2}x | spend ${:.2}",
                    rollup.platform, rollup.tactic, rollup.mean_roas, rollup.spend
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Analyze platform performance and provide concise recommendations:\n\n\
         PLATFORMS:\n{platforms}\n\n\
         TACTICS:\n{tactic_lines}\n\n\
         Provide:\n\
         1. Platform ranking (top 3)\n\
         2. Budget reallocation (%)\n\
         3. Tactic optimizations\n\
         4. Scaling opportunities\n\
         5. Risk mitigation\n\n\
         Keep response under 200 words. Be specific with numbers.",
        platforms = platform_block(platforms),
    )
}

pub fn question_prompt(
    question: &str,
    range: &DateRange,
    summary: &PerformanceSummary,
    platforms: &[String],
    states: &[String],
    tactics: &[String],
) -> String {
    format!(
        "Answer this marketing question concisely:\n\n\
         QUESTION: {question}\n\n\
         DATA ({start} to {end}):\n\
         Revenue: ${revenue:.0} | Spend: ${spend:.0} | ROAS: {roas:.2}x\n\
         Platforms: {platforms:?}\n\
         States: {states:?}\n\
         Tactics: {tactics:?}\n\n\
         Provide a direct, data-driven answer. Keep it under 100 words.",
        start = range.start,
        end = range.end,
        revenue = summary.total_revenue,
        spend = summary.total_spend,
        roas = summary.roas,
    )
}

fn platform_block(platforms: &[PlatformRollup]) -> String {
    if platforms.is_empty() {
        return "(no platform activity in range)".to_string();
    }
    platforms
        .iter()
        .map(|rollup| {
            format!(
                "{}: spend ${:.2} | revenue ${:.2} | ROAS {:.2}x | CTR {:.2}% | CPC ${:.2}",
                rollup.platform,
                rollup.spend,
                rollup.attributed_revenue,
                rollup.mean_roas,
                rollup.mean_ctr,
                rollup.mean_cpc
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
