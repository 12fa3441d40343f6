use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Facebook,
    Google,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Facebook, Platform::Google, Platform::TikTok];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Google => "Google",
            Platform::TikTok => "TikTok",
        }
    }

    /// Canonical source filename for this platform's spend export.
    pub fn source_filename(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook.csv",
            Platform::Google => "Google.csv",
            Platform::TikTok => "TikTok.csv",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Platform {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "facebook" | "fb" => Ok(Platform::Facebook),
            "google" => Ok(Platform::Google),
            "tiktok" => Ok(Platform::TikTok),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// How a stage treats grain combinations with no observed activity.
///
/// Aggregation keeps never-observed keys absent (no activity is not the same
/// as zero recorded activity); the date-level join fills unmatched business
/// dates with explicit zeros. Each stage names the policy it runs under
/// instead of letting the merge operation imply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapPolicy {
    /// Keys that never occurred in the source stay absent from the output.
    Absent,
    /// Unmatched rows take an explicit `0`, meaning "no activity".
    ZeroFill,
}

impl GapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapPolicy::Absent => "absent",
            GapPolicy::ZeroFill => "zero-fill",
        }
    }
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns that uniquely identify a row of the marketing aggregate.
pub const MARKETING_GRAIN: [&str; 4] = ["date", "platform", "state", "tactic"];

/// Summable measures carried by every marketing row.
pub const MARKETING_MEASURES: [&str; 4] = ["impression", "clicks", "spend", "attributed_revenue"];

/// Numeric columns of the normalized business table.
pub const BUSINESS_MEASURES: [&str; 6] = [
    "num_of_orders",
    "num_of_new_orders",
    "new_customers",
    "total_revenue",
    "gross_profit",
    "COGS",
];

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since the Unix epoch, the physical representation of a `Date` column.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}
