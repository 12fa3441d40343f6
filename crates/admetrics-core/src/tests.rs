use polars::prelude::*;

use crate::aggregation::aggregate_marketing;
use crate::error::PipelineError;
use crate::ingestion::{read_business_table, read_platform_table};
use crate::join::join_business_marketing;
use crate::metrics::{attach_business_metrics, attach_marketing_metrics};
use crate::outputs::create_csv_bytes;
use crate::pipeline::{run, RawSources};
use crate::types::{GapPolicy, Platform};

const FACEBOOK_CSV: &str = "\
date,state,tactic,impression,clicks,spend,attributed revenue
2024-01-01,CA,search,1000,50,100,300
";

const GOOGLE_CSV: &str = "\
date,state,tactic,impression,clicks,spend,attributed revenue
2024-01-01,CA,search,500,20,50,100
";

const EMPTY_PLATFORM_CSV: &str = "date,state,tactic,impression,clicks,spend,attributed revenue\n";

const BUSINESS_CSV: &str = "\
date,# of orders,# of new orders,new_customers,total_revenue,gross_profit,COGS
2024-01-01,10,4,3,1000,400,600
2024-01-02,10,4,3,1000,400,600
";

fn sources() -> RawSources {
    RawSources {
        facebook: FACEBOOK_CSV.to_string(),
        google: GOOGLE_CSV.to_string(),
        tiktok: EMPTY_PLATFORM_CSV.to_string(),
        business: BUSINESS_CSV.to_string(),
    }
}

fn f64_value(df: &DataFrame, column: &str, idx: usize) -> f64 {
    df.column(column)
        .expect("missing column")
        .f64()
        .expect("column is not f64")
        .get(idx)
        .expect("unexpected null value")
}

fn str_value(df: &DataFrame, column: &str, idx: usize) -> String {
    df.column(column)
        .expect("missing column")
        .str()
        .expect("column is not utf8")
        .get(idx)
        .expect("unexpected null value")
        .to_string()
}

#[test]
fn platform_table_normalizes_headers_and_tags_platform() {
    let df = read_platform_table(FACEBOOK_CSV, Platform::Facebook).expect("ingestion failed");

    assert_eq!(df.height(), 1);
    assert!(df.column("attributed_revenue").is_ok());
    assert!(df.column("attributed revenue").is_err());
    assert_eq!(str_value(&df, "platform", 0), "Facebook");
    assert_eq!(f64_value(&df, "spend", 0), 100.0);
}

#[test]
fn unparseable_numeric_becomes_absent() {
    let content = "\
date,state,tactic,impression,clicks,spend,attributed revenue
2024-01-01,CA,search,1000,50,oops,300
";
    let df = read_platform_table(content, Platform::Google).expect("ingestion failed");

    let spend = df.column("spend").unwrap().f64().unwrap();
    assert_eq!(spend.get(0), None);
    assert_eq!(f64_value(&df, "clicks", 0), 50.0);
}

#[test]
fn malformed_date_fails_ingestion() {
    let content = "\
date,state,tactic,impression,clicks,spend,attributed revenue
2024-01-01,CA,search,1,1,1,1
not-a-date,CA,search,1,1,1,1
";
    let err = read_platform_table(content, Platform::TikTok).expect_err("expected failure");

    match err {
        PipelineError::MalformedDate {
            file,
            line_index,
            value,
        } => {
            assert_eq!(file, "TikTok.csv");
            assert_eq!(line_index, 3);
            assert_eq!(value, "not-a-date");
        }
        other => panic!("expected MalformedDate, got {other}"),
    }
}

#[test]
fn business_header_remap_reads_hash_columns() {
    let df = read_business_table(BUSINESS_CSV).expect("ingestion failed");

    assert_eq!(df.height(), 2);
    assert_eq!(f64_value(&df, "num_of_orders", 0), 10.0);
    assert_eq!(f64_value(&df, "num_of_new_orders", 0), 4.0);
    assert_eq!(f64_value(&df, "COGS", 0), 600.0);
}

#[test]
fn duplicate_business_dates_are_rejected() {
    let content = "\
date,# of orders,# of new orders,new_customers,total_revenue,gross_profit,COGS
2024-01-01,1,1,1,1,1,1
2024-01-01,2,2,2,2,2,2
";
    let err = read_business_table(content).expect_err("expected failure");
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[test]
fn missing_required_column_is_rejected() {
    let content = "date,state,impression,clicks,spend,attributed revenue\n";
    let err = read_platform_table(content, Platform::Facebook).expect_err("expected failure");
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[test]
fn aggregation_merges_rows_with_identical_keys() {
    let content = "\
date,state,tactic,impression,clicks,spend,attributed revenue
2024-01-01,CA,search,1000,50,100,300
2024-01-01,CA,search,500,10,20,60
";
    let df = read_platform_table(content, Platform::Facebook).expect("ingestion failed");
    let aggregated = aggregate_marketing(&[df], GapPolicy::Absent).expect("aggregation failed");

    assert_eq!(aggregated.height(), 1);
    assert_eq!(f64_value(&aggregated, "impression", 0), 1500.0);
    assert_eq!(f64_value(&aggregated, "clicks", 0), 60.0);
    assert_eq!(f64_value(&aggregated, "spend", 0), 120.0);
    assert_eq!(f64_value(&aggregated, "attributed_revenue", 0), 360.0);
}

#[test]
fn aggregation_keeps_platforms_distinct_on_shared_grain() {
    let facebook = read_platform_table(FACEBOOK_CSV, Platform::Facebook).unwrap();
    let google = read_platform_table(GOOGLE_CSV, Platform::Google).unwrap();
    let aggregated =
        aggregate_marketing(&[facebook, google], GapPolicy::Absent).expect("aggregation failed");

    assert_eq!(aggregated.height(), 2);
    assert_eq!(str_value(&aggregated, "platform", 0), "Facebook");
    assert_eq!(str_value(&aggregated, "platform", 1), "Google");
}

#[test]
fn aggregation_is_platform_order_independent() {
    let facebook = read_platform_table(FACEBOOK_CSV, Platform::Facebook).unwrap();
    let google = read_platform_table(GOOGLE_CSV, Platform::Google).unwrap();

    let forward =
        aggregate_marketing(&[facebook.clone(), google.clone()], GapPolicy::Absent).unwrap();
    let reversed = aggregate_marketing(&[google, facebook], GapPolicy::Absent).unwrap();

    assert_eq!(
        create_csv_bytes(&forward).unwrap(),
        create_csv_bytes(&reversed).unwrap()
    );
}

#[test]
fn aggregation_rejects_zero_fill_policy() {
    let facebook = read_platform_table(FACEBOOK_CSV, Platform::Facebook).unwrap();
    let err =
        aggregate_marketing(&[facebook], GapPolicy::ZeroFill).expect_err("expected failure");
    assert!(matches!(err, PipelineError::Processing(_)));
}

#[test]
fn marketing_metrics_match_documented_ratios() {
    let facebook = read_platform_table(FACEBOOK_CSV, Platform::Facebook).unwrap();
    let google = read_platform_table(GOOGLE_CSV, Platform::Google).unwrap();
    let aggregated = aggregate_marketing(&[facebook, google], GapPolicy::Absent).unwrap();
    let marketing = attach_marketing_metrics(&aggregated).expect("metrics failed");

    // Facebook: 1000 impressions, 50 clicks, 100 spend, 300 attributed.
    assert_eq!(f64_value(&marketing, "ctr", 0), 5.0);
    assert_eq!(f64_value(&marketing, "cpc", 0), 2.0);
    assert_eq!(f64_value(&marketing, "roas", 0), 3.0);
    assert_eq!(f64_value(&marketing, "cpm", 0), 100.0);

    // Google: 500 impressions, 20 clicks, 50 spend, 100 attributed.
    assert_eq!(f64_value(&marketing, "roas", 1), 2.0);
}

#[test]
fn zero_denominators_resolve_to_zero_not_an_error() {
    let content = "\
date,state,tactic,impression,clicks,spend,attributed revenue
2024-01-01,CA,display,0,0,0,50
";
    let df = read_platform_table(content, Platform::Facebook).unwrap();
    let aggregated = aggregate_marketing(&[df], GapPolicy::Absent).unwrap();
    let marketing = attach_marketing_metrics(&aggregated).expect("metrics failed");

    assert_eq!(f64_value(&marketing, "ctr", 0), 0.0);
    assert_eq!(f64_value(&marketing, "cpc", 0), 0.0);
    assert_eq!(f64_value(&marketing, "roas", 0), 0.0);
    assert_eq!(f64_value(&marketing, "cpm", 0), 0.0);
}

#[test]
fn business_with_zero_orders_yields_zero_average_order_value() {
    let content = "\
date,# of orders,# of new orders,new_customers,total_revenue,gross_profit,COGS
2024-01-01,0,0,0,0,0,0
";
    let df = read_business_table(content).unwrap();
    let business = attach_business_metrics(&df).expect("metrics failed");

    assert_eq!(f64_value(&business, "avg_order_value", 0), 0.0);
    assert_eq!(f64_value(&business, "gross_margin", 0), 0.0);
    assert_eq!(f64_value(&business, "new_customer_rate", 0), 0.0);
    assert_eq!(f64_value(&business, "customer_acquisition_cost", 0), 0.0);
}

#[test]
fn join_zero_fills_business_only_dates() {
    let output = run(&sources()).expect("pipeline failed");
    let joined = &output.joined;

    // 2024-01-02 has business results but no marketing activity.
    assert_eq!(f64_value(joined, "spend", 1), 0.0);
    assert_eq!(f64_value(joined, "attributed_revenue", 1), 0.0);
    assert_eq!(f64_value(joined, "total_roas", 1), 0.0);
    assert_eq!(f64_value(joined, "marketing_contribution", 1), 0.0);
    assert_eq!(f64_value(joined, "avg_order_value", 1), 100.0);
}

#[test]
fn joined_totals_combine_platforms_at_date_grain() {
    let output = run(&sources()).expect("pipeline failed");
    let joined = &output.joined;

    assert_eq!(f64_value(joined, "spend", 0), 150.0);
    assert_eq!(f64_value(joined, "attributed_revenue", 0), 400.0);
    assert_eq!(f64_value(joined, "total_roas", 0), 2.67);
    assert_eq!(f64_value(joined, "marketing_contribution", 0), 40.0);
}

#[test]
fn join_attaches_calendar_attributes() {
    let output = run(&sources()).expect("pipeline failed");
    let joined = &output.joined;

    // 2024-01-01 was a Monday in ISO week 1.
    assert_eq!(str_value(joined, "day_of_week", 0), "Monday");
    let week = joined.column("week").unwrap().u32().unwrap();
    assert_eq!(week.get(0), Some(1));
    let month = joined.column("month").unwrap().u32().unwrap();
    assert_eq!(month.get(0), Some(1));
}

#[test]
fn join_with_absent_policy_leaves_gaps_null() {
    let facebook = read_platform_table(FACEBOOK_CSV, Platform::Facebook).unwrap();
    let aggregated = aggregate_marketing(&[facebook], GapPolicy::Absent).unwrap();
    let marketing = attach_marketing_metrics(&aggregated).unwrap();
    let business = attach_business_metrics(&read_business_table(BUSINESS_CSV).unwrap()).unwrap();

    let joined = join_business_marketing(&business, &marketing, GapPolicy::Absent)
        .expect("join failed");

    // 2024-01-02 has no marketing activity: the measure stays null under
    // Absent, while the blended ratios still resolve to the zero sentinel.
    let spend = joined.column("spend").unwrap().f64().unwrap();
    assert_eq!(spend.get(1), None);
    assert_eq!(f64_value(&joined, "total_roas", 1), 0.0);
}

#[test]
fn joined_has_one_row_per_business_date() {
    let output = run(&sources()).expect("pipeline failed");
    assert_eq!(output.joined.height(), 2);
    assert_eq!(output.summary.joined_rows, 2);
    assert_eq!(output.summary.business_rows, 2);
}

#[test]
fn pipeline_is_idempotent_for_identical_sources() {
    let first = run(&sources()).expect("pipeline failed");
    let second = run(&sources()).expect("pipeline failed");

    assert_eq!(
        create_csv_bytes(&first.joined).unwrap(),
        create_csv_bytes(&second.joined).unwrap()
    );
    assert_eq!(
        create_csv_bytes(&first.marketing).unwrap(),
        create_csv_bytes(&second.marketing).unwrap()
    );
}
