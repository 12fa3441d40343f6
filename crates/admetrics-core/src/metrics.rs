use polars::prelude::*;

/// Round to two decimal places, the precision every derived KPI is reported
/// at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ratio with the uniform zero-denominator policy: an absent or zero
/// denominator (or an absent numerator) resolves to `0.0`, never infinity,
/// NaN, or an error.
pub(crate) fn ratio(numerator: Option<f64>, denominator: Option<f64>, scale: f64) -> f64 {
    match (numerator, denominator) {
        (Some(num), Some(den)) if den != 0.0 => round2(num / den * scale),
        _ => 0.0,
    }
}

/// Attach `ctr`, `cpc`, `roas`, `cpm` to the aggregated marketing frame.
pub fn attach_marketing_metrics(df: &DataFrame) -> Result<DataFrame, PolarsError> {
    let len = df.height();

    let impression = df.column("impression")?.f64()?;
    let clicks = df.column("clicks")?.f64()?;
    let spend = df.column("spend")?.f64()?;
    let attributed_revenue = df.column("attributed_revenue")?.f64()?;

    let mut ctr = Vec::with_capacity(len);
    let mut cpc = Vec::with_capacity(len);
    let mut roas = Vec::with_capacity(len);
    let mut cpm = Vec::with_capacity(len);

    for idx in 0..len {
        ctr.push(ratio(clicks.get(idx), impression.get(idx), 100.0));
        cpc.push(ratio(spend.get(idx), clicks.get(idx), 1.0));
        roas.push(ratio(attributed_revenue.get(idx), spend.get(idx), 1.0));
        cpm.push(ratio(spend.get(idx), impression.get(idx), 1000.0));
    }

    let mut output = df.clone();
    output.hstack_mut(&mut [
        Series::new("ctr".into(), ctr).into(),
        Series::new("cpc".into(), cpc).into(),
        Series::new("roas".into(), roas).into(),
        Series::new("cpm".into(), cpm).into(),
    ])?;

    Ok(output)
}

/// Attach `avg_order_value`, `customer_acquisition_cost`, `gross_margin`,
/// and `new_customer_rate` to the normalized business frame.
pub fn attach_business_metrics(df: &DataFrame) -> Result<DataFrame, PolarsError> {
    let len = df.height();

    let num_of_orders = df.column("num_of_orders")?.f64()?;
    let new_customers = df.column("new_customers")?.f64()?;
    let total_revenue = df.column("total_revenue")?.f64()?;
    let gross_profit = df.column("gross_profit")?.f64()?;

    let mut avg_order_value = Vec::with_capacity(len);
    let mut gross_margin = Vec::with_capacity(len);
    let mut new_customer_rate = Vec::with_capacity(len);

    for idx in 0..len {
        avg_order_value.push(ratio(total_revenue.get(idx), num_of_orders.get(idx), 1.0));
        gross_margin.push(ratio(gross_profit.get(idx), total_revenue.get(idx), 100.0));
        new_customer_rate.push(ratio(new_customers.get(idx), num_of_orders.get(idx), 100.0));
    }

    // Placeholder until a cost-attribution source exists; readers must not
    // treat this column as computed.
    let customer_acquisition_cost = vec![0.0f64; len];

    let mut output = df.clone();
    output.hstack_mut(&mut [
        Series::new("avg_order_value".into(), avg_order_value).into(),
        Series::new("customer_acquisition_cost".into(), customer_acquisition_cost).into(),
        Series::new("gross_margin".into(), gross_margin).into(),
        Series::new("new_customer_rate".into(), new_customer_rate).into(),
    ])?;

    Ok(output)
}
