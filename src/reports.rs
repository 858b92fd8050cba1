//! Aggregation engine: pure views over a client record collection.
//!
//! Every function recomputes from the raw slice it is given. Nothing here
//! reads the clock, touches the filesystem or keeps state between calls;
//! time-dependent views take `now` explicitly.

use crate::types::{
    ClientRecord, ClientStatus, DashboardSnapshot, DistributionSlice, DistributionView,
    FunnelStageRow, GrowthPoint, KpiSummary, OriginPerformanceRow, StateCount,
};
use crate::util::{
    midnight_utc, month_label, month_start_back, next_month_boundary, rate_pct, safe_ratio,
    share_pct,
};
use chrono::{DateTime, Datelike, Utc};
use log::debug;
use std::collections::HashMap;

/// Display colors, in the order funnel stages and groups pick them up.
pub const PALETTE: [&str; 8] = [
    "#3b82f6", "#8b5cf6", "#f59e0b", "#10b981", "#ef4444", "#06b6d4", "#ec4899", "#84cc16",
];

/// Funnel stages, top to bottom. A stage counts records whose status label
/// is exactly the stage label; `Delinquent` and unknown labels fall through.
///
/// `In Negotiation` and `Proposal Sent` share their labels with real
/// `ClientStatus` variants on purpose, so records that carry them are
/// counted; sources that never emit them simply report 0 for those stages.
pub const FUNNEL_STAGES: [&str; 5] = [
    "Lead",
    "In Negotiation",
    "Proposal Sent",
    "Subscriber",
    "Cancelled",
];

pub const GROWTH_MONTHS: u32 = 6;
pub const TOP_STATES: usize = 10;

fn palette_color(idx: usize) -> String {
    PALETTE[idx % PALETTE.len()].to_string()
}

/// Accumulate `(key, value)` pairs into groups, keeping the order in which
/// each key was first seen.
fn group_in_order<'a, I>(pairs: I) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(String, f64)> = Vec::new();
    for (key, value) in pairs {
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), 0.0));
            groups.len() - 1
        });
        groups[slot].1 += value;
    }
    groups
}

fn distribution(groups: Vec<(String, f64)>) -> DistributionView {
    // `Iterator::sum` over no floats yields -0.0; start from +0.0 instead.
    let total = groups.iter().fold(0.0, |acc, (_, v)| acc + v);
    let slices = groups
        .into_iter()
        .enumerate()
        .map(|(idx, (name, value))| DistributionSlice {
            name,
            value,
            percentage: share_pct(value, total),
            color: palette_color(idx),
        })
        .collect();
    DistributionView { slices, total }
}

fn count_status(data: &[ClientRecord], status: &ClientStatus) -> usize {
    data.iter().filter(|r| r.status.is(status)).count()
}

/// Records created strictly before `boundary`.
fn count_before(data: &[ClientRecord], boundary: DateTime<Utc>) -> usize {
    data.iter().filter(|r| r.created_at < boundary).count()
}

pub fn sales_funnel(data: &[ClientRecord]) -> Vec<FunnelStageRow> {
    let total = data.len() as f64;
    FUNNEL_STAGES
        .iter()
        .enumerate()
        .map(|(idx, stage)| {
            let count = data.iter().filter(|r| r.status.label() == *stage).count();
            FunnelStageRow {
                stage: stage.to_string(),
                count,
                percentage: share_pct(count as f64, total),
                color: palette_color(idx),
            }
        })
        .collect()
}

/// Revenue per plan over subscribers that carry a plan value.
pub fn revenue_by_plan(data: &[ClientRecord]) -> DistributionView {
    let groups = group_in_order(
        data.iter()
            .filter(|r| r.is_subscriber())
            .filter_map(|r| r.plan_value.map(|v| (r.plan_key(), v))),
    );
    debug!("revenue_by_plan: {} plan groups", groups.len());
    distribution(groups)
}

/// Client count per acquisition origin, across every status.
pub fn traffic_sources(data: &[ClientRecord]) -> DistributionView {
    let groups = group_in_order(data.iter().map(|r| (r.origin_key(), 1.0)));
    debug!("traffic_sources: {} origin groups", groups.len());
    distribution(groups)
}

/// Six calendar-month buckets, oldest first, ending with the month of `now`.
pub fn growth_timeline(data: &[ClientRecord], now: DateTime<Utc>) -> Vec<GrowthPoint> {
    (0..GROWTH_MONTHS)
        .rev()
        .map(|back| {
            let start = month_start_back(now, back);
            let lower = midnight_utc(start);
            let upper = next_month_boundary(start);
            GrowthPoint {
                month_label: month_label(start),
                year: start.year(),
                month: start.month(),
                total_clients: count_before(data, upper),
                new_clients: data
                    .iter()
                    .filter(|r| r.created_at >= lower && r.created_at < upper)
                    .count(),
            }
        })
        .collect()
}

/// Headline KPIs.
///
/// `conversion_rate` is a snapshot ratio of current subscribers to current
/// leads, not a cohort conversion rate, and can exceed 100.
pub fn kpi_summary(data: &[ClientRecord], now: DateTime<Utc>) -> KpiSummary {
    let subscribers = count_status(data, &ClientStatus::Subscriber) as f64;
    let leads = count_status(data, &ClientStatus::Lead) as f64;
    let cancelled = count_status(data, &ClientStatus::Cancelled) as f64;

    let total_revenue: f64 = data
        .iter()
        .filter(|r| r.is_subscriber())
        .filter_map(|r| r.plan_value)
        .fold(0.0, |acc, v| acc + v);

    // Cumulative counts as of the end of last month and the month before.
    let last_month_end = midnight_utc(month_start_back(now, 0));
    let prior_month_end = midnight_utc(month_start_back(now, 1));
    let last = count_before(data, last_month_end) as f64;
    let prior = count_before(data, prior_month_end) as f64;

    KpiSummary {
        total_revenue,
        average_ticket: safe_ratio(total_revenue, subscribers),
        conversion_rate: rate_pct(subscribers, leads),
        churn_rate: rate_pct(cancelled, subscribers + cancelled),
        monthly_growth: rate_pct(last - prior, prior),
    }
}

/// Top states by client count. Ties keep first-seen order.
pub fn state_distribution(data: &[ClientRecord]) -> Vec<StateCount> {
    let mut rows: Vec<StateCount> = group_in_order(data.iter().map(|r| (r.state_key(), 1.0)))
        .into_iter()
        .map(|(state, count)| StateCount {
            state,
            count: count as usize,
        })
        .collect();
    // `sort_by` is stable.
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows.truncate(TOP_STATES);
    rows
}

pub fn origin_performance(data: &[ClientRecord]) -> Vec<OriginPerformanceRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<OriginPerformanceRow> = Vec::new();
    for r in data {
        let origin = r.origin_key();
        let slot = *index.entry(origin).or_insert_with(|| {
            rows.push(OriginPerformanceRow {
                origin: origin.to_string(),
                leads: 0,
                conversions: 0,
                conversion_rate: 0.0,
            });
            rows.len() - 1
        });
        let row = &mut rows[slot];
        row.leads += 1;
        if r.is_subscriber() {
            row.conversions += 1;
        }
    }
    for row in &mut rows {
        row.conversion_rate = rate_pct(row.conversions as f64, row.leads as f64);
    }
    rows
}

/// Every view over the same collection, bundled for export.
pub fn build_dashboard(data: &[ClientRecord], now: DateTime<Utc>) -> DashboardSnapshot {
    DashboardSnapshot {
        generated_at: now,
        total_records: data.len(),
        kpis: kpi_summary(data, now),
        funnel: sales_funnel(data),
        revenue_by_plan: revenue_by_plan(data),
        traffic_sources: traffic_sources(data),
        growth: growth_timeline(data, now),
        states: state_distribution(data),
        origins: origin_performance(data),
    }
}
