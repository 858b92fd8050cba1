// Built-in demonstration records.
//
// The set is generated deterministically from `now` so the dashboard always
// has recent activity to show, and so tests can pin it.
use crate::types::{ClientRecord, ClientStatus};
use chrono::{DateTime, Duration, Utc};

const SAMPLE_SIZE: usize = 48;

const ORIGINS: [Option<&str>; 5] = [
    Some("Paid Traffic"),
    Some("Referral"),
    Some("Organic"),
    Some("Partner Education"),
    None,
];

const PLANS: [(&str, f64); 3] = [("Basic", 497.0), ("Professional", 997.0), ("Premium", 1997.0)];

const STATES: [Option<&str>; 7] = [
    Some("SP"),
    Some("RJ"),
    Some("MG"),
    Some("PR"),
    Some("SC"),
    Some("BA"),
    None,
];

fn status_for(i: usize) -> ClientStatus {
    match i % 8 {
        0 | 3 | 5 => ClientStatus::Subscriber,
        1 | 6 => ClientStatus::Lead,
        2 => ClientStatus::InNegotiation,
        4 => ClientStatus::Cancelled,
        _ => ClientStatus::Delinquent,
    }
}

/// Sample clients created over the roughly 240 days before `now`, newest
/// last. Every record is created no later than `now`.
pub fn sample_records(now: DateTime<Utc>) -> Vec<ClientRecord> {
    (0..SAMPLE_SIZE)
        .map(|i| {
            let age_days = ((SAMPLE_SIZE - i) * 5) as i64;
            let created_at = now - Duration::days(age_days) - Duration::hours((i % 9) as i64);
            let status = status_for(i);
            let mut record =
                ClientRecord::new(format!("sample-{:03}", i + 1), status.clone(), created_at);
            record.origin = ORIGINS[i % ORIGINS.len()].map(str::to_string);
            record.state = STATES[(i * 3) % STATES.len()].map(str::to_string);
            if matches!(
                status,
                ClientStatus::Subscriber | ClientStatus::Delinquent | ClientStatus::Cancelled
            ) {
                let (plan, value) = PLANS[i % PLANS.len()];
                record = record.with_plan(plan, value);
            }
            record
        })
        .collect()
}
