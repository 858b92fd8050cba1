use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Grouping key used when an optional categorical field is missing.
pub const UNSPECIFIED: &str = "Unspecified";

/// One row of the client export as it appears on disk. Every column is kept
/// as text so the loader can decide what counts as a bad row.
#[derive(Debug, Deserialize)]
pub struct RawClientRow {
    pub id: Option<String>,
    pub status: Option<String>,
    pub origin: Option<String>,
    pub plan: Option<String>,
    pub plan_value: Option<String>,
    pub state: Option<String>,
    pub created_at: Option<String>,
}

/// Pipeline status of a client.
///
/// Labels outside the known set are kept verbatim in `Other` so that a
/// record with an unexpected status still counts towards totals without
/// landing in any status bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Lead,
    InNegotiation,
    ProposalSent,
    Subscriber,
    Delinquent,
    Cancelled,
    Other(String),
}

impl ClientStatus {
    const KNOWN: [ClientStatus; 6] = [
        ClientStatus::Lead,
        ClientStatus::InNegotiation,
        ClientStatus::ProposalSent,
        ClientStatus::Subscriber,
        ClientStatus::Delinquent,
        ClientStatus::Cancelled,
    ];

    /// Display label, which is also what funnel stages match against.
    pub fn label(&self) -> &str {
        match self {
            ClientStatus::Lead => "Lead",
            ClientStatus::InNegotiation => "In Negotiation",
            ClientStatus::ProposalSent => "Proposal Sent",
            ClientStatus::Subscriber => "Subscriber",
            ClientStatus::Delinquent => "Delinquent",
            ClientStatus::Cancelled => "Cancelled",
            ClientStatus::Other(label) => label,
        }
    }

    /// Whether two statuses name the same bucket. Compares labels, the same
    /// way funnel stages do, so a hand-built `Other("Lead")` counts as a
    /// lead everywhere.
    pub fn is(&self, other: &ClientStatus) -> bool {
        self.label() == other.label()
    }

    fn key(&self) -> Option<&'static str> {
        match self {
            ClientStatus::Lead => Some("lead"),
            ClientStatus::InNegotiation => Some("in_negotiation"),
            ClientStatus::ProposalSent => Some("proposal_sent"),
            ClientStatus::Subscriber => Some("subscriber"),
            ClientStatus::Delinquent => Some("delinquent"),
            ClientStatus::Cancelled => Some("cancelled"),
            ClientStatus::Other(_) => None,
        }
    }

    /// Parse a status cell. Matching is exact against either the display
    /// label (`Proposal Sent`) or the snake_case key (`proposal_sent`).
    pub fn from_label(s: &str) -> ClientStatus {
        let s = s.trim();
        Self::KNOWN
            .iter()
            .find(|status| status.label() == s || status.key() == Some(s))
            .cloned()
            .unwrap_or_else(|| ClientStatus::Other(s.to_string()))
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRecord {
    pub id: String,
    pub status: ClientStatus,
    pub origin: Option<String>,
    pub plan: Option<String>,
    pub plan_value: Option<f64>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClientRecord {
    pub fn new(id: impl Into<String>, status: ClientStatus, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status,
            origin: None,
            plan: None,
            plan_value: None,
            state: None,
            created_at,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_plan(mut self, plan: impl Into<String>, value: f64) -> Self {
        self.plan = Some(plan.into());
        self.plan_value = Some(value);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn origin_key(&self) -> &str {
        self.origin.as_deref().unwrap_or(UNSPECIFIED)
    }

    pub fn plan_key(&self) -> &str {
        self.plan.as_deref().unwrap_or(UNSPECIFIED)
    }

    pub fn state_key(&self) -> &str {
        self.state.as_deref().unwrap_or(UNSPECIFIED)
    }

    pub fn is_subscriber(&self) -> bool {
        self.status.is(&ClientStatus::Subscriber)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct FunnelStageRow {
    #[tabled(rename = "Stage")]
    pub stage: String,
    #[tabled(rename = "Count")]
    pub count: usize,
    #[tabled(rename = "Percentage")]
    pub percentage: u32,
    #[tabled(rename = "Color")]
    pub color: String,
}

/// One slice of a grouped distribution (revenue per plan, clients per
/// origin).
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DistributionSlice {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Value")]
    pub value: f64,
    #[tabled(rename = "Percentage")]
    pub percentage: u32,
    #[tabled(rename = "Color")]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionView {
    pub slices: Vec<DistributionSlice>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GrowthPoint {
    #[tabled(rename = "Month")]
    pub month_label: String,
    #[tabled(skip)]
    pub year: i32,
    #[tabled(skip)]
    pub month: u32,
    #[tabled(rename = "TotalClients")]
    pub total_clients: usize,
    #[tabled(rename = "NewClients")]
    pub new_clients: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_revenue: f64,
    pub average_ticket: f64,
    pub conversion_rate: f64,
    pub churn_rate: f64,
    pub monthly_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct StateCount {
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Clients")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct OriginPerformanceRow {
    #[tabled(rename = "Origin")]
    pub origin: String,
    #[tabled(rename = "Leads")]
    pub leads: usize,
    #[tabled(rename = "Conversions")]
    pub conversions: usize,
    #[tabled(rename = "ConversionRate")]
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub kpis: KpiSummary,
    pub funnel: Vec<FunnelStageRow>,
    pub revenue_by_plan: DistributionView,
    pub traffic_sources: DistributionView,
    pub growth: Vec<GrowthPoint>,
    pub states: Vec<StateCount>,
    pub origins: Vec<OriginPerformanceRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_labels_and_keys() {
        assert_eq!(ClientStatus::from_label("Subscriber"), ClientStatus::Subscriber);
        assert_eq!(ClientStatus::from_label("proposal_sent"), ClientStatus::ProposalSent);
        assert_eq!(ClientStatus::from_label(" In Negotiation "), ClientStatus::InNegotiation);
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status = ClientStatus::from_label("subscriber ");
        assert_eq!(status, ClientStatus::Subscriber);
        let status = ClientStatus::from_label("SUBSCRIBER");
        assert_eq!(status, ClientStatus::Other("SUBSCRIBER".to_string()));
        assert_eq!(status.label(), "SUBSCRIBER");
    }

    #[test]
    fn missing_categories_fall_back_to_unspecified() {
        let r = ClientRecord::new("1", ClientStatus::Lead, Utc::now());
        assert_eq!(r.origin_key(), UNSPECIFIED);
        assert_eq!(r.plan_key(), UNSPECIFIED);
        assert_eq!(r.state_key(), UNSPECIFIED);
    }
}
