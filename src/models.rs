use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One clickstream row that survived validation. `event_hour` is always
/// `timestamp` truncated to the start of its hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub user_id: i64,
    pub session_id: i64,
    pub timestamp: NaiveDateTime,
    pub event_hour: NaiveDateTime,
    pub event_type: String,
    pub product_id: Option<String>,
    pub outcome: Option<String>,
    pub is_purchase: bool,
    pub revenue: f64,
}

/// Aggregated metrics for a single hour bucket. Every ratio uses the
/// zero-on-division-by-zero policy; an hour with no events is all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    pub hour: NaiveDateTime,
    pub events_total: u64,
    pub unique_users: u64,
    pub unique_sessions: u64,
    pub purchases: u64,
    pub revenue: f64,
    pub aov: f64,
    pub add_to_cart: u64,
    pub product_view: u64,
    pub conv_cart_to_purchase: f64,
    pub conv_view_to_purchase: f64,
}

/// Durable cursor payload. The key name matches the state file the
/// reporting job has always used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorState {
    pub last_sent_hour: Option<NaiveDateTime>,
}

/// Counts and ranges logged after an ingestion run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub rows_read: u64,
    pub rows_kept: u64,
    pub min_timestamp: Option<NaiveDateTime>,
    pub max_timestamp: Option<NaiveDateTime>,
    pub min_hour: Option<NaiveDateTime>,
    pub max_hour: Option<NaiveDateTime>,
    pub purchases: u64,
    pub revenue: f64,
}

/// Per-role aggregation over one Adzuna search page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleStats {
    pub role: String,
    pub total: u64,
    pub sample: usize,
    pub avg_salary: Option<f64>,
    pub salary_share: f64,
    pub top_locations: Vec<(String, usize)>,
    pub top_companies: Vec<(String, usize)>,
}

/// One full round of role queries, ready for formatting and delivery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub date: chrono::NaiveDate,
    pub country_code: String,
    pub country_name: String,
    pub currency: String,
    pub rows: Vec<RoleStats>,
}
