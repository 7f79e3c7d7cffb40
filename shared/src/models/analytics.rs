//! Analytics ledger models

use serde::{Deserialize, Serialize};

/// Tracked event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsEventType {
    View,
    Click,
    Purchase,
    Signup,
}

impl AnalyticsEventType {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Click => "click",
            Self::Purchase => "purchase",
            Self::Signup => "signup",
        }
    }
}

/// Track event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEvent {
    pub event_type: AnalyticsEventType,
    pub product_id: Option<i64>,
    pub session_id: Option<String>,
    /// Revenue in minor units, only meaningful for purchase events
    pub revenue: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}

/// Append-only analytics event row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AnalyticsEvent {
    pub id: i64,
    pub store_id: i64,
    pub event_type: String,
    pub product_id: Option<i64>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub revenue: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: i64,
}
