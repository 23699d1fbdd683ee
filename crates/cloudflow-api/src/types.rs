//! Response types for the five dashboard collections.
//!
//! Field names mirror the server's snake_case JSON. Deserialization is
//! deliberately tolerant: numeric rollups and optional annotations default
//! when the server omits them, because several emission paths fill only a
//! subset of fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cost/tier analytics rollup (`/api/v1/analytics/summary`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSummary {
    /// Object counts by tier and location.
    pub distribution: DataDistribution,
    /// Monthly cost rollup.
    pub costs: CostBreakdown,
    /// Recent access performance.
    pub performance: PerformanceMetrics,
    /// Number of pending or in-progress migrations.
    pub active_migrations_count: u64,
    /// Server-side generation timestamp (ISO 8601).
    pub timestamp: Option<String>,
}

/// Object counts by tier and location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataDistribution {
    /// Object count per tier (hot/warm/cold).
    pub by_tier: HashMap<String, u64>,
    /// Object count per storage location.
    pub by_location: HashMap<String, u64>,
    /// Total object count.
    pub total_objects: u64,
    /// Total stored size in GB.
    pub total_size_gb: f64,
}

/// Monthly cost rollup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostBreakdown {
    /// Current month cost.
    pub current_month: f64,
    /// Projected next-month cost.
    pub projected: f64,
    /// Cost per storage location.
    pub by_location: HashMap<String, f64>,
    /// Cost per tier.
    pub by_tier: HashMap<String, f64>,
    /// Currency code.
    pub currency: String,
}

/// Recent access performance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    /// Mean access latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Successful access percentage.
    pub success_rate: f64,
    /// Accesses in the sampled window.
    pub total_accesses: u64,
    /// Human-readable sampling window label.
    pub period: Option<String>,
}

/// One migration job (`/api/v1/migration/`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationJob {
    /// Storage identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Job identifier carried in push events.
    pub job_id: String,
    /// The object being migrated.
    pub data_object_id: String,
    /// Source storage location.
    pub source_location: String,
    /// Source tier.
    pub source_tier: String,
    /// Target storage location.
    pub target_location: String,
    /// Target tier.
    pub target_tier: String,
    /// pending / in_progress / completed / failed / cancelled.
    pub status: String,
    /// Queue priority.
    pub priority: i64,
    /// Bytes moved so far.
    pub bytes_transferred: u64,
    /// Total bytes to move.
    pub total_bytes: u64,
    /// Progress percent (0–100).
    pub progress_percentage: f64,
    /// Last failure message, empty when none.
    pub error_message: String,
    /// Automatic retry count.
    pub retry_count: u32,
}

/// One stored data object (`/api/v1/data/`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataObject {
    /// Storage identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Current tier (hot/warm/cold).
    pub current_tier: String,
    /// Current storage location.
    pub current_location: String,
    /// Access counter.
    pub access_count: u64,
    /// ML-predicted tier, when computed.
    pub predicted_tier: Option<String>,
    /// Monthly storage cost.
    pub cost_per_month: f64,
}

/// ML recommendation report (`/api/v1/recommendations/`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationReport {
    /// Top recommendations, best savings first.
    pub recommendations: Vec<Recommendation>,
    /// Sum of savings across all recommendations.
    pub total_potential_savings: f64,
    /// Total recommendation count before truncation.
    pub count: u64,
}

/// One tier/location recommendation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    /// Target object identifier.
    pub object_id: String,
    /// Target object name.
    pub object_name: String,
    /// tier_downgrade / tier_upgrade / location_change.
    pub action: String,
    /// Current tier, for tier actions.
    pub current_tier: Option<String>,
    /// Recommended tier, for tier actions.
    pub recommended_tier: Option<String>,
    /// Current location, for location actions.
    pub current_location: Option<String>,
    /// Recommended location, for location actions.
    pub recommended_location: Option<String>,
    /// Human-readable justification.
    pub reason: String,
    /// Projected monthly savings.
    pub savings_per_month: f64,
    /// high / medium / low.
    pub priority: String,
}

/// One stored cloud credential (`/api/v1/credentials/`). Secrets never
/// leave the server; only display metadata is returned.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudCredential {
    /// Storage identifier.
    pub id: String,
    /// aws / azure / gcp.
    pub provider: String,
    /// Operator-chosen label.
    pub display_name: String,
    /// Whether the credential is enabled.
    pub is_active: bool,
    /// Whether the last verification succeeded.
    pub is_verified: bool,
    /// Last verification timestamp (ISO 8601).
    pub last_verified: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: Option<String>,
}

/// One complete re-fetch cycle result: all five collections together.
///
/// The reconciler replaces its cached view wholesale with one of these;
/// partial merges never happen.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Cost/tier analytics rollup.
    pub summary: DashboardSummary,
    /// Migration job list.
    pub migrations: Vec<MigrationJob>,
    /// Stored data objects.
    pub data_objects: Vec<DataObject>,
    /// ML recommendation report.
    pub recommendations: RecommendationReport,
    /// Stored cloud credentials.
    pub credentials: Vec<CloudCredential>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_decodes_server_shape() {
        let summary: DashboardSummary = serde_json::from_str(
            r#"{
                "distribution": {"by_tier": {"hot": 2, "warm": 5}, "by_location": {"aws": 7},
                                 "total_objects": 7, "total_size_gb": 1.25},
                "costs": {"current_month": 12.5, "projected": 13.75,
                          "by_location": {"aws": 12.5}, "by_tier": {"hot": 4.0}, "currency": "USD"},
                "performance": {"avg_latency_ms": 42.1, "success_rate": 99.5,
                                "total_accesses": 1000, "period": "last_1000_accesses"},
                "active_migrations_count": 3,
                "timestamp": "2026-08-01T00:00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(summary.distribution.total_objects, 7);
        assert_eq!(summary.costs.currency, "USD");
        assert_eq!(summary.active_migrations_count, 3);
    }

    #[test]
    fn migration_job_maps_mongo_id() {
        let job: MigrationJob = serde_json::from_str(
            r#"{"_id": "65f1", "job_id": "abc123456789", "status": "in_progress",
                "progress_percentage": 42.0, "total_bytes": 1000, "bytes_transferred": 420}"#,
        )
        .unwrap();
        assert_eq!(job.id, "65f1");
        assert_eq!(job.job_id, "abc123456789");
        assert!((job.progress_percentage - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sparse_objects_fill_defaults() {
        let object: DataObject =
            serde_json::from_str(r#"{"_id": "65f2", "name": "report.csv"}"#).unwrap();
        assert_eq!(object.size_bytes, 0);
        assert_eq!(object.predicted_tier, None);
    }

    #[test]
    fn recommendation_report_decodes() {
        let report: RecommendationReport = serde_json::from_str(
            r#"{"recommendations": [{"object_id": "o1", "object_name": "big.bin",
                 "action": "tier_downgrade", "current_tier": "hot", "recommended_tier": "cold",
                 "reason": "Not accessed in 30 days", "savings_per_month": 4.2, "priority": "high"}],
                "total_potential_savings": 4.2, "count": 1}"#,
        )
        .unwrap();
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.recommendations[0].action, "tier_downgrade");
    }

    #[test]
    fn snapshot_default_is_empty() {
        let snapshot = DashboardSnapshot::default();
        assert!(snapshot.migrations.is_empty());
        assert!(snapshot.credentials.is_empty());
        assert_eq!(snapshot.summary.active_migrations_count, 0);
    }
}
