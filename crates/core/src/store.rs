use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Location, NearbyReport, SeverityType, UserReport, ViolationType};
use crate::errors::StoreError;

/// Read-only query contract over the persisted report table.
///
/// All operations are safe to call concurrently; implementations hold no
/// shared mutable state across calls. The engine issues fresh queries per
/// recommendation request and never caches results.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Number of persisted reports within `radius_m` meters of `location`.
    async fn count_near_reports(
        &self,
        location: &Location,
        radius_m: f64,
    ) -> Result<u64, StoreError>;

    /// Up to `k` nearest reports within `max_radius_m` meters of `location`,
    /// closest first. Returns fewer than `k` rows when fewer exist in
    /// radius; never pads.
    async fn k_nearest_reports(
        &self,
        location: &Location,
        k: u64,
        max_radius_m: f64,
    ) -> Result<Vec<NearbyReport>, StoreError>;

    /// All violation types ordered by descending historical frequency.
    /// Ties are broken consistently across calls.
    async fn most_common_violations(&self) -> Result<Vec<ViolationType>, StoreError>;

    /// Every report a user has ever filed, in no particular order.
    async fn user_report_history(&self, user_id: &Uuid) -> Result<Vec<UserReport>, StoreError>;

    /// Modal severity per violation type across all reports.
    async fn most_common_severities(
        &self,
    ) -> Result<BTreeMap<ViolationType, SeverityType>, StoreError>;
}
