//! SQLite-backed and in-memory implementations of the report store
//! contract.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::Row;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use curbreport_core::domain::{
    Location, NearbyReport, Report, SeverityType, UserReport, ViolationType,
};
use curbreport_core::errors::StoreError;
use curbreport_core::store::ReportStore;

use crate::DbPool;

/// Meters per degree of latitude. Longitude degrees shrink with the cosine
/// of the latitude; distances use an equirectangular approximation, which is
/// accurate to well under a percent at the 2 km radii the engine queries.
const METERS_PER_DEGREE: f64 = 111_320.0;

fn query_error(error: sqlx::Error) -> StoreError {
    StoreError::Query(error.to_string())
}

fn decode_u32(value: i64, what: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Decode(format!("{what} {value} out of range")))
}

fn meter_scales(location: &Location) -> (f64, f64) {
    (METERS_PER_DEGREE, METERS_PER_DEGREE * location.latitude().to_radians().cos())
}

/// Report store backed by the `reports` table.
///
/// Spatial queries compute squared planar distance in SQL (plain arithmetic
/// only, so no SQLite math-function build flags are needed) on top of the
/// (latitude, longitude) index.
#[derive(Clone)]
pub struct SqlReportStore {
    pool: DbPool,
}

impl SqlReportStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Persists a report. Used by the report-creation flow and by seeding;
    /// the recommendation engine itself never writes.
    pub async fn insert_report(&self, report: &Report) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO reports
                (id, user_id, violation_type, time, latitude, longitude, severity, image_token)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(report.id.to_string())
        .bind(report.user.map(|user| user.to_string()))
        .bind(i64::from(report.violation_type))
        .bind(report.time)
        .bind(report.location.latitude())
        .bind(report.location.longitude())
        .bind(i64::from(report.severity))
        .bind(report.image_token.as_deref())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    /// Deletes every report a user has filed, returning how many rows went
    /// away. Part of account deletion, not of recommendation.
    pub async fn delete_user_reports(&self, user_id: &Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM reports WHERE user_id = ?1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }

    /// Image-evidence tokens attached to a user's reports, skipping reports
    /// without one.
    pub async fn user_report_image_tokens(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT image_token FROM reports
             WHERE user_id = ?1 AND image_token IS NOT NULL",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| row.try_get("image_token").map_err(query_error))
            .collect()
    }
}

#[async_trait]
impl ReportStore for SqlReportStore {
    async fn count_near_reports(
        &self,
        location: &Location,
        radius_m: f64,
    ) -> Result<u64, StoreError> {
        let (lat_scale, lon_scale) = meter_scales(location);
        let row = sqlx::query(
            "SELECT COUNT(*) AS near FROM (
                SELECT ((latitude - ?1) * ?3) * ((latitude - ?1) * ?3)
                     + ((longitude - ?2) * ?4) * ((longitude - ?2) * ?4) AS dist_sq
                FROM reports
             ) WHERE dist_sq <= ?5",
        )
        .bind(location.latitude())
        .bind(location.longitude())
        .bind(lat_scale)
        .bind(lon_scale)
        .bind(radius_m * radius_m)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        let near: i64 = row.try_get("near").map_err(query_error)?;
        Ok(near as u64)
    }

    async fn k_nearest_reports(
        &self,
        location: &Location,
        k: u64,
        max_radius_m: f64,
    ) -> Result<Vec<NearbyReport>, StoreError> {
        let (lat_scale, lon_scale) = meter_scales(location);
        let limit = i64::try_from(k).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT violation_type, latitude, longitude, dist_sq FROM (
                SELECT violation_type, latitude, longitude,
                       ((latitude - ?1) * ?3) * ((latitude - ?1) * ?3)
                     + ((longitude - ?2) * ?4) * ((longitude - ?2) * ?4) AS dist_sq
                FROM reports
             )
             WHERE dist_sq <= ?5
             ORDER BY dist_sq ASC
             LIMIT ?6",
        )
        .bind(location.latitude())
        .bind(location.longitude())
        .bind(lat_scale)
        .bind(lon_scale)
        .bind(max_radius_m * max_radius_m)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        debug!(rows = rows.len(), k, max_radius_m, "k-nearest-neighbor query");

        rows.iter()
            .map(|row| {
                let violation_type: i64 =
                    row.try_get("violation_type").map_err(query_error)?;
                let dist_sq: f64 = row.try_get("dist_sq").map_err(query_error)?;
                Ok(NearbyReport {
                    violation_type: decode_u32(violation_type, "violation type")?,
                    distance_m: dist_sq.sqrt(),
                    latitude: row.try_get("latitude").map_err(query_error)?,
                    longitude: row.try_get("longitude").map_err(query_error)?,
                })
            })
            .collect()
    }

    async fn most_common_violations(&self) -> Result<Vec<ViolationType>, StoreError> {
        let rows = sqlx::query(
            "SELECT violation_type FROM reports
             GROUP BY violation_type
             ORDER BY COUNT(*) DESC, violation_type ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let violation_type: i64 =
                    row.try_get("violation_type").map_err(query_error)?;
                decode_u32(violation_type, "violation type")
            })
            .collect()
    }

    async fn user_report_history(&self, user_id: &Uuid) -> Result<Vec<UserReport>, StoreError> {
        let rows = sqlx::query("SELECT violation_type, time FROM reports WHERE user_id = ?1")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let violation_type: i64 =
                    row.try_get("violation_type").map_err(query_error)?;
                Ok(UserReport {
                    violation_type: decode_u32(violation_type, "violation type")?,
                    time: row.try_get("time").map_err(query_error)?,
                })
            })
            .collect()
    }

    async fn most_common_severities(
        &self,
    ) -> Result<BTreeMap<ViolationType, SeverityType>, StoreError> {
        // Rows arrive per type with the most frequent severity first, so the
        // first severity seen for a type is its mode.
        let rows = sqlx::query(
            "SELECT violation_type, severity, COUNT(*) AS frequency FROM reports
             GROUP BY violation_type, severity
             ORDER BY violation_type ASC, frequency DESC, severity ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        let mut modal = BTreeMap::new();
        for row in &rows {
            let violation_type: i64 = row.try_get("violation_type").map_err(query_error)?;
            let severity: i64 = row.try_get("severity").map_err(query_error)?;
            modal
                .entry(decode_u32(violation_type, "violation type")?)
                .or_insert(decode_u32(severity, "severity")?);
        }
        Ok(modal)
    }
}

/// Great-circle distance in meters between two locations.
fn haversine_m(a: &Location, b: &Location) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// In-memory report store for tests and local experiments. Implements the
/// same contract as [`SqlReportStore`] over a plain vector of reports.
#[derive(Default)]
pub struct InMemoryReportStore {
    reports: RwLock<Vec<Report>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self { reports: RwLock::new(reports) }
    }

    pub async fn insert(&self, report: Report) {
        self.reports.write().await.push(report);
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn count_near_reports(
        &self,
        location: &Location,
        radius_m: f64,
    ) -> Result<u64, StoreError> {
        let reports = self.reports.read().await;
        let near = reports
            .iter()
            .filter(|report| haversine_m(location, &report.location) <= radius_m)
            .count();
        Ok(near as u64)
    }

    async fn k_nearest_reports(
        &self,
        location: &Location,
        k: u64,
        max_radius_m: f64,
    ) -> Result<Vec<NearbyReport>, StoreError> {
        let reports = self.reports.read().await;
        let mut nearby: Vec<NearbyReport> = reports
            .iter()
            .filter_map(|report| {
                let distance_m = haversine_m(location, &report.location);
                (distance_m <= max_radius_m).then(|| NearbyReport {
                    violation_type: report.violation_type,
                    distance_m,
                    latitude: report.location.latitude(),
                    longitude: report.location.longitude(),
                })
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_m.partial_cmp(&b.distance_m).unwrap_or(std::cmp::Ordering::Equal)
        });
        nearby.truncate(usize::try_from(k).unwrap_or(usize::MAX));
        Ok(nearby)
    }

    async fn most_common_violations(&self) -> Result<Vec<ViolationType>, StoreError> {
        let reports = self.reports.read().await;
        let mut counts: BTreeMap<ViolationType, u64> = BTreeMap::new();
        for report in reports.iter() {
            *counts.entry(report.violation_type).or_insert(0) += 1;
        }

        let mut ranked: Vec<(ViolationType, u64)> = counts.into_iter().collect();
        // Descending by frequency, ascending type as the consistent tie-break.
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(ranked.into_iter().map(|(violation_type, _)| violation_type).collect())
    }

    async fn user_report_history(&self, user_id: &Uuid) -> Result<Vec<UserReport>, StoreError> {
        let reports = self.reports.read().await;
        Ok(reports
            .iter()
            .filter(|report| report.user == Some(*user_id))
            .map(|report| UserReport { violation_type: report.violation_type, time: report.time })
            .collect())
    }

    async fn most_common_severities(
        &self,
    ) -> Result<BTreeMap<ViolationType, SeverityType>, StoreError> {
        let reports = self.reports.read().await;
        let mut counts: BTreeMap<ViolationType, BTreeMap<SeverityType, u64>> = BTreeMap::new();
        for report in reports.iter() {
            *counts
                .entry(report.violation_type)
                .or_default()
                .entry(report.severity)
                .or_insert(0) += 1;
        }

        let mut modal = BTreeMap::new();
        for (violation_type, by_severity) in counts {
            let mut best: Option<(SeverityType, u64)> = None;
            for (severity, count) in by_severity {
                // Strictly greater keeps the lowest severity on ties, matching
                // the SQL store's ordering.
                if best.map_or(true, |(_, best_count)| count > best_count) {
                    best = Some((severity, count));
                }
            }
            if let Some((severity, _)) = best {
                modal.insert(violation_type, severity);
            }
        }
        Ok(modal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(latitude: f64, longitude: f64) -> Location {
        Location::new(latitude, longitude).unwrap()
    }

    fn report(
        user: Option<Uuid>,
        violation_type: ViolationType,
        time: i64,
        at: Location,
        severity: SeverityType,
    ) -> Report {
        Report::create(user, violation_type, time, at, severity, None)
    }

    #[test]
    fn haversine_matches_known_distances() {
        let anchor = location(52.512852, 13.326802);

        // One thousandth of a degree of latitude is ~111 meters.
        let north = location(52.513852, 13.326802);
        let d = haversine_m(&anchor, &north);
        assert!((d - 111.2).abs() < 1.0, "unexpected distance {d}");

        assert_eq!(haversine_m(&anchor, &anchor), 0.0);
    }

    #[tokio::test]
    async fn knn_orders_by_distance_and_respects_bounds() {
        let anchor = location(52.512852, 13.326802);
        let store = InMemoryReportStore::new();
        store.insert(report(None, 1, 0, location(52.5138, 13.3268), 0)).await; // ~105 m
        store.insert(report(None, 2, 0, location(52.5129, 13.3268), 0)).await; // ~5 m
        store.insert(report(None, 3, 0, location(52.5328, 13.3268), 0)).await; // ~2.2 km

        let nearby = store.k_nearest_reports(&anchor, 10, 2000.0).await.unwrap();
        let types: Vec<u32> = nearby.iter().map(|n| n.violation_type).collect();
        assert_eq!(types, vec![2, 1], "out-of-radius reports must not be padded in");
        assert!(nearby[0].distance_m < nearby[1].distance_m);

        let capped = store.k_nearest_reports(&anchor, 1, 2000.0).await.unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].violation_type, 2);
    }

    #[tokio::test]
    async fn count_near_reports_honors_the_radius() {
        let anchor = location(52.512852, 13.326802);
        let store = InMemoryReportStore::new();
        store.insert(report(None, 1, 0, location(52.5129, 13.3268), 0)).await; // ~5 m
        store.insert(report(None, 1, 0, location(52.5138, 13.3268), 0)).await; // ~105 m

        assert_eq!(store.count_near_reports(&anchor, 50.0).await.unwrap(), 1);
        assert_eq!(store.count_near_reports(&anchor, 200.0).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn frequency_ranking_breaks_ties_consistently() {
        let at = location(0.0, 0.0);
        let store = InMemoryReportStore::new();
        for violation_type in [7, 7, 3, 3, 12] {
            store.insert(report(None, violation_type, 0, at, 0)).await;
        }

        let ranked = store.most_common_violations().await.unwrap();
        assert_eq!(ranked, vec![3, 7, 12]);
    }

    #[tokio::test]
    async fn modal_severity_prefers_the_most_frequent_label() {
        let at = location(0.0, 0.0);
        let store = InMemoryReportStore::new();
        store.insert(report(None, 4, 0, at, 1)).await;
        store.insert(report(None, 4, 0, at, 2)).await;
        store.insert(report(None, 4, 0, at, 2)).await;
        store.insert(report(None, 9, 0, at, 0)).await;
        store.insert(report(None, 9, 0, at, 3)).await; // tie, lower severity wins

        let modal = store.most_common_severities().await.unwrap();
        assert_eq!(modal[&4], 2);
        assert_eq!(modal[&9], 0);
    }

    #[tokio::test]
    async fn user_history_is_scoped_to_the_user() {
        let at = location(0.0, 0.0);
        let reporter = Uuid::new_v4();
        let store = InMemoryReportStore::new();
        store.insert(report(Some(reporter), 5, 100, at, 0)).await;
        store.insert(report(Some(Uuid::new_v4()), 6, 200, at, 0)).await;
        store.insert(report(None, 7, 300, at, 0)).await;

        let history = store.user_report_history(&reporter).await.unwrap();
        assert_eq!(history, vec![UserReport { violation_type: 5, time: 100 }]);
    }
}
