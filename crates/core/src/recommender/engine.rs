//! Recommendation pipeline over a [`ReportStore`].

use std::collections::BTreeMap;

use tracing::debug;
use uuid::Uuid;

use super::list::RecommendationList;
use super::{rbf, RecommendationResult};
use crate::domain::{Location, Recommendation, ViolationType};
use crate::store::ReportStore;

/// Tunable constants for the scoring passes. Defaults are the reference
/// values; the multipliers encode relative trust in each signal (location >
/// user history > global prior).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    pub common_multiplier: f64,
    pub location_multiplier: f64,
    pub user_multiplier: f64,
    pub location_shape: f64,
    pub user_shape: f64,
    pub near_radius_m: f64,
    pub wide_radius_m: f64,
    pub reports_around: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            common_multiplier: super::COMMON_MULTIPLIER,
            location_multiplier: super::LOCATION_MULTIPLIER,
            user_multiplier: super::USER_MULTIPLIER,
            location_shape: super::LOCATION_SHAPE,
            user_shape: super::USER_SHAPE,
            near_radius_m: super::NEAR_RADIUS_M,
            wide_radius_m: super::WIDE_RADIUS_M,
            reports_around: super::REPORTS_AROUND,
        }
    }
}

/// Stateless-per-call recommendation engine. Each call builds its own
/// accumulator from fresh store queries; nothing is cached across requests.
#[derive(Debug, Clone)]
pub struct Recommender<S> {
    store: S,
    tuning: Tuning,
}

impl<S: ReportStore> Recommender<S> {
    pub fn new(store: S) -> Self {
        Self::with_tuning(store, Tuning::default())
    }

    pub fn with_tuning(store: S, tuning: Tuning) -> Self {
        Self { store, tuning }
    }

    /// Ranked violation types for a prospective report at `location`, most
    /// probable first, each carrying the most common severity observed for
    /// that type.
    ///
    /// The user-history pass runs only when both `user_id` and `time` are
    /// given; otherwise it contributes nothing. Empty signals are not
    /// errors: an area with no neighbors simply adds no location scores, and
    /// a store with no reports at all yields an empty list.
    pub async fn recommendations(
        &self,
        location: &Location,
        user_id: Option<Uuid>,
        time: Option<i64>,
    ) -> RecommendationResult<Vec<Recommendation>> {
        // Reject malformed timestamps before any query is issued.
        if let Some(time) = time {
            rbf::seconds_since_midnight(time)?;
        }

        let mut list = RecommendationList::new();

        let severities = self.store.most_common_severities().await?;
        list.attach_severities(&severities);

        let most_common = self.store.most_common_violations().await?;
        list.add_scores(&most_common_scores(&most_common), self.tuning.common_multiplier);

        let location_scores = self.location_scores(location).await?;
        list.add_scores(&location_scores, self.tuning.location_multiplier);

        if let (Some(user_id), Some(time)) = (user_id, time) {
            let user_scores = self.user_history_scores(&user_id, time).await?;
            list.add_scores(&user_scores, self.tuning.user_multiplier);
        }

        debug!(candidates = list.len(), "recommendation passes merged");
        Ok(list.into_sorted())
    }

    /// Location-proximity pass: weights nearby reports with an inverse
    /// quadratic over distance. The neighborhood is sized by the local
    /// report density plus a fixed floor.
    async fn location_scores(
        &self,
        location: &Location,
    ) -> RecommendationResult<BTreeMap<ViolationType, f64>> {
        let near_count =
            self.store.count_near_reports(location, self.tuning.near_radius_m).await?;
        let neighbors = self
            .store
            .k_nearest_reports(
                location,
                near_count + self.tuning.reports_around,
                self.tuning.wide_radius_m,
            )
            .await?;
        debug!(near_count, neighbors = neighbors.len(), "location pass neighborhood");

        let weighted: Vec<(ViolationType, f64)> = neighbors
            .iter()
            .map(|report| {
                (
                    report.violation_type,
                    rbf::inverse_quadratic(self.tuning.location_shape, report.distance_m),
                )
            })
            .collect();
        let total: f64 = weighted.iter().map(|(_, weight)| weight).sum();

        Ok(sum_up_weights(&weighted, total))
    }

    /// User-history pass: weights the user's past reports by time-of-day
    /// proximity to the new report, using the slower-decaying
    /// inverse-multi-quadratic.
    async fn user_history_scores(
        &self,
        user_id: &Uuid,
        time: i64,
    ) -> RecommendationResult<BTreeMap<ViolationType, f64>> {
        let history = self.store.user_report_history(user_id).await?;
        let new_seconds = f64::from(rbf::seconds_since_midnight(time)?);

        let mut weighted = Vec::with_capacity(history.len());
        for report in &history {
            let old_seconds = f64::from(rbf::seconds_since_midnight(report.time)?);
            let time_diff = (new_seconds - old_seconds).abs();
            weighted.push((
                report.violation_type,
                rbf::inverse_multi_quadratic(self.tuning.user_shape, time_diff),
            ));
        }
        let total: f64 = weighted.iter().map(|(_, weight)| weight).sum();

        Ok(sum_up_weights(&weighted, total))
    }
}

/// Normalized triangular weights for a frequency-ranked list of violation
/// types: rank `i` of `n` receives `(n - i) / (n(n+1)/2)`, a decreasing
/// arithmetic sequence summing to 1. A type listed twice keeps its last
/// (lowest) weight.
pub fn most_common_scores(ranked: &[ViolationType]) -> BTreeMap<ViolationType, f64> {
    let n = ranked.len();
    if n == 0 {
        return BTreeMap::new();
    }

    let denominator = (n * (n + 1)) as f64 / 2.0;
    let mut scores = BTreeMap::new();
    for (rank, &violation_type) in ranked.iter().enumerate() {
        scores.insert(violation_type, (n - rank) as f64 / denominator);
    }
    scores
}

/// Collapses per-report weights into per-type sums normalized by `sum`, so
/// one pass's scores total 1 across types. A zero `sum` (no neighbors, or
/// weights cancelling out) yields an empty map instead of dividing by zero.
pub fn sum_up_weights(
    weighted: &[(ViolationType, f64)],
    sum: f64,
) -> BTreeMap<ViolationType, f64> {
    if sum == 0.0 {
        return BTreeMap::new();
    }

    let mut scores: BTreeMap<ViolationType, f64> = BTreeMap::new();
    for &(violation_type, weight) in weighted {
        *scores.entry(violation_type).or_insert(0.0) += weight / sum;
    }
    scores
}
