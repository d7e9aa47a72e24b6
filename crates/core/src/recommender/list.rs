//! Request-scoped score accumulator.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{Recommendation, SeverityType, ViolationType};

/// Ordered, type-indexed accumulation of (score, severity) per violation
/// type. Entries keep first-seen order until the final sort; lookup by type
/// is O(1). One instance lives per recommendation request and is discarded
/// with the response.
#[derive(Debug, Default)]
pub struct RecommendationList {
    entries: Vec<Recommendation>,
    by_type: HashMap<ViolationType, usize>,
}

impl RecommendationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the entry for `violation_type`, appending a zero-score entry
    /// if the type has not been seen yet.
    fn get_or_create(&mut self, violation_type: ViolationType) -> usize {
        if let Some(&index) = self.by_type.get(&violation_type) {
            return index;
        }
        self.entries.push(Recommendation { violation_type, score: 0.0, severity: 0 });
        let index = self.entries.len() - 1;
        self.by_type.insert(violation_type, index);
        index
    }

    /// Adds `value * multiplier` to every violation type present in
    /// `scores`, creating entries as needed. Types absent from `scores` are
    /// left untouched; a sparse input never zeroes existing scores.
    pub fn add_scores(&mut self, scores: &BTreeMap<ViolationType, f64>, multiplier: f64) {
        for (&violation_type, &value) in scores {
            let index = self.get_or_create(violation_type);
            self.entries[index].score += value * multiplier;
        }
    }

    /// Sets the severity label for every violation type present in
    /// `severities`, creating zero-score entries as needed.
    pub fn attach_severities(&mut self, severities: &BTreeMap<ViolationType, SeverityType>) {
        for (&violation_type, &severity) in severities {
            let index = self.get_or_create(violation_type);
            self.entries[index].severity = severity;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the accumulator, returning entries sorted by descending
    /// score. The sort is stable, so ties keep first-seen order.
    pub fn into_sorted(mut self) -> Vec<Recommendation> {
        self.entries.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        self.entries
    }
}
