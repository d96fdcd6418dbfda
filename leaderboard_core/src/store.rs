use std::collections::HashMap;
use std::sync::Arc;

use score_schema::{Metric, UserScoreRecord};

use crate::error::LeaderboardError;

/// Owns the record set and its current order.
///
/// Mutation is single-owner; callers must not share a store across threads
/// without their own synchronization.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    records: Vec<Arc<UserScoreRecord>>,
    active_metric: Metric,
    /// False after `replace_all` until the next `reorder`.
    sorted: bool,
}

impl ScoreStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            active_metric: Metric::default(),
            sorted: true,
        }
    }

    /// Replaces every record. The new set keeps its given order until the
    /// next [`reorder`](Self::reorder). On duplicate ids the store is left
    /// untouched.
    pub fn replace_all(&mut self, records: Vec<UserScoreRecord>) -> Result<(), LeaderboardError> {
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if let Some(&first) = seen.get(record.id.as_str()) {
                return Err(LeaderboardError::DuplicateId {
                    id: record.id.clone(),
                    first,
                    second: index,
                });
            }
            seen.insert(record.id.as_str(), index);
        }

        self.records = records.into_iter().map(Arc::new).collect();
        self.sorted = false;
        Ok(())
    }

    /// Stable descending sort by `metric`. Equal scores keep their prior order.
    pub fn reorder(&mut self, metric: Metric) {
        self.records.sort_by(|a, b| b.score(metric).cmp(&a.score(metric)));
        self.active_metric = metric;
        self.sorted = true;
    }

    /// 1-based position of `user_id` in the current order.
    pub fn rank(&self, user_id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.id == user_id)
            .map(|index| index + 1)
    }

    pub fn active_metric(&self) -> Metric {
        self.active_metric
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<UserScoreRecord>> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserScoreRecord> {
        self.records.iter().map(|record| record.as_ref())
    }
}

impl Default for ScoreStore {
    fn default() -> Self {
        Self::new()
    }
}
