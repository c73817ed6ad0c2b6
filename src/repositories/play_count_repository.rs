// src/repositories/play_count_repository.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::catalog::Track;
use crate::domain::chart::{ChartState, DailyChartTrack};
use crate::error::AppResult;
use crate::repositories::kv_store::{keys, BlobStore, KeyValueStore};

pub trait PlayCountRepository: Send + Sync {
    /// Persisted play counts, overriding catalog defaults
    fn load_play_counts(&self) -> AppResult<HashMap<String, u64>>;
    fn save_play_counts(&self, counts: &HashMap<String, u64>) -> AppResult<()>;

    /// Track id -> unix millis of the last credited listen
    fn load_last_listen(&self) -> AppResult<HashMap<String, i64>>;
    fn save_last_listen(&self, last: &HashMap<String, i64>) -> AppResult<()>;

    fn load_chart_state(&self) -> AppResult<ChartState>;
    fn save_chart_state(&self, state: &ChartState) -> AppResult<()>;

    /// `YYYY-MM-DDTHH` of the last ambient accrual
    fn load_ambient_marker(&self) -> AppResult<Option<String>>;
    fn save_ambient_marker(&self, marker: &str) -> AppResult<()>;

    fn load_recent(&self) -> AppResult<Vec<Track>>;
    fn save_recent(&self, recent: &[Track]) -> AppResult<()>;
}

pub struct KvPlayCountRepository {
    blobs: BlobStore,
}

impl KvPlayCountRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            blobs: BlobStore::new(store),
        }
    }
}

impl PlayCountRepository for KvPlayCountRepository {
    fn load_play_counts(&self) -> AppResult<HashMap<String, u64>> {
        self.blobs.load_or_default(keys::PLAYS)
    }

    fn save_play_counts(&self, counts: &HashMap<String, u64>) -> AppResult<()> {
        self.blobs.save(keys::PLAYS, counts)
    }

    fn load_last_listen(&self) -> AppResult<HashMap<String, i64>> {
        self.blobs.load_or_default(keys::LAST_LISTEN)
    }

    fn save_last_listen(&self, last: &HashMap<String, i64>) -> AppResult<()> {
        self.blobs.save(keys::LAST_LISTEN, last)
    }

    fn load_chart_state(&self) -> AppResult<ChartState> {
        let chart: Vec<DailyChartTrack> = self.blobs.load_list(keys::DAILY_CHART)?;
        let baseline: HashMap<String, u64> = self.blobs.load_or_default(keys::CHART_BASELINE)?;
        let last_rollover: Option<DateTime<Utc>> =
            self.blobs.load_optional(keys::CHART_LAST_ROLLOVER)?;
        Ok(ChartState {
            chart,
            baseline,
            last_rollover,
        })
    }

    fn save_chart_state(&self, state: &ChartState) -> AppResult<()> {
        self.blobs.save(keys::DAILY_CHART, &state.chart)?;
        self.blobs.save(keys::CHART_BASELINE, &state.baseline)?;
        match &state.last_rollover {
            Some(at) => self.blobs.save(keys::CHART_LAST_ROLLOVER, at),
            None => self.blobs.remove(keys::CHART_LAST_ROLLOVER),
        }
    }

    fn load_ambient_marker(&self) -> AppResult<Option<String>> {
        self.blobs.load_optional(keys::AMBIENT_LAST_HOUR)
    }

    fn save_ambient_marker(&self, marker: &str) -> AppResult<()> {
        self.blobs.save(keys::AMBIENT_LAST_HOUR, marker)
    }

    fn load_recent(&self) -> AppResult<Vec<Track>> {
        self.blobs.load_list(keys::RECENT)
    }

    fn save_recent(&self, recent: &[Track]) -> AppResult<()> {
        self.blobs.save(keys::RECENT, recent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::kv_store::test_support::memory_store;

    #[test]
    fn test_defaults_when_empty() {
        let repo = KvPlayCountRepository::new(memory_store());
        assert!(repo.load_play_counts().unwrap().is_empty());
        assert!(repo.load_last_listen().unwrap().is_empty());
        assert_eq!(repo.load_chart_state().unwrap(), ChartState::default());
        assert!(repo.load_ambient_marker().unwrap().is_none());
        assert!(repo.load_recent().unwrap().is_empty());
    }

    #[test]
    fn test_chart_state_round_trip() {
        let repo = KvPlayCountRepository::new(memory_store());
        let mut state = ChartState::default();
        state.baseline.insert("t1".to_string(), 42);
        state.last_rollover = Some(Utc::now());
        repo.save_chart_state(&state).unwrap();

        let loaded = repo.load_chart_state().unwrap();
        assert_eq!(loaded.baseline, state.baseline);
        assert_eq!(loaded.last_rollover, state.last_rollover);
    }

    #[test]
    fn test_ambient_marker_round_trip() {
        let repo = KvPlayCountRepository::new(memory_store());
        repo.save_ambient_marker("2024-05-10T13").unwrap();
        assert_eq!(
            repo.load_ambient_marker().unwrap().as_deref(),
            Some("2024-05-10T13")
        );
    }
}
