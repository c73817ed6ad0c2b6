// src/domain/chart.rs
//
// Daily Chart (Derived Data)
//
// A snapshot of top tracks ranked by play delta since the previous rollover.
// Recomputed only at the daily cutover; reads in between return the snapshot.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::catalog::Track;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChartTrack {
    #[serde(flatten)]
    pub track: Track,
    pub daily_plays: u64,
}

/// Persisted chart plus the baseline the next delta is computed against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartState {
    pub chart: Vec<DailyChartTrack>,
    /// Absolute play counts captured at the last rollover
    pub baseline: HashMap<String, u64>,
    pub last_rollover: Option<DateTime<Utc>>,
}

/// The most recent cutover instant at or before `now`
pub fn latest_cutover(now: DateTime<Utc>, cutover_hour_utc: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(cutover_hour_utc % 24, 0, 0).unwrap_or(NaiveTime::MIN);
    let today = Utc.from_utc_datetime(&now.date_naive().and_time(time));
    if today <= now {
        today
    } else {
        today - Duration::days(1)
    }
}

impl ChartState {
    /// Whether a rollover boundary has been crossed since the last computation
    pub fn is_due(&self, now: DateTime<Utc>, cutover_hour_utc: u32) -> bool {
        match self.last_rollover {
            None => true,
            Some(last) => last < latest_cutover(now, cutover_hour_utc),
        }
    }

    /// Rank tracks by plays gained since the baseline and capture a new one.
    /// Tracks missing from the baseline count all of their plays.
    pub fn roll_over(&mut self, tracks: &[Track], size: usize, now: DateTime<Utc>) {
        let mut ranked: Vec<DailyChartTrack> = tracks
            .iter()
            .map(|t| {
                let before = self.baseline.get(&t.id).copied().unwrap_or(0);
                DailyChartTrack {
                    track: t.clone(),
                    daily_plays: t.plays.saturating_sub(before),
                }
            })
            .collect();
        // stable sort keeps catalog order among ties
        ranked.sort_by(|a, b| b.daily_plays.cmp(&a.daily_plays));
        ranked.truncate(size);

        self.chart = ranked;
        self.baseline = tracks.iter().map(|t| (t.id.clone(), t.plays)).collect();
        self.last_rollover = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, plays: u64) -> Track {
        Track {
            id: id.to_string(),
            title: id.to_string(),
            artist: "A".to_string(),
            album: "X".to_string(),
            cover: String::new(),
            duration: 200.0,
            url: String::new(),
            plays,
            genre: "Pop".to_string(),
            explicit: false,
            feat: None,
            hueq: None,
            main_artists: vec![],
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_latest_cutover() {
        assert_eq!(
            latest_cutover(at("2024-05-10T22:00:00Z"), 21),
            at("2024-05-10T21:00:00Z")
        );
        assert_eq!(
            latest_cutover(at("2024-05-10T20:59:59Z"), 21),
            at("2024-05-09T21:00:00Z")
        );
    }

    #[test]
    fn test_due_only_after_boundary() {
        let mut state = ChartState::default();
        assert!(state.is_due(at("2024-05-10T22:00:00Z"), 21));
        state.roll_over(&[], 25, at("2024-05-10T22:00:00Z"));
        assert!(!state.is_due(at("2024-05-11T20:00:00Z"), 21));
        assert!(state.is_due(at("2024-05-11T21:00:00Z"), 21));
    }

    #[test]
    fn test_deltas_never_negative() {
        let mut state = ChartState::default();
        state.baseline.insert("a".to_string(), 500);
        state.baseline.insert("b".to_string(), 10);
        state.roll_over(&[track("a", 100), track("b", 60)], 25, Utc::now());

        assert_eq!(state.chart[0].track.id, "b");
        assert_eq!(state.chart[0].daily_plays, 50);
        assert_eq!(state.chart[1].daily_plays, 0);
        assert_eq!(state.baseline["a"], 100);
    }

    #[test]
    fn test_chart_is_capped() {
        let tracks: Vec<Track> = (0..40).map(|i| track(&format!("t{}", i), i * 10)).collect();
        let mut state = ChartState::default();
        state.roll_over(&tracks, 25, Utc::now());
        assert_eq!(state.chart.len(), 25);
        assert_eq!(state.chart[0].track.id, "t39");
    }
}
