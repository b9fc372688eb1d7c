//! Trend tracker: bounded emotion history and a rolling trend label.

use crate::emotion::Emotion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum entries retained in the emotion log.
pub const EMOTION_LOG_CAP: usize = 30;

/// Entries examined when deriving the trend label.
pub const TREND_WINDOW: usize = 7;

/// Occurrences inside the window needed for a streak.
const STREAK_MIN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionLogEntry {
    pub emotion: Emotion,
    pub timestamp: DateTime<Utc>,
}

impl EmotionLogEntry {
    pub fn now(emotion: Emotion) -> Self {
        Self {
            emotion,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    AnxiousStreak,
    LowMoodStreak,
    Improving,
    EmotionalShift,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::AnxiousStreak => "anxious_streak",
            Trend::LowMoodStreak => "low_mood_streak",
            Trend::Improving => "improving",
            Trend::EmotionalShift => "emotional_shift",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the emotion log for one turn: load it, `record` the new emotion, save `entries()`.
#[derive(Debug, Clone)]
pub struct TrendTracker {
    entries: Vec<EmotionLogEntry>,
    cap: usize,
}

impl TrendTracker {
    pub fn new(entries: Vec<EmotionLogEntry>) -> Self {
        Self::with_cap(entries, EMOTION_LOG_CAP)
    }

    /// A cap of zero is treated as one so the current entry always survives.
    pub fn with_cap(entries: Vec<EmotionLogEntry>, cap: usize) -> Self {
        let mut tracker = Self {
            entries,
            cap: cap.max(1),
        };
        tracker.evict();
        tracker
    }

    /// Append a new entry (FIFO eviction past the cap) and return the resulting trend.
    pub fn record(&mut self, entry: EmotionLogEntry) -> Trend {
        self.entries.push(entry);
        self.evict();
        self.trend()
    }

    pub fn entries(&self) -> &[EmotionLogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<EmotionLogEntry> {
        self.entries
    }

    /// Label for the most recent `TREND_WINDOW` entries, checked in fixed precedence.
    pub fn trend(&self) -> Trend {
        let start = self.entries.len().saturating_sub(TREND_WINDOW);
        let window: Vec<Emotion> = self.entries[start..].iter().map(|e| e.emotion).collect();
        let count = |target: Emotion| window.iter().filter(|e| **e == target).count();

        if count(Emotion::Anxiety) >= STREAK_MIN {
            return Trend::AnxiousStreak;
        }
        if count(Emotion::Sadness) >= STREAK_MIN {
            return Trend::LowMoodStreak;
        }
        if count(Emotion::Positive) >= STREAK_MIN {
            return Trend::Improving;
        }
        if let [.., previous, current] = window.as_slice() {
            if *current == Emotion::Anxiety && matches!(previous, Emotion::Neutral | Emotion::Sadness) {
                return Trend::EmotionalShift;
            }
        }
        Trend::Stable
    }

    fn evict(&mut self) {
        if self.entries.len() > self.cap {
            let excess = self.entries.len() - self.cap;
            self.entries.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(emotions: &[Emotion]) -> (TrendTracker, Trend) {
        let mut tracker = TrendTracker::new(Vec::new());
        let mut trend = Trend::Stable;
        for e in emotions {
            trend = tracker.record(EmotionLogEntry::now(*e));
        }
        (tracker, trend)
    }

    #[test]
    fn three_anxious_in_window_is_anxious_streak() {
        use Emotion::*;
        let (_, t) = feed(&[Anxiety, Neutral, Anxiety, Positive, Anxiety]);
        assert_eq!(t, Trend::AnxiousStreak);
    }

    #[test]
    fn three_positive_in_window_is_improving() {
        use Emotion::*;
        let (_, t) = feed(&[Positive, Neutral, Positive, Neutral, Positive]);
        assert_eq!(t, Trend::Improving);
    }

    #[test]
    fn three_sad_is_low_mood() {
        use Emotion::*;
        let (_, t) = feed(&[Sadness, Sadness, Anger, Sadness]);
        assert_eq!(t, Trend::LowMoodStreak);
    }

    #[test]
    fn anxious_streak_precedes_low_mood() {
        use Emotion::*;
        let (_, t) = feed(&[Sadness, Sadness, Sadness, Anxiety, Anxiety, Anxiety]);
        assert_eq!(t, Trend::AnxiousStreak);
    }

    #[test]
    fn entries_outside_window_do_not_count() {
        use Emotion::*;
        let (_, t) = feed(&[Anxiety, Anxiety, Anxiety, Neutral, Neutral, Neutral, Neutral, Neutral, Neutral, Neutral]);
        assert_eq!(t, Trend::Stable);
    }

    #[test]
    fn neutral_then_anxiety_is_a_shift() {
        use Emotion::*;
        assert_eq!(feed(&[Neutral, Anxiety]).1, Trend::EmotionalShift);
        assert_eq!(feed(&[Sadness, Anxiety]).1, Trend::EmotionalShift);
        assert_eq!(feed(&[Positive, Anxiety]).1, Trend::Stable);
        assert_eq!(feed(&[Anxiety]).1, Trend::Stable);
    }

    #[test]
    fn log_is_capped_fifo() {
        let mut tracker = TrendTracker::new(Vec::new());
        tracker.record(EmotionLogEntry::now(Emotion::Anger));
        for _ in 0..EMOTION_LOG_CAP {
            tracker.record(EmotionLogEntry::now(Emotion::Neutral));
        }
        assert_eq!(tracker.entries().len(), EMOTION_LOG_CAP);
        assert!(tracker.entries().iter().all(|e| e.emotion == Emotion::Neutral));
    }

    #[test]
    fn oversized_persisted_log_is_trimmed_on_load() {
        let entries = vec![EmotionLogEntry::now(Emotion::Neutral); 40];
        let tracker = TrendTracker::with_cap(entries, 10);
        assert_eq!(tracker.entries().len(), 10);
    }
}
