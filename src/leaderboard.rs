//! Best-score tables
//!
//! One entry per player holding their best score, sorted descending. The
//! global table keeps the top 10; per-level tables are unbounded.

use serde::{Deserialize, Serialize};

/// Maximum number of entries in the global leaderboard
pub const MAX_LEADERBOARD_ENTRIES: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u64,
    /// Unix timestamp (ms) of the best score
    pub timestamp: f64,
}

/// Leaderboard, stored as a plain JSON array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Storage key of the global leaderboard
    pub const GLOBAL_KEY: &'static str = "leaderboard";

    /// Storage key of the leaderboard for one level
    pub fn level_key(level: u8) -> String {
        format!("leaderboard_level{level}")
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Record `score` for `username`, keeping only their best. Re-sorts and
    /// trims to `limit` entries when one is given.
    pub fn record(&mut self, username: &str, score: u64, timestamp: f64, limit: Option<usize>) {
        match self.entries.iter_mut().find(|e| e.username == username) {
            Some(entry) => {
                if score > entry.score {
                    entry.score = score;
                    entry.timestamp = timestamp;
                }
            }
            None => self.entries.push(LeaderboardEntry {
                username: username.to_string(),
                score,
                timestamp,
            }),
        }

        // Stable sort keeps earlier entries ahead on ties
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        if let Some(limit) = limit {
            self.entries.truncate(limit);
        }
    }

    /// 1-based position of `username`
    pub fn rank(&self, username: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.username == username)
            .map(|i| i + 1)
    }

    /// Whether `score` would make it onto a table capped at `limit`
    pub fn qualifies(&self, score: u64, limit: usize) -> bool {
        if self.entries.len() < limit {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_score_per_player() {
        let mut board = Leaderboard::new();
        board.record("ann", 50, 1.0, None);
        board.record("bob", 80, 2.0, None);
        board.record("ann", 30, 3.0, None);
        assert_eq!(board.len(), 2);
        assert_eq!(board.entries[1].score, 50);
        assert_eq!(board.entries[1].timestamp, 1.0);

        board.record("ann", 90, 4.0, None);
        assert_eq!(board.rank("ann"), Some(1));
        assert_eq!(board.rank("bob"), Some(2));
        assert_eq!(board.rank("cid"), None);
        assert_eq!(board.top_score(), Some(90));
    }

    #[test]
    fn test_global_limit() {
        let mut board = Leaderboard::new();
        for i in 0..15u64 {
            board.record(&format!("p{i}"), i * 10, 0.0, Some(MAX_LEADERBOARD_ENTRIES));
        }
        assert_eq!(board.len(), MAX_LEADERBOARD_ENTRIES);
        assert_eq!(board.top_score(), Some(140));
        assert_eq!(board.entries.last().map(|e| e.score), Some(50));
        assert!(!board.qualifies(50, MAX_LEADERBOARD_ENTRIES));
        assert!(board.qualifies(51, MAX_LEADERBOARD_ENTRIES));
        assert!(board.rank("p0").is_none());
    }

    #[test]
    fn test_stored_as_array() {
        let mut board = Leaderboard::new();
        board.record("ann", 10, 5.0, None);
        let json = serde_json::to_string(&board).unwrap();
        assert!(json.starts_with('['));
        let back: Leaderboard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
        assert_eq!(Leaderboard::level_key(2), "leaderboard_level2");
    }
}
