//! Player profiles and leaderboards on top of a key-value store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{KeyValueStore, ProgressSink, StorageError, load_json, save_json};
use crate::leaderboard::{Leaderboard, MAX_LEADERBOARD_ENTRIES};
use crate::platform;

/// One finished level session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Unix timestamp (ms)
    pub timestamp: f64,
    pub level_scores: BTreeMap<u8, u64>,
    pub total_score: u64,
}

/// Everything stored about one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub username: String,
    #[serde(default)]
    pub games: Vec<GameRecord>,
    #[serde(default)]
    pub high_score: u64,
    #[serde(default = "first_level")]
    pub levels_unlocked: u8,
    #[serde(default)]
    pub total_games_played: usize,
    #[serde(default)]
    pub average_score: u64,
}

fn first_level() -> u8 {
    1
}

impl PlayerProfile {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            games: Vec::new(),
            high_score: 0,
            levels_unlocked: 1,
            total_games_played: 0,
            average_score: 0,
        }
    }

    /// Append a session and refresh the derived stats
    pub fn add_game(&mut self, record: GameRecord) {
        self.high_score = self.high_score.max(record.total_score);
        self.games.push(record);
        self.total_games_played = self.games.len();
        let sum: u64 = self.games.iter().map(|g| g.total_score).sum();
        self.average_score = (sum as f64 / self.games.len() as f64).round() as u64;
    }
}

/// Player records and leaderboards persisted in `S`
#[derive(Debug, Clone)]
pub struct ProfileStore<S> {
    store: S,
    clock: fn() -> f64,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: platform::now_ms,
        }
    }

    /// Use a custom timestamp source
    pub fn with_clock(mut self, clock: fn() -> f64) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn profile_key(username: &str) -> String {
        format!("gameData_{username}")
    }

    /// Stored profile, or a fresh one when absent or unreadable
    pub fn profile(&self, username: &str) -> PlayerProfile {
        match load_json(&self.store, &Self::profile_key(username)) {
            Ok(Some(profile)) => profile,
            Ok(None) => PlayerProfile::new(username),
            Err(e) => {
                log::warn!("Profile for {username} is unreadable, starting fresh: {e}");
                PlayerProfile::new(username)
            }
        }
    }

    pub fn save_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError> {
        save_json(&self.store, &Self::profile_key(&profile.username), profile)
    }

    fn board(&self, key: &str) -> Leaderboard {
        load_json(&self.store, key)
            .unwrap_or_else(|e| {
                log::warn!("Leaderboard {key} is unreadable, starting fresh: {e}");
                None
            })
            .unwrap_or_default()
    }

    pub fn leaderboard(&self) -> Leaderboard {
        self.board(Leaderboard::GLOBAL_KEY)
    }

    pub fn level_leaderboard(&self, level: u8) -> Leaderboard {
        self.board(&Leaderboard::level_key(level))
    }

    /// 1-based place on the global leaderboard
    pub fn player_rank(&self, username: &str) -> Option<usize> {
        self.leaderboard().rank(username)
    }

    pub fn unlocked_levels(&self, username: &str) -> u8 {
        self.profile(username).levels_unlocked
    }

    /// Record a session in the profile and every affected leaderboard
    pub fn record_session(
        &self,
        username: &str,
        level_scores: &BTreeMap<u8, u64>,
        total: u64,
    ) -> Result<PlayerProfile, StorageError> {
        let now = (self.clock)();
        let mut profile = self.profile(username);
        profile.add_game(GameRecord {
            timestamp: now,
            level_scores: level_scores.clone(),
            total_score: total,
        });
        self.save_profile(&profile)?;

        let mut global = self.leaderboard();
        if global.qualifies(total, MAX_LEADERBOARD_ENTRIES) {
            log::info!("{username} placed on the leaderboard with {total}");
        }
        global.record(username, total, now, Some(MAX_LEADERBOARD_ENTRIES));
        save_json(&self.store, Leaderboard::GLOBAL_KEY, &global)?;

        for (&level, &score) in level_scores {
            let key = Leaderboard::level_key(level);
            let mut board = self.board(&key);
            board.record(username, score, now, None);
            save_json(&self.store, &key, &board)?;
        }
        Ok(profile)
    }

    /// Raise the player's unlocked level; never lowers it
    pub fn raise_unlocked(&self, username: &str, level: u8) -> Result<bool, StorageError> {
        let mut profile = self.profile(username);
        if level <= profile.levels_unlocked {
            return Ok(false);
        }
        profile.levels_unlocked = level;
        self.save_profile(&profile)?;
        Ok(true)
    }
}

impl<S: KeyValueStore> ProgressSink for ProfileStore<S> {
    fn save_session(&mut self, player: &str, level_scores: &BTreeMap<u8, u64>, total: u64) {
        match self.record_session(player, level_scores, total) {
            Ok(profile) => log::info!(
                "Saved session for {player}: total {total}, {} games played",
                profile.total_games_played
            ),
            Err(e) => log::warn!("Could not save session for {player}: {e}"),
        }
    }

    fn unlock_level(&mut self, player: &str, level: u8) {
        match self.raise_unlocked(player, level) {
            Ok(true) => log::info!("Unlocked level {level} for {player}"),
            Ok(false) => {}
            Err(e) => log::warn!("Could not unlock level {level} for {player}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn store() -> ProfileStore<MemoryStore> {
        ProfileStore::new(MemoryStore::new()).with_clock(|| 1_000.0)
    }

    fn scores(level: u8, score: u64) -> BTreeMap<u8, u64> {
        BTreeMap::from([(level, score)])
    }

    #[test]
    fn test_fresh_profile() {
        let profiles = store();
        let profile = profiles.profile("ann");
        assert_eq!(profile, PlayerProfile::new("ann"));
        assert_eq!(profile.levels_unlocked, 1);
        assert!(profiles.store().is_empty());
    }

    #[test]
    fn test_sessions_update_stats_and_boards() {
        let mut profiles = store();
        profiles.save_session("ann", &scores(1, 60), 60);
        profiles.save_session("ann", &scores(1, 40), 45);
        profiles.save_session("bob", &scores(2, 100), 100);

        let ann = profiles.profile("ann");
        assert_eq!(ann.total_games_played, 2);
        assert_eq!(ann.high_score, 60);
        // (60 + 45) / 2 = 52.5 rounds up
        assert_eq!(ann.average_score, 53);

        assert_eq!(profiles.player_rank("bob"), Some(1));
        assert_eq!(profiles.player_rank("ann"), Some(2));
        assert_eq!(profiles.leaderboard().entries[1].score, 60);

        assert_eq!(profiles.level_leaderboard(1).top_score(), Some(60));
        assert_eq!(profiles.level_leaderboard(2).rank("bob"), Some(1));
        assert!(profiles.level_leaderboard(3).is_empty());

        let keys = profiles.store().keys();
        assert!(keys.contains(&"gameData_ann".to_string()));
        assert!(keys.contains(&"leaderboard_level1".to_string()));
    }

    #[test]
    fn test_unlock_never_lowers() {
        let mut profiles = store();
        profiles.unlock_level("ann", 3);
        assert_eq!(profiles.unlocked_levels("ann"), 3);
        profiles.unlock_level("ann", 2);
        assert_eq!(profiles.unlocked_levels("ann"), 3);
    }

    #[test]
    fn test_corrupt_profile_starts_fresh() {
        let mut profiles = store();
        profiles.store().set("gameData_ann", "not json").unwrap();
        assert_eq!(profiles.profile("ann").games.len(), 0);
        profiles.save_session("ann", &scores(1, 10), 10);
        assert_eq!(profiles.profile("ann").games.len(), 1);
    }
}
