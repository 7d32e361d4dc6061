//! High score leaderboard system
//!
//! Persisted through the key-value store, tracks the top 10 finished games
//! plus a pointer to the most recent one.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Store key for the leaderboard record
pub const HIGH_SCORES_KEY: &str = "broadside_highscores";

/// Current leaderboard record format
pub const HIGH_SCORES_VERSION: u32 = 1;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player name
    #[serde(default)]
    pub name: String,
    /// Final score
    #[serde(default)]
    pub score: u64,
    /// Unix timestamp (ms) when achieved
    #[serde(default)]
    pub date: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighScores {
    pub version: u32,
    pub entries: Vec<HighScoreEntry>,
    /// Most recently finished game, whether or not it placed
    pub last_game: Option<HighScoreEntry>,
}

impl Default for HighScores {
    fn default() -> Self {
        Self::new()
    }
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            version: HIGH_SCORES_VERSION,
            entries: Vec::new(),
            last_game: None,
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Record a finished game. Always updates `last_game`; returns the rank
    /// achieved (1-indexed) or None if it didn't place
    pub fn add_score(&mut self, name: &str, score: u64, date: u64) -> Option<usize> {
        let entry = HighScoreEntry {
            name: name.to_string(),
            score,
            date,
        };
        self.last_game = Some(entry.clone());

        if !self.qualifies(score) {
            return None;
        }

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Restore ordering and size invariants on loaded data
    fn sanitized(mut self) -> Self {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
        self
    }

    /// Load high scores from the store, starting fresh on missing or corrupt data
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(HIGH_SCORES_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<HighScores>(&json) {
                Ok(scores) if scores.version == HIGH_SCORES_VERSION => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    return scores.sanitized();
                }
                Ok(scores) => log::warn!("High scores version {} unsupported", scores.version),
                Err(e) => log::warn!("Corrupt high scores: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Failed to read high scores: {}", e),
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to the store
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(HIGH_SCORES_KEY, &json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}
