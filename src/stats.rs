use serde::{Deserialize, Serialize};

use crate::game::types::GameOutcome;
use crate::storage::PersistenceError;

/// Cumulative win/loss counters for one account.
///
/// `games_played == wins + losses` holds after every [`UserStats::record`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(rename = "games")]
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
}

impl UserStats {
    pub fn record(&mut self, outcome: GameOutcome) {
        self.games_played += 1;
        match outcome {
            GameOutcome::Win => self.wins += 1,
            GameOutcome::Loss => self.losses += 1,
        }
    }

    /// Percentage of games won, 0 before the first game.
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.games_played) * 100.0
        }
    }

    pub fn is_consistent(&self) -> bool {
        u64::from(self.games_played) == u64::from(self.wins) + u64::from(self.losses)
    }
}

/// Sink for finished games.
///
/// Implementations update the counters of `user` and persist them before
/// returning; on error the previously stored counters remain visible.
pub trait StatsRecorder {
    fn record_outcome(&self, user: &str, outcome: GameOutcome) -> Result<UserStats, PersistenceError>;

    /// Current counters of `user`, `None` for an unknown account.
    fn stats(&self, user: &str) -> Option<UserStats>;
}

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub login: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

/// Rank accounts by wins, most first. Equal wins keep input order.
pub fn leaderboard<'a, I>(entries: I) -> Vec<LeaderboardRow>
where
    I: IntoIterator<Item = (&'a str, UserStats)>,
{
    let mut rows: Vec<LeaderboardRow> = entries
        .into_iter()
        .map(|(login, stats)| LeaderboardRow {
            login: login.to_string(),
            games: stats.games_played,
            wins: stats.wins,
            losses: stats.losses,
            win_rate: stats.win_rate(),
        })
        .collect();
    rows.sort_by(|a, b| b.wins.cmp(&a.wins));
    rows
}
