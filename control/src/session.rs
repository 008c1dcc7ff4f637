//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Open play sessions, keyed by canonical player name

use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tokio::time::Instant;
use tracing::debug;

/// One play session as seen by the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Canonical player name
    pub player: String,
    /// Wall-clock login time, handed to the directory
    pub login_at: SystemTime,
    /// Wall-clock logout time, absent while the session is open
    pub logout_at: Option<SystemTime>,
    /// Elapsed play time, set when the session closes
    pub duration: Option<Duration>,
    started: Instant,
}

impl Session {
    fn open(player: &str) -> Self {
        Self {
            player: player.to_string(),
            login_at: SystemTime::now(),
            logout_at: None,
            duration: None,
            started: Instant::now(),
        }
    }

    /// Check if the session is still open
    pub fn is_open(&self) -> bool {
        self.logout_at.is_none()
    }

    /// Time played so far
    pub fn elapsed(&self) -> Duration {
        self.duration.unwrap_or_else(|| self.started.elapsed())
    }
}

/// Open sessions awaiting their logout
///
/// Durations come from the runtime's monotonic clock, so they are immune to wall-clock
/// jumps. A second login for a player who is already open restarts the session.
#[derive(Debug, Default)]
pub struct SessionTracker {
    open: HashMap<String, Session>,
}

impl SessionTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session and return a copy of it
    pub fn open(&mut self, player: &str) -> Session {
        let session = Session::open(player);
        if self.open.insert(player.to_string(), session.clone()).is_some() {
            debug!(player, "Session restarted by repeated login");
        }
        session
    }

    /// Close the player's session, if one is open
    pub fn close(&mut self, player: &str) -> Option<Session> {
        let mut session = self.open.remove(player)?;
        session.duration = Some(session.started.elapsed());
        session.logout_at = Some(SystemTime::now());
        Some(session)
    }

    /// Check if the player has an open session
    pub fn contains(&self, player: &str) -> bool {
        self.open.contains_key(player)
    }

    /// Names of all players with open sessions, sorted
    pub fn players(&self) -> Vec<String> {
        let mut players: Vec<String> = self.open.keys().cloned().collect();
        players.sort();
        players
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Check if no sessions are open
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Forget all open sessions
    pub fn clear(&mut self) {
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_open_close_measures_elapsed() {
        let mut tracker = SessionTracker::new();
        tracker.open("Alice");
        assert!(tracker.contains("Alice"));

        tokio::time::advance(Duration::from_secs(90)).await;

        let session = tracker.close("Alice").unwrap();
        assert_eq!(session.duration, Some(Duration::from_secs(90)));
        assert!(!session.is_open());
        assert!(!tracker.contains("Alice"));
        assert!(tracker.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_login_restarts_session() {
        let mut tracker = SessionTracker::new();
        tracker.open("Bob");
        tokio::time::advance(Duration::from_secs(60)).await;
        tracker.open("Bob");
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(tracker.len(), 1);
        let session = tracker.close("Bob").unwrap();
        assert_eq!(session.duration, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_close_unknown_player() {
        let mut tracker = SessionTracker::new();
        assert!(tracker.close("Nobody").is_none());
    }

    #[tokio::test]
    async fn test_players_sorted() {
        let mut tracker = SessionTracker::new();
        tracker.open("zed");
        tracker.open("Alice");
        tracker.open("bob");
        assert_eq!(tracker.players(), vec!["Alice", "bob", "zed"]);
        tracker.clear();
        assert!(tracker.is_empty());
    }
}
