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

//! Game clock queries and the day-regression guard

use crate::{CommandError, ConsoleClient, ConsoleCommand, SetTimeError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::{debug, info, warn};

static GAME_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Day\s+(\d+),\s+(\d+):(\d+)").unwrap());

/// Hour used when only a day is given
pub const DEFAULT_HOUR: u32 = 8;
/// Minute used when only a day is given
pub const DEFAULT_MINUTE: u32 = 0;

/// In-game day and time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameClock {
    /// Game day, counting from 1
    pub day: u32,
    /// Hour, 0-23
    pub hour: u32,
    /// Minute, 0-59
    pub minute: u32,
}

impl GameClock {
    /// Build a validated clock value
    pub fn new(day: u32, hour: u32, minute: u32) -> Result<Self, SetTimeError> {
        if day < 1 {
            return Err(SetTimeError::InvalidDay(day));
        }
        if hour > 23 {
            return Err(SetTimeError::InvalidHour(hour));
        }
        if minute > 59 {
            return Err(SetTimeError::InvalidMinute(minute));
        }
        Ok(Self { day, hour, minute })
    }

    /// 08:00 on the given day
    pub fn morning(day: u32) -> Result<Self, SetTimeError> {
        Self::new(day, DEFAULT_HOUR, DEFAULT_MINUTE)
    }

    /// Find a `Day <n>, <hh>:<mm>` reading anywhere in console output
    ///
    /// ```
    /// use warden_control::GameClock;
    ///
    /// let clock = GameClock::parse("Day 7, 14:23").unwrap();
    /// assert_eq!((clock.day, clock.hour, clock.minute), (7, 14, 23));
    /// assert_eq!(GameClock::parse("Unknown command"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let captures = GAME_TIME.captures(text)?;
        let field = |index| captures.get(index)?.as_str().parse::<u32>().ok();
        Some(Self {
            day: field(1)?,
            hour: field(2)?,
            minute: field(3)?,
        })
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}, {:02}:{:02}", self.day, self.hour, self.minute)
    }
}

/// Decide whether moving to `target` is allowed
///
/// Without `force` the current day must be known and must not be later than the target.
pub fn check_time_change(
    current_day: Option<u32>,
    target: &GameClock,
    force: bool,
) -> Result<(), SetTimeError> {
    if force {
        return Ok(());
    }
    match current_day {
        None => Err(SetTimeError::UnknownCurrentDay),
        Some(current) if target.day < current => Err(SetTimeError::Backwards {
            current,
            target: target.day,
        }),
        Some(_) => Ok(()),
    }
}

impl ConsoleClient {
    /// Query the game clock
    ///
    /// Event classification is paused while the query owns the console, so the reply
    /// sees every line. Returns `None` when the query fails or the reply holds no time
    /// reading.
    pub async fn current_time(&self) -> Option<GameClock> {
        let reply = match self
            .execute_paused(
                &ConsoleCommand::GetTime.to_string(),
                self.config().time_query_wait,
            )
            .await
        {
            Ok(reply) | Err(CommandError::Remote(reply)) => reply,
            Err(err) => {
                debug!(error = %err, "Game time query failed");
                return None;
            }
        };
        let clock = GameClock::parse(&reply);
        if clock.is_none() {
            debug!(reply = %reply, "No game time in reply");
        }
        clock
    }

    /// Query the current game day
    pub async fn current_day(&self) -> Option<u32> {
        self.current_time().await.map(|clock| clock.day)
    }

    /// Set the game day and time, refusing to move the day backwards unless `force` is set
    ///
    /// Ranges are checked before anything is sent. On success returns a confirmation
    /// such as `Time set to Day 7, 08:00`.
    pub async fn set_day_and_time(
        &self,
        day: u32,
        hour: u32,
        minute: u32,
        force: bool,
    ) -> Result<String, SetTimeError> {
        let target = GameClock::new(day, hour, minute)?;
        let current = self.current_day().await;
        check_time_change(current, &target, force)?;
        if force && current.is_none_or(|current| target.day < current) {
            warn!(?current, target = %target, "Forcing game time change");
        }

        self.send(&ConsoleCommand::SetTime {
            day: target.day,
            hour: target.hour,
            minute: target.minute,
        })
        .await?;
        info!(target = %target, "Game time changed");
        Ok(format!("Time set to {}", target))
    }

    /// Set the game day, at 08:00
    pub async fn set_day(&self, day: u32, force: bool) -> Result<String, SetTimeError> {
        let target = GameClock::morning(day)?;
        self.set_day_and_time(target.day, target.hour, target.minute, force)
            .await
    }
}
