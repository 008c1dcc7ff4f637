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

//! Events raised from the console's unsolicited output

use std::fmt;
use std::time::Duration;

/// Something the server reported on its own, outside any command reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// A player joined
    Login {
        /// Canonical player name
        player: String,
    },
    /// A player left; `duration` is set when the matching login was seen
    Logout {
        /// Canonical player name
        player: String,
        /// Time between the observed login and this logout
        duration: Option<Duration>,
    },
    /// A chat message
    Chat {
        /// Speaker name as printed by the server
        speaker: String,
        /// Message text
        message: String,
    },
    /// A raw console line, only published in verbose mode
    Raw(String),
}

impl ConsoleEvent {
    /// The player the event is about, if any
    pub fn player(&self) -> Option<&str> {
        match self {
            ConsoleEvent::Login { player } | ConsoleEvent::Logout { player, .. } => Some(player),
            ConsoleEvent::Chat { speaker, .. } => Some(speaker),
            ConsoleEvent::Raw(_) => None,
        }
    }
}

impl fmt::Display for ConsoleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleEvent::Login { player } => write!(f, "{} joined the server", player),
            ConsoleEvent::Logout {
                player,
                duration: Some(duration),
            } => write!(
                f,
                "{} left the server (played for {})",
                player,
                format_duration(*duration)
            ),
            ConsoleEvent::Logout { player, .. } => write!(f, "{} left the server", player),
            ConsoleEvent::Chat { speaker, message } => write!(f, "{}: {}", speaker, message),
            ConsoleEvent::Raw(line) => write!(f, "{}", line),
        }
    }
}

/// Render a play duration as `1h 2m 3s`, `2m 3s` or `3s`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
