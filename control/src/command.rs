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

//! Outbound console commands

use std::borrow::Cow;
use std::fmt;

/// A command line understood by the admin console
///
/// `Display` renders the exact text sent to the server. Player names are expected to be
/// canonical already; names containing whitespace are quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `listplayers`
    ListPlayers,
    /// `give <player> <item> <quantity> <quality>`
    Give {
        /// Receiving player
        player: String,
        /// Item name, e.g. `medicalBandage`
        item: String,
        /// Stack size
        quantity: u32,
        /// Item quality
        quality: u32,
    },
    /// `spawnentity <player> <entity> <count>`
    SpawnEntity {
        /// Player to spawn near
        player: String,
        /// Entity name, e.g. `zombieSteve`
        entity: String,
        /// How many to spawn
        count: u32,
    },
    /// `tele <player> <x> <y> <z>`
    Teleport {
        /// Player to move
        player: String,
        /// East-west coordinate
        x: i32,
        /// Height
        y: i32,
        /// North-south coordinate
        z: i32,
    },
    /// `teleportplayer <player> <target>`
    TeleportToPlayer {
        /// Player to move
        player: String,
        /// Player to move them to
        target: String,
    },
    /// `say "<message>"`
    Say(String),
    /// `gettime`
    GetTime,
    /// `settime <day> <hour> <minute>`
    SetTime {
        /// Game day, 1 or greater
        day: u32,
        /// Hour, 0-23
        hour: u32,
        /// Minute, 0-59
        minute: u32,
    },
    /// Arbitrary operator text, sent as-is
    Raw(String),
}

impl ConsoleCommand {
    /// The console verb
    pub fn verb(&self) -> &str {
        match self {
            ConsoleCommand::ListPlayers => "listplayers",
            ConsoleCommand::Give { .. } => "give",
            ConsoleCommand::SpawnEntity { .. } => "spawnentity",
            ConsoleCommand::Teleport { .. } => "tele",
            ConsoleCommand::TeleportToPlayer { .. } => "teleportplayer",
            ConsoleCommand::Say(_) => "say",
            ConsoleCommand::GetTime => "gettime",
            ConsoleCommand::SetTime { .. } => "settime",
            ConsoleCommand::Raw(text) => text.split_whitespace().next().unwrap_or_default(),
        }
    }

    /// Check if the command changes server state
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            ConsoleCommand::ListPlayers | ConsoleCommand::GetTime
        )
    }
}

/// Quote a player name for the console if it contains whitespace
pub fn quote_name(name: &str) -> Cow<'_, str> {
    if name.chars().any(char::is_whitespace) {
        Cow::Owned(format!("\"{}\"", name))
    } else {
        Cow::Borrowed(name)
    }
}

impl fmt::Display for ConsoleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleCommand::ListPlayers | ConsoleCommand::GetTime => f.write_str(self.verb()),
            ConsoleCommand::Give {
                player,
                item,
                quantity,
                quality,
            } => write!(
                f,
                "give {} {} {} {}",
                quote_name(player),
                item,
                quantity,
                quality
            ),
            ConsoleCommand::SpawnEntity {
                player,
                entity,
                count,
            } => write!(f, "spawnentity {} {} {}", quote_name(player), entity, count),
            ConsoleCommand::Teleport { player, x, y, z } => {
                write!(f, "tele {} {} {} {}", quote_name(player), x, y, z)
            }
            ConsoleCommand::TeleportToPlayer { player, target } => write!(
                f,
                "teleportplayer {} {}",
                quote_name(player),
                quote_name(target)
            ),
            // The console has no escape for a quote inside the message.
            ConsoleCommand::Say(message) => write!(f, "say \"{}\"", message.replace('"', "'")),
            ConsoleCommand::SetTime { day, hour, minute } => {
                write!(f, "settime {} {} {}", day, hour, minute)
            }
            ConsoleCommand::Raw(text) => f.write_str(text.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("Alice"), "Alice");
        assert_eq!(quote_name("Revlin McAwesome"), "\"Revlin McAwesome\"");
    }

    #[test]
    fn test_command_text() {
        let give = ConsoleCommand::Give {
            player: "Revlin McAwesome".to_string(),
            item: "steelArrow".to_string(),
            quantity: 100,
            quality: 6,
        };
        assert_eq!(give.to_string(), "give \"Revlin McAwesome\" steelArrow 100 6");

        let spawn = ConsoleCommand::SpawnEntity {
            player: "Bob".to_string(),
            entity: "zombieSteve".to_string(),
            count: 3,
        };
        assert_eq!(spawn.to_string(), "spawnentity Bob zombieSteve 3");

        let tele = ConsoleCommand::Teleport {
            player: "Bob".to_string(),
            x: -933,
            y: 76,
            z: 1757,
        };
        assert_eq!(tele.to_string(), "tele Bob -933 76 1757");

        let follow = ConsoleCommand::TeleportToPlayer {
            player: "Bob".to_string(),
            target: "Revlin McAwesome".to_string(),
        };
        assert_eq!(follow.to_string(), "teleportplayer Bob \"Revlin McAwesome\"");

        assert_eq!(ConsoleCommand::ListPlayers.to_string(), "listplayers");
        assert_eq!(ConsoleCommand::GetTime.to_string(), "gettime");
        assert_eq!(
            ConsoleCommand::SetTime {
                day: 7,
                hour: 8,
                minute: 0
            }
            .to_string(),
            "settime 7 8 0"
        );
    }

    #[test]
    fn test_say_replaces_quotes() {
        let say = ConsoleCommand::Say("Restart in \"5\" minutes".to_string());
        assert_eq!(say.to_string(), "say \"Restart in '5' minutes\"");
    }

    #[test]
    fn test_raw_and_verbs() {
        let raw = ConsoleCommand::Raw("  kick Mallory griefing ".to_string());
        assert_eq!(raw.to_string(), "kick Mallory griefing");
        assert_eq!(raw.verb(), "kick");
        assert!(raw.is_mutating());
        assert!(!ConsoleCommand::GetTime.is_mutating());
        assert_eq!(ConsoleCommand::Say(String::new()).verb(), "say");
    }
}
