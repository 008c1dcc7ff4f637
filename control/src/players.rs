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

//! Player-directed commands and bundle application

use crate::{BundleError, CommandError, ConsoleClient, ConsoleCommand};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use warden_directory::BundleItem;

static PLAYER_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\s+id=(\d+),\s+([^,]+),\s+pos=").unwrap());

type CommandResult = Result<String, CommandError>;

/// A player listed by `listplayers`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OnlinePlayer {
    /// Entity id
    pub id: u64,
    /// Display name
    pub name: String,
}

/// Pull player entries out of a `listplayers` reply
///
/// Entries look like `0. id=171, Revlin McAwesome, pos=(-933.9, 76.1, 1757.7), ...`;
/// other lines are skipped.
pub fn parse_player_list(reply: &str) -> Vec<OnlinePlayer> {
    reply
        .lines()
        .filter_map(|line| {
            let captures = PLAYER_ENTRY.captures(line)?;
            let id = captures.get(1)?.as_str().parse().ok()?;
            let name = captures.get(2)?.as_str().trim();
            (!name.is_empty()).then(|| OnlinePlayer {
                id,
                name: name.to_string(),
            })
        })
        .collect()
}

/// What happened to one bundle item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// The item as listed in the bundle
    pub item: BundleItem,
    /// Console reply, or why the give failed
    pub result: CommandResult,
}

impl ItemOutcome {
    /// Check if the give went through
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-item results of applying a bundle
///
/// A partially applied bundle is an ordinary outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    /// Bundle name
    pub bundle: String,
    /// Canonical name of the receiving player
    pub player: String,
    /// One entry per item, in bundle order
    pub outcomes: Vec<ItemOutcome>,
}

impl BundleReport {
    /// Number of items given successfully
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    /// Number of items in the bundle
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if every item was given
    pub fn is_complete(&self) -> bool {
        self.succeeded() == self.total()
    }

    /// Items that failed
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

impl ConsoleClient {
    async fn canonical(&self, name_or_alias: &str) -> String {
        self.directory().resolve_alias(name_or_alias).await
    }

    /// List the players currently online
    ///
    /// A reply with no recognisable entries gives an empty list.
    pub async fn list_players(&self) -> Result<Vec<OnlinePlayer>, CommandError> {
        let reply = self.send(&ConsoleCommand::ListPlayers).await?;
        let players = parse_player_list(&reply);
        debug!(count = players.len(), "Listed online players");
        Ok(players)
    }

    /// Give an item to a player or alias
    pub async fn give_item(
        &self,
        player: &str,
        item: &str,
        quantity: u32,
        quality: u32,
    ) -> CommandResult {
        let command = ConsoleCommand::Give {
            player: self.canonical(player).await,
            item: item.to_string(),
            quantity,
            quality,
        };
        self.send(&command).await
    }

    /// Spawn entities near a player or alias
    pub async fn spawn_entity(&self, player: &str, entity: &str, count: u32) -> CommandResult {
        let command = ConsoleCommand::SpawnEntity {
            player: self.canonical(player).await,
            entity: entity.to_string(),
            count,
        };
        self.send(&command).await
    }

    /// Teleport a player or alias to coordinates
    pub async fn teleport(&self, player: &str, x: i32, y: i32, z: i32) -> CommandResult {
        let command = ConsoleCommand::Teleport {
            player: self.canonical(player).await,
            x,
            y,
            z,
        };
        self.send(&command).await
    }

    /// Teleport a player to another player; both may be aliases
    pub async fn teleport_to_player(&self, player: &str, target: &str) -> CommandResult {
        let command = ConsoleCommand::TeleportToPlayer {
            player: self.canonical(player).await,
            target: self.canonical(target).await,
        };
        self.send(&command).await
    }

    /// Send a message to every player
    pub async fn broadcast(&self, message: &str) -> CommandResult {
        self.send(&ConsoleCommand::Say(message.to_string())).await
    }

    /// Send arbitrary operator text
    pub async fn raw(&self, command: &str) -> CommandResult {
        let command = ConsoleCommand::Raw(command.to_string());
        self.execute(&command.to_string(), self.config().raw_command_wait)
            .await
    }

    /// Give every item of a named bundle to a player or alias
    ///
    /// Each item is a separate `give`; failures are recorded per item and the rest of the
    /// bundle is still applied. Fails as a whole only when the bundle cannot be resolved
    /// or there is no connection to send on.
    pub async fn give_bundle(&self, player: &str, bundle: &str) -> Result<BundleReport, BundleError> {
        if !self.is_connected() {
            return Err(CommandError::NotConnected.into());
        }
        let Some(resolved) = self.directory().resolve_bundle(bundle).await? else {
            return Err(BundleError::NotFound(bundle.to_string()));
        };
        let player = self.canonical(player).await;
        info!(bundle = %resolved.name, player = %player, items = resolved.items.len(), "Applying bundle");

        let mut outcomes = Vec::with_capacity(resolved.items.len());
        for item in resolved.items {
            let command = ConsoleCommand::Give {
                player: player.clone(),
                item: item.item_name.clone(),
                quantity: item.quantity,
                quality: item.quality,
            };
            let result = self
                .execute(&command.to_string(), self.config().bundle_item_wait)
                .await;
            if let Err(err) = &result {
                warn!(item = %item.item_name, error = %err, "Bundle item failed");
            }
            outcomes.push(ItemOutcome { item, result });
        }

        let report = BundleReport {
            bundle: resolved.name,
            player,
            outcomes,
        };
        info!(
            succeeded = report.succeeded(),
            total = report.total(),
            "Bundle applied"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player_list() {
        let reply = "\
Executing command 'listplayers' by Telnet from 127.0.0.1:50000
0. id=171, Revlin McAwesome, pos=(-933.9, 76.1, 1757.7), rot=(0.0, 0.0, 0.0), remote=True
1. id=204, Bob, pos=(12.0, 40.0, -3.5), rot=(0.0, 0.0, 0.0), remote=True
Total of 2 in the game";
        assert_eq!(
            parse_player_list(reply),
            vec![
                OnlinePlayer {
                    id: 171,
                    name: "Revlin McAwesome".to_string()
                },
                OnlinePlayer {
                    id: 204,
                    name: "Bob".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_player_list_empty() {
        assert!(parse_player_list("Total of 0 in the game").is_empty());
        assert!(parse_player_list("").is_empty());
    }

    #[test]
    fn test_bundle_report_counts() {
        let outcome = |name: &str, result: CommandResult| ItemOutcome {
            item: BundleItem::new(name, 1, 1),
            result,
        };
        let report = BundleReport {
            bundle: "starter".to_string(),
            player: "Bob".to_string(),
            outcomes: vec![
                outcome("medicalBandage", Ok("ok".to_string())),
                outcome("bogus", Err(CommandError::Remote("ERR: unknown item".to_string()))),
                outcome("canBeef", Ok("ok".to_string())),
            ],
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.total(), 3);
        assert!(!report.is_complete());
        assert_eq!(report.failures().count(), 1);
    }
}
