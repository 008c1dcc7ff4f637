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

//! In-memory directory implementation

use crate::{Bundle, BundleItem, DirectoryError, PlayerDirectory, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// An alias and the player it stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    /// Short name typed by the operator
    pub alias: String,
    /// Canonical player name
    pub full_name: String,
}

/// Bundle listing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    /// Bundle name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Number of distinct items
    pub item_count: usize,
}

/// One persisted play session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// When the login was observed
    pub login_at: SystemTime,
    /// When the logout was observed, `None` while the session is open
    pub logout_at: Option<SystemTime>,
    /// Whole seconds played, set on logout
    pub duration_secs: Option<u64>,
}

/// Aggregate playtime for one player, over closed sessions only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    /// Number of completed sessions
    pub total_sessions: usize,
    /// Sum of session durations
    pub total_playtime: Duration,
    /// Mean session duration
    pub average_session: Duration,
    /// Most recent login among completed sessions
    pub last_seen: SystemTime,
}

/// Directory backed by concurrent in-process maps
///
/// Aliases are unique in both directions: a player has at most one alias, and adding
/// a new alias for a player replaces the old one.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    aliases: DashMap<String, String>,
    bundles: DashMap<String, Bundle>,
    sessions: DashMap<String, Vec<SessionRecord>>,
}

impl MemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the alias for a player
    pub fn add_alias(&self, full_name: &str, alias: &str) -> Result<()> {
        if let Some(existing) = self.aliases.get(alias) {
            if existing.value().as_str() != full_name {
                return Err(DirectoryError::AliasTaken {
                    alias: alias.to_string(),
                    full_name: existing.value().clone(),
                });
            }
        }
        self.aliases.retain(|_, name| name.as_str() != full_name);
        self.aliases.insert(alias.to_string(), full_name.to_string());
        debug!(alias, full_name, "Alias added");
        Ok(())
    }

    /// Remove an alias
    pub fn remove_alias(&self, alias: &str) -> Result<()> {
        self.aliases
            .remove(alias)
            .map(|_| ())
            .ok_or_else(|| DirectoryError::AliasNotFound(alias.to_string()))
    }

    /// All aliases, sorted by alias
    pub fn list_aliases(&self) -> Vec<AliasEntry> {
        let mut entries: Vec<AliasEntry> = self
            .aliases
            .iter()
            .map(|entry| AliasEntry {
                alias: entry.key().clone(),
                full_name: entry.value().clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.alias.cmp(&b.alias));
        entries
    }

    /// Create an empty bundle
    pub fn create_bundle(&self, name: &str, description: &str) -> Result<()> {
        match self.bundles.entry(name.to_string()) {
            Entry::Occupied(_) => Err(DirectoryError::BundleExists(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Bundle {
                    name: name.to_string(),
                    description: description.to_string(),
                    items: Vec::new(),
                });
                Ok(())
            }
        }
    }

    /// Add an item to a bundle, replacing quantity and quality if it is already there
    pub fn add_item(&self, bundle: &str, item_name: &str, quantity: u32, quality: u32) -> Result<()> {
        let mut entry = self
            .bundles
            .get_mut(bundle)
            .ok_or_else(|| DirectoryError::BundleNotFound(bundle.to_string()))?;
        match entry.items.iter_mut().find(|item| item.item_name == item_name) {
            Some(item) => {
                item.quantity = quantity;
                item.quality = quality;
            }
            None => entry.items.push(BundleItem::new(item_name, quantity, quality)),
        }
        Ok(())
    }

    /// Remove an item from a bundle
    pub fn remove_item(&self, bundle: &str, item_name: &str) -> Result<()> {
        let mut entry = self
            .bundles
            .get_mut(bundle)
            .ok_or_else(|| DirectoryError::BundleNotFound(bundle.to_string()))?;
        let before = entry.items.len();
        entry.items.retain(|item| item.item_name != item_name);
        if entry.items.len() == before {
            return Err(DirectoryError::ItemNotFound {
                bundle: bundle.to_string(),
                item: item_name.to_string(),
            });
        }
        Ok(())
    }

    /// Delete a bundle and its items
    pub fn delete_bundle(&self, name: &str) -> Result<()> {
        self.bundles
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DirectoryError::BundleNotFound(name.to_string()))
    }

    /// Look up a bundle by name
    pub fn bundle(&self, name: &str) -> Option<Bundle> {
        self.bundles.get(name).map(|bundle| bundle.clone())
    }

    /// All bundles, sorted by name
    pub fn list_bundles(&self) -> Vec<BundleSummary> {
        let mut rows: Vec<BundleSummary> = self
            .bundles
            .iter()
            .map(|bundle| BundleSummary {
                name: bundle.name.clone(),
                description: bundle.description.clone(),
                item_count: bundle.items.len(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Every session recorded for a player, oldest first
    pub fn sessions(&self, player: &str) -> Vec<SessionRecord> {
        self.sessions
            .get(player)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Playtime statistics over completed sessions, `None` if there are none
    pub fn player_stats(&self, player: &str) -> Option<PlayerStats> {
        let records = self.sessions.get(player)?;
        let closed: Vec<&SessionRecord> = records
            .iter()
            .filter(|record| record.logout_at.is_some())
            .collect();
        if closed.is_empty() {
            return None;
        }
        let total_secs: u64 = closed.iter().filter_map(|r| r.duration_secs).sum();
        let last_seen = closed.iter().map(|r| r.login_at).max()?;
        Some(PlayerStats {
            total_sessions: closed.len(),
            total_playtime: Duration::from_secs(total_secs),
            average_session: Duration::from_secs(total_secs / closed.len() as u64),
            last_seen,
        })
    }
}

#[async_trait]
impl PlayerDirectory for MemoryDirectory {
    async fn resolve_alias(&self, name_or_alias: &str) -> String {
        self.aliases
            .get(name_or_alias)
            .map(|full_name| full_name.clone())
            .unwrap_or_else(|| name_or_alias.to_string())
    }

    async fn record_login(&self, player: &str, at: SystemTime) -> Result<()> {
        self.sessions
            .entry(player.to_string())
            .or_default()
            .push(SessionRecord {
                login_at: at,
                logout_at: None,
                duration_secs: None,
            });
        Ok(())
    }

    async fn record_logout(&self, player: &str, at: SystemTime, duration: Duration) -> Result<()> {
        let Some(mut records) = self.sessions.get_mut(player) else {
            debug!(player, "Logout recorded with no session on file");
            return Ok(());
        };
        let open = records
            .iter_mut()
            .filter(|record| record.logout_at.is_none())
            .max_by_key(|record| record.login_at);
        match open {
            Some(record) => {
                record.logout_at = Some(at);
                record.duration_secs = Some(duration.as_secs());
            }
            None => debug!(player, "Logout recorded with no open session"),
        }
        Ok(())
    }

    async fn resolve_bundle(&self, bundle: &str) -> Result<Option<Bundle>> {
        Ok(self.bundle(bundle))
    }
}
