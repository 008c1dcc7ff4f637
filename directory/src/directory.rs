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

//! The directory trait consumed by the control channel

use crate::Result;
use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// One entry of an item bundle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleItem {
    /// Item identifier as the server knows it (e.g. `steelArrow`)
    pub item_name: String,
    /// Stack size to give
    pub quantity: u32,
    /// Item quality/level
    pub quality: u32,
}

impl BundleItem {
    /// Create a bundle entry
    pub fn new(item_name: impl Into<String>, quantity: u32, quality: u32) -> Self {
        Self {
            item_name: item_name.into(),
            quantity,
            quality,
        }
    }
}

/// A named list of items handed out together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// Bundle name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Items in insertion order
    pub items: Vec<BundleItem>,
}

/// Lookup and persistence hooks used by the console control channel
///
/// All methods have defaults: names pass through unchanged, session records are
/// discarded and no bundle exists. Implementations override what they back.
///
/// Session hooks are fire-and-forget from the caller's point of view; the event monitor
/// logs an `Err` and carries on, so implementations should not retry internally for long.
#[async_trait]
pub trait PlayerDirectory: Send + Sync + 'static {
    /// Resolve a display alias to the canonical player name
    ///
    /// Unknown names are returned unchanged.
    async fn resolve_alias(&self, name_or_alias: &str) -> String {
        name_or_alias.to_string()
    }

    /// Record that a player session opened
    async fn record_login(&self, _player: &str, _at: SystemTime) -> Result<()> {
        Ok(())
    }

    /// Record that the most recent open session for a player closed
    async fn record_logout(&self, _player: &str, _at: SystemTime, _duration: Duration) -> Result<()> {
        Ok(())
    }

    /// Expand a bundle name into its items, `None` if no such bundle exists
    async fn resolve_bundle(&self, _bundle: &str) -> Result<Option<Bundle>> {
        Ok(None)
    }
}

/// A directory with no backing store
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDirectory;

impl PlayerDirectory for NullDirectory {}
