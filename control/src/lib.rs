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

//! # Warden Control Channel
//!
//! Client for the telnet admin console of a dedicated game server (7 Days to Die and
//! consoles that speak the same line protocol).
//!
//! ## Features
//!
//! - **Password Handshake** - Prompt/response login with distinct rejection and timeout errors
//! - **Serialised Commands** - One command exchange at a time, replies collected until quiet
//! - **Single Reader** - One task owns the socket and routes each line either to the
//!   command in flight or to the event classifier, so neither steals the other's output
//! - **Typed Events** - Logins, logouts with play time, and chat on a broadcast channel
//! - **Time Safety** - Game day changes refuse to go backwards unless forced
//! - **Player Operations** - Give, spawn, teleport and bundles through a [`PlayerDirectory`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use warden_control::{ConsoleClient, ConsoleConfig, ConsoleEvent};
//! use warden_directory::MemoryDirectory;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConsoleConfig::from_env()?;
//!     let client = ConsoleClient::new(config, Arc::new(MemoryDirectory::new()));
//!     client.connect().await?;
//!
//!     let mut events = client.subscribe();
//!     client.start_monitoring()?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let ConsoleEvent::Login { player } = &event {
//!             client.broadcast(&format!("Welcome, {}!", player)).await.ok();
//!         }
//!         println!("{}", event);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Time Safety
//!
//! ```no_run
//! # use warden_control::{ConsoleClient, SetTimeError};
//! # async fn example(client: &ConsoleClient) -> Result<(), SetTimeError> {
//! // Refused if the server is already past day 7
//! let message = client.set_day_and_time(7, 8, 0, false).await?;
//! println!("{}", message);
//! # Ok(())
//! # }
//! ```
//!
//! [`PlayerDirectory`]: warden_directory::PlayerDirectory

mod classify;
mod client;
mod clock;
mod command;
mod config;
mod connection;
mod error;
mod event;
mod exchange;
mod monitor;
mod players;
mod session;
mod transport;

pub use classify::{
    CHAT_MARKER, ChatLine, Classification, DISCONNECT_MARKER, ENTER_GAME_MARKER, LOGIN_MARKER,
    Presence, classify_line, error_line,
};
pub use client::ConsoleClient;
pub use clock::{DEFAULT_HOUR, DEFAULT_MINUTE, GameClock, check_time_change};
pub use command::{ConsoleCommand, quote_name};
pub use config::{ConsoleConfig, ENV_HOST, ENV_PASSWORD, ENV_PORT};
pub use connection::{ConnectionState, MonitorPause};
pub use error::{BundleError, CommandError, ConfigError, ConsoleError, Result, SetTimeError};
pub use event::{ConsoleEvent, format_duration};
pub use players::{BundleReport, ItemOutcome, OnlinePlayer, parse_player_list};
pub use session::{Session, SessionTracker};
