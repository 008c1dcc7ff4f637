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

//! Console Monitor Example
//!
//! Connects to a game server's admin console, turns on event monitoring and prints
//! logins, logouts and chat until Ctrl+C.
//!
//! Configuration comes from the environment:
//!
//! ```text
//! SERVER_HOST=192.168.1.172 SERVER_PORT=8081 SERVER_PASSWORD=secret \
//!     cargo run -p warden-control --example console_monitor
//! ```
//!
//! Set `RUST_LOG=warden_control=debug` to see the connection internals.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use warden_control::{ConsoleClient, ConsoleConfig, ConsoleEvent};
use warden_directory::MemoryDirectory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ConsoleConfig::from_env()?;
    let directory = Arc::new(MemoryDirectory::new());
    let client = ConsoleClient::new(config, directory.clone());

    client.connect().await?;
    let mut events = client.subscribe();
    client.start_monitoring()?;

    match client.current_time().await {
        Some(clock) => println!("Connected to {} ({})", client.config().address(), clock),
        None => println!("Connected to {}", client.config().address()),
    }
    let players = client.list_players().await.unwrap_or_default();
    println!("{} player(s) online", players.len());
    for player in &players {
        println!("  {} (id {})", player.name, player.id);
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(ConsoleEvent::Logout { player, duration }) => {
                    match duration {
                        Some(duration) => println!(
                            "- {} left the server (played for {})",
                            player,
                            warden_control::format_duration(duration)
                        ),
                        None => println!("- {} left the server", player),
                    }
                    if let Some(stats) = directory.player_stats(&player) {
                        println!(
                            "  {} session(s), {} total",
                            stats.total_sessions,
                            warden_control::format_duration(stats.total_playtime)
                        );
                    }
                }
                Ok(ConsoleEvent::Login { player }) => println!("+ {} joined the server", player),
                Ok(event) => println!("  {}", event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event consumer fell behind"),
                Err(RecvError::Closed) => break,
            },
        }
        if !client.is_connected() {
            warn!("Console connection lost");
            break;
        }
    }

    client.disconnect().await;
    Ok(())
}
