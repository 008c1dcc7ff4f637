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

//! The console client handle

use crate::connection::{ConnectionState, MonitorPause, Shared};
use crate::exchange::{ExchangeSlot, judge_reply};
use crate::monitor::{EventMonitor, MonitorHandle};
use crate::transport::{self, ConsoleWriter};
use crate::{CommandError, ConsoleCommand, ConsoleConfig, ConsoleError, ConsoleEvent, Result};
use futures::SinkExt;
use metrics::{counter, histogram};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, broadcast};
use tokio::time::{Instant, timeout};
use tracing::{debug, info, instrument, warn};
use warden_directory::{NullDirectory, PlayerDirectory};

/// Client for a game server's telnet admin console
///
/// One `ConsoleClient` owns one connection. Clones share it: commands from any clone
/// are serialised, and every clone sees the same events and sessions.
///
/// ```no_run
/// use std::sync::Arc;
/// use warden_control::{ConsoleClient, ConsoleConfig};
/// use warden_directory::MemoryDirectory;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConsoleConfig::new("127.0.0.1", 8081).with_password("secret");
/// let client = ConsoleClient::new(config, Arc::new(MemoryDirectory::new()));
/// client.connect().await?;
///
/// let mut events = client.subscribe();
/// client.start_monitoring()?;
///
/// for player in client.list_players().await? {
///     println!("{} is online", player.name);
/// }
/// while let Ok(event) = events.recv().await {
///     println!("{}", event);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConsoleClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ConsoleConfig,
    shared: Arc<Shared>,
    /// The exchange lock: whoever holds the writer owns the console until the reply is in
    writer: Mutex<Option<ConsoleWriter>>,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl ConsoleClient {
    /// Create a disconnected client backed by `directory`
    pub fn new(config: ConsoleConfig, directory: Arc<dyn PlayerDirectory>) -> Self {
        let shared = Shared::new(directory, config.event_capacity, config.verbose);
        Self {
            inner: Arc::new(ClientInner {
                config,
                shared: Arc::new(shared),
                writer: Mutex::new(None),
                monitor: Mutex::new(None),
            }),
        }
    }

    /// Create a disconnected client with no directory behind it
    pub fn with_config(config: ConsoleConfig) -> Self {
        Self::new(config, Arc::new(NullDirectory))
    }

    /// Client configuration
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    /// The directory used for aliases, bundles and session records
    pub fn directory(&self) -> &Arc<dyn PlayerDirectory> {
        &self.inner.shared.directory
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.state()
    }

    /// Check if the console is connected and authenticated
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Connect to the configured server and log in
    ///
    /// Connection and authentication failures are returned as-is; nothing is retried.
    #[instrument(skip(self), fields(address = %self.inner.config.address()))]
    pub async fn connect(&self) -> Result<()> {
        self.begin_connect()?;
        let stream = match transport::open(&self.inner.config).await {
            Ok(stream) => stream,
            Err(err) => {
                self.inner.shared.set_state(ConnectionState::Disconnected);
                return Err(err);
            }
        };
        self.attach(stream).await
    }

    /// Log in over an already open stream
    ///
    /// Useful for tunnels and for tests; the stream is treated exactly like the TCP
    /// connection [`connect`](Self::connect) would have opened.
    pub async fn connect_stream<S>(&self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + Sync + Unpin + 'static,
    {
        self.begin_connect()?;
        self.attach(stream).await
    }

    fn begin_connect(&self) -> Result<()> {
        if self
            .inner
            .shared
            .transition(ConnectionState::Disconnected, ConnectionState::Connecting)
        {
            Ok(())
        } else {
            Err(ConsoleError::AlreadyConnected)
        }
    }

    async fn attach<S>(&self, mut stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + Sync + Unpin + 'static,
    {
        if let Err(err) = transport::authenticate(&mut stream, &self.inner.config).await {
            self.inner.shared.set_state(ConnectionState::Disconnected);
            return Err(err);
        }
        let (reader, writer) = transport::split(stream, self.inner.config.max_line_length);

        let mut monitor = self.inner.monitor.lock().await;
        if let Some(stale) = monitor.take() {
            stale.shutdown(self.inner.config.shutdown_timeout).await;
        }
        {
            let mut slot = self.inner.writer.lock().await;
            release_writer(&mut slot).await;
            *slot = Some(writer);
        }
        self.inner.shared.set_state(ConnectionState::Connected);
        *monitor = Some(EventMonitor::new(reader, self.inner.shared.clone(), &self.inner.config).spawn());

        counter!("warden.connections.total").increment(1);
        info!("Console connected");
        Ok(())
    }

    /// Stop the monitor, close the connection and mark the client disconnected
    ///
    /// Commands in flight at the time fail with a transport error.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) {
        let shared = &self.inner.shared;
        shared.set_state(ConnectionState::ShuttingDown);
        shared.set_monitoring(false);

        if let Some(monitor) = self.inner.monitor.lock().await.take() {
            monitor.shutdown(self.inner.config.shutdown_timeout).await;
        }

        match timeout(self.inner.config.shutdown_timeout, self.inner.writer.lock()).await {
            Ok(mut writer) => release_writer(&mut writer).await,
            Err(_) => warn!("Command still in flight at disconnect, it closes the writer when done"),
        }

        shared.set_state(ConnectionState::Disconnected);
        info!("Console disconnected");
    }

    /// Receive console events
    ///
    /// Events are only published while monitoring is on, except raw lines in verbose mode.
    /// A receiver that falls more than `event_capacity` events behind skips ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.inner.shared.subscribe()
    }

    /// Start classifying console lines into events
    pub fn start_monitoring(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(ConsoleError::NotConnected);
        }
        self.inner.shared.set_monitoring(true);
        info!("Event monitoring started");
        Ok(())
    }

    /// Stop classifying console lines; the connection stays open
    pub fn stop_monitoring(&self) {
        self.inner.shared.set_monitoring(false);
        info!("Event monitoring stopped");
    }

    /// Check if console lines are being classified
    pub fn is_monitoring(&self) -> bool {
        self.inner.shared.is_monitoring()
    }

    /// Publish every console line as [`ConsoleEvent::Raw`]
    pub fn set_verbose(&self, verbose: bool) {
        self.inner.shared.set_verbose(verbose);
    }

    /// Hold event classification until the returned guard is dropped
    ///
    /// Event lines seen meanwhile are queued and classified once the last guard goes.
    /// They are never handed to commands in flight.
    pub fn pause_monitor(&self) -> MonitorPause {
        MonitorPause::new(self.inner.shared.clone())
    }

    /// Names of players with an open session, sorted
    pub fn open_sessions(&self) -> Vec<String> {
        self.inner.shared.sessions().players()
    }

    /// Check if the player has an open session
    pub fn is_session_open(&self, player: &str) -> bool {
        self.inner.shared.sessions().contains(player)
    }

    /// Send one command line and collect the reply
    ///
    /// Waits `wait` for output to start, then reads until the console goes quiet. A reply
    /// with a line starting with an error marker comes back as [`CommandError::Remote`].
    pub async fn execute(&self, command: &str, wait: Duration) -> std::result::Result<String, CommandError> {
        self.exchange(command, wait, false).await
    }

    /// Like [`execute`](Self::execute), but the reply also receives event-shaped lines
    ///
    /// Classification of everything seen during the exchange is deferred until the reply
    /// is in. The pause only starts once this command owns the console.
    pub(crate) async fn execute_paused(
        &self,
        command: &str,
        wait: Duration,
    ) -> std::result::Result<String, CommandError> {
        self.exchange(command, wait, true).await
    }

    /// A write half left behind by a hangup or a disconnect
    fn writer_is_stale(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Disconnected | ConnectionState::ShuttingDown
        )
    }

    async fn exchange(
        &self,
        command: &str,
        wait: Duration,
        paused: bool,
    ) -> std::result::Result<String, CommandError> {
        if !self.is_connected() {
            if self.writer_is_stale() {
                if let Ok(mut writer) = self.inner.writer.try_lock() {
                    release_writer(&mut writer).await;
                }
            }
            return Err(CommandError::NotConnected);
        }
        let mut writer = self.inner.writer.lock().await;
        if self.writer_is_stale() {
            release_writer(&mut writer).await;
        }
        let sink = match writer.as_mut() {
            Some(sink) if self.is_connected() => sink,
            _ => return Err(CommandError::NotConnected),
        };

        let config = &self.inner.config;
        let started = Instant::now();
        let mut slot = ExchangeSlot::open(&self.inner.shared, paused);
        debug!(command, "Sending console command");
        counter!("warden.commands.sent").increment(1);
        if let Err(err) = sink.send(command).await {
            counter!("warden.errors.send").increment(1);
            warn!(command, error = %err, "Failed to send console command");
            return Err(CommandError::Transport(err.to_string()));
        }

        let outcome = slot
            .collect(wait, config.read_attempt_timeout, config.max_read_attempts)
            .await
            .and_then(judge_reply);
        drop(slot);
        histogram!("warden.command.duration").record(started.elapsed().as_secs_f64());
        if self.writer_is_stale() {
            debug!("Connection went down during command, closing writer");
            release_writer(&mut writer).await;
        }

        if let Err(err) = &outcome {
            counter!("warden.commands.failed").increment(1);
            debug!(command, error = %err, "Console command failed");
        }
        outcome
    }

    /// Send a typed command with the default wait
    #[instrument(skip_all, fields(verb = command.verb()))]
    pub async fn send(&self, command: &ConsoleCommand) -> std::result::Result<String, CommandError> {
        if command.is_mutating() {
            info!(%command, "Issuing console command");
        }
        self.execute(&command.to_string(), self.inner.config.command_wait)
            .await
    }
}

/// Close and drop the write half, if one is still held
async fn release_writer(writer: &mut Option<ConsoleWriter>) {
    if let Some(mut writer) = writer.take() {
        if let Err(err) = SinkExt::<&str>::close(&mut writer).await {
            debug!(error = %err, "Error closing console writer");
        }
    }
}

impl fmt::Debug for ConsoleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleClient")
            .field("address", &self.inner.config.address())
            .field("state", &self.state())
            .field("monitoring", &self.is_monitoring())
            .finish()
    }
}
