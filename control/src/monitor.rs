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

//! The event monitor: sole reader of the console stream
//!
//! One spawned task owns the inbound half of the connection. Every line it decodes is
//! routed to exactly one place:
//!
//! - with monitoring on, event-shaped lines (login, logout, chat) go to the classifier
//!   and everything else goes to the command in flight, if any
//! - with monitoring off, every line goes to the command in flight
//! - while a [`MonitorPause`](crate::MonitorPause) is held, event-shaped lines are queued
//!   and classified after the pause
//! - a command opened paused (game time queries) gets every line while it runs, and a
//!   copy is queued for classification after it finishes
//!
//! Lines nobody is waiting for are dropped. A read error is fatal: the framed stream
//! yields nothing after one, so the monitor marks the connection down and exits.

use crate::classify::{Classification, Presence, classify_line};
use crate::connection::{ConnectionState, Shared};
use crate::exchange::ExchangeChunk;
use crate::transport::ConsoleReader;
use crate::{ConsoleConfig, ConsoleEvent};
use futures::StreamExt;
use metrics::counter;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};
use warden_linecodec::ConsoleCodec;

/// Handle to a running monitor task
pub(crate) struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Ask the task to stop and wait up to `grace` for it; abort it after that
    pub(crate) async fn shutdown(self, grace: Duration) {
        self.cancel.cancel();
        let abort = self.task.abort_handle();
        match timeout(grace, self.task).await {
            Ok(Ok(())) => debug!("Event monitor stopped"),
            Ok(Err(err)) => warn!(error = %err, "Event monitor task failed"),
            Err(_) => {
                warn!(?grace, "Event monitor did not stop in time, aborting");
                abort.abort();
            }
        }
    }
}

pub(crate) struct EventMonitor {
    reader: ConsoleReader,
    shared: Arc<Shared>,
    poll_timeout: Duration,
    idle_backoff: Duration,
    error_pause: Duration,
    cancel: CancellationToken,
}

impl EventMonitor {
    pub(crate) fn new(reader: ConsoleReader, shared: Arc<Shared>, config: &ConsoleConfig) -> Self {
        Self {
            reader,
            shared,
            poll_timeout: config.poll_timeout,
            idle_backoff: config.idle_backoff,
            error_pause: config.error_pause,
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn spawn(self) -> MonitorHandle {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run().instrument(info_span!("event_monitor")));
        MonitorHandle { cancel, task }
    }

    async fn run(mut self) {
        debug!("Event monitor started");
        let mut failed = false;
        loop {
            if !self.shared.is_paused() {
                self.drain_backlog().await;
            }

            let polled = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                polled = timeout(self.poll_timeout, self.reader.next()) => polled,
            };

            match polled {
                Ok(Some(Ok(line))) => self.route(line).await,
                Ok(Some(Err(err))) => {
                    error!(error = %err, "Error reading console");
                    counter!("warden.errors.receive").increment(1);
                    failed = true;
                    self.pause(self.error_pause).await;
                }
                Ok(None) if failed => {
                    error!("Console stream unusable after read error, closing");
                    counter!("warden.errors.fatal").increment(1);
                    self.shared
                        .transition(ConnectionState::Connected, ConnectionState::Disconnected);
                    break;
                }
                Ok(None) => {
                    info!("Console closed the connection");
                    self.shared
                        .transition(ConnectionState::Connected, ConnectionState::Disconnected);
                    break;
                }
                Err(_) => {
                    self.flush_partial();
                    self.pause(self.idle_backoff).await;
                }
            }
        }
        self.shared.close_exchange();
        debug!("Event monitor exiting");
    }

    async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = sleep(duration) => {}
        }
    }

    /// Hand an unterminated reply tail to the waiting command
    fn flush_partial(&mut self) {
        if !self.shared.has_exchange() {
            return;
        }
        if let Some(partial) = ConsoleCodec::take_partial(self.reader.read_buffer_mut()) {
            trace!(partial = %partial, "Flushing partial line to exchange");
            self.shared.forward(ExchangeChunk::Partial(partial));
        }
    }

    async fn route(&mut self, line: String) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        counter!("warden.lines.received").increment(1);

        if self.shared.is_verbose() {
            debug!(line, "Console line");
            self.shared.publish(ConsoleEvent::Raw(line.to_string()));
        }

        if self.shared.forward_paused(line) {
            self.shared.defer(line.to_string());
            return;
        }

        if self.shared.is_monitoring() {
            let seen = classify_line(line);
            if !seen.is_empty() {
                if self.shared.is_paused() {
                    self.shared.defer(line.to_string());
                } else {
                    self.dispatch(seen).await;
                }
                return;
            }
        }

        if !self.shared.forward(ExchangeChunk::Line(line.to_string())) {
            trace!(line, "Dropping unclaimed console line");
        }
    }

    async fn drain_backlog(&self) {
        let backlog = self.shared.take_backlog();
        if backlog.is_empty() || !self.shared.is_monitoring() {
            return;
        }
        debug!(lines = backlog.len(), "Classifying lines held during pause");
        for line in &backlog {
            self.dispatch(classify_line(line)).await;
        }
    }

    /// Act on a classified line
    async fn dispatch(&self, seen: Classification) {
        match seen.presence {
            Some(Presence::Login(player)) => self.on_login(player).await,
            Some(Presence::Logout(player)) => self.on_logout(player).await,
            None => {}
        }
        if let Some(chat) = seen.chat {
            debug!(speaker = %chat.speaker, "Chat message");
            self.publish(ConsoleEvent::Chat {
                speaker: chat.speaker,
                message: chat.message,
            });
        }
    }

    async fn on_login(&self, player: String) {
        let login_at = self.shared.sessions().open(&player).login_at;
        info!(player = %player, "Player logged in");
        if let Err(err) = self.shared.directory.record_login(&player, login_at).await {
            warn!(player = %player, error = %err, "Failed to record login");
        }
        self.publish(ConsoleEvent::Login { player });
    }

    async fn on_logout(&self, player: String) {
        let closed = self.shared.sessions().close(&player);
        let duration = match closed {
            Some(session) => {
                let duration = session.elapsed();
                let logout_at = session.logout_at.unwrap_or_else(SystemTime::now);
                info!(player = %player, ?duration, "Player logged out");
                if let Err(err) = self
                    .shared
                    .directory
                    .record_logout(&player, logout_at, duration)
                    .await
                {
                    warn!(player = %player, error = %err, "Failed to record logout");
                }
                Some(duration)
            }
            None => {
                info!(player = %player, "Player logged out without a recorded login");
                None
            }
        };
        self.publish(ConsoleEvent::Logout { player, duration });
    }

    fn publish(&self, event: ConsoleEvent) {
        counter!("warden.events.published").increment(1);
        self.shared.publish(event);
    }
}
