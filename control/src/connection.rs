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

//! Connection state shared between the client handle and the reader task

use crate::exchange::ExchangeChunk;
use crate::{ConsoleEvent, SessionTracker};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace};
use warden_directory::PlayerDirectory;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// Not connected
    Disconnected = 0,
    /// TCP connect or password handshake in progress
    Connecting = 1,
    /// Authenticated and reading
    Connected = 2,
    /// Disconnect in progress
    ShuttingDown = 3,
}

impl ConnectionState {
    /// Convert from u8 (for atomic operations)
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::ShuttingDown,
            _ => Self::Disconnected,
        }
    }

    /// Convert to u8 (for atomic operations)
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::ShuttingDown => write!(f, "shutting down"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Where the reader sends text for the command in flight
struct Route {
    sender: mpsc::UnboundedSender<ExchangeChunk>,
    /// Opened under a pause: the exchange takes every line, events included
    paused: bool,
}

/// State read by the monitor task and written by the client handle
///
/// Nothing here is held across an await point; the std locks guard plain data only.
pub(crate) struct Shared {
    state: AtomicU8,
    monitoring: AtomicBool,
    verbose: AtomicBool,
    pauses: AtomicUsize,
    exchange: Mutex<Option<Route>>,
    backlog: Mutex<Vec<String>>,
    sessions: Mutex<SessionTracker>,
    events: broadcast::Sender<ConsoleEvent>,
    pub(crate) directory: Arc<dyn PlayerDirectory>,
}

impl Shared {
    pub(crate) fn new(
        directory: Arc<dyn PlayerDirectory>,
        event_capacity: usize,
        verbose: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            state: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
            monitoring: AtomicBool::new(false),
            verbose: AtomicBool::new(verbose),
            pauses: AtomicUsize::new(0),
            exchange: Mutex::new(None),
            backlog: Mutex::new(Vec::new()),
            sessions: Mutex::new(SessionTracker::new()),
            events,
            directory,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        let previous = self.state.swap(state.as_u8(), Ordering::AcqRel);
        if previous != state.as_u8() {
            debug!(from = %ConnectionState::from_u8(previous), to = %state, "Connection state changed");
        }
    }

    /// Move from `from` to `to` only if the state is still `from`
    pub(crate) fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::Acquire)
    }

    pub(crate) fn set_monitoring(&self, enabled: bool) {
        self.monitoring.store(enabled, Ordering::Release);
    }

    pub(crate) fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Acquire)
    }

    pub(crate) fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Release);
    }

    /// Check if classification is on hold, by a guard or by a paused exchange
    pub(crate) fn is_paused(&self) -> bool {
        self.pauses.load(Ordering::Acquire) > 0
            || lock(&self.exchange).as_ref().is_some_and(|route| route.paused)
    }

    pub(crate) fn open_exchange(&self, sender: mpsc::UnboundedSender<ExchangeChunk>, paused: bool) {
        *lock(&self.exchange) = Some(Route { sender, paused });
    }

    pub(crate) fn close_exchange(&self) {
        lock(&self.exchange).take();
    }

    pub(crate) fn has_exchange(&self) -> bool {
        lock(&self.exchange).is_some()
    }

    /// Hand a chunk to the open exchange; false when none is open
    pub(crate) fn forward(&self, chunk: ExchangeChunk) -> bool {
        match lock(&self.exchange).as_ref() {
            Some(route) => route.sender.send(chunk).is_ok(),
            None => false,
        }
    }

    /// Hand a line to an exchange opened under a pause; false when no such exchange is open
    pub(crate) fn forward_paused(&self, line: &str) -> bool {
        match lock(&self.exchange).as_ref() {
            Some(route) if route.paused => {
                if route.sender.send(ExchangeChunk::Line(line.to_string())).is_err() {
                    trace!("Paused exchange already finished");
                }
                true
            }
            _ => false,
        }
    }

    pub(crate) fn defer(&self, line: String) {
        lock(&self.backlog).push(line);
    }

    pub(crate) fn take_backlog(&self) -> Vec<String> {
        std::mem::take(&mut *lock(&self.backlog))
    }

    pub(crate) fn sessions(&self) -> MutexGuard<'_, SessionTracker> {
        lock(&self.sessions)
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events.subscribe()
    }

    /// Publish an event; having no subscribers is not an error
    pub(crate) fn publish(&self, event: ConsoleEvent) {
        match self.events.send(event) {
            Ok(receivers) => trace!(receivers, "Published console event"),
            Err(_) => trace!("Console event dropped, no subscribers"),
        }
    }
}

/// Keeps the monitor from classifying lines while held
///
/// While any pause is alive, event-shaped lines are queued instead of classified, and the
/// queue is classified once the last pause is dropped. Other lines keep flowing to the
/// command in flight. A pause never hands event lines to a command it was not taken for;
/// queries that need them in their reply open their exchange paused instead.
#[must_use = "the monitor resumes as soon as the pause is dropped"]
pub struct MonitorPause {
    shared: Arc<Shared>,
}

impl MonitorPause {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        let depth = shared.pauses.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(depth, "Event monitor paused");
        Self { shared }
    }
}

impl fmt::Debug for MonitorPause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorPause").finish_non_exhaustive()
    }
}

impl Drop for MonitorPause {
    fn drop(&mut self) {
        let depth = self.shared.pauses.fetch_sub(1, Ordering::AcqRel) - 1;
        debug!(depth, "Event monitor pause released");
    }
}
