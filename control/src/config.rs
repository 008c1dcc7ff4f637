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

//! Console client configuration

use crate::ConfigError;
use std::fmt;
use std::time::Duration;

/// Environment variable naming the console host
pub const ENV_HOST: &str = "SERVER_HOST";
/// Environment variable naming the console port
pub const ENV_PORT: &str = "SERVER_PORT";
/// Environment variable holding the console password
pub const ENV_PASSWORD: &str = "SERVER_PASSWORD";

/// Admin console client configuration
///
/// Timing defaults follow the console's behaviour: replies have no end marker, so a
/// command waits `command_wait` for output to start and then keeps reading until a
/// `read_attempt_timeout` passes with nothing new. `read_attempt_timeout` should stay
/// longer than `poll_timeout`, since an unterminated reply tail is only handed over
/// after the reader has seen one quiet poll.
#[derive(Clone)]
pub struct ConsoleConfig {
    /// Server hostname or IP address
    pub host: String,

    /// Telnet console port
    pub port: u16,

    /// Console password
    pub password: String,

    /// TCP connection timeout
    pub connect_timeout: Duration,

    /// Overall time allowed for each step of the password handshake
    pub auth_timeout: Duration,

    /// Text the server prints when it wants the password
    pub prompt_marker: String,

    /// Any of these in the post-password output means the login worked
    pub success_markers: Vec<String>,

    /// Text the server prints when the password is wrong
    pub rejection_marker: String,

    /// Quiet period that ends the logon banner, which is discarded
    pub banner_settle: Duration,

    /// Wait before reading the reply to an ordinary command
    pub command_wait: Duration,

    /// Wait before reading the reply to each item of a bundle
    pub bundle_item_wait: Duration,

    /// Wait before reading the reply to a game time query
    pub time_query_wait: Duration,

    /// Wait before reading the reply to a raw operator command
    pub raw_command_wait: Duration,

    /// Timeout for a single read attempt while collecting a reply
    pub read_attempt_timeout: Duration,

    /// Consecutive empty read attempts before a reply is abandoned
    pub max_read_attempts: usize,

    /// How long the event monitor waits for input on each poll
    pub poll_timeout: Duration,

    /// Pause after a poll that produced nothing
    pub idle_backoff: Duration,

    /// Pause after a read error before polling again
    pub error_pause: Duration,

    /// Bounded wait for the monitor task to finish on disconnect
    pub shutdown_timeout: Duration,

    /// Capacity of the event broadcast channel
    pub event_capacity: usize,

    /// Longest inbound line before it is force-split
    pub max_line_length: usize,

    /// Echo every raw console line as an event
    pub verbose: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8081,
            password: String::new(),
            connect_timeout: Duration::from_secs(10),
            auth_timeout: Duration::from_secs(5),
            prompt_marker: "Please enter password:".to_string(),
            success_markers: vec![
                "Logon successful.".to_string(),
                "Press 'help'".to_string(),
            ],
            rejection_marker: "Password incorrect".to_string(),
            banner_settle: Duration::from_millis(250),
            command_wait: Duration::from_millis(500),
            bundle_item_wait: Duration::from_millis(300),
            time_query_wait: Duration::from_millis(1500),
            raw_command_wait: Duration::from_secs(1),
            read_attempt_timeout: Duration::from_secs(2),
            max_read_attempts: 5,
            poll_timeout: Duration::from_millis(500),
            idle_backoff: Duration::from_millis(100),
            error_pause: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(2),
            event_capacity: 256,
            max_line_length: warden_linecodec::DEFAULT_MAX_LINE_LENGTH,
            verbose: false,
        }
    }
}

impl ConsoleConfig {
    /// Create a new configuration for the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Load host, port and password from `SERVER_HOST`, `SERVER_PORT` and `SERVER_PASSWORD`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load host, port and password through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .ok_or(ConfigError::Missing(key))
        };
        let host = require(ENV_HOST)?;
        let port = require(ENV_PORT)?;
        let port = port.parse::<u16>().map_err(|_| ConfigError::Invalid {
            key: ENV_PORT,
            value: port.clone(),
        })?;
        let password = require(ENV_PASSWORD)?;
        Ok(Self::new(host, port).with_password(password))
    }

    /// Set the console password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the handshake timeout
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Set the quiet period that ends the logon banner
    pub fn with_banner_settle(mut self, settle: Duration) -> Self {
        self.banner_settle = settle;
        self
    }

    /// Set the default command wait
    pub fn with_command_wait(mut self, wait: Duration) -> Self {
        self.command_wait = wait;
        self
    }

    /// Set the per-item wait used when applying bundles
    pub fn with_bundle_item_wait(mut self, wait: Duration) -> Self {
        self.bundle_item_wait = wait;
        self
    }

    /// Set the wait used for game time queries
    pub fn with_time_query_wait(mut self, wait: Duration) -> Self {
        self.time_query_wait = wait;
        self
    }

    /// Set the reply collection limits
    pub fn with_read_attempts(mut self, timeout: Duration, max_attempts: usize) -> Self {
        self.read_attempt_timeout = timeout;
        self.max_read_attempts = max_attempts.max(1);
        self
    }

    /// Set the event monitor cadence
    pub fn with_poll_timing(mut self, poll_timeout: Duration, idle_backoff: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self.idle_backoff = idle_backoff;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Enable or disable raw line echo
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the server address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("command_wait", &self.command_wait)
            .field("read_attempt_timeout", &self.read_attempt_timeout)
            .field("max_read_attempts", &self.max_read_attempts)
            .field("poll_timeout", &self.poll_timeout)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
