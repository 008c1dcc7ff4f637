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

//! Control channel error types

use std::io;
use thiserror::Error;
use warden_directory::DirectoryError;
use warden_linecodec::CodecError;

/// Result type for connection-level operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Connection-level errors: establishing, authenticating and tearing down the console link
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// I/O error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error from the line codec
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The TCP connection did not complete in time
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// The server refused the TCP connection
    #[error("Connection refused")]
    ConnectionRefused,

    /// The server rejected the password
    #[error("Authentication failed: password rejected")]
    AuthRejected,

    /// The server never confirmed the login
    #[error("Authentication failed: no response from server")]
    AuthTimeout,

    /// Operation needs a live connection
    #[error("Not connected")]
    NotConnected,

    /// Connect called on a live connection
    #[error("Already connected")]
    AlreadyConnected,

    /// The server closed the connection
    #[error("Connection closed by server")]
    ConnectionClosed,
}

impl ConsoleError {
    /// Classify an error raised while opening the TCP connection
    pub(crate) fn from_connect(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::TimedOut => Self::ConnectionTimeout,
            _ => Self::Io(error),
        }
    }

    /// Check if the error came from the password handshake
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ConsoleError::AuthRejected | ConsoleError::AuthTimeout)
    }

    /// Check if the error is a socket-level connection failure
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ConsoleError::Io(_)
                | ConsoleError::ConnectionTimeout
                | ConsoleError::ConnectionRefused
                | ConsoleError::ConnectionClosed
        )
    }
}

/// Why a console command did not produce a usable reply
///
/// Commands never raise; every outcome, including transport faults, comes back as
/// either the reply text or one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No live connection; nothing was sent
    #[error("Not connected to server")]
    NotConnected,

    /// Writing the command or reading the reply failed
    #[error("Error sending command: {0}")]
    Transport(String),

    /// The server answered with an error; carries the full reply
    #[error("{0}")]
    Remote(String),
}

/// Why a game time change was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetTimeError {
    /// Day below 1
    #[error("Day must be 1 or greater")]
    InvalidDay(u32),

    /// Hour outside 0-23
    #[error("Hour must be between 0 and 23")]
    InvalidHour(u32),

    /// Minute outside 0-59
    #[error("Minute must be between 0 and 59")]
    InvalidMinute(u32),

    /// The current day could not be read and no override was given
    #[error("Could not determine current day. Use force to override.")]
    UnknownCurrentDay,

    /// The target day is earlier than the current day and no override was given
    #[error(
        "Cannot set day backwards from Day {current} to Day {target}. Use force to override."
    )]
    Backwards {
        /// Day the server reported
        current: u32,
        /// Day that was requested
        target: u32,
    },

    /// The set-time command itself failed
    #[error("Error setting time: {0}")]
    Command(#[from] CommandError),
}

/// Why a bundle could not be applied at all
///
/// Individual item failures are not errors; they are counted in the bundle report.
#[derive(Debug, Error)]
pub enum BundleError {
    /// No bundle with this name
    #[error("Bundle '{0}' not found")]
    NotFound(String),

    /// The directory lookup failed
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// The console link was not usable
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Missing configuration value {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("Invalid value '{value}' for {key}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ConsoleError::AuthRejected.is_auth_error());
        assert!(ConsoleError::AuthTimeout.is_auth_error());
        assert!(!ConsoleError::ConnectionRefused.is_auth_error());
        assert!(ConsoleError::ConnectionRefused.is_connection_error());
        assert!(!ConsoleError::NotConnected.is_connection_error());
    }

    #[test]
    fn test_connect_error_mapping() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(matches!(
            ConsoleError::from_connect(refused),
            ConsoleError::ConnectionRefused
        ));
        let other = io::Error::from(io::ErrorKind::AddrNotAvailable);
        assert!(matches!(ConsoleError::from_connect(other), ConsoleError::Io(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SetTimeError::Backwards {
            current: 42,
            target: 7,
        };
        assert_eq!(
            err.to_string(),
            "Cannot set day backwards from Day 42 to Day 7. Use force to override."
        );
        assert_eq!(
            SetTimeError::from(CommandError::Remote("ERR: bad".to_string())).to_string(),
            "Error setting time: ERR: bad"
        );
        assert_eq!(
            CommandError::Transport("broken pipe".to_string()).to_string(),
            "Error sending command: broken pipe"
        );
    }
}
