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

//! Classification of unsolicited console lines
//!
//! The patterns here follow the log phrasing of the 7 Days to Die dedicated server
//! console. They are format heuristics, not grammar: each category is a short chain of
//! fallbacks tried from most to least specific, and the first hit wins. Keep wording
//! changes here and covered by the tests below.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker for a completed login: `INF PlayerLogin: Name/V 1.0`
pub const LOGIN_MARKER: &str = "PlayerLogin:";
/// Marker for a join request: `INF RequestToEnterGame: 171/Name`
pub const ENTER_GAME_MARKER: &str = "RequestToEnterGame:";
/// Marker for a disconnect line
pub const DISCONNECT_MARKER: &str = "Player disconnected";
/// Marker for a chat line
pub const CHAT_MARKER: &str = "Chat";

struct ConsolePatterns {
    login: Regex,
    enter_game: Regex,
    disconnect_quoted: Regex,
    disconnect_bare: Regex,
    disconnect_positional: Regex,
    chat_quoted: Regex,
    chat_colon: Regex,
    error_line: Regex,
}

static PATTERNS: Lazy<ConsolePatterns> = Lazy::new(|| ConsolePatterns {
    login: Regex::new(r"PlayerLogin:\s+([^/]+)").unwrap(),
    enter_game: Regex::new(r"RequestToEnterGame:.*?/(.+)").unwrap(),
    disconnect_quoted: Regex::new(r"PlayerName='([^']+)'").unwrap(),
    disconnect_bare: Regex::new(r"PlayerName=([^,\s]+)").unwrap(),
    disconnect_positional: Regex::new(r"Player disconnected:\s+([^,(]+)").unwrap(),
    chat_quoted: Regex::new(r"Chat.*?'([^']+)':\s*(.+)").unwrap(),
    chat_colon: Regex::new(r"Chat.*?:\s*([^:]+):\s*(.+)").unwrap(),
    // Optional `<timestamp> <uptime> ` log prefix, then a marker at the start of the text.
    error_line: Regex::new(
        r"^(?:\d{4}-\d{2}-\d{2}T\S+\s+\d+(?:\.\d+)?\s+)?(?:ERR\b|\*\*\* ERROR|Error\b|Wrong\b)",
    )
    .unwrap(),
});

/// A player arriving or leaving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// Player logged in
    Login(String),
    /// Player disconnected
    Logout(String),
}

/// A chat line split into speaker and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// Speaker name
    pub speaker: String,
    /// Message text
    pub message: String,
}

/// Everything recognised on one console line
///
/// Presence and chat are checked independently, so a line can carry both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Login or logout, at most one
    pub presence: Option<Presence>,
    /// Chat message
    pub chat: Option<ChatLine>,
}

impl Classification {
    /// True when the line matched nothing
    pub fn is_empty(&self) -> bool {
        self.presence.is_none() && self.chat.is_none()
    }
}

/// Classify one trimmed console line
///
/// # Example
/// ```
/// use warden_control::{classify_line, ChatLine};
///
/// let seen = classify_line("Chat: 'Bob': hello world");
/// assert_eq!(
///     seen.chat,
///     Some(ChatLine { speaker: "Bob".to_string(), message: "hello world".to_string() })
/// );
/// assert!(classify_line("Day 7, 14:23").is_empty());
/// ```
pub fn classify_line(line: &str) -> Classification {
    Classification {
        presence: classify_login(line).or_else(|| classify_logout(line)),
        chat: classify_chat(line),
    }
}

fn classify_login(line: &str) -> Option<Presence> {
    let pattern = if line.contains(LOGIN_MARKER) {
        &PATTERNS.login
    } else if line.contains(ENTER_GAME_MARKER) {
        &PATTERNS.enter_game
    } else {
        return None;
    };
    capture_name(pattern, line).map(Presence::Login)
}

fn classify_logout(line: &str) -> Option<Presence> {
    if !line.contains(DISCONNECT_MARKER) {
        return None;
    }
    [
        &PATTERNS.disconnect_quoted,
        &PATTERNS.disconnect_bare,
        &PATTERNS.disconnect_positional,
    ]
    .into_iter()
    .find_map(|pattern| capture_name(pattern, line))
    .map(Presence::Logout)
}

fn classify_chat(line: &str) -> Option<ChatLine> {
    if !line.contains(CHAT_MARKER) {
        return None;
    }
    [&PATTERNS.chat_quoted, &PATTERNS.chat_colon]
        .into_iter()
        .find_map(|pattern| {
            let captures = pattern.captures(line)?;
            let speaker = captures.get(1)?.as_str().trim();
            let message = captures.get(2)?.as_str().trim();
            (!speaker.is_empty() && !message.is_empty()).then(|| ChatLine {
                speaker: speaker.to_string(),
                message: message.to_string(),
            })
        })
}

fn capture_name(pattern: &Regex, line: &str) -> Option<String> {
    let name = pattern.captures(line)?.get(1)?.as_str().trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// The first line of a reply that reports a server-side error
///
/// Only the start of each line is inspected (after an optional log timestamp), so item
/// or entity names that merely contain `ERR` or `Error` do not count.
pub fn error_line(reply: &str) -> Option<&str> {
    reply
        .lines()
        .map(str::trim)
        .find(|line| PATTERNS.error_line.is_match(line))
}
