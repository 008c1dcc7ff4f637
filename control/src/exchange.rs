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

//! Reply collection for one in-flight command

use crate::CommandError;
use crate::classify::error_line;
use crate::connection::Shared;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::trace;

/// Console text routed to the command in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExchangeChunk {
    /// A complete line, terminator stripped
    Line(String),
    /// Unterminated text flushed after the stream went quiet
    Partial(String),
}

/// Accumulates chunks into reply text
///
/// Complete lines are joined with `\n`; a partial chunk is glued onto whatever follows
/// it, since the rest of that line is still to come.
#[derive(Debug, Default)]
pub(crate) struct ReplyBuffer {
    text: String,
    open_line: bool,
}

impl ReplyBuffer {
    pub(crate) fn push(&mut self, chunk: ExchangeChunk) {
        let (piece, partial) = match chunk {
            ExchangeChunk::Line(line) => (line, false),
            ExchangeChunk::Partial(text) => (text, true),
        };
        if !self.text.is_empty() && !self.open_line {
            self.text.push('\n');
        }
        self.text.push_str(&piece);
        self.open_line = partial;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub(crate) fn into_string(self) -> String {
        self.text
    }
}

/// The receiving end of an open exchange
///
/// Opening registers the sender with the reader task; dropping closes it again, so the
/// reader stops routing text here even if the command is abandoned midway. A slot opened
/// `paused` also receives event-shaped lines, which the reader queues for classification
/// once the slot closes.
pub(crate) struct ExchangeSlot<'a> {
    shared: &'a Shared,
    receiver: mpsc::UnboundedReceiver<ExchangeChunk>,
}

impl<'a> ExchangeSlot<'a> {
    pub(crate) fn open(shared: &'a Shared, paused: bool) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        shared.open_exchange(sender, paused);
        Self { shared, receiver }
    }

    /// Wait for output to start, then read until the console goes quiet
    ///
    /// Every chunk resets the attempt count. An empty attempt ends the read once some
    /// text has arrived; otherwise the read gives up after `max_attempts` empty attempts.
    /// If the reader goes away, the read ends at once, even during the initial wait.
    pub(crate) async fn collect(
        &mut self,
        wait: Duration,
        attempt_timeout: Duration,
        max_attempts: usize,
    ) -> Result<String, CommandError> {
        let mut reply = ReplyBuffer::default();

        let waited = Instant::now() + wait;
        loop {
            match timeout_at(waited, self.receiver.recv()).await {
                Ok(Some(chunk)) => {
                    trace!(?chunk, "Reply chunk during wait");
                    reply.push(chunk);
                }
                Ok(None) => return closed(reply),
                Err(_) => break,
            }
        }

        let mut attempts = 0;
        while attempts < max_attempts {
            match timeout(attempt_timeout, self.receiver.recv()).await {
                Ok(Some(chunk)) => {
                    trace!(?chunk, "Reply chunk");
                    reply.push(chunk);
                    attempts = 0;
                }
                Ok(None) => return closed(reply),
                Err(_) if !reply.is_empty() => break,
                Err(_) => attempts += 1,
            }
        }
        Ok(reply.into_string())
    }
}

impl Drop for ExchangeSlot<'_> {
    fn drop(&mut self) {
        self.shared.close_exchange();
    }
}

/// The reader stopped routing: keep what arrived, or report the lost connection
fn closed(reply: ReplyBuffer) -> Result<String, CommandError> {
    if reply.is_empty() {
        Err(CommandError::Transport("Connection closed by server".to_string()))
    } else {
        Ok(reply.into_string())
    }
}

/// Turn collected reply text into a command outcome
pub(crate) fn judge_reply(reply: String) -> Result<String, CommandError> {
    match error_line(&reply) {
        Some(_) => Err(CommandError::Remote(reply)),
        None => Ok(reply),
    }
}
