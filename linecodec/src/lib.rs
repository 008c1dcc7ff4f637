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

//! # Warden Console Line Codec
//!
//! A [`tokio_util::codec`] implementation of the line-oriented text protocol spoken by
//! game-server admin consoles reached over a raw telnet socket.
//!
//! The console protocol has no framing beyond line breaks: the server emits free text
//! terminated by `\r\n` (sometimes a bare `\n`), and the client sends one command per
//! line. This codec handles:
//!
//! - **Line splitting** on `\n`, with an optional preceding `\r` removed
//! - **Telnet noise**: IAC negotiation and subnegotiation sequences are dropped
//! - **Permissive decoding**: bytes that are not valid UTF-8 are dropped, never fatal
//! - **Overlong lines**: split at the configured maximum instead of failing the stream
//! - **Partial flush**: an unterminated tail can be drained on demand with
//!   [`ConsoleCodec::take_partial`], for replies that never send a final newline
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use warden_linecodec::ConsoleCodec;
//! use tokio_util::codec::Framed;
//! use tokio::net::TcpStream;
//! use futures::{SinkExt, StreamExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TcpStream::connect("127.0.0.1:8081").await?;
//! let mut framed = Framed::new(stream, ConsoleCodec::new());
//!
//! framed.send("gettime").await?;
//! while let Some(line) = framed.next().await {
//!     println!("{}", line?);
//! }
//! # Ok(())
//! # }
//! ```

mod codec;
mod result;

pub use codec::{ConsoleCodec, DEFAULT_MAX_LINE_LENGTH, LINE_TERMINATOR, decode_permissive};
pub use result::{CodecError, CodecResult};

/// Telnet protocol bytes the codec needs to recognise in order to discard them.
pub mod consts {
    /// Interpret As Command
    pub const IAC: u8 = 255;
    /// Subnegotiation Begin
    pub const SB: u8 = 250;
    /// Subnegotiation End
    pub const SE: u8 = 240;
    /// WILL negotiation verb
    pub const WILL: u8 = 251;
    /// WONT negotiation verb
    pub const WONT: u8 = 252;
    /// DO negotiation verb
    pub const DO: u8 = 253;
    /// DONT negotiation verb
    pub const DONT: u8 = 254;
    /// Carriage Return
    pub const CR: u8 = b'\r';
    /// Line Feed
    pub const LF: u8 = b'\n';
}
