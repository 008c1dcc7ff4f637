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

use crate::{CodecError, consts};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

/// Line terminator the console expects after every command.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Default upper bound on a single inbound line before it is force-split.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

/// A codec for the line-oriented admin console protocol.
///
/// Decoding yields one `String` per inbound line with the terminator removed. Encoding
/// accepts a single command line and appends [`LINE_TERMINATOR`].
#[derive(Debug, Clone)]
pub struct ConsoleCodec {
    max_line_length: usize,
}

impl Default for ConsoleCodec {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ConsoleCodec {
    /// Creates a codec with the default maximum line length.
    ///
    /// # Example
    /// ```
    /// use warden_linecodec::ConsoleCodec;
    ///
    /// let codec = ConsoleCodec::new();
    /// assert_eq!(codec.max_line_length(), warden_linecodec::DEFAULT_MAX_LINE_LENGTH);
    /// ```
    pub fn new() -> ConsoleCodec {
        ConsoleCodec::default()
    }

    /// Creates a codec that splits lines longer than `max` bytes.
    pub fn with_max_line_length(max: usize) -> ConsoleCodec {
        ConsoleCodec {
            max_line_length: max.max(1),
        }
    }

    /// Maximum number of bytes buffered before a line is force-split.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Drains whatever unterminated text is left in `src`.
    ///
    /// Console replies do not always end with a line break, so a reader that has seen the
    /// stream go quiet uses this to hand the tail to whoever is waiting on it. Returns
    /// `None` when nothing printable remains.
    pub fn take_partial(src: &mut BytesMut) -> Option<String> {
        if src.is_empty() {
            return None;
        }
        let raw = src.split();
        let line = finish_line(&raw);
        if line.is_empty() { None } else { Some(line) }
    }
}

impl Decoder for ConsoleCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        match src.iter().position(|b| *b == consts::LF) {
            Some(end) => {
                let raw = src.split_to(end + 1);
                let line = finish_line(&raw[..end]);
                trace!(length = end, "Decoded console line");
                Ok(Some(line))
            }
            None if src.len() >= self.max_line_length => {
                warn!(
                    length = src.len(),
                    max = self.max_line_length,
                    "Console line exceeds maximum length, splitting"
                );
                let raw = src.split_to(self.max_line_length);
                Ok(Some(finish_line(&raw)))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => Ok(ConsoleCodec::take_partial(src)),
        }
    }
}

impl<'a> Encoder<&'a str> for ConsoleCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.trim_end_matches(['\r', '\n']);
        if line.contains(['\r', '\n']) {
            return Err(CodecError::EmbeddedLineBreak);
        }
        dst.reserve(line.len() + LINE_TERMINATOR.len());
        dst.put_slice(line.as_bytes());
        dst.put_slice(LINE_TERMINATOR.as_bytes());
        Ok(())
    }
}

impl Encoder<String> for ConsoleCodec {
    type Error = CodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&str>::encode(self, item.as_str(), dst)
    }
}

fn finish_line(raw: &[u8]) -> String {
    let mut line = decode_permissive(raw);
    while line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Decodes console bytes into text, dropping anything that is not text.
///
/// Telnet IAC sequences (negotiation verbs, subnegotiations and two-byte commands) are
/// removed, then the remainder is decoded as UTF-8 with invalid sequences and NUL bytes
/// discarded rather than replaced.
///
/// # Example
/// ```
/// use warden_linecodec::decode_permissive;
///
/// assert_eq!(decode_permissive(b"\xff\xfb\x01Day 7, 14:23\xc3"), "Day 7, 14:23");
/// ```
pub fn decode_permissive(bytes: &[u8]) -> String {
    let mut clean = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte != consts::IAC {
            clean.push(byte);
            i += 1;
            continue;
        }
        match bytes.get(i + 1).copied() {
            Some(consts::WILL | consts::WONT | consts::DO | consts::DONT) => i += 3,
            Some(consts::SB) => {
                let mut j = i + 2;
                while j + 1 < bytes.len() && !(bytes[j] == consts::IAC && bytes[j + 1] == consts::SE)
                {
                    j += 1;
                }
                i = j + 2;
            }
            Some(_) => i += 2,
            None => i += 1,
        }
    }
    String::from_utf8_lossy(&clean)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER && *c != '\0')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_crlf_and_lf() {
        let mut codec = ConsoleCodec::new();
        let mut buf = BytesMut::from(&b"hello\r\nworld\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("hello"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("world"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_waits_for_terminator() {
        let mut codec = ConsoleCodec::new();
        let mut buf = BytesMut::from(&b"par"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"tial\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("partial"));
    }

    #[test]
    fn test_take_partial_drains_tail() {
        let mut codec = ConsoleCodec::new();
        let mut buf = BytesMut::from(&b"Please enter password:"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(
            ConsoleCodec::take_partial(&mut buf).as_deref(),
            Some("Please enter password:")
        );
        assert!(buf.is_empty());
        assert_eq!(ConsoleCodec::take_partial(&mut buf), None);
    }

    #[test]
    fn test_overlong_line_is_split() {
        let mut codec = ConsoleCodec::with_max_line_length(4);
        let mut buf = BytesMut::from(&b"abcdefg"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("abcd"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_strips_negotiation() {
        let raw = [
            consts::IAC,
            consts::DO,
            1,
            b'o',
            b'k',
            consts::IAC,
            consts::SB,
            24,
            1,
            consts::IAC,
            consts::SE,
        ];
        assert_eq!(decode_permissive(&raw), "ok");
    }

    #[test]
    fn test_decode_drops_invalid_utf8() {
        assert_eq!(decode_permissive(b"Bj\xf6rn"), "Bjrn");
        assert_eq!(decode_permissive("Bjørn".as_bytes()), "Bjørn");
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = ConsoleCodec::new();
        let mut dst = BytesMut::new();
        codec.encode("gettime", &mut dst).unwrap();
        codec.encode("listplayers\n".to_string(), &mut dst).unwrap();
        assert_eq!(&dst[..], b"gettime\r\nlistplayers\r\n");
    }

    #[test]
    fn test_encode_rejects_embedded_break() {
        let mut codec = ConsoleCodec::new();
        let mut dst = BytesMut::new();
        assert_eq!(
            codec.encode("say hi\r\nshutdown", &mut dst),
            Err(CodecError::EmbeddedLineBreak)
        );
        assert!(dst.is_empty());
    }
}
