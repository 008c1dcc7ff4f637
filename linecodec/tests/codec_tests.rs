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

//! Stream-level tests for ConsoleCodec over an in-memory duplex pipe

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
use tokio::time::{Duration, timeout};
use tokio_util::codec::{FramedRead, FramedWrite};
use warden_linecodec::{ConsoleCodec, consts};

#[tokio::test]
async fn test_lines_arrive_across_reads() {
    let (client, mut server) = duplex(64);
    let mut reader = FramedRead::new(client, ConsoleCodec::new());

    server.write_all(b"2024-01-01T10:00:00 1.0 INF Play").await.unwrap();
    server.write_all(b"erLogin: Alice/V 1.0\r\nDay 7").await.unwrap();
    server.write_all(b", 14:23\r\n").await.unwrap();

    let first = reader.next().await.unwrap().unwrap();
    let second = reader.next().await.unwrap().unwrap();
    assert_eq!(first, "2024-01-01T10:00:00 1.0 INF PlayerLogin: Alice/V 1.0");
    assert_eq!(second, "Day 7, 14:23");
}

#[tokio::test]
async fn test_partial_tail_can_be_drained() {
    let (client, mut server) = duplex(64);
    let mut reader = FramedRead::new(client, ConsoleCodec::new());

    server.write_all(b"done\r\npar").await.unwrap();
    assert_eq!(reader.next().await.unwrap().unwrap(), "done");

    // Nothing else is coming; the tail stays buffered until drained.
    let pending = timeout(Duration::from_millis(50), reader.next()).await;
    assert!(pending.is_err());

    let tail = ConsoleCodec::take_partial(reader.read_buffer_mut());
    assert_eq!(tail.as_deref(), Some("par"));
}

#[tokio::test]
async fn test_eof_flushes_unterminated_line() {
    let (client, mut server) = duplex(64);
    let mut reader = FramedRead::new(client, ConsoleCodec::new());

    server.write_all(b"Press 'help' for help").await.unwrap();
    drop(server);

    assert_eq!(
        reader.next().await.unwrap().unwrap(),
        "Press 'help' for help"
    );
    assert!(reader.next().await.is_none());
}

#[tokio::test]
async fn test_negotiation_is_invisible() {
    let (client, mut server) = duplex(64);
    let mut reader = FramedRead::new(client, ConsoleCodec::new());

    server
        .write_all(&[consts::IAC, consts::WILL, 1, b'o', b'k', b'\r', b'\n'])
        .await
        .unwrap();
    assert_eq!(reader.next().await.unwrap().unwrap(), "ok");
}

#[tokio::test]
async fn test_writer_sends_terminated_commands() {
    let (client, mut server) = duplex(64);
    let mut writer = FramedWrite::new(client, ConsoleCodec::new());

    writer.send("give Alice steelArrow 100 6").await.unwrap();
    writer.send("gettime".to_string()).await.unwrap();
    drop(writer);

    let mut received = String::new();
    server.read_to_string(&mut received).await.unwrap();
    assert_eq!(received, "give Alice steelArrow 100 6\r\ngettime\r\n");
}
