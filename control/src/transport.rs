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

//! TCP transport and the password handshake

use crate::{ConsoleConfig, ConsoleError, Result};
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::codec::{Encoder, FramedRead, FramedWrite};
use tracing::{debug, info, instrument, warn};
use warden_linecodec::ConsoleCodec;

/// Inbound half of an authenticated console, framed into lines
pub(crate) type ConsoleReader = FramedRead<Box<dyn AsyncRead + Send + Sync + Unpin>, ConsoleCodec>;

/// Outbound half of an authenticated console
pub(crate) type ConsoleWriter = FramedWrite<Box<dyn AsyncWrite + Send + Sync + Unpin>, ConsoleCodec>;

/// Open the TCP connection to the console
#[instrument(skip(config), fields(address = %config.address()))]
pub(crate) async fn open(config: &ConsoleConfig) -> Result<TcpStream> {
    let address = config.address();
    let stream = match timeout(config.connect_timeout, TcpStream::connect(&address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => return Err(ConsoleError::from_connect(err)),
        Err(_) => return Err(ConsoleError::ConnectionTimeout),
    };
    stream.set_nodelay(true)?;
    info!(peer = %stream.peer_addr()?, "TCP connection established");
    Ok(stream)
}

/// Run the password handshake on a freshly opened stream
///
/// Waits for the password prompt, sends the password, then waits for a success or
/// rejection marker. Each wait is bounded by `auth_timeout`. A missing prompt is only
/// warned about, since some servers print it late or not at all. After a successful
/// login the banner that follows is read and discarded until the console has been quiet
/// for `banner_settle`.
#[instrument(skip_all)]
pub(crate) async fn authenticate<S>(stream: &mut S, config: &ConsoleConfig) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(1024);

    let deadline = Instant::now() + config.auth_timeout;
    let prompt = [config.prompt_marker.as_str()];
    match read_until(stream, &mut buffer, &prompt, deadline).await? {
        Some(_) => debug!("Password prompt received"),
        None => warn!("No password prompt before timeout, sending password anyway"),
    }
    buffer.clear();

    let mut line = BytesMut::new();
    ConsoleCodec::new().encode(config.password.as_str(), &mut line)?;
    stream.write_all(&line).await?;
    stream.flush().await?;

    let mut markers = vec![config.rejection_marker.as_str()];
    markers.extend(config.success_markers.iter().map(String::as_str));
    let deadline = Instant::now() + config.auth_timeout;
    match read_until(stream, &mut buffer, &markers, deadline).await? {
        Some(Found { marker: 0, .. }) => {
            warn!("Console rejected the password");
            Err(ConsoleError::AuthRejected)
        }
        Some(Found { end, .. }) => {
            let banner = buffer.len() - end;
            let banner = banner + drain_quiet(stream, config.banner_settle, deadline).await?;
            info!(banner_bytes = banner, "Authenticated with console");
            Ok(())
        }
        None => {
            warn!("No login confirmation before timeout");
            Err(ConsoleError::AuthTimeout)
        }
    }
}

/// Discard input until nothing arrives for `settle`, or `deadline` passes
async fn drain_quiet<S>(stream: &mut S, settle: Duration, deadline: Instant) -> Result<usize>
where
    S: AsyncRead + Unpin,
{
    let mut scratch = BytesMut::with_capacity(1024);
    let mut drained = 0;
    loop {
        let quiet = (Instant::now() + settle).min(deadline);
        match timeout_at(quiet, stream.read_buf(&mut scratch)).await {
            Ok(Ok(0)) => return Err(ConsoleError::ConnectionClosed),
            Ok(Ok(read)) => {
                drained += read;
                scratch.clear();
            }
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Ok(drained),
        }
    }
}

/// A marker located in the handshake buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Found {
    /// Index into the marker list
    marker: usize,
    /// Offset just past the marker
    end: usize,
}

fn find_marker(buffer: &[u8], markers: &[&str]) -> Option<Found> {
    markers.iter().enumerate().find_map(|(marker, text)| {
        let needle = text.as_bytes();
        if needle.is_empty() || needle.len() > buffer.len() {
            return None;
        }
        buffer
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|start| Found {
                marker,
                end: start + needle.len(),
            })
    })
}

/// Read into `buffer` until one of `markers` shows up or `deadline` passes
async fn read_until<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    markers: &[&str],
    deadline: Instant,
) -> Result<Option<Found>>
where
    S: AsyncRead + Unpin,
{
    loop {
        if let Some(found) = find_marker(buffer, markers) {
            return Ok(Some(found));
        }
        match timeout_at(deadline, stream.read_buf(buffer)).await {
            Ok(Ok(0)) => return Err(ConsoleError::ConnectionClosed),
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Ok(None),
        }
    }
}

/// Split an authenticated stream into framed halves
pub(crate) fn split<S>(stream: S, max_line_length: usize) -> (ConsoleReader, ConsoleWriter)
where
    S: AsyncRead + AsyncWrite + Send + Sync + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let inbound: Box<dyn AsyncRead + Send + Sync + Unpin> = Box::new(read_half);
    let outbound: Box<dyn AsyncWrite + Send + Sync + Unpin> = Box::new(write_half);
    (
        FramedRead::new(inbound, ConsoleCodec::with_max_line_length(max_line_length)),
        FramedWrite::new(outbound, ConsoleCodec::with_max_line_length(max_line_length)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::io::duplex;

    fn config() -> ConsoleConfig {
        ConsoleConfig::new("localhost", 8081)
            .with_password("hunter2")
            .with_auth_timeout(Duration::from_millis(200))
            .with_banner_settle(Duration::from_millis(30))
    }

    #[test]
    fn test_find_marker() {
        let markers = ["Password incorrect", "Logon successful."];
        assert_eq!(
            find_marker(b"xx Logon successful.\r\n", &markers),
            Some(Found { marker: 1, end: 20 })
        );
        assert_eq!(find_marker(b"Logon succ", &markers), None);
        assert_eq!(find_marker(b"", &markers), None);
    }

    #[tokio::test]
    async fn test_authenticate_discards_banner() {
        let (mut client, mut server) = duplex(1024);
        let server_task = tokio::spawn(async move {
            server.write_all(b"Please enter password:\r\n").await.unwrap();
            let mut buf = [0u8; 64];
            let n = server.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"hunter2\r\n");
            server
                .write_all(b"Logon successful.\r\n\r\n*** Server version: Alpha 21.2\r\n")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            server.write_all(b"Press 'help' to get a list of all commands.\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            server.write_all(b"Day 7, 14:23\r\n").await.unwrap();
            server
        });

        authenticate(&mut client, &config()).await.unwrap();
        let server = server_task.await.unwrap();

        let (mut reader, _writer) = split(client, 1024);
        assert_eq!(reader.next().await.unwrap().unwrap(), "Day 7, 14:23");
        drop(server);
    }

    #[tokio::test]
    async fn test_authenticate_rejected() {
        let (mut client, mut server) = duplex(1024);
        tokio::spawn(async move {
            server.write_all(b"Please enter password:\r\n").await.unwrap();
            let mut buf = [0u8; 64];
            let _ = server.read(&mut buf).await.unwrap();
            server.write_all(b"Password incorrect, please enter password:\r\n").await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        let err = authenticate(&mut client, &config()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::AuthRejected));
    }

    #[tokio::test]
    async fn test_authenticate_times_out_without_confirmation() {
        let (mut client, mut server) = duplex(1024);
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let _ = server.read(&mut buf).await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let err = authenticate(&mut client, &config()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::AuthTimeout));
    }

    #[tokio::test]
    async fn test_authenticate_closed_stream() {
        let (mut client, server) = duplex(1024);
        drop(server);
        let err = authenticate(&mut client, &config()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_split_frames_lines() {
        let (client, mut server) = duplex(1024);
        let (mut reader, _writer) = split(client, 1024);
        server.write_all(b"first\r\nsecond\r\n").await.unwrap();

        assert_eq!(reader.next().await.unwrap().unwrap(), "first");
        assert_eq!(reader.next().await.unwrap().unwrap(), "second");
    }
}
