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

//! Shared fixtures: an in-memory fake console and a recording directory

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncWriteExt, duplex};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_util::codec::FramedRead;
use warden_control::{ConsoleClient, ConsoleConfig, ConsoleEvent};
use warden_directory::{
    Bundle, DirectoryError, MemoryDirectory, PlayerDirectory, Result as DirectoryResult,
};
use warden_linecodec::ConsoleCodec;

/// One thing the fake console does
#[derive(Debug, Clone)]
pub enum Step {
    /// Write text exactly as given
    Write(String),
    /// Write text followed by `\r\n`
    Line(String),
    /// Wait before the next step
    Pause(Duration),
}

pub fn line(text: &str) -> Step {
    Step::Line(text.to_string())
}

pub fn write(text: &str) -> Step {
    Step::Write(text.to_string())
}

pub fn pause(millis: u64) -> Step {
    Step::Pause(Duration::from_millis(millis))
}

/// Decides how the fake console answers each command
pub type Responder = Box<dyn Fn(&str) -> Vec<Step> + Send + Sync>;

/// Answers every command with `text` on one line
pub fn reply_with(text: &'static str) -> Responder {
    Box::new(move |_: &str| vec![line(text)])
}

/// Answers nothing
pub fn silent() -> Responder {
    Box::new(|_: &str| Vec::new())
}

/// Console timings shrunk so tests run quickly
pub fn fast_config() -> ConsoleConfig {
    let mut config = ConsoleConfig::new("fake-console", 8081)
        .with_password("secret")
        .with_auth_timeout(Duration::from_secs(1))
        .with_banner_settle(Duration::from_millis(20))
        .with_command_wait(Duration::from_millis(20))
        .with_bundle_item_wait(Duration::from_millis(10))
        .with_time_query_wait(Duration::from_millis(20))
        .with_read_attempts(Duration::from_millis(150), 3)
        .with_poll_timing(Duration::from_millis(20), Duration::from_millis(5));
    config.raw_command_wait = Duration::from_millis(20);
    config.shutdown_timeout = Duration::from_millis(500);
    config
}

/// Server side of an in-memory console
pub struct FakeConsole {
    commands: Arc<Mutex<Vec<String>>>,
    inject: mpsc::UnboundedSender<Vec<Step>>,
}

impl FakeConsole {
    /// Every command line received so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Emit unsolicited console output; ignored once the console has hung up
    pub fn emit(&self, steps: Vec<Step>) {
        let _ = self.inject.send(steps);
    }

    /// Emit unsolicited console lines
    pub fn emit_lines(&self, lines: &[&str]) {
        self.emit(lines.iter().map(|text| line(text)).collect());
    }
}

/// Start a fake console and log `client` into it
pub async fn connect_client(client: &ConsoleClient, responder: Responder) -> FakeConsole {
    let (client_io, server_io) = duplex(64 * 1024);
    let commands = Arc::new(Mutex::new(Vec::new()));
    let (inject, mut injected) = mpsc::unbounded_channel::<Vec<Step>>();

    let recorded = commands.clone();
    tokio::spawn(async move {
        let (read, mut write) = tokio::io::split(server_io);
        let mut lines = FramedRead::new(read, ConsoleCodec::new());

        write.write_all(b"*** Connected with 7DTD server.\r\n").await.unwrap();
        write.write_all(b"Please enter password:\r\n").await.unwrap();
        match lines.next().await {
            Some(Ok(password)) if password == "secret" => {}
            _ => {
                let _ = write.write_all(b"Password incorrect, please enter password:\r\n").await;
                return;
            }
        }
        write
            .write_all(b"Logon successful.\r\n\r\nPress 'help' to get a list of all commands.\r\n")
            .await
            .unwrap();

        loop {
            tokio::select! {
                received = lines.next() => match received {
                    Some(Ok(command)) => {
                        recorded.lock().unwrap().push(command.clone());
                        for step in responder(&command) {
                            if perform(&mut write, step).await.is_err() {
                                return;
                            }
                        }
                    }
                    _ => return,
                },
                steps = injected.recv() => match steps {
                    Some(steps) => {
                        for step in steps {
                            if perform(&mut write, step).await.is_err() {
                                return;
                            }
                        }
                    }
                    None => return,
                },
            }
        }
    });

    client.connect_stream(client_io).await.unwrap();
    FakeConsole { commands, inject }
}

async fn perform<W>(write: &mut W, step: Step) -> std::io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    match step {
        Step::Write(text) => write.write_all(text.as_bytes()).await,
        Step::Line(text) => write.write_all(format!("{}\r\n", text).as_bytes()).await,
        Step::Pause(duration) => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
    }
}

/// Wait for the next event, failing the test after a generous timeout
pub async fn next_event(events: &mut broadcast::Receiver<ConsoleEvent>) -> ConsoleEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// A directory that remembers every session hook call
#[derive(Default)]
pub struct RecordingDirectory {
    pub memory: MemoryDirectory,
    logins: Mutex<Vec<String>>,
    logouts: Mutex<Vec<(String, Duration)>>,
    failing: AtomicBool,
}

impl RecordingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every session hook return an error
    pub fn failing() -> Self {
        let directory = Self::default();
        directory.failing.store(true, Ordering::SeqCst);
        directory
    }

    pub fn logins(&self) -> Vec<String> {
        self.logins.lock().unwrap().clone()
    }

    pub fn logouts(&self) -> Vec<(String, Duration)> {
        self.logouts.lock().unwrap().clone()
    }

    fn check(&self) -> DirectoryResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DirectoryError::Unavailable("database is locked".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PlayerDirectory for RecordingDirectory {
    async fn resolve_alias(&self, name_or_alias: &str) -> String {
        self.memory.resolve_alias(name_or_alias).await
    }

    async fn record_login(&self, player: &str, _at: SystemTime) -> DirectoryResult<()> {
        self.logins.lock().unwrap().push(player.to_string());
        self.check()
    }

    async fn record_logout(
        &self,
        player: &str,
        _at: SystemTime,
        duration: Duration,
    ) -> DirectoryResult<()> {
        self.logouts
            .lock()
            .unwrap()
            .push((player.to_string(), duration));
        self.check()
    }

    async fn resolve_bundle(&self, bundle: &str) -> DirectoryResult<Option<Bundle>> {
        self.memory.resolve_bundle(bundle).await
    }
}
