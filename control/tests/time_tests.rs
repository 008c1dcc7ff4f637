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

//! Game time queries and the day-regression guard against a fake console

mod common;

use common::*;
use warden_control::{CommandError, ConsoleClient, GameClock, SetTimeError};

/// A console whose clock reads `Day <day>, 10:00` and that accepts everything else
fn game_at(day: u32) -> Responder {
    Box::new(move |command: &str| {
        if command == "gettime" {
            vec![line(&format!("Day {}, 10:00", day))]
        } else {
            vec![line(&format!("Executing command '{}' by Telnet", command))]
        }
    })
}

#[tokio::test]
async fn test_current_time_and_day() {
    let client = ConsoleClient::with_config(fast_config());
    let _console = connect_client(&client, game_at(42)).await;

    assert_eq!(
        client.current_time().await,
        Some(GameClock {
            day: 42,
            hour: 10,
            minute: 0
        })
    );
    assert_eq!(client.current_day().await, Some(42));
}

#[tokio::test]
async fn test_current_time_parse_miss() {
    let client = ConsoleClient::with_config(fast_config());
    let _console = connect_client(&client, reply_with("*** ERROR: unknown command 'gettime'")).await;
    assert_eq!(client.current_time().await, None);
}

#[tokio::test]
async fn test_backwards_rejected_without_mutation() {
    let client = ConsoleClient::with_config(fast_config());
    let console = connect_client(&client, game_at(42)).await;

    let err = client.set_day_and_time(7, 8, 0, false).await.unwrap_err();
    assert_eq!(
        err,
        SetTimeError::Backwards {
            current: 42,
            target: 7
        }
    );
    assert_eq!(console.commands(), vec!["gettime"]);
}

#[tokio::test]
async fn test_force_overrides_backwards_check() {
    let client = ConsoleClient::with_config(fast_config());
    let console = connect_client(&client, game_at(42)).await;

    let message = client.set_day_and_time(7, 8, 0, true).await.unwrap();
    assert_eq!(message, "Time set to Day 7, 08:00");
    assert_eq!(console.commands(), vec!["gettime", "settime 7 8 0"]);
}

#[tokio::test]
async fn test_forward_and_same_day_allowed() {
    let client = ConsoleClient::with_config(fast_config());
    let console = connect_client(&client, game_at(42)).await;

    assert_eq!(
        client.set_day_and_time(42, 21, 30, false).await,
        Ok("Time set to Day 42, 21:30".to_string())
    );
    assert_eq!(
        client.set_day(50, false).await,
        Ok("Time set to Day 50, 08:00".to_string())
    );
    assert_eq!(
        console.commands(),
        vec!["gettime", "settime 42 21 30", "gettime", "settime 50 8 0"]
    );
}

#[tokio::test]
async fn test_invalid_ranges_rejected_before_io() {
    let client = ConsoleClient::with_config(fast_config());
    let console = connect_client(&client, game_at(1)).await;

    assert_eq!(
        client.set_day_and_time(0, 8, 0, true).await,
        Err(SetTimeError::InvalidDay(0))
    );
    assert_eq!(
        client.set_day_and_time(3, 24, 0, true).await,
        Err(SetTimeError::InvalidHour(24))
    );
    assert_eq!(
        client.set_day_and_time(3, 8, 60, true).await,
        Err(SetTimeError::InvalidMinute(60))
    );
    assert!(console.commands().is_empty());
}

#[tokio::test]
async fn test_unknown_current_day() {
    let client = ConsoleClient::with_config(fast_config());
    let console = connect_client(&client, reply_with("Unknown command")).await;

    assert_eq!(
        client.set_day_and_time(3, 8, 0, false).await,
        Err(SetTimeError::UnknownCurrentDay)
    );
    assert_eq!(console.commands(), vec!["gettime"]);
}

#[tokio::test]
async fn test_remote_error_on_settime() {
    let client = ConsoleClient::with_config(fast_config());
    let _console = connect_client(
        &client,
        Box::new(|command: &str| {
            if command == "gettime" {
                vec![line("Day 3, 10:00")]
            } else {
                vec![line("Wrong number of arguments, expected 1 to 3, found 4.")]
            }
        }),
    )
    .await;

    let err = client.set_day_and_time(4, 8, 0, false).await.unwrap_err();
    assert_eq!(
        err,
        SetTimeError::Command(CommandError::Remote(
            "Wrong number of arguments, expected 1 to 3, found 4.".to_string()
        ))
    );
}

#[tokio::test]
async fn test_set_time_disconnected() {
    let client = ConsoleClient::with_config(fast_config());
    assert_eq!(
        client.set_day_and_time(3, 8, 0, false).await,
        Err(SetTimeError::UnknownCurrentDay)
    );
    assert_eq!(
        client.set_day_and_time(3, 8, 0, true).await,
        Err(SetTimeError::Command(CommandError::NotConnected))
    );
}
