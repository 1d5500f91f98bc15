/*
 *  httprpc.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  AudioControl REST client, now playing query and player commands
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use reqwest::{header, Client};
use serde_json::{json, Value};

use crate::constants::{CONNECT_TIMEOUT, FETCH_TIMEOUT, USER_AGENT};
use crate::deutils::{lookup, value_as_bool, value_as_f64, value_as_string};
use crate::nowplaying::NowPlayingState;
use crate::poller::{Command, FetchError, NowPlayingSource};

const TITLE: &[&str] = &["song.title", "title"];
const ARTIST: &[&str] = &["song.artist", "artist"];
const ALBUM: &[&str] = &["song.album", "album"];
const ARTWORK: &[&str] = &[
    "song.cover_art_url",
    "song.coverUrl",
    "song.artUrl",
    "artwork_url",
    "artUrl",
];
const DURATION: &[&str] = &["song.duration", "duration_seconds", "duration"];
const POSITION: &[&str] = &["position", "position_seconds", "song.position"];
const LIKED: &[&str] = &["song.loved", "song.liked", "is_liked"];
const VOLUME: &[&str] = &["volume", "volume_percent"];

/// Client for the AudioControl REST API rooted at `base`.
#[derive(Debug, Clone)]
pub struct AudioControlClient {
    base: String,
    client: Client,
}

impl AudioControlClient {
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(FETCH_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self { base: base.trim_end_matches('/').to_string(), client })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    pub async fn now_playing(&self) -> Result<NowPlayingState, FetchError> {
        let response = self.client.get(self.url("now-playing")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Protocol(format!("now-playing returned {}", status)));
        }
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| FetchError::Protocol(format!("malformed now-playing body: {}", e)))?;
        parse_now_playing(&body, Instant::now())
    }

    /// Map a command onto its endpoint; toggles resolve against `current`.
    pub async fn command(&self, command: Command, current: Option<&NowPlayingState>) -> Result<(), FetchError> {
        let (path, body) = endpoint(command, current);
        debug!("POST {} {}", path, body.as_ref().map(Value::to_string).unwrap_or_default());

        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Protocol(format!("{} returned {}", path, status)));
        }
        Ok(())
    }
}

fn endpoint(command: Command, current: Option<&NowPlayingState>) -> (&'static str, Option<Value>) {
    match command {
        Command::PlayPause => ("player/playpause", None),
        Command::Next => ("player/next", None),
        Command::Previous => ("player/previous", None),
        Command::ToggleLike => {
            if current.is_some_and(|s| s.is_liked) {
                ("track/unlove", None)
            } else {
                ("track/love", None)
            }
        }
        Command::SetVolume(percent) => ("volume", Some(json!({ "percent": percent.min(100) }))),
        Command::StepVolume(step) => ("volume", Some(json!({ "percent": format!("{:+}", step) }))),
    }
}

impl NowPlayingSource for AudioControlClient {
    fn fetch(&self) -> impl Future<Output = Result<NowPlayingState, FetchError>> + Send {
        self.now_playing()
    }

    fn send(
        &self,
        command: Command,
        current: Option<Arc<NowPlayingState>>,
    ) -> impl Future<Output = Result<(), FetchError>> + Send {
        async move { self.command(command, current.as_deref()).await }
    }
}

/// Lenient mapping of a now-playing body; missing fields fall back to defaults.
///
/// Anything that is not a JSON object is a protocol error.
pub fn parse_now_playing(body: &Value, at: Instant) -> Result<NowPlayingState, FetchError> {
    if !body.is_object() {
        return Err(FetchError::Protocol("now-playing body is not an object".into()));
    }
    let text = |paths: &[&str]| lookup(body, paths).and_then(value_as_string).unwrap_or_default();
    let number = |paths: &[&str]| lookup(body, paths).and_then(value_as_f64);

    let is_playing = match lookup(body, &["state"]).and_then(Value::as_str) {
        Some(state) => state.eq_ignore_ascii_case("playing"),
        None => lookup(body, &["is_playing"]).and_then(value_as_bool).unwrap_or(false),
    };

    let state = NowPlayingState {
        title: text(TITLE),
        artist: text(ARTIST),
        album: text(ALBUM),
        artwork_ref: lookup(body, ARTWORK).and_then(value_as_string),
        position_seconds: number(POSITION).unwrap_or(0.0),
        duration_seconds: number(DURATION).unwrap_or(0.0),
        is_playing,
        is_liked: lookup(body, LIKED).and_then(value_as_bool).unwrap_or(false),
        volume_percent: number(VOLUME).map(|v| v.clamp(0.0, 100.0).round() as u8),
        source_timestamp: at,
    };
    Ok(state.normalized())
}
