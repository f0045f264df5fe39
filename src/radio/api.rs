/*
 *  radio/api.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Radio service HTTP client
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

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::{Client, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("connection failed: {0}")]
    Connection(#[from] reqwest::Error),
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("bad response body: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Channel {
    #[serde(default)]
    pub name: Option<String>,
}

/// Song currently airing on a channel
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Song {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub media_link: Option<String>,
    /// Seconds into the track, number or string
    #[serde(default)]
    pub start_time: Option<Value>,
}

impl Song {
    /// `artist - title`, used to notice when the station moved on
    pub fn display_title(&self) -> String {
        format!(
            "{} - {}",
            self.artist.as_deref().unwrap_or("Unknown"),
            self.title.as_deref().unwrap_or("Unknown")
        )
    }

    /// Seek argument for the player, `None` when the song starts from the top
    pub fn start_offset(&self) -> Option<String> {
        match self.start_time.as_ref()? {
            Value::Number(n) if n.as_f64().is_some_and(|v| v > 0.0) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() && s.trim() != "0" => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

/// `{"status": "success", "data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Option<T> {
        match self.status.as_deref() {
            Some("success") => self.data,
            _ => None,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Channel list from a `/channels` body. A non-success status is an empty list.
pub fn parse_channels(body: &str) -> Result<Vec<Channel>, ApiError> {
    Ok(decode::<Vec<Channel>>(body)?.into_data().unwrap_or_default())
}

/// Song from a `/current-song/{n}` body. A non-success status is `None`.
pub fn parse_song(body: &str) -> Result<Option<Song>, ApiError> {
    Ok(decode::<Song>(body)?.into_data())
}

/// HTTP client for the radio server
#[derive(Debug, Clone)]
pub struct RadioApi {
    base_url: String,
    client: Client,
}

impl RadioApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(timeout)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    /// All channels. `Err` means the server could not be reached,
    /// `Ok(empty)` means it has nothing to offer.
    pub async fn fetch_channels(&self) -> Result<Vec<Channel>, ApiError> {
        let body = self.get("/channels").await.inspect_err(|e| warn!("Error fetching channels: {}", e))?;
        let channels = parse_channels(&body)?;
        info!("Loaded {} channels from API", channels.len());
        Ok(channels)
    }

    /// What is playing on channel `index`, `None` on any failure.
    pub async fn fetch_current_song(&self, index: usize) -> Option<Song> {
        let result = match self.get(&format!("/current-song/{}", index)).await {
            Ok(body) => parse_song(&body),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!("Error fetching song data: {}", e);
            None
        })
    }
}
