/*
 *  display/context.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
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

/// Shared application state the screens render from
///
/// Every field is optional; screens fall back to the accessor defaults so a
/// partially filled context never fails a frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    pub is_playing: bool,
    pub channel_name: Option<String>,
    pub current_song: Option<String>,
    pub volume_text: Option<String>,
    pub channel_text: Option<String>,
}

impl RenderContext {
    pub fn channel_name(&self) -> &str {
        self.channel_name.as_deref().unwrap_or("Radio")
    }

    pub fn current_song(&self) -> &str {
        self.current_song.as_deref().unwrap_or("Loading...")
    }

    pub fn volume_text(&self) -> &str {
        self.volume_text.as_deref().unwrap_or("N/A")
    }

    pub fn channel_text(&self) -> &str {
        self.channel_text.as_deref().unwrap_or("Unknown")
    }

    /// Merge `patch` in. Strings are trimmed on the way in.
    pub fn apply(&mut self, patch: ContextPatch) {
        if let Some(playing) = patch.is_playing {
            self.is_playing = playing;
        }
        merge(&mut self.channel_name, patch.channel_name);
        merge(&mut self.current_song, patch.current_song);
        merge(&mut self.volume_text, patch.volume_text);
        merge(&mut self.channel_text, patch.channel_text);
    }
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *slot = Some(v.trim().to_string());
    }
}

/// Partial update for [`RenderContext`]
///
/// ```
/// use plexradio::display::ContextPatch;
///
/// let patch = ContextPatch::new()
///     .playing(true)
///     .channel_name("Jazz FM")
///     .current_song("Miles Davis - So What");
/// assert_eq!(patch.is_playing, Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextPatch {
    pub is_playing: Option<bool>,
    pub channel_name: Option<String>,
    pub current_song: Option<String>,
    pub volume_text: Option<String>,
    pub channel_text: Option<String>,
}

impl ContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing(mut self, playing: bool) -> Self {
        self.is_playing = Some(playing);
        self
    }

    pub fn channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = Some(name.into());
        self
    }

    pub fn current_song(mut self, song: impl Into<String>) -> Self {
        self.current_song = Some(song.into());
        self
    }

    pub fn volume_text(mut self, text: impl Into<String>) -> Self {
        self.volume_text = Some(text.into());
        self
    }

    pub fn channel_text(mut self, text: impl Into<String>) -> Self {
        self.channel_text = Some(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
