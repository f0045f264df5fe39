/*
 *  radio/mod.rs
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

// Channel and song source
pub mod api;

// External audio player process
pub mod player;

// System mixer
pub mod volume;

// Last tuned channel
pub mod persist;

// Front panel buttons
pub mod buttons;

// Radio state machine and background loops
pub mod client;

pub use api::{ApiError, Channel, RadioApi, Song};
pub use buttons::{ButtonEvent, Buttons};
pub use client::{blocking, RadioClient, RadioSettings};
pub use persist::ChannelStore;
pub use player::{AudioPlayer, PlayerError};
pub use volume::Mixer;
