/*
 *  radio/persist.rs
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

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

/// Remembers the last tuned channel across restarts
#[derive(Debug, Clone)]
pub struct ChannelStore {
    path: PathBuf,
}

impl ChannelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last saved channel index, 0 if missing or unreadable.
    pub fn load(&self) -> usize {
        match fs::read_to_string(&self.path) {
            Ok(s) => match s.trim().parse::<usize>() {
                Ok(channel) => {
                    info!("Loaded last used channel: {}", channel);
                    channel
                }
                Err(_) => {
                    warn!("Last channel file {} is invalid, defaulting to channel 0", self.path.display());
                    0
                }
            },
            Err(e) => {
                debug!("No last channel file ({}), defaulting to channel 0", e);
                0
            }
        }
    }

    /// Best effort, failures are only logged.
    pub fn save(&self, channel: usize) {
        if let Err(e) = fs::write(&self.path, channel.to_string()) {
            warn!("Error saving last channel to {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("plexradio-{}-{}.txt", name, std::process::id()))
    }

    #[test]
    fn test_save_then_load() {
        let store = ChannelStore::new(temp_path("roundtrip"));
        store.save(7);
        assert_eq!(store.load(), 7);
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_missing_file_is_zero() {
        let store = ChannelStore::new(temp_path("missing"));
        let _ = fs::remove_file(store.path());
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_garbage_is_zero() {
        let store = ChannelStore::new(temp_path("garbage"));
        fs::write(store.path(), "not a number").unwrap();
        assert_eq!(store.load(), 0);
        fs::write(store.path(), " 3\n").unwrap();
        assert_eq!(store.load(), 3);
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        let store = ChannelStore::new("/nonexistent-dir/plexradio/last_channel.txt");
        store.save(2);
        assert_eq!(store.load(), 0);
    }
}
