/*
 *  radio/player.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  External audio player process
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

use std::env;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::process::{Child, Command};

use crate::radio::api::Song;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("{0} not found on PATH")]
    NotFound(String),
    #[error("failed to start player: {0}")]
    Spawn(#[from] io::Error),
    #[error("song has no media link")]
    MissingMediaLink,
}

/// Locate `program` the way a shell would.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let is_exec = |p: &Path| {
        p.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    };

    if program.contains('/') {
        let p = PathBuf::from(program);
        return is_exec(&p).then_some(p);
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|p| is_exec(p))
}

/// Arguments for a headless player run of `url`, optionally seeking to `start`.
pub fn player_args(url: &str, start: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = ["-nodisp", "-autoexit", "-loglevel", "quiet", url]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if let Some(start) = start {
        args.push("-ss".to_string());
        args.push(start.to_string());
    }
    args
}

/// One external player process at a time
pub struct AudioPlayer {
    program: String,
    stop_timeout: Duration,
    child: Option<Child>,
}

impl AudioPlayer {
    pub fn new(program: &str, stop_timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            stop_timeout,
            child: None,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn available(&self) -> bool {
        find_on_path(&self.program).is_some()
    }

    /// Replace whatever is playing with `song`.
    pub async fn play(&mut self, song: &Song) -> Result<(), PlayerError> {
        let url = song.media_link.as_deref().filter(|u| !u.is_empty()).ok_or(PlayerError::MissingMediaLink)?;

        self.stop().await;

        let args = player_args(url, song.start_offset().as_deref());
        debug!("{} {}", self.program, args.join(" "));
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => PlayerError::NotFound(self.program.clone()),
                _ => PlayerError::Spawn(e),
            })?;

        info!(
            "Now Playing: {} by {}",
            song.title.as_deref().unwrap_or("Unknown"),
            song.artist.as_deref().unwrap_or("Unknown")
        );
        self.child = Some(child);
        Ok(())
    }

    /// Ask the player to exit, kill it if it has not within the stop timeout.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        info!("Stopping current playback");

        if let Some(pid) = child.id() {
            // SAFETY: pid belongs to a child we spawned and have not reaped
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }

        match tokio::time::timeout(self.stop_timeout, child.wait()).await {
            Ok(Ok(status)) => debug!("Player exited: {}", status),
            Ok(Err(e)) => warn!("Waiting for player failed: {}", e),
            Err(_) => {
                warn!("Player ignored SIGTERM for {:?}, killing", self.stop_timeout);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill player: {}", e);
                }
            }
        }
    }

    /// True while the player process is still running.
    pub fn is_playback_active(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// True once a started player has exited on its own.
    pub fn finished(&mut self) -> bool {
        self.child.is_some() && !self.is_playback_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Instant;

    fn script(name: &str, body: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("plexradio-{}-{}", name, std::process::id()));
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn song(link: Option<&str>) -> Song {
        Song {
            artist: Some("Miles Davis".into()),
            title: Some("So What".into()),
            media_link: link.map(str::to_string),
            start_time: None,
        }
    }

    #[test]
    fn test_player_args() {
        assert_eq!(
            player_args("http://x/a.mp3", None),
            vec!["-nodisp", "-autoexit", "-loglevel", "quiet", "http://x/a.mp3"]
        );
        let with_seek = player_args("http://x/a.mp3", Some("42"));
        assert_eq!(&with_seek[5..], &["-ss".to_string(), "42".to_string()]);
    }

    #[test]
    fn test_find_on_path() {
        assert!(find_on_path("sh").is_some());
        assert!(find_on_path("plexradio-no-such-player").is_none());
        assert!(find_on_path("/bin/sh").is_some());
    }

    #[tokio::test]
    async fn test_missing_media_link() {
        let mut player = AudioPlayer::new("sh", Duration::from_secs(1));
        assert!(matches!(player.play(&song(None)).await, Err(PlayerError::MissingMediaLink)));
        assert!(!player.is_playback_active());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let mut player = AudioPlayer::new("plexradio-no-such-player", Duration::from_secs(1));
        assert!(!player.available());
        assert!(matches!(
            player.play(&song(Some("http://x/a.mp3"))).await,
            Err(PlayerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_play_then_stop() {
        let path = script("play", "sleep 30");
        let mut player = AudioPlayer::new(path.to_str().unwrap(), Duration::from_secs(2));
        assert!(player.available());
        player.play(&song(Some("http://x/a.mp3"))).await.unwrap();
        assert!(player.is_playback_active());

        let start = Instant::now();
        player.stop().await;
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!player.is_playback_active());
        assert!(!player.finished());
        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_stubborn_player_is_killed() {
        let path = script("stubborn", "trap '' TERM\nwhile true; do sleep 1; done");
        let mut player = AudioPlayer::new(path.to_str().unwrap(), Duration::from_millis(300));
        player.play(&song(Some("http://x/a.mp3"))).await.unwrap();
        // give the shell time to install its trap
        tokio::time::sleep(Duration::from_millis(200)).await;
        player.stop().await;
        assert!(!player.is_playback_active());
        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_finished_after_exit() {
        let path = script("quick", "exit 0");
        let mut player = AudioPlayer::new(path.to_str().unwrap(), Duration::from_secs(1));
        player.play(&song(Some("http://x/a.mp3"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(player.finished());
        let _ = fs::remove_file(path);
    }
}
