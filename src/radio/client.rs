/*
 *  radio/client.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Radio client - playback state, controls and the render loop
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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::Config;
use crate::display::{
    ChannelScreen, ContextPatch, DisplayManager, ErrorScreen, GoodbyeScreen, VolumeScreen,
};
use crate::radio::api::{ApiError, Channel, RadioApi};
use crate::radio::buttons::ButtonEvent;
use crate::radio::persist::ChannelStore;
use crate::radio::player::AudioPlayer;
use crate::radio::volume::Mixer;

/// How long the shutdown sequence pumps the goodbye screen between frames
const GOODBYE_FRAME: Duration = Duration::from_millis(50);

/// Granularity of the playback loop's sleep, bounds shutdown latency
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Run display work that may sleep without stalling the async runtime.
pub fn blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioSettings {
    pub timed_duration: Duration,
    pub error_duration: Duration,
    pub startup_volume: u8,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            timed_duration: Duration::from_secs(2),
            error_duration: Duration::from_secs(3),
            startup_volume: 15,
        }
    }
}

impl RadioSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            timed_duration: cfg.screen.timed_duration(),
            error_duration: cfg.screen.error_duration(),
            startup_volume: cfg.playback.startup_volume(),
        }
    }
}

#[derive(Debug, Default)]
struct RadioState {
    is_playing: bool,
    channels: Vec<Channel>,
    current_channel: usize,
    last_song_title: Option<String>,
    channel_has_changed: bool,
}

/// The radio: power, tuning, volume and the background loops that keep
/// the player and the display in step with the server.
pub struct RadioClient {
    api: RadioApi,
    player: tokio::sync::Mutex<AudioPlayer>,
    mixer: Mixer,
    store: ChannelStore,
    display: Arc<DisplayManager>,
    settings: RadioSettings,
    state: Mutex<RadioState>,
    shutdown: Arc<AtomicBool>,
}

impl RadioClient {
    pub fn new(
        api: RadioApi,
        player: AudioPlayer,
        mixer: Mixer,
        store: ChannelStore,
        display: Arc<DisplayManager>,
        settings: RadioSettings,
    ) -> Self {
        let state = RadioState {
            current_channel: store.load(),
            ..Default::default()
        };
        Self {
            api,
            player: tokio::sync::Mutex::new(player),
            mixer,
            store,
            display,
            settings,
            state: Mutex::new(state),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(cfg: &Config, display: Arc<DisplayManager>) -> Result<Self, ApiError> {
        let api = RadioApi::new(cfg.api.base_url(), cfg.api.timeout())?;
        let player = AudioPlayer::new(cfg.playback.player(), cfg.playback.stop_timeout());
        let store = ChannelStore::new(cfg.playback.persistence_file());
        Ok(Self::new(api, player, Mixer::default(), store, display, RadioSettings::from_config(cfg)))
    }

    fn lock(&self) -> MutexGuard<'_, RadioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn display(&self) -> &Arc<DisplayManager> {
        &self.display
    }

    pub fn is_playing(&self) -> bool {
        self.lock().is_playing
    }

    pub fn current_channel(&self) -> usize {
        self.lock().current_channel
    }

    pub fn channel_count(&self) -> usize {
        self.lock().channels.len()
    }

    pub fn last_song_title(&self) -> Option<String> {
        self.lock().last_song_title.clone()
    }

    pub async fn player_available(&self) -> bool {
        self.player.lock().await.available()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Name of the tuned channel, `"Radio"` when unknown
    pub fn current_channel_name(&self) -> String {
        let state = self.lock();
        state
            .channels
            .get(state.current_channel)
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| "Radio".to_string())
    }

    /// Render context reflecting the radio right now
    pub fn display_context(&self) -> ContextPatch {
        let name = self.current_channel_name();
        let state = self.lock();
        ContextPatch::new()
            .playing(state.is_playing)
            .channel_name(name)
            .current_song(state.last_song_title.clone().unwrap_or_else(|| "Loading...".to_string()))
    }

    pub async fn handle(&self, event: ButtonEvent) {
        debug!("Handling {:?}", event);
        match event {
            ButtonEvent::Power => self.toggle_power().await,
            ButtonEvent::VolumeUp => self.adjust_volume(true).await,
            ButtonEvent::VolumeDown => self.adjust_volume(false).await,
            ButtonEvent::ChannelNext => self.change_channel(1).await,
            ButtonEvent::ChannelPrev => self.change_channel(-1).await,
        }
    }

    pub async fn toggle_power(&self) {
        if self.is_playing() {
            info!("Radio turned OFF");
            {
                let mut state = self.lock();
                state.is_playing = false;
                state.last_song_title = None;
            }
            self.stop_playback().await;
            blocking(|| self.display.clear_display());
            return;
        }

        info!("Radio turned ON");
        info!("Setting volume to {}% for safe startup", self.settings.startup_volume);
        self.mixer.set_volume(self.settings.startup_volume).await;

        // drop any error screen left from a failed start
        blocking(|| self.display.clear_display());

        if self.channel_count() == 0 {
            let message = match self.api.fetch_channels().await {
                Err(e) => {
                    warn!("Cannot start: server connection failed ({})", e);
                    Some("Server Not Found")
                }
                Ok(channels) if channels.is_empty() => {
                    warn!("Cannot start: no channels available");
                    Some("No Channels")
                }
                Ok(channels) => {
                    let mut state = self.lock();
                    if state.current_channel >= channels.len() {
                        warn!(
                            "Saved channel {} out of range ({} channels), using 0",
                            state.current_channel,
                            channels.len()
                        );
                        state.current_channel = 0;
                    }
                    state.channels = channels;
                    None
                }
            };
            if let Some(message) = message {
                let screen = ErrorScreen::timed(message, self.settings.error_duration);
                blocking(|| self.display.show_screen(Box::new(screen), true));
                return;
            }
        }

        {
            let mut state = self.lock();
            state.is_playing = true;
            state.channel_has_changed = true;
        }
        blocking(|| self.display.clear_display());
    }

    /// Step `direction` channels, wrapping at either end.
    pub async fn change_channel(&self, direction: i64) {
        let (index, name) = {
            let mut state = self.lock();
            let count = state.channels.len();
            if !state.is_playing || count == 0 {
                return;
            }
            let index = (state.current_channel as i64 + direction).rem_euclid(count as i64) as usize;
            state.current_channel = index;
            state.last_song_title = None;
            state.channel_has_changed = true;
            let name = state.channels[index]
                .name
                .clone()
                .unwrap_or_else(|| format!("Channel {}", index));
            (index, name)
        };

        self.stop_playback().await;
        self.store.save(index);
        info!("Switched to channel: {}", name);

        let screen = ChannelScreen::new(self.settings.timed_duration);
        blocking(|| {
            self.display.update_context(ContextPatch::new().channel_text(name));
            self.display.show_screen(Box::new(screen), true);
        });
    }

    pub async fn adjust_volume(&self, up: bool) {
        self.mixer.adjust(up).await;
        let volume = self.mixer.current_volume().await;
        info!("Volume {} - Current: {}", if up { "UP" } else { "DOWN" }, volume);

        let screen = VolumeScreen::new(self.settings.timed_duration);
        blocking(|| {
            self.display.update_context(ContextPatch::new().volume_text(volume));
            self.display.show_screen(Box::new(screen), true);
        });
    }

    pub async fn stop_playback(&self) {
        self.player.lock().await.stop().await;
    }

    /// One playback check: restart the player when the station moved on to
    /// a new song or the channel changed. Returns whether the radio is on.
    pub async fn poll_playback(&self) -> bool {
        let (playing, channel) = {
            let state = self.lock();
            (state.is_playing, state.current_channel)
        };
        if !playing {
            return false;
        }

        if self.player.lock().await.finished() {
            info!("Song finished playing");
            self.lock().last_song_title = None;
        }

        let Some(song) = self.api.fetch_current_song(channel).await else {
            return true;
        };
        let title = song.display_title();

        // Power-off and channel changes flip the state before they take the
        // player lock, so checking under the lock never starts a stale song.
        let mut player = self.player.lock().await;
        let needs_restart = {
            let state = self.lock();
            if state.current_channel != channel || !state.is_playing {
                return state.is_playing;
            }
            state.last_song_title.as_deref() != Some(title.as_str()) || state.channel_has_changed
        };
        if !needs_restart {
            return true;
        }

        match player.play(&song).await {
            Ok(()) => {
                let mut state = self.lock();
                state.last_song_title = Some(title);
                state.channel_has_changed = false;
            }
            Err(e) => warn!("Could not play {}: {}", title, e),
        }
        true
    }

    /// Context refresh plus one frame every `refresh` until shutdown.
    pub async fn run_display(self: Arc<Self>, refresh: Duration) {
        while !self.is_shutdown() {
            let patch = self.display_context();
            blocking(|| {
                self.display.update_context(patch);
                self.display.update_display();
            });
            tokio::time::sleep(refresh).await;
        }
        debug!("Display loop stopped");
    }

    /// Poll the server every `poll` while on, every second while off.
    pub async fn run_playback(self: Arc<Self>, poll: Duration) {
        while !self.is_shutdown() {
            let playing = self.poll_playback().await;
            let wait = if playing { poll } else { Duration::from_secs(1) };
            let until = Instant::now() + wait;
            while !self.is_shutdown() && Instant::now() < until {
                tokio::time::sleep(SLEEP_SLICE.min(until.saturating_duration_since(Instant::now()))).await;
            }
        }
        debug!("Playback loop stopped");
    }

    /// Apply button presses one at a time, in order.
    pub async fn run_controls(self: Arc<Self>, mut events: UnboundedReceiver<ButtonEvent>) {
        while let Some(event) = events.recv().await {
            if self.is_shutdown() {
                break;
            }
            self.handle(event).await;
        }
        debug!("Control loop stopped");
    }

    /// Final teardown once the loops have been told to stop.
    pub async fn farewell(&self, goodbye: Duration) {
        self.request_shutdown();
        self.stop_playback().await;

        let screen = GoodbyeScreen::new(goodbye);
        blocking(|| self.display.show_screen(Box::new(screen), true));
        let start = Instant::now();
        while start.elapsed() < goodbye {
            blocking(|| self.display.update_display());
            tokio::time::sleep(GOODBYE_FRAME).await;
        }

        info!("Clearing display");
        blocking(|| self.display.clear_display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DefaultRadioScreen, ManagerSettings, MockDriver};
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP server answering GETs from a fixed route table
    async fn serve(routes: Vec<(&'static str, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = sock.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let response = match routes.iter().find(|(p, _)| *p == path) {
                        Some((_, body)) => format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ),
                        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
                    };
                    let _ = sock.write_all(response.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });
        format!("http://{}", addr)
    }

    fn channels_body(names: &[&str]) -> String {
        let list: Vec<String> = names.iter().map(|n| format!(r#"{{"name":"{}"}}"#, n)).collect();
        format!(r#"{{"status":"success","data":[{}]}}"#, list.join(","))
    }

    fn song_body(artist: &str, title: &str) -> String {
        format!(
            r#"{{"status":"success","data":{{"artist":"{}","title":"{}","media_link":"http://media/1.mp3"}}}}"#,
            artist, title
        )
    }

    fn store_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("plexradio-client-{}-{}.txt", name, std::process::id()))
    }

    fn radio(base_url: &str, name: &str) -> (Arc<RadioClient>, MockDriver) {
        let driver = MockDriver::new(16, 2);
        let probe = driver.clone();
        let display = Arc::new(DisplayManager::new(
            Box::new(driver),
            Box::new(DefaultRadioScreen::default()),
            ManagerSettings::immediate(),
        ));
        let path = store_path(name);
        let _ = std::fs::remove_file(&path);
        let client = RadioClient::new(
            RadioApi::new(base_url, Duration::from_secs(2)).unwrap(),
            AudioPlayer::new("true", Duration::from_secs(1)),
            Mixer::new("plexradio-no-such-mixer"),
            ChannelStore::new(path),
            display,
            RadioSettings::default(),
        );
        (Arc::new(client), probe)
    }

    #[test]
    fn test_blocking_outside_runtime() {
        assert_eq!(blocking(|| 7), 7);
    }

    #[tokio::test]
    async fn test_blocking_on_current_thread_runtime() {
        let (radio, probe) = radio("http://127.0.0.1:9", "blocking-ct");
        blocking(|| radio.display().show_screen(Box::new(ErrorScreen::persistent("x missing")), true));
        blocking(|| radio.display().update_display());
        assert_eq!(probe.lines()[1], "   x missing    ");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_on_multi_thread_runtime() {
        let value = blocking(|| {
            std::thread::sleep(Duration::from_millis(5));
            42
        });
        assert_eq!(value, 42);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_power_on_without_server_shows_error() {
        let (radio, probe) = radio("http://127.0.0.1:9", "noserver");
        radio.toggle_power().await;
        assert!(!radio.is_playing());
        assert_eq!(radio.display().active_screen(), Some("error"));
        radio.display().update_display();
        assert_eq!(probe.lines()[1], "Server Not Found");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_power_on_with_no_channels_shows_error() {
        let url = serve(vec![("/channels", channels_body(&[]))]).await;
        let (radio, probe) = radio(&url, "nochannels");
        radio.toggle_power().await;
        assert!(!radio.is_playing());
        radio.display().update_display();
        assert_eq!(probe.lines()[1], "  No Channels   ");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_power_on_plays_current_song_once() {
        let url = serve(vec![
            ("/channels", channels_body(&["Jazz FM", "Rock"])),
            ("/current-song/0", song_body("Miles Davis", "So What")),
        ])
        .await;
        let (radio, _probe) = radio(&url, "plays");
        radio.toggle_power().await;
        assert!(radio.is_playing());
        assert_eq!(radio.channel_count(), 2);
        assert_eq!(radio.current_channel_name(), "Jazz FM");
        assert!(radio.display().active_screen().is_none());

        assert!(radio.poll_playback().await);
        assert_eq!(radio.last_song_title().as_deref(), Some("Miles Davis - So What"));

        let patch = radio.display_context();
        assert_eq!(patch.is_playing, Some(true));
        assert_eq!(patch.current_song.as_deref(), Some("Miles Davis - So What"));

        radio.toggle_power().await;
        assert!(!radio.is_playing());
        assert_eq!(radio.last_song_title(), None);
        assert!(!radio.poll_playback().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_power_off_while_poll_waits_for_player_starts_nothing() {
        let url = serve(vec![
            ("/channels", channels_body(&["Jazz FM"])),
            ("/current-song/0", song_body("Miles Davis", "So What")),
        ])
        .await;
        let (radio, _probe) = radio(&url, "poll-race");
        radio.toggle_power().await;
        assert!(radio.is_playing());

        // hold the player while the poll fetches, then switch off underneath it
        let held = radio.player.lock().await;
        let poll = tokio::spawn({
            let radio = Arc::clone(&radio);
            async move { radio.poll_playback().await }
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
        radio.lock().is_playing = false;
        drop(held);

        assert!(!poll.await.unwrap());
        assert!(!radio.player.lock().await.is_playback_active());
        assert_eq!(radio.last_song_title(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_channel_change_while_poll_waits_for_player_keeps_restart_pending() {
        let url = serve(vec![
            ("/channels", channels_body(&["Jazz FM", "Rock"])),
            ("/current-song/0", song_body("Miles Davis", "So What")),
        ])
        .await;
        let (radio, _probe) = radio(&url, "poll-retune");
        radio.toggle_power().await;

        let held = radio.player.lock().await;
        let poll = tokio::spawn({
            let radio = Arc::clone(&radio);
            async move { radio.poll_playback().await }
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
        {
            let mut state = radio.lock();
            state.current_channel = 1;
            state.channel_has_changed = true;
        }
        drop(held);

        assert!(poll.await.unwrap());
        assert_eq!(radio.last_song_title(), None);
        assert!(radio.lock().channel_has_changed);
        let _ = std::fs::remove_file(store_path("poll-retune"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_change_channel_wraps_and_persists() {
        let url = serve(vec![("/channels", channels_body(&["Jazz FM", "Rock", "Talk"]))]).await;
        let (radio, probe) = radio(&url, "wrap");
        radio.toggle_power().await;
        assert_eq!(radio.current_channel(), 0);

        radio.change_channel(-1).await;
        assert_eq!(radio.current_channel(), 2);
        assert_eq!(ChannelStore::new(store_path("wrap")).load(), 2);
        assert_eq!(radio.display().active_screen(), Some("channel"));
        assert_eq!(radio.display().context().channel_text(), "Talk");

        radio.display().update_display();
        assert_eq!(probe.lines(), vec!["    Channel     ", "      Talk      "]);

        radio.change_channel(1).await;
        assert_eq!(radio.current_channel(), 0);
        let _ = std::fs::remove_file(store_path("wrap"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_change_channel_ignored_while_off() {
        let (radio, _probe) = radio("http://127.0.0.1:9", "off");
        radio.change_channel(1).await;
        assert_eq!(radio.current_channel(), 0);
        assert!(radio.display().active_screen().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_volume_shows_screen() {
        let (radio, probe) = radio("http://127.0.0.1:9", "volume");
        radio.handle(ButtonEvent::VolumeUp).await;
        assert_eq!(radio.display().active_screen(), Some("volume"));
        radio.display().update_display();
        assert_eq!(probe.lines(), vec!["     Volume     ", "      N/A       "]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_channel_name_defaults_to_radio() {
        let (radio, _probe) = radio("http://127.0.0.1:9", "name");
        assert_eq!(radio.current_channel_name(), "Radio");
        assert_eq!(radio.display_context().current_song.as_deref(), Some("Loading..."));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_farewell_shows_goodbye_then_clears() {
        let (radio, probe) = radio("http://127.0.0.1:9", "bye");
        radio.farewell(Duration::from_millis(120)).await;
        assert!(radio.is_shutdown());
        assert!(radio.display().active_screen().is_none());
        assert_eq!(probe.lines(), vec![String::new(), String::new()]);
        let history = probe.state().lock().unwrap().history.clone();
        assert!(history.iter().any(|(line, text)| *line == 1 && text == "    Goodbye!    "));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_loops_stop_on_shutdown() {
        let (radio, _probe) = radio("http://127.0.0.1:9", "loops");
        let display = tokio::spawn(Arc::clone(&radio).run_display(Duration::from_millis(10)));
        let playback = tokio::spawn(Arc::clone(&radio).run_playback(Duration::from_secs(10)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        radio.request_shutdown();
        tokio::time::timeout(Duration::from_secs(2), display).await.unwrap().unwrap();
        tokio::time::timeout(Duration::from_secs(2), playback).await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_control_loop_applies_events_in_order() {
        let url = serve(vec![("/channels", channels_body(&["A", "B", "C"]))]).await;
        let (radio, _probe) = radio(&url, "controls");
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let task = tokio::spawn(Arc::clone(&radio).run_controls(rx));
        tx.send(ButtonEvent::Power).unwrap();
        tx.send(ButtonEvent::ChannelNext).unwrap();
        tx.send(ButtonEvent::ChannelNext).unwrap();
        drop(tx);
        task.await.unwrap();
        assert!(radio.is_playing());
        assert_eq!(radio.current_channel(), 2);
        let _ = std::fs::remove_file(store_path("controls"));
    }
}
