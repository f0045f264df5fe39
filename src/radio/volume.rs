/*
 *  radio/volume.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  PulseAudio volume control via pactl
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

use std::process::Stdio;

use log::{debug, warn};
use tokio::process::Command;

/// Volume step for one button press, in percent
pub const VOLUME_STEP: u8 = 5;

/// Pull the default sink's volume (e.g. `"65%"`) out of `pactl info` and
/// `pactl list sinks` output.
pub fn parse_volume(info: &str, sinks: &str) -> Option<String> {
    let default_sink = info
        .lines()
        .find_map(|line| line.trim().strip_prefix("Default Sink:"))
        .map(str::trim)
        .filter(|name| !name.is_empty())?;

    sinks
        .split("Sink #")
        .filter(|block| block.contains(default_sink))
        .find_map(|block| {
            block
                .lines()
                .find(|line| line.trim_start().starts_with("Volume:"))
                .and_then(|line| line.split('/').nth(1))
                .map(|pct| pct.trim().to_string())
        })
}

/// PulseAudio / PipeWire mixer driven through `pactl`
#[derive(Debug, Clone)]
pub struct Mixer {
    program: String,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new("pactl")
    }
}

impl Mixer {
    pub fn new(program: &str) -> Self {
        Self { program: program.to_string() }
    }

    async fn run(&self, args: &[&str]) -> Option<String> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await;
        match output {
            Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
            Ok(out) => {
                warn!("{} {} exited with {}", self.program, args.join(" "), out.status);
                None
            }
            Err(e) => {
                warn!("Failed to run {}: {}", self.program, e);
                None
            }
        }
    }

    async fn set_sink_volume(&self, value: &str) {
        debug!("Setting volume {}", value);
        self.run(&["set-sink-volume", "@DEFAULT_SINK@", value]).await;
    }

    /// Set an absolute volume in percent.
    pub async fn set_volume(&self, percent: u8) {
        self.set_sink_volume(&format!("{}%", percent.min(100))).await;
    }

    /// Nudge the volume one step up or down.
    pub async fn adjust(&self, up: bool) {
        let sign = if up { '+' } else { '-' };
        self.set_sink_volume(&format!("{}{}%", sign, VOLUME_STEP)).await;
    }

    /// Current default sink volume, `"N/A"` when it cannot be read.
    pub async fn current_volume(&self) -> String {
        let Some(info) = self.run(&["info"]).await else {
            return "N/A".to_string();
        };
        let Some(sinks) = self.run(&["list", "sinks"]).await else {
            return "N/A".to_string();
        };
        parse_volume(&info, &sinks).unwrap_or_else(|| {
            warn!("Could not find the default sink volume");
            "N/A".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &str = "Server String: /run/user/1000/pulse/native\n\
Server Name: PulseAudio (on PipeWire 0.3.65)\n\
Default Sink: alsa_output.platform-bcm2835_audio.analog-stereo\n\
Default Source: alsa_input.usb-mic.mono-fallback\n";

    const SINKS: &str = "Sink #45\n\
\tState: SUSPENDED\n\
\tName: alsa_output.usb-dac.analog-stereo\n\
\tVolume: front-left: 32768 /  50% / -18.06 dB,   front-right: 32768 /  50% / -18.06 dB\n\
Sink #46\n\
\tState: RUNNING\n\
\tName: alsa_output.platform-bcm2835_audio.analog-stereo\n\
\tMute: no\n\
\tVolume: front-left: 42598 /  65% / -11.23 dB,   front-right: 42598 /  65% / -11.23 dB\n\
\t        balance 0.00\n\
\tBase Volume: 65536 / 100% / 0.00 dB\n";

    #[test]
    fn test_parse_volume_of_default_sink() {
        assert_eq!(parse_volume(INFO, SINKS).as_deref(), Some("65%"));
    }

    #[test]
    fn test_parse_volume_missing_default() {
        assert_eq!(parse_volume("Server Name: x\n", SINKS), None);
        assert_eq!(parse_volume(INFO, "Sink #1\n\tName: other\n"), None);
    }

    #[tokio::test]
    async fn test_missing_mixer_reports_na() {
        let mixer = Mixer::new("plexradio-no-such-mixer");
        assert_eq!(mixer.current_volume().await, "N/A");
        // must not panic either
        mixer.adjust(true).await;
        mixer.set_volume(15).await;
    }
}
