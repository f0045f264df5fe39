/*
 *  display/screens.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Screens drawn by the display manager
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

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::display::context::RenderContext;
use crate::display::error::DisplayError;
use crate::display::marquee::{Marquee, MarqueeTiming};
use crate::display::text::center_fit;
use crate::display::traits::DisplayDriver;

/// Scrolling banner shown on line 2 while the radio is off
pub const OFF_BANNER: &str = "Radio Off  -  Radio Off  -  Radio Off  -  ";

/// Point in time a frame is rendered for.
///
/// `at` drives expiry and scrolling, `wall` is only used for the clock face.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub at: Instant,
    pub wall: DateTime<Local>,
}

impl Tick {
    pub fn now() -> Self {
        Self {
            at: Instant::now(),
            wall: Local::now(),
        }
    }

    /// The same tick moved `by` into the future.
    pub fn after(&self, by: Duration) -> Self {
        let wall_delta = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            at: self.at + by,
            wall: self.wall + wall_delta,
        }
    }
}

/// Write surface handed to a screen for one frame
///
/// Sits between the screen and the driver and skips lines the manager
/// already sent this screen, unless a full redraw was requested.
pub struct Canvas<'a> {
    driver: &'a mut dyn DisplayDriver,
    memo: &'a mut [Option<String>],
    force: bool,
}

impl<'a> Canvas<'a> {
    pub fn new(driver: &'a mut dyn DisplayDriver, memo: &'a mut [Option<String>], force: bool) -> Self {
        Self { driver, memo, force }
    }

    pub fn width(&self) -> usize {
        self.driver.capabilities().width
    }

    /// Put `text` on a 1-based `line`.
    pub fn line(&mut self, line: usize, text: &str) -> Result<(), DisplayError> {
        let slot = line.checked_sub(1).and_then(|i| self.memo.get_mut(i));
        if let Some(slot) = slot {
            if !self.force && slot.as_deref() == Some(text) {
                return Ok(());
            }
            self.driver.display_text(text, line)?;
            *slot = Some(text.to_string());
            Ok(())
        } else {
            // let the driver produce the error for out of range lines
            self.driver.display_text(text, line)
        }
    }
}

/// A self-contained view on the character display
pub trait Screen: Send {
    fn name(&self) -> &'static str;

    /// Draw one frame. `Ok(false)` means the screen is done and the
    /// manager should fall back to the default screen.
    fn render(&mut self, canvas: &mut Canvas<'_>, ctx: &RenderContext, tick: &Tick)
        -> Result<bool, DisplayError>;

    /// Called when the screen is installed; restarts any display timer.
    fn reset(&mut self) {}

    /// True once a timed screen has run out at `tick`.
    fn expired(&self, _tick: &Tick) -> bool {
        false
    }
}

/// Display duration counted from the first rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenTimer {
    duration: Option<Duration>,
    started: Option<Instant>,
}

impl ScreenTimer {
    pub fn timed(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            started: None,
        }
    }

    pub fn persistent() -> Self {
        Self {
            duration: None,
            started: None,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    pub fn reset(&mut self) {
        self.started = None;
    }

    /// Start on first use and report whether the screen should stay up.
    pub fn still_showing(&mut self, now: Instant) -> bool {
        let started = *self.started.get_or_insert(now);
        match self.duration {
            Some(d) => now.saturating_duration_since(started) < d,
            None => true,
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        match (self.duration, self.started) {
            (Some(d), Some(started)) => now.saturating_duration_since(started) >= d,
            _ => false,
        }
    }
}

fn two_lines(canvas: &mut Canvas<'_>, top: &str, bottom: &str) -> Result<(), DisplayError> {
    let width = canvas.width();
    canvas.line(1, &center_fit(top, width))?;
    canvas.line(2, &center_fit(bottom, width))
}

/// Fallback view: channel and scrolling song while playing, clock and
/// scrolling banner while off. Never expires.
pub struct DefaultRadioScreen {
    song: Marquee,
    banner: Marquee,
}

impl DefaultRadioScreen {
    pub fn new(timing: MarqueeTiming) -> Self {
        Self {
            song: Marquee::new(timing),
            banner: Marquee::new(timing),
        }
    }
}

impl Default for DefaultRadioScreen {
    fn default() -> Self {
        Self::new(MarqueeTiming::default())
    }
}

impl Screen for DefaultRadioScreen {
    fn name(&self) -> &'static str {
        "radio_default"
    }

    fn render(&mut self, canvas: &mut Canvas<'_>, ctx: &RenderContext, tick: &Tick)
        -> Result<bool, DisplayError>
    {
        let width = canvas.width();
        let (top, bottom) = if ctx.is_playing {
            (
                center_fit(ctx.channel_name(), width),
                self.song.window(ctx.current_song(), width, tick.at),
            )
        } else {
            let clock = tick.wall.format("%H:%M:%S").to_string();
            (center_fit(&clock, width), self.banner.window(OFF_BANNER, width, tick.at))
        };
        canvas.line(1, &top)?;
        canvas.line(2, &bottom)?;
        Ok(true)
    }
}

pub struct VolumeScreen {
    timer: ScreenTimer,
}

impl VolumeScreen {
    pub fn new(duration: Duration) -> Self {
        Self { timer: ScreenTimer::timed(duration) }
    }
}

impl Screen for VolumeScreen {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn render(&mut self, canvas: &mut Canvas<'_>, ctx: &RenderContext, tick: &Tick)
        -> Result<bool, DisplayError>
    {
        let showing = self.timer.still_showing(tick.at);
        two_lines(canvas, "Volume", ctx.volume_text())?;
        Ok(showing)
    }

    fn reset(&mut self) {
        self.timer.reset();
    }

    fn expired(&self, tick: &Tick) -> bool {
        self.timer.expired(tick.at)
    }
}

pub struct ChannelScreen {
    timer: ScreenTimer,
}

impl ChannelScreen {
    pub fn new(duration: Duration) -> Self {
        Self { timer: ScreenTimer::timed(duration) }
    }
}

impl Screen for ChannelScreen {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn render(&mut self, canvas: &mut Canvas<'_>, ctx: &RenderContext, tick: &Tick)
        -> Result<bool, DisplayError>
    {
        let showing = self.timer.still_showing(tick.at);
        two_lines(canvas, "Channel", ctx.channel_text())?;
        Ok(showing)
    }

    fn reset(&mut self) {
        self.timer.reset();
    }

    fn expired(&self, tick: &Tick) -> bool {
        self.timer.expired(tick.at)
    }
}

/// `Error:` over a message, either timed or up until replaced
pub struct ErrorScreen {
    message: String,
    timer: ScreenTimer,
}

impl ErrorScreen {
    pub fn timed(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            timer: ScreenTimer::timed(duration),
        }
    }

    pub fn persistent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timer: ScreenTimer::persistent(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_persistent(&self) -> bool {
        self.timer.duration().is_none()
    }
}

impl Screen for ErrorScreen {
    fn name(&self) -> &'static str {
        "error"
    }

    fn render(&mut self, canvas: &mut Canvas<'_>, _ctx: &RenderContext, tick: &Tick)
        -> Result<bool, DisplayError>
    {
        let showing = self.timer.still_showing(tick.at);
        two_lines(canvas, "Error:", &self.message)?;
        Ok(showing)
    }

    fn reset(&mut self) {
        self.timer.reset();
    }

    fn expired(&self, tick: &Tick) -> bool {
        self.timer.expired(tick.at)
    }
}

pub struct GoodbyeScreen {
    timer: ScreenTimer,
}

impl GoodbyeScreen {
    pub fn new(duration: Duration) -> Self {
        Self { timer: ScreenTimer::timed(duration) }
    }
}

impl Screen for GoodbyeScreen {
    fn name(&self) -> &'static str {
        "goodbye"
    }

    fn render(&mut self, canvas: &mut Canvas<'_>, _ctx: &RenderContext, tick: &Tick)
        -> Result<bool, DisplayError>
    {
        let showing = self.timer.still_showing(tick.at);
        two_lines(canvas, "Goodbye!", "")?;
        Ok(showing)
    }

    fn reset(&mut self) {
        self.timer.reset();
    }

    fn expired(&self, tick: &Tick) -> bool {
        self.timer.expired(tick.at)
    }
}
