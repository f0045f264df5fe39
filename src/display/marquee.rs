/*
 *  display/marquee.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Horizontal scrolling for text wider than the LCD
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

use crate::display::text::center;

/// Timing for one marquee instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarqueeTiming {
    /// Time per one-character step while scrolling
    pub scroll_speed: Duration,

    /// Hold on the first window before scrolling starts
    pub pre_delay: Duration,

    /// Hold on the last window before jumping back to the start
    pub post_delay: Duration,
}

impl Default for MarqueeTiming {
    fn default() -> Self {
        Self {
            scroll_speed: Duration::from_millis(400),
            pre_delay: Duration::from_secs(2),
            post_delay: Duration::from_secs(2),
        }
    }
}

impl MarqueeTiming {
    /// Length of one full cycle for text `overflow` characters wider than the display
    pub fn period(&self, overflow: usize) -> Duration {
        self.pre_delay + self.scroll_speed * overflow as u32 + self.post_delay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPhase {
    InitialDelay,
    Scrolling,
    FinalDelay,
}

/// Horizontal scroll window over text wider than the display
///
/// Cycles `InitialDelay -> Scrolling -> FinalDelay -> InitialDelay` forever.
/// Any change in the tracked text restarts the cycle from offset 0 so a new
/// song title never appears mid-scroll.
#[derive(Debug, Clone)]
pub struct Marquee {
    timing: MarqueeTiming,
    offset: usize,
    tracked: String,
    phase: ScrollPhase,
    phase_timer: Option<Instant>,
}

impl Marquee {
    pub fn new(timing: MarqueeTiming) -> Self {
        Self {
            timing,
            offset: 0,
            tracked: String::new(),
            phase: ScrollPhase::InitialDelay,
            phase_timer: None,
        }
    }

    pub fn timing(&self) -> MarqueeTiming {
        self.timing
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    /// Restart the cycle at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.offset = 0;
        self.phase = ScrollPhase::InitialDelay;
        self.phase_timer = Some(now);
    }

    /// The part of `text` visible at `now`, exactly `width` cells wide.
    ///
    /// Text that fits is centered and leaves the scroll state untouched.
    pub fn window(&mut self, text: &str, width: usize, now: Instant) -> String {
        if text != self.tracked {
            self.reset(now);
            self.tracked = text.to_string();
        }

        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= width {
            return center(text, width);
        }

        let max_offset = chars.len() - width;
        let started = *self.phase_timer.get_or_insert(now);
        let in_phase = now.saturating_duration_since(started);

        let start = match self.phase {
            ScrollPhase::InitialDelay => {
                if in_phase >= self.timing.pre_delay {
                    self.phase = ScrollPhase::Scrolling;
                    self.phase_timer = Some(now);
                    self.offset = 0;
                }
                0
            }
            ScrollPhase::Scrolling => {
                if in_phase >= self.timing.scroll_speed {
                    self.offset += 1;
                    self.phase_timer = Some(now);
                }
                if self.offset >= max_offset {
                    self.offset = max_offset;
                    self.phase = ScrollPhase::FinalDelay;
                    self.phase_timer = Some(now);
                }
                self.offset
            }
            ScrollPhase::FinalDelay => {
                if in_phase >= self.timing.post_delay {
                    self.phase = ScrollPhase::InitialDelay;
                    self.phase_timer = Some(now);
                    self.offset = 0;
                }
                max_offset
            }
        };

        chars[start..start + width].iter().collect()
    }
}
