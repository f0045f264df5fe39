/*
 *  display/frame_timer.rs
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

use std::time::{Duration, Instant};

use log::{trace, warn};

/// Scoped timer for one display frame.
///
/// Logs the elapsed time when dropped and warns when the frame ran past
/// its budget, which usually means the bus is stalling.
pub struct FrameTimer {
    name: &'static str,
    budget: Duration,
    start: Instant,
}

impl FrameTimer {
    pub fn new(name: &'static str, budget: Duration) -> Self {
        FrameTimer {
            name,
            budget,
            start: Instant::now(),
        }
    }
}

impl Drop for FrameTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        if !self.budget.is_zero() && duration > self.budget {
            warn!("{} took {:?} (budget {:?})", self.name, duration, self.budget);
        } else {
            trace!("{} took {:?}", self.name, duration);
        }
    }
}
