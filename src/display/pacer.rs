/*
 *  display/pacer.rs
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

use std::thread;
use std::time::{Duration, Instant};

/// Enforces a minimum gap between consecutive operations.
///
/// Character LCD controllers garble output when commands arrive back to
/// back, and rapid clear/write bursts during screen swaps are visible to the
/// user. The driver paces bus traffic with one of these and the manager
/// paces screen transitions with another.
#[derive(Debug)]
pub struct OpPacer {
    last_op: Option<Instant>,
    gap: Duration,
}

impl OpPacer {
    pub fn new(gap: Duration) -> Self {
        Self { last_op: None, gap }
    }

    /// How long a caller would have to wait at `now`.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_op {
            Some(last) => self.gap.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Block until the gap has elapsed, then stamp the operation.
    ///
    /// Returns the time actually slept.
    pub fn wait(&mut self) -> Duration {
        let pause = self.remaining(Instant::now());
        if !pause.is_zero() {
            thread::sleep(pause);
        }
        self.last_op = Some(Instant::now());
        pause
    }

    /// Stamp an operation without waiting.
    #[inline]
    pub fn mark(&mut self) {
        self.last_op = Some(Instant::now());
    }
}
