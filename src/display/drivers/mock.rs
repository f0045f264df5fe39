/*
 *  display/drivers/mock.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Mock display driver for testing and headless runs
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

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::display::error::DisplayError;
use crate::display::text::LineCache;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

/// Simulated character display
///
/// This driver stands in for the LCD when the hardware is disabled or
/// missing. It honours the same contract as the real driver (sanitising,
/// padding, change suppression) but has no bus timing. Useful for:
/// - Running the radio on a desktop
/// - Unit and integration tests
///
/// Every operation is recorded in a shared [`MockDriverState`] that tests
/// can inspect after the driver has been moved into a `DisplayManager`.
#[derive(Debug, Clone)]
pub struct MockDriver {
    /// Display capabilities
    capabilities: DisplayCapabilities,

    /// What the driver believes is on each line
    cache: LineCache,

    /// Shared state for testing
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Current content of each line as it would appear on the glass
    pub lines: Vec<String>,

    /// Number of line writes that reached the "hardware"
    pub write_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Every write in order, (line, text)
    pub history: Vec<(usize, String)>,

    /// Simulate failures (for error testing)
    pub simulate_write_failure: bool,
    pub simulate_clear_failure: bool,
}

impl MockDriverState {
    /// Content of a 1-based line, empty if never written.
    pub fn line(&self, line: usize) -> &str {
        self.lines
            .get(line.wrapping_sub(1))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn locked(state: &Mutex<MockDriverState>) -> MutexGuard<'_, MockDriverState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDriver {
    /// Create a mock driver with specific dimensions
    pub fn new(width: usize, height: usize) -> Self {
        info!("Mock display initialized: {}x{}", width, height);
        let capabilities = DisplayCapabilities {
            width,
            height,
            min_op_delay: std::time::Duration::ZERO,
            name: "mock",
        };
        let state = MockDriverState {
            lines: vec![String::new(); height],
            ..Default::default()
        };
        Self {
            capabilities,
            cache: LineCache::new(width, height),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    /// Snapshot of all lines
    pub fn lines(&self) -> Vec<String> {
        locked(&self.state).lines.clone()
    }
}

impl DisplayDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = locked(&self.state);
        if state.simulate_clear_failure {
            return Err(DisplayError::Other("Simulated clear failure".to_string()));
        }
        state.clear_count += 1;
        for line in &mut state.lines {
            line.clear();
        }
        self.cache.reset();
        debug!("Display cleared");
        Ok(())
    }

    fn display_text(&mut self, text: &str, line: usize) -> Result<(), DisplayError> {
        let Some(cells) = self.cache.prepare(text, line)? else {
            return Ok(());
        };

        let mut state = locked(&self.state);
        if state.simulate_write_failure {
            return Err(DisplayError::RenderFailure("Simulated write failure".to_string()));
        }
        state.write_count += 1;
        state.history.push((line, cells.clone()));
        state.lines[line - 1] = cells.clone();
        drop(state);

        debug!("Line {}: '{}'", line, cells);
        self.cache.commit(line, cells);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_driver_creation() {
        let driver = MockDriver::new(16, 2);
        assert_eq!(driver.dimensions(), (16, 2));
        assert_eq!(driver.lines(), vec![String::new(), String::new()]);
    }

    #[test]
    fn test_mock_driver_pads_and_sanitizes() {
        let mut driver = MockDriver::new(8, 2);
        driver.display_text("a\tb", 1).unwrap();
        assert_eq!(driver.state().lock().unwrap().line(1), "a b     ");
    }

    #[test]
    fn test_mock_driver_repeat_write_is_suppressed() {
        let mut driver = MockDriver::new(16, 2);
        driver.display_text("Jazz FM", 1).unwrap();
        driver.display_text("Jazz FM", 1).unwrap();
        assert_eq!(driver.state().lock().unwrap().write_count, 1);
    }

    #[test]
    fn test_mock_driver_clear_resets_cache() {
        let mut driver = MockDriver::new(16, 2);
        driver.display_text("Jazz FM", 1).unwrap();
        driver.clear().unwrap();
        driver.display_text("Jazz FM", 1).unwrap();

        let state = driver.state();
        let state = state.lock().unwrap();
        assert_eq!(state.clear_count, 1);
        assert_eq!(state.write_count, 2);
    }

    #[test]
    fn test_mock_driver_rejects_bad_line() {
        let mut driver = MockDriver::new(16, 2);
        assert!(driver.display_text("x", 3).is_err());
        assert!(driver.display_text("x", 0).is_err());
        assert_eq!(driver.state().lock().unwrap().write_count, 0);
    }

    #[test]
    fn test_mock_driver_simulated_failure() {
        let mut driver = MockDriver::new(16, 2);
        driver.state().lock().unwrap().simulate_write_failure = true;
        assert!(driver.display_text("boom", 1).is_err());

        driver.state().lock().unwrap().simulate_write_failure = false;
        // the failed write was never committed, so the retry goes through
        driver.display_text("boom", 1).unwrap();
        assert_eq!(driver.state().lock().unwrap().write_count, 1);
    }
}
