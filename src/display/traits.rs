/*
 *  display/traits.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Core trait definitions for character display drivers
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

use std::time::Duration;

use crate::display::error::DisplayError;

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Character cells per line
    pub width: usize,

    /// Number of text lines
    pub height: usize,

    /// Minimum spacing the controller needs between bus operations
    pub min_op_delay: Duration,

    /// Short human readable name used in logs
    pub name: &'static str,
}

/// Minimal hardware abstraction - all character display drivers implement this
///
/// Screens only ever see this trait. Drivers are responsible for keeping the
/// panel consistent: text is sanitised, clipped and padded to the full line
/// width, and a write that would not change a line is skipped.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height) in character cells
    fn dimensions(&self) -> (usize, usize) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Blank every line and forget what was last written.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Show `text` on `line` (1-based).
    ///
    /// Out-of-range lines are rejected with [`DisplayError::InvalidLine`].
    fn display_text(&mut self, text: &str, line: usize) -> Result<(), DisplayError>;
}
