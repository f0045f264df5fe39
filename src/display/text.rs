/*
 *  display/text.rs
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

//! Character-cell text helpers shared by drivers and screens.

use crate::display::error::DisplayError;

/// Replace anything the HD44780 character ROM cannot show reliably.
///
/// Control characters and everything outside printable ASCII (0x20..=0x7E)
/// become a single space each. Multi-byte characters count as one cell.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { ' ' })
        .collect()
}

/// Truncate to `width` cells, then right-pad with spaces to exactly `width`.
pub fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}

/// Center `text` in a field of `width` cells.
///
/// Text already at least `width` long is returned unchanged. When the
/// margin is odd the extra space lands on the right for even widths and on
/// the left for odd widths.
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let margin = width - len;
    let left = margin / 2 + (margin & width & 1);
    let right = margin - left;
    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat_n(' ', left));
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', right));
    out
}

/// Center after truncating, always exactly `width` cells.
pub fn center_fit(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    fit(&center(&clipped, width), width)
}

/// Per-line record of what the hardware currently shows.
///
/// Both drivers route writes through this so a repeated write of the same
/// content never reaches the bus.
#[derive(Debug, Clone)]
pub struct LineCache {
    width: usize,
    lines: Vec<String>,
}

impl LineCache {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            lines: vec![String::new(); height],
        }
    }

    /// Validate `line` (1-based) and normalise `text` for the panel.
    ///
    /// Returns `Ok(None)` when the normalised text is already on that line.
    pub fn prepare(&self, text: &str, line: usize) -> Result<Option<String>, DisplayError> {
        let height = self.lines.len();
        if line == 0 || line > height {
            return Err(DisplayError::InvalidLine { line, height });
        }
        let cells = fit(&sanitize(text), self.width);
        if self.lines[line - 1] == cells {
            Ok(None)
        } else {
            Ok(Some(cells))
        }
    }

    /// Record a completed hardware write.
    pub fn commit(&mut self, line: usize, cells: String) {
        if let Some(slot) = self.lines.get_mut(line.wrapping_sub(1)) {
            *slot = cells;
        }
    }

    pub fn line(&self, line: usize) -> Option<&str> {
        self.lines.get(line.wrapping_sub(1)).map(String::as_str)
    }

    pub fn reset(&mut self) {
        for l in &mut self.lines {
            l.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_controls_and_non_ascii() {
        assert_eq!(sanitize("a\tb\nc\u{0}d"), "a b c d");
        assert_eq!(sanitize("Beyoncé"), "Beyonc ");
        assert_eq!(sanitize("♪ tune"), "  tune");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdefgh", 5), "abcde");
        assert_eq!(fit("", 3), "   ");
    }

    #[test]
    fn test_center_even_width() {
        assert_eq!(center("Volume", 16), "     Volume     ");
        // odd margin on even width: extra space on the right
        assert_eq!(center("Channel", 16), "    Channel     ");
        assert_eq!(center("abc", 16), "      abc       ");
    }

    #[test]
    fn test_center_odd_width_puts_extra_left() {
        assert_eq!(center("ab", 5), "  ab ");
        assert_eq!(center("abc", 5), " abc ");
    }

    #[test]
    fn test_center_fit_clips_long_text() {
        let s = center_fit("A channel name that is far too long", 16);
        assert_eq!(s, "A channel name t");
        assert_eq!(center_fit("", 4), "    ");
    }

    #[test]
    fn test_line_cache_suppresses_repeats() {
        let mut cache = LineCache::new(4, 2);
        let first = cache.prepare("hi", 1).unwrap();
        assert_eq!(first.as_deref(), Some("hi  "));
        cache.commit(1, first.unwrap());
        assert_eq!(cache.prepare("hi", 1).unwrap(), None);
        assert_eq!(cache.prepare("hi  ", 1).unwrap(), None);
        assert!(cache.prepare("ho", 1).unwrap().is_some());
        cache.reset();
        assert!(cache.prepare("hi", 1).unwrap().is_some());
    }

    #[test]
    fn test_line_cache_rejects_out_of_range_lines() {
        let cache = LineCache::new(16, 2);
        assert!(matches!(cache.prepare("x", 0), Err(DisplayError::InvalidLine { line: 0, height: 2 })));
        assert!(matches!(cache.prepare("x", 3), Err(DisplayError::InvalidLine { line: 3, height: 2 })));
    }
}
