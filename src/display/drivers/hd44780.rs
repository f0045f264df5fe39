/*
 *  display/drivers/hd44780.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  HD44780 character LCD behind a PCF8574 I2C backpack
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
use std::time::Duration;

use embedded_hal::i2c::{Error as _, I2c};
use linux_embedded_hal::I2cdev;
use log::{error, info, warn};

use crate::display::error::DisplayError;
use crate::display::pacer::OpPacer;
use crate::display::text::LineCache;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

// PCF8574 backpack pin mapping: P0=RS P1=RW P2=EN P3=backlight P4..P7=D4..D7
const RS: u8 = 0b0000_0001;
const EN: u8 = 0b0000_0100;
const BACKLIGHT: u8 = 0b0000_1000;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // increment, no shift
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off, blink off
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit, 2 line, 5x8 font

/// DDRAM address of the first cell of each line
const LINE_ADDRESS: [u8; 4] = [0x80, 0xC0, 0x94, 0xD4];

const CLEAR_SETTLE: Duration = Duration::from_millis(50);

/// HD44780 character LCD behind a PCF8574 I2C expander
///
/// Generic over any `embedded-hal` 1.0 I2C bus so it can run against
/// `/dev/i2c-*` on the Pi or an in-memory bus in tests.
pub struct Hd44780Driver<I: I2c> {
    i2c: I,
    address: u8,
    capabilities: DisplayCapabilities,
    cache: LineCache,
    pacer: OpPacer,
}

impl Hd44780Driver<I2cdev> {
    /// Open an I2C character LCD
    ///
    /// # Arguments
    ///
    /// * `bus_path` - Path to I2C device (e.g., "/dev/i2c-1")
    /// * `address` - 7-bit expander address (typically 0x27 or 0x3F)
    /// * `width`, `height` - panel geometry in character cells
    /// * `min_op_delay` - minimum spacing between bus operations
    ///
    /// Any failure here is reported as [`DisplayError::HardwareUnavailable`].
    pub fn open(
        bus_path: &str,
        address: u8,
        width: usize,
        height: usize,
        min_op_delay: Duration,
    ) -> Result<Self, DisplayError> {
        info!("Initializing HD44780 on {} at address 0x{:02X}", bus_path, address);

        let i2c = I2cdev::new(bus_path).map_err(|e| {
            DisplayError::HardwareUnavailable(format!("Failed to open {}: {}", bus_path, e))
        })?;

        Self::new(i2c, address, width, height, min_op_delay)
    }
}

impl<I: I2c> Hd44780Driver<I> {
    pub fn new(
        i2c: I,
        address: u8,
        width: usize,
        height: usize,
        min_op_delay: Duration,
    ) -> Result<Self, DisplayError> {
        if height == 0 || height > LINE_ADDRESS.len() || width == 0 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "Unsupported HD44780 geometry: {}x{}",
                width, height
            )));
        }

        let capabilities = DisplayCapabilities {
            width,
            height,
            min_op_delay,
            name: "hd44780",
        };

        let mut driver = Self {
            i2c,
            address,
            capabilities,
            cache: LineCache::new(width, height),
            pacer: OpPacer::new(min_op_delay),
        };

        driver
            .init()
            .map_err(|e| DisplayError::HardwareUnavailable(format!("HD44780 init failed: {}", e)))?;

        info!("HD44780 initialized successfully ({}x{})", width, height);
        Ok(driver)
    }

    /// Power-on sequence that forces the controller into 4-bit mode
    fn init(&mut self) -> Result<(), DisplayError> {
        // wake up three times in 8-bit mode, then switch to 4-bit
        for _ in 0..3 {
            self.write_nibble(0x30, 0)?;
            thread::sleep(Duration::from_micros(4500));
        }
        self.write_nibble(0x20, 0)?;

        self.command(CMD_FUNCTION_SET)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        thread::sleep(Duration::from_millis(2));
        self.command(CMD_ENTRY_MODE)?;
        Ok(())
    }

    fn expander_write(&mut self, byte: u8) -> Result<(), DisplayError> {
        self.i2c
            .write(self.address, &[byte | BACKLIGHT])
            .map_err(|e| DisplayError::I2cError(format!("{:?}", e.kind())))
    }

    /// Latch the upper nibble of `nibble` with an enable pulse, RS taken from `mode`
    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<(), DisplayError> {
        let data = (nibble & 0xF0) | (mode & RS);
        self.expander_write(data)?;
        self.expander_write(data | EN)?;
        thread::sleep(Duration::from_micros(1));
        self.expander_write(data & !EN)?;
        thread::sleep(Duration::from_micros(50));
        Ok(())
    }

    fn send(&mut self, value: u8, mode: u8) -> Result<(), DisplayError> {
        self.write_nibble(value & 0xF0, mode)?;
        self.write_nibble(value << 4, mode)
    }

    fn command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.send(cmd, 0)
    }

    fn write_line(&mut self, cells: &str, line: usize) -> Result<(), DisplayError> {
        self.command(LINE_ADDRESS[line - 1])?;
        for b in cells.bytes() {
            self.send(b, RS)?;
        }
        Ok(())
    }
}

impl<I: I2c + Send> DisplayDriver for Hd44780Driver<I> {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.pacer.wait();
        let result = self.command(CMD_CLEAR);
        self.cache.reset();
        match result {
            Ok(()) => {
                // the clear command itself needs ~1.5ms, give it more
                thread::sleep(CLEAR_SETTLE);
                self.pacer.mark();
                Ok(())
            }
            Err(e) => {
                error!("LCD clear error: {}", e);
                thread::sleep(Duration::from_millis(100));
                Err(e)
            }
        }
    }

    fn display_text(&mut self, text: &str, line: usize) -> Result<(), DisplayError> {
        let cells = match self.cache.prepare(text, line) {
            Ok(Some(cells)) => cells,
            Ok(None) => return Ok(()),
            Err(e) => {
                error!("Rejected LCD write: {}", e);
                return Err(e);
            }
        };

        self.pacer.wait();
        match self.write_line(&cells, line) {
            Ok(()) => {
                self.pacer.mark();
                self.cache.commit(line, cells);
                Ok(())
            }
            Err(e) => {
                warn!("LCD display error on line {}: {}", line, e);
                // try to leave the line blank rather than half written
                self.pacer.wait();
                let blank = " ".repeat(self.capabilities.width);
                if self.write_line(&blank, line).is_ok() {
                    self.cache.commit(line, blank);
                }
                self.pacer.mark();
                Err(e)
            }
        }
    }
}
