/*
 *  display/factory.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Display driver factory
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

use crate::config::{DisplayConfig, DriverKind, MIN_DISPLAY_LINES};
use crate::display::drivers::hd44780::Hd44780Driver;
use crate::display::drivers::mock::MockDriver;
use crate::display::error::{DisplayError, DisplayFactoryError};
use crate::display::traits::DisplayDriver;
use log::{info, warn};

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Factory for creating display drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create a display driver from configuration
    ///
    /// The configured driver is tried first. If the LCD cannot be reached
    /// and `fallback_to_mock` is set, a [`MockDriver`] with the configured
    /// geometry is returned instead so the radio keeps working headless.
    ///
    /// # Examples
    ///
    /// ```
    /// use plexradio::config::{DisplayConfig, DriverKind};
    /// use plexradio::display::DisplayDriverFactory;
    ///
    /// let config = DisplayConfig {
    ///     driver: Some(DriverKind::Mock),
    ///     ..Default::default()
    /// };
    /// let driver = DisplayDriverFactory::create_from_config(&config).unwrap();
    /// assert_eq!(driver.dimensions(), (16, 2));
    /// ```
    pub fn create_from_config(config: &DisplayConfig) -> Result<BoxedDriver, DisplayFactoryError> {
        match Self::create_driver(config) {
            Ok(driver) => Ok(driver),
            Err(DisplayFactoryError::DriverInitFailed(e)) if config.fallback_to_mock() => {
                warn!("Display unavailable ({}), falling back to mock display", e);
                Ok(Self::create_mock(config))
            }
            Err(e) => Err(e),
        }
    }

    /// Create exactly the configured driver, no fallback
    pub fn create_driver(config: &DisplayConfig) -> Result<BoxedDriver, DisplayFactoryError> {
        if config.width() == 0 || config.height() == 0 {
            return Err(DisplayFactoryError::ConfigError(
                "display width/height must be > 0".to_string(),
            ));
        }
        if config.height() < MIN_DISPLAY_LINES {
            return Err(DisplayFactoryError::ConfigError(format!(
                "display needs at least {} lines, got {}",
                MIN_DISPLAY_LINES,
                config.height()
            )));
        }

        match config.driver() {
            DriverKind::Hd44780 => {
                let driver = Hd44780Driver::open(
                    config.i2c_bus(),
                    config.i2c_address(),
                    config.width(),
                    config.height(),
                    config.min_op_delay(),
                )
                .map_err(|e| match e {
                    DisplayError::InvalidConfiguration(msg) => DisplayFactoryError::ConfigError(msg),
                    other => DisplayFactoryError::DriverInitFailed(other),
                })?;
                Ok(Box::new(driver))
            }
            DriverKind::Mock => Ok(Self::create_mock(config)),
        }
    }

    fn create_mock(config: &DisplayConfig) -> BoxedDriver {
        info!("Using mock display {}x{}", config.width(), config.height());
        Box::new(MockDriver::new(config.width(), config.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_lcd() -> DisplayConfig {
        DisplayConfig {
            driver: Some(DriverKind::Hd44780),
            i2c_bus: Some("/dev/does-not-exist-i2c-99".to_string()),
            width: Some(20),
            height: Some(4),
            ..Default::default()
        }
    }

    #[test]
    fn test_mock_from_config() {
        let config = DisplayConfig {
            driver: Some(DriverKind::Mock),
            width: Some(20),
            height: Some(4),
            ..Default::default()
        };
        let driver = DisplayDriverFactory::create_from_config(&config).unwrap();
        assert_eq!(driver.dimensions(), (20, 4));
        assert_eq!(driver.capabilities().name, "mock");
    }

    #[test]
    fn test_missing_hardware_without_fallback() {
        let config = DisplayConfig {
            fallback_to_mock: Some(false),
            ..missing_lcd()
        };
        let err = DisplayDriverFactory::create_from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            DisplayFactoryError::DriverInitFailed(DisplayError::HardwareUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_hardware_falls_back_to_mock() {
        let driver = DisplayDriverFactory::create_from_config(&missing_lcd()).unwrap();
        assert_eq!(driver.capabilities().name, "mock");
        assert_eq!(driver.dimensions(), (20, 4));
    }

    #[test]
    fn test_single_line_display_is_config_error() {
        let config = DisplayConfig {
            driver: Some(DriverKind::Mock),
            height: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            DisplayDriverFactory::create_from_config(&config),
            Err(DisplayFactoryError::ConfigError(_))
        ));
    }

    #[test]
    fn test_zero_geometry_is_config_error() {
        let config = DisplayConfig {
            driver: Some(DriverKind::Mock),
            width: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            DisplayDriverFactory::create_from_config(&config),
            Err(DisplayFactoryError::ConfigError(_))
        ));
    }
}
