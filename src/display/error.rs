/*
 *  display/error.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Error types for the display system
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

use std::fmt;
use std::error::Error;

/// Unified error type for all display operations
#[derive(Debug)]
pub enum DisplayError {
    /// No display backend reachable (bus missing, controller not answering)
    HardwareUnavailable(String),

    /// Line number outside `1..=height`
    InvalidLine { line: usize, height: usize },

    /// I2C communication error
    I2cError(String),

    /// A screen or driver write failed mid-frame
    RenderFailure(String),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::HardwareUnavailable(msg) =>
                write!(f, "Display hardware unavailable: {}", msg),
            DisplayError::InvalidLine { line, height } =>
                write!(f, "Invalid line number {} (display has {} lines)", line, height),
            DisplayError::I2cError(msg) =>
                write!(f, "I2C communication error: {}", msg),
            DisplayError::RenderFailure(msg) =>
                write!(f, "Render failure: {}", msg),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {}

/// Factory error types
#[derive(Debug)]
pub enum DisplayFactoryError {
    /// Display driver initialization failed
    DriverInitFailed(DisplayError),

    /// Configuration validation error
    ConfigError(String),
}

impl fmt::Display for DisplayFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFactoryError::DriverInitFailed(err) =>
                write!(f, "Driver initialization failed: {}", err),
            DisplayFactoryError::ConfigError(msg) =>
                write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for DisplayFactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayFactoryError::DriverInitFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DisplayError> for DisplayFactoryError {
    fn from(err: DisplayError) -> Self {
        DisplayFactoryError::DriverInitFailed(err)
    }
}

impl From<DisplayFactoryError> for DisplayError {
    fn from(err: DisplayFactoryError) -> Self {
        match err {
            DisplayFactoryError::DriverInitFailed(e) => e,
            DisplayFactoryError::ConfigError(msg) =>
                DisplayError::InvalidConfiguration(msg),
        }
    }
}
