/*
 *  radio/buttons.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Front panel push buttons
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

#[cfg(feature = "gpio")]
use log::{debug, info};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::ButtonPins;

/// Logical front panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonEvent {
    Power,
    VolumeUp,
    VolumeDown,
    ChannelNext,
    ChannelPrev,
}

impl ButtonEvent {
    /// Each button with the pin it is wired to
    pub fn wiring(pins: &ButtonPins) -> [(ButtonEvent, u8); 5] {
        [
            (ButtonEvent::Power, pins.power),
            (ButtonEvent::VolumeUp, pins.volume_up),
            (ButtonEvent::VolumeDown, pins.volume_down),
            (ButtonEvent::ChannelNext, pins.channel_up),
            (ButtonEvent::ChannelPrev, pins.channel_down),
        ]
    }
}

#[derive(Debug, Error)]
pub enum ButtonError {
    #[error("GPIO unavailable: {0}")]
    Gpio(String),
    #[error("GPIO support not compiled in")]
    Unsupported,
}

/// Drops edges that arrive within `window` of the last accepted one
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.window => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Live GPIO button inputs. Interrupts stay armed while this is alive.
#[cfg(feature = "gpio")]
pub struct Buttons {
    _pins: Vec<rppal::gpio::InputPin>,
}

#[cfg(feature = "gpio")]
impl Buttons {
    /// Arm falling-edge interrupts on pull-up inputs and forward presses to `tx`.
    pub fn start(
        pins: ButtonPins,
        bounce: Duration,
        tx: UnboundedSender<ButtonEvent>,
    ) -> Result<Self, ButtonError> {
        use rppal::gpio::{Gpio, Trigger};

        let gpio = Gpio::new().map_err(|e| ButtonError::Gpio(e.to_string()))?;
        let mut armed = Vec::with_capacity(5);
        for (event, pin) in ButtonEvent::wiring(&pins) {
            let mut input = gpio
                .get(pin)
                .map_err(|e| ButtonError::Gpio(format!("pin {}: {}", pin, e)))?
                .into_input_pullup();
            let tx = tx.clone();
            let mut debounce = Debouncer::new(bounce);
            input
                .set_async_interrupt(Trigger::FallingEdge, move |_level| {
                    if debounce.accept(Instant::now()) {
                        debug!("Button {:?} pressed", event);
                        // receiver gone means we are shutting down
                        let _ = tx.send(event);
                    }
                })
                .map_err(|e| ButtonError::Gpio(format!("pin {}: {}", pin, e)))?;
            armed.push(input);
        }
        info!("GPIO buttons initialized successfully");
        Ok(Self { _pins: armed })
    }
}

#[cfg(not(feature = "gpio"))]
pub struct Buttons;

#[cfg(not(feature = "gpio"))]
impl Buttons {
    pub fn start(
        _pins: ButtonPins,
        _bounce: Duration,
        _tx: UnboundedSender<ButtonEvent>,
    ) -> Result<Self, ButtonError> {
        Err(ButtonError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "gpio"))]
    #[test]
    fn test_start_without_gpio_support() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let pins = crate::config::GpioConfig::default().pins();
        assert!(matches!(
            Buttons::start(pins, Duration::from_millis(10), tx),
            Err(ButtonError::Unsupported)
        ));
    }

    #[test]
    fn test_debounce_window() {
        let mut d = Debouncer::new(Duration::from_millis(10));
        let t = Instant::now();
        assert!(d.accept(t));
        assert!(!d.accept(t + Duration::from_millis(3)));
        assert!(!d.accept(t + Duration::from_millis(9)));
        assert!(d.accept(t + Duration::from_millis(10)));
        assert!(!d.accept(t + Duration::from_millis(15)));
    }

    #[test]
    fn test_default_wiring() {
        let pins = crate::config::GpioConfig::default().pins();
        let wiring = ButtonEvent::wiring(&pins);
        assert_eq!(wiring[0], (ButtonEvent::Power, 25));
        assert_eq!(wiring[3], (ButtonEvent::ChannelNext, 14));
        assert_eq!(wiring[4], (ButtonEvent::ChannelPrev, 15));
    }
}
