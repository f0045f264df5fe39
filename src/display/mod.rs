/*
 *  display/mod.rs
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod factory;

// Cell text helpers and bus pacing shared by the drivers
pub mod text;
pub mod pacer;
pub mod frame_timer;

// Display drivers
pub mod drivers;

// Scrolling text engine
pub mod marquee;

// Render context, screens and the manager that owns them
pub mod context;
pub mod screens;
pub mod manager;

// Re-exports for convenience
pub use traits::{DisplayDriver, DisplayCapabilities};
pub use error::{DisplayError, DisplayFactoryError};
pub use factory::{DisplayDriverFactory, BoxedDriver};
pub use drivers::hd44780::Hd44780Driver;
pub use drivers::mock::{MockDriver, MockDriverState};
pub use marquee::{Marquee, MarqueeTiming, ScrollPhase};
pub use context::{ContextPatch, RenderContext};
pub use screens::{
    Canvas,
    ChannelScreen,
    DefaultRadioScreen,
    ErrorScreen,
    GoodbyeScreen,
    Screen,
    ScreenTimer,
    Tick,
    VolumeScreen,
};
pub use manager::{DisplayManager, ManagerSettings};
