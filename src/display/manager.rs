/*
 *  display/manager.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Display manager - owns the driver, the screens and the render context
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

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::display::context::{ContextPatch, RenderContext};
use crate::display::error::DisplayError;
use crate::display::factory::BoxedDriver;
use crate::display::frame_timer::FrameTimer;
use crate::display::pacer::OpPacer;
use crate::display::screens::{Canvas, Screen, Tick};

/// Real-time guards applied around screen transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Minimum spacing between two `show_screen` calls
    pub transition_interval: Duration,

    /// Pause after a transition clear before the next write
    pub clear_settle: Duration,

    /// Pause after a recovery clear following a failed frame
    pub recovery_settle: Duration,

    /// Frames slower than this are logged as warnings (zero disables)
    pub frame_budget: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            transition_interval: Duration::from_millis(100),
            clear_settle: Duration::from_millis(20),
            recovery_settle: Duration::from_millis(50),
            frame_budget: Duration::from_millis(250),
        }
    }
}

impl ManagerSettings {
    /// No sleeps at all, for tests and simulated displays
    pub fn immediate() -> Self {
        Self {
            transition_interval: Duration::ZERO,
            clear_settle: Duration::ZERO,
            recovery_settle: Duration::ZERO,
            frame_budget: Duration::ZERO,
        }
    }
}

struct ManagerState {
    driver: BoxedDriver,
    default_screen: Box<dyn Screen>,
    active: Option<Box<dyn Screen>>,
    context: RenderContext,

    /// Last text this manager sent per line
    memo: Vec<Option<String>>,

    /// Next frame rewrites every line; cleared once that frame has rendered
    force_redraw: bool,

    /// Spaces out `show_screen` calls
    transitions: OpPacer,
}

impl ManagerState {
    fn forget_lines(&mut self) {
        self.memo.iter_mut().for_each(|m| *m = None);
        self.force_redraw = true;
    }

    fn clear_driver(&mut self, why: &str) {
        if let Err(e) = self.driver.clear() {
            warn!("Display clear ({}) failed: {}", why, e);
        }
        self.forget_lines();
    }
}

/// Owner of the display: driver, default screen, optional temporary screen
/// and the shared render context.
///
/// All operations take `&self` and serialise on one internal lock, so the
/// manager can be shared between the render loop and input handlers behind
/// an `Arc`. Nothing below this boundary can make `update_display` fail.
pub struct DisplayManager {
    state: Mutex<ManagerState>,
    settings: ManagerSettings,
}

impl DisplayManager {
    pub fn new(driver: BoxedDriver, default_screen: Box<dyn Screen>, settings: ManagerSettings) -> Self {
        let (width, height) = driver.dimensions();
        info!(
            "Display manager ready on {} ({}x{}), default screen '{}'",
            driver.capabilities().name,
            width,
            height,
            default_screen.name()
        );
        let state = ManagerState {
            driver,
            default_screen,
            active: None,
            context: RenderContext::default(),
            memo: vec![None; height],
            force_redraw: true,
            transitions: OpPacer::new(settings.transition_interval),
        };
        Self {
            state: Mutex::new(state),
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> ManagerSettings {
        self.settings
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.lock().driver.dimensions()
    }

    /// Replace the fallback screen shown when nothing temporary is up.
    pub fn set_default_screen(&self, screen: Box<dyn Screen>) {
        let mut state = self.lock();
        debug!("Default screen is now '{}'", screen.name());
        state.default_screen = screen;
        state.forget_lines();
    }

    /// Install `screen` as the temporary screen.
    ///
    /// Calls closer together than the transition interval sleep out the
    /// remainder first. With `clear_first` the glass is blanked and the
    /// next frame redraws every line.
    pub fn show_screen(&self, mut screen: Box<dyn Screen>, clear_first: bool) {
        let mut state = self.lock();

        let waited = state.transitions.wait();
        if !waited.is_zero() {
            debug!("Transition throttled for {:?}", waited);
        }

        if clear_first {
            state.clear_driver("transition");
            thread::sleep(self.settings.clear_settle);
        }

        screen.reset();
        info!("Showing screen '{}'", screen.name());
        state.active = Some(screen);
        state.memo.iter_mut().for_each(|m| *m = None);
    }

    /// Merge fresh application state into the render context.
    pub fn update_context(&self, patch: ContextPatch) {
        if patch.is_empty() {
            return;
        }
        self.lock().context.apply(patch);
    }

    /// Snapshot of the current render context
    pub fn context(&self) -> RenderContext {
        self.lock().context.clone()
    }

    /// Name of the temporary screen, if one is up
    pub fn active_screen(&self) -> Option<&'static str> {
        self.lock().active.as_ref().map(|s| s.name())
    }

    /// Render one frame now.
    pub fn update_display(&self) {
        self.update_display_at(&Tick::now());
    }

    /// Render one frame for `tick`.
    ///
    /// A temporary screen that has already run out is dropped before the
    /// frame, so the default screen is drawn in the same call. Render or
    /// driver failures are logged and answered with a clear.
    pub fn update_display_at(&self, tick: &Tick) {
        let _timer = FrameTimer::new("update_display", self.settings.frame_budget);
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.active.as_ref().is_some_and(|s| s.expired(tick)) {
            self.expire(state);
        }

        let force = state.force_redraw;
        let result = {
            let mut canvas = Canvas::new(state.driver.as_mut(), &mut state.memo, force);
            match state.active.as_mut() {
                Some(screen) => screen
                    .render(&mut canvas, &state.context, tick)
                    .map(|keep| (true, keep)),
                None => state
                    .default_screen
                    .render(&mut canvas, &state.context, tick)
                    .map(|_| (false, true)),
            }
        };

        match result {
            Ok((temporary, keep)) => {
                state.force_redraw = false;
                if temporary && !keep {
                    self.expire(state);
                }
            }
            Err(e) => self.recover(state, e),
        }
    }

    /// Blank the display and drop any temporary screen.
    pub fn clear_display(&self) {
        let mut state = self.lock();
        if let Some(screen) = state.active.take() {
            debug!("Dropping screen '{}' on clear", screen.name());
        }
        state.clear_driver("clear_display");
        thread::sleep(self.settings.clear_settle);
    }

    fn expire(&self, state: &mut ManagerState) {
        if let Some(screen) = state.active.take() {
            info!("Screen '{}' expired, back to '{}'", screen.name(), state.default_screen.name());
        }
        state.clear_driver("expiry");
        thread::sleep(self.settings.clear_settle);
    }

    fn recover(&self, state: &mut ManagerState, err: DisplayError) {
        error!("Display update error: {}", err);
        state.clear_driver("recovery");
        thread::sleep(self.settings.recovery_settle);
    }
}
