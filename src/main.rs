/*
 *  main.rs
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

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info, warn};
use tokio::signal::unix::{signal, SignalKind};

use plexradio::config::{self, Config, DisplayConfig, DriverKind};
use plexradio::display::{
    DefaultRadioScreen, DisplayDriverFactory, DisplayManager, ErrorScreen,
};
use plexradio::radio::{blocking, Buttons, RadioClient};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// How long a missing player is reported on the LCD before exiting
const MISSING_PLAYER_HOLD: Duration = Duration::from_secs(5);

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Display section actually used: the simulated display whenever the
/// hardware or the LCD is switched off.
fn effective_display(cfg: &Config) -> DisplayConfig {
    let mut display = cfg.display.clone();
    if !cfg.hardware.enabled() || !display.enabled() {
        info!("LCD disabled, rendering to the mock display");
        display.driver = Some(DriverKind::Mock);
    }
    display
}

fn build_display(cfg: &Config) -> Result<Arc<DisplayManager>> {
    let driver = DisplayDriverFactory::create_from_config(&effective_display(cfg))
        .context("initializing display")?;
    let screen = DefaultRadioScreen::new(cfg.marquee.timing());
    Ok(Arc::new(DisplayManager::new(
        driver,
        Box::new(screen),
        cfg.screen.manager_settings(),
    )))
}

/// `--clear-screen`: wipe the LCD, confirm, and leave it blank.
fn clear_screen(cfg: &Config) -> Result<()> {
    info!("Clearing LCD screen...");
    let mut driver = DisplayDriverFactory::create_driver(&cfg.display)
        .context("LCD not available")?;
    driver.clear()?;
    driver.display_text("Screen Cleared", 1)?;
    std::thread::sleep(Duration::from_secs(1));
    driver.clear()?;
    info!("LCD screen cleared successfully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let (cfg, cli) = config::load().context("loading configuration")?;

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.logging.default_filter()))
        .format_timestamp_secs()
        .init();

    info!("{} tune in, turn up", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    if cli.clear_screen {
        return clear_screen(&cfg);
    }

    let display = build_display(&cfg)?;
    let radio = Arc::new(
        RadioClient::from_config(&cfg, Arc::clone(&display)).context("creating radio client")?,
    );

    let player = cfg.playback.player();
    if !radio.player_available().await {
        error!("FATAL: {} not found. Please install ffmpeg.", player);
        let screen = ErrorScreen::persistent(format!("{} missing", player));
        blocking(|| display.show_screen(Box::new(screen), true));
        let until = Instant::now() + MISSING_PLAYER_HOLD;
        while Instant::now() < until {
            blocking(|| display.update_display());
            tokio::time::sleep(cfg.display.refresh()).await;
        }
        anyhow::bail!("{} not found on PATH", player);
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let buttons = if cfg.hardware.enabled() {
        match Buttons::start(cfg.gpio.pins(), cfg.gpio.bounce(), tx.clone()) {
            Ok(buttons) => Some(buttons),
            Err(e) => {
                warn!("{}; running without physical button support", e);
                None
            }
        }
    } else {
        info!("Hardware mode disabled - GPIO buttons not initialized");
        None
    };

    let controls = tokio::spawn(Arc::clone(&radio).run_controls(rx));
    let display_task = tokio::spawn(Arc::clone(&radio).run_display(cfg.display.refresh()));
    let playback_task = tokio::spawn(Arc::clone(&radio).run_playback(cfg.playback.poll_interval()));

    info!("Radio starting... Press Ctrl+C to exit.");
    if let Err(e) = signal_handler().await {
        error!("Signal handling failed: {}", e);
    }

    info!("Stopping background tasks...");
    radio.request_shutdown();
    drop(buttons);
    drop(tx);
    if let Err(e) = display_task.await {
        warn!("Display task ended abnormally: {}", e);
    }
    playback_task.abort();
    controls.abort();

    radio.farewell(cfg.screen.goodbye_duration()).await;
    info!("Shutdown complete.");
    Ok(())
}
