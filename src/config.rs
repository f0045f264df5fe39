/*
 *  config.rs
 *
 *  PlexRadio - tune in, turn up
 *  (c) 2025-26 PlexRadio contributors
 *
 *  Layered configuration: defaults, YAML file, environment and CLI
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

use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint, builder::BoolishValueParser};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::display::{ManagerSettings, MarqueeTiming};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
///
/// Every leaf is optional so files and CLI flags can be layered; the
/// accessor methods on each section supply the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub marquee: MarqueeConfig,
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HardwareConfig {
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GpioConfig {
    pub power_pin: Option<u8>,
    pub volume_up_pin: Option<u8>,
    pub volume_down_pin: Option<u8>,
    pub channel_up_pin: Option<u8>,
    pub channel_down_pin: Option<u8>,
    pub bounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    pub enabled: Option<bool>,
    pub driver: Option<DriverKind>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub i2c_bus: Option<String>,
    #[serde(alias = "i2cAddress")]
    pub i2c_address: Option<u8>,
    pub min_op_delay_ms: Option<u64>,
    pub fallback_to_mock: Option<bool>,
    pub refresh_ms: Option<u64>,
}

/// Marquee timings in seconds
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MarqueeConfig {
    #[serde(alias = "scrollSpeed")]
    pub scroll_speed: Option<f64>,
    #[serde(alias = "preDelay")]
    pub pre_delay: Option<f64>,
    #[serde(alias = "postDelay")]
    pub post_delay: Option<f64>,
}

/// Screen durations in seconds
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScreenConfig {
    #[serde(alias = "defaultTimedDuration")]
    pub default_timed_duration: Option<f64>,
    pub error_duration: Option<f64>,
    pub goodbye_duration: Option<f64>,
    pub transition_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PlaybackConfig {
    pub player: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub stop_timeout_secs: Option<u64>,
    pub persistence_file: Option<PathBuf>,
    pub startup_volume: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoggingConfig {
    pub quiet_mode: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Hd44780,
    Mock,
}

/// BCM pin numbers of the five front panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPins {
    pub power: u8,
    pub volume_up: u8,
    pub volume_down: u8,
    pub channel_up: u8,
    pub channel_down: u8,
}

impl ButtonPins {
    pub fn all(&self) -> [u8; 5] {
        [self.power, self.volume_up, self.volume_down, self.channel_up, self.channel_down]
    }
}

fn secs(value: Option<f64>, default: f64) -> Duration {
    Duration::try_from_secs_f64(value.unwrap_or(default))
        .unwrap_or_else(|_| Duration::from_secs_f64(default))
}

impl ApiConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or("http://localhost:5000")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(5))
    }
}

impl HardwareConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

impl GpioConfig {
    pub fn pins(&self) -> ButtonPins {
        ButtonPins {
            power: self.power_pin.unwrap_or(25),
            volume_up: self.volume_up_pin.unwrap_or(23),
            volume_down: self.volume_down_pin.unwrap_or(24),
            channel_up: self.channel_up_pin.unwrap_or(14),
            channel_down: self.channel_down_pin.unwrap_or(15),
        }
    }

    pub fn bounce(&self) -> Duration {
        Duration::from_millis(self.bounce_ms.unwrap_or(10))
    }
}

impl DisplayConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn driver(&self) -> DriverKind {
        self.driver.unwrap_or(DriverKind::Hd44780)
    }

    pub fn width(&self) -> usize {
        self.width.unwrap_or(16)
    }

    pub fn height(&self) -> usize {
        self.height.unwrap_or(2)
    }

    pub fn i2c_bus(&self) -> &str {
        self.i2c_bus.as_deref().unwrap_or("/dev/i2c-1")
    }

    pub fn i2c_address(&self) -> u8 {
        self.i2c_address.unwrap_or(0x27)
    }

    pub fn min_op_delay(&self) -> Duration {
        Duration::from_millis(self.min_op_delay_ms.unwrap_or(10))
    }

    pub fn fallback_to_mock(&self) -> bool {
        self.fallback_to_mock.unwrap_or(true)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.unwrap_or(100))
    }
}

impl MarqueeConfig {
    pub fn timing(&self) -> MarqueeTiming {
        MarqueeTiming {
            scroll_speed: secs(self.scroll_speed, 0.4),
            pre_delay: secs(self.pre_delay, 2.0),
            post_delay: secs(self.post_delay, 2.0),
        }
    }
}

impl ScreenConfig {
    pub fn timed_duration(&self) -> Duration {
        secs(self.default_timed_duration, 2.0)
    }

    pub fn error_duration(&self) -> Duration {
        secs(self.error_duration, 3.0)
    }

    pub fn goodbye_duration(&self) -> Duration {
        secs(self.goodbye_duration, 1.5)
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            transition_interval: Duration::from_millis(self.transition_interval_ms.unwrap_or(100)),
            ..ManagerSettings::default()
        }
    }
}

impl PlaybackConfig {
    pub fn player(&self) -> &str {
        self.player.as_deref().unwrap_or("ffplay")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(10))
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs.unwrap_or(2))
    }

    pub fn persistence_file(&self) -> PathBuf {
        self.persistence_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("last_channel.txt"))
    }

    pub fn startup_volume(&self) -> u8 {
        self.startup_volume.unwrap_or(15)
    }
}

impl LoggingConfig {
    pub fn quiet_mode(&self) -> bool {
        self.quiet_mode.unwrap_or(true)
    }

    /// Filter handed to env_logger when RUST_LOG is not set
    pub fn default_filter(&self) -> String {
        match &self.log_level {
            Some(level) => level.to_lowercase(),
            None if self.quiet_mode() => "info".to_string(),
            None => "debug".to_string(),
        }
    }
}

impl Config {
    /// Copy with every default filled in, used by `--dump-config`.
    pub fn resolved(&self) -> Config {
        let pins = self.gpio.pins();
        let timing = self.marquee.timing();
        Config {
            api: ApiConfig {
                base_url: Some(self.api.base_url().to_string()),
                timeout_secs: Some(self.api.timeout().as_secs()),
            },
            hardware: HardwareConfig { enabled: Some(self.hardware.enabled()) },
            gpio: GpioConfig {
                power_pin: Some(pins.power),
                volume_up_pin: Some(pins.volume_up),
                volume_down_pin: Some(pins.volume_down),
                channel_up_pin: Some(pins.channel_up),
                channel_down_pin: Some(pins.channel_down),
                bounce_ms: Some(self.gpio.bounce().as_millis() as u64),
            },
            display: DisplayConfig {
                enabled: Some(self.display.enabled()),
                driver: Some(self.display.driver()),
                width: Some(self.display.width()),
                height: Some(self.display.height()),
                i2c_bus: Some(self.display.i2c_bus().to_string()),
                i2c_address: Some(self.display.i2c_address()),
                min_op_delay_ms: Some(self.display.min_op_delay().as_millis() as u64),
                fallback_to_mock: Some(self.display.fallback_to_mock()),
                refresh_ms: Some(self.display.refresh().as_millis() as u64),
            },
            marquee: MarqueeConfig {
                scroll_speed: Some(timing.scroll_speed.as_secs_f64()),
                pre_delay: Some(timing.pre_delay.as_secs_f64()),
                post_delay: Some(timing.post_delay.as_secs_f64()),
            },
            screen: ScreenConfig {
                default_timed_duration: Some(self.screen.timed_duration().as_secs_f64()),
                error_duration: Some(self.screen.error_duration().as_secs_f64()),
                goodbye_duration: Some(self.screen.goodbye_duration().as_secs_f64()),
                transition_interval_ms: Some(
                    self.screen.manager_settings().transition_interval.as_millis() as u64,
                ),
            },
            playback: PlaybackConfig {
                player: Some(self.playback.player().to_string()),
                poll_interval_secs: Some(self.playback.poll_interval().as_secs()),
                stop_timeout_secs: Some(self.playback.stop_timeout().as_secs()),
                persistence_file: Some(self.playback.persistence_file()),
                startup_volume: Some(self.playback.startup_volume()),
            },
            logging: LoggingConfig {
                quiet_mode: Some(self.logging.quiet_mode()),
                log_level: self.logging.log_level.clone(),
            },
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "plexradio", about = "PlexRadio - internet radio client with character LCD", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Only log state changes (true/false)
    #[arg(long, env = "RADIO_QUIET", value_parser = BoolishValueParser::new(), action = ArgAction::Set)]
    pub quiet: Option<bool>,
    /// Radio server base URL
    #[arg(long, env = "PLEX_RADIO_API_URL")]
    pub api_url: Option<String>,
    /// Use the GPIO buttons and the LCD (true/false)
    #[arg(long, env = "HARDWARE_MODE", value_parser = BoolishValueParser::new(), action = ArgAction::Set)]
    pub hardware_mode: Option<bool>,
    /// Shorthand for --hardware-mode false
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_hardware: bool,
    /// Render to the simulated display instead of the LCD
    #[arg(long, action = ArgAction::SetTrue)]
    pub mock_display: bool,
    #[arg(long)]
    pub display_width: Option<usize>,
    #[arg(long)]
    pub display_height: Option<usize>,
    #[arg(long)]
    pub i2c_bus: Option<String>,
    /// 7-bit address, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_i2c_address)]
    pub i2c_address: Option<u8>,
    /// blank the LCD, show a confirmation and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub clear_screen: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

fn parse_i2c_address(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    match parsed {
        Ok(addr) if addr <= 0x7F => Ok(addr),
        Ok(addr) => Err(format!("0x{:02X} is not a 7-bit I2C address", addr)),
        Err(e) => Err(format!("invalid I2C address '{}': {}", s, e)),
    }
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg.resolved())?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok((cfg, cli))
}

/// Build the effective configuration for an already parsed command line.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/plexradio/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/plexradio/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/plexradio.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["plexradio.yaml", "config.yaml", "config/plexradio.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    from_yaml_str(&s)
}

pub fn from_yaml_str(s: &str) -> Result<Config, ConfigError> {
    // an empty file is a valid, all-defaults config
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

fn set<T>(dst: &mut Option<T>, src: Option<T>) {
    if src.is_some() { *dst = src; }
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    set(&mut dst.api.base_url, src.api.base_url);
    set(&mut dst.api.timeout_secs, src.api.timeout_secs);

    set(&mut dst.hardware.enabled, src.hardware.enabled);

    set(&mut dst.gpio.power_pin, src.gpio.power_pin);
    set(&mut dst.gpio.volume_up_pin, src.gpio.volume_up_pin);
    set(&mut dst.gpio.volume_down_pin, src.gpio.volume_down_pin);
    set(&mut dst.gpio.channel_up_pin, src.gpio.channel_up_pin);
    set(&mut dst.gpio.channel_down_pin, src.gpio.channel_down_pin);
    set(&mut dst.gpio.bounce_ms, src.gpio.bounce_ms);

    merge_display(&mut dst.display, src.display);

    set(&mut dst.marquee.scroll_speed, src.marquee.scroll_speed);
    set(&mut dst.marquee.pre_delay, src.marquee.pre_delay);
    set(&mut dst.marquee.post_delay, src.marquee.post_delay);

    set(&mut dst.screen.default_timed_duration, src.screen.default_timed_duration);
    set(&mut dst.screen.error_duration, src.screen.error_duration);
    set(&mut dst.screen.goodbye_duration, src.screen.goodbye_duration);
    set(&mut dst.screen.transition_interval_ms, src.screen.transition_interval_ms);

    set(&mut dst.playback.player, src.playback.player);
    set(&mut dst.playback.poll_interval_secs, src.playback.poll_interval_secs);
    set(&mut dst.playback.stop_timeout_secs, src.playback.stop_timeout_secs);
    set(&mut dst.playback.persistence_file, src.playback.persistence_file);
    set(&mut dst.playback.startup_volume, src.playback.startup_volume);

    set(&mut dst.logging.quiet_mode, src.logging.quiet_mode);
    set(&mut dst.logging.log_level, src.logging.log_level);
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    set(&mut dst.enabled, src.enabled);
    set(&mut dst.driver, src.driver);
    set(&mut dst.width, src.width);
    set(&mut dst.height, src.height);
    set(&mut dst.i2c_bus, src.i2c_bus);
    set(&mut dst.i2c_address, src.i2c_address);
    set(&mut dst.min_op_delay_ms, src.min_op_delay_ms);
    set(&mut dst.fallback_to_mock, src.fallback_to_mock);
    set(&mut dst.refresh_ms, src.refresh_ms);
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()    { cfg.logging.log_level = cli.log_level.clone(); }
    if cli.quiet.is_some()        { cfg.logging.quiet_mode = cli.quiet; }
    if cli.api_url.is_some()      { cfg.api.base_url = cli.api_url.clone(); }
    if cli.hardware_mode.is_some() { cfg.hardware.enabled = cli.hardware_mode; }
    if cli.no_hardware            { cfg.hardware.enabled = Some(false); }
    if cli.mock_display           { cfg.display.driver = Some(DriverKind::Mock); }

    let display = &mut cfg.display;
    if cli.display_width.is_some()  { display.width = cli.display_width; }
    if cli.display_height.is_some() { display.height = cli.display_height; }
    if cli.i2c_bus.is_some()        { display.i2c_bus = cli.i2c_bus.clone(); }
    if cli.i2c_address.is_some()    { display.i2c_address = cli.i2c_address; }
}

fn check_secs(name: &str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ConfigError::Validation(format!(
            "{} must be a finite number of seconds >= 0 (got {})",
            name, v
        ))),
        _ => Ok(()),
    }
}

/// Every screen draws a title line over a value line
pub const MIN_DISPLAY_LINES: usize = 2;

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let display = &cfg.display;
    if display.width() == 0 || display.height() == 0 {
        return Err(ConfigError::Validation("display width/height must be > 0".into()));
    }
    if display.height() < MIN_DISPLAY_LINES {
        return Err(ConfigError::Validation(format!(
            "display height must be at least {} lines (got {})",
            MIN_DISPLAY_LINES,
            display.height()
        )));
    }
    if display.driver() == DriverKind::Hd44780 && display.height() > 4 {
        return Err(ConfigError::Validation("hd44780 supports at most 4 lines".into()));
    }
    if display.i2c_address() > 0x7F {
        return Err(ConfigError::Validation("display i2c_address must be a 7-bit address".into()));
    }

    check_secs("marquee.scroll_speed", cfg.marquee.scroll_speed)?;
    check_secs("marquee.pre_delay", cfg.marquee.pre_delay)?;
    check_secs("marquee.post_delay", cfg.marquee.post_delay)?;
    if cfg.marquee.scroll_speed == Some(0.0) {
        return Err(ConfigError::Validation("marquee.scroll_speed must be > 0".into()));
    }
    check_secs("screen.default_timed_duration", cfg.screen.default_timed_duration)?;
    check_secs("screen.error_duration", cfg.screen.error_duration)?;
    check_secs("screen.goodbye_duration", cfg.screen.goodbye_duration)?;

    let mut pins = cfg.gpio.pins().all();
    pins.sort_unstable();
    if pins.windows(2).any(|w| w[0] == w[1]) {
        return Err(ConfigError::Validation("gpio button pins must be distinct".into()));
    }

    if cfg.playback.startup_volume() > 100 {
        return Err(ConfigError::Validation("playback.startup_volume must be 0..=100".into()));
    }
    if cfg.display.refresh().is_zero() {
        return Err(ConfigError::Validation("display.refresh_ms must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.api.base_url(), "http://localhost:5000");
        assert!(cfg.hardware.enabled());
        assert_eq!(cfg.gpio.pins().all(), [25, 23, 24, 14, 15]);
        assert_eq!(cfg.display.driver(), DriverKind::Hd44780);
        assert_eq!((cfg.display.width(), cfg.display.height()), (16, 2));
        assert_eq!(cfg.display.i2c_address(), 0x27);
        assert_eq!(cfg.marquee.timing(), MarqueeTiming::default());
        assert_eq!(cfg.screen.timed_duration(), Duration::from_secs(2));
        assert_eq!(cfg.screen.goodbye_duration(), Duration::from_millis(1_500));
        assert_eq!(cfg.playback.persistence_file(), PathBuf::from("last_channel.txt"));
        assert_eq!(cfg.logging.default_filter(), "info");
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_camel_case_aliases() {
        let cfg = from_yaml_str(
            "display:\n  i2cAddress: 63\nmarquee:\n  scrollSpeed: 0.3\n  preDelay: 1.5\n  postDelay: 1.0\nscreen:\n  defaultTimedDuration: 2.5\n",
        )
        .unwrap();
        assert_eq!(cfg.display.i2c_address(), 0x3F);
        let timing = cfg.marquee.timing();
        assert_eq!(timing.scroll_speed, Duration::from_millis(300));
        assert_eq!(timing.pre_delay, Duration::from_millis(1_500));
        assert_eq!(timing.post_delay, Duration::from_secs(1));
        assert_eq!(cfg.screen.timed_duration(), Duration::from_millis(2_500));
    }

    #[test]
    fn test_sections_from_yaml() {
        let cfg = from_yaml_str(
            "api:\n  base_url: http://radio.local:5000\nhardware:\n  enabled: false\ngpio:\n  power_pin: 4\ndisplay:\n  driver: mock\nlogging:\n  quiet_mode: false\n",
        )
        .unwrap();
        assert_eq!(cfg.api.base_url(), "http://radio.local:5000");
        assert!(!cfg.hardware.enabled());
        assert_eq!(cfg.gpio.pins().power, 4);
        assert_eq!(cfg.gpio.pins().volume_up, 23);
        assert_eq!(cfg.display.driver(), DriverKind::Mock);
        assert_eq!(cfg.logging.default_filter(), "debug");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(from_yaml_str("").unwrap(), Config::default());
        assert_eq!(from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base = from_yaml_str("display:\n  width: 20\n  height: 4\n").unwrap();
        let over = from_yaml_str("display:\n  height: 2\n").unwrap();
        merge(&mut base, over);
        assert_eq!(base.display.width(), 20);
        assert_eq!(base.display.height(), 2);
    }

    #[test]
    fn test_cli_overrides_yaml() {
        let mut cfg = from_yaml_str("api:\n  base_url: http://a\nhardware:\n  enabled: true\n").unwrap();
        let cli = Cli {
            api_url: Some("http://b".into()),
            no_hardware: true,
            mock_display: true,
            i2c_address: Some(0x3F),
            ..Default::default()
        };
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.api.base_url(), "http://b");
        assert!(!cfg.hardware.enabled());
        assert_eq!(cfg.display.driver(), DriverKind::Mock);
        assert_eq!(cfg.display.i2c_address(), 0x3F);
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "plexradio",
            "--i2c-address",
            "0x3f",
            "--hardware-mode",
            "false",
            "--clear-screen",
        ])
        .unwrap();
        assert_eq!(cli.i2c_address, Some(0x3F));
        assert_eq!(cli.hardware_mode, Some(false));
        assert!(cli.clear_screen);
    }

    #[test]
    fn test_parse_i2c_address() {
        assert_eq!(parse_i2c_address("0x27"), Ok(0x27));
        assert_eq!(parse_i2c_address("39"), Ok(39));
        assert!(parse_i2c_address("0x80").is_err());
        assert!(parse_i2c_address("bogus").is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad = [
            "display:\n  width: 0\n",
            "display:\n  height: 5\n",
            "marquee:\n  scrollSpeed: 0\n",
            "marquee:\n  preDelay: -1\n",
            "screen:\n  error_duration: .nan\n",
            "gpio:\n  power_pin: 23\n",
            "playback:\n  startup_volume: 150\n",
        ];
        for yaml in bad {
            let cfg = from_yaml_str(yaml).unwrap();
            assert!(validate(&cfg).is_err(), "accepted: {yaml}");
        }
    }

    #[test]
    fn test_single_line_display_is_rejected() {
        for driver in ["mock", "hd44780"] {
            let cfg = from_yaml_str(&format!("display:\n  driver: {driver}\n  height: 1\n")).unwrap();
            let err = validate(&cfg).unwrap_err();
            assert!(err.to_string().contains("at least 2 lines"), "{err}");
        }

        let cli = Cli {
            display_height: Some(1),
            ..Default::default()
        };
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &cli);
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_mock_driver_allows_tall_display() {
        let cfg = from_yaml_str("display:\n  driver: mock\n  height: 8\n").unwrap();
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/plexradio.yaml")),
            ..Default::default()
        };
        assert!(matches!(load_from(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_resolved_round_trips_through_yaml() {
        let cfg = Config::default().resolved();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let back = from_yaml_str(&yaml).unwrap();
        assert_eq!(back, cfg);
        assert_eq!(back.display.i2c_address, Some(0x27));
    }
}
