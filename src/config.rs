/*
 *  config.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line
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

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEBOUNCE_WINDOW, DEFAULT_API_URL, DEFAULT_ART_CACHE_CAPACITY, DEFAULT_BACKOFF_CEILING, DEFAULT_DIM_AFTER,
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_FPS, DEFAULT_OFF_AFTER, DEFAULT_POLL_INTERVAL, MAX_INTERVAL,
    MIN_SCREENSAVER_STEP,
};
use crate::display::layout::{ButtonStyle, ControlSet, DisplayConfig as LayoutConfig, LayoutMode};
use crate::geometry::Rotation;
use crate::poller::PollerConfig;
use crate::screensaver::ScreensaverConfig;

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

/// Which panel backend to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Linux framebuffer /dev/fbN
    #[default]
    Fbdev,
    /// Headless, nothing is shown
    Mock,
    /// Desktop window (feature `emulator`)
    Emulator,
}

/// YAML file shape. Everything optional so layers merge field by field.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub log_level: Option<String>,
    pub api_url: Option<String>,
    pub demo: Option<bool>,
    pub poll_interval_secs: Option<f64>,
    pub backoff_ceiling_secs: Option<f64>,
    pub failure_threshold: Option<u32>,
    pub art_cache_capacity: Option<usize>,
    pub fps: Option<u32>,
    pub display: Option<DisplaySection>,
    pub controls: Option<ControlsSection>,
    pub screensaver: Option<ScreensaverSection>,
    pub touch: Option<TouchSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DisplaySection {
    /// framebuffer number, `/dev/fb{index}`
    pub index: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rotation: Option<u16>,
    pub mode: Option<LayoutMode>,
    pub button_style: Option<ButtonStyle>,
    pub volume_slider: Option<bool>,
    pub driver: Option<DriverKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ControlsSection {
    pub no_control: Option<bool>,
    pub hide_like: Option<bool>,
    pub volume_buttons: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScreensaverSection {
    pub enabled: Option<bool>,
    pub dim_after_secs: Option<u64>,
    pub off_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TouchSection {
    /// e.g. /dev/input/event0
    pub device: Option<PathBuf>,
    pub calibration: Option<Calibration>,
}

/// Raw touch controller range, scaled onto the panel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Calibration {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

/// CLI overrides. Options and set-true flags only, so they layer over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "nowpanel", about = "NowPanel - touch now playing display", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// error, warn, info, debug or trace
    #[arg(long)]
    pub log_level: Option<String>,
    /// Shorthand for --log-level debug
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// Framebuffer index, /dev/fbN
    #[arg(long)]
    pub display: Option<u32>,
    /// 0, 90, 180 or 270
    #[arg(long)]
    pub rotation: Option<u16>,
    #[arg(long, value_enum)]
    pub mode: Option<LayoutMode>,
    #[arg(long, value_enum)]
    pub button_style: Option<ButtonStyle>,
    #[arg(long, action = ArgAction::SetTrue)]
    pub volume_slider: bool,
    /// Only the like button
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_control: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    pub hide_like: bool,
    /// AudioControl API base, e.g. http://localhost:1080/api
    #[arg(long, value_hint = ValueHint::Url)]
    pub api_url: Option<String>,
    /// Cycle a built-in playlist instead of polling the player
    #[arg(long, action = ArgAction::SetTrue)]
    pub demo: bool,
    /// Seconds between now-playing queries
    #[arg(long)]
    pub poll_interval: Option<f64>,
    #[arg(long, value_enum)]
    pub driver: Option<DriverKind>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Fully resolved settings, every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_level: String,
    pub api_url: String,
    pub demo: bool,
    pub poller: PollerConfig,
    pub art_cache_capacity: usize,
    pub fps: u32,
    pub debounce: Duration,
    pub driver: DriverKind,
    pub display_index: u32,
    /// Panel size override; fbdev reads it from sysfs otherwise
    pub size: Option<(u32, u32)>,
    pub rotation: Rotation,
    pub mode: LayoutMode,
    pub button_style: ButtonStyle,
    pub show_volume_slider: bool,
    pub controls: ControlSet,
    pub screensaver: ScreensaverConfig,
    pub touch_device: Option<PathBuf>,
    pub touch_calibration: Option<Calibration>,
}

impl Settings {
    /// Layout inputs for a panel of the given physical size
    pub fn layout_config(&self, screen_width: u32, screen_height: u32) -> LayoutConfig {
        LayoutConfig {
            mode: self.mode,
            rotation: self.rotation,
            button_style: self.button_style,
            show_volume_slider: self.show_volume_slider,
            controls: self.controls,
            screen_width,
            screen_height,
        }
    }
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Settings, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(resolve(&cfg))
}

/// Layer YAML and `cli` over the defaults and validate the result.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!("Config file not found: {}", p.display())));
        }
        merge(&mut cfg, read_yaml(p)?);
    } else if let Some(p) = find_config_file() {
        merge(&mut cfg, read_yaml(&p)?);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/nowpanel/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/nowpanel.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["/etc/nowpanel.yaml", "nowpanel.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    // an empty file is a valid, empty config
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(s)?)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()            { dst.log_level = src.log_level; }
    if src.api_url.is_some()              { dst.api_url = src.api_url; }
    if src.demo.is_some()                 { dst.demo = src.demo; }
    if src.poll_interval_secs.is_some()   { dst.poll_interval_secs = src.poll_interval_secs; }
    if src.backoff_ceiling_secs.is_some() { dst.backoff_ceiling_secs = src.backoff_ceiling_secs; }
    if src.failure_threshold.is_some()    { dst.failure_threshold = src.failure_threshold; }
    if src.art_cache_capacity.is_some()   { dst.art_cache_capacity = src.art_cache_capacity; }
    if src.fps.is_some()                  { dst.fps = src.fps; }

    match (&mut dst.display, src.display) {
        (None, Some(s)) => dst.display = Some(s),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
    match (&mut dst.controls, src.controls) {
        (None, Some(s)) => dst.controls = Some(s),
        (Some(d), Some(s)) => merge_controls(d, s),
        _ => {}
    }
    match (&mut dst.screensaver, src.screensaver) {
        (None, Some(s)) => dst.screensaver = Some(s),
        (Some(d), Some(s)) => merge_screensaver(d, s),
        _ => {}
    }
    match (&mut dst.touch, src.touch) {
        (None, Some(s)) => dst.touch = Some(s),
        (Some(d), Some(s)) => {
            if s.device.is_some()      { d.device = s.device; }
            if s.calibration.is_some() { d.calibration = s.calibration; }
        }
        _ => {}
    }
}

fn merge_display(dst: &mut DisplaySection, src: DisplaySection) {
    if src.index.is_some()         { dst.index = src.index; }
    if src.width.is_some()         { dst.width = src.width; }
    if src.height.is_some()        { dst.height = src.height; }
    if src.rotation.is_some()      { dst.rotation = src.rotation; }
    if src.mode.is_some()          { dst.mode = src.mode; }
    if src.button_style.is_some()  { dst.button_style = src.button_style; }
    if src.volume_slider.is_some() { dst.volume_slider = src.volume_slider; }
    if src.driver.is_some()        { dst.driver = src.driver; }
}

fn merge_controls(dst: &mut ControlsSection, src: ControlsSection) {
    if src.no_control.is_some()     { dst.no_control = src.no_control; }
    if src.hide_like.is_some()      { dst.hide_like = src.hide_like; }
    if src.volume_buttons.is_some() { dst.volume_buttons = src.volume_buttons; }
}

fn merge_screensaver(dst: &mut ScreensaverSection, src: ScreensaverSection) {
    if src.enabled.is_some()        { dst.enabled = src.enabled; }
    if src.dim_after_secs.is_some() { dst.dim_after_secs = src.dim_after_secs; }
    if src.off_after_secs.is_some() { dst.off_after_secs = src.off_after_secs; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.debug {
        cfg.log_level = Some("debug".into());
    } else if cli.log_level.is_some() {
        cfg.log_level = cli.log_level.clone();
    }
    if cli.api_url.is_some()       { cfg.api_url = cli.api_url.clone(); }
    if cli.demo                    { cfg.demo = Some(true); }
    if cli.poll_interval.is_some() { cfg.poll_interval_secs = cli.poll_interval; }

    let any_display = cli.display.is_some()
        || cli.rotation.is_some()
        || cli.mode.is_some()
        || cli.button_style.is_some()
        || cli.volume_slider
        || cli.driver.is_some();
    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplaySection::default());
    }
    if let Some(display) = cfg.display.as_mut() {
        if cli.display.is_some()      { display.index = cli.display; }
        if cli.rotation.is_some()     { display.rotation = cli.rotation; }
        if cli.mode.is_some()         { display.mode = cli.mode; }
        if cli.button_style.is_some() { display.button_style = cli.button_style; }
        if cli.volume_slider          { display.volume_slider = Some(true); }
        if cli.driver.is_some()       { display.driver = cli.driver; }
    }

    if (cli.no_control || cli.hide_like) && cfg.controls.is_none() {
        cfg.controls = Some(ControlsSection::default());
    }
    if let Some(controls) = cfg.controls.as_mut() {
        if cli.no_control { controls.no_control = Some(true); }
        if cli.hide_like  { controls.hide_like = Some(true); }
    }
}

fn invalid<T>(msg: impl Into<String>) -> Result<T, ConfigError> {
    Err(ConfigError::Validation(msg.into()))
}

fn check_interval(what: &str, secs: f64) -> Result<(), ConfigError> {
    if !(secs.is_finite() && secs > 0.0) {
        return invalid(format!("{} must be > 0 seconds", what));
    }
    if secs > MAX_INTERVAL.as_secs_f64() {
        return invalid(format!("{} must be <= {} seconds", what, MAX_INTERVAL.as_secs()));
    }
    Ok(())
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(level) = cfg.log_level.as_deref() {
        if level.parse::<log::LevelFilter>().is_err() {
            return invalid(format!("log_level '{}' is not a log level", level));
        }
    }
    if let Some(url) = cfg.api_url.as_deref() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return invalid(format!("api_url '{}' must be an http(s) URL", url));
        }
    }
    if let Some(secs) = cfg.poll_interval_secs {
        check_interval("poll interval", secs)?;
    }
    if let Some(secs) = cfg.backoff_ceiling_secs {
        check_interval("backoff ceiling", secs)?;
    }
    if cfg.failure_threshold == Some(0) {
        return invalid("failure_threshold must be >= 1");
    }
    if cfg.art_cache_capacity == Some(0) {
        return invalid("art_cache_capacity must be >= 1");
    }
    if cfg.fps == Some(0) {
        return invalid("fps must be >= 1");
    }

    if let Some(display) = cfg.display.as_ref() {
        if display.width == Some(0) || display.height == Some(0) {
            return invalid("display width/height must be > 0");
        }
        if display.width.is_some() != display.height.is_some() {
            return invalid("display width and height must be given together");
        }
        if let Some(rot) = display.rotation {
            if Rotation::from_degrees(rot).is_none() {
                return invalid(format!("display rotation must be 0|90|180|270 (got {})", rot));
            }
        }
    }

    if let Some(saver) = cfg.screensaver.as_ref() {
        let dim = saver.dim_after_secs.map(Duration::from_secs).unwrap_or(DEFAULT_DIM_AFTER);
        let off = saver.off_after_secs.map(Duration::from_secs).unwrap_or(DEFAULT_OFF_AFTER);
        if dim < MIN_SCREENSAVER_STEP {
            return invalid(format!("screensaver dim_after_secs must be >= {}", MIN_SCREENSAVER_STEP.as_secs()));
        }
        if off < dim.saturating_add(MIN_SCREENSAVER_STEP) {
            return invalid(format!(
                "screensaver off_after_secs must be at least {}s after dim_after_secs",
                MIN_SCREENSAVER_STEP.as_secs()
            ));
        }
    }

    if let Some(cal) = cfg.touch.as_ref().and_then(|t| t.calibration) {
        if cal.x_max <= cal.x_min || cal.y_max <= cal.y_min {
            return invalid("touch calibration max must be greater than min");
        }
    }
    Ok(())
}

/// Apply defaults to a validated config.
pub fn resolve(cfg: &Config) -> Settings {
    let display = cfg.display.clone().unwrap_or_default();
    let controls = cfg.controls.clone().unwrap_or_default();
    let saver = cfg.screensaver.clone().unwrap_or_default();
    let touch = cfg.touch.clone().unwrap_or_default();

    let no_control = controls.no_control.unwrap_or(false);
    let controls = ControlSet {
        transport: !no_control,
        like: !controls.hide_like.unwrap_or(false),
        volume_buttons: !no_control && controls.volume_buttons.unwrap_or(false),
    };

    Settings {
        log_level: cfg.log_level.clone().unwrap_or_else(|| "info".into()),
        api_url: cfg.api_url.clone().unwrap_or_else(|| DEFAULT_API_URL.into()),
        demo: cfg.demo.unwrap_or(false),
        poller: PollerConfig {
            interval: cfg
                .poll_interval_secs
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            backoff_ceiling: cfg
                .backoff_ceiling_secs
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
                .unwrap_or(DEFAULT_BACKOFF_CEILING),
            failure_threshold: cfg.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD),
        },
        art_cache_capacity: cfg.art_cache_capacity.unwrap_or(DEFAULT_ART_CACHE_CAPACITY),
        fps: cfg.fps.unwrap_or(DEFAULT_FPS),
        debounce: DEBOUNCE_WINDOW,
        driver: display.driver.unwrap_or_default(),
        display_index: display.index.unwrap_or(0),
        size: display.width.zip(display.height),
        rotation: display.rotation.and_then(Rotation::from_degrees).unwrap_or_default(),
        mode: display.mode.unwrap_or_default(),
        button_style: display.button_style.unwrap_or_default(),
        show_volume_slider: display.volume_slider.unwrap_or(false),
        controls,
        screensaver: ScreensaverConfig {
            enabled: saver.enabled.unwrap_or(true),
            dim_after: saver.dim_after_secs.map(Duration::from_secs).unwrap_or(DEFAULT_DIM_AFTER),
            off_after: saver.off_after_secs.map(Duration::from_secs).unwrap_or(DEFAULT_OFF_AFTER),
        },
        touch_device: touch.device,
        touch_calibration: touch.calibration,
    }
}
