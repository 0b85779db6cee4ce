use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::zones::ZoneRegistry;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldClockConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub clock: ClockSettings,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub zone: Vec<ZoneEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default = "default_anchor")]
    pub anchor: String,
    #[serde(default = "default_margin")]
    pub margin_top: i32,
    #[serde(default)]
    pub margin_bottom: i32,
    #[serde(default)]
    pub margin_left: i32,
    #[serde(default = "default_margin")]
    pub margin_right: i32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub compact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSettings {
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default = "default_footer")]
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_all_label")]
    pub all_label: String,
    #[serde(default = "default_all_icon")]
    pub all_icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default = "default_fg_color", deserialize_with = "deserialize_color")]
    pub fg_color: [u8; 4],
    #[serde(default = "default_bg_color", deserialize_with = "deserialize_color")]
    pub bg_color: [u8; 4],
    #[serde(default = "default_card_color", deserialize_with = "deserialize_color")]
    pub card_color: [u8; 4],
    #[serde(default = "default_button_color", deserialize_with = "deserialize_color")]
    pub button_color: [u8; 4],
    #[serde(default = "default_accent_color", deserialize_with = "deserialize_color")]
    pub accent_color: [u8; 4],
    #[serde(default = "default_today_color", deserialize_with = "deserialize_color")]
    pub today_color: [u8; 4],
    #[serde(default = "default_tomorrow_color", deserialize_with = "deserialize_color")]
    pub tomorrow_color: [u8; 4],
    #[serde(default = "default_yesterday_color", deserialize_with = "deserialize_color")]
    pub yesterday_color: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEntry {
    pub id: String,
    pub tz: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub icon: String,
}

// Defaults

fn default_layer() -> String { "top".into() }
fn default_anchor() -> String { "top right".into() }
fn default_margin() -> i32 { 20 }
fn default_opacity() -> f32 { 1.0 }
fn default_font() -> String { "monospace".into() }
fn default_font_size() -> f32 { 32.0 }
fn default_refresh_ms() -> u64 { 200 }
fn default_title() -> String { "World Clock".into() }
fn default_footer() -> String { "Live local time".into() }
fn default_all_label() -> String { "Both".into() }
fn default_all_icon() -> String { "\u{1F30F}".into() }

fn default_fg_color() -> [u8; 4] { [0xF1, 0xF5, 0xF9, 0xFF] }
fn default_bg_color() -> [u8; 4] { [0x0F, 0x17, 0x2A, 0xE6] }
fn default_card_color() -> [u8; 4] { [0x1E, 0x29, 0x3B, 0xFF] }
fn default_button_color() -> [u8; 4] { [0x33, 0x41, 0x55, 0xFF] }
fn default_accent_color() -> [u8; 4] { [0x38, 0xBD, 0xF8, 0xFF] }
fn default_today_color() -> [u8; 4] { [0x4A, 0xDE, 0x80, 0xFF] }
fn default_tomorrow_color() -> [u8; 4] { [0xFB, 0xBF, 0x24, 0xFF] }
fn default_yesterday_color() -> [u8; 4] { [0xA7, 0x8B, 0xFA, 0xFF] }

fn deserialize_color<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 4], D::Error> {
    let s = String::deserialize(d)?;
    parse_color(&s).map_err(serde::de::Error::custom)
}

pub fn parse_color(s: &str) -> Result<[u8; 4]> {
    let s = s.trim_start_matches('#');
    anyhow::ensure!(s.is_ascii(), "Color must be hex digits, got '{}'", s);
    anyhow::ensure!(s.len() == 6 || s.len() == 8, "Color must be RRGGBB or RRGGBBAA");
    let r = u8::from_str_radix(&s[0..2], 16)?;
    let g = u8::from_str_radix(&s[2..4], 16)?;
    let b = u8::from_str_radix(&s[4..6], 16)?;
    let a = if s.len() == 8 { u8::from_str_radix(&s[6..8], 16)? } else { 0xFF };
    Ok([r, g, b, a])
}

// Implementations

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            layer: default_layer(),
            anchor: default_anchor(),
            margin_top: default_margin(),
            margin_bottom: 0,
            margin_left: 0,
            margin_right: default_margin(),
            opacity: default_opacity(),
            compact: false,
        }
    }
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            font: default_font(),
            font_size: default_font_size(),
            refresh_ms: default_refresh_ms(),
            title: default_title(),
            subtitle: String::new(),
            footer: default_footer(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            all_label: default_all_label(),
            all_icon: default_all_icon(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            fg_color: default_fg_color(),
            bg_color: default_bg_color(),
            card_color: default_card_color(),
            button_color: default_button_color(),
            accent_color: default_accent_color(),
            today_color: default_today_color(),
            tomorrow_color: default_tomorrow_color(),
            yesterday_color: default_yesterday_color(),
        }
    }
}

impl ClockSettings {
    /// Refresh cadence, kept between 50 ms and one second so the seconds
    /// field never visibly skips.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.clamp(50, 1000))
    }
}

impl WorldClockConfig {
    /// Zones from `[[zone]]` entries, or the built-in pair when none are given.
    pub fn registry(&self) -> Result<ZoneRegistry> {
        if self.zone.is_empty() {
            return Ok(ZoneRegistry::builtin());
        }
        ZoneRegistry::from_entries(&self.zone).context("Invalid [[zone]] configuration")
    }

    /// Subtitle shown under the title; defaults to the zone cities joined.
    pub fn subtitle(&self, registry: &ZoneRegistry) -> String {
        if !self.clock.subtitle.is_empty() {
            return self.clock.subtitle.clone();
        }
        let cities: Vec<&str> = registry.all_zones().iter().map(|z| z.city.as_str()).collect();
        match cities.as_slice() {
            [] => String::new(),
            [only] => only.to_string(),
            [init @ .., last] => format!("{} & {}", init.join(", "), last),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs_path().join("config.toml")
}

fn dirs_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(".config")
        });
    base.join("worldclock")
}

pub fn load_config(path: &std::path::Path) -> Result<WorldClockConfig> {
    if !path.exists() {
        log::info!("Config file not found at {}, generating default", path.display());
        let content = generate_default_config();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::write(path, &content) {
            Ok(()) => log::info!("Created default config at {}", path.display()),
            Err(e) => log::warn!("Failed to write default config: {}", e),
        }
        return Ok(WorldClockConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<WorldClockConfig> {
    Ok(toml::from_str(content)?)
}

fn generate_default_config() -> String {
    r#"# worldclock: Wayland layer-shell world clock
# Configuration file, generated automatically on first run.
# Uncomment and edit values to customise. Defaults are shown.

[window]
# Layer: background | bottom | top | overlay
layer  = "top"
# Anchor edges: top | bottom | left | right (space-separated)
anchor = "top right"
# Margins from anchored edges (px)
margin_top    = 20
margin_right  = 20
margin_bottom = 0
margin_left   = 0
# Window opacity 0.0-1.0
opacity = 1.0
# Start in compact mode (hides header and footer)
compact = false

[clock]
# Font: system font name or path to .ttf/.otf
font = "monospace"
# Base text size in px; the window sizes itself from this
font_size = 32.0
# How often each card recomputes its time, in ms (50-1000)
refresh_ms = 200
title  = "World Clock"
# Empty = the registered cities, e.g. "Brisbane & Reno"
subtitle = ""
footer = "Live local time"

[view]
# Selector button that shows every zone
all_label = "Both"
all_icon  = "🌏"

[theme]
# Colours in RRGGBB or RRGGBBAA hex (# prefix optional)
fg_color        = "F1F5F9FF"
bg_color        = "0F172AE6"
card_color      = "1E293BFF"
button_color    = "334155FF"
accent_color    = "38BDF8FF"
today_color     = "4ADE80FF"
tomorrow_color  = "FBBF24FF"
yesterday_color = "A78BFAFF"

# Zones, in selector order. Without any [[zone]] entries the built-in
# Brisbane and Reno clocks are used. Ids must be unique and not "all".

# [[zone]]
# id     = "brisbane"
# tz     = "Australia/Brisbane"
# city   = "Brisbane"
# region = "Queensland, Australia"
# icon   = "🦘"

# [[zone]]
# id     = "reno"
# tz     = "America/Los_Angeles"
# city   = "Reno"
# region = "Nevada, USA"
# icon   = "🎰"
"#.to_string()
}
