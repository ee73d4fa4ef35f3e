//! User settings, colour themes and their key-value persistence.
//!
//! Persisted JSON uses the camelCase field names of the stored record. Loading
//! merges field by field over the defaults: missing keys, unknown keys and
//! values of the wrong type all leave the default in place.

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_KEY: &str = "contemplative-head-settings";
pub const THEME_KEY: &str = "contemplative-head-theme";
pub const DEFAULT_THEME: &str = "dark";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings record must be a JSON object")]
    NotAnObject,
    #[error("storage write failed for {key}: {reason}")]
    Storage { key: String, reason: String },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderQuality {
    Low,
    Medium,
    High,
    Ultra,
}

impl RenderQuality {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "low" => Some(RenderQuality::Low),
            "medium" => Some(RenderQuality::Medium),
            "high" => Some(RenderQuality::High),
            "ultra" => Some(RenderQuality::Ultra),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderQuality::Low => "low",
            RenderQuality::Medium => "medium",
            RenderQuality::High => "high",
            RenderQuality::Ultra => "ultra",
        }
    }

    /// Backing-store scale applied on top of CSS size.
    pub fn pixel_ratio(self, device_pixel_ratio: f64) -> f64 {
        match self {
            RenderQuality::Low => 0.5,
            RenderQuality::Medium => 0.75,
            RenderQuality::High => device_pixel_ratio.min(1.5),
            RenderQuality::Ultra => device_pixel_ratio,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub render_quality: RenderQuality,
    pub particle_intensity: f32,
    pub environment_lighting: String,
    pub auto_rotate_speed: f32,
    pub post_processing: bool,
    pub weather: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            render_quality: RenderQuality::High,
            particle_intensity: 0.8,
            environment_lighting: "studio".to_string(),
            auto_rotate_speed: 1.0,
            post_processing: true,
            weather: "clear".to_string(),
        }
    }
}

impl Settings {
    /// Parse a stored record and shallow-merge it over the defaults.
    pub fn merged_from_json(json: &str) -> Result<Self, SettingsError> {
        let stored: serde_json::Value = serde_json::from_str(json)?;
        let stored = stored.as_object().ok_or(SettingsError::NotAnObject)?;
        let mut merged = serde_json::to_value(Settings::default())?;
        for (key, value) in stored {
            let Some(fields) = merged.as_object() else {
                break;
            };
            if !fields.contains_key(key) {
                continue;
            }
            let mut candidate = merged.clone();
            candidate[key.as_str()] = value.clone();
            if serde_json::from_value::<Settings>(candidate.clone()).is_ok() {
                merged = candidate;
            } else {
                log::warn!("[settings] ignoring stored {key}: unexpected value {value}");
            }
        }
        Ok(serde_json::from_value(merged)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Slider position (0..=100) for the particle intensity.
    pub fn particle_slider_value(&self) -> u32 {
        (self.particle_intensity * 100.0).round().max(0.0) as u32
    }

    pub fn set_particle_from_slider(&mut self, slider: f64) {
        self.particle_intensity = (slider / 100.0) as f32;
    }

    pub fn particle_label(&self) -> String {
        format!("{}%", self.particle_slider_value())
    }

    pub fn rotation_label(&self) -> String {
        format!("{:.1}x", self.auto_rotate_speed)
    }
}

/// A UI colour theme. Colours are `#rrggbb` strings as written into CSS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub key: &'static str,
    pub name: &'static str,
    pub background: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
}

pub const THEMES: [Theme; 4] = [
    Theme {
        key: "dark",
        name: "Dark",
        background: "#000000",
        primary: "#ffffff",
        secondary: "#888888",
        accent: "#00ffff",
    },
    Theme {
        key: "light",
        name: "Light",
        background: "#f0f0f0",
        primary: "#000000",
        secondary: "#666666",
        accent: "#0066ff",
    },
    Theme {
        key: "neon",
        name: "Neon",
        background: "#0a0a0a",
        primary: "#00ff00",
        secondary: "#ff00ff",
        accent: "#ffff00",
    },
    Theme {
        key: "sunset",
        name: "Sunset",
        background: "#1a1a2e",
        primary: "#ff6b35",
        secondary: "#f7931e",
        accent: "#ffcd3c",
    },
];

pub fn theme_by_key(key: &str) -> Option<&'static Theme> {
    THEMES.iter().find(|t| t.key == key)
}

impl Theme {
    /// CSS custom properties rewritten when this theme is applied.
    pub fn css_properties(&self) -> [(&'static str, &'static str); 4] {
        [
            ("--theme-background", self.background),
            ("--theme-primary", self.primary),
            ("--theme-secondary", self.secondary),
            ("--theme-accent", self.accent),
        ]
    }

    pub fn background_rgb(&self) -> [f32; 3] {
        parse_hex_rgb(self.background).unwrap_or([0.0, 0.0, 0.0])
    }
}

/// Parse `#rrggbb` into linear-ish 0..1 floats (no gamma applied).
pub fn parse_hex_rgb(s: &str) -> Option<[f32; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let v = u32::from_str_radix(hex, 16).ok()?;
    Some(hex_to_rgb(v))
}

#[inline]
pub fn hex_to_rgb(v: u32) -> [f32; 3] {
    [
        ((v >> 16) & 0xff) as f32 / 255.0,
        ((v >> 8) & 0xff) as f32 / 255.0,
        (v & 0xff) as f32 / 255.0,
    ]
}

/// Minimal string key-value storage, implemented by `localStorage` in the
/// browser and by [`MemoryStore`] when that is unavailable.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: FnvHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn save_settings(
    store: &mut dyn KeyValueStore,
    settings: &Settings,
    theme: &str,
) -> Result<(), SettingsError> {
    store.set(SETTINGS_KEY, &settings.to_json()?)?;
    store.set(THEME_KEY, theme)
}

/// What a load produced: merged settings plus the stored theme name, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub theme: Option<String>,
}

/// Load settings, falling back to defaults when the record is absent or
/// unreadable.
pub fn load_settings(store: &dyn KeyValueStore) -> LoadedSettings {
    let settings = match store.get(SETTINGS_KEY) {
        Some(json) => Settings::merged_from_json(&json).unwrap_or_else(|e| {
            log::warn!("[settings] stored record ignored: {e}");
            Settings::default()
        }),
        None => Settings::default(),
    };
    LoadedSettings {
        settings,
        theme: store.get(THEME_KEY),
    }
}
