// Host-side tests for settings persistence, themes and the scene-side effects
// of applying settings. The main crate is wasm-only, so we include the
// pure-Rust core modules directly.

#![allow(dead_code)]
#[path = "../src/core/mod.rs"]
mod head_core;

use head_core::*;

fn scene() -> SceneState {
    SceneState::new(
        640,
        480,
        SceneSeeds {
            particles: 11,
            weather: 12,
            environment: 13,
        },
    )
}

#[test]
fn defaults_match_documented_values() {
    let s = Settings::default();
    assert_eq!(s.render_quality, RenderQuality::High);
    assert_eq!(s.particle_intensity, 0.8);
    assert_eq!(s.environment_lighting, "studio");
    assert_eq!(s.auto_rotate_speed, 1.0);
    assert!(s.post_processing);
    assert_eq!(s.weather, "clear");
}

#[test]
fn stored_record_uses_camel_case_keys() {
    let json = Settings::default().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    for key in [
        "renderQuality",
        "particleIntensity",
        "environmentLighting",
        "autoRotateSpeed",
        "postProcessing",
        "weather",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["renderQuality"], "high");
}

#[test]
fn save_then_load_round_trips() {
    let mut store = MemoryStore::new();
    let mut settings = Settings::default();
    settings.render_quality = RenderQuality::Low;
    settings.environment_lighting = "night".into();
    settings.weather = "snow".into();
    settings.auto_rotate_speed = 2.5;
    save_settings(&mut store, &settings, "neon").unwrap();

    let loaded = load_settings(&store);
    assert_eq!(loaded.settings, settings);
    assert_eq!(loaded.theme.as_deref(), Some("neon"));
}

#[test]
fn partial_record_merges_over_defaults() {
    let merged = Settings::merged_from_json(r#"{"weather":"rain","extra":42}"#).unwrap();
    assert_eq!(merged.weather, "rain");
    assert_eq!(merged.render_quality, RenderQuality::High);
    assert_eq!(merged.particle_intensity, 0.8);
}

#[test]
fn wrongly_typed_field_keeps_default() {
    let merged =
        Settings::merged_from_json(r#"{"particleIntensity":"lots","renderQuality":"ultra"}"#)
            .unwrap();
    assert_eq!(merged.particle_intensity, 0.8);
    assert_eq!(merged.render_quality, RenderQuality::Ultra);
}

#[test]
fn unreadable_record_falls_back_to_defaults() {
    assert!(matches!(
        Settings::merged_from_json("not json"),
        Err(SettingsError::Json(_))
    ));
    assert!(matches!(
        Settings::merged_from_json("[1,2]"),
        Err(SettingsError::NotAnObject)
    ));

    let mut store = MemoryStore::new();
    store.set(SETTINGS_KEY, "{broken").unwrap();
    let loaded = load_settings(&store);
    assert_eq!(loaded.settings, Settings::default());
    assert!(loaded.theme.is_none());
}

#[test]
fn stored_intensity_drives_slider_and_particles() {
    let mut store = MemoryStore::new();
    store
        .set(SETTINGS_KEY, r#"{"particleIntensity":0.8}"#)
        .unwrap();
    let loaded = load_settings(&store);
    assert_eq!(loaded.settings.particle_slider_value(), 80);
    assert_eq!(loaded.settings.particle_label(), "80%");

    let mut scene = scene();
    scene.apply_settings(&loaded.settings, 2.0);
    for system in &scene.particles.systems {
        assert!(system.visible);
        assert!((system.intensity - 0.8).abs() < 1e-6);
    }
}

#[test]
fn slider_conversions() {
    let mut s = Settings::default();
    s.set_particle_from_slider(35.0);
    assert!((s.particle_intensity - 0.35).abs() < 1e-6);
    assert_eq!(s.particle_slider_value(), 35);
    s.auto_rotate_speed = 0.5;
    assert_eq!(s.rotation_label(), "0.5x");
}

#[test]
fn quality_maps_to_pixel_ratio() {
    assert_eq!(RenderQuality::Low.pixel_ratio(3.0), 0.5);
    assert_eq!(RenderQuality::Medium.pixel_ratio(3.0), 0.75);
    assert_eq!(RenderQuality::High.pixel_ratio(3.0), 1.5);
    assert_eq!(RenderQuality::High.pixel_ratio(1.0), 1.0);
    assert_eq!(RenderQuality::Ultra.pixel_ratio(3.0), 3.0);
    for q in ["low", "medium", "high", "ultra"] {
        assert_eq!(RenderQuality::from_name(q).map(RenderQuality::name), Some(q));
    }
    assert!(RenderQuality::from_name("extreme").is_none());
}

#[test]
fn apply_settings_reaches_every_subsystem() {
    let mut scene = scene();
    let settings = Settings {
        render_quality: RenderQuality::Medium,
        particle_intensity: 0.0,
        environment_lighting: "cyberpunk".into(),
        auto_rotate_speed: 3.0,
        post_processing: false,
        weather: "mist".into(),
    };
    scene.apply_settings(&settings, 2.0);
    assert_eq!(scene.pixel_ratio, 0.75);
    assert!(scene.particles.systems.iter().all(|s| !s.visible));
    assert_eq!(scene.environment.current_environment(), "cyberpunk");
    assert_eq!(scene.background, scene.environment.current().background);
    assert_eq!(scene.auto_rotate_speed, 3.0);
    assert!(!scene.post_enabled);
    assert_eq!(scene.weather.current_weather(), "mist");
}

#[test]
fn themes_expose_css_properties() {
    assert_eq!(THEMES.len(), 4);
    let dark = theme_by_key(DEFAULT_THEME).unwrap();
    assert_eq!(dark.background_rgb(), [0.0, 0.0, 0.0]);
    let light = theme_by_key("light").unwrap();
    let props = light.css_properties();
    assert_eq!(props[0], ("--theme-background", "#f0f0f0"));
    assert_eq!(props[3], ("--theme-accent", "#0066ff"));
    assert!(theme_by_key("solarized").is_none());
}

#[test]
fn hex_parsing() {
    assert_eq!(parse_hex_rgb("#ff0000"), Some([1.0, 0.0, 0.0]));
    assert_eq!(parse_hex_rgb("ff0000"), None);
    assert_eq!(parse_hex_rgb("#fff"), None);
    assert_eq!(parse_hex_rgb("#gggggg"), None);
    assert_eq!(hex_to_rgb(0x00ff00), [0.0, 1.0, 0.0]);
}
