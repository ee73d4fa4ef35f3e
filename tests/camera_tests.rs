// Host-side tests for camera presets, transitions, orbit controls and the
// keyboard map. The main crate is wasm-only, so we include the pure-Rust
// core modules directly.

#![allow(dead_code)]
#[path = "../src/core/mod.rs"]
mod head_core;

use glam::Vec3;
use head_core::*;

const SEEDS: SceneSeeds = SceneSeeds {
    particles: 1,
    weather: 2,
    environment: 3,
};

fn close(a: Vec3, b: Vec3) -> bool {
    a.distance(b) < 1e-4
}

#[test]
fn preset_table_is_complete() {
    for preset in CameraPreset::ALL {
        assert_eq!(CameraPreset::from_name(preset.name()), Some(preset));
    }
    assert_eq!(
        CameraPreset::from_name("defaulting").map(CameraPreset::position),
        Some(Vec3::new(0.0, 0.0, 5.0))
    );
    assert!(CameraPreset::from_name("Vision").is_none());
    assert!(CameraPreset::from_name("").is_none());
    // every preset except the default has a header button
    let buttons = CameraPreset::ALL
        .iter()
        .filter(|p| p.button_id().is_some())
        .count();
    assert_eq!(buttons, 4);
}

#[test]
fn easing_hits_endpoints_and_midpoint() {
    assert_eq!(ease_exponential_in_out(0.0), 0.0);
    assert_eq!(ease_exponential_in_out(1.0), 1.0);
    assert!((ease_exponential_in_out(0.5) - 0.5).abs() < 1e-6);
    assert_eq!(ease_exponential_in_out(-3.0), 0.0);
    assert_eq!(ease_exponential_in_out(7.0), 1.0);
    let mut prev = 0.0;
    for i in 1..=100 {
        let v = ease_exponential_in_out(i as f32 / 100.0);
        assert!(v >= prev, "easing must be monotonic");
        prev = v;
    }
}

#[test]
fn newer_transition_supersedes_older() {
    let mut director = TransitionDirector::new();
    let (first, none) = director.begin(Vec3::ZERO, Vec3::X, 0.0, 2000.0);
    assert!(none.is_none());
    let (second, superseded) = director.begin(Vec3::ZERO, Vec3::Y, 100.0, 2000.0);
    assert_eq!(superseded, Some(first));
    assert!(second > first);
    let step = director.sample(500.0).expect("live transition");
    assert_eq!(step.token, second);
    let last = director.sample(2100.0).expect("final step");
    assert!(last.finished);
    assert_eq!(last.position, Vec3::Y);
    assert!(!director.is_active());
    assert!(director.sample(2200.0).is_none());
}

#[test]
fn zero_duration_transition_finishes_immediately() {
    let mut director = TransitionDirector::new();
    director.begin(Vec3::ZERO, Vec3::Z, 10.0, 0.0);
    let step = director.sample(10.0).unwrap();
    assert!(step.finished);
    assert_eq!(step.position, Vec3::Z);
}

#[test]
fn switch_view_lands_on_preset_and_restores_orbit() {
    let mut scene = SceneState::new(800, 600, SEEDS);
    assert!(scene.auto_rotate);
    let token = scene.switch_view("vision", 0.0);
    assert!(token.is_some());
    assert!(!scene.auto_rotate);
    assert!(scene.orbit.is_none());
    assert!(scene.is_transitioning());

    scene.step_camera(1000.0);
    assert!(scene.orbit.is_none());
    let mid = scene.camera.eye;
    assert!(!close(mid, CameraPreset::Vision.position()));

    scene.step_camera(TRANSITION_MS + 1.0);
    assert!(close(scene.camera.eye, CameraPreset::Vision.position()));
    assert_eq!(scene.camera.target, ORIGIN);
    assert!(!scene.is_transitioning());
    assert!(scene.orbit.is_some());
    // auto-rotate stays off until the user asks for it again
    assert!(!scene.auto_rotate);
}

#[test]
fn quick_successive_switches_end_at_last_preset() {
    let mut scene = SceneState::new(800, 600, SEEDS);
    let a = scene.switch_view("tunes", 0.0).unwrap();
    scene.step_camera(300.0);
    let b = scene.switch_view("words", 400.0).unwrap();
    assert_ne!(a, b);
    scene.step_camera(400.0 + TRANSITION_MS);
    assert!(close(scene.camera.eye, CameraPreset::Words.position()));
}

#[test]
fn unknown_preset_changes_nothing() {
    let mut scene = SceneState::new(800, 600, SEEDS);
    let eye = scene.camera.eye;
    assert!(scene.switch_view("nowhere", 0.0).is_none());
    assert!(scene.auto_rotate);
    assert!(scene.orbit.is_some());
    assert!(!scene.is_transitioning());
    assert_eq!(scene.camera.eye, eye);
}

#[test]
fn toggle_auto_rotate_flips_state() {
    let mut scene = SceneState::new(800, 600, SEEDS);
    assert!(!scene.toggle_auto_rotate());
    assert!(scene.toggle_auto_rotate());
}

#[test]
fn auto_rotate_moves_camera_around_target() {
    let mut scene = SceneState::new(800, 600, SEEDS);
    let start = scene.camera.eye;
    for i in 0..120 {
        scene.step_camera(i as f64 * 16.0);
    }
    let eye = scene.camera.eye;
    assert!(!close(eye, start));
    assert!((eye.length() - start.length()).abs() < 1e-3, "radius is preserved");
}

#[test]
fn orbit_clamps_distance_and_polar_angle() {
    let params = OrbitParams::default();
    let mut orbit = OrbitController::from_eye(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, params);
    for _ in 0..200 {
        orbit.dolly(1.0);
        orbit.update();
    }
    assert!((orbit.radius() - params.max_distance).abs() < 1e-4);
    for _ in 0..200 {
        orbit.dolly(-1.0);
        orbit.update();
    }
    assert!((orbit.radius() - params.min_distance).abs() < 1e-4);

    for _ in 0..200 {
        orbit.rotate_by_pixels(0.0, -500.0, 600.0);
        let eye = orbit.update();
        let phi = (eye.y / eye.length()).acos();
        assert!(phi >= params.min_polar - 1e-4 && phi <= params.max_polar + 1e-4);
    }
}

#[test]
fn orbit_damping_settles() {
    let mut orbit =
        OrbitController::from_eye(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, OrbitParams::default());
    orbit.rotate_by_pixels(100.0, 0.0, 600.0);
    let mut last = orbit.update();
    for _ in 0..600 {
        last = orbit.update();
    }
    let next = orbit.update();
    assert!(last.distance(next) < 1e-4);
}

#[test]
fn camera_forward_points_at_target() {
    let mut cam = Camera::new(Vec3::new(0.0, 0.0, 5.0), 1.0, 45.0, 0.1, 100.0);
    cam.look_at(Vec3::ZERO);
    assert!(close(cam.forward(), Vec3::NEG_Z));
    cam.set_aspect(0, 10);
    assert_eq!(cam.aspect, 1.0);
    cam.set_aspect(1600, 800);
    assert_eq!(cam.aspect, 2.0);
}

#[test]
fn keys_map_to_actions() {
    assert_eq!(action_for_key("Space", false), Some(KeyAction::ToggleAutoRotate));
    assert_eq!(
        action_for_key("KeyV", false),
        Some(KeyAction::SwitchView(CameraPreset::Vision))
    );
    assert_eq!(
        action_for_key("KeyD", false),
        Some(KeyAction::SwitchView(CameraPreset::Defaulting))
    );
    assert_eq!(action_for_key("KeyP", true), Some(KeyAction::TogglePerformance));
    assert_eq!(action_for_key("KeyP", false), None);
    assert_eq!(action_for_key("KeyZ", false), None);
}
