//! Browser-side tuning constants: seeds, panner, lighting and overlay settings.
//!
//! Scene layout and interaction constants live in `core/constants.rs`.

// Random seeds for the generated content
pub const PARTICLE_SEED: u64 = 0x5eed_0001;
pub const WEATHER_SEED: u64 = 0x5eed_0002;
pub const ENVIRONMENT_SEED: u64 = 0x5eed_0003;
pub const NOISE_SEED: u64 = 0x5eed_0004;

// Positional tone panner
pub const PANNER_REF_DISTANCE: f64 = 1.0;
pub const PANNER_ROLLOFF: f64 = 2.0;

// Lighting
pub const HEMI_SKY: [f32; 3] = [1.0, 1.0, 1.0];
pub const HEMI_GROUND: [f32; 3] = [0.266_666_7, 0.266_666_7, 0.266_666_7]; // #444444
pub const HEMI_INTENSITY: f32 = 0.6;
pub const KEY_LIGHT_DIR: [f32; 3] = [5.0, 5.0, 5.0];
pub const KEY_LIGHT_INTENSITY: f32 = 0.8;
pub const FILL_LIGHT_DIR: [f32; 3] = [-5.0, 0.0, -5.0];
pub const FILL_LIGHT_INTENSITY: f32 = 0.2;
pub const TONE_EXPOSURE: f32 = 1.0;

// Trigger marker colour (#00ffff)
pub const MARKER_COLOR: [f32; 3] = [0.0, 1.0, 1.0];
pub const MARKER_SIZE: f32 = 1.4;

// Performance overlay
pub const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];
