use glam::Vec3;

// Shared scene/audio tuning constants used by the web frontend.

// Scene layout
pub const MODEL_OFFSET: Vec3 = Vec3::new(0.0, -1.2, 0.0); // world-space placement of the head
pub const MODEL_URL: &str = "faceSculpting.glb";
pub const ORIGIN: Vec3 = Vec3::ZERO; // every camera look-at aims here

// Camera
pub const CAMERA_FOVY_DEG: f32 = 45.0;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 10_000.0;
pub const CAMERA_START: Vec3 = Vec3::new(0.0, 0.0, 5.0);
pub const TRANSITION_MS: f64 = 2000.0;

// Orbit controller
pub const ORBIT_DAMPING: f32 = 0.05;
pub const ORBIT_POLAR_SPAN: f32 = 0.7; // allowed swing around the horizon (radians)
pub const ORBIT_MIN_DISTANCE: f32 = 1.0;
pub const ORBIT_MAX_DISTANCE: f32 = 10.0;
pub const ORBIT_ZOOM_STEP: f32 = 0.95;

// Audio triggers
pub const TRIGGER_RADIUS: f32 = 2.0;
pub const TRIGGER_COOLDOWN_MS: f32 = 3000.0;
pub const TRIGGER_OPACITY_ACTIVE: f32 = 0.8;
pub const TRIGGER_OPACITY_IDLE: f32 = 0.3;
pub const TRIGGER_SPIN_PER_MS: f32 = 0.001;
pub const TONE_GAIN: f32 = 0.1;

// Timed DOM feedback
pub const NOTIFICATION_MS: i32 = 3000;
pub const ERROR_BANNER_MS: i32 = 5000;
pub const SETTINGS_LOAD_DELAY_MS: i32 = 100;
