//! Browser-independent scene state: camera and its controllers, the effect
//! systems, environment, post chain and audio triggers. The web layer owns
//! one of these and mirrors it onto the GPU and WebAudio each frame.

use super::camera::Camera;
use super::constants::{
    CAMERA_FOVY_DEG, CAMERA_START, CAMERA_ZFAR, CAMERA_ZNEAR, ORBIT_DAMPING, ORBIT_MAX_DISTANCE,
    ORBIT_MIN_DISTANCE, ORBIT_POLAR_SPAN, ORBIT_ZOOM_STEP, ORIGIN, TRANSITION_MS,
};
use super::environment::{EnvironmentManager, MaterialSlot, DEFAULT_ENVIRONMENT};
use super::model::CpuMesh;
use super::orbit::{OrbitController, OrbitParams};
use super::particles::ParticleSystems;
use super::post_plan::PostChain;
use super::presets::CameraPreset;
use super::settings::Settings;
use super::triggers::{default_triggers, TriggerBank};
use super::tween::{TransitionDirector, TransitionToken};
use super::weather::WeatherSystems;
use smallvec::SmallVec;
use std::f32::consts::PI;

pub fn orbit_params() -> OrbitParams {
    OrbitParams {
        damping: ORBIT_DAMPING,
        min_polar: (PI - ORBIT_POLAR_SPAN) / 2.0,
        max_polar: (PI + ORBIT_POLAR_SPAN) / 2.0,
        min_distance: ORBIT_MIN_DISTANCE,
        max_distance: ORBIT_MAX_DISTANCE,
        zoom_step: ORBIT_ZOOM_STEP,
        rotate_speed: 1.0,
    }
}

/// Seeds for the generated content, so a scene is reproducible.
#[derive(Clone, Copy, Debug)]
pub struct SceneSeeds {
    pub particles: u64,
    pub weather: u64,
    pub environment: u64,
}

pub struct SceneState {
    pub camera: Camera,
    /// Torn down while a transition owns the camera.
    pub orbit: Option<OrbitController>,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub director: TransitionDirector,
    pub particles: ParticleSystems,
    pub weather: WeatherSystems,
    pub environment: EnvironmentManager,
    pub materials: Vec<MaterialSlot>,
    pub post: PostChain,
    pub post_enabled: bool,
    pub triggers: TriggerBank,
    pub mesh: Option<CpuMesh>,
    pub background: [f32; 3],
    pub pixel_ratio: f64,
}

impl SceneState {
    pub fn new(width: u32, height: u32, seeds: SceneSeeds) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let mut camera = Camera::new(CAMERA_START, aspect, CAMERA_FOVY_DEG, CAMERA_ZNEAR, CAMERA_ZFAR);
        camera.look_at(ORIGIN);
        let orbit = OrbitController::from_eye(CAMERA_START, ORIGIN, orbit_params());
        let mut environment = EnvironmentManager::new(seeds.environment);
        environment.apply_environment(DEFAULT_ENVIRONMENT, &mut []);
        let background = environment.current().background;
        Self {
            camera,
            orbit: Some(orbit),
            auto_rotate: true,
            auto_rotate_speed: 1.0,
            director: TransitionDirector::new(),
            particles: ParticleSystems::new(seeds.particles),
            weather: WeatherSystems::new(seeds.weather),
            environment,
            materials: Vec::new(),
            post: PostChain::new(width, height),
            post_enabled: true,
            triggers: TriggerBank::new(default_triggers()),
            mesh: None,
            background,
            pixel_ratio: 1.0,
        }
    }

    /// Fly to a named preset. Unknown names are logged and ignored.
    pub fn switch_view(&mut self, name: &str, now_ms: f64) -> Option<TransitionToken> {
        let Some(preset) = CameraPreset::from_name(name) else {
            log::warn!("[camera] unknown camera preset '{name}'");
            return None;
        };
        self.auto_rotate = false;
        self.orbit = None;
        let (token, superseded) =
            self.director
                .begin(self.camera.eye, preset.position(), now_ms, TRANSITION_MS);
        if let Some(old) = superseded {
            log::info!("[camera] transition {:?} superseded by {:?}", old, token);
        }
        Some(token)
    }

    pub fn is_transitioning(&self) -> bool {
        self.director.is_active()
    }

    /// Advance the camera for this frame.
    pub fn step_camera(&mut self, now_ms: f64) {
        if let Some(step) = self.director.sample(now_ms) {
            self.camera.eye = step.position;
            self.camera.look_at(ORIGIN);
            if step.finished {
                self.orbit = Some(OrbitController::from_eye(step.position, ORIGIN, orbit_params()));
            }
            return;
        }
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.auto_rotate = self.auto_rotate;
            orbit.auto_rotate_speed = self.auto_rotate_speed;
            self.camera.eye = orbit.update();
            self.camera.look_at(orbit.target);
        }
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        self.auto_rotate
    }

    pub fn drag(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.rotate_by_pixels(dx, dy, viewport_height);
        }
    }

    pub fn wheel(&mut self, delta_y: f32) {
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.dolly(delta_y);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
        self.post.resize(width, height);
    }

    /// Update time-driven systems and return the triggers that fire.
    pub fn tick(&mut self, now_ms: f64, dt_ms: f32) -> SmallVec<[usize; 4]> {
        self.particles.update(now_ms);
        self.weather.update(now_ms);
        self.post.update_effects(now_ms);
        self.triggers.update(self.camera.eye, dt_ms)
    }

    pub fn apply_environment(&mut self, name: &str) -> bool {
        if !self.environment.apply_environment(name, &mut self.materials) {
            log::warn!("[environment] unknown environment '{name}'");
            return false;
        }
        self.background = self.environment.current().background;
        true
    }

    pub fn set_mesh(&mut self, mesh: CpuMesh) {
        let env = Some(self.environment.current_index());
        self.materials = vec![
            MaterialSlot {
                env_map: env,
                needs_update: true,
            };
            mesh.material_count
        ];
        self.mesh = Some(mesh);
    }

    pub fn triangle_count(&self) -> u64 {
        self.mesh.as_ref().map_or(0, CpuMesh::triangle_count)
    }

    /// Push every field of `settings` into the scene.
    pub fn apply_settings(&mut self, settings: &Settings, device_pixel_ratio: f64) {
        self.pixel_ratio = settings.render_quality.pixel_ratio(device_pixel_ratio);
        self.particles.set_all_intensity(settings.particle_intensity);
        self.apply_environment(&settings.environment_lighting);
        self.auto_rotate_speed = settings.auto_rotate_speed;
        self.post_enabled = settings.post_processing;
        self.weather.set_weather(&settings.weather);
    }
}
