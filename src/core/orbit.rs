//! Orbit camera controller: spherical coordinates around a target with
//! damping, auto-rotation and clamped polar angle / distance.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

#[derive(Clone, Copy, Debug)]
pub struct OrbitParams {
    pub damping: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub zoom_step: f32,
    pub rotate_speed: f32,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            damping: 0.05,
            min_polar: (PI - 0.7) / 2.0,
            max_polar: (PI + 0.7) / 2.0,
            min_distance: 1.0,
            max_distance: 10.0,
            zoom_step: 0.95,
            rotate_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OrbitController {
    pub target: Vec3,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    params: OrbitParams,
    radius: f32,
    // azimuth around +Y, measured from +Z towards +X
    theta: f32,
    // polar angle from +Y
    phi: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitController {
    /// Build a controller whose current eye position is `eye`.
    pub fn from_eye(eye: Vec3, target: Vec3, params: OrbitParams) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(1e-4);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        Self {
            target,
            auto_rotate: false,
            auto_rotate_speed: 1.0,
            params,
            radius,
            theta,
            phi,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn eye(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    /// Pointer drag in CSS pixels, normalised by the viewport height.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.delta_theta -= TAU * dx / h * self.params.rotate_speed;
        self.delta_phi -= TAU * dy / h * self.params.rotate_speed;
    }

    /// Wheel input: positive `delta_y` zooms out, negative zooms in.
    pub fn dolly(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.scale /= self.params.zoom_step;
        } else if delta_y < 0.0 {
            self.scale *= self.params.zoom_step;
        }
    }

    /// Advance one frame and return the new eye position.
    pub fn update(&mut self) -> Vec3 {
        if self.auto_rotate {
            // one revolution per minute at 60 fps when speed is 1.0
            self.delta_theta -= TAU / 60.0 / 60.0 * self.auto_rotate_speed;
        }
        let d = self.params.damping;
        self.theta += self.delta_theta * d;
        self.phi += self.delta_phi * d;
        self.phi = self
            .phi
            .clamp(self.params.min_polar, self.params.max_polar)
            .clamp(1e-6, PI - 1e-6);
        self.radius = (self.radius * self.scale)
            .clamp(self.params.min_distance, self.params.max_distance);
        self.delta_theta *= 1.0 - d;
        self.delta_phi *= 1.0 - d;
        self.scale = 1.0;
        self.eye()
    }
}
