//! Procedural particle effects around the head.
//!
//! Instance data is generated once from a seeded RNG and uploaded as a vertex
//! buffer. Per frame only a handful of uniforms change (elapsed time and the
//! effective intensity); the vertex shader derives positions from the baked
//! origin/velocity. [`simulate`] is the CPU mirror of that shader code.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};

pub const FLOATING_COUNT: usize = 150;
pub const ORB_COUNT: usize = 8;
pub const ENERGY_COUNT: usize = 100;
pub const DUST_COUNT: usize = 200;
pub const RAIN_COUNT: usize = 1000;
pub const SNOW_COUNT: usize = 500;
pub const MIST_COUNT: usize = 50;

// Vertical wrap ranges, [low, high).
pub const DUST_WRAP: (f32, f32) = (-10.0, 10.0);
pub const PRECIPITATION_WRAP: (f32, f32) = (-5.0, 15.0);
pub const MIST_WRAP: (f32, f32) = (-2.0, 8.0);

pub const SPRITE_SIZE: u32 = 64;

/// Every effect the renderer knows how to draw. The discriminant is passed to
/// the shader as `params.z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EffectKind {
    FloatingParticles = 0,
    MysticalOrbs = 1,
    EnergyField = 2,
    AmbientDust = 3,
    Rain = 4,
    Snow = 5,
    Mist = 6,
    TriggerMarker = 7,
}

impl EffectKind {
    pub const PARTICLES: [EffectKind; 4] = [
        EffectKind::FloatingParticles,
        EffectKind::MysticalOrbs,
        EffectKind::EnergyField,
        EffectKind::AmbientDust,
    ];
    pub const WEATHER: [EffectKind; 3] = [EffectKind::Rain, EffectKind::Snow, EffectKind::Mist];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::FloatingParticles => "floatingParticles",
            EffectKind::MysticalOrbs => "mysticalOrbs",
            EffectKind::EnergyField => "energyField",
            EffectKind::AmbientDust => "ambientDust",
            EffectKind::Rain => "rain",
            EffectKind::Snow => "snow",
            EffectKind::Mist => "mist",
            EffectKind::TriggerMarker => "triggerMarker",
        }
    }

    pub fn particle_from_name(name: &str) -> Option<Self> {
        Self::PARTICLES.into_iter().find(|k| k.name() == name)
    }

    pub fn weather_from_name(name: &str) -> Option<Self> {
        Self::WEATHER.into_iter().find(|k| k.name() == name)
    }

    /// Additive blending for the glowing effects, regular alpha otherwise.
    pub fn additive(self) -> bool {
        matches!(
            self,
            EffectKind::FloatingParticles | EffectKind::EnergyField | EffectKind::MysticalOrbs
        )
    }
}

/// Per-instance vertex data shared by every effect.
///
/// `seed` is interpreted per kind: life for dust, phase for orbs, spin for
/// mist, ring phase for trigger markers.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub origin: [f32; 3],
    pub size: f32,
    pub velocity: [f32; 3],
    pub seed: f32,
    pub color: [f32; 4],
}

#[derive(Clone, Debug)]
pub struct EffectSystem {
    pub kind: EffectKind,
    pub instances: Vec<ParticleInstance>,
    pub visible: bool,
    /// User-facing scale; 1.0 is the authored look.
    pub intensity: f32,
    pub time_s: f32,
}

impl EffectSystem {
    pub fn new(kind: EffectKind, instances: Vec<ParticleInstance>, visible: bool) -> Self {
        Self {
            kind,
            instances,
            visible,
            intensity: 1.0,
            time_s: 0.0,
        }
    }

    /// Intensity actually written to the uniform for this frame.
    pub fn effective_intensity(&self) -> f32 {
        match self.kind {
            // pulse around 0.3 scaled by the user's setting
            EffectKind::EnergyField => (0.3 + (self.time_s * 2.0).sin() * 0.2) * self.intensity,
            _ => self.intensity,
        }
    }

    pub fn set_intensity(&mut self, value: f32) {
        self.visible = value > 0.0;
        self.intensity = value;
    }

    /// Uniform vector `(time, intensity, kind, 0)`.
    pub fn params(&self) -> [f32; 4] {
        [
            self.time_s,
            self.effective_intensity(),
            self.kind as u32 as f32,
            0.0,
        ]
    }
}

fn random_on_shell(rng: &mut StdRng, r_min: f32, r_span: f32) -> Vec3 {
    let radius = r_min + rng.gen::<f32>() * r_span;
    let theta = rng.gen::<f32>() * TAU;
    let phi = rng.gen::<f32>() * PI;
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

#[inline]
fn centred(rng: &mut StdRng, span: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * span
}

pub fn floating_particles(rng: &mut StdRng) -> Vec<ParticleInstance> {
    (0..FLOATING_COUNT)
        .map(|_| {
            let p = random_on_shell(rng, 8.0, 12.0);
            ParticleInstance {
                origin: p.to_array(),
                size: (2.0 + rng.gen::<f32>() * 3.0) * 0.04,
                velocity: [
                    centred(rng, 0.02),
                    centred(rng, 0.02),
                    centred(rng, 0.02),
                ],
                seed: 0.0,
                color: [0.8 + rng.gen::<f32>() * 0.2, 0.9 + rng.gen::<f32>() * 0.1, 1.0, 1.0],
            }
        })
        .collect()
}

pub fn mystical_orbs(rng: &mut StdRng) -> Vec<ParticleInstance> {
    (0..ORB_COUNT)
        .map(|i| {
            let angle = i as f32 / ORB_COUNT as f32 * TAU;
            let speed = 0.5 + rng.gen::<f32>() * 0.5;
            ParticleInstance {
                origin: [angle.cos() * 6.0, (angle * 2.0).sin() * 3.0, angle.sin() * 6.0],
                size: 0.2,
                // x carries the angular speed; the orbit is computed in the shader
                velocity: [speed, 0.0, 0.0],
                seed: angle,
                color: hsl_to_rgba(i as f32 / ORB_COUNT as f32, 0.8, 0.6, 0.7),
            }
        })
        .collect()
}

pub fn energy_field(rng: &mut StdRng) -> Vec<ParticleInstance> {
    (0..ENERGY_COUNT)
        .map(|_| {
            let p = random_on_shell(rng, 3.0, 2.0);
            ParticleInstance {
                origin: p.to_array(),
                size: 0.08,
                velocity: [0.0; 3],
                seed: 0.0,
                color: [0.0, 0.5 + rng.gen::<f32>() * 0.5, 1.0, 1.0],
            }
        })
        .collect()
}

pub fn ambient_dust(rng: &mut StdRng) -> Vec<ParticleInstance> {
    (0..DUST_COUNT)
        .map(|_| {
            let origin = [centred(rng, 30.0), centred(rng, 20.0), centred(rng, 30.0)];
            let velocity = [centred(rng, 0.01), rng.gen::<f32>() * 0.02, centred(rng, 0.01)];
            let life = rng.gen::<f32>();
            ParticleInstance {
                origin,
                size: 0.02 * (1.0 + life * 2.0),
                velocity,
                seed: life,
                color: [1.0, 1.0, 1.0, life * 0.3],
            }
        })
        .collect()
}

pub fn rain(rng: &mut StdRng) -> Vec<ParticleInstance> {
    (0..RAIN_COUNT)
        .map(|_| ParticleInstance {
            origin: [centred(rng, 40.0), rng.gen::<f32>() * 20.0 + 10.0, centred(rng, 40.0)],
            size: 0.04,
            velocity: [0.0, -0.5 - rng.gen::<f32>() * 0.3, 0.0],
            seed: 0.0,
            color: [0.7, 0.8, 1.0, 0.6],
        })
        .collect()
}

pub fn snow(rng: &mut StdRng) -> Vec<ParticleInstance> {
    (0..SNOW_COUNT)
        .map(|_| ParticleInstance {
            origin: [centred(rng, 40.0), rng.gen::<f32>() * 20.0 + 10.0, centred(rng, 40.0)],
            size: 0.06,
            velocity: [centred(rng, 0.02), -0.1 - rng.gen::<f32>() * 0.1, centred(rng, 0.02)],
            seed: 0.0,
            color: [1.0, 1.0, 1.0, 0.8],
        })
        .collect()
}

pub fn mist(rng: &mut StdRng) -> Vec<ParticleInstance> {
    (0..MIST_COUNT)
        .map(|_| {
            // rise rate authored per 60 Hz frame
            let rise = (0.001 + rng.gen::<f32>() * 0.002) * 60.0;
            let spin = centred(rng, 0.01) * 60.0;
            ParticleInstance {
                origin: [centred(rng, 20.0), rng.gen::<f32>() * 5.0, centred(rng, 20.0)],
                size: 2.0,
                velocity: [0.0, rise, 0.0],
                seed: spin,
                color: [1.0, 1.0, 1.0, 0.1],
            }
        })
        .collect()
}

/// Wrap `v` into `[low, high)`.
#[inline]
pub fn wrap_range(v: f32, low: f32, high: f32) -> f32 {
    let span = high - low;
    if span <= 0.0 {
        return low;
    }
    low + (v - low).rem_euclid(span)
}

/// CPU reference of the vertex shader's position logic, in world units.
pub fn simulate(kind: EffectKind, p: &ParticleInstance, time_s: f32) -> Vec3 {
    let origin = Vec3::from(p.origin);
    let velocity = Vec3::from(p.velocity);
    match kind {
        EffectKind::FloatingParticles => {
            let mut pos = origin + velocity * time_s;
            let angle = time_s * 0.1 + origin.length() * 0.1;
            pos.x += angle.sin() * 0.5;
            pos.z += angle.cos() * 0.5;
            pos
        }
        EffectKind::MysticalOrbs => {
            let elapsed = time_s * p.velocity[0];
            let angle = p.seed + elapsed;
            let radius = 6.0 + (elapsed * 2.0).sin();
            Vec3::new(angle.cos() * radius, (angle * 3.0).sin() * 2.0, angle.sin() * radius)
        }
        EffectKind::EnergyField => {
            let n = origin.normalize_or_zero();
            origin + n * (time_s * 3.0 + origin.x * 10.0).sin() * 0.1
        }
        EffectKind::AmbientDust => {
            let mut pos = origin + velocity * time_s;
            pos.y = wrap_range(pos.y, DUST_WRAP.0, DUST_WRAP.1);
            pos
        }
        EffectKind::Rain => {
            let mut pos = origin + velocity * time_s;
            pos.y = wrap_range(pos.y, PRECIPITATION_WRAP.0, PRECIPITATION_WRAP.1);
            pos
        }
        EffectKind::Snow => {
            let mut pos = origin + velocity * time_s;
            pos.x += (time_s + origin.y).sin() * 0.5;
            pos.y = wrap_range(pos.y, PRECIPITATION_WRAP.0, PRECIPITATION_WRAP.1);
            pos
        }
        EffectKind::Mist => {
            let mut pos = origin + velocity * time_s;
            pos.y = wrap_range(pos.y, MIST_WRAP.0, MIST_WRAP.1);
            pos
        }
        EffectKind::TriggerMarker => origin,
    }
}

pub fn hsl_to_rgba(h: f32, s: f32, l: f32, a: f32) -> [f32; 4] {
    let h = h.rem_euclid(1.0);
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0), a]
}

/// Soft white radial sprite: alpha 1 at the centre, 0.5 at half radius, 0 at
/// the edge. Returns tightly packed RGBA8.
pub fn radial_sprite(size: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((size * size * 4) as usize);
    let c = size as f32 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - c;
            let dy = y as f32 + 0.5 - c;
            let t = ((dx * dx + dy * dy).sqrt() / c).min(1.0);
            // the 1 → 0.5 → 0 gradient stops are collinear
            let alpha = 1.0 - t;
            out.extend_from_slice(&[255, 255, 255, (alpha * 255.0).round() as u8]);
        }
    }
    out
}

/// The four ambient particle systems.
pub struct ParticleSystems {
    pub systems: Vec<EffectSystem>,
}

impl ParticleSystems {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let systems = vec![
            EffectSystem::new(EffectKind::FloatingParticles, floating_particles(&mut rng), true),
            EffectSystem::new(EffectKind::MysticalOrbs, mystical_orbs(&mut rng), true),
            EffectSystem::new(EffectKind::EnergyField, energy_field(&mut rng), true),
            EffectSystem::new(EffectKind::AmbientDust, ambient_dust(&mut rng), true),
        ];
        Self { systems }
    }

    pub fn get(&self, name: &str) -> Option<&EffectSystem> {
        let kind = EffectKind::particle_from_name(name)?;
        self.systems.iter().find(|s| s.kind == kind)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut EffectSystem> {
        let kind = EffectKind::particle_from_name(name)?;
        self.systems.iter_mut().find(|s| s.kind == kind)
    }

    /// Returns false for unknown system names.
    pub fn set_intensity(&mut self, name: &str, value: f32) -> bool {
        match self.get_mut(name) {
            Some(s) => {
                s.set_intensity(value);
                true
            }
            None => false,
        }
    }

    /// Apply one slider value to every system.
    pub fn set_all_intensity(&mut self, value: f32) {
        for s in &mut self.systems {
            s.set_intensity(value);
        }
    }

    pub fn toggle_system(&mut self, name: &str, enabled: bool) -> bool {
        match self.get_mut(name) {
            Some(s) => {
                s.visible = enabled;
                true
            }
            None => false,
        }
    }

    /// `time_ms` is the animation clock in milliseconds.
    pub fn update(&mut self, time_ms: f64) {
        let t = (time_ms * 0.001) as f32;
        for s in &mut self.systems {
            s.time_s = t;
        }
    }

    pub fn available_systems(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.kind.name()).collect()
    }
}
