use super::ambience::Waveform;
use super::constants::{
    TRIGGER_COOLDOWN_MS, TRIGGER_OPACITY_ACTIVE, TRIGGER_OPACITY_IDLE, TRIGGER_RADIUS,
    TRIGGER_SPIN_PER_MS,
};
use glam::Vec3;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneConfig {
    pub frequency: f32,
    pub waveform: Waveform,
    pub duration_ms: u32,
}

/// A point in space that plays a tone when the camera comes close.
#[derive(Clone, Debug)]
pub struct AudioTrigger {
    pub position: Vec3,
    pub tone: ToneConfig,
    pub active: bool,
    pub cooldown_ms: f32,
    /// Marker state, read by the renderer.
    pub opacity: f32,
    pub spin: f32,
}

impl AudioTrigger {
    pub fn new(position: Vec3, tone: ToneConfig) -> Self {
        Self {
            position,
            tone,
            active: false,
            cooldown_ms: 0.0,
            opacity: TRIGGER_OPACITY_IDLE,
            spin: 0.0,
        }
    }
}

pub fn default_triggers() -> Vec<AudioTrigger> {
    let t = |x, y, z, frequency, waveform, duration_ms| {
        AudioTrigger::new(
            Vec3::new(x, y, z),
            ToneConfig {
                frequency,
                waveform,
                duration_ms,
            },
        )
    };
    vec![
        t(-2.0, 1.0, 0.0, 220.0, Waveform::Sine, 3000),
        t(2.0, 1.0, 0.0, 330.0, Waveform::Triangle, 3000),
        t(0.0, 2.0, 1.0, 440.0, Waveform::Sawtooth, 2000),
        t(0.0, -1.0, 2.0, 165.0, Waveform::Sine, 4000),
    ]
}

#[derive(Clone, Debug, Default)]
pub struct TriggerBank {
    pub triggers: Vec<AudioTrigger>,
}

impl TriggerBank {
    pub fn new(triggers: Vec<AudioTrigger>) -> Self {
        Self { triggers }
    }

    /// Advance cooldowns by `dt_ms` and return the indices that fire this
    /// frame. A trigger is armed while the camera is within range and its
    /// cooldown has run out; it fires on the frame it becomes armed.
    pub fn update(&mut self, camera: Vec3, dt_ms: f32) -> SmallVec<[usize; 4]> {
        let mut fired = SmallVec::new();
        for (i, t) in self.triggers.iter_mut().enumerate() {
            if t.cooldown_ms > 0.0 {
                t.cooldown_ms -= dt_ms;
            }
            let armed = camera.distance(t.position) < TRIGGER_RADIUS && t.cooldown_ms <= 0.0;
            if armed && !t.active {
                t.active = true;
                t.cooldown_ms = TRIGGER_COOLDOWN_MS;
                fired.push(i);
            } else if !armed && t.active {
                t.active = false;
            }
            t.opacity = if armed {
                TRIGGER_OPACITY_ACTIVE
            } else {
                TRIGGER_OPACITY_IDLE
            };
            t.spin += dt_ms * TRIGGER_SPIN_PER_MS;
        }
        fired
    }
}
