use super::particles::{mist, rain, snow, EffectKind, EffectSystem};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const CLEAR: &str = "clear";

/// Mutually exclusive weather overlays. At most one is visible.
pub struct WeatherSystems {
    pub effects: Vec<EffectSystem>,
    current: &'static str,
}

impl WeatherSystems {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let effects = vec![
            EffectSystem::new(EffectKind::Rain, rain(&mut rng), false),
            EffectSystem::new(EffectKind::Snow, snow(&mut rng), false),
            EffectSystem::new(EffectKind::Mist, mist(&mut rng), false),
        ];
        Self {
            effects,
            current: CLEAR,
        }
    }

    /// Hide every overlay, then show `name` if it is a known effect. Anything
    /// else (including "clear") leaves the sky clear.
    pub fn set_weather(&mut self, name: &str) {
        for e in &mut self.effects {
            e.visible = false;
        }
        self.current = CLEAR;
        if let Some(kind) = EffectKind::weather_from_name(name) {
            if let Some(e) = self.effects.iter_mut().find(|e| e.kind == kind) {
                e.visible = true;
                self.current = kind.name();
            }
        } else if name != CLEAR {
            log::warn!("[weather] unknown weather '{name}'");
        }
    }

    pub fn current_weather(&self) -> &'static str {
        self.current
    }

    /// Only visible overlays advance their clock.
    pub fn update(&mut self, time_ms: f64) {
        let t = (time_ms * 0.001) as f32;
        for e in self.effects.iter_mut().filter(|e| e.visible) {
            e.time_s = t;
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = &EffectSystem> {
        self.effects.iter().filter(|e| e.visible)
    }

    pub fn available_weather(&self) -> Vec<&'static str> {
        std::iter::once(CLEAR)
            .chain(self.effects.iter().map(|e| e.kind.name()))
            .collect()
    }
}
