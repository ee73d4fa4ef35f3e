//! Post-processing chain description.
//!
//! The GPU side (`render/post.rs`) owns pipelines and targets; this module
//! decides which passes exist, in what order, and which ping-pong target each
//! one reads and writes. Toggling an effect bumps `generation` and the
//! renderer rebuilds every pass and both targets when it sees the change.

use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostEffect {
    Bloom,
    Vignette,
    FilmGrain,
    ChromaticAberration,
}

impl PostEffect {
    /// Chain order.
    pub const ALL: [PostEffect; 4] = [
        PostEffect::Bloom,
        PostEffect::Vignette,
        PostEffect::FilmGrain,
        PostEffect::ChromaticAberration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PostEffect::Bloom => "bloom",
            PostEffect::Vignette => "vignette",
            PostEffect::FilmGrain => "filmGrain",
            PostEffect::ChromaticAberration => "chromaticAberration",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }
}

/// Effect strengths exposed as panel sliders. Sliders run 0..=`slider_max`
/// in whole steps and map linearly onto the uniform value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectParam {
    BloomStrength,
    VignetteIntensity,
    ChromaticAmount,
}

impl EffectParam {
    pub const ALL: [EffectParam; 3] = [
        EffectParam::BloomStrength,
        EffectParam::VignetteIntensity,
        EffectParam::ChromaticAmount,
    ];

    pub fn element_id(self) -> &'static str {
        match self {
            EffectParam::BloomStrength => "bloom-strength",
            EffectParam::VignetteIntensity => "vignette-intensity",
            EffectParam::ChromaticAmount => "chromatic-amount",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectParam::BloomStrength => "Bloom Strength",
            EffectParam::VignetteIntensity => "Vignette Intensity",
            EffectParam::ChromaticAmount => "Chromatic Aberration",
        }
    }

    fn scale(self) -> f32 {
        match self {
            EffectParam::BloomStrength | EffectParam::VignetteIntensity => 0.01,
            EffectParam::ChromaticAmount => 0.001,
        }
    }

    pub fn slider_max(self) -> u32 {
        match self {
            EffectParam::BloomStrength => 300,
            EffectParam::VignetteIntensity => 100,
            EffectParam::ChromaticAmount => 20,
        }
    }

    /// Clamped to the slider's range.
    pub fn from_slider(self, slider: f32) -> f32 {
        slider.clamp(0.0, self.slider_max() as f32) * self.scale()
    }

    pub fn to_slider(self, value: f32) -> u32 {
        ((value / self.scale()).round().max(0.0) as u32).min(self.slider_max())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectFlags {
    pub bloom: bool,
    pub vignette: bool,
    pub film_grain: bool,
    pub chromatic_aberration: bool,
}

impl EffectFlags {
    pub fn get(&self, effect: PostEffect) -> bool {
        match effect {
            PostEffect::Bloom => self.bloom,
            PostEffect::Vignette => self.vignette,
            PostEffect::FilmGrain => self.film_grain,
            PostEffect::ChromaticAberration => self.chromatic_aberration,
        }
    }

    pub fn set(&mut self, effect: PostEffect, enabled: bool) {
        match effect {
            PostEffect::Bloom => self.bloom = enabled,
            PostEffect::Vignette => self.vignette = enabled,
            PostEffect::FilmGrain => self.film_grain = enabled,
            PostEffect::ChromaticAberration => self.chromatic_aberration = enabled,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    Scene,
    Effect(PostEffect),
    Copy,
}

impl PassKind {
    /// Fragment entry point in `post.wgsl`; the scene pass has none.
    pub fn fragment_entry(self) -> Option<&'static str> {
        match self {
            PassKind::Scene => None,
            PassKind::Effect(PostEffect::Bloom) => Some("fs_bloom"),
            PassKind::Effect(PostEffect::Vignette) => Some("fs_vignette"),
            PassKind::Effect(PostEffect::FilmGrain) => Some("fs_film_grain"),
            PassKind::Effect(PostEffect::ChromaticAberration) => Some("fs_chromatic"),
            PassKind::Copy => Some("fs_copy"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PassKind::Scene => "scene",
            PassKind::Effect(e) => e.name(),
            PassKind::Copy => "copy",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassSpec {
    pub kind: PassKind,
    pub needs_swap: bool,
}

pub type PassList = SmallVec<[PassSpec; 6]>;

/// Scene, then the enabled effects in chain order, then the copy to screen.
pub fn build_passes(flags: &EffectFlags) -> PassList {
    let mut passes = PassList::new();
    passes.push(PassSpec {
        kind: PassKind::Scene,
        needs_swap: true,
    });
    for effect in PostEffect::ALL {
        if flags.get(effect) {
            passes.push(PassSpec {
                kind: PassKind::Effect(effect),
                needs_swap: true,
            });
        }
    }
    passes.push(PassSpec {
        kind: PassKind::Copy,
        needs_swap: false,
    });
    passes
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    A,
    B,
    Screen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledPass {
    pub kind: PassKind,
    /// `None` for the scene pass, which samples nothing.
    pub read: Option<Target>,
    pub write: Target,
}

/// Resolve read/write targets. Writing starts at A reading B; a pass that
/// declares `needs_swap` swaps them afterwards; the last pass writes to the
/// screen.
pub fn schedule(passes: &[PassSpec]) -> SmallVec<[ScheduledPass; 6]> {
    let mut out = SmallVec::new();
    let mut read = Target::B;
    let mut write = Target::A;
    for (i, pass) in passes.iter().enumerate() {
        let last = i + 1 == passes.len();
        let source = match pass.kind {
            PassKind::Scene => None,
            _ => Some(read),
        };
        out.push(ScheduledPass {
            kind: pass.kind,
            read: source,
            write: if last { Target::Screen } else { write },
        });
        if !last && pass.needs_swap {
            std::mem::swap(&mut read, &mut write);
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostParams {
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    pub grain_noise: f32,
    pub grain_scanline: f32,
    pub grain_count: f32,
    pub chromatic_amount: f32,
}

impl Default for PostParams {
    fn default() -> Self {
        Self {
            bloom_strength: 0.3,
            bloom_radius: 0.8,
            bloom_threshold: 0.8,
            vignette_offset: 0.95,
            vignette_darkness: 0.3,
            grain_noise: 0.1,
            grain_scanline: 0.05,
            grain_count: 1024.0,
            chromatic_amount: 0.005,
        }
    }
}

/// Uniform block shared by every post pass; layout matches `PostUniforms` in
/// `post.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PostUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    pub grain_noise: f32,
    pub grain_scanline: f32,
    pub grain_count: f32,
    pub chromatic_amount: f32,
}

#[derive(Clone, Debug)]
pub struct PostChain {
    pub flags: EffectFlags,
    pub params: PostParams,
    passes: PassList,
    time_s: f32,
    width: u32,
    height: u32,
    generation: u64,
}

impl PostChain {
    pub fn new(width: u32, height: u32) -> Self {
        let flags = EffectFlags::default();
        Self {
            passes: build_passes(&flags),
            flags,
            params: PostParams::default(),
            time_s: 0.0,
            width: width.max(1),
            height: height.max(1),
            generation: 0,
        }
    }

    pub fn passes(&self) -> &[PassSpec] {
        &self.passes
    }

    pub fn schedule(&self) -> SmallVec<[ScheduledPass; 6]> {
        schedule(&self.passes)
    }

    /// Bumped on every rebuild; the renderer compares it to its own copy.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Unknown names are ignored and return false.
    pub fn toggle_effect(&mut self, name: &str, enabled: bool) -> bool {
        let Some(effect) = PostEffect::from_name(name) else {
            log::warn!("[post] unknown effect '{name}'");
            return false;
        };
        self.flags.set(effect, enabled);
        self.rebuild_pipeline();
        true
    }

    /// Discard and recreate every pass. Pass parameters survive the rebuild.
    pub fn rebuild_pipeline(&mut self) {
        self.passes = build_passes(&self.flags);
        self.generation += 1;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn update_effects(&mut self, time_ms: f64) {
        if self.flags.film_grain {
            self.time_s = (time_ms * 0.001) as f32;
        }
    }

    pub fn set_bloom_strength(&mut self, value: f32) {
        self.params.bloom_strength = value;
    }

    pub fn set_vignette_intensity(&mut self, value: f32) {
        self.params.vignette_darkness = value;
    }

    pub fn set_chromatic_aberration_amount(&mut self, value: f32) {
        self.params.chromatic_amount = value;
    }

    pub fn set_param(&mut self, param: EffectParam, value: f32) {
        match param {
            EffectParam::BloomStrength => self.set_bloom_strength(value),
            EffectParam::VignetteIntensity => self.set_vignette_intensity(value),
            EffectParam::ChromaticAmount => self.set_chromatic_aberration_amount(value),
        }
    }

    pub fn param(&self, param: EffectParam) -> f32 {
        match param {
            EffectParam::BloomStrength => self.params.bloom_strength,
            EffectParam::VignetteIntensity => self.params.vignette_darkness,
            EffectParam::ChromaticAmount => self.params.chromatic_amount,
        }
    }

    pub fn uniforms(&self) -> PostUniforms {
        let p = &self.params;
        PostUniforms {
            resolution: [self.width as f32, self.height as f32],
            time: self.time_s,
            bloom_strength: p.bloom_strength,
            bloom_radius: p.bloom_radius,
            bloom_threshold: p.bloom_threshold,
            vignette_offset: p.vignette_offset,
            vignette_darkness: p.vignette_darkness,
            grain_noise: p.grain_noise,
            grain_scanline: p.grain_scanline,
            grain_count: p.grain_count,
            chromatic_amount: p.chromatic_amount,
        }
    }
}
