//! Procedural sky presets: background colour, fog and a 512×512 equirect
//! reflection texture generated on the CPU.

use super::settings::hex_to_rgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const ENV_TEXTURE_SIZE: u32 = 512;
pub const DEFAULT_ENVIRONMENT: &str = "studio";
const STAR_COUNT: usize = 100;
const GRID_SPACING: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fog {
    None,
    Linear { color: [f32; 3], near: f32, far: f32 },
    Exp2 { color: [f32; 3], density: f32 },
}

impl Fog {
    /// Packed as two uniform vectors: `(r, g, b, mode)` and `(near, far, density, 0)`.
    pub fn uniform(&self) -> [[f32; 4]; 2] {
        match *self {
            Fog::None => [[0.0; 4], [0.0; 4]],
            Fog::Linear { color, near, far } => {
                [[color[0], color[1], color[2], 1.0], [near, far, 0.0, 0.0]]
            }
            Fog::Exp2 { color, density } => {
                [[color[0], color[1], color[2], 2.0], [0.0, 0.0, density, 0.0]]
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnvironmentPreset {
    pub name: &'static str,
    pub background: [f32; 3],
    pub fog: Fog,
    /// RGBA8, `ENV_TEXTURE_SIZE` square.
    pub pixels: Vec<u8>,
}

/// Per-material environment binding, flagged when the renderer must rebind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterialSlot {
    pub env_map: Option<usize>,
    pub needs_update: bool,
}

fn lerp_rgb(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Sample evenly spaced gradient stops at `t ∈ [0, 1]`.
pub fn gradient_at(stops: &[u32], t: f32) -> [f32; 3] {
    match stops.len() {
        0 => [0.0; 3],
        1 => hex_to_rgb(stops[0]),
        n => {
            let scaled = t.clamp(0.0, 1.0) * (n - 1) as f32;
            let i = (scaled.floor() as usize).min(n - 2);
            lerp_rgb(hex_to_rgb(stops[i]), hex_to_rgb(stops[i + 1]), scaled - i as f32)
        }
    }
}

#[inline]
fn to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn put(pixels: &mut [u8], size: u32, x: u32, y: u32, rgb: [f32; 3]) {
    let i = ((y * size + x) * 4) as usize;
    pixels[i] = to_u8(rgb[0]);
    pixels[i + 1] = to_u8(rgb[1]);
    pixels[i + 2] = to_u8(rgb[2]);
    pixels[i + 3] = 255;
}

/// Top-to-bottom linear gradient.
pub fn vertical_gradient(size: u32, stops: &[u32]) -> Vec<u8> {
    let mut px = vec![0u8; (size * size * 4) as usize];
    for y in 0..size {
        let rgb = gradient_at(stops, (y as f32 + 0.5) / size as f32);
        for x in 0..size {
            put(&mut px, size, x, y, rgb);
        }
    }
    px
}

pub fn radial_gradient(size: u32, stops: &[u32], cx: f32, cy: f32, radius: f32) -> Vec<u8> {
    let mut px = vec![0u8; (size * size * 4) as usize];
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let t = (dx * dx + dy * dy).sqrt() / radius.max(1e-3);
            put(&mut px, size, x, y, gradient_at(stops, t));
        }
    }
    px
}

/// White discs scattered over the top half.
pub fn scatter_stars(pixels: &mut [u8], size: u32, count: usize, rng: &mut StdRng) {
    for _ in 0..count {
        let sx = rng.gen::<f32>() * size as f32;
        let sy = rng.gen::<f32>() * (size / 2) as f32;
        let r = rng.gen::<f32>() * 2.0;
        let x0 = (sx - r).floor().max(0.0) as u32;
        let y0 = (sy - r).floor().max(0.0) as u32;
        let x1 = ((sx + r).ceil() as u32).min(size - 1);
        let y1 = ((sy + r).ceil() as u32).min(size - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - sx;
                let dy = y as f32 + 0.5 - sy;
                if dx * dx + dy * dy <= r * r {
                    put(pixels, size, x, y, [1.0, 1.0, 1.0]);
                }
            }
        }
    }
}

/// Two-pixel lines centred on every multiple of `spacing`, both axes.
pub fn draw_grid(pixels: &mut [u8], size: u32, spacing: u32, rgb: [f32; 3]) {
    let on_line = |v: u32| {
        let m = v % spacing;
        m == 0 || m == spacing - 1
    };
    for y in 0..size {
        for x in 0..size {
            if on_line(x) || on_line(y) {
                put(pixels, size, x, y, rgb);
            }
        }
    }
}

pub fn studio() -> EnvironmentPreset {
    EnvironmentPreset {
        name: "studio",
        background: hex_to_rgb(0xf0f0f0),
        fog: Fog::None,
        pixels: vertical_gradient(ENV_TEXTURE_SIZE, &[0xffffff, 0xcccccc]),
    }
}

pub fn sunset() -> EnvironmentPreset {
    EnvironmentPreset {
        name: "sunset",
        background: hex_to_rgb(0xff6b35),
        fog: Fog::Linear {
            color: hex_to_rgb(0xff6b35),
            near: 10.0,
            far: 50.0,
        },
        pixels: vertical_gradient(ENV_TEXTURE_SIZE, &[0xff6b35, 0xf7931e, 0xffcd3c]),
    }
}

pub fn night(rng: &mut StdRng) -> EnvironmentPreset {
    let mut pixels = radial_gradient(
        ENV_TEXTURE_SIZE,
        &[0x1a1a2e, 0x16213e, 0x0f3460],
        256.0,
        128.0,
        256.0,
    );
    scatter_stars(&mut pixels, ENV_TEXTURE_SIZE, STAR_COUNT, rng);
    EnvironmentPreset {
        name: "night",
        background: hex_to_rgb(0x1a1a2e),
        fog: Fog::Exp2 {
            color: hex_to_rgb(0x1a1a2e),
            density: 0.02,
        },
        pixels,
    }
}

pub fn cyberpunk() -> EnvironmentPreset {
    let mut pixels = vertical_gradient(ENV_TEXTURE_SIZE, &[0xff00ff, 0x00ffff, 0xff0080]);
    draw_grid(&mut pixels, ENV_TEXTURE_SIZE, GRID_SPACING, hex_to_rgb(0x00ff00));
    EnvironmentPreset {
        name: "cyberpunk",
        background: hex_to_rgb(0x001122),
        fog: Fog::Exp2 {
            color: hex_to_rgb(0x001122),
            density: 0.015,
        },
        pixels,
    }
}

pub struct EnvironmentManager {
    presets: Vec<EnvironmentPreset>,
    current: usize,
    generation: u64,
}

impl EnvironmentManager {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let presets = vec![studio(), sunset(), night(&mut rng), cyberpunk()];
        Self {
            presets,
            current: 0,
            generation: 0,
        }
    }

    /// Switch preset and point every material at its map. Unknown names are
    /// ignored and return false.
    pub fn apply_environment(&mut self, name: &str, materials: &mut [MaterialSlot]) -> bool {
        let Some(index) = self.presets.iter().position(|p| p.name == name) else {
            return false;
        };
        self.current = index;
        self.generation += 1;
        for m in materials.iter_mut() {
            m.env_map = Some(index);
            m.needs_update = true;
        }
        true
    }

    pub fn current(&self) -> &EnvironmentPreset {
        &self.presets[self.current]
    }

    pub fn current_environment(&self) -> &'static str {
        self.presets[self.current].name
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn available_environments(&self) -> Vec<&'static str> {
        self.presets.iter().map(|p| p.name).collect()
    }
}
