use std::collections::VecDeque;

pub const FPS_HISTORY: usize = 60;
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Rolling average of instantaneous frame rates.
#[derive(Clone, Debug, Default)]
pub struct FpsTracker {
    samples: VecDeque<f64>,
    last_ms: Option<f64>,
}

impl FpsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now_ms` and return the rounded average, or `None`
    /// for the very first frame.
    pub fn record(&mut self, now_ms: f64) -> Option<u32> {
        let last = self.last_ms.replace(now_ms)?;
        let dt = now_ms - last;
        if dt > 0.0 {
            self.samples.push_back(1000.0 / dt);
            while self.samples.len() > FPS_HISTORY {
                self.samples.pop_front();
            }
        }
        self.average()
    }

    pub fn average(&self) -> Option<u32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().sum();
        Some((sum / self.samples.len() as f64).round() as u32)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Forget the previous timestamp so a pause is not counted as a frame.
    pub fn reset_clock(&mut self) {
        self.last_ms = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FpsBand {
    Good,
    Fair,
    Poor,
}

impl FpsBand {
    pub fn of(fps: u32) -> Self {
        if fps >= 55 {
            FpsBand::Good
        } else if fps >= 30 {
            FpsBand::Fair
        } else {
            FpsBand::Poor
        }
    }

    pub fn css_color(self) -> &'static str {
        match self {
            FpsBand::Good => "#4ade80",
            FpsBand::Fair => "#fbbf24",
            FpsBand::Poor => "#ef4444",
        }
    }
}

pub fn heap_megabytes(used_bytes: f64) -> u32 {
    (used_bytes / BYTES_PER_MB).round().max(0.0) as u32
}

/// `1234567` → `"1,234,567"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Triangles in an indexed or non-indexed mesh.
pub fn triangle_count(index_count: Option<usize>, vertex_count: usize) -> u64 {
    (index_count.unwrap_or(vertex_count) / 3) as u64
}
