//! Camera fly-to transitions.
//!
//! Every transition gets a monotonically increasing token. Starting a new one
//! cancels whatever was in flight, and only the newest token is ever sampled,
//! so two quick preset switches can never fight over the camera.

use glam::Vec3;

/// Exponential ease-in-out over `k ∈ [0, 1]`.
#[inline]
pub fn ease_exponential_in_out(k: f32) -> f32 {
    if k <= 0.0 {
        return 0.0;
    }
    if k >= 1.0 {
        return 1.0;
    }
    let k2 = k * 2.0;
    if k2 < 1.0 {
        0.5 * 1024.0_f32.powf(k2 - 1.0)
    } else {
        0.5 * (2.0 - 2.0_f32.powf(-10.0 * (k2 - 1.0)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionToken(pub u64);

#[derive(Clone, Copy, Debug)]
pub struct CameraTransition {
    pub token: TransitionToken,
    pub from: Vec3,
    pub to: Vec3,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl CameraTransition {
    pub fn progress(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
    }

    pub fn position_at(&self, now_ms: f64) -> Vec3 {
        let t = ease_exponential_in_out(self.progress(now_ms));
        self.from.lerp(self.to, t)
    }
}

/// Result of sampling the live transition for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionStep {
    pub token: TransitionToken,
    pub position: Vec3,
    pub finished: bool,
}

#[derive(Debug, Default)]
pub struct TransitionDirector {
    next_token: u64,
    active: Option<CameraTransition>,
}

impl TransitionDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transition, cancelling any in-flight one. Returns the new token
    /// and the token that was superseded, if any.
    pub fn begin(
        &mut self,
        from: Vec3,
        to: Vec3,
        now_ms: f64,
        duration_ms: f64,
    ) -> (TransitionToken, Option<TransitionToken>) {
        self.next_token += 1;
        let token = TransitionToken(self.next_token);
        let superseded = self.active.take().map(|t| t.token);
        self.active = Some(CameraTransition {
            token,
            from,
            to,
            start_ms: now_ms,
            duration_ms,
        });
        (token, superseded)
    }

    /// Sample the current transition. The final step (with `finished = true`)
    /// lands exactly on the target and clears the director.
    pub fn sample(&mut self, now_ms: f64) -> Option<TransitionStep> {
        let tr = self.active?;
        let finished = tr.progress(now_ms) >= 1.0;
        let position = if finished { tr.to } else { tr.position_at(now_ms) };
        if finished {
            self.active = None;
        }
        Some(TransitionStep {
            token: tr.token,
            position,
            finished,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
