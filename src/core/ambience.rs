//! Procedural ambience descriptions and the switching / volume rules that
//! drive them. `audio.rs` turns an [`AmbienceGraph`] into WebAudio nodes.

use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AmbienceKind {
    Contemplative,
    Space,
    Mystical,
    Urban,
}

impl AmbienceKind {
    pub const ALL: [AmbienceKind; 4] = [
        AmbienceKind::Contemplative,
        AmbienceKind::Space,
        AmbienceKind::Mystical,
        AmbienceKind::Urban,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AmbienceKind::Contemplative => "contemplative",
            AmbienceKind::Space => "space",
            AmbienceKind::Mystical => "mystical",
            AmbienceKind::Urban => "urban",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub frequency: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Bandpass,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub frequency: f32,
    pub q: f32,
}

/// Feedback delay send.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EchoSpec {
    pub time_s: f64,
    pub max_time_s: f64,
    pub wet: f32,
    pub feedback: f32,
}

/// Sine LFO added to a filter's cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LfoSpec {
    pub frequency: f32,
    pub depth: f32,
}

/// Linear attack to `peak`, exponential decay to `floor`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeSpec {
    pub peak: f32,
    pub attack_s: f64,
    pub floor: f32,
    pub release_s: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AmbienceGraph {
    /// Two gained oscillators into a filter, with an echo send.
    Drone {
        voices: [(Tone, f32); 2],
        filter: FilterSpec,
        echo: EchoSpec,
    },
    /// Looping white noise through a modulated filter.
    Noise {
        seconds: f32,
        amplitude: f32,
        filter: FilterSpec,
        gain: f32,
        lfo: LfoSpec,
    },
    /// Oscillators held silent until a timer fires their envelopes.
    Bells {
        voices: [(Tone, EnvelopeSpec); 2],
        interval_ms: u32,
    },
    /// A single oscillator through a modulated filter.
    Rumble {
        tone: Tone,
        filter: FilterSpec,
        gain: f32,
        lfo: LfoSpec,
    },
}

pub const BELL_INTERVAL_MIN_MS: u32 = 8_000;
pub const BELL_INTERVAL_SPAN_MS: u32 = 12_000;

/// Bell retrigger period, drawn once per graph.
pub fn bell_interval_ms<R: Rng>(rng: &mut R) -> u32 {
    BELL_INTERVAL_MIN_MS + (rng.gen::<f32>() * BELL_INTERVAL_SPAN_MS as f32) as u32
}

pub fn graph_for<R: Rng>(kind: AmbienceKind, rng: &mut R) -> AmbienceGraph {
    match kind {
        AmbienceKind::Contemplative => AmbienceGraph::Drone {
            voices: [
                (
                    Tone {
                        waveform: Waveform::Sine,
                        frequency: 55.0,
                    },
                    0.1,
                ),
                (
                    Tone {
                        waveform: Waveform::Sine,
                        frequency: 110.0,
                    },
                    0.05,
                ),
            ],
            filter: FilterSpec {
                kind: FilterKind::Lowpass,
                frequency: 800.0,
                q: 0.5,
            },
            echo: EchoSpec {
                time_s: 0.3,
                max_time_s: 2.0,
                wet: 0.2,
                feedback: 0.4,
            },
        },
        AmbienceKind::Space => AmbienceGraph::Noise {
            seconds: 2.0,
            amplitude: 0.1,
            filter: FilterSpec {
                kind: FilterKind::Bandpass,
                frequency: 200.0,
                q: 0.3,
            },
            gain: 0.03,
            lfo: LfoSpec {
                frequency: 0.1,
                depth: 50.0,
            },
        },
        AmbienceKind::Mystical => {
            let envelope = |peak| EnvelopeSpec {
                peak,
                attack_s: 0.1,
                floor: 0.001,
                release_s: 3.0,
            };
            AmbienceGraph::Bells {
                voices: [
                    (
                        Tone {
                            waveform: Waveform::Sine,
                            frequency: 523.25,
                        },
                        envelope(0.02),
                    ),
                    (
                        Tone {
                            waveform: Waveform::Sine,
                            frequency: 659.25,
                        },
                        envelope(0.015),
                    ),
                ],
                interval_ms: bell_interval_ms(rng),
            }
        }
        AmbienceKind::Urban => AmbienceGraph::Rumble {
            tone: Tone {
                waveform: Waveform::Sawtooth,
                frequency: 40.0,
            },
            filter: FilterSpec {
                kind: FilterKind::Lowpass,
                frequency: 120.0,
                q: 0.7,
            },
            gain: 0.02,
            lfo: LfoSpec {
                frequency: 0.05,
                depth: 10.0,
            },
        },
    }
}

/// Unscaled levels of the output gain stages, in build order. LFO depths are
/// modulation amounts, not loudness, and are left out.
pub fn baseline_gains(graph: &AmbienceGraph) -> Vec<f32> {
    match graph {
        AmbienceGraph::Drone { voices, echo, .. } => {
            vec![voices[0].1, voices[1].1, echo.wet]
        }
        AmbienceGraph::Noise { gain, .. } => vec![*gain],
        AmbienceGraph::Bells { voices, .. } => voices.iter().map(|(_, env)| env.peak).collect(),
        AmbienceGraph::Rumble { gain, .. } => vec![*gain],
    }
}

/// Master volume in [0, 1]. Live gain is always `baseline * volume`, so
/// setting the same volume twice is a no-op.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MasterVolume(f32);

impl Default for MasterVolume {
    fn default() -> Self {
        MasterVolume(1.0)
    }
}

impl MasterVolume {
    pub fn set(&mut self, v: f32) -> f32 {
        self.0 = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        self.0
    }

    pub fn get(self) -> f32 {
        self.0
    }

    #[inline]
    pub fn scale(self, baseline: f32) -> f32 {
        baseline * self.0
    }
}

/// What the audio layer must do after a switcher call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwitchPlan {
    pub stop: Option<AmbienceKind>,
    pub start: Option<AmbienceKind>,
}

/// Tracks which ambience is current and whether it is actually sounding.
#[derive(Clone, Debug)]
pub struct AmbienceSwitcher {
    current: AmbienceKind,
    playing: Option<AmbienceKind>,
    enabled: bool,
}

impl Default for AmbienceSwitcher {
    fn default() -> Self {
        Self {
            current: AmbienceKind::Contemplative,
            playing: None,
            enabled: true,
        }
    }
}

impl AmbienceSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> AmbienceKind {
        self.current
    }

    pub fn playing(&self) -> Option<AmbienceKind> {
        self.playing
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stop whatever sounds and start `name`.
    ///
    /// Unknown names change nothing: the current ambience keeps playing
    /// rather than going silent.
    pub fn set_ambience(&mut self, name: &str) -> SwitchPlan {
        let Some(kind) = AmbienceKind::from_name(name) else {
            return SwitchPlan::default();
        };
        let stop = self.playing.take();
        self.current = kind;
        let start = if self.enabled { Some(kind) } else { None };
        self.playing = start;
        SwitchPlan { stop, start }
    }

    /// Start the current ambience if enabled and silent (first user gesture).
    pub fn start_current(&mut self) -> SwitchPlan {
        if !self.enabled || self.playing.is_some() {
            return SwitchPlan::default();
        }
        self.playing = Some(self.current);
        SwitchPlan {
            stop: None,
            start: self.playing,
        }
    }

    pub fn toggle(&mut self) -> SwitchPlan {
        self.enabled = !self.enabled;
        if self.enabled {
            self.start_current()
        } else {
            SwitchPlan {
                stop: self.playing.take(),
                start: None,
            }
        }
    }

    pub fn available_ambiences(&self) -> Vec<&'static str> {
        AmbienceKind::ALL.iter().map(|k| k.name()).collect()
    }
}
