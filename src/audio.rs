use crate::constants::{NOISE_SEED, PANNER_REF_DISTANCE, PANNER_ROLLOFF};
use crate::core::triggers::ToneConfig;
use crate::core::{
    baseline_gains, graph_for, AmbienceGraph, AmbienceKind, AmbienceSwitcher, EnvelopeSpec,
    FilterKind, FilterSpec, MasterVolume, SwitchPlan, Tone, Waveform, TONE_GAIN,
};
use crate::dom;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

fn create_gain(
    audio_ctx: &web::AudioContext,
    value: f32,
    label: &str,
) -> Result<web::GainNode, ()> {
    match web::GainNode::new(audio_ctx) {
        Ok(g) => {
            g.gain().set_value(value);
            Ok(g)
        }
        Err(e) => {
            log::error!("{} GainNode error: {:?}", label, e);
            Err(())
        }
    }
}

fn create_filter(audio_ctx: &web::AudioContext, spec: &FilterSpec) -> Result<web::BiquadFilterNode, ()> {
    let filter = web::BiquadFilterNode::new(audio_ctx).map_err(|e| {
        log::error!("BiquadFilterNode error: {:?}", e);
    })?;
    filter.set_type(match spec.kind {
        FilterKind::Lowpass => web::BiquadFilterType::Lowpass,
        FilterKind::Bandpass => web::BiquadFilterType::Bandpass,
    });
    filter.frequency().set_value(spec.frequency);
    filter.q().set_value(spec.q);
    Ok(filter)
}

fn create_oscillator(audio_ctx: &web::AudioContext, tone: Tone) -> Result<web::OscillatorNode, ()> {
    let osc = web::OscillatorNode::new(audio_ctx).map_err(|e| {
        log::error!("OscillatorNode error: {:?}", e);
    })?;
    osc.set_type(match tone.waveform {
        Waveform::Sine => web::OscillatorType::Sine,
        Waveform::Square => web::OscillatorType::Square,
        Waveform::Sawtooth => web::OscillatorType::Sawtooth,
        Waveform::Triangle => web::OscillatorType::Triangle,
    });
    osc.frequency().set_value(tone.frequency);
    Ok(osc)
}

fn lfo_tone(frequency: f32) -> Tone {
    Tone {
        waveform: Waveform::Sine,
        frequency,
    }
}

/// Sources and timers of an ambience that is currently sounding.
struct Running {
    sources: Vec<web::AudioScheduledSourceNode>,
    timer: Option<(i32, Closure<dyn FnMut()>)>,
}

/// The persistent part of an ambience: gains, filters, echo. Sources are
/// single-use in WebAudio, so they are rebuilt on every start.
struct BuiltAmbience {
    kind: AmbienceKind,
    graph: AmbienceGraph,
    /// Output gain stages with their unscaled levels.
    gains: Vec<(web::GainNode, f32)>,
    inputs: SmallVec<[web::AudioNode; 2]>,
    lfo_gain: Option<web::GainNode>,
    noise: Option<web::AudioBuffer>,
    running: Option<Running>,
}

fn build_ambience(
    ctx: &web::AudioContext,
    kind: AmbienceKind,
    graph: AmbienceGraph,
    volume: MasterVolume,
) -> Result<BuiltAmbience, ()> {
    let destination = ctx.destination();
    let baselines = baseline_gains(&graph);
    let mut gains = Vec::new();
    let mut inputs: SmallVec<[web::AudioNode; 2]> = SmallVec::new();
    let mut lfo_gain = None;
    let mut noise = None;

    match &graph {
        AmbienceGraph::Drone { voices, filter, echo } => {
            let filter = create_filter(ctx, filter)?;
            for (i, (_, level)) in voices.iter().enumerate() {
                let g = create_gain(ctx, volume.scale(*level), "drone voice")?;
                _ = g.connect_with_audio_node(&filter);
                inputs.push(g.clone().into());
                gains.push((g, baselines[i]));
            }
            _ = filter.connect_with_audio_node(&destination);

            let delay = ctx
                .create_delay_with_max_delay_time(echo.max_time_s)
                .map_err(|e| {
                    log::error!("DelayNode error: {:?}", e);
                })?;
            delay.delay_time().set_value(echo.time_s as f32);
            let wet = create_gain(ctx, volume.scale(echo.wet), "echo wet")?;
            let feedback = create_gain(ctx, echo.feedback, "echo feedback")?;
            _ = filter.connect_with_audio_node(&delay);
            _ = delay.connect_with_audio_node(&wet);
            _ = wet.connect_with_audio_node(&destination);
            _ = wet.connect_with_audio_node(&feedback);
            _ = feedback.connect_with_audio_node(&delay);
            gains.push((wet, echo.wet));
        }
        AmbienceGraph::Noise {
            seconds,
            amplitude,
            filter,
            gain,
            lfo,
        } => {
            let filter = create_filter(ctx, filter)?;
            let out = create_gain(ctx, volume.scale(*gain), "noise out")?;
            _ = filter.connect_with_audio_node(&out);
            _ = out.connect_with_audio_node(&destination);
            let depth = create_gain(ctx, lfo.depth, "noise lfo")?;
            _ = depth.connect_with_audio_param(&filter.frequency());
            inputs.push(filter.into());
            lfo_gain = Some(depth);
            gains.push((out, *gain));
            noise = white_noise(ctx, *seconds, *amplitude);
        }
        AmbienceGraph::Bells { voices, .. } => {
            for (_, env) in voices.iter() {
                // silent until the envelope timer fires
                let g = create_gain(ctx, 0.0, "bell")?;
                _ = g.connect_with_audio_node(&destination);
                inputs.push(g.clone().into());
                gains.push((g, env.peak));
            }
        }
        AmbienceGraph::Rumble {
            filter, gain, lfo, ..
        } => {
            let filter = create_filter(ctx, filter)?;
            let out = create_gain(ctx, volume.scale(*gain), "rumble out")?;
            _ = filter.connect_with_audio_node(&out);
            _ = out.connect_with_audio_node(&destination);
            let depth = create_gain(ctx, lfo.depth, "rumble lfo")?;
            _ = depth.connect_with_audio_param(&filter.frequency());
            inputs.push(filter.into());
            lfo_gain = Some(depth);
            gains.push((out, *gain));
        }
    }

    Ok(BuiltAmbience {
        kind,
        graph,
        gains,
        inputs,
        lfo_gain,
        noise,
        running: None,
    })
}

fn white_noise(ctx: &web::AudioContext, seconds: f32, amplitude: f32) -> Option<web::AudioBuffer> {
    let sr = ctx.sample_rate();
    let len = (sr * seconds) as u32;
    let buffer = ctx.create_buffer(1, len, sr).ok()?;
    let mut rng = StdRng::seed_from_u64(NOISE_SEED);
    let mut data: Vec<f32> = (0..len)
        .map(|_| (rng.gen::<f32>() * 2.0 - 1.0) * amplitude)
        .collect();
    _ = buffer.copy_to_channel(&mut data, 0);
    Some(buffer)
}

fn trigger_envelope(ctx: &web::AudioContext, gain: &web::GainNode, env: &EnvelopeSpec, volume: MasterVolume) {
    let now = ctx.current_time();
    let param = gain.gain();
    _ = param.cancel_scheduled_values(now);
    _ = param.set_value_at_time(0.0, now);
    _ = param.linear_ramp_to_value_at_time(volume.scale(env.peak), now + env.attack_s);
    // exponential ramps cannot reach zero
    let floor = volume.scale(env.floor).max(1e-4);
    _ = param.exponential_ramp_to_value_at_time(floor, now + env.attack_s + env.release_s);
}

impl BuiltAmbience {
    fn start(&mut self, ctx: &web::AudioContext, volume: &Rc<Cell<MasterVolume>>) -> Result<(), ()> {
        if self.running.is_some() {
            return Ok(());
        }
        let mut sources: Vec<web::AudioScheduledSourceNode> = Vec::new();
        let mut timer = None;
        match &self.graph {
            AmbienceGraph::Drone { voices, .. } => {
                for ((tone, _), input) in voices.iter().zip(self.inputs.iter()) {
                    let osc = create_oscillator(ctx, *tone)?;
                    _ = osc.connect_with_audio_node(input);
                    sources.push(osc.into());
                }
            }
            AmbienceGraph::Noise { lfo, .. } | AmbienceGraph::Rumble { lfo, .. } => {
                if let AmbienceGraph::Rumble { tone, .. } = &self.graph {
                    let osc = create_oscillator(ctx, *tone)?;
                    _ = osc.connect_with_audio_node(&self.inputs[0]);
                    sources.push(osc.into());
                } else if let Some(buffer) = &self.noise {
                    let src = web::AudioBufferSourceNode::new(ctx).map_err(|e| {
                        log::error!("AudioBufferSourceNode error: {:?}", e);
                    })?;
                    src.set_buffer(Some(buffer));
                    src.set_loop(true);
                    _ = src.connect_with_audio_node(&self.inputs[0]);
                    sources.push(src.into());
                }
                if let Some(depth) = &self.lfo_gain {
                    let osc = create_oscillator(ctx, lfo_tone(lfo.frequency))?;
                    _ = osc.connect_with_audio_node(depth);
                    sources.push(osc.into());
                }
            }
            AmbienceGraph::Bells { voices, interval_ms } => {
                for ((tone, _), input) in voices.iter().zip(self.inputs.iter()) {
                    let osc = create_oscillator(ctx, *tone)?;
                    _ = osc.connect_with_audio_node(input);
                    sources.push(osc.into());
                }
                let envelopes: Vec<(web::GainNode, EnvelopeSpec)> = self
                    .gains
                    .iter()
                    .zip(voices.iter())
                    .map(|((g, _), (_, env))| (g.clone(), *env))
                    .collect();
                let ctx_bells = ctx.clone();
                let volume_bells = volume.clone();
                let ring = Closure::wrap(Box::new(move || {
                    for (g, env) in &envelopes {
                        trigger_envelope(&ctx_bells, g, env, volume_bells.get());
                    }
                }) as Box<dyn FnMut()>);
                if let Some(w) = web::window() {
                    if let Ok(id) = w.set_interval_with_callback_and_timeout_and_arguments_0(
                        ring.as_ref().unchecked_ref(),
                        *interval_ms as i32,
                    ) {
                        timer = Some((id, ring));
                    }
                }
            }
        }
        for s in &sources {
            _ = s.start();
        }
        log::info!("[audio] started ambience '{}'", self.kind.name());
        self.running = Some(Running { sources, timer });
        Ok(())
    }

    fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        for s in &running.sources {
            #[allow(deprecated)]
            _ = s.stop();
            _ = s.disconnect();
        }
        if let (Some((id, _closure)), Some(w)) = (running.timer, web::window()) {
            w.clear_interval_with_handle(id);
        }
        log::info!("[audio] stopped ambience '{}'", self.kind.name());
    }

    fn apply_volume(&self, volume: MasterVolume) {
        // bell stages are scaled when their envelope fires
        if matches!(self.graph, AmbienceGraph::Bells { .. }) {
            return;
        }
        for (g, base) in &self.gains {
            g.gain().set_value(volume.scale(*base));
        }
    }
}

/// WebAudio ambience player plus positional trigger tones.
pub struct AudioSystem {
    ctx: web::AudioContext,
    graphs: Vec<BuiltAmbience>,
    switcher: AmbienceSwitcher,
    volume: Rc<Cell<MasterVolume>>,
}

impl AudioSystem {
    /// `None` when the page has no usable WebAudio.
    pub fn new() -> Option<Self> {
        let ctx = match web::AudioContext::new() {
            Ok(c) => c,
            Err(e) => {
                log::info!("[audio] WebAudio unavailable: {:?}", e);
                return None;
            }
        };
        let volume = MasterVolume::default();
        let mut rng = StdRng::from_entropy();
        let graphs = AmbienceKind::ALL
            .into_iter()
            .filter_map(|kind| build_ambience(&ctx, kind, graph_for(kind, &mut rng), volume).ok())
            .collect::<Vec<_>>();
        log::info!("[audio] built {} ambience graphs", graphs.len());
        Some(Self {
            ctx,
            graphs,
            switcher: AmbienceSwitcher::new(),
            volume: Rc::new(Cell::new(volume)),
        })
    }

    fn run_plan(&mut self, plan: SwitchPlan) {
        if let Some(kind) = plan.stop {
            if let Some(g) = self.graphs.iter_mut().find(|g| g.kind == kind) {
                g.stop();
            }
        }
        if let Some(kind) = plan.start {
            let volume = self.volume.clone();
            if let Some(g) = self.graphs.iter_mut().find(|g| g.kind == kind) {
                if g.start(&self.ctx, &volume).is_err() {
                    log::error!("[audio] could not start '{}'", kind.name());
                }
            }
        }
    }

    /// Unknown names are ignored; the current ambience keeps playing.
    pub fn set_ambience(&mut self, name: &str) -> bool {
        if AmbienceKind::from_name(name).is_none() {
            log::warn!("[audio] unknown ambience '{name}'");
            return false;
        }
        let plan = self.switcher.set_ambience(name);
        self.run_plan(plan);
        true
    }

    /// Resume the context and start the current ambience (first user gesture).
    pub fn resume(&mut self) {
        _ = self.ctx.resume();
        let plan = self.switcher.start_current();
        self.run_plan(plan);
    }

    pub fn toggle(&mut self) -> bool {
        let plan = self.switcher.toggle();
        self.run_plan(plan);
        self.switcher.is_enabled()
    }

    pub fn set_master_volume(&mut self, v: f32) {
        let mut volume = self.volume.get();
        volume.set(v);
        self.volume.set(volume);
        for g in &self.graphs {
            g.apply_volume(volume);
        }
    }

    pub fn current_ambience(&self) -> &'static str {
        self.switcher.current().name()
    }

    pub fn available_ambiences(&self) -> Vec<&'static str> {
        self.switcher.available_ambiences()
    }

    pub fn is_enabled(&self) -> bool {
        self.switcher.is_enabled()
    }

    /// One-shot positional tone at `position`, torn down after its duration.
    pub fn play_tone(&self, position: Vec3, tone: &ToneConfig) {
        if !self.switcher.is_enabled() {
            return;
        }
        let Ok(osc) = create_oscillator(
            &self.ctx,
            Tone {
                waveform: tone.waveform,
                frequency: tone.frequency,
            },
        ) else {
            return;
        };
        let Ok(gain) = create_gain(&self.ctx, self.volume.get().scale(TONE_GAIN), "tone") else {
            return;
        };
        let panner = match web::PannerNode::new(&self.ctx) {
            Ok(p) => p,
            Err(e) => {
                log::error!("PannerNode error: {:?}", e);
                return;
            }
        };
        panner.set_distance_model(web::DistanceModelType::Exponential);
        panner.set_ref_distance(PANNER_REF_DISTANCE);
        panner.set_rolloff_factor(PANNER_ROLLOFF);
        panner.position_x().set_value(position.x);
        panner.position_y().set_value(position.y);
        panner.position_z().set_value(position.z);

        _ = osc.connect_with_audio_node(&gain);
        _ = gain.connect_with_audio_node(&panner);
        _ = panner.connect_with_audio_node(&self.ctx.destination());
        let seconds = tone.duration_ms as f64 / 1000.0;
        _ = osc.start();
        _ = osc.stop_with_when(self.ctx.current_time() + seconds);
        dom::set_timeout(
            move || {
                _ = osc.disconnect();
                _ = gain.disconnect();
                _ = panner.disconnect();
            },
            tone.duration_ms as i32,
        );
        log::info!("[audio] trigger tone {:.0} Hz", tone.frequency);
    }

    /// Keep the listener on the camera.
    pub fn update_listener(&self, eye: Vec3, forward: Vec3, up: Vec3) {
        let listener = self.ctx.listener();
        listener.set_position(eye.x as f64, eye.y as f64, eye.z as f64);
        _ = listener.set_orientation(
            forward.x as f64,
            forward.y as f64,
            forward.z as f64,
            up.x as f64,
            up.y as f64,
            up.z as f64,
        );
    }
}

/// Browsers keep audio suspended until a gesture; start on the first one.
pub fn wire_resume_on_gesture(document: &web::Document, audio: Rc<RefCell<AudioSystem>>) {
    for event in ["click", "keydown", "touchstart"] {
        let audio = audio.clone();
        dom::add_listener(document, event, move |_| {
            audio.borrow_mut().resume();
        });
    }
}
