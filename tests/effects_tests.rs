// Host-side tests for particle and weather systems, environment presets and
// the post-processing plan. The main crate is wasm-only, so we include the
// pure-Rust core modules directly.

#![allow(dead_code)]
#[path = "../src/core/mod.rs"]
mod head_core;

use glam::Vec3;
use head_core::*;

#[test]
fn particle_systems_are_generated_with_authored_counts() {
    let systems = ParticleSystems::new(7);
    let counts: Vec<(&str, usize)> = systems
        .systems
        .iter()
        .map(|s| (s.kind.name(), s.instances.len()))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("floatingParticles", FLOATING_COUNT),
            ("mysticalOrbs", ORB_COUNT),
            ("energyField", ENERGY_COUNT),
            ("ambientDust", DUST_COUNT),
        ]
    );
    assert!(systems.systems.iter().all(|s| s.visible));
}

#[test]
fn same_seed_same_particles() {
    let a = ParticleSystems::new(99);
    let b = ParticleSystems::new(99);
    assert_eq!(a.systems[0].instances, b.systems[0].instances);
    let c = ParticleSystems::new(100);
    assert_ne!(a.systems[0].instances, c.systems[0].instances);
}

#[test]
fn zero_intensity_hides_and_one_restores() {
    let mut systems = ParticleSystems::new(1);
    let before = systems.get("ambientDust").unwrap().params();
    assert!(systems.set_intensity("ambientDust", 0.0));
    let dust = systems.get("ambientDust").unwrap();
    assert!(!dust.visible);
    assert_eq!(dust.intensity, 0.0);

    assert!(systems.set_intensity("ambientDust", 1.0));
    let dust = systems.get("ambientDust").unwrap();
    assert!(dust.visible);
    assert_eq!(dust.params(), before);
}

#[test]
fn unknown_system_names_are_rejected() {
    let mut systems = ParticleSystems::new(1);
    assert!(!systems.set_intensity("fireflies", 0.5));
    assert!(!systems.toggle_system("rain", false));
    assert!(systems.systems.iter().all(|s| s.intensity == 1.0 && s.visible));
}

#[test]
fn system_names_are_listed_in_build_order() {
    let systems = ParticleSystems::new(3);
    assert_eq!(
        systems.available_systems(),
        vec!["floatingParticles", "mysticalOrbs", "energyField", "ambientDust"]
    );
}

#[test]
fn toggle_system_only_touches_visibility() {
    let mut systems = ParticleSystems::new(1);
    assert!(systems.toggle_system("mysticalOrbs", false));
    let orbs = systems.get("mysticalOrbs").unwrap();
    assert!(!orbs.visible);
    assert_eq!(orbs.intensity, 1.0);
}

#[test]
fn energy_field_pulses_around_base_level() {
    let mut systems = ParticleSystems::new(1);
    for ms in [0.0, 250.0, 800.0, 1600.0, 3100.0] {
        systems.update(ms);
        let field = systems.get("energyField").unwrap();
        let i = field.effective_intensity();
        assert!((0.1 - 1e-6..=0.5 + 1e-6).contains(&i), "intensity {i} at {ms}ms");
    }
    systems.set_all_intensity(0.5);
    systems.update(0.0);
    assert!((systems.get("energyField").unwrap().effective_intensity() - 0.15).abs() < 1e-6);
}

#[test]
fn wrap_range_is_half_open() {
    assert_eq!(wrap_range(-10.0, -10.0, 10.0), -10.0);
    assert_eq!(wrap_range(10.0, -10.0, 10.0), -10.0);
    assert!((wrap_range(12.5, -10.0, 10.0) - -7.5).abs() < 1e-5);
    assert!((wrap_range(-11.0, -10.0, 10.0) - 9.0).abs() < 1e-5);
    assert_eq!(wrap_range(3.0, 1.0, 1.0), 1.0);
}

#[test]
fn precipitation_stays_inside_its_column() {
    let mut weather = WeatherSystems::new(5);
    weather.set_weather("rain");
    let rain = weather.visible().next().unwrap();
    for p in rain.instances.iter().take(50) {
        for t in [0.0, 5.0, 40.0, 600.0] {
            let y = simulate(EffectKind::Rain, p, t).y;
            assert!(y >= PRECIPITATION_WRAP.0 && y <= PRECIPITATION_WRAP.1, "y={y}");
        }
    }
}

#[test]
fn dust_and_mist_wrap_vertically() {
    let systems = ParticleSystems::new(3);
    let dust = systems.get("ambientDust").unwrap();
    for p in &dust.instances {
        let y = simulate(EffectKind::AmbientDust, p, 10_000.0).y;
        assert!(y >= DUST_WRAP.0 && y <= DUST_WRAP.1);
    }
    let mut weather = WeatherSystems::new(3);
    weather.set_weather("mist");
    let mist = weather.visible().next().unwrap();
    for p in &mist.instances {
        let y = simulate(EffectKind::Mist, p, 10_000.0).y;
        assert!(y >= MIST_WRAP.0 && y <= MIST_WRAP.1);
    }
}

#[test]
fn orbs_stay_on_their_ring() {
    let systems = ParticleSystems::new(3);
    let orbs = systems.get("mysticalOrbs").unwrap();
    for p in &orbs.instances {
        let pos = simulate(EffectKind::MysticalOrbs, p, 12.0);
        let r = Vec3::new(pos.x, 0.0, pos.z).length();
        assert!((5.0 - 1e-3..=7.0 + 1e-3).contains(&r));
        assert!(pos.y.abs() <= 2.0 + 1e-4);
    }
}

#[test]
fn weather_is_mutually_exclusive() {
    let mut weather = WeatherSystems::new(1);
    assert_eq!(weather.current_weather(), "clear");
    assert_eq!(weather.visible().count(), 0);

    weather.set_weather("snow");
    assert_eq!(weather.current_weather(), "snow");
    let visible: Vec<_> = weather.visible().map(|e| e.kind).collect();
    assert_eq!(visible, vec![EffectKind::Snow]);

    weather.set_weather("rain");
    let visible: Vec<_> = weather.visible().map(|e| e.kind).collect();
    assert_eq!(visible, vec![EffectKind::Rain]);

    weather.set_weather("clear");
    assert_eq!(weather.visible().count(), 0);
}

#[test]
fn unknown_weather_clears_the_sky() {
    let mut weather = WeatherSystems::new(1);
    weather.set_weather("mist");
    weather.set_weather("hail");
    assert_eq!(weather.current_weather(), "clear");
    assert_eq!(weather.visible().count(), 0);
    assert_eq!(
        weather.available_weather(),
        vec!["clear", "rain", "snow", "mist"]
    );
}

#[test]
fn hidden_weather_does_not_advance() {
    let mut weather = WeatherSystems::new(1);
    weather.set_weather("rain");
    weather.update(2000.0);
    for e in &weather.effects {
        let expected = if e.kind == EffectKind::Rain { 2.0 } else { 0.0 };
        assert_eq!(e.time_s, expected);
    }
}

#[test]
fn sprite_fades_from_centre_to_edge() {
    let px = radial_sprite(SPRITE_SIZE);
    assert_eq!(px.len(), (SPRITE_SIZE * SPRITE_SIZE * 4) as usize);
    let alpha = |x: u32, y: u32| px[((y * SPRITE_SIZE + x) * 4 + 3) as usize];
    let c = SPRITE_SIZE / 2;
    assert!(alpha(c, c) > 240);
    assert_eq!(alpha(0, 0), 0);
    assert!(alpha(c + c / 2, c) > 110 && alpha(c + c / 2, c) < 145);
}

#[test]
fn hsl_primary_hues() {
    let red = hsl_to_rgba(0.0, 1.0, 0.5, 1.0);
    assert!((red[0] - 1.0).abs() < 1e-5 && red[1].abs() < 1e-5 && red[2].abs() < 1e-5);
    let green = hsl_to_rgba(1.0 / 3.0, 1.0, 0.5, 0.5);
    assert!((green[1] - 1.0).abs() < 1e-5);
    assert_eq!(green[3], 0.5);
}

#[test]
fn post_chain_orders_enabled_effects() {
    let mut flags = EffectFlags::default();
    let kinds = |f: &EffectFlags| -> Vec<PassKind> { build_passes(f).iter().map(|p| p.kind).collect() };
    assert_eq!(kinds(&flags), vec![PassKind::Scene, PassKind::Copy]);

    flags.chromatic_aberration = true;
    flags.bloom = true;
    assert_eq!(
        kinds(&flags),
        vec![
            PassKind::Scene,
            PassKind::Effect(PostEffect::Bloom),
            PassKind::Effect(PostEffect::ChromaticAberration),
            PassKind::Copy,
        ]
    );
}

#[test]
fn schedule_ping_pongs_and_ends_on_screen() {
    let flags = EffectFlags {
        bloom: true,
        vignette: true,
        film_grain: false,
        chromatic_aberration: false,
    };
    let plan = schedule(&build_passes(&flags));
    assert_eq!(plan.len(), 4);
    assert_eq!(plan[0].read, None);
    assert_eq!(plan[0].write, Target::A);
    assert_eq!(plan[1].read, Some(Target::A));
    assert_eq!(plan[1].write, Target::B);
    assert_eq!(plan[2].read, Some(Target::B));
    assert_eq!(plan[2].write, Target::A);
    assert_eq!(plan[3].kind, PassKind::Copy);
    assert_eq!(plan[3].read, Some(Target::A));
    assert_eq!(plan[3].write, Target::Screen);
    for pass in &plan {
        assert_ne!(pass.read, Some(pass.write), "a pass never samples its own target");
    }
}

#[test]
fn toggling_effects_rebuilds_but_keeps_params() {
    let mut chain = PostChain::new(800, 600);
    chain.set_bloom_strength(0.9);
    let gen = chain.generation();
    assert!(chain.toggle_effect("vignette", true));
    assert_eq!(chain.generation(), gen + 1);
    assert!(chain.flags.vignette);
    assert_eq!(chain.passes().len(), 3);
    assert_eq!(chain.params.bloom_strength, 0.9);

    assert!(!chain.toggle_effect("lensFlare", true));
    assert_eq!(chain.generation(), gen + 1);

    chain.resize(1024, 0);
    assert_eq!(chain.size(), (1024, 1));
    assert_eq!(chain.generation(), gen + 1);
}

#[test]
fn effect_setters_reach_the_uniforms() {
    let mut chain = PostChain::new(640, 480);
    let defaults = chain.uniforms();
    assert_eq!(defaults.bloom_strength, 0.3);
    assert_eq!(defaults.vignette_darkness, 0.3);
    assert_eq!(defaults.chromatic_amount, 0.005);

    chain.set_bloom_strength(1.5);
    chain.set_vignette_intensity(0.7);
    chain.set_chromatic_aberration_amount(0.02);
    let u = chain.uniforms();
    assert_eq!(u.bloom_strength, 1.5);
    assert_eq!(u.vignette_darkness, 0.7);
    assert_eq!(u.chromatic_amount, 0.02);
    assert_eq!(u.bloom_threshold, defaults.bloom_threshold);
}

#[test]
fn effect_sliders_drive_the_chain() {
    let mut chain = PostChain::new(640, 480);
    let sliders: Vec<u32> = EffectParam::ALL
        .iter()
        .map(|p| p.to_slider(chain.param(*p)))
        .collect();
    assert_eq!(sliders, vec![30, 30, 5]);

    let bloom = EffectParam::BloomStrength;
    chain.set_param(bloom, bloom.from_slider(150.0));
    assert!((chain.uniforms().bloom_strength - 1.5).abs() < 1e-6);

    // out-of-range slider values clamp to the slider's ends
    let chromatic = EffectParam::ChromaticAmount;
    chain.set_param(chromatic, chromatic.from_slider(500.0));
    assert!((chain.uniforms().chromatic_amount - 0.02).abs() < 1e-6);
    assert_eq!(chromatic.to_slider(1.0), chromatic.slider_max());

    let vignette = EffectParam::VignetteIntensity;
    chain.set_param(vignette, vignette.from_slider(-5.0));
    assert_eq!(chain.uniforms().vignette_darkness, 0.0);
}

#[test]
fn grain_clock_runs_only_when_enabled() {
    let mut chain = PostChain::new(800, 600);
    chain.update_effects(5000.0);
    assert_eq!(chain.uniforms().time, 0.0);
    chain.toggle_effect("filmGrain", true);
    chain.update_effects(5000.0);
    assert_eq!(chain.uniforms().time, 5.0);
    assert_eq!(chain.uniforms().resolution, [800.0, 600.0]);
}

#[test]
fn every_effect_has_a_fragment_entry() {
    for effect in PostEffect::ALL {
        let entry = PassKind::Effect(effect).fragment_entry().unwrap();
        assert!(POST_WGSL.contains(entry), "post.wgsl lacks {entry}");
        assert_eq!(PostEffect::from_name(effect.name()), Some(effect));
    }
    assert!(PassKind::Scene.fragment_entry().is_none());
}

#[test]
fn environments_switch_and_flag_materials() {
    let mut env = EnvironmentManager::new(4);
    assert_eq!(
        env.available_environments(),
        vec!["studio", "sunset", "night", "cyberpunk"]
    );
    let mut materials = vec![MaterialSlot::default(); 3];
    assert!(env.apply_environment("night", &mut materials));
    assert_eq!(env.current_environment(), "night");
    for m in &materials {
        assert_eq!(m.env_map, Some(2));
        assert!(m.needs_update);
    }
    assert!(matches!(env.current().fog, Fog::Exp2 { .. }));

    let gen = env.generation();
    assert!(!env.apply_environment("moon", &mut materials));
    assert_eq!(env.current_environment(), "night");
    assert_eq!(env.generation(), gen);
}

#[test]
fn environment_textures_are_full_size() {
    let mut env = EnvironmentManager::new(4);
    for name in ["studio", "sunset", "night", "cyberpunk"] {
        env.apply_environment(name, &mut []);
        let px = &env.current().pixels;
        assert_eq!(px.len(), (ENV_TEXTURE_SIZE * ENV_TEXTURE_SIZE * 4) as usize);
        assert!(px.chunks_exact(4).all(|p| p[3] == 255));
    }
}

#[test]
fn fog_packs_into_shader_uniforms() {
    assert_eq!(Fog::None.uniform(), [[0.0; 4], [0.0; 4]]);
    let linear = Fog::Linear {
        color: [0.5, 0.25, 1.0],
        near: 10.0,
        far: 50.0,
    };
    assert_eq!(
        linear.uniform(),
        [[0.5, 0.25, 1.0, 1.0], [10.0, 50.0, 0.0, 0.0]]
    );
    let exp = Fog::Exp2 {
        color: [0.0; 3],
        density: 0.02,
    };
    assert_eq!(exp.uniform()[0][3], 2.0);
    assert_eq!(exp.uniform()[1][2], 0.02);
}

#[test]
fn gradient_sampling() {
    assert_eq!(gradient_at(&[], 0.5), [0.0; 3]);
    assert_eq!(gradient_at(&[0xffffff], 0.9), [1.0; 3]);
    let mid = gradient_at(&[0x000000, 0xffffff], 0.5);
    assert!((mid[0] - 0.5).abs() < 1e-6);
    assert_eq!(gradient_at(&[0x000000, 0xff0000, 0x0000ff], 1.0), [0.0, 0.0, 1.0]);
}
