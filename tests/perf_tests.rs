// Host-side tests for the performance overlay maths. The main crate is
// wasm-only, so we include the pure-Rust module directly.

#![allow(dead_code)]
#[path = "../src/core/perf.rs"]
mod perf;

use perf::*;

#[test]
fn first_frame_has_no_rate() {
    let mut fps = FpsTracker::new();
    assert_eq!(fps.record(0.0), None);
    assert!(fps.is_empty());
}

#[test]
fn steady_frames_average_out() {
    let mut fps = FpsTracker::new();
    let mut t = 0.0;
    fps.record(t);
    for _ in 0..10 {
        t += 1000.0 / 60.0;
        fps.record(t);
    }
    assert_eq!(fps.average(), Some(60));
}

#[test]
fn history_is_bounded() {
    let mut fps = FpsTracker::new();
    let mut t = 0.0;
    for _ in 0..(FPS_HISTORY * 3) {
        fps.record(t);
        t += 20.0;
    }
    assert_eq!(fps.len(), FPS_HISTORY);
    assert_eq!(fps.average(), Some(50));
}

#[test]
fn slow_frames_age_out_of_the_window() {
    let mut fps = FpsTracker::new();
    let mut t = 0.0;
    fps.record(t);
    for _ in 0..FPS_HISTORY {
        t += 100.0;
        fps.record(t);
    }
    assert_eq!(fps.average(), Some(10));
    for _ in 0..FPS_HISTORY {
        t += 10.0;
        fps.record(t);
    }
    assert_eq!(fps.average(), Some(100));
}

#[test]
fn duplicate_timestamps_are_ignored() {
    let mut fps = FpsTracker::new();
    fps.record(5.0);
    fps.record(5.0);
    assert!(fps.is_empty());
}

#[test]
fn pause_does_not_count_as_a_frame() {
    let mut fps = FpsTracker::new();
    fps.record(0.0);
    fps.record(16.0);
    fps.reset_clock();
    assert_eq!(fps.record(60_000.0), None);
    assert_eq!(fps.average(), Some(63));
    assert_eq!(fps.len(), 1);
}

#[test]
fn bands_and_colours() {
    assert_eq!(FpsBand::of(60), FpsBand::Good);
    assert_eq!(FpsBand::of(55), FpsBand::Good);
    assert_eq!(FpsBand::of(54), FpsBand::Fair);
    assert_eq!(FpsBand::of(30), FpsBand::Fair);
    assert_eq!(FpsBand::of(29), FpsBand::Poor);
    assert_eq!(FpsBand::Good.css_color(), "#4ade80");
    assert_eq!(FpsBand::Poor.css_color(), "#ef4444");
}

#[test]
fn formatting_helpers() {
    assert_eq!(format_thousands(0), "0");
    assert_eq!(format_thousands(999), "999");
    assert_eq!(format_thousands(1000), "1,000");
    assert_eq!(format_thousands(1_234_567), "1,234,567");
    assert_eq!(heap_megabytes(52_428_800.0), 50);
    assert_eq!(heap_megabytes(0.0), 0);
    assert_eq!(triangle_count(Some(300), 1000), 100);
    assert_eq!(triangle_count(None, 99), 33);
}
