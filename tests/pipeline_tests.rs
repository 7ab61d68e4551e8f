// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the effect controller and session lifecycle

use std::sync::Arc;
use std::time::Duration;
use viewfinder::config::PipelineConfig;
use viewfinder::controller::{EffectController, FrameOutcome, Gate};
use viewfinder::effects::{EffectCatalog, SourceBinding};
use viewfinder::frame::{FrameBufferView, Resolution};
use viewfinder::session::{SessionCoordinator, SessionState};
use viewfinder::sources::{NullSink, TestPatternSource};

fn controller() -> EffectController {
    controller_with(PipelineConfig::default())
}

fn controller_with(config: PipelineConfig) -> EffectController {
    EffectController::new(Arc::new(Gate::new()), EffectCatalog::builtin(), config)
}

fn activate(controller: &EffectController, width: u32, height: u32) {
    controller.activate(SourceBinding {
        resolution: Resolution::new(width, height),
    });
}

fn gradient_frame(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 16) as u8, (y * 16) as u8, 128, 255]);
        }
    }
    data
}

#[test]
fn test_default_effect_is_first_entry() {
    let controller = controller();
    assert_eq!(controller.current_index(), 0);
    assert!(controller.current_effect_name().starts_with("1/15"));
}

#[test]
fn test_navigation_wraps_around_in_both_directions() {
    let controller = controller();
    activate(&controller, 8, 8);
    let start = controller.current_effect_name().to_string();

    let count = controller.catalog().len();
    for _ in 0..count {
        assert!(controller.next_effect().is_some());
    }
    assert_eq!(controller.current_effect_name(), start);

    // Previous is the exact inverse
    let back = controller.previous_effect().map(str::to_string);
    assert!(back.is_some_and(|name| name.starts_with("15/15")));
    assert!(controller.next_effect().is_some());
    assert_eq!(controller.current_effect_name(), start);
}

#[test]
fn test_idle_controller_leaves_frame_untouched() {
    let controller = controller();
    let mut data = gradient_frame(8, 8);
    let original = data.clone();

    let mut view = FrameBufferView::packed(&mut data, 8, 8).expect("valid view");
    let outcome = controller.process_frame(&mut view).expect("idle cannot fail");
    assert_eq!(outcome, FrameOutcome::Idle);
    assert_eq!(data, original);
}

#[test]
fn test_render_mutates_frame_in_place() {
    let controller = controller();
    activate(&controller, 8, 8);
    // Negative
    controller.select_effect(11).expect("gate free");

    let mut data = gradient_frame(8, 8);
    let original = data.clone();
    let mut view = FrameBufferView::packed(&mut data, 8, 8).expect("valid view");
    let outcome = controller.process_frame(&mut view).expect("render");
    assert_eq!(outcome, FrameOutcome::Rendered);
    assert_ne!(data, original);
}

#[test]
fn test_cache_resets_on_every_effect_switch() {
    let controller = controller();
    activate(&controller, 8, 8);
    // Cartoon populates the frame-derived cache
    controller.select_effect(12).expect("gate free");
    assert_eq!(controller.cache_entries(), Some(0));

    let mut data = gradient_frame(8, 8);
    {
        let mut view = FrameBufferView::packed(&mut data, 8, 8).expect("valid view");
        controller.process_frame(&mut view).expect("render");
    }
    let populated = controller.cache_entries().expect("slot active");
    assert!(populated > 0);

    // Switching away and back rebuilds the slot with an empty cache
    controller.next_effect().expect("gate free");
    controller.previous_effect().expect("gate free");
    assert_eq!(controller.cache_entries(), Some(0));
}

#[test]
fn test_frame_dropped_while_gate_held() {
    let gate = Arc::new(Gate::new());
    let config = PipelineConfig {
        frame_wait_ms: 10,
        ..PipelineConfig::default()
    };
    let controller = EffectController::new(Arc::clone(&gate), EffectCatalog::builtin(), config);
    activate(&controller, 8, 8);

    let mut data = gradient_frame(8, 8);
    let held = gate
        .acquire_timeout(Duration::from_millis(50))
        .expect("gate free");
    {
        let mut view = FrameBufferView::packed(&mut data, 8, 8).expect("valid view");
        let outcome = controller.process_frame(&mut view).expect("drop is not an error");
        assert_eq!(outcome, FrameOutcome::Dropped);
    }

    drop(held);
    let mut view = FrameBufferView::packed(&mut data, 8, 8).expect("valid view");
    let outcome = controller.process_frame(&mut view).expect("render");
    assert_eq!(outcome, FrameOutcome::Rendered);
}

#[test]
fn test_navigation_skipped_while_gate_held() {
    let gate = Arc::new(Gate::new());
    let config = PipelineConfig {
        nav_wait_ms: 10,
        ..PipelineConfig::default()
    };
    let controller = EffectController::new(Arc::clone(&gate), EffectCatalog::builtin(), config);
    activate(&controller, 8, 8);

    let _held = gate
        .acquire_timeout(Duration::from_millis(50))
        .expect("gate free");
    assert!(controller.next_effect().is_none());
    // The index did not move
    assert_eq!(controller.current_index(), 0);
}

#[test]
fn test_deactivate_is_idempotent() {
    let controller = controller();
    activate(&controller, 8, 8);
    controller.deactivate();
    controller.deactivate();
    assert_eq!(controller.cache_entries(), None);
}

#[test]
fn test_quantize_renders_through_public_engine() {
    // The same path the `apply --quantize` command takes
    use std::collections::HashMap;
    use viewfinder::engine::{EffectGraph, RenderEngine};
    use viewfinder::filters::QuantizeColorEffect;

    let mut data = gradient_frame(8, 8);
    let original = data.clone();
    let engine = RenderEngine::new(EffectGraph::Custom(Box::new(QuantizeColorEffect::new())));
    let mut cache = HashMap::new();

    let mut view = FrameBufferView::packed(&mut data, 8, 8).expect("valid view");
    engine.render(&mut view, &mut cache).expect("quantize");

    assert_ne!(data, original);
    assert!(!cache.is_empty(), "quantize should populate the color cache");
}

#[test]
fn test_session_delivers_frames_end_to_end() {
    let source =
        TestPatternSource::new().with_resolutions(vec![Resolution::new(64, 48)]);
    let (sink, stats) = NullSink::new();
    let mut session =
        SessionCoordinator::new(Box::new(source), Box::new(sink), PipelineConfig::default());
    session.set_viewport(800.0, 480.0);

    session.start().expect("session start");
    assert_eq!(session.state(), SessionState::Running);
    assert!(session.start().is_err());

    std::thread::sleep(Duration::from_millis(500));

    assert!(stats.frames_presented() > 0, "no frames reached the sink");
    assert_eq!(stats.frame_rate(), 30, "source rate was not relayed");
    assert!(session.focus(0.5, 0.5), "focus should succeed while idle");

    session.stop();
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert!(!stats.is_attached());

    // Stopping again is a no-op
    session.stop();
    assert_eq!(session.state(), SessionState::Uninitialized);
}

#[test]
fn test_session_navigation_while_frames_flow() {
    let source =
        TestPatternSource::new().with_resolutions(vec![Resolution::new(32, 32)]);
    let (sink, stats) = NullSink::new();
    let mut session =
        SessionCoordinator::new(Box::new(source), Box::new(sink), PipelineConfig::default());

    session.start().expect("session start");
    std::thread::sleep(Duration::from_millis(100));

    // Cycle the whole catalog under live delivery
    let count = session.controller().catalog().len();
    for _ in 0..count {
        assert!(session.controller().next_effect().is_some());
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(session.controller().current_effect_name().starts_with("1/15"));

    session.stop();
    assert!(stats.frames_presented() > 0);
}

#[test]
fn test_session_requires_preview_resolution() {
    let source = TestPatternSource::new().with_resolutions(vec![]);
    let (sink, _stats) = NullSink::new();
    let mut session =
        SessionCoordinator::new(Box::new(source), Box::new(sink), PipelineConfig::default());

    assert!(session.start().is_err());
    assert_eq!(session.state(), SessionState::Uninitialized);
}

#[test]
fn test_session_picks_highest_resolution() {
    // The synthetic source rejects open() at unsupported resolutions, so a
    // successful start proves the last list entry was chosen
    let source = TestPatternSource::new()
        .with_resolutions(vec![Resolution::new(16, 16), Resolution::new(32, 24)]);
    let (sink, stats) = NullSink::new();
    let mut session =
        SessionCoordinator::new(Box::new(source), Box::new(sink), PipelineConfig::default());

    session.start().expect("session start");
    std::thread::sleep(Duration::from_millis(200));
    session.stop();
    assert!(stats.frames_presented() > 0);
}
