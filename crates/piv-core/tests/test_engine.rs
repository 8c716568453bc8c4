mod common;

use approx::assert_abs_diff_eq;
use common::{particle_frame, uniform_frame};
use ndarray::s;
use piv_core::engine::{compute_flow, EngineState, MaskConfig, PivConfig, PivEngine};
use piv_core::error::PivError;
use piv_core::frame::Frame;
use piv_core::grid::{Rect, WindowSize};

#[test]
fn identical_frames_yield_zero_flow_with_full_confidence() {
    let frame = particle_frame(128, 128, 42, 0.0, 0.0);
    let config = PivConfig {
        window: WindowSize::W16,
        ..Default::default()
    };

    let out = compute_flow(&frame, &frame.clone(), &config).unwrap();
    let field = &out.field;
    assert_eq!((field.rows(), field.cols()), (8, 8));
    assert_eq!(out.color.dimensions(), (8, 8));

    for r in 0..field.rows() {
        for c in 0..field.cols() {
            assert!(field.u[[r, c]].abs() < 0.01, "u[{},{}]", r, c);
            assert!(field.v[[r, c]].abs() < 0.01, "v[{},{}]", r, c);
            assert!(field.peak[[r, c]] > 0.95, "peak[{},{}]", r, c);
        }
    }
}

#[test]
fn integer_translation_is_recovered_for_interior_tiles() {
    let a = particle_frame(128, 128, 11, 0.0, 0.0);
    let b = particle_frame(128, 128, 11, 3.0, -2.0);

    for interpolate in [false, true] {
        let config = PivConfig {
            window: WindowSize::W16,
            interpolate,
            ..Default::default()
        };
        let out = compute_flow(&a, &b, &config).unwrap();
        let field = &out.field;

        for r in 1..field.rows() - 1 {
            for c in 1..field.cols() - 1 {
                assert_abs_diff_eq!(field.u[[r, c]], 3.0, epsilon = 0.35);
                assert_abs_diff_eq!(field.v[[r, c]], -2.0, epsilon = 0.35);
            }
        }
    }
}

#[test]
fn subpixel_translation_requires_interpolation() {
    let a = particle_frame(128, 128, 23, 0.0, 0.0);
    let b = particle_frame(128, 128, 23, 2.3, -1.7);

    let mut config = PivConfig {
        window: WindowSize::W32,
        interpolate: true,
        ..Default::default()
    };
    let out = compute_flow(&a, &b, &config).unwrap();
    for r in 1..3 {
        for c in 1..3 {
            assert_abs_diff_eq!(out.field.u[[r, c]], 2.3, epsilon = 0.15);
            assert_abs_diff_eq!(out.field.v[[r, c]], -1.7, epsilon = 0.15);
        }
    }

    config.interpolate = false;
    let out = compute_flow(&a, &b, &config).unwrap();
    for r in 1..3 {
        for c in 1..3 {
            // Without refinement the estimate is the nearest integer.
            assert_eq!(out.field.u[[r, c]], 2.0);
            assert_eq!(out.field.v[[r, c]], -2.0);
        }
    }
}

#[test]
fn uniform_frames_complete_with_no_signal() {
    let a = uniform_frame(64, 64, 0.5);
    let b = uniform_frame(64, 64, 0.5);

    let out = compute_flow(&a, &b, &PivConfig::default()).unwrap();
    for ((&u, &v), &peak) in out
        .field
        .u
        .iter()
        .zip(out.field.v.iter())
        .zip(out.field.peak.iter())
    {
        assert_eq!((u, v, peak), (0.0, 0.0, 0.0));
    }
}

#[test]
fn mismatched_dimensions_fail_the_engine() {
    let a = uniform_frame(64, 64, 0.5);
    let b = uniform_frame(64, 48, 0.5);

    let mut engine = PivEngine::new();
    let err = engine.configure(a, b, PivConfig::default()).unwrap_err();
    assert!(matches!(err, PivError::DimensionMismatch { .. }));
    assert_eq!(engine.state(), EngineState::Failed);
    assert!(engine.outputs().is_none());
    assert_eq!(engine.failure(), Some(&err));

    // The failure is sticky until the engine is reconfigured.
    assert_eq!(engine.run().unwrap_err(), err);
    assert_eq!(engine.state(), EngineState::Failed);
}

#[test]
fn oversized_window_fails_configure() {
    let a = uniform_frame(32, 32, 0.5);
    let b = uniform_frame(32, 32, 0.5);

    let mut engine = PivEngine::new();
    let config = PivConfig {
        window: WindowSize::W64,
        ..Default::default()
    };
    let err = engine.configure(a, b, config).unwrap_err();
    assert!(matches!(err, PivError::InvalidWindowSize { .. }));
    assert_eq!(engine.state(), EngineState::Failed);
}

#[test]
fn engine_lifecycle_and_recompute() {
    let a = particle_frame(64, 64, 3, 0.0, 0.0);
    let b = particle_frame(64, 64, 3, 1.0, 0.0);

    let mut engine = PivEngine::new();
    assert_eq!(engine.state(), EngineState::Unconfigured);
    assert!(engine.outputs().is_none());

    engine
        .configure(a.clone(), b.clone(), PivConfig::default())
        .unwrap();
    assert_eq!(engine.state(), EngineState::Configured);

    engine.run().unwrap();
    assert_eq!(engine.state(), EngineState::Completed);
    let field = &engine.outputs().unwrap().field;
    assert_eq!((field.rows(), field.cols()), (4, 4));

    // Running again from the completed state recomputes.
    engine.run().unwrap();
    assert_eq!(engine.state(), EngineState::Completed);

    // Reconfiguring discards the previous artifacts.
    engine.configure(a, b, PivConfig::default()).unwrap();
    assert_eq!(engine.state(), EngineState::Configured);
    assert!(engine.outputs().is_none());
}

#[test]
fn run_on_an_unconfigured_engine_is_an_error() {
    let mut engine = PivEngine::new();
    let err = engine.run().unwrap_err();
    assert!(matches!(err, PivError::InternalComputation(_)));
    assert_eq!(engine.state(), EngineState::Unconfigured);
}

#[test]
fn abort_cancels_the_run() {
    let a = particle_frame(128, 128, 17, 0.0, 0.0);
    let b = particle_frame(128, 128, 17, 2.0, 0.0);

    let mut engine = PivEngine::new();
    engine
        .configure(a.clone(), b.clone(), PivConfig::default())
        .unwrap();

    let handle = engine.abort_handle();
    handle.abort();
    assert_eq!(engine.run().unwrap_err(), PivError::Cancelled);
    assert_eq!(engine.state(), EngineState::Failed);
    assert!(engine.outputs().is_none());

    // Reconfiguring clears the abort flag and the failure.
    engine.configure(a, b, PivConfig::default()).unwrap();
    engine.run().unwrap();
    assert_eq!(engine.state(), EngineState::Completed);
}

#[test]
fn roi_restricts_analysis_to_covered_tiles() {
    let a = particle_frame(128, 128, 29, 0.0, 0.0);
    let b = particle_frame(128, 128, 29, 3.0, 0.0);

    let config = PivConfig {
        window: WindowSize::W16,
        roi: Some(Rect {
            x: 0,
            y: 0,
            width: 64,
            height: 128,
        }),
        ..Default::default()
    };
    let out = compute_flow(&a, &b, &config).unwrap();
    let field = &out.field;

    // Tiles centered inside the ROI carry the flow.
    for r in 1..7 {
        for c in 1..=3 {
            assert_abs_diff_eq!(field.u[[r, c]], 3.0, epsilon = 0.35);
        }
    }
    // Tiles centered outside yield no signal, and the grid keeps its shape.
    assert_eq!((field.rows(), field.cols()), (8, 8));
    for r in 0..8 {
        for c in 4..8 {
            assert_eq!(field.u[[r, c]], 0.0);
            assert_eq!(field.v[[r, c]], 0.0);
            assert_eq!(field.peak[[r, c]], 0.0);
        }
    }
}

#[test]
fn masking_zeroes_low_confidence_vectors() {
    // Texture on the left half only; the right half has no signal.
    let half_textured = |seed: u64, dx: f64| -> Frame {
        let mut frame = particle_frame(128, 128, seed, dx, 0.0);
        frame.data.slice_mut(s![.., 64..]).fill(0.3);
        frame
    };
    let a = half_textured(31, 0.0);
    let b = half_textured(31, 2.0);

    let config = PivConfig {
        window: WindowSize::W16,
        mask: Some(MaskConfig { level: 0.5 }),
        ..Default::default()
    };
    let out = compute_flow(&a, &b, &config).unwrap();
    let field = &out.field;

    // Textured interior tiles keep their vectors.
    for r in 1..7 {
        for c in 1..=2 {
            assert_abs_diff_eq!(field.u[[r, c]], 2.0, epsilon = 0.35);
        }
    }
    // Degenerate right-half tiles are zero with zero confidence.
    for r in 0..8 {
        for c in 5..8 {
            assert_eq!(field.u[[r, c]], 0.0);
            assert_eq!(field.peak[[r, c]], 0.0);
        }
    }
}
