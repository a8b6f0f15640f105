use escapescope_core::{
    Complex, Evaluator, FormulaKind, IterationParams, SampleResult, ViewportState,
};

/// Evaluate the centre of every pixel of a viewport into a flat Vec.
fn render_grid(evaluator: &Evaluator, viewport: &ViewportState) -> Vec<SampleResult> {
    let mut results = Vec::with_capacity((viewport.width * viewport.height) as usize);
    for py in 0..viewport.height {
        for px in 0..viewport.width {
            results.push(evaluator.evaluate(viewport.pixel_center(px, py)));
        }
    }
    results
}

fn count_interior(results: &[SampleResult]) -> usize {
    results.iter().filter(|r| r.is_interior()).count()
}

#[test]
fn headless_mandelbrot_render() {
    let params = IterationParams::new(2.0, 256.0, 256).unwrap();
    let evaluator = Evaluator::new(FormulaKind::Mandelbrot, params).unwrap();
    let viewport = ViewportState::default_mandelbrot(100, 100);

    let results = render_grid(&evaluator, &viewport);
    assert_eq!(results.len(), 100 * 100);

    let interior = count_interior(&results);
    assert!(interior > 0, "should have some interior points");
    assert!(interior < 10_000, "should have some escaped points");
    for r in &results {
        if let SampleResult::Escaped { smooth } = r {
            assert!(smooth.is_finite() && *smooth >= 0.0);
        }
    }
}

#[test]
fn headless_render_is_deterministic() {
    let evaluator = Evaluator::new(FormulaKind::Mandelbrot, IterationParams::default()).unwrap();
    let viewport = ViewportState::default_mandelbrot(80, 60);

    let run1 = render_grid(&evaluator, &viewport);
    let run2 = render_grid(&evaluator, &viewport);

    assert_eq!(
        run1, run2,
        "two identical renders must produce identical results"
    );
}

#[test]
fn headless_julia_render() {
    let params = IterationParams {
        // Douady rabbit: the filled set has a large interior.
        seed: Complex::new(-0.123, 0.745),
        ..IterationParams::default()
    };
    let evaluator = Evaluator::new(FormulaKind::Julia, params).unwrap();
    let viewport = ViewportState::default_julia(100, 100);

    let results = render_grid(&evaluator, &viewport);
    assert_eq!(results.len(), 10_000);

    let interior = count_interior(&results);
    assert!(interior > 0, "should have some interior points");
    assert!(interior < 10_000, "should have some escaped points");
}

#[test]
fn every_formula_renders_a_mixed_frame() {
    // Wide views that contain both bounded and escaping orbits.
    let cases = [
        (FormulaKind::Tricorn, Complex::ZERO, false),
        (FormulaKind::BurningShip, Complex::new(-0.5, -0.5), false),
        (FormulaKind::MagnetType1, Complex::new(1.5, 0.5), true),
        (FormulaKind::MagnetType2, Complex::new(1.5, 0.5), true),
    ];
    for (formula, seed, julia_mode) in cases {
        let params = IterationParams {
            julia_mode,
            seed: if julia_mode { seed } else { Complex::ZERO },
            ..IterationParams::default()
        };
        let evaluator = Evaluator::new(formula, params).unwrap();
        let viewport = if julia_mode {
            ViewportState::default_julia(60, 60)
        } else {
            ViewportState::new(seed, 0.2, 60, 60).unwrap()
        };
        let results = render_grid(&evaluator, &viewport);
        let escaped = results.len() - count_interior(&results);
        assert!(escaped > 0, "{formula}: nothing escaped");
    }
}

#[test]
fn picked_seed_drives_companion_view() {
    // Pick a point in parameter space, open the Julia view there.
    let parameter_view = ViewportState::default_mandelbrot(200, 200);
    let (px, py) = parameter_view.plane_to_screen(Complex::new(-0.12, 0.74));
    let handoff = parameter_view.pick(px, py);
    assert!((handoff.seed - Complex::new(-0.12, 0.74)).norm() < 1e-12);

    let julia_params = handoff.apply(IterationParams::default());
    let julia = Evaluator::new(FormulaKind::Mandelbrot, julia_params).unwrap();
    let mandelbrot = Evaluator::new(FormulaKind::Mandelbrot, IterationParams::default()).unwrap();

    // The Julia orbit of 0 is the Mandelbrot orbit of the picked point.
    assert_eq!(
        julia.evaluate(Complex::ZERO),
        mandelbrot.evaluate(handoff.seed)
    );
    let companion = ViewportState::default_julia(200, 200);
    assert_eq!(companion.center, Complex::ZERO);
}

#[test]
fn zooming_in_on_the_boundary_keeps_both_classes() {
    let evaluator = Evaluator::new(
        FormulaKind::Mandelbrot,
        IterationParams::default().with_max_iterations(500),
    )
    .unwrap();
    // Seahorse valley.
    let mut viewport = ViewportState::new(Complex::new(-0.745, 0.1), 20.0, 64, 64).unwrap();
    for _ in 0..10 {
        viewport = viewport.zoomed_at(32.0, 32.0, -1.0);
    }
    let results = render_grid(&evaluator, &viewport);
    let interior = count_interior(&results);
    assert!(interior > 0 && interior < results.len());
}
