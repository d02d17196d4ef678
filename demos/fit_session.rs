//! Example of driving a fit session the way an interactive profile viewer would.
//!
//! Two peaks are seeded from dragged boxes, one width is locked, the fit runs
//! on the rayon pool, and an edit made while a second fit is in flight shows
//! the stale result being discarded.
//!
//! Run with `RUST_LOG=specfit_rs=debug` to see the optimizer iterations.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use specfit_rs::models::{Continuum, ContinuumOrder, GaussianPeak, ProfileModel};
use specfit_rs::session::{CursorTarget, FittingSession};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Fit session example");
    println!("===================\n");

    // Two lines on a sloped continuum
    let truth = ProfileModel::new(
        Continuum::first_order(0.5, 0.05),
        vec![GaussianPeak::new(8.0, 3.0, 0.8), GaussianPeak::new(4.0, 6.5, 1.2)],
    );
    let x: Vec<f64> = (0..400).map(|i| i as f64 * 0.025).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let noise = Normal::new(0.0, 0.1)?;
    let y: Vec<f32> = x
        .iter()
        .map(|&v| (truth.value_at(v) + noise.sample(&mut rng)) as f32)
        .collect();

    let mut session = FittingSession::new();
    session.set_component_count(2, true);

    // Drag a box over each line
    session.set_selected_index(0)?;
    session.start_cursor_selection(CursorTarget::Component);
    session.set_component_from_box(2.5, 3.5, 0.5, 8.0)?;
    session.set_selected_index(1)?;
    session.start_cursor_selection(CursorTarget::Component);
    session.set_component_from_box(5.8, 7.2, 0.8, 4.5)?;
    session.set_locked_fwhm(1, true)?;

    session.set_continuum(ContinuumOrder::FirstOrder);
    session.set_intercept(0.5);

    for plot_box in session.component_plotting_boxes() {
        println!(
            "guess box x = [{:.2}, {:.2}], y = [{:.2}, {:.2}]{}",
            plot_box.x_min,
            plot_box.x_max,
            plot_box.y_min,
            plot_box.y_max,
            if plot_box.selected { " (selected)" } else { "" }
        );
    }
    println!("ready to fit: {}\n", session.ready_to_fit());

    let handle = session.prepare_fit(&x, &y)?.spawn();
    session.apply_outcome(handle.wait())?;

    println!("{}", session.result_summary());
    println!("Fit log:\n{}", session.result_log());

    // An edit while a fit is outstanding makes its result stale
    session.set_locked_fwhm(1, false)?;
    let handle = session.prepare_fit(&x, &y)?.spawn();
    session.set_center(1, 6.4)?;
    match session.apply_outcome(handle.wait()) {
        Ok(()) => println!("unexpectedly applied a stale result"),
        Err(e) => println!("second fit discarded: {}", e),
    }

    session.fit(&x, &y)?;
    let curve = session.fitted_curve_samples(&[3.0, 6.5]);
    for (xi, yi) in curve {
        println!("model({:.2}) = {:.4}", xi, yi);
    }

    Ok(())
}
