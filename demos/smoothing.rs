//! Example of the signal conditioning filters on a noisy profile.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use specfit_rs::filters::Filter;
use specfit_rs::models::{Continuum, GaussianPeak, ProfileModel};
use tracing_subscriber::EnvFilter;

fn rms(a: &[f64], b: &[f64]) -> f64 {
    let sum: f64 = a.iter().zip(b).map(|(u, v)| (u - v).powi(2)).sum();
    (sum / a.len() as f64).sqrt()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Smoothing example");
    println!("=================\n");

    let truth = ProfileModel::new(
        Continuum::zeroth_order(1.0),
        vec![GaussianPeak::new(5.0, 5.0, 1.5)],
    );
    let x: Vec<f64> = (0..501).map(|i| i as f64 * 0.02).collect();
    let clean = truth.eval(&x);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.3)?;
    let noisy: Vec<f64> = clean.iter().map(|&v| v + noise.sample(&mut rng)).collect();

    println!("{:<16} {:>8} {:>10}", "filter", "samples", "rms error");
    println!("{:<16} {:>8} {:>10.4}", "raw", noisy.len(), rms(&noisy, &clean));

    let smoothing = [
        ("boxcar", Filter::Boxcar { kernel: 11 }),
        ("gaussian", Filter::Gaussian { kernel: 21, alpha: 2.5 }),
        ("hanning", Filter::Hanning { kernel: 15 }),
        ("savitzky-golay", Filter::SavitzkyGolay { kernel: 31, order: 4 }),
    ];
    for (name, filter) in smoothing {
        let out = filter.apply(&x, &noisy);
        println!("{:<16} {:>8} {:>10.4}", name, out.len(), rms(&out.y, &clean));
    }

    for (name, filter) in [
        ("decimation", Filter::Decimation { width: 10 }),
        ("binning", Filter::Binning { width: 10 }),
    ] {
        let out = filter.apply(&x, &noisy);
        println!("{:<16} {:>8}", name, out.len());
    }

    // Rejected settings come back empty
    let rejected = Filter::SavitzkyGolay { kernel: 5, order: 5 };
    if let Err(e) = rejected.validate() {
        println!("\n{:?} rejected: {}", rejected, e);
    }
    assert!(rejected.apply(&x, &noisy).is_empty());

    Ok(())
}
