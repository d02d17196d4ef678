//! Output-length contracts of the filters.

use specfit_rs::filters::{
    bin, boxcar_smooth, decimate, gaussian_smooth, hanning_smooth, savitzky_golay_smooth, Filter,
};

use crate::test_helpers::linspace;

fn profile(n: usize) -> (Vec<f64>, Vec<f64>) {
    let x = linspace(0.0, 1.0, n);
    let y = x.iter().map(|v| (7.0 * v).sin()).collect();
    (x, y)
}

#[test]
fn test_smoothing_preserves_length() {
    for n in [1, 2, 5, 17, 64] {
        let (x, y) = profile(n);
        for kernel in [1, 2, 3, 6, 9] {
            assert_eq!(boxcar_smooth(&y, kernel).len(), n);
            assert_eq!(gaussian_smooth(&y, kernel, 2.0).len(), n);
            assert_eq!(hanning_smooth(&y, kernel).len(), n);
            assert_eq!(savitzky_golay_smooth(&x, &y, kernel, 0).len(), n);
        }
        assert_eq!(savitzky_golay_smooth(&x, &y, 9, 3).len(), n);
    }
}

#[test]
fn test_binning_length() {
    for n in 1..40 {
        let (_, y) = profile(n);
        for width in 1..7 {
            assert_eq!(bin(&y, width).len(), n.div_ceil(width), "n={n} width={width}");
        }
    }
}

#[test]
fn test_decimation_length_parity() {
    for n in 1..40 {
        let (x, y) = profile(n);
        for width in 1..7 {
            let expected = if n % width == 1 {
                2 * n.div_ceil(width) - 1
            } else {
                2 * n.div_ceil(width)
            };
            let out = decimate(&x, &y, width);
            assert_eq!(out.len(), expected, "n={n} width={width}");
            assert_eq!(out.x.len(), out.y.len());
            assert!(out.x.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

#[test]
fn test_savitzky_golay_degeneracy() {
    let (x, y) = profile(32);
    for kernel in 1..8 {
        for order in kernel..kernel + 3 {
            assert!(savitzky_golay_smooth(&x, &y, kernel, order).is_empty());
            assert!(Filter::SavitzkyGolay { kernel, order }.apply(&x, &y).is_empty());
        }
    }
}

#[test]
fn test_invalid_input_fails_closed() {
    let (x, y) = profile(10);
    let empty: Vec<f64> = Vec::new();

    assert!(boxcar_smooth(&empty, 3).is_empty());
    assert!(gaussian_smooth(&y, 0, 1.0).is_empty());
    assert!(bin(&y, 0).is_empty());
    assert!(decimate(&x, &y, 0).is_empty());
    assert!(decimate(&x[..9], &y, 2).is_empty());
    assert!(Filter::Boxcar { kernel: 3 }.apply(&x[..9], &y).is_empty());
}
