//! Fourier basis evaluation and the fused contraction kernel.
//!
//! For an input coordinate `x` and retained frequencies `k₀ … k_{G-1}` the
//! basis is the pair of vectors
//!
//! $$c_f = \cos(k_f x), \qquad s_f = \sin(k_f x)$$
//!
//! Both stay in `[-1, 1]` for every finite `x`, so a layer's output is
//! bounded by its coefficient magnitudes no matter how large the input grows.
//! Inputs are never clamped or wrapped.
//!
//! # Example
//!
//! ```rust
//! use fourier_kan::basis::compute_basis;
//!
//! let freqs = [1.0f32, 2.0, 3.0];
//! let mut cos = [0.0f32; 3];
//! let mut sin = [0.0f32; 3];
//! compute_basis(0.0, &freqs, &mut cos, &mut sin);
//!
//! assert_eq!(cos, [1.0, 1.0, 1.0]);
//! assert_eq!(sin, [0.0, 0.0, 0.0]);
//! ```

use wide::f32x8;

/// Computes `cos(k·x)` and `sin(k·x)` for every frequency `k`.
///
/// # Panics
///
/// Debug-asserts that both output slices match `freqs.len()`.
#[inline]
pub fn compute_basis(x: f32, freqs: &[f32], cos_out: &mut [f32], sin_out: &mut [f32]) {
    debug_assert_eq!(cos_out.len(), freqs.len());
    debug_assert_eq!(sin_out.len(), freqs.len());

    for ((k, c), s) in freqs.iter().zip(cos_out.iter_mut()).zip(sin_out.iter_mut()) {
        let (sv, cv) = (k * x).sin_cos();
        *c = cv;
        *s = sv;
    }
}

/// Computes the basis for a whole input row.
///
/// Output layout is `[input_dim][grid_size]`, matching the trailing two axes
/// of the coefficient tensor so the contraction reads both contiguously.
pub fn compute_basis_row(input: &[f32], freqs: &[f32], cos_out: &mut [f32], sin_out: &mut [f32]) {
    let g = freqs.len();
    debug_assert_eq!(cos_out.len(), input.len() * g);
    debug_assert_eq!(sin_out.len(), input.len() * g);

    for ((x, c), s) in input
        .iter()
        .zip(cos_out.chunks_exact_mut(g))
        .zip(sin_out.chunks_exact_mut(g))
    {
        compute_basis(*x, freqs, c, s);
    }
}

/// Computes the basis and its derivative with respect to `x`.
///
/// `d/dx cos(kx) = -k sin(kx)` and `d/dx sin(kx) = k cos(kx)`, so the
/// derivative rows are written alongside the values.
pub fn compute_basis_and_deriv(
    x: f32,
    freqs: &[f32],
    cos_out: &mut [f32],
    sin_out: &mut [f32],
    dcos_out: &mut [f32],
    dsin_out: &mut [f32],
) {
    compute_basis(x, freqs, cos_out, sin_out);
    for (f, k) in freqs.iter().enumerate() {
        dcos_out[f] = -k * sin_out[f];
        dsin_out[f] = k * cos_out[f];
    }
}

/// Fused multiply-accumulate of one basis row against one coefficient row.
///
/// Returns `Σ cos[n]·cc[n] + sin[n]·sc[n]`. All four slices must have the
/// same length; the bulk runs 8 lanes wide with a scalar tail.
#[inline]
pub fn fourier_dot(cos: &[f32], sin: &[f32], cos_coeff: &[f32], sin_coeff: &[f32]) -> f32 {
    let n = cos.len();
    debug_assert_eq!(sin.len(), n);
    debug_assert_eq!(cos_coeff.len(), n);
    debug_assert_eq!(sin_coeff.len(), n);

    let chunks = n / 8;
    let mut acc = f32x8::splat(0.0);
    for chunk in 0..chunks {
        let base = chunk * 8;
        acc += load8(&cos[base..]) * load8(&cos_coeff[base..])
            + load8(&sin[base..]) * load8(&sin_coeff[base..]);
    }

    let lanes: [f32; 8] = acc.into();
    let mut sum: f32 = lanes.iter().sum();

    for t in chunks * 8..n {
        sum += cos[t] * cos_coeff[t] + sin[t] * sin_coeff[t];
    }
    sum
}

#[inline(always)]
fn load8(s: &[f32]) -> f32x8 {
    f32x8::new([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_basis_values() {
        let freqs = [1.0f32, 2.0];
        let mut cos = [0.0f32; 2];
        let mut sin = [0.0f32; 2];
        compute_basis(PI / 2.0, &freqs, &mut cos, &mut sin);

        assert!(cos[0].abs() < 1e-6);
        assert!((sin[0] - 1.0).abs() < 1e-6);
        assert!((cos[1] + 1.0).abs() < 1e-6);
        assert!(sin[1].abs() < 1e-6);
    }

    #[test]
    fn test_zero_frequency_is_constant() {
        let freqs = [0.0f32];
        let mut cos = [0.0f32; 1];
        let mut sin = [0.0f32; 1];
        for x in [-100.0f32, -1.0, 0.0, 3.5, 1e6] {
            compute_basis(x, &freqs, &mut cos, &mut sin);
            assert_eq!(cos[0], 1.0);
            assert_eq!(sin[0], 0.0);
        }
    }

    #[test]
    fn test_basis_bounded_for_large_inputs() {
        let freqs: Vec<f32> = (1..=16).map(|k| k as f32).collect();
        let mut cos = vec![0.0f32; 16];
        let mut sin = vec![0.0f32; 16];
        for x in [1e3f32, -1e5, 1e8, 3.0e30] {
            compute_basis(x, &freqs, &mut cos, &mut sin);
            for v in cos.iter().chain(sin.iter()) {
                assert!(v.abs() <= 1.0, "basis value {} out of range at x={}", v, x);
            }
        }
    }

    #[test]
    fn test_nan_propagates() {
        let freqs = [1.0f32, 2.0];
        let mut cos = [0.0f32; 2];
        let mut sin = [0.0f32; 2];
        compute_basis(f32::NAN, &freqs, &mut cos, &mut sin);
        assert!(cos.iter().chain(sin.iter()).all(|v| v.is_nan()));
    }

    #[test]
    fn test_basis_row_layout() {
        let freqs = [1.0f32, 2.0, 3.0];
        let input = [0.3f32, -1.2];
        let mut cos = vec![0.0f32; 6];
        let mut sin = vec![0.0f32; 6];
        compute_basis_row(&input, &freqs, &mut cos, &mut sin);

        for (i, x) in input.iter().enumerate() {
            for (f, k) in freqs.iter().enumerate() {
                assert!((cos[i * 3 + f] - (k * x).cos()).abs() < 1e-6);
                assert!((sin[i * 3 + f] - (k * x).sin()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let freqs = [1.0f32, 2.0, 5.0];
        let x = 0.7f32;
        let h = 1e-3f32;
        let mut c = [0.0f32; 3];
        let mut s = [0.0f32; 3];
        let mut dc = [0.0f32; 3];
        let mut ds = [0.0f32; 3];
        compute_basis_and_deriv(x, &freqs, &mut c, &mut s, &mut dc, &mut ds);

        for (f, k) in freqs.iter().enumerate() {
            let num_dc = (((x + h) * k).cos() - ((x - h) * k).cos()) / (2.0 * h);
            let num_ds = (((x + h) * k).sin() - ((x - h) * k).sin()) / (2.0 * h);
            assert!((dc[f] - num_dc).abs() < 1e-2, "dcos k={}", k);
            assert!((ds[f] - num_ds).abs() < 1e-2, "dsin k={}", k);
        }
    }

    #[test]
    fn test_fourier_dot_matches_scalar() {
        // 19 = two full lanes plus a 3-element tail
        let n = 19;
        let cos: Vec<f32> = (0..n).map(|i| (i as f32 * 0.37).cos()).collect();
        let sin: Vec<f32> = (0..n).map(|i| (i as f32 * 0.37).sin()).collect();
        let cc: Vec<f32> = (0..n).map(|i| 0.1 * i as f32 - 0.5).collect();
        let sc: Vec<f32> = (0..n).map(|i| 0.05 * (n - i) as f32).collect();

        let expected: f32 = (0..n).map(|t| cos[t] * cc[t] + sin[t] * sc[t]).sum();
        let got = fourier_dot(&cos, &sin, &cc, &sc);
        assert!((got - expected).abs() < 1e-5, "{} vs {}", got, expected);
    }

    #[test]
    fn test_fourier_dot_empty() {
        assert_eq!(fourier_dot(&[], &[], &[], &[]), 0.0);
    }
}
