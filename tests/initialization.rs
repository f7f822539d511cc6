//! Initialization scaling tests.
//!
//! With unit-variance inputs the initial layer should produce outputs of
//! roughly unit variance whatever `input_dim` and `grid_size` are.
//!
//! Two views of "output variance" are checked:
//! - across the output coordinates of one sample (what a stacked layer sees);
//! - across samples for one output coordinate.
//!
//! Both must stay within ±50% of 1 for either init policy. The second sits
//! lower for smooth init (~0.7): almost all of its energy is at frequency 1,
//! and `Var[cos(x)]` is only ~0.2 for `x ~ N(0, 1)`.

use fourier_kan::{Component, FourierKanLayer, LayerConfig, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;

const INPUT_DIM: usize = 50;
const OUTPUT_DIM: usize = 100;
const GRID_SIZE: usize = 300;
const SAMPLES: usize = 2000;

fn make_layer(smooth: bool, seed: u64) -> FourierKanLayer {
    let config = LayerConfig::builder()
        .input_dim(INPUT_DIM)
        .output_dim(OUTPUT_DIM)
        .grid_size(GRID_SIZE)
        .smooth_init(smooth)
        .seed(seed)
        .build()
        .unwrap();
    FourierKanLayer::new(config).unwrap()
}

/// Unbiased variance of each output coordinate across the batch rows.
fn per_coordinate_variance(y: &Tensor) -> Vec<f64> {
    let d = y.last_dim().unwrap();
    let rows = y.batch_rows();
    (0..d)
        .map(|j| {
            let col: Vec<f64> = y.as_slice()[j..].iter().step_by(d).map(|&v| v as f64).collect();
            debug_assert_eq!(col.len(), rows);
            let m = col.iter().sum::<f64>() / rows as f64;
            col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (rows - 1) as f64
        })
        .collect()
}

#[test]
fn test_coefficient_scaling() {
    let layer = make_layer(false, 1);
    let coeffs = layer.coefficients();
    let var = coeffs.iter().map(|&c| (c as f64).powi(2)).sum::<f64>() / coeffs.len() as f64;
    let expected = 1.0 / (INPUT_DIM * GRID_SIZE) as f64;
    assert!(
        (var / expected - 1.0).abs() < 0.05,
        "coefficient variance {} vs {}",
        var,
        expected
    );

    // Smooth: frequency index f is attenuated by (f + 1)^2
    let layer = make_layer(true, 2);
    for f in [0usize, 1, 3] {
        let mut sum = 0.0f64;
        let mut n = 0usize;
        for component in [Component::Cos, Component::Sin] {
            for j in 0..OUTPUT_DIM {
                for i in 0..INPUT_DIM {
                    sum += (layer.coeff(component, j, i, f) as f64).powi(2);
                    n += 1;
                }
            }
        }
        let norm = ((f + 1) * (f + 1)) as f64;
        let expected = 1.0 / (INPUT_DIM as f64 * norm * norm);
        let var = sum / n as f64;
        assert!(
            (var / expected - 1.0).abs() < 0.1,
            "f={}: coefficient variance {} vs {}",
            f,
            var,
            expected
        );
    }
}

#[test]
fn test_variance_across_outputs() {
    for smooth in [false, true] {
        let layer = make_layer(smooth, 10);
        let mut rng = StdRng::seed_from_u64(100);
        let x = Tensor::randn(vec![32, INPUT_DIM], &mut rng);
        let y = layer.forward(&x).unwrap();

        let var = y.mean_last_axis_variance();
        assert!(
            (0.5..=1.5).contains(&var),
            "smooth_init={}: mean per-sample variance {}",
            smooth,
            var
        );
        assert!(y.mean().abs() < 0.5, "smooth_init={}: mean {}", smooth, y.mean());
        println!("✓ smooth_init={} var across outputs = {:.3}", smooth, var);
    }
}

#[test]
fn test_variance_per_output_coordinate() {
    for smooth in [false, true] {
        let layer = make_layer(smooth, 20);
        let mut rng = StdRng::seed_from_u64(200);
        let x = Tensor::randn(vec![SAMPLES, INPUT_DIM], &mut rng);
        let y = layer.forward(&x).unwrap();

        let vars = per_coordinate_variance(&y);
        let mean_var = vars.iter().sum::<f64>() / vars.len() as f64;
        assert!(
            (0.5..=1.5).contains(&mean_var),
            "smooth_init={}: average coordinate variance {}",
            smooth,
            mean_var
        );

        for (j, v) in vars.iter().enumerate() {
            assert!(
                (0.5..=1.5).contains(v),
                "smooth_init={}: output {} variance {}",
                smooth,
                j,
                v
            );
        }
        println!(
            "✓ smooth_init={} per-coordinate variance mean = {:.3}",
            smooth, mean_var
        );
    }
}

#[test]
fn test_variance_independent_of_dimensions() {
    let mut rng = StdRng::seed_from_u64(300);
    for &(in_dim, grid) in &[(4usize, 4usize), (16, 64), (128, 8)] {
        let config = LayerConfig::builder()
            .input_dim(in_dim)
            .output_dim(200)
            .grid_size(grid)
            .seed(in_dim as u64)
            .build()
            .unwrap();
        let layer = FourierKanLayer::new(config).unwrap();
        let x = Tensor::randn(vec![16, in_dim], &mut rng);
        let var = layer.forward(&x).unwrap().mean_last_axis_variance();
        assert!(
            (0.5..=1.5).contains(&var),
            "in_dim={} grid={}: variance {}",
            in_dim,
            grid,
            var
        );
    }
}
