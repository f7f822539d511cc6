//! Fourier KAN layer.
//!
//! # Mathematical Foundation
//!
//! Each layer computes:
//!
//! y[j] = b[j] + Σ_i Σ_f ( C[0,j,i,f] · cos(k_f · x[i]) + C[1,j,i,f] · sin(k_f · x[i]) )
//!
//! where:
//! - x[i] is the i-th input coordinate, used as-is (no normalization, no clamping)
//! - k_f is the f-th retained frequency (`1..=G` or `0..G`)
//! - C is the learnable coefficient tensor, shape `[2, out, in, G]`
//! - b is the optional bias
//!
//! # Layout
//!
//! Coefficients are stored flat and row-major: component, then output, then
//! input, then frequency. For a fixed `(component, j)` the `(i, f)` block is
//! contiguous and matches the `[in][G]` basis row in the [`Workspace`], so the
//! reduction over both axes is a single dot product per output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::basis::{compute_basis_and_deriv, compute_basis_row, fourier_dot};
use crate::buffer::Workspace;
use crate::config::LayerConfig;
use crate::error::{KanError, KanResult};
use crate::tensor::Tensor;

/// Cosine or sine half of the coefficient tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Coefficients multiplying `cos(k x)`.
    Cos = 0,
    /// Coefficients multiplying `sin(k x)`.
    Sin = 1,
}

/// How the contraction over input dimension and frequency is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    /// Per-sample basis in the workspace, contracted row by row.
    /// Peak extra memory is `2 * input_dim * grid_size` floats.
    #[default]
    Fused,
    /// Materializes the `[B, out, in, G]` products for each component before
    /// summing. Reference path for cross-checking; memory grows with the batch.
    Materialized,
}

/// A single Fourier KAN layer with learnable Fourier coefficients.
#[derive(Debug, Clone)]
pub struct FourierKanLayer {
    config: LayerConfig,
    /// Retained frequencies, length `grid_size`.
    freqs: Vec<f32>,
    /// Fourier coefficients: [2][out_dim][in_dim][grid_size]
    coeffs: Vec<f32>,
    /// Present iff `config.add_bias`.
    bias: Option<Vec<f32>>,
}

impl FourierKanLayer {
    /// Creates a new layer, seeding from `config.init_seed` or from entropy.
    ///
    /// # Errors
    ///
    /// Returns [`KanError::Config`] if any dimension is zero.
    pub fn new(config: LayerConfig) -> KanResult<Self> {
        let mut rng = match config.init_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, &mut rng)
    }

    /// Creates a new layer drawing coefficients from `rng`.
    ///
    /// Every coefficient is `z / (sqrt(input_dim) * norm_factor(f))` with
    /// `z ~ N(0, 1)`. With unit-variance inputs this keeps each output at
    /// roughly unit variance whatever the dimensions. The bias starts at zero
    /// and consumes no random draws.
    pub fn with_rng<R: Rng + ?Sized>(config: LayerConfig, rng: &mut R) -> KanResult<Self> {
        config.validate()?;

        let g = config.grid_size;
        let fan_in = (config.input_dim as f32).sqrt();
        let scales: Vec<f32> = (0..g)
            .map(|f| 1.0 / (fan_in * config.norm_factor(f)))
            .collect();

        let coeffs: Vec<f32> = (0..config.coeff_count())
            .map(|idx| {
                let z: f32 = rng.sample(StandardNormal);
                z * scales[idx % g]
            })
            .collect();

        let bias = config.add_bias.then(|| vec![0.0; config.output_dim]);

        log::debug!(
            "FourierKanLayer {}->{} grid={} origin={:?} smooth_init={} params={}",
            config.input_dim,
            config.output_dim,
            g,
            config.frequency_origin,
            config.smooth_init,
            config.param_count()
        );

        Ok(Self {
            freqs: config.frequencies(),
            config,
            coeffs,
            bias,
        })
    }

    /// Layer configuration.
    #[inline]
    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// Input dimension.
    #[inline]
    pub fn in_dim(&self) -> usize {
        self.config.input_dim
    }

    /// Output dimension.
    #[inline]
    pub fn out_dim(&self) -> usize {
        self.config.output_dim
    }

    /// Number of retained frequencies.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.config.grid_size
    }

    /// Retained frequencies.
    #[inline]
    pub fn frequencies(&self) -> &[f32] {
        &self.freqs
    }

    /// Length of one `(component, output)` block: `input_dim * grid_size`.
    #[inline]
    fn row_len(&self) -> usize {
        self.config.input_dim * self.config.grid_size
    }

    /// Flat index of `C[component, out_idx, in_idx, freq_idx]`.
    ///
    /// # Panics
    ///
    /// Panics if any index is outside the layer's shape.
    #[inline]
    pub fn coeff_index(
        &self,
        component: Component,
        out_idx: usize,
        in_idx: usize,
        freq_idx: usize,
    ) -> usize {
        assert!(
            out_idx < self.config.output_dim,
            "out_idx {} out of range for output_dim {}",
            out_idx,
            self.config.output_dim
        );
        assert!(
            in_idx < self.config.input_dim,
            "in_idx {} out of range for input_dim {}",
            in_idx,
            self.config.input_dim
        );
        assert!(
            freq_idx < self.config.grid_size,
            "freq_idx {} out of range for grid_size {}",
            freq_idx,
            self.config.grid_size
        );
        ((component as usize * self.config.output_dim + out_idx) * self.config.input_dim + in_idx)
            * self.config.grid_size
            + freq_idx
    }

    /// Reads `C[component, out_idx, in_idx, freq_idx]`.
    #[inline]
    pub fn coeff(&self, component: Component, out_idx: usize, in_idx: usize, freq_idx: usize) -> f32 {
        self.coeffs[self.coeff_index(component, out_idx, in_idx, freq_idx)]
    }

    /// Writes `C[component, out_idx, in_idx, freq_idx]`.
    #[inline]
    pub fn set_coeff(
        &mut self,
        component: Component,
        out_idx: usize,
        in_idx: usize,
        freq_idx: usize,
        value: f32,
    ) {
        let idx = self.coeff_index(component, out_idx, in_idx, freq_idx);
        self.coeffs[idx] = value;
    }

    /// The whole coefficient tensor, flat in `[2, out, in, G]` order.
    #[inline]
    pub fn coefficients(&self) -> &[f32] {
        &self.coeffs
    }

    /// Mutable coefficient handle for an external optimizer.
    #[inline]
    pub fn coefficients_mut(&mut self) -> &mut [f32] {
        &mut self.coeffs
    }

    /// Cosine and sine halves of the coefficient tensor.
    #[inline]
    pub fn split_coefficients(&self) -> (&[f32], &[f32]) {
        self.coeffs.split_at(self.coeffs.len() / 2)
    }

    /// Bias vector, if the layer has one.
    #[inline]
    pub fn bias(&self) -> Option<&[f32]> {
        self.bias.as_deref()
    }

    /// Mutable bias handle, if the layer has one.
    #[inline]
    pub fn bias_mut(&mut self) -> Option<&mut [f32]> {
        self.bias.as_deref_mut()
    }

    /// Total number of trainable parameters.
    #[inline]
    pub fn num_parameters(&self) -> usize {
        self.coeffs.len() + self.bias.as_ref().map_or(0, Vec::len)
    }

    /// Gets all parameters (coefficients, then bias) as a flat vector.
    pub fn get_parameters(&self) -> Vec<f32> {
        let mut params = Vec::with_capacity(self.num_parameters());
        params.extend_from_slice(&self.coeffs);
        if let Some(bias) = &self.bias {
            params.extend_from_slice(bias);
        }
        params
    }

    /// Sets parameters from a flat slice laid out like [`get_parameters`](Self::get_parameters).
    ///
    /// # Errors
    ///
    /// Returns [`KanError::ParameterCountMismatch`] if the length is wrong;
    /// the layer is left untouched.
    pub fn set_parameters(&mut self, params: &[f32]) -> KanResult<()> {
        let expected = self.num_parameters();
        if params.len() != expected {
            return Err(KanError::parameter_count(expected, params.len()));
        }

        let (coeffs, rest) = params.split_at(self.coeffs.len());
        self.coeffs.copy_from_slice(coeffs);
        if let Some(bias) = &mut self.bias {
            bias.copy_from_slice(rest);
        }
        Ok(())
    }

    /// Creates a workspace sized for this layer.
    pub fn create_workspace(&self) -> Workspace {
        Workspace::new(&self.config)
    }

    /// Forward pass over a tensor of shape `[..., input_dim]`.
    ///
    /// Returns a tensor of shape `[..., output_dim]` with the leading axes
    /// unchanged. A rank-1 input is a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`KanError::ShapeMismatch`] if the trailing axis is not
    /// `input_dim` (or the input is a scalar).
    pub fn forward(&self, input: &Tensor) -> KanResult<Tensor> {
        self.forward_with(input, Reduction::Fused)
    }

    /// Forward pass with an explicit [`Reduction`] strategy.
    pub fn forward_with(&self, input: &Tensor, reduction: Reduction) -> KanResult<Tensor> {
        if input.last_dim() != Some(self.config.input_dim) {
            let mut expected = input.leading_shape().to_vec();
            expected.push(self.config.input_dim);
            return Err(KanError::shape_mismatch(&expected, input.shape()));
        }

        let rows = input.batch_rows();
        let mut out = vec![0.0f32; rows * self.config.output_dim];
        match reduction {
            Reduction::Fused => {
                let mut workspace = self.create_workspace();
                self.forward_batch(input.as_slice(), &mut out, &mut workspace)?;
            }
            Reduction::Materialized => {
                self.forward_materialized(input.as_slice(), &mut out)?;
            }
        }

        let mut shape = input.leading_shape().to_vec();
        shape.push(self.config.output_dim);
        Tensor::from_vec(out, shape)
    }

    fn check_batch(&self, inputs: &[f32], outputs: &[f32]) -> KanResult<usize> {
        let in_dim = self.config.input_dim;
        if inputs.len() % in_dim != 0 {
            return Err(KanError::shape_mismatch(&[in_dim], &[inputs.len()]));
        }
        let rows = inputs.len() / in_dim;
        let expected = rows * self.config.output_dim;
        if outputs.len() != expected {
            return Err(KanError::shape_mismatch(&[expected], &[outputs.len()]));
        }
        Ok(rows)
    }

    /// Forward pass for a single sample (`input_dim` in, `output_dim` out).
    pub fn forward_single(
        &self,
        input: &[f32],
        output: &mut [f32],
        workspace: &mut Workspace,
    ) -> KanResult<()> {
        if input.len() != self.config.input_dim {
            return Err(KanError::shape_mismatch(&[self.config.input_dim], &[input.len()]));
        }
        if output.len() != self.config.output_dim {
            return Err(KanError::shape_mismatch(&[self.config.output_dim], &[output.len()]));
        }
        workspace.reserve(&self.config);
        let n = self.row_len();
        self.forward_row(
            input,
            output,
            &mut workspace.cos_basis[..n],
            &mut workspace.sin_basis[..n],
        );
        Ok(())
    }

    /// Fused forward pass over a flat row-major batch.
    ///
    /// `inputs` is `[batch * input_dim]`, `outputs` is `[batch * output_dim]`.
    /// Batches of at least `parallel_threshold` rows are split across the
    /// rayon pool; each row is reduced in the same order either way, so the
    /// result does not depend on the path taken.
    pub fn forward_batch(
        &self,
        inputs: &[f32],
        outputs: &mut [f32],
        workspace: &mut Workspace,
    ) -> KanResult<()> {
        let rows = self.check_batch(inputs, outputs)?;
        if rows > 1 && rows >= self.config.parallel_threshold {
            log::trace!("forward_batch: {} rows on the parallel path", rows);
            self.forward_batch_parallel(inputs, outputs);
            return Ok(());
        }

        workspace.reserve(&self.config);
        let n = self.row_len();
        let (cos, sin) = (&mut workspace.cos_basis[..n], &mut workspace.sin_basis[..n]);
        for (x, y) in inputs
            .chunks_exact(self.config.input_dim)
            .zip(outputs.chunks_exact_mut(self.config.output_dim))
        {
            self.forward_row(x, y, cos, sin);
        }
        Ok(())
    }

    fn forward_batch_parallel(&self, inputs: &[f32], outputs: &mut [f32]) {
        let n = self.row_len();
        outputs
            .par_chunks_mut(self.config.output_dim)
            .zip(inputs.par_chunks(self.config.input_dim))
            .for_each_init(
                || (vec![0.0f32; n], vec![0.0f32; n]),
                |(cos, sin): &mut (Vec<f32>, Vec<f32>), (y, x)| self.forward_row(x, y, cos, sin),
            );
    }

    /// One sample: basis into `cos`/`sin`, then one dot per output.
    #[inline]
    fn forward_row(&self, x: &[f32], y: &mut [f32], cos: &mut [f32], sin: &mut [f32]) {
        compute_basis_row(x, &self.freqs, cos, sin);

        let n = self.row_len();
        let (cc, sc) = self.split_coefficients();
        for (j, out) in y.iter_mut().enumerate() {
            let block = j * n..(j + 1) * n;
            *out = fourier_dot(cos, sin, &cc[block.clone()], &sc[block]);
        }

        if let Some(bias) = &self.bias {
            for (out, b) in y.iter_mut().zip(bias) {
                *out += b;
            }
        }
    }

    /// Reference evaluation that materializes every basis-coefficient product.
    fn forward_materialized(&self, inputs: &[f32], outputs: &mut [f32]) -> KanResult<()> {
        let rows = self.check_batch(inputs, outputs)?;
        let (in_dim, out_dim, g) = (
            self.config.input_dim,
            self.config.output_dim,
            self.config.grid_size,
        );
        let n = self.row_len();
        let total = rows
            .checked_mul(out_dim)
            .and_then(|v| v.checked_mul(n))
            .ok_or_else(|| KanError::overflow("materialized [B, out, in, G] intermediate"))?;

        // Basis for every sample: [B][in][G]
        let mut cos = vec![0.0f32; rows * n];
        let mut sin = vec![0.0f32; rows * n];
        for ((x, c), s) in inputs
            .chunks_exact(in_dim)
            .zip(cos.chunks_exact_mut(n))
            .zip(sin.chunks_exact_mut(n))
        {
            compute_basis_row(x, &self.freqs, c, s);
        }

        let (cc, sc) = self.split_coefficients();
        outputs.fill(0.0);
        for (basis, coeffs) in [(&cos, cc), (&sin, sc)] {
            let mut products = vec![0.0f32; total];
            for b in 0..rows {
                for j in 0..out_dim {
                    for i in 0..in_dim {
                        for f in 0..g {
                            let t = i * g + f;
                            products[(b * out_dim + j) * n + t] = basis[b * n + t] * coeffs[j * n + t];
                        }
                    }
                }
            }
            for (out, block) in outputs.iter_mut().zip(products.chunks_exact(n)) {
                *out += block.iter().sum::<f32>();
            }
        }

        if let Some(bias) = &self.bias {
            for row in outputs.chunks_exact_mut(out_dim) {
                for (out, b) in row.iter_mut().zip(bias) {
                    *out += b;
                }
            }
        }
        Ok(())
    }

    /// Backward pass: closed-form gradients of the forward map.
    ///
    /// Parameter gradients are *accumulated* into `grads`; `grad_input`, when
    /// given, is *overwritten* with `∂L/∂x` (`[batch * input_dim]`).
    ///
    /// - `∂L/∂C[0,j,i,f] += g[j] · cos(k_f x[i])`
    /// - `∂L/∂C[1,j,i,f] += g[j] · sin(k_f x[i])`
    /// - `∂L/∂b[j] += g[j]`
    /// - `∂L/∂x[i] = Σ_j g[j] Σ_f k_f (C[1,j,i,f] cos(k_f x[i]) − C[0,j,i,f] sin(k_f x[i]))`
    pub fn backward(
        &self,
        inputs: &[f32],
        grad_output: &[f32],
        mut grad_input: Option<&mut [f32]>,
        grads: &mut LayerGradients,
        workspace: &mut Workspace,
    ) -> KanResult<()> {
        let rows = self.check_batch(inputs, grad_output)?;
        if let Some(gi) = grad_input.as_deref() {
            if gi.len() != inputs.len() {
                return Err(KanError::shape_mismatch(&[inputs.len()], &[gi.len()]));
            }
        }
        if grads.coeffs.len() != self.coeffs.len()
            || grads.bias.as_ref().map(Vec::len) != self.bias.as_ref().map(Vec::len)
        {
            return Err(KanError::parameter_count(
                self.num_parameters(),
                grads.num_parameters(),
            ));
        }

        workspace.reserve_backward(&self.config);
        let (in_dim, out_dim, g) = (
            self.config.input_dim,
            self.config.output_dim,
            self.config.grid_size,
        );
        let n = self.row_len();
        let (cc, sc) = self.split_coefficients();
        let half = self.coeffs.len() / 2;

        for b in 0..rows {
            let x = &inputs[b * in_dim..(b + 1) * in_dim];
            let g_out = &grad_output[b * out_dim..(b + 1) * out_dim];

            for (i, xi) in x.iter().enumerate() {
                let r = i * g..(i + 1) * g;
                compute_basis_and_deriv(
                    *xi,
                    &self.freqs,
                    &mut workspace.cos_basis[r.clone()],
                    &mut workspace.sin_basis[r.clone()],
                    &mut workspace.dcos_basis[r.clone()],
                    &mut workspace.dsin_basis[r],
                );
            }
            let cos = &workspace.cos_basis[..n];
            let sin = &workspace.sin_basis[..n];

            if let Some(gb) = &mut grads.bias {
                for (acc, go) in gb.iter_mut().zip(g_out) {
                    *acc += go;
                }
            }

            let (gcc, gsc) = grads.coeffs.split_at_mut(half);
            for (j, &go) in g_out.iter().enumerate() {
                let block = j * n..(j + 1) * n;
                for ((acc, c), (acc_s, s)) in gcc[block.clone()]
                    .iter_mut()
                    .zip(cos)
                    .zip(gsc[block].iter_mut().zip(sin))
                {
                    *acc += go * c;
                    *acc_s += go * s;
                }
            }

            if let Some(gi) = grad_input.as_deref_mut() {
                let gi_row = &mut gi[b * in_dim..(b + 1) * in_dim];
                let dcos = &workspace.dcos_basis[..n];
                let dsin = &workspace.dsin_basis[..n];
                for (i, acc) in gi_row.iter_mut().enumerate() {
                    let r = i * g..(i + 1) * g;
                    let mut sum = 0.0f32;
                    for (j, &go) in g_out.iter().enumerate() {
                        let c = j * n + i * g..j * n + (i + 1) * g;
                        sum += go
                            * fourier_dot(&dcos[r.clone()], &dsin[r.clone()], &cc[c.clone()], &sc[c]);
                    }
                    *acc = sum;
                }
            }
        }
        Ok(())
    }
}

/// Gradient buffers laid out like the layer's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradients {
    /// `∂L/∂C`, flat in `[2, out, in, G]` order.
    pub coeffs: Vec<f32>,
    /// `∂L/∂b`, present iff the layer has a bias.
    pub bias: Option<Vec<f32>>,
}

impl LayerGradients {
    /// Zeroed gradients matching `layer`.
    pub fn new(layer: &FourierKanLayer) -> Self {
        Self {
            coeffs: vec![0.0; layer.coeffs.len()],
            bias: layer.bias.as_ref().map(|b| vec![0.0; b.len()]),
        }
    }

    /// Resets every gradient to zero.
    pub fn zero(&mut self) {
        self.coeffs.fill(0.0);
        if let Some(b) = &mut self.bias {
            b.fill(0.0);
        }
    }

    /// Number of gradient entries.
    pub fn num_parameters(&self) -> usize {
        self.coeffs.len() + self.bias.as_ref().map_or(0, Vec::len)
    }

    /// Flat copy in the order of [`FourierKanLayer::get_parameters`].
    pub fn to_flat(&self) -> Vec<f32> {
        let mut flat = self.coeffs.clone();
        if let Some(b) = &self.bias {
            flat.extend_from_slice(b);
        }
        flat
    }
}
