//! Reusable scratch space for zero-allocation evaluation.
//!
//! The fused forward pass only needs the basis of one sample at a time:
//! two `[input_dim][grid_size]` rows of cosines and sines. [`Workspace`] owns
//! those rows (plus the derivative rows the backward pass needs) so repeated
//! calls allocate nothing once the buffers have grown to size.
//!
//! ```rust
//! use fourier_kan::{FourierKanLayer, LayerConfig};
//!
//! let config = LayerConfig::builder()
//!     .input_dim(4)
//!     .output_dim(2)
//!     .grid_size(6)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! let layer = FourierKanLayer::new(config).unwrap();
//!
//! let mut workspace = layer.create_workspace();
//! let input = vec![0.25f32; 3 * 4];
//! let mut output = vec![0.0f32; 3 * 2];
//!
//! for _ in 0..100 {
//!     layer.forward_batch(&input, &mut output, &mut workspace).unwrap();
//! }
//! ```

use crate::config::LayerConfig;

/// Per-sample basis buffers reused across calls.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    /// `cos(k_f x_i)`, laid out `[input_dim][grid_size]`.
    pub cos_basis: Vec<f32>,
    /// `sin(k_f x_i)`, laid out `[input_dim][grid_size]`.
    pub sin_basis: Vec<f32>,
    /// `d/dx cos(k_f x_i)`, only filled by the backward pass.
    pub dcos_basis: Vec<f32>,
    /// `d/dx sin(k_f x_i)`, only filled by the backward pass.
    pub dsin_basis: Vec<f32>,
}

impl Workspace {
    /// Creates a workspace sized for `config`.
    pub fn new(config: &LayerConfig) -> Self {
        let mut ws = Self::default();
        ws.reserve(config);
        ws
    }

    /// Grows the forward buffers to fit `config`. Never shrinks.
    pub fn reserve(&mut self, config: &LayerConfig) {
        let n = config.input_dim * config.grid_size;
        grow(&mut self.cos_basis, n);
        grow(&mut self.sin_basis, n);
    }

    /// Grows the derivative buffers used by the backward pass.
    pub fn reserve_backward(&mut self, config: &LayerConfig) {
        self.reserve(config);
        let n = config.input_dim * config.grid_size;
        grow(&mut self.dcos_basis, n);
        grow(&mut self.dsin_basis, n);
    }

    /// Bytes currently held by the workspace.
    pub fn memory_usage(&self) -> usize {
        (self.cos_basis.capacity()
            + self.sin_basis.capacity()
            + self.dcos_basis.capacity()
            + self.dsin_basis.capacity())
            * std::mem::size_of::<f32>()
    }

    /// Releases all buffers.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Buffers are public, so each one is checked on its own.
#[inline]
fn grow(buf: &mut Vec<f32>, n: usize) {
    if buf.len() < n {
        buf.resize(n, 0.0);
    }
}
