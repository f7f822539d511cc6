//! # fourier-kan - Fourier-series Kolmogorov-Arnold layer
//!
//! A learnable layer that maps `[..., input_dim]` to `[..., output_dim]` by
//! giving every input/output coordinate pair its own truncated Fourier
//! series instead of a single matrix weight. It slots in wherever a dense
//! layer would.
//!
//! ## Architecture
//! - Row-Major coefficient layout: `[Component(cos, sin), Output, Input, Frequency]`
//! - Fused evaluation: one `[Input, Frequency]` basis row per sample, reused
//!   from a [`Workspace`], never the full `[Batch, Output, Input, Frequency]` product
//! - Periodic basis: outputs stay bounded by the coefficients, inputs are never clamped
//!
//! ## Usage
//! ```rust
//! use fourier_kan::{FourierKanLayer, LayerConfig, Tensor};
//!
//! let config = LayerConfig::builder()
//!     .input_dim(4)
//!     .output_dim(3)
//!     .grid_size(16)
//!     .seed(1)
//!     .build()
//!     .unwrap();
//! let layer = FourierKanLayer::new(config).unwrap();
//!
//! // Leading axes are batch axes and come back unchanged.
//! let x = Tensor::zeros(vec![2, 5, 4]);
//! let y = layer.forward(&x).unwrap();
//! assert_eq!(y.shape(), &[2, 5, 3]);
//! ```

pub mod basis;
pub mod buffer;
pub mod config;
pub mod error;
pub mod layer;
pub mod tensor;

// Re-exports
pub use basis::{compute_basis, compute_basis_and_deriv, compute_basis_row, fourier_dot};
pub use buffer::Workspace;
pub use config::{
    ConfigError, FrequencyOrigin, LayerConfig, LayerConfigBuilder, DEFAULT_GRID_SIZE,
    DEFAULT_PARALLEL_THRESHOLD,
};
pub use error::{KanError, KanResult};
pub use layer::{Component, FourierKanLayer, LayerGradients, Reduction};
pub use tensor::Tensor;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
