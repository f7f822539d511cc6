//! Layer configuration and hyperparameters.
//!
//! This module provides [`LayerConfig`] for configuring a Fourier KAN layer:
//! its dimensions, the number of retained frequencies, the bias switch and
//! the initialization policy.
//!
//! # Example
//!
//! ```rust
//! use fourier_kan::{FrequencyOrigin, LayerConfig};
//!
//! let config = LayerConfig::builder()
//!     .input_dim(50)
//!     .output_dim(200)
//!     .grid_size(300)
//!     .smooth_init(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.frequency_origin, FrequencyOrigin::StartAt1);
//! assert_eq!(config.frequencies()[0], 1.0);
//! ```
//!
//! # Frequency Origin
//!
//! | Variant | Frequencies | Constant term |
//! |---------|-------------|---------------|
//! | `StartAt1` (default) | `1..=grid_size` | carried by the bias |
//! | `StartAt0` | `0..grid_size` | learned per input coordinate |
//!
//! The two variants are not interchangeable: a `StartAt0` layer spends one
//! frequency slot on the constant term, so the same `grid_size` reaches one
//! harmonic less.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of retained frequencies.
pub const DEFAULT_GRID_SIZE: usize = 8;

/// Default batch size from which [`forward_batch`](crate::FourierKanLayer::forward_batch)
/// splits rows across the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 128;

/// Where the contiguous integer frequency range begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrequencyOrigin {
    /// Frequencies `0..grid_size`; the constant term is part of the coefficients.
    StartAt0,
    /// Frequencies `1..=grid_size`; frequency 0 is left to the bias.
    #[default]
    StartAt1,
}

impl FrequencyOrigin {
    /// First frequency of the range.
    #[inline]
    pub const fn first(self) -> usize {
        match self {
            FrequencyOrigin::StartAt0 => 0,
            FrequencyOrigin::StartAt1 => 1,
        }
    }
}

/// Fourier KAN layer configuration.
///
/// Build one with [`LayerConfig::builder`] or struct-update syntax over
/// [`Default`], then call [`validate`](Self::validate) (the builder and
/// [`FourierKanLayer::new`](crate::FourierKanLayer::new) do this for you).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayerConfig {
    /// Number of input coordinates.
    pub input_dim: usize,

    /// Number of output coordinates.
    pub output_dim: usize,

    /// Number of retained frequencies per input/output pair.
    pub grid_size: usize,

    /// Whether the layer owns a bias vector.
    pub add_bias: bool,

    /// Attenuate frequency `f` by `(f + 1)^2` at init instead of `sqrt(grid_size)`.
    pub smooth_init: bool,

    /// Start of the frequency range.
    pub frequency_origin: FrequencyOrigin,

    /// Optional seed for deterministic initialization (None => random).
    pub init_seed: Option<u64>,

    /// Batches smaller than this are processed single-threaded.
    pub parallel_threshold: usize,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            input_dim: 1,
            output_dim: 1,
            grid_size: DEFAULT_GRID_SIZE,
            add_bias: true,
            smooth_init: false,
            frequency_origin: FrequencyOrigin::StartAt1,
            init_seed: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl LayerConfig {
    /// Creates a configuration with the given dimensions and default flags.
    pub fn new(input_dim: usize, output_dim: usize, grid_size: usize) -> Self {
        Self {
            input_dim,
            output_dim,
            grid_size,
            ..Default::default()
        }
    }

    /// Starts a [`LayerConfigBuilder`] from the defaults.
    pub fn builder() -> LayerConfigBuilder {
        LayerConfigBuilder::default()
    }

    /// Shape of the coefficient tensor: `[2, output_dim, input_dim, grid_size]`.
    #[inline]
    pub fn coeff_shape(&self) -> [usize; 4] {
        [2, self.output_dim, self.input_dim, self.grid_size]
    }

    /// Number of coefficients, or `None` if the product overflows `usize`.
    pub fn checked_coeff_count(&self) -> Option<usize> {
        2usize
            .checked_mul(self.output_dim)?
            .checked_mul(self.input_dim)?
            .checked_mul(self.grid_size)
    }

    /// Number of coefficients. Only meaningful on a validated config.
    #[inline]
    pub fn coeff_count(&self) -> usize {
        2 * self.output_dim * self.input_dim * self.grid_size
    }

    /// Total trainable parameters (coefficients plus optional bias).
    #[inline]
    pub fn param_count(&self) -> usize {
        self.coeff_count() + if self.add_bias { self.output_dim } else { 0 }
    }

    /// The retained frequencies, as floats ready for `k * x`.
    ///
    /// ```rust
    /// use fourier_kan::{FrequencyOrigin, LayerConfig};
    ///
    /// let mut config = LayerConfig::new(1, 1, 3);
    /// assert_eq!(config.frequencies(), vec![1.0, 2.0, 3.0]);
    ///
    /// config.frequency_origin = FrequencyOrigin::StartAt0;
    /// assert_eq!(config.frequencies(), vec![0.0, 1.0, 2.0]);
    /// ```
    pub fn frequencies(&self) -> Vec<f32> {
        let first = self.frequency_origin.first();
        (first..first + self.grid_size).map(|k| k as f32).collect()
    }

    /// Initialization divisor for frequency index `f` (excluding the
    /// `sqrt(input_dim)` fan-in term).
    ///
    /// With `smooth_init` this is `(f + 1)^2` for either origin, so the
    /// zero-frequency slot of a `StartAt0` layer gets the weakest
    /// attenuation instead of a division by zero.
    #[inline]
    pub fn norm_factor(&self, f: usize) -> f32 {
        if self.smooth_init {
            let n = (f + 1) as f32;
            n * n
        } else {
            (self.grid_size as f32).sqrt()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any dimension is zero or the coefficient
    /// count overflows `usize`.
    ///
    /// ```rust
    /// use fourier_kan::LayerConfig;
    ///
    /// assert!(LayerConfig::new(4, 2, 5).validate().is_ok());
    /// assert!(LayerConfig::new(4, 0, 5).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_dim == 0 {
            return Err(ConfigError::InvalidDimension("input_dim must be > 0"));
        }
        if self.output_dim == 0 {
            return Err(ConfigError::InvalidDimension("output_dim must be > 0"));
        }
        if self.grid_size == 0 {
            return Err(ConfigError::InvalidDimension("grid_size must be > 0"));
        }
        if self.checked_coeff_count().is_none() {
            return Err(ConfigError::TooManyParameters);
        }
        Ok(())
    }
}

/// Consuming builder for [`LayerConfig`].
#[derive(Debug, Clone, Default)]
pub struct LayerConfigBuilder {
    config: LayerConfig,
}

impl LayerConfigBuilder {
    /// Sets the input dimension.
    pub fn input_dim(mut self, dim: usize) -> Self {
        self.config.input_dim = dim;
        self
    }

    /// Sets the output dimension.
    pub fn output_dim(mut self, dim: usize) -> Self {
        self.config.output_dim = dim;
        self
    }

    /// Sets the number of retained frequencies.
    pub fn grid_size(mut self, grid_size: usize) -> Self {
        self.config.grid_size = grid_size;
        self
    }

    /// Enables or disables the bias vector.
    pub fn add_bias(mut self, add_bias: bool) -> Self {
        self.config.add_bias = add_bias;
        self
    }

    /// Selects the smooth initialization policy.
    pub fn smooth_init(mut self, smooth: bool) -> Self {
        self.config.smooth_init = smooth;
        self
    }

    /// Sets the start of the frequency range.
    pub fn frequency_origin(mut self, origin: FrequencyOrigin) -> Self {
        self.config.frequency_origin = origin;
        self
    }

    /// Fixes the initialization seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.init_seed = Some(seed);
        self
    }

    /// Sets the batch size from which rows are processed in parallel.
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<LayerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Errors returned by [`LayerConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A dimension parameter is zero.
    #[error("Invalid dimension: {0}")]
    InvalidDimension(&'static str),

    /// `2 * output_dim * input_dim * grid_size` does not fit in `usize`.
    #[error("Coefficient count overflows usize")]
    TooManyParameters,
}
