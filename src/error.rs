//! Unified error types for the Fourier KAN layer.
//!
//! [`KanError`] covers every failure the layer can report. Configuration
//! problems are carried as a [`ConfigError`] so callers that only validate a
//! [`LayerConfig`](crate::LayerConfig) can match on the narrower type.
//!
//! Non-finite values are never errors: NaN and infinities flow through the
//! trigonometric basis and the reduction like any other float.
//!
//! # Example
//!
//! ```rust
//! use fourier_kan::KanError;
//!
//! fn check_trailing(expected: usize, shape: &[usize]) -> Result<(), KanError> {
//!     match shape.last() {
//!         Some(&d) if d == expected => Ok(()),
//!         _ => Err(KanError::shape_mismatch(&[expected], shape)),
//!     }
//! }
//!
//! assert!(check_trailing(3, &[4, 3]).is_ok());
//! assert!(check_trailing(3, &[4, 2]).is_err());
//! ```

use thiserror::Error;

use crate::config::ConfigError;

/// Unified error type for layer operations.
#[derive(Error, Debug)]
pub enum KanError {
    /// Invalid layer configuration (non-positive dimension).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Shape mismatch between expected and actual tensor shapes.
    ///
    /// Raised before any computation when an input's trailing dimension
    /// differs from `input_dim`, or when flat buffers have the wrong length.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected tensor shape.
        expected: Vec<usize>,
        /// Actual tensor shape received.
        got: Vec<usize>,
    },

    /// Flat parameter vector has the wrong number of elements.
    #[error("Parameter count mismatch: expected {expected}, got {got}")]
    ParameterCountMismatch {
        /// Number of parameters the layer owns.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Integer overflow in size calculations.
    #[error("Integer overflow: {0}")]
    Overflow(String),
}

/// Result type alias for layer operations.
pub type KanResult<T> = Result<T, KanError>;

impl KanError {
    /// Creates a shape mismatch error.
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        KanError::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Creates a configuration error from a [`ConfigError`].
    pub fn config(err: ConfigError) -> Self {
        KanError::Config(err)
    }

    /// Creates a parameter count mismatch error.
    pub fn parameter_count(expected: usize, got: usize) -> Self {
        KanError::ParameterCountMismatch { expected, got }
    }

    /// Creates an overflow error.
    pub fn overflow<S: Into<String>>(msg: S) -> Self {
        KanError::Overflow(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch() {
        let err = KanError::shape_mismatch(&[2, 3], &[2, 4]);
        let msg = err.to_string();
        assert!(msg.contains("Shape mismatch"));
        assert!(msg.contains("[2, 3]"));
        assert!(msg.contains("[2, 4]"));
    }

    #[test]
    fn test_config_error() {
        let err = KanError::config(ConfigError::InvalidDimension("grid_size must be > 0"));
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("grid_size"));
    }

    #[test]
    fn test_config_error_from() {
        let err: KanError = ConfigError::InvalidDimension("input_dim must be > 0").into();
        assert!(matches!(err, KanError::Config(_)));
    }

    #[test]
    fn test_parameter_count() {
        let err = KanError::parameter_count(10, 7);
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains('7'));
    }
}
