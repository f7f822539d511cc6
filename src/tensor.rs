//! Minimal owned row-major tensor.
//!
//! [`Tensor`] pairs a flat `Vec<f32>` with its logical shape. The layer only
//! cares about the trailing axis; every leading axis is a batch axis that is
//! flattened on the way in and restored on the way out.
//!
//! # Memory Layout
//!
//! Data is stored in row-major order (C-style). A tensor with shape
//! `[batch, seq, features]` is laid out as
//! `[b0_s0_f0, b0_s0_f1, ..., b0_s1_f0, ...]`, so the flat data can be viewed
//! as `batch_rows() x last_dim()` without copying.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{KanError, KanResult};

/// An owned `f32` tensor with shape metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Vec<usize>,
}

impl Tensor {
    /// Wraps `data` with the given shape.
    ///
    /// An empty `shape` describes a scalar and needs exactly one element.
    ///
    /// # Errors
    ///
    /// Returns [`KanError::ShapeMismatch`] if `data.len()` differs from the
    /// product of `shape`.
    pub fn from_vec(data: Vec<f32>, shape: Vec<usize>) -> KanResult<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(KanError::shape_mismatch(&shape, &[data.len()]));
        }
        Ok(Self { data, shape })
    }

    /// Tensor of zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        Self {
            data: vec![0.0; n],
            shape,
        }
    }

    /// Tensor of independent standard-normal samples.
    pub fn randn<R: Rng + ?Sized>(shape: Vec<usize>, rng: &mut R) -> Self {
        let n: usize = shape.iter().product();
        let data = (0..n).map(|_| rng.sample::<f32, _>(StandardNormal)).collect();
        Self { data, shape }
    }

    /// Logical shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Every axis but the last.
    #[inline]
    pub fn leading_shape(&self) -> &[usize] {
        match self.shape.split_last() {
            Some((_, lead)) => lead,
            None => &[],
        }
    }

    /// Size of the trailing axis, `None` for a scalar.
    #[inline]
    pub fn last_dim(&self) -> Option<usize> {
        self.shape.last().copied()
    }

    /// Product of the leading axes: the flattened batch size.
    #[inline]
    pub fn batch_rows(&self) -> usize {
        self.leading_shape().iter().product()
    }

    /// Flat row-major data.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable flat row-major data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the tensor, returning its flat data.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the tensor holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a tensor with the same data and a new shape.
    pub fn reshape(self, shape: Vec<usize>) -> KanResult<Self> {
        Self::from_vec(self.data, shape)
    }

    /// Concatenates tensors along the first axis.
    ///
    /// # Errors
    ///
    /// All tensors must agree on every axis after the first; the list must
    /// not be empty and no tensor may be a scalar.
    pub fn concat_batch(tensors: &[Tensor]) -> KanResult<Self> {
        let first = tensors
            .first()
            .ok_or_else(|| KanError::shape_mismatch(&[1], &[0]))?;
        let (_, tail) = first
            .shape
            .split_first()
            .ok_or_else(|| KanError::shape_mismatch(&[1], &[]))?;

        let mut rows = 0;
        let mut data = Vec::with_capacity(tensors.iter().map(Tensor::len).sum());
        for t in tensors {
            match t.shape.split_first() {
                Some((n, rest)) if rest == tail => {
                    rows += n;
                    data.extend_from_slice(&t.data);
                }
                _ => return Err(KanError::shape_mismatch(&first.shape, &t.shape)),
            }
        }

        let mut shape = Vec::with_capacity(first.shape.len());
        shape.push(rows);
        shape.extend_from_slice(tail);
        Ok(Self { data, shape })
    }

    /// Mean over all elements.
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return f32::NAN;
        }
        (self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64) as f32
    }

    /// Unbiased variance along the last axis, averaged over all rows.
    pub fn mean_last_axis_variance(&self) -> f32 {
        let d = match self.last_dim() {
            Some(d) if d > 1 => d,
            _ => return f32::NAN,
        };
        let rows = self.data.len() / d;
        if rows == 0 {
            return f32::NAN;
        }

        let total: f64 = self
            .data
            .chunks_exact(d)
            .map(|row| {
                let m = row.iter().map(|&v| v as f64).sum::<f64>() / d as f64;
                row.iter().map(|&v| (v as f64 - m).powi(2)).sum::<f64>() / (d - 1) as f64
            })
            .sum();
        (total / rows as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_from_vec_validates() {
        assert!(Tensor::from_vec(vec![0.0; 6], vec![2, 3]).is_ok());
        assert!(Tensor::from_vec(vec![0.0; 5], vec![2, 3]).is_err());
        assert!(Tensor::from_vec(vec![1.0], vec![]).is_ok());
    }

    #[test]
    fn test_leading_shape() {
        let t = Tensor::zeros(vec![4, 3, 7]);
        assert_eq!(t.leading_shape(), &[4, 3]);
        assert_eq!(t.last_dim(), Some(7));
        assert_eq!(t.batch_rows(), 12);

        let v = Tensor::zeros(vec![7]);
        assert!(v.leading_shape().is_empty());
        assert_eq!(v.batch_rows(), 1);

        let s = Tensor::zeros(vec![]);
        assert_eq!(s.last_dim(), None);
    }

    #[test]
    fn test_zero_sized_batch() {
        let t = Tensor::zeros(vec![0, 5]);
        assert_eq!(t.batch_rows(), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn test_concat_batch() {
        let a = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]).unwrap();
        let b = Tensor::from_vec(vec![3.0, 4.0, 5.0, 6.0], vec![2, 2]).unwrap();
        let c = Tensor::concat_batch(&[a, b]).unwrap();
        assert_eq!(c.shape(), &[3, 2]);
        assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_concat_batch_rejects_mismatch() {
        let a = Tensor::zeros(vec![1, 2]);
        let b = Tensor::zeros(vec![1, 3]);
        assert!(Tensor::concat_batch(&[a, b]).is_err());
        assert!(Tensor::concat_batch(&[]).is_err());
    }

    #[test]
    fn test_statistics() {
        let t = Tensor::from_vec(vec![1.0, 3.0, 2.0, 6.0], vec![2, 2]).unwrap();
        assert!((t.mean() - 3.0).abs() < 1e-6);
        // rows: var(1,3)=2, var(2,6)=8
        assert!((t.mean_last_axis_variance() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_randn_statistics() {
        let mut rng = StdRng::seed_from_u64(42);
        let t = Tensor::randn(vec![100, 100], &mut rng);
        assert!(t.mean().abs() < 0.05);
        assert!((t.mean_last_axis_variance() - 1.0).abs() < 0.1);
    }
}
