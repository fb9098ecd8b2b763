//! Row-major dense matrix owned by the native library

use crate::matrix::MatrixHandle;
use std::ops::{Index, IndexMut};

/// Dense `f64` matrix stored row-major in one contiguous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Wrap an existing row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "buffer of length {} cannot hold a {rows}x{cols} matrix",
            data.len()
        );
        Self { rows, cols, data }
    }

    /// Identity matrix [n × n]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Row-major entries
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Row-major entries, mutable
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Overwrite this matrix with `source`, which must have the same shape
    pub fn copy_from(&mut self, source: &DenseMatrix) {
        debug_assert_eq!(self.shape(), source.shape());
        self.data.copy_from_slice(&source.data);
    }
}

impl MatrixHandle for DenseMatrix {
    fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }

    #[inline]
    fn set_at(&mut self, row: usize, col: usize, value: f64) {
        self[(row, col)] = value;
    }
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(row < self.rows && col < self.cols);
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for DenseMatrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(row < self.rows && col < self.cols);
        &mut self.data[row * self.cols + col]
    }
}
