// src/data_analysis/histogram.rs

use ndarray::{Array1, Array2, Axis};

/// Uniform bins over `[lo, hi]`; the last bin also holds `hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinAxis {
    pub lo: f64,
    pub hi: f64,
    pub bins: usize,
}

impl BinAxis {
    pub fn new(lo: f64, hi: f64, bins: usize) -> Self {
        Self { lo, hi, bins }
    }

    pub fn width(&self) -> f64 {
        (self.hi - self.lo) / self.bins as f64
    }

    /// Bin holding `value`, or `None` when it is outside the range or NaN.
    pub fn index(&self, value: f64) -> Option<usize> {
        if !(value >= self.lo && value <= self.hi) || self.bins == 0 {
            return None;
        }
        if self.hi <= self.lo {
            return Some(0);
        }
        let idx = ((value - self.lo) / self.width()) as usize;
        Some(idx.min(self.bins - 1))
    }

    pub fn centers(&self) -> Array1<f64> {
        let w = self.width();
        Array1::from_shape_fn(self.bins, |i| self.lo + (i as f64 + 0.5) * w)
    }
}

/// Counts of `values` per bin.
pub fn histogram1d<'a>(values: impl IntoIterator<Item = &'a f64>, axis: BinAxis) -> Array1<f64> {
    let mut counts = Array1::<f64>::zeros(axis.bins);
    for &v in values {
        if let Some(i) = axis.index(v) {
            counts[i] += 1.0;
        }
    }
    counts
}

/// Weighted 2-D histogram stored as `[row bin, column bin]`.
#[derive(Debug, Clone)]
pub struct Histogram2d {
    pub rows: BinAxis,
    pub cols: BinAxis,
    pub counts: Array2<f64>,
}

impl Histogram2d {
    pub fn new(rows: BinAxis, cols: BinAxis) -> Self {
        Self {
            rows,
            cols,
            counts: Array2::zeros((rows.bins, cols.bins)),
        }
    }

    pub fn add(&mut self, row_value: f64, col_value: f64, weight: f64) {
        if let Some(col) = self.cols.index(col_value) {
            self.add_to_column(row_value, col, weight);
        }
    }

    /// Adds to an explicit column, bypassing the column axis binning.
    pub fn add_to_column(&mut self, row_value: f64, col: usize, weight: f64) {
        if col >= self.cols.bins || !weight.is_finite() {
            return;
        }
        if let Some(row) = self.rows.index(row_value) {
            self.counts[[row, col]] += weight;
        }
    }

    pub fn total(&self) -> f64 {
        self.counts.sum()
    }

    pub fn column_sums(&self) -> Array1<f64> {
        self.counts.sum_axis(Axis(0))
    }
}
