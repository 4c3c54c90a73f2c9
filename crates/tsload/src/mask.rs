//! Padding and rectangularization of variable-length series.

use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};

use crate::error::{DataError, Result};

/// A rectangular batch of series plus a boolean padding mask.
///
/// `values` has shape `(n_samples, max_len, n_dims)`; `mask` has the same
/// shape and is `true` exactly at padded positions, which hold NaN. Padding
/// is per-timestep: `mask[i, t, d]` agrees across `d`.
///
/// A NaN inside a real (unpadded) timestep is *not* masked — the mask
/// records padding, not numeric validity. With a NaN sentinel the two are
/// indistinguishable from the values alone; this is a limitation of the
/// sentinel design, inherited deliberately.
#[derive(Debug, Clone)]
pub struct MaskedBatch {
    values: Array3<f64>,
    mask: Array3<bool>,
}

impl MaskedBatch {
    /// Number of samples in the batch.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.values.shape()[0]
    }

    /// Padded (maximum) series length.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.values.shape()[1]
    }

    /// Dimensionality shared by every sample.
    #[must_use]
    pub fn n_dims(&self) -> usize {
        self.values.shape()[2]
    }

    /// Shape as `(n_samples, max_len, n_dims)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        let s = self.values.shape();
        (s[0], s[1], s[2])
    }

    /// The values array.
    #[must_use]
    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// The padding mask, `true` where a position holds no real observation.
    #[must_use]
    pub fn mask(&self) -> &Array3<bool> {
        &self.mask
    }

    /// Unpadded length of sample `index`: the number of unmasked timesteps.
    pub fn sample_len(&self, index: usize) -> Result<usize> {
        if index >= self.n_samples() {
            return Err(DataError::Shape(format!(
                "sample index {} out of bounds for {} samples",
                index,
                self.n_samples()
            )));
        }
        let first_dim = self.mask.slice(s![index, .., 0]);
        Ok(first_dim.iter().filter(|&&masked| !masked).count())
    }
}

/// Append `pad_width` synthetic timesteps to `signal`.
///
/// Returns the padded values, NaN at every appended position, and the
/// parallel mask, `true` exactly there. A `pad_width` of zero copies the
/// signal through with an all-false mask.
#[must_use]
pub fn pad_at_the_end(signal: ArrayView2<'_, f64>, pad_width: usize) -> (Array2<f64>, Array2<bool>) {
    let (length, n_dims) = signal.dim();
    let padded_len = length + pad_width;

    let mut values = Array2::from_elem((padded_len, n_dims), f64::NAN);
    values.slice_mut(s![..length, ..]).assign(&signal);

    let mut mask = Array2::from_elem((padded_len, n_dims), false);
    mask.slice_mut(s![length.., ..]).fill(true);

    (values, mask)
}

/// Stack variable-length series of shape `(length_i, n_dims)` into one
/// rectangular batch.
///
/// `max_len` is the longest input length, recomputed per call. Shorter
/// series are padded at the end via [`pad_at_the_end`]; equal-length series
/// pass through unchanged with all-false mask rows. Output index `i`
/// corresponds to input element `i`.
///
/// # Errors
///
/// [`DataError::Shape`] when the collection is empty, a sample's
/// dimensionality differs from the first one's, or the dimensionality is
/// zero. Nothing is broadcast or truncated.
pub fn rectangularize(series: &[Array2<f64>]) -> Result<MaskedBatch> {
    let first = series
        .first()
        .ok_or_else(|| DataError::Shape("cannot rectangularize an empty collection".to_string()))?;
    let n_dims = first.ncols();
    if n_dims == 0 {
        return Err(DataError::Shape(
            "series must have at least one dimension".to_string(),
        ));
    }
    for (index, signal) in series.iter().enumerate() {
        if signal.ncols() != n_dims {
            return Err(DataError::Shape(format!(
                "sample {} has dimensionality {} but the collection has {}",
                index,
                signal.ncols(),
                n_dims
            )));
        }
    }

    let max_len = series.iter().map(Array2::nrows).max().unwrap_or(0);

    let mut padded_values = Vec::with_capacity(series.len());
    let mut padded_masks = Vec::with_capacity(series.len());
    for signal in series {
        let (values, mask) = pad_at_the_end(signal.view(), max_len - signal.nrows());
        padded_values.push(values);
        padded_masks.push(mask);
    }

    let value_views: Vec<_> = padded_values.iter().map(Array2::view).collect();
    let mask_views: Vec<_> = padded_masks.iter().map(Array2::view).collect();
    let values =
        ndarray::stack(Axis(0), &value_views).map_err(|e| DataError::Shape(e.to_string()))?;
    let mask =
        ndarray::stack(Axis(0), &mask_views).map_err(|e| DataError::Shape(e.to_string()))?;

    Ok(MaskedBatch { values, mask })
}

/// Rectangularize 1-D series by treating each as dimensionality 1.
///
/// Inserts the trailing singleton axis, then delegates to
/// [`rectangularize`].
pub fn rectangularize_univariate(series: &[Array1<f64>]) -> Result<MaskedBatch> {
    let columns: Vec<Array2<f64>> = series
        .iter()
        .map(|signal| signal.clone().insert_axis(Axis(1)))
        .collect();
    rectangularize(&columns)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn output_shape_is_n_by_max_len_by_dims() {
        let series = vec![
            Array2::zeros((2, 2)),
            Array2::zeros((4, 2)),
            Array2::zeros((3, 2)),
        ];
        let batch = rectangularize(&series).unwrap();

        assert_eq!(batch.shape(), (3, 4, 2));
        assert_eq!(batch.values().dim(), batch.mask().dim());
    }

    #[test]
    fn padding_is_nan_masked_and_only_at_the_end() {
        let series = vec![array![[1.0, 10.0], [2.0, 20.0]], array![
            [3.0, 30.0],
            [4.0, 40.0],
            [5.0, 50.0]
        ]];
        let batch = rectangularize(&series).unwrap();

        // real timesteps are copied through exactly and never masked
        assert_eq!(batch.values()[[0, 0, 0]], 1.0);
        assert_eq!(batch.values()[[0, 1, 1]], 20.0);
        assert_eq!(batch.values()[[1, 2, 0]], 5.0);
        for t in 0..2 {
            for d in 0..2 {
                assert!(!batch.mask()[[0, t, d]]);
            }
        }

        // the appended timestep of sample 0 is NaN in every dimension and
        // masked in every dimension
        for d in 0..2 {
            assert!(batch.values()[[0, 2, d]].is_nan());
            assert!(batch.mask()[[0, 2, d]]);
        }

        // the longest sample is never masked
        for t in 0..3 {
            for d in 0..2 {
                assert!(!batch.mask()[[1, t, d]]);
            }
        }
    }

    #[test]
    fn equal_lengths_pass_through_unchanged() {
        let series = vec![array![[1.0], [2.0]], array![[3.0], [4.0]]];
        let batch = rectangularize(&series).unwrap();

        assert_eq!(batch.shape(), (2, 2, 1));
        assert!(batch.mask().iter().all(|&masked| !masked));
        assert_eq!(batch.values()[[0, 1, 0]], 2.0);
        assert_eq!(batch.values()[[1, 0, 0]], 3.0);
    }

    #[test]
    fn a_single_sample_needs_no_padding() {
        let series = vec![array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]];
        let batch = rectangularize(&series).unwrap();

        assert_eq!(batch.shape(), (1, 3, 2));
        assert!(batch.mask().iter().all(|&masked| !masked));
    }

    #[test]
    fn a_real_nan_observation_is_not_masked() {
        let series = vec![array![[f64::NAN], [2.0]], array![[3.0], [4.0], [5.0]]];
        let batch = rectangularize(&series).unwrap();

        assert!(batch.values()[[0, 0, 0]].is_nan());
        assert!(!batch.mask()[[0, 0, 0]]);
        // while the padded position is masked
        assert!(batch.mask()[[0, 2, 0]]);
    }

    #[test]
    fn mixed_dimensionality_is_rejected() {
        let series = vec![Array2::zeros((3, 2)), Array2::zeros((3, 3))];
        let err = rectangularize(&series).unwrap_err();

        match err {
            DataError::Shape(msg) => assert!(msg.contains("sample 1"), "{}", msg),
            other => panic!("expected Shape error, got {:?}", other),
        }
    }

    #[test]
    fn empty_and_zero_dim_collections_are_rejected() {
        assert!(matches!(
            rectangularize(&[]).unwrap_err(),
            DataError::Shape(_)
        ));
        assert!(matches!(
            rectangularize(&[Array2::zeros((3, 0))]).unwrap_err(),
            DataError::Shape(_)
        ));
    }

    #[test]
    fn one_dimensional_series_gain_a_singleton_axis() {
        let series = vec![array![1.0, 2.0], array![3.0, 4.0, 5.0]];
        let batch = rectangularize_univariate(&series).unwrap();

        assert_eq!(batch.shape(), (2, 3, 1));
        assert_eq!(batch.values()[[1, 2, 0]], 5.0);
        assert!(batch.mask()[[0, 2, 0]]);
    }

    #[test]
    fn sample_len_counts_unmasked_timesteps() {
        let series = vec![Array2::zeros((2, 3)), Array2::zeros((5, 3))];
        let batch = rectangularize(&series).unwrap();

        assert_eq!(batch.sample_len(0).unwrap(), 2);
        assert_eq!(batch.sample_len(1).unwrap(), 5);
        assert!(batch.sample_len(2).is_err());
    }

    #[test]
    fn pad_at_the_end_with_zero_width_is_identity() {
        let signal = array![[1.0, 2.0], [3.0, 4.0]];
        let (values, mask) = pad_at_the_end(signal.view(), 0);

        assert_eq!(values, signal);
        assert!(mask.iter().all(|&masked| !masked));
    }
}
