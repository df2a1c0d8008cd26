//! Score matrix -> class index conversion

use ndarray::{Array2, ArrayView1};

/// Index of the largest value in a row; ties resolve to the first index
///
/// NaN entries never win unless the whole row is NaN, in which case the
/// first index is returned.
pub fn argmax(row: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &value) in row.iter().enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

/// Class index for every row of a one-hot or score matrix
pub fn argmax_rows(scores: &Array2<f64>) -> Vec<usize> {
    scores.rows().into_iter().map(argmax).collect()
}
