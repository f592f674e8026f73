//! NaN imputation for feature tables

use ndarray::{Array2, ArrayView2, Axis};

/// Replace every NaN cell with the mean of its column
///
/// Column means ignore NaN entries; a column that is entirely NaN falls
/// back to a mean of 0. The input is untouched and a corrected copy is
/// returned, so running the imputer on its own output is a no-op.
pub fn replace_nans_with_col_means(x: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut col_means = vec![0.0f32; x.ncols()];
    for (j, col) in x.axis_iter(Axis(1)).enumerate() {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &v in col.iter() {
            if !v.is_nan() {
                sum += v;
                count += 1;
            }
        }
        col_means[j] = if count > 0 { sum / count as f32 } else { 0.0 };
    }

    let mut out = x.to_owned();
    for ((_, j), v) in out.indexed_iter_mut() {
        if v.is_nan() {
            *v = col_means[j];
        }
    }
    out
}
