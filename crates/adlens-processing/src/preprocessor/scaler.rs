use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Per-column standardization `(x - mean) / scale`.
///
/// Uses the population standard deviation; columns without spread get a
/// scale of 1 so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: ArrayView2<'_, f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mut means = Vec::with_capacity(x.ncols());
        let mut scales = Vec::with_capacity(x.ncols());

        for column in x.columns() {
            let mean = column.sum() / n;
            let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            let scale = if std == 0.0 || std < 10.0 * f64::EPSILON * mean.abs() {
                1.0
            } else {
                std
            };
            means.push(mean);
            scales.push(scale);
        }

        Self { means, scales }
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn transform_in_place(&self, x: &mut Array2<f64>) {
        for mut row in x.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.means[j]) / self.scales[j];
            }
        }
    }

    pub fn transform_row(&self, row: &mut [f64]) {
        for ((value, mean), scale) in row.iter_mut().zip(&self.means).zip(&self.scales) {
            *value = (*value - mean) / scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_population_std() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(x.view());
        assert_eq!(scaler.means, vec![2.0, 5.0]);
        assert_eq!(scaler.scales, vec![1.0, 1.0]);

        let x = array![[0.0], [4.0]];
        let scaler = StandardScaler::fit(x.view());
        assert_eq!(scaler.scales, vec![2.0]);
    }

    #[test]
    fn test_transform_centers_columns() {
        let mut x = array![[0.0, 7.0], [4.0, 7.0]];
        let scaler = StandardScaler::fit(x.view());
        scaler.transform_in_place(&mut x);
        assert_eq!(x, array![[-1.0, 0.0], [1.0, 0.0]]);

        let mut row = vec![2.0, 7.0];
        scaler.transform_row(&mut row);
        assert_eq!(row, vec![0.0, 0.0]);
    }
}
