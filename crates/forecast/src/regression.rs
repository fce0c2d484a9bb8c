//! Small dense least-squares solver for exogenous regressor effects.

use crate::result::ModelFitError;

/// Linear effect `intercept + coefficients · x`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinearFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearFit {
    /// Contribution of the regressors alone (intercept excluded).
    pub fn effect(&self, row: &[f64]) -> f64 {
        self.coefficients.iter().zip(row).map(|(b, x)| b * x).sum()
    }
}

/// Ridge regression of `y` on the columns of `x` with an unpenalised intercept.
///
/// Columns and target are centred first, so a constant column simply gets a
/// zero coefficient instead of making the system singular.
pub(crate) fn ridge_fit(x: &[Vec<f64>], y: &[f64], lambda: f64) -> Result<LinearFit, ModelFitError> {
    let n = y.len();
    if x.len() != n {
        return Err(ModelFitError::MisalignedCovariates(format!(
            "{} regressor rows for {} observations",
            x.len(),
            n
        )));
    }
    let p = x.first().map(Vec::len).unwrap_or(0);
    if n == 0 || p == 0 {
        return Ok(LinearFit {
            intercept: mean(y),
            coefficients: vec![0.0; p],
        });
    }
    if x.iter().any(|row| row.len() != p) {
        return Err(ModelFitError::MisalignedCovariates("ragged regressor rows".to_string()));
    }

    let y_mean = mean(y);
    let x_mean: Vec<f64> = (0..p)
        .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n as f64)
        .collect();

    // Normal equations on centred data: (XᵀX + λI) β = Xᵀy
    let mut a = vec![vec![0.0; p]; p];
    let mut b = vec![0.0; p];
    for (row, yi) in x.iter().zip(y) {
        for j in 0..p {
            let xj = row[j] - x_mean[j];
            b[j] += xj * (yi - y_mean);
            for k in 0..p {
                a[j][k] += xj * (row[k] - x_mean[k]);
            }
        }
    }
    for (j, row) in a.iter_mut().enumerate() {
        row[j] += lambda;
    }

    let coefficients = solve(a, b)?;
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(&x_mean)
            .map(|(c, m)| c * m)
            .sum::<f64>();

    Ok(LinearFit {
        intercept,
        coefficients,
    })
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ModelFitError> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(ModelFitError::SingularDesign);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::NonFinite);
    }
    Ok(x)
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_linear_relationship() {
        // y = 3 + 2*x0 - 0.5*x1
        let x: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let fit = ridge_fit(&x, &y, 1e-9).unwrap();
        assert!((fit.intercept - 3.0).abs() < 1e-6);
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((fit.coefficients[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn constant_column_gets_zero_weight() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![0.0, i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| 1.0 + i as f64).collect();

        let fit = ridge_fit(&x, &y, 1e-6).unwrap();
        assert_eq!(fit.coefficients[0], 0.0);
        assert!((fit.coefficients[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn rejects_misaligned_rows() {
        let err = ridge_fit(&[vec![1.0]], &[1.0, 2.0], 1e-6).unwrap_err();
        assert!(matches!(err, ModelFitError::MisalignedCovariates(_)));
    }
}
