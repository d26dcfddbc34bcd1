use nalgebra::{DMatrix, DVector};
use crate::utils::utils_errors::DiffcoError;

pub const FD_PERTURBATION: f64 = 0.000001;

pub struct FiniteDifferenceUtils;
impl FiniteDifferenceUtils {
    /// Central difference gradient of a scalar function.
    pub fn gradient<F>(f: F, x: &DVector<f64>) -> Result<DVector<f64>, DiffcoError>
        where F: Fn(&DVector<f64>) -> Result<f64, DiffcoError> {
        let mut out = DVector::zeros(x.len());
        let mut x_h = x.clone();
        for i in 0..x.len() {
            x_h[i] = x[i] + FD_PERTURBATION;
            let f_plus = f(&x_h)?;
            x_h[i] = x[i] - FD_PERTURBATION;
            let f_minus = f(&x_h)?;
            x_h[i] = x[i];
            out[i] = (f_plus - f_minus) / (2.0 * FD_PERTURBATION);
        }
        Ok(out)
    }
    /// Central difference Jacobian of a vector valued function.
    pub fn jacobian<F>(f: F, x: &DVector<f64>) -> Result<DMatrix<f64>, DiffcoError>
        where F: Fn(&DVector<f64>) -> Result<DVector<f64>, DiffcoError> {
        let f0 = f(x)?;
        let mut out = DMatrix::zeros(f0.len(), x.len());
        let mut x_h = x.clone();
        for i in 0..x.len() {
            x_h[i] = x[i] + FD_PERTURBATION;
            let f_plus = f(&x_h)?;
            x_h[i] = x[i] - FD_PERTURBATION;
            let f_minus = f(&x_h)?;
            x_h[i] = x[i];
            if f_plus.len() != f0.len() || f_minus.len() != f0.len() {
                return Err(DiffcoError::new_dimension_mismatch_error("jacobian", f_plus.len(), f0.len(), file!(), line!()));
            }
            let col = (f_plus - f_minus) / (2.0 * FD_PERTURBATION);
            out.set_column(i, &col);
        }
        Ok(out)
    }
}
