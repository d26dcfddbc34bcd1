use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use strum_macros::{Display, EnumIter, EnumString};

pub const DEFAULT_RATIONAL_QUADRATIC_POWER: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, EnumString, Display)]
pub enum KernelType {
    RationalQuadratic,
    Gaussian,
    Cauchy
}

/// Radial kernels of the squared distance r² between two feature vectors.  All of them equal
/// 1 at r = 0 and decay monotonically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum KernelFunction {
    /// (1 + γ r² / p)^-p
    RationalQuadratic { gamma: f64, p: f64 },
    /// exp(-γ r²)
    Gaussian { gamma: f64 },
    /// 1 / (1 + γ r²)
    Cauchy { gamma: f64 }
}
impl KernelFunction {
    pub fn new(kernel_type: KernelType, gamma: f64) -> Self {
        return match kernel_type {
            KernelType::RationalQuadratic => { Self::RationalQuadratic { gamma, p: DEFAULT_RATIONAL_QUADRATIC_POWER } }
            KernelType::Gaussian => { Self::Gaussian { gamma } }
            KernelType::Cauchy => { Self::Cauchy { gamma } }
        }
    }
    pub fn kernel_type(&self) -> KernelType {
        return match self {
            KernelFunction::RationalQuadratic { .. } => { KernelType::RationalQuadratic }
            KernelFunction::Gaussian { .. } => { KernelType::Gaussian }
            KernelFunction::Cauchy { .. } => { KernelType::Cauchy }
        }
    }
    pub fn gamma(&self) -> f64 {
        return match self {
            KernelFunction::RationalQuadratic { gamma, .. } => { *gamma }
            KernelFunction::Gaussian { gamma } => { *gamma }
            KernelFunction::Cauchy { gamma } => { *gamma }
        }
    }
    pub fn eval_sq_dist(&self, r2: f64) -> f64 {
        return match self {
            KernelFunction::RationalQuadratic { gamma, p } => { (1.0 + gamma * r2 / p).powf(-p) }
            KernelFunction::Gaussian { gamma } => { (-gamma * r2).exp() }
            KernelFunction::Cauchy { gamma } => { 1.0 / (1.0 + gamma * r2) }
        }
    }
    /// dk / d(r²)
    pub fn derivative_sq_dist(&self, r2: f64) -> f64 {
        return match self {
            KernelFunction::RationalQuadratic { gamma, p } => { -gamma * (1.0 + gamma * r2 / p).powf(-p - 1.0) }
            KernelFunction::Gaussian { gamma } => { -gamma * (-gamma * r2).exp() }
            KernelFunction::Cauchy { gamma } => {
                let d = 1.0 + gamma * r2;
                -gamma / (d * d)
            }
        }
    }
    pub fn eval(&self, x: &DVector<f64>, y: &DVector<f64>) -> f64 {
        self.eval_sq_dist((x - y).norm_squared())
    }
    /// Gradient of k(x, y) with respect to `y`.
    pub fn gradient_wrt_y(&self, x: &DVector<f64>, y: &DVector<f64>) -> DVector<f64> {
        let diff = y - x;
        let r2 = diff.norm_squared();
        return 2.0 * self.derivative_sq_dist(r2) * diff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;
    use crate::utils::utils_math::finite_difference::FiniteDifferenceUtils;

    #[test]
    fn kernels_peak_at_zero_distance() {
        for t in KernelType::iter() {
            let k = KernelFunction::new(t, 3.0);
            assert_relative_eq!(k.eval_sq_dist(0.0), 1.0);
            assert!(k.eval_sq_dist(0.5) < 1.0);
            assert!(k.eval_sq_dist(2.0) < k.eval_sq_dist(0.5));
        }
    }

    #[test]
    fn rational_quadratic_value() {
        let k = KernelFunction::new(KernelType::RationalQuadratic, 10.0);
        // (1 + 10 * 1 / 2)^-2
        assert_relative_eq!(k.eval_sq_dist(1.0), 1.0 / 36.0, epsilon = 1e-12);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let x = DVector::from_vec(vec![0.2, -0.4, 1.0]);
        let y = DVector::from_vec(vec![0.5, 0.1, 0.7]);
        for t in KernelType::iter() {
            let k = KernelFunction::new(t, 2.0);
            let numeric = FiniteDifferenceUtils::gradient(|y| Ok(k.eval(&x, y)), &y).unwrap();
            assert_relative_eq!(k.gradient_wrt_y(&x, &y), numeric, epsilon = 1e-6);
        }
    }
}
