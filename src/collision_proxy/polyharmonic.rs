use nalgebra::{DMatrix, DVector};
use serde::{Serialize, Deserialize};
use crate::utils::utils_errors::DiffcoError;

/// Which values the interpolant reproduces at the support points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolyharmonicTarget {
    /// The kernel perceptron's hypothesis value.
    Hypothesis,
    /// The ±1 label.
    Label
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyharmonicParameters {
    pub order: usize,
    pub smoothing: f64,
    pub target: PolyharmonicTarget
}
impl Default for PolyharmonicParameters {
    fn default() -> Self {
        Self {
            order: 2,
            smoothing: 1e-6,
            target: PolyharmonicTarget::Hypothesis
        }
    }
}

/// s(x) = Σ wᵢ φ(‖x - cᵢ‖) + v₀ + vᵀx with φ(r) = r^k for odd k and r^k ln r for even k.
/// With too few centers to pin down a linear tail, only the constant v₀ is kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyharmonicInterpolant {
    centers: Vec<DVector<f64>>,
    weights: DVector<f64>,
    tail: DVector<f64>,
    order: usize,
    dim: usize
}
impl PolyharmonicInterpolant {
    pub fn fit(centers: &Vec<DVector<f64>>, values: &Vec<f64>, params: &PolyharmonicParameters) -> Result<Self, DiffcoError> {
        if params.order == 0 {
            return Err(DiffcoError::new_generic_error_str("polyharmonic order must be at least 1.", file!(), line!()));
        }
        if centers.len() != values.len() {
            return Err(DiffcoError::new_dimension_mismatch_error("PolyharmonicInterpolant::fit", values.len(), centers.len(), file!(), line!()));
        }
        let n = centers.len();
        if n == 0 {
            return Err(DiffcoError::new_generic_error_str("cannot fit a polyharmonic interpolant without centers.", file!(), line!()));
        }
        let d = centers[0].len();
        for c in centers {
            if c.len() != d { return Err(DiffcoError::new_dimension_mismatch_error("PolyharmonicInterpolant::fit", c.len(), d, file!(), line!())); }
        }

        let tail_len = if n > d + 1 { d + 1 } else { 1 };
        let m = n + tail_len;
        let mut system = DMatrix::<f64>::zeros(m, m);
        for i in 0..n {
            for j in 0..n {
                let r = (&centers[i] - &centers[j]).norm();
                system[(i, j)] = phi(r, params.order);
            }
            system[(i, i)] += params.smoothing;
            system[(i, n)] = 1.0;
            system[(n, i)] = 1.0;
            for k in 0..tail_len - 1 {
                system[(i, n + 1 + k)] = centers[i][k];
                system[(n + 1 + k, i)] = centers[i][k];
            }
        }

        let mut rhs = DVector::<f64>::zeros(m);
        for i in 0..n { rhs[i] = values[i]; }

        let solution = system.lu().solve(&rhs);
        return match solution {
            None => {
                Err(DiffcoError::new_generic_error_str("polyharmonic system is singular; try a positive smoothing value.", file!(), line!()))
            }
            Some(solution) => {
                Ok(Self {
                    centers: centers.clone(),
                    weights: solution.rows(0, n).into_owned(),
                    tail: solution.rows(n, tail_len).into_owned(),
                    order: params.order,
                    dim: d
                })
            }
        }
    }
    pub fn eval(&self, x: &DVector<f64>) -> Result<f64, DiffcoError> {
        self.check_dim(x)?;
        let mut out = self.tail[0];
        for k in 0..self.tail.len() - 1 { out += self.tail[k + 1] * x[k]; }
        for (c, w) in self.centers.iter().zip(self.weights.iter()) {
            out += w * phi((x - c).norm(), self.order);
        }
        Ok(out)
    }
    pub fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>, DiffcoError> {
        self.check_dim(x)?;
        let mut out = DVector::zeros(self.dim);
        for k in 0..self.tail.len() - 1 { out[k] = self.tail[k + 1]; }
        for (c, w) in self.centers.iter().zip(self.weights.iter()) {
            let diff = x - c;
            let r = diff.norm();
            if r < 1e-12 { continue; }
            out += (w * phi_derivative(r, self.order) / r) * diff;
        }
        Ok(out)
    }
    pub fn num_centers(&self) -> usize { self.centers.len() }
    fn check_dim(&self, x: &DVector<f64>) -> Result<(), DiffcoError> {
        if x.len() != self.dim {
            return Err(DiffcoError::new_dimension_mismatch_error("PolyharmonicInterpolant", x.len(), self.dim, file!(), line!()));
        }
        Ok(())
    }
}

fn phi(r: f64, order: usize) -> f64 {
    if order % 2 == 1 { return r.powi(order as i32); }
    if r < 1e-12 { return 0.0; }
    return r.powi(order as i32) * r.ln();
}

fn phi_derivative(r: f64, order: usize) -> f64 {
    let k = order as i32;
    if order % 2 == 1 { return k as f64 * r.powi(k - 1); }
    if r < 1e-12 { return 0.0; }
    return r.powi(k - 1) * (k as f64 * r.ln() + 1.0);
}
