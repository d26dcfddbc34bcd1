use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use crate::collision_environments::CollisionOracle;
use crate::collision_proxy::diffco::DiffCo;
use crate::utils::utils_errors::DiffcoError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostSourceCapability {
    Differentiable,
    NonDifferentiable
}

/// Safety constraint used by the trajectory optimizer.  A configuration is safe when
/// `constraint_value(q, margin) <= 0`.
pub trait CollisionCostSource {
    fn capability(&self) -> CostSourceCapability;
    /// Expected configuration length, when known.
    fn num_dofs(&self) -> Option<usize>;
    fn constraint_value(&self, q: &DVector<f64>, margin: f64) -> Result<f64, DiffcoError>;
    fn constraint_gradient(&self, q: &DVector<f64>, margin: f64) -> Result<DVector<f64>, DiffcoError> {
        let _ = (q, margin);
        Err(DiffcoError::new_unsupported_operation_error("constraint_gradient", "cost source is not differentiable.", file!(), line!()))
    }
    fn is_safe(&self, q: &DVector<f64>, margin: f64) -> Result<bool, DiffcoError> {
        Ok(self.constraint_value(q, margin)? <= 0.0)
    }
}

/// `score(q) - margin`, the learned proxy with its calibrated offset.
pub struct ProxyCostSource<'a> {
    proxy: &'a DiffCo
}
impl<'a> ProxyCostSource<'a> {
    pub fn new(proxy: &'a DiffCo) -> Self {
        Self { proxy }
    }
}
impl<'a> CollisionCostSource for ProxyCostSource<'a> {
    fn capability(&self) -> CostSourceCapability { CostSourceCapability::Differentiable }
    fn num_dofs(&self) -> Option<usize> {
        self.proxy.support_configs().first().map(|c| c.len())
    }
    fn constraint_value(&self, q: &DVector<f64>, margin: f64) -> Result<f64, DiffcoError> {
        Ok(self.proxy.score_single(q)? - margin)
    }
    fn constraint_gradient(&self, q: &DVector<f64>, _margin: f64) -> Result<DVector<f64>, DiffcoError> {
        self.proxy.score_gradient(q)
    }
}

/// `-distance(q)` from the ground truth oracle.  The margin does not apply here.  Touching
/// counts as collision, as it does for the oracle, so a clearance of exactly zero maps to the
/// smallest positive constraint value.
pub struct OracleCostSource<'a> {
    oracle: &'a dyn CollisionOracle
}
impl<'a> OracleCostSource<'a> {
    pub fn new(oracle: &'a dyn CollisionOracle) -> Self {
        Self { oracle }
    }
}
impl<'a> CollisionCostSource for OracleCostSource<'a> {
    fn capability(&self) -> CostSourceCapability { CostSourceCapability::NonDifferentiable }
    fn num_dofs(&self) -> Option<usize> { Some(self.oracle.num_dofs()) }
    fn constraint_value(&self, q: &DVector<f64>, _margin: f64) -> Result<f64, DiffcoError> {
        let d = self.oracle.distance(&vec![q.clone()])?;
        return match d.first() {
            Some(d) if *d > 0.0 => { Ok(-*d) }
            Some(d) => { Ok((-*d).max(f64::MIN_POSITIVE)) }
            None => { Err(DiffcoError::new_generic_error_str("oracle returned no distance.", file!(), line!())) }
        }
    }
}
