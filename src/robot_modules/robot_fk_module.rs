use nalgebra::{DMatrix, DVector};
use serde::{Serialize, Deserialize};
use crate::utils::utils_console::{diffco_print, diffco_print_new_line, PrintColor, PrintMode};
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_math::finite_difference::FiniteDifferenceUtils;

/// Maps a configuration to a fixed set of workspace control points.  Control points are returned
/// flattened, i.e., `[x0, y0, x1, y1, ...]` for a planar robot.
///
/// The same model must be used for the proxy's feature transform and for the trajectory
/// smoothness objective.
pub trait ForwardKinematics {
    fn num_dofs(&self) -> usize;
    fn joint_limits(&self) -> &Vec<(f64, f64)>;
    fn num_control_points(&self) -> usize;
    fn workspace_dim(&self) -> usize;
    fn fkine(&self, q: &DVector<f64>) -> Result<DVector<f64>, DiffcoError>;
    /// Jacobian of the flattened control points with respect to `q`.  Defaults to central finite
    /// differences; implementors with a closed form should override it.
    fn fkine_jacobian(&self, q: &DVector<f64>) -> Result<DMatrix<f64>, DiffcoError> {
        return FiniteDifferenceUtils::jacobian(|x| self.fkine(x), q);
    }
    fn fkine_batch(&self, qs: &Vec<DVector<f64>>) -> Result<Vec<DVector<f64>>, DiffcoError> {
        let mut out_vec = vec![];
        for q in qs { out_vec.push(self.fkine(q)?); }
        Ok(out_vec)
    }
    fn check_dimension(&self, q: &DVector<f64>, function_name: &str) -> Result<(), DiffcoError> {
        if q.len() != self.num_dofs() {
            return Err(DiffcoError::new_dimension_mismatch_error(function_name, q.len(), self.num_dofs(), file!(), line!()));
        }
        Ok(())
    }
    fn print_results(&self, q: &DVector<f64>) -> Result<(), DiffcoError> {
        let points = self.fkine(q)?;
        let d = self.workspace_dim();
        for i in 0..self.num_control_points() {
            diffco_print(&format!("Control point {} ---> ", i), PrintMode::Print, PrintColor::Blue, true);
            diffco_print(&format!("{:?}", points.rows(i * d, d).as_slice()), PrintMode::Print, PrintColor::None, false);
            diffco_print_new_line();
        }
        Ok(())
    }
}

/// Control points are the configuration itself.  Useful when the proxy works directly in
/// configuration space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityKinematics {
    joint_limits: Vec<(f64, f64)>
}
impl IdentityKinematics {
    pub fn new(joint_limits: Vec<(f64, f64)>) -> Self {
        Self { joint_limits }
    }
}
impl ForwardKinematics for IdentityKinematics {
    fn num_dofs(&self) -> usize { self.joint_limits.len() }
    fn joint_limits(&self) -> &Vec<(f64, f64)> { &self.joint_limits }
    fn num_control_points(&self) -> usize { 1 }
    fn workspace_dim(&self) -> usize { self.joint_limits.len() }
    fn fkine(&self, q: &DVector<f64>) -> Result<DVector<f64>, DiffcoError> {
        self.check_dimension(q, "fkine")?;
        Ok(q.clone())
    }
    fn fkine_jacobian(&self, q: &DVector<f64>) -> Result<DMatrix<f64>, DiffcoError> {
        self.check_dimension(q, "fkine_jacobian")?;
        Ok(DMatrix::identity(q.len(), q.len()))
    }
}

pub struct JointLimitUtils;
impl JointLimitUtils {
    /// Joint limits of two robot models must agree (same joint count, same bounds) before one
    /// model's proxy is used to optimize for the other.
    pub fn check_joint_limits_match(a: &Vec<(f64, f64)>, b: &Vec<(f64, f64)>) -> Result<(), DiffcoError> {
        if a.len() != b.len() {
            return Err(DiffcoError::new_joint_limit_mismatch_error(a, b, file!(), line!()));
        }
        for (x, y) in a.iter().zip(b.iter()) {
            if (x.0 - y.0).abs() > 1e-9 || (x.1 - y.1).abs() > 1e-9 {
                return Err(DiffcoError::new_joint_limit_mismatch_error(a, b, file!(), line!()));
            }
        }
        Ok(())
    }
    pub fn clamp_to_joint_limits(q: &mut DVector<f64>, joint_limits: &Vec<(f64, f64)>) {
        for (i, (lo, hi)) in joint_limits.iter().enumerate() {
            if i >= q.len() { break; }
            q[i] = q[i].max(*lo).min(*hi);
        }
    }
}
