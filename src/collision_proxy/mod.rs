pub mod calibration;
pub mod diffco;
pub mod kernels;
pub mod polyharmonic;

use nalgebra::{DMatrix, DVector};
use serde::{Serialize, Deserialize};
use crate::robot_modules::planar_robot::RevolutePlanarRobot;
use crate::robot_modules::robot_fk_module::ForwardKinematics;
use crate::utils::utils_errors::DiffcoError;

/// Mapping applied to configurations before the kernel is evaluated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FeatureTransform {
    Identity,
    /// Control points of a planar arm.  More accurate near the collision boundary, at the cost of
    /// one forward kinematics call per evaluation.
    ForwardKinematics(RevolutePlanarRobot)
}
impl FeatureTransform {
    pub fn apply(&self, q: &DVector<f64>) -> Result<DVector<f64>, DiffcoError> {
        return match self {
            FeatureTransform::Identity => { Ok(q.clone()) }
            FeatureTransform::ForwardKinematics(robot) => { robot.fkine(q) }
        }
    }
    pub fn apply_batch(&self, qs: &Vec<DVector<f64>>) -> Result<Vec<DVector<f64>>, DiffcoError> {
        let mut out_vec = Vec::with_capacity(qs.len());
        for q in qs { out_vec.push(self.apply(q)?); }
        Ok(out_vec)
    }
    /// d feature / d q
    pub fn jacobian(&self, q: &DVector<f64>) -> Result<DMatrix<f64>, DiffcoError> {
        return match self {
            FeatureTransform::Identity => { Ok(DMatrix::identity(q.len(), q.len())) }
            FeatureTransform::ForwardKinematics(robot) => { robot.fkine_jacobian(q) }
        }
    }
    /// Number of configuration coordinates this transform accepts, if it is fixed.
    pub fn input_dim(&self) -> Option<usize> {
        return match self {
            FeatureTransform::Identity => { None }
            FeatureTransform::ForwardKinematics(robot) => { Some(robot.num_dofs()) }
        }
    }
}
