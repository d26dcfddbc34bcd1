use std::f64::consts::PI;
use nalgebra::{DMatrix, DVector, Vector2};
use serde::{Serialize, Deserialize};
use crate::robot_modules::robot_fk_module::ForwardKinematics;
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_shape_geometry::geometric_shape::{GeometricShape, GeometricShapeSignature, PlanarPose};

/// A serial chain of identical revolute links moving in the plane.  The base sits at the origin
/// and joint `i` rotates link `i` about the end of link `i-1`.  The control points are the end
/// points of the links.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevolutePlanarRobot {
    link_length: f64,
    link_width: f64,
    dof: usize,
    joint_limits: Vec<(f64, f64)>
}
impl RevolutePlanarRobot {
    pub fn new(link_length: f64, link_width: f64, dof: usize) -> Result<Self, DiffcoError> {
        if dof == 0 {
            return Err(DiffcoError::new_generic_error_str("a planar robot needs at least one joint.", file!(), line!()));
        }
        if !(link_length > 0.0) || !(link_width > 0.0) {
            return Err(DiffcoError::new_generic_error_str(&format!("link length and width must be positive, got {} and {}.", link_length, link_width), file!(), line!()));
        }
        Ok(Self {
            link_length,
            link_width,
            dof,
            joint_limits: vec![(-PI, PI); dof]
        })
    }
    pub fn new_default_width(link_length: f64, dof: usize) -> Result<Self, DiffcoError> {
        return Self::new(link_length, 0.3, dof);
    }
    pub fn link_length(&self) -> f64 {
        self.link_length
    }
    pub fn link_width(&self) -> f64 {
        self.link_width
    }
    pub fn dof(&self) -> usize {
        self.dof
    }
    /// Absolute heading of each link.
    fn cumulative_angles(&self, q: &DVector<f64>) -> Vec<f64> {
        let mut out_vec = Vec::with_capacity(self.dof);
        let mut theta = 0.0;
        for i in 0..self.dof {
            theta += q[i];
            out_vec.push(theta);
        }
        out_vec
    }
    /// Start and end point of every link.
    pub fn link_endpoints(&self, q: &DVector<f64>) -> Result<Vec<(Vector2<f64>, Vector2<f64>)>, DiffcoError> {
        self.check_dimension(q, "link_endpoints")?;
        let mut out_vec = Vec::with_capacity(self.dof);
        let mut prev = Vector2::new(0.0, 0.0);
        for theta in self.cumulative_angles(q) {
            let next = prev + self.link_length * Vector2::new(theta.cos(), theta.sin());
            out_vec.push((prev, next));
            prev = next;
        }
        Ok(out_vec)
    }
    /// Pose of each link rectangle, centered at the link midpoint.
    pub fn link_poses(&self, q: &DVector<f64>) -> Result<Vec<PlanarPose>, DiffcoError> {
        let endpoints = self.link_endpoints(q)?;
        let angles = self.cumulative_angles(q);
        let out_vec = endpoints.iter().zip(angles.iter())
            .map(|((a, b), theta)| PlanarPose::new((a + b) / 2.0, *theta))
            .collect();
        Ok(out_vec)
    }
    pub fn link_shapes(&self) -> Vec<GeometricShape> {
        (0..self.dof)
            .map(|i| GeometricShape::new_planar_rectangle(self.link_length, self.link_width, GeometricShapeSignature::RobotLink { link_idx: i }))
            .collect()
    }
}
impl ForwardKinematics for RevolutePlanarRobot {
    fn num_dofs(&self) -> usize { self.dof }
    fn joint_limits(&self) -> &Vec<(f64, f64)> { &self.joint_limits }
    fn num_control_points(&self) -> usize { self.dof }
    fn workspace_dim(&self) -> usize { 2 }
    fn fkine(&self, q: &DVector<f64>) -> Result<DVector<f64>, DiffcoError> {
        let endpoints = self.link_endpoints(q)?;
        let mut out = DVector::zeros(2 * self.dof);
        for (i, (_, end)) in endpoints.iter().enumerate() {
            out[2 * i] = end[0];
            out[2 * i + 1] = end[1];
        }
        Ok(out)
    }
    fn fkine_jacobian(&self, q: &DVector<f64>) -> Result<DMatrix<f64>, DiffcoError> {
        self.check_dimension(q, "fkine_jacobian")?;
        let angles = self.cumulative_angles(q);
        let mut out = DMatrix::zeros(2 * self.dof, self.dof);
        // d p_i / d q_j = sum over links k in j..=i of L * (-sin, cos)(theta_k)
        for i in 0..self.dof {
            let mut acc = Vector2::new(0.0, 0.0);
            for j in (0..=i).rev() {
                acc += self.link_length * Vector2::new(-angles[j].sin(), angles[j].cos());
                out[(2 * i, j)] = acc[0];
                out[(2 * i + 1, j)] = acc[1];
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::utils::utils_math::finite_difference::FiniteDifferenceUtils;

    #[test]
    fn straight_arm_reaches_along_x() {
        let robot = RevolutePlanarRobot::new_default_width(2.0, 3).unwrap();
        let p = robot.fkine(&DVector::zeros(3)).unwrap();
        assert_relative_eq!(p, DVector::from_vec(vec![2.0, 0.0, 4.0, 0.0, 6.0, 0.0]), epsilon = 1e-12);
    }

    #[test]
    fn right_angle_elbow() {
        let robot = RevolutePlanarRobot::new_default_width(1.0, 2).unwrap();
        let p = robot.fkine(&DVector::from_vec(vec![0.0, PI / 2.0])).unwrap();
        assert_relative_eq!(p[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[3], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn analytic_jacobian_matches_finite_differences() {
        let robot = RevolutePlanarRobot::new_default_width(1.0, 7).unwrap();
        let q = DVector::from_vec(vec![0.3, -1.2, 0.8, 2.0, -0.4, 0.1, -2.5]);
        let analytic = robot.fkine_jacobian(&q).unwrap();
        let numeric = FiniteDifferenceUtils::jacobian(|x| robot.fkine(x), &q).unwrap();
        assert_relative_eq!(analytic, numeric, epsilon = 1e-5);
    }

    #[test]
    fn wrong_length_configuration_is_an_error() {
        let robot = RevolutePlanarRobot::new_default_width(1.0, 3).unwrap();
        assert!(robot.fkine(&DVector::zeros(2)).is_err());
    }

    #[test]
    fn link_pose_is_at_midpoint() {
        let robot = RevolutePlanarRobot::new_default_width(2.0, 2).unwrap();
        let poses = robot.link_poses(&DVector::from_vec(vec![PI / 2.0, 0.0])).unwrap();
        assert_relative_eq!(poses[1].translation()[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(poses[1].angle(), PI / 2.0, epsilon = 1e-12);
    }
}
