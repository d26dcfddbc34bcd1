pub mod predefined_environments;

use nalgebra::{DVector, Vector2};
use rand::RngCore;
use serde::{Serialize, Deserialize};
use crate::robot_modules::planar_robot::RevolutePlanarRobot;
use crate::robot_modules::robot_fk_module::ForwardKinematics;
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_sampling::SimpleSamplers;
use crate::utils::utils_shape_geometry::geometric_shape::{GeometricShape, GeometricShapeQueries, GeometricShapeSignature, PlanarPose};

/// Ground truth collision checker over a robot's configuration space.
pub trait CollisionOracle {
    fn qlim(&self) -> &Vec<(f64, f64)>;
    fn num_dofs(&self) -> usize { self.qlim().len() }
    /// Uniform sample within the joint limits.
    fn sample_q(&self, rng: &mut dyn RngCore) -> DVector<f64> {
        DVector::from_vec(SimpleSamplers::uniform_samples(self.qlim(), rng))
    }
    fn is_collision(&self, configs: &Vec<DVector<f64>>) -> Result<Vec<bool>, DiffcoError>;
    /// Signed clearance per configuration: negative penetration depth when in collision.
    fn distance(&self, configs: &Vec<DVector<f64>>) -> Result<Vec<f64>, DiffcoError>;
    fn is_collision_single(&self, q: &DVector<f64>) -> Result<bool, DiffcoError> {
        let res = self.is_collision(&vec![q.clone()])?;
        return match res.first() {
            None => { Err(DiffcoError::new_generic_error_str("collision oracle returned no result.", file!(), line!())) }
            Some(b) => { Ok(*b) }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlanarObstacle {
    Rect { center: (f64, f64), size: (f64, f64) },
    Circle { center: (f64, f64), radius: f64 }
}
impl PlanarObstacle {
    pub fn to_geometric_shape(&self, obstacle_idx: usize) -> GeometricShape {
        let signature = GeometricShapeSignature::Obstacle { obstacle_idx };
        return match self {
            PlanarObstacle::Rect { size, .. } => { GeometricShape::new_planar_rectangle(size.0, size.1, signature) }
            PlanarObstacle::Circle { radius, .. } => { GeometricShape::new_planar_circle(*radius, signature) }
        }
    }
    pub fn pose(&self) -> PlanarPose {
        let c = match self {
            PlanarObstacle::Rect { center, .. } => { center }
            PlanarObstacle::Circle { center, .. } => { center }
        };
        return PlanarPose::new(Vector2::new(c.0, c.1), 0.0);
    }
}

/// A `RevolutePlanarRobot` among static rectangle and circle obstacles.  A configuration is in
/// collision when any link overlaps any obstacle.
#[derive(Clone)]
pub struct PlanarCollisionEnvironment {
    robot: RevolutePlanarRobot,
    obstacles: Vec<PlanarObstacle>,
    link_shapes: Vec<GeometricShape>,
    obstacle_shapes: Vec<(GeometricShape, PlanarPose)>
}
impl PlanarCollisionEnvironment {
    pub fn new(robot: RevolutePlanarRobot, obstacles: Vec<PlanarObstacle>) -> Self {
        let link_shapes = robot.link_shapes();
        let obstacle_shapes = obstacles.iter().enumerate().map(|(i, o)| (o.to_geometric_shape(i), o.pose())).collect();
        Self {
            robot,
            obstacles,
            link_shapes,
            obstacle_shapes
        }
    }
    pub fn robot(&self) -> &RevolutePlanarRobot {
        &self.robot
    }
    pub fn obstacles(&self) -> &Vec<PlanarObstacle> {
        &self.obstacles
    }
    fn single_is_collision(&self, q: &DVector<f64>) -> Result<bool, DiffcoError> {
        let link_poses = self.robot.link_poses(q)?;
        for (link_shape, link_pose) in self.link_shapes.iter().zip(link_poses.iter()) {
            for (obstacle_shape, obstacle_pose) in &self.obstacle_shapes {
                if GeometricShapeQueries::intersection_test(link_shape, link_pose, obstacle_shape, obstacle_pose)? { return Ok(true); }
            }
        }
        Ok(false)
    }
    fn single_distance(&self, q: &DVector<f64>) -> Result<f64, DiffcoError> {
        let link_poses = self.robot.link_poses(q)?;
        let mut out = f64::INFINITY;
        for (link_shape, link_pose) in self.link_shapes.iter().zip(link_poses.iter()) {
            for (obstacle_shape, obstacle_pose) in &self.obstacle_shapes {
                let d = GeometricShapeQueries::signed_distance(link_shape, link_pose, obstacle_shape, obstacle_pose)?;
                if d < out { out = d; }
            }
        }
        Ok(out)
    }
}
impl CollisionOracle for PlanarCollisionEnvironment {
    fn qlim(&self) -> &Vec<(f64, f64)> {
        self.robot.joint_limits()
    }
    fn is_collision(&self, configs: &Vec<DVector<f64>>) -> Result<Vec<bool>, DiffcoError> {
        let mut out_vec = Vec::with_capacity(configs.len());
        for q in configs { out_vec.push(self.single_is_collision(q)?); }
        Ok(out_vec)
    }
    fn distance(&self, configs: &Vec<DVector<f64>>) -> Result<Vec<f64>, DiffcoError> {
        let mut out_vec = Vec::with_capacity(configs.len());
        for q in configs { out_vec.push(self.single_distance(q)?); }
        Ok(out_vec)
    }
}
