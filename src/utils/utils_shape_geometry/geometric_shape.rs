use std::sync::Arc;
use nalgebra::{Isometry3, Vector2, Vector3};
use parry3d_f64::query::Contact;
use parry3d_f64::shape::{Cuboid, Shape, Ball};
use serde::{Serialize, Deserialize};
use crate::utils::utils_errors::DiffcoError;

/// Half height used to extrude planar shapes into 3D.  Every planar cuboid spans the same z slab,
/// and balls sit on z = 0, so intersection and distance results match the 2D geometry.
pub const PLANAR_EXTRUSION_HALF_HEIGHT: f64 = 100.0;

/// A `GeometricShape` wraps a parry3d shape used for collision and distance queries between
/// robot links and obstacles in a planar scene.
/// - shape: The geometric shape object from the parry3d library.
/// - signature: A `GeometricShapeSignature` used to recognize a particular shape in query results.
///
/// Shapes are always defined at the origin.  Queries take a `PlanarPose` that places the shape
/// in the plane.
pub struct GeometricShape {
    shape: Arc<dyn Shape>,
    signature: GeometricShapeSignature
}
impl GeometricShape {
    pub fn new_cube(half_extent_x: f64,
                    half_extent_y: f64,
                    half_extent_z: f64,
                    signature: GeometricShapeSignature) -> Self {
        let cube = Cuboid::new(Vector3::new(half_extent_x,half_extent_y,half_extent_z));

        Self {
            shape: Arc::new(cube),
            signature
        }
    }
    pub fn new_sphere(radius: f64, signature: GeometricShapeSignature) -> Self {
        let sphere = Ball::new(radius);

        Self {
            shape: Arc::new(sphere),
            signature
        }
    }
    /// A rectangle of the given full size, extruded along z.
    pub fn new_planar_rectangle(size_x: f64, size_y: f64, signature: GeometricShapeSignature) -> Self {
        return Self::new_cube(size_x / 2.0, size_y / 2.0, PLANAR_EXTRUSION_HALF_HEIGHT, signature);
    }
    pub fn new_planar_circle(radius: f64, signature: GeometricShapeSignature) -> Self {
        return Self::new_sphere(radius, signature);
    }
    pub fn signature(&self) -> &GeometricShapeSignature {
        &self.signature
    }
    pub fn shape(&self) -> &dyn Shape { &*self.shape }
}
impl Clone for GeometricShape {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape.clone(),
            signature: self.signature.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum GeometricShapeSignature {
    None,
    RobotLink { link_idx: usize },
    Obstacle { obstacle_idx: usize }
}

/// Position and heading of a shape in the plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanarPose {
    translation: Vector2<f64>,
    angle: f64
}
impl PlanarPose {
    pub fn new(translation: Vector2<f64>, angle: f64) -> Self {
        Self { translation, angle }
    }
    pub fn new_translation(x: f64, y: f64) -> Self {
        Self::new(Vector2::new(x, y), 0.0)
    }
    pub fn translation(&self) -> &Vector2<f64> {
        &self.translation
    }
    pub fn angle(&self) -> f64 {
        self.angle
    }
    pub fn to_nalgebra_isometry(&self) -> Isometry3<f64> {
        Isometry3::new(Vector3::new(self.translation[0], self.translation[1], 0.0), Vector3::new(0.0, 0.0, self.angle))
    }
}

pub struct GeometricShapeQueries;
impl GeometricShapeQueries {
    pub fn intersection_test(object1: &GeometricShape,
                             object1_pose: &PlanarPose,
                             object2: &GeometricShape,
                             object2_pose: &PlanarPose) -> Result<bool, DiffcoError> {
        let pos1 = object1_pose.to_nalgebra_isometry();
        let pos2 = object2_pose.to_nalgebra_isometry();

        return parry3d_f64::query::intersection_test(&pos1, object1.shape(), &pos2, object2.shape())
            .map_err(|_| Self::unsupported_error("intersection_test", object1, object2, file!(), line!()));
    }
    pub fn distance(object1: &GeometricShape,
                    object1_pose: &PlanarPose,
                    object2: &GeometricShape,
                    object2_pose: &PlanarPose) -> Result<f64, DiffcoError> {
        let pos1 = object1_pose.to_nalgebra_isometry();
        let pos2 = object2_pose.to_nalgebra_isometry();

        return parry3d_f64::query::distance(&pos1, object1.shape(), &pos2, object2.shape())
            .map_err(|_| Self::unsupported_error("distance", object1, object2, file!(), line!()));
    }
    /// Returns None if the objects are separated by a distance greater than prediction. The result is given in world-space.
    pub fn contact(object1: &GeometricShape,
                   object1_pose: &PlanarPose,
                   object2: &GeometricShape,
                   object2_pose: &PlanarPose,
                   prediction: f64) -> Result<Option<Contact>, DiffcoError> {
        let pos1 = object1_pose.to_nalgebra_isometry();
        let pos2 = object2_pose.to_nalgebra_isometry();

        return parry3d_f64::query::contact(&pos1, object1.shape(), &pos2, object2.shape(), prediction)
            .map_err(|_| Self::unsupported_error("contact", object1, object2, file!(), line!()));
    }
    /// Clearance between the two shapes, negative penetration depth when they overlap.
    pub fn signed_distance(object1: &GeometricShape,
                           object1_pose: &PlanarPose,
                           object2: &GeometricShape,
                           object2_pose: &PlanarPose) -> Result<f64, DiffcoError> {
        let intersecting = Self::intersection_test(object1, object1_pose, object2, object2_pose)?;
        if !intersecting {
            return Self::distance(object1, object1_pose, object2, object2_pose);
        }
        let contact = Self::contact(object1, object1_pose, object2, object2_pose, 0.0)?;
        return match contact {
            None => { Ok(0.0) }
            Some(c) => { Ok(c.dist.min(0.0)) }
        }
    }
    fn unsupported_error(function_name: &str, object1: &GeometricShape, object2: &GeometricShape, file: &str, line: u32) -> DiffcoError {
        return DiffcoError::new_unsupported_operation_error(function_name, &format!("parry3d does not support this query between {:?} and {:?}.", object1.signature(), object2.signature()), file, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn circle_and_rectangle_distance_matches_planar_geometry() {
        let rect = GeometricShape::new_planar_rectangle(2.0, 2.0, GeometricShapeSignature::Obstacle { obstacle_idx: 0 });
        let circle = GeometricShape::new_planar_circle(1.0, GeometricShapeSignature::Obstacle { obstacle_idx: 1 });

        let d = GeometricShapeQueries::distance(&rect, &PlanarPose::new_translation(0.0, 0.0), &circle, &PlanarPose::new_translation(4.0, 0.0)).unwrap();
        assert_relative_eq!(d, 2.0, epsilon = 1e-6);

        let hit = GeometricShapeQueries::intersection_test(&rect, &PlanarPose::new_translation(0.0, 0.0), &circle, &PlanarPose::new_translation(1.5, 0.0)).unwrap();
        assert!(hit);
    }

    #[test]
    fn rotated_rectangle_reaches_further() {
        let bar = GeometricShape::new_planar_rectangle(4.0, 0.2, GeometricShapeSignature::RobotLink { link_idx: 0 });
        let circle = GeometricShape::new_planar_circle(0.5, GeometricShapeSignature::Obstacle { obstacle_idx: 0 });
        let circle_pose = PlanarPose::new_translation(0.0, 2.2);

        let flat = GeometricShapeQueries::intersection_test(&bar, &PlanarPose::new_translation(0.0, 0.0), &circle, &circle_pose).unwrap();
        let upright = GeometricShapeQueries::intersection_test(&bar, &PlanarPose::new(Vector2::new(0.0, 0.0), std::f64::consts::FRAC_PI_2), &circle, &circle_pose).unwrap();
        assert!(!flat);
        assert!(upright);
    }

    #[test]
    fn signed_distance_is_negative_when_overlapping() {
        let a = GeometricShape::new_planar_circle(1.0, GeometricShapeSignature::None);
        let b = GeometricShape::new_planar_circle(1.0, GeometricShapeSignature::None);
        let d = GeometricShapeQueries::signed_distance(&a, &PlanarPose::new_translation(0.0, 0.0), &b, &PlanarPose::new_translation(1.5, 0.0)).unwrap();
        assert_relative_eq!(d, -0.5, epsilon = 1e-6);
        let d = GeometricShapeQueries::signed_distance(&a, &PlanarPose::new_translation(0.0, 0.0), &b, &PlanarPose::new_translation(3.0, 0.0)).unwrap();
        assert_relative_eq!(d, 1.0, epsilon = 1e-6);
    }
}
