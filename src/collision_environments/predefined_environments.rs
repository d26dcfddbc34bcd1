use rand::Rng;
use serde::{Serialize, Deserialize};
use strum_macros::{Display, EnumIter, EnumString};
use crate::collision_environments::{PlanarCollisionEnvironment, PlanarObstacle};
use crate::robot_modules::planar_robot::RevolutePlanarRobot;
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_sampling::SimpleSamplers;

pub const DEFAULT_ENVIRONMENT_SEED: u64 = 2021;
pub const DEFAULT_LINK_WIDTH: f64 = 0.3;

/// Named obstacle layouts for planar arms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, EnumString, Display)]
pub enum PredefinedEnvironment {
    #[strum(serialize = "1rect_1circle")]
    #[serde(rename = "1rect_1circle")]
    OneRectOneCircle,
    #[strum(serialize = "3circle")]
    #[serde(rename = "3circle")]
    ThreeCircle,
    #[strum(serialize = "1rect_1circle_7d")]
    #[serde(rename = "1rect_1circle_7d")]
    OneRectOneCircle7d,
    #[strum(serialize = "2class_1")]
    #[serde(rename = "2class_1")]
    TwoClass1,
    #[strum(serialize = "2class_2")]
    #[serde(rename = "2class_2")]
    TwoClass2,
    #[strum(serialize = "3circle_7d")]
    #[serde(rename = "3circle_7d")]
    ThreeCircle7d,
    #[strum(serialize = "7d_narrow")]
    #[serde(rename = "7d_narrow")]
    SevenDNarrow,
    #[strum(serialize = "3d_halfnarrow")]
    #[serde(rename = "3d_halfnarrow")]
    ThreeDHalfNarrow
}
impl PredefinedEnvironment {
    pub fn default_dof(&self) -> usize {
        return match self {
            PredefinedEnvironment::OneRectOneCircle7d => { 7 }
            PredefinedEnvironment::ThreeCircle7d => { 7 }
            PredefinedEnvironment::SevenDNarrow => { 7 }
            _ => { 3 }
        }
    }
    /// Random layouts fix their own dof; for the fixed layouts the link length follows the dof.
    pub fn link_length(&self, dof: usize) -> Result<f64, DiffcoError> {
        return match self {
            PredefinedEnvironment::SevenDNarrow => { Ok(1.0) }
            PredefinedEnvironment::ThreeDHalfNarrow => { Ok(2.5) }
            _ => {
                match dof {
                    2 => { Ok(3.5) }
                    3 => { Ok(2.0) }
                    7 => { Ok(1.0) }
                    _ => { Err(DiffcoError::new_unsupported_operation_error("link_length", &format!("environment {} supports 2, 3 or 7 dofs, not {}.", self, dof), file!(), line!())) }
                }
            }
        }
    }
    pub fn obstacles(&self, seed: u64) -> Vec<PlanarObstacle> {
        let rect = |x: f64, y: f64, w: f64, h: f64| PlanarObstacle::Rect { center: (x, y), size: (w, h) };
        let circle = |x: f64, y: f64, r: f64| PlanarObstacle::Circle { center: (x, y), radius: r };
        return match self {
            PredefinedEnvironment::OneRectOneCircle => {
                vec![rect(4.0, 3.0, 2.0, 2.0), circle(-4.0, -3.0, 1.0)]
            }
            PredefinedEnvironment::ThreeCircle => {
                vec![circle(0.0, 4.5, 1.0), circle(-2.0, -3.0, 2.0), circle(-2.0, 2.0, 1.5)]
            }
            PredefinedEnvironment::OneRectOneCircle7d => {
                vec![circle(-2.0, 3.0, 1.0), rect(3.0, 2.0, 2.0, 2.0)]
            }
            PredefinedEnvironment::TwoClass1 => {
                vec![rect(5.0, 0.0, 2.0, 2.0), circle(-3.0, 6.0, 1.0), rect(-5.0, 2.0, 2.0, 1.5), circle(-5.0, -2.0, 1.5), circle(-3.0, -6.0, 1.0)]
            }
            PredefinedEnvironment::TwoClass2 => {
                vec![rect(0.0, 3.0, 16.0, 0.5), rect(0.0, -3.0, 16.0, 0.5)]
            }
            PredefinedEnvironment::ThreeCircle7d => {
                vec![circle(-2.0, 2.0, 1.0), circle(-3.0, 3.0, 1.0), circle(-6.0, -3.0, 1.0)]
            }
            PredefinedEnvironment::SevenDNarrow => {
                let mut rng = SimpleSamplers::seeded_rng(seed);
                let mut out_vec = Self::random_unit_rects(&mut rng, (-8.0, 1.0), (8.0, 8.0), 150);
                out_vec.extend(Self::random_unit_rects(&mut rng, (-8.0, -8.0), (8.0, -1.0), 150));
                out_vec
            }
            PredefinedEnvironment::ThreeDHalfNarrow => {
                let mut rng = SimpleSamplers::seeded_rng(seed);
                Self::random_unit_rects(&mut rng, (-8.0, 1.0), (8.0, 8.0), 150)
            }
        }
    }
    /// Builds the environment with the layout's own dof (`default_dof`) unless one is given.
    pub fn build(&self, dof: Option<usize>, seed: u64) -> Result<PlanarCollisionEnvironment, DiffcoError> {
        self.build_with_link_width(dof, DEFAULT_LINK_WIDTH, seed)
    }
    pub fn build_with_link_width(&self, dof: Option<usize>, link_width: f64, seed: u64) -> Result<PlanarCollisionEnvironment, DiffcoError> {
        let dof = match self {
            PredefinedEnvironment::SevenDNarrow => { 7 }
            PredefinedEnvironment::ThreeDHalfNarrow => { 3 }
            _ => { dof.unwrap_or(self.default_dof()) }
        };
        let robot = RevolutePlanarRobot::new(self.link_length(dof)?, link_width, dof)?;
        Ok(PlanarCollisionEnvironment::new(robot, self.obstacles(seed)))
    }
    fn random_unit_rects<R: Rng>(rng: &mut R, lb: (f64, f64), ub: (f64, f64), num: usize) -> Vec<PlanarObstacle> {
        let mut out_vec = Vec::with_capacity(num);
        for _ in 0..num {
            let x = rng.gen::<f64>() * (ub.0 - lb.0) + lb.0;
            let y = rng.gen::<f64>() * (ub.1 - lb.1) + lb.1;
            out_vec.push(PlanarObstacle::Rect { center: (x, y), size: (1.0, 1.0) });
        }
        out_vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;
    use crate::collision_environments::CollisionOracle;

    #[test]
    fn names_parse_back() {
        for e in PredefinedEnvironment::iter() {
            assert_eq!(PredefinedEnvironment::from_str(&e.to_string()).unwrap(), e);
        }
        assert_eq!(PredefinedEnvironment::from_str("3circle").unwrap(), PredefinedEnvironment::ThreeCircle);
    }

    #[test]
    fn random_layouts_are_seeded() {
        let a = PredefinedEnvironment::SevenDNarrow.obstacles(2021);
        let b = PredefinedEnvironment::SevenDNarrow.obstacles(2021);
        let c = PredefinedEnvironment::SevenDNarrow.obstacles(7);
        assert_eq!(a.len(), 300);
        assert_eq!(a, b);
        assert_ne!(a, c);
        for o in &a[..150] {
            if let PlanarObstacle::Rect { center, .. } = o { assert!(center.1 >= 1.0 && center.1 <= 8.0); }
        }
    }

    #[test]
    fn link_length_follows_dof() {
        let env = PredefinedEnvironment::ThreeCircle.build(Some(2), DEFAULT_ENVIRONMENT_SEED).unwrap();
        assert_eq!(env.robot().link_length(), 3.5);
        assert_eq!(env.num_dofs(), 2);
        assert!(PredefinedEnvironment::ThreeCircle.build(Some(4), DEFAULT_ENVIRONMENT_SEED).is_err());
        let env = PredefinedEnvironment::ThreeDHalfNarrow.build(Some(7), DEFAULT_ENVIRONMENT_SEED).unwrap();
        assert_eq!(env.num_dofs(), 3);
    }

    #[test]
    fn link_width_is_configurable() {
        let env = PredefinedEnvironment::OneRectOneCircle.build_with_link_width(None, 0.1, DEFAULT_ENVIRONMENT_SEED).unwrap();
        assert_eq!(env.robot().link_width(), 0.1);
        assert_eq!(PredefinedEnvironment::OneRectOneCircle.build(None, DEFAULT_ENVIRONMENT_SEED).unwrap().robot().link_width(), DEFAULT_LINK_WIDTH);
        assert!(PredefinedEnvironment::OneRectOneCircle.build_with_link_width(None, 0.0, DEFAULT_ENVIRONMENT_SEED).is_err());
    }
}
