use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use crate::collision_environments::CollisionOracle;
use crate::collision_proxy::calibration::Calibrator;
use crate::collision_proxy::diffco::DiffCo;
use crate::utils::utils_console::{diffco_print, PrintColor, PrintMode};
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_math::interpolation::SimpleInterpolationUtils;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCheckResult {
    pub ground_truth_any_collision: bool,
    pub proxy_any_collision: bool,
    /// Indices refer to the densified path.
    pub first_ground_truth_collision_idx: Option<usize>,
    pub first_proxy_collision_idx: Option<usize>,
    pub num_checked: usize
}
impl PathCheckResult {
    pub fn print_summary(&self) {
        let color = |b: bool| if b { PrintColor::Red } else { PrintColor::Green };
        diffco_print("Ground truth collision: ", PrintMode::Print, PrintColor::Blue, true);
        diffco_print(&format!("{} ({:?})", self.ground_truth_any_collision, self.first_ground_truth_collision_idx), PrintMode::Println, color(self.ground_truth_any_collision), false);
        diffco_print("Proxy collision: ", PrintMode::Print, PrintColor::Blue, true);
        diffco_print(&format!("{} ({:?})", self.proxy_any_collision, self.first_proxy_collision_idx), PrintMode::Println, color(self.proxy_any_collision), false);
        diffco_print(&format!("{} configurations checked.", self.num_checked), PrintMode::Println, PrintColor::None, false);
    }
}

/// Called once per densified configuration with `(idx, q, ground_truth_collision, proxy_collision)`.
pub type WaypointHook<'a> = &'a mut dyn FnMut(usize, &DVector<f64>, bool, bool);

pub struct PathVerifier;
impl PathVerifier {
    pub fn densify(path: &Vec<DVector<f64>>, max_step: f64) -> Result<Vec<DVector<f64>>, DiffcoError> {
        SimpleInterpolationUtils::densify(path, max_step)
    }
    /// Audits `path` against both the oracle and the proxy thresholded at `margin`.  The path
    /// itself is left untouched.
    pub fn check(path: &Vec<DVector<f64>>,
                 oracle: &dyn CollisionOracle,
                 proxy: &DiffCo,
                 margin: f64,
                 max_step: f64,
                 hook: Option<WaypointHook>) -> Result<PathCheckResult, DiffcoError> {
        let dense = Self::densify(path, max_step)?;
        for q in &dense {
            if q.len() != oracle.num_dofs() {
                return Err(DiffcoError::new_dimension_mismatch_error("PathVerifier::check", q.len(), oracle.num_dofs(), file!(), line!()));
            }
        }

        let ground_truth = oracle.is_collision(&dense)?;
        if ground_truth.len() != dense.len() {
            return Err(DiffcoError::new_dimension_mismatch_error("PathVerifier::check", ground_truth.len(), dense.len(), file!(), line!()));
        }
        let predicted = Calibrator::predict(proxy, margin, &dense)?;

        if let Some(hook) = hook {
            for (i, q) in dense.iter().enumerate() {
                hook(i, q, ground_truth[i], predicted[i]);
            }
        }

        let first_ground_truth_collision_idx = ground_truth.iter().position(|b| *b);
        let first_proxy_collision_idx = predicted.iter().position(|b| *b);
        Ok(PathCheckResult {
            ground_truth_any_collision: first_ground_truth_collision_idx.is_some(),
            proxy_any_collision: first_proxy_collision_idx.is_some(),
            first_ground_truth_collision_idx,
            first_proxy_collision_idx,
            num_checked: dense.len()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision_environments::{PlanarCollisionEnvironment, PlanarObstacle};
    use crate::collision_proxy::FeatureTransform;
    use crate::collision_proxy::kernels::KernelType;
    use crate::datasets::{DatasetBuilder, DatasetRequest};
    use crate::robot_modules::planar_robot::RevolutePlanarRobot;
    use crate::utils::utils_console::DiffcoDebug;

    fn setup() -> (PlanarCollisionEnvironment, DiffCo) {
        let robot = RevolutePlanarRobot::new_default_width(2.0, 2).unwrap();
        let env = PlanarCollisionEnvironment::new(robot, vec![PlanarObstacle::Circle { center: (2.5, 0.0), radius: 0.5 }]);
        let request = DatasetRequest { sample_count: 400, train_count: 300, seed: 5 };
        let dataset = DatasetBuilder::build_dataset_from_oracle(&env, &request, &DiffcoDebug::Silent).unwrap();
        let (proxy, _) = DiffCo::train(dataset.train(), KernelType::RationalQuadratic, FeatureTransform::Identity, 5.0, 5000, &DiffcoDebug::Silent).unwrap();
        (env, proxy)
    }

    #[test]
    fn hook_sees_every_densified_configuration() {
        let (env, proxy) = setup();
        let path = vec![DVector::from_vec(vec![-2.0, 0.0]), DVector::from_vec(vec![2.0, 0.0])];
        let mut seen = vec![];
        let mut hook = |i: usize, q: &DVector<f64>, gt: bool, _p: bool| { seen.push((i, q.clone(), gt)); };
        let res = PathVerifier::check(&path, &env, &proxy, 0.0, 0.15, Some(&mut hook)).unwrap();
        assert_eq!(seen.len(), res.num_checked);
        assert_eq!(res.num_checked, 28);
        assert!(res.ground_truth_any_collision);
        let first = res.first_ground_truth_collision_idx.unwrap();
        assert!(seen[first].2);
        assert!(seen[..first].iter().all(|s| !s.2));
        assert_eq!(seen[0].1, path[0]);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn clear_path_reports_no_ground_truth_collision() {
        let (env, proxy) = setup();
        let path = vec![DVector::from_vec(vec![2.0, 0.0]), DVector::from_vec(vec![3.0, 0.0])];
        let res = PathVerifier::check(&path, &env, &proxy, 0.0, 0.05, None).unwrap();
        assert!(!res.ground_truth_any_collision);
        assert_eq!(res.first_ground_truth_collision_idx, None);
    }

    #[test]
    fn wrong_dimension_is_an_error() {
        let (env, proxy) = setup();
        let path = vec![DVector::from_vec(vec![0.0, 0.0, 0.0])];
        assert!(PathVerifier::check(&path, &env, &proxy, 0.0, 0.05, None).is_err());
        assert!(PathVerifier::densify(&path, 0.0).is_err());
    }
}
