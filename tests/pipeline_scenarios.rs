use std::fs;
use approx::assert_relative_eq;
use nalgebra::DVector;
use diffco::collision_environments::{CollisionOracle, PlanarCollisionEnvironment, PlanarObstacle};
use diffco::collision_proxy::FeatureTransform;
use diffco::collision_proxy::calibration::{CalibrationPolicy, Calibrator};
use diffco::collision_proxy::diffco::DiffCo;
use diffco::collision_proxy::kernels::KernelType;
use diffco::datasets::{DatasetBuilder, DatasetRequest, DatasetStorage, LabeledSamples};
use diffco::experiments::{CostSourceSelection, DiffcoExperiment, ExperimentConfig};
use diffco::nonlinear_optimization::NonlinearOptimizerType;
use diffco::path_verification::PathVerifier;
use diffco::robot_modules::planar_robot::RevolutePlanarRobot;
use diffco::robot_modules::robot_fk_module::IdentityKinematics;
use diffco::trajectory_optimization::{TrajectoryOptimizer, TrajectoryOptimizerOptions};
use diffco::trajectory_optimization::cost_sources::{CollisionCostSource, CostSourceCapability};
use diffco::utils::utils_console::DiffcoDebug;
use diffco::utils::utils_errors::DiffcoError;
use diffco::utils::utils_sampling::SimpleSamplers;

fn inside_circle(q: &DVector<f64>) -> bool {
    q.norm() < 0.5
}

fn circle_labeler(configs: &Vec<DVector<f64>>) -> Result<Vec<bool>, DiffcoError> {
    Ok(configs.iter().map(inside_circle).collect())
}

#[test]
fn scenario_a_dataset_split_sizes_and_reload() {
    let mut rng = SimpleSamplers::seeded_rng(0);
    let bounds = vec![(-1.0, 1.0), (-1.0, 1.0)];
    let request = DatasetRequest { sample_count: 12000, train_count: 10000, seed: 0 };
    let sampler = || DVector::from_vec(SimpleSamplers::uniform_samples(&bounds, &mut rng));
    let dataset = DatasetBuilder::build_dataset(&request, sampler, circle_labeler, &DiffcoDebug::Silent).unwrap();
    assert_eq!(dataset.train().len(), 10000);
    assert_eq!(dataset.test().len(), 2000);

    let dir = tempfile::tempdir().unwrap();
    let storage = DatasetStorage::new(dir.path());
    let mut rng = SimpleSamplers::seeded_rng(0);
    let first = storage.build_or_load_dataset("circle", &request, 2, || DVector::from_vec(SimpleSamplers::uniform_samples(&bounds, &mut rng)), circle_labeler, &DiffcoDebug::Silent).unwrap();
    let bytes = fs::read(storage.path_for_key("circle")).unwrap();
    let second = storage.build_or_load_dataset("circle", &request, 2, || DVector::zeros(2), |_: &Vec<DVector<f64>>| -> Result<Vec<bool>, DiffcoError> { panic!("labeler must not run on reload") }, &DiffcoDebug::Silent).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(storage.path_for_key("circle")).unwrap(), bytes);
}

#[test]
fn scenario_b_separable_circle_reaches_full_training_accuracy() {
    let mut rng = SimpleSamplers::seeded_rng(4);
    let bounds = vec![(-1.0, 1.0), (-1.0, 1.0)];
    let mut configs = vec![];
    while configs.len() < 150 {
        let q = DVector::from_vec(SimpleSamplers::uniform_samples(&bounds, &mut rng));
        if (q.norm() - 0.5).abs() > 0.05 { configs.push(q); }
    }
    let flags = circle_labeler(&configs).unwrap();
    let data = LabeledSamples::new_from_collision_flags(configs, &flags).unwrap();
    let (proxy, outcome) = DiffCo::train(&data, KernelType::RationalQuadratic, FeatureTransform::Identity, 20.0, 20000, &DiffcoDebug::Silent).unwrap();
    assert_eq!(outcome.train_accuracy, 1.0);

    let margin = Calibrator::calibrate(&proxy, &data.free_configs(), &CalibrationPolicy::default()).unwrap();
    let min_free = proxy.score(&data.free_configs()).unwrap().min();
    assert!(min_free <= margin && margin <= 0.0);
    for s in proxy.score(&data.collision_configs()).unwrap().iter() { assert!(*s - margin > 0.0); }
}

/// Constraint is satisfied everywhere.
struct ZeroCostSource;
impl CollisionCostSource for ZeroCostSource {
    fn capability(&self) -> CostSourceCapability { CostSourceCapability::Differentiable }
    fn num_dofs(&self) -> Option<usize> { None }
    fn constraint_value(&self, _q: &DVector<f64>, _margin: f64) -> Result<f64, DiffcoError> { Ok(0.0) }
    fn constraint_gradient(&self, q: &DVector<f64>, _margin: f64) -> Result<DVector<f64>, DiffcoError> { Ok(DVector::zeros(q.len())) }
}

#[test]
fn scenario_c_zero_cost_source_keeps_the_initial_path() {
    let fk = IdentityKinematics::new(vec![(-2.0, 2.0); 3]);
    let start = DVector::from_vec(vec![-1.0, 0.5, 0.0]);
    let target = DVector::from_vec(vec![1.0, -0.5, 0.3]);
    let options = TrajectoryOptimizerOptions::default();
    let init = TrajectoryOptimizer::initial_path(&start, &target, &options).unwrap();

    let res = TrajectoryOptimizer::optimize(&fk, &ZeroCostSource, &start, &target, &options, &DiffcoDebug::Silent).unwrap();
    assert!(res.success);
    assert_eq!(res.solution.len(), init.len());
    for (a, b) in res.solution.iter().zip(init.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-6);
    }
    let init_cost: f64 = init.windows(2).map(|w| (&w[1] - &w[0]).norm_squared()).sum();
    assert_relative_eq!(res.cost, init_cost, epsilon = 1e-9);
}

fn arm_and_circle() -> PlanarCollisionEnvironment {
    let robot = RevolutePlanarRobot::new_default_width(2.0, 2).unwrap();
    PlanarCollisionEnvironment::new(robot, vec![PlanarObstacle::Circle { center: (3.0, 0.0), radius: 0.6 }])
}

#[test]
fn scenario_d_single_colliding_waypoint_is_reported() {
    let env = arm_and_circle();
    let request = DatasetRequest { sample_count: 300, train_count: 300, seed: 8 };
    let dataset = DatasetBuilder::build_dataset_from_oracle(&env, &request, &DiffcoDebug::Silent).unwrap();
    let (proxy, _) = DiffCo::train(dataset.train(), KernelType::RationalQuadratic, FeatureTransform::Identity, 5.0, 3000, &DiffcoDebug::Silent).unwrap();

    let colliding = DVector::from_vec(vec![0.0, 0.0]);
    assert!(env.is_collision_single(&colliding).unwrap());
    let res = PathVerifier::check(&vec![colliding], &env, &proxy, 0.0, 0.05, None).unwrap();
    assert!(res.ground_truth_any_collision);
    assert_eq!(res.first_ground_truth_collision_idx, Some(0));
    assert_eq!(res.num_checked, 1);
}

#[test]
fn ground_truth_queries_need_a_gradient_free_optimizer() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ExperimentConfig::default();
    config.name = "gt_query".to_string();
    config.dof = Some(2);
    config.dataset = DatasetRequest { sample_count: 500, train_count: 400, seed: 2 };
    config.training.max_iterations = 2000;
    config.data_dir = Some(dir.path().to_path_buf());
    config.save_proxy = false;
    config.planner.max_time = std::time::Duration::from_secs(2);
    config.optimizer.num_waypoints = 6;
    config.optimizer.num_trials = 1;
    config.optimizer.max_iterations = 30;
    config.debug = DiffcoDebug::Silent;

    let (env, context) = DiffcoExperiment::prepare_predefined(&config).unwrap();
    let free = context.dataset().test().free_configs();
    let (start, target) = (free[0].clone(), free[1].clone());
    let planner = context.default_planner(env.qlim());

    let res = context.run_query(&env, env.robot(), &planner, &start, &target, CostSourceSelection::GroundTruth, None);
    assert!(matches!(res, Err(DiffcoError::UnsupportedOperationError(_))));

    let mut config = context.config().clone();
    config.optimizer.optimizer_type = NonlinearOptimizerType::PatternSearch;
    let (env, context) = DiffcoExperiment::prepare_predefined(&config).unwrap();
    let mut visited = 0;
    let mut hook = |_: usize, _: &DVector<f64>, _: bool, _: bool| { visited += 1; };
    let report = context.run_query(&env, env.robot(), &planner, &start, &target, CostSourceSelection::GroundTruth, Some(&mut hook)).unwrap();
    assert_eq!(report.optimization.solution[0], start);
    assert_eq!(report.optimization.solution[5], target);
    assert_eq!(visited, report.verification.num_checked);
    if report.optimization.success {
        assert!(!report.verification.ground_truth_any_collision);
    }
}
