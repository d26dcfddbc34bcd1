use std::path::{Path, PathBuf};
use std::time::Duration;
use instant::Instant;
use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use crate::collision_environments::{CollisionOracle, PlanarCollisionEnvironment};
use crate::collision_environments::predefined_environments::{PredefinedEnvironment, DEFAULT_ENVIRONMENT_SEED, DEFAULT_LINK_WIDTH};
use crate::collision_proxy::FeatureTransform;
use crate::collision_proxy::calibration::{CalibrationPolicy, Calibrator, ProxyEvaluation};
use crate::collision_proxy::diffco::{DiffCo, DiffCoTrainingParameters, TrainingOutcome};
use crate::collision_proxy::polyharmonic::PolyharmonicParameters;
use crate::datasets::{Dataset, DatasetRequest, DatasetStorage};
use crate::path_verification::{PathCheckResult, PathVerifier, WaypointHook};
use crate::planning::{InitialPathProvider, PlannerOptions, PlannerOutput, RRTConnectPlanner};
use crate::robot_modules::robot_fk_module::{ForwardKinematics, JointLimitUtils};
use crate::trajectory_optimization::{TrajectoryOptimizationResult, TrajectoryOptimizer, TrajectoryOptimizerOptions};
use crate::trajectory_optimization::cost_sources::{CollisionCostSource, OracleCostSource, ProxyCostSource};
use crate::utils::utils_console::{diffco_print_debug, diffco_print_warning, DiffcoDebug, PrintColor};
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_files::{DataDirLocation, DataDirUtils, FileUtils};
use crate::utils::utils_traits::SaveAndLoadable;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub extend_length: f64,
    pub max_time: Duration,
    /// Shortcutting attempts applied to a found path.
    pub num_smoothing: usize,
    pub seed: u64
}
impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            extend_length: 0.1,
            max_time: Duration::from_secs(10),
            num_smoothing: 100,
            seed: 2021
        }
    }
}

/// Which function the trajectory optimizer treats as its safety constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostSourceSelection {
    Proxy,
    GroundTruth
}

/// Everything one experiment needs.  Missing fields in a config file take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Key the dataset and proxy are stored under.
    pub name: String,
    pub environment: PredefinedEnvironment,
    pub dof: Option<usize>,
    pub environment_seed: u64,
    /// Width of every robot link.
    pub link_width: f64,
    pub dataset: DatasetRequest,
    pub training: DiffCoTrainingParameters,
    /// Replace the training transform by the environment robot's control points.
    pub fk_features: bool,
    pub poly: Option<PolyharmonicParameters>,
    pub calibration: CalibrationPolicy,
    pub planner: PlannerConfig,
    pub optimizer: TrajectoryOptimizerOptions,
    pub verification_max_step: f64,
    pub data_dir: Option<PathBuf>,
    pub save_proxy: bool,
    pub debug: DiffcoDebug
}
impl ExperimentConfig {
    pub fn load_from_path(p: &Path) -> Result<Self, DiffcoError> {
        FileUtils::load_object_from_config_file(p)
    }
    pub fn build_environment(&self) -> Result<PlanarCollisionEnvironment, DiffcoError> {
        self.environment.build_with_link_width(self.dof, self.link_width, self.environment_seed)
    }
    pub fn data_dir(&self) -> Result<PathBuf, DiffcoError> {
        return match &self.data_dir {
            Some(p) => { Ok(p.clone()) }
            None => { DataDirUtils::get_default_data_dir() }
        }
    }
}
impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "3circle_3dof".to_string(),
            environment: PredefinedEnvironment::ThreeCircle,
            dof: None,
            environment_seed: DEFAULT_ENVIRONMENT_SEED,
            link_width: DEFAULT_LINK_WIDTH,
            dataset: DatasetRequest::default(),
            training: DiffCoTrainingParameters::default(),
            fk_features: true,
            poly: None,
            calibration: CalibrationPolicy::default(),
            planner: PlannerConfig::default(),
            optimizer: TrajectoryOptimizerOptions::default(),
            verification_max_step: 0.05,
            data_dir: None,
            save_proxy: true,
            debug: DiffcoDebug::Summary
        }
    }
}

pub struct DiffcoExperiment;
impl DiffcoExperiment {
    /// Dataset, training, calibration and evaluation, in that order.
    pub fn prepare(config: &ExperimentConfig, oracle: &dyn CollisionOracle) -> Result<DiffcoExperimentContext, DiffcoError> {
        let debug = &config.debug;
        let timer = Instant::now();

        diffco_print_debug("Dataset", debug, DiffcoDebug::Summary, PrintColor::Blue, true);
        let storage = DatasetStorage::new(&config.data_dir()?);
        let dataset = storage.build_or_load_dataset_from_oracle(&config.name, oracle, &config.dataset, debug)?;
        diffco_print_debug(&format!("{} training and {} test samples, {} training collisions.", dataset.train().len(), dataset.test().len(), dataset.train().num_collisions()),
                           debug, DiffcoDebug::Summary, PrintColor::None, false);

        diffco_print_debug("Training", debug, DiffcoDebug::Summary, PrintColor::Blue, true);
        let (mut proxy, training_outcome) = DiffCo::train_with_parameters(dataset.train(), &config.training, debug)?;
        if let Some(poly) = &config.poly {
            proxy = proxy.fit_poly(poly)?;
            diffco_print_debug(&format!("Fit polyharmonic score over {} support points.", proxy.num_supports()), debug, DiffcoDebug::Summary, PrintColor::None, false);
        }
        if config.save_proxy {
            let p = DataDirUtils::get_path_to_data_dir_location(&config.data_dir()?, DataDirLocation::Proxy { key: config.name.clone() });
            if let Err(e) = proxy.save_to_path(&p) {
                diffco_print_warning(&format!("could not save proxy {:?}. ({})", config.name, e), debug);
            }
        }

        diffco_print_debug("Calibration", debug, DiffcoDebug::Summary, PrintColor::Blue, true);
        let margin = Calibrator::calibrate(&proxy, &dataset.train().free_configs(), &config.calibration)?;
        let evaluation = Calibrator::evaluate(&proxy, margin, dataset.test())?;
        diffco_print_debug(&format!("Margin {:.5}.", margin), debug, DiffcoDebug::Summary, PrintColor::None, false);
        if debug.includes(&DiffcoDebug::Summary) { evaluation.print_summary(); }
        diffco_print_debug(&format!("Experiment prepared in {:?}.", timer.elapsed()), debug, DiffcoDebug::Verbose, PrintColor::Cyan, false);

        Ok(DiffcoExperimentContext {
            config: config.clone(),
            dataset,
            proxy,
            margin,
            evaluation,
            training_outcome
        })
    }
    /// Builds the configured predefined environment and prepares an experiment on it.
    pub fn prepare_predefined(config: &ExperimentConfig) -> Result<(PlanarCollisionEnvironment, DiffcoExperimentContext), DiffcoError> {
        let env = config.build_environment()?;
        let mut config = config.clone();
        if config.fk_features {
            config.training.transform = FeatureTransform::ForwardKinematics(env.robot().clone());
        }
        let context = Self::prepare(&config, &env)?;
        Ok((env, context))
    }
}

/// Read-only state produced by `DiffcoExperiment::prepare`.
#[derive(Clone, Debug)]
pub struct DiffcoExperimentContext {
    config: ExperimentConfig,
    dataset: Dataset,
    proxy: DiffCo,
    margin: f64,
    evaluation: ProxyEvaluation,
    training_outcome: TrainingOutcome
}
impl DiffcoExperimentContext {
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
    pub fn proxy(&self) -> &DiffCo {
        &self.proxy
    }
    pub fn margin(&self) -> f64 {
        self.margin
    }
    pub fn evaluation(&self) -> &ProxyEvaluation {
        &self.evaluation
    }
    pub fn training_outcome(&self) -> &TrainingOutcome {
        &self.training_outcome
    }
    pub fn default_planner(&self, joint_limits: &Vec<(f64, f64)>) -> RRTConnectPlanner {
        RRTConnectPlanner::new(joint_limits.clone(), self.config.planner.extend_length, self.config.planner.seed)
            .with_num_smoothing(self.config.planner.num_smoothing)
            .with_debug(self.config.debug)
    }
    /// Planning, optimization and verification for one start/target pair.  If the planner fails,
    /// the optimizer starts from the straight line instead.
    pub fn run_query(&self,
                     oracle: &dyn CollisionOracle,
                     robot_fk: &dyn ForwardKinematics,
                     planner: &dyn InitialPathProvider,
                     start: &DVector<f64>,
                     target: &DVector<f64>,
                     cost_source_selection: CostSourceSelection,
                     hook: Option<WaypointHook>) -> Result<PlanningQueryReport, DiffcoError> {
        let debug = &self.config.debug;
        JointLimitUtils::check_joint_limits_match(oracle.qlim(), robot_fk.joint_limits())?;

        diffco_print_debug("Planning", debug, DiffcoDebug::Summary, PrintColor::Blue, true);
        let validity = |q: &DVector<f64>| -> bool {
            return match cost_source_selection {
                CostSourceSelection::Proxy => { self.proxy.score_single(q).map(|s| s - self.margin <= 0.0).unwrap_or(false) }
                CostSourceSelection::GroundTruth => { oracle.is_collision_single(q).map(|c| !c).unwrap_or(false) }
            }
        };
        let planner_output = planner.plan(start, target, &validity, &PlannerOptions { max_time: self.config.planner.max_time })?;

        let mut options = self.config.optimizer.clone();
        if planner_output.success {
            options.init_solution = Some(planner_output.solution.clone());
        } else {
            diffco_print_warning("planner found no path, optimizing from the straight line.", debug);
            options.init_solution = None;
        }

        diffco_print_debug("Optimization", debug, DiffcoDebug::Summary, PrintColor::Blue, true);
        let proxy_source = ProxyCostSource::new(&self.proxy);
        let oracle_source = OracleCostSource::new(oracle);
        let cost_source: &dyn CollisionCostSource = match cost_source_selection {
            CostSourceSelection::Proxy => {
                options.safety_margin = self.margin;
                &proxy_source
            }
            CostSourceSelection::GroundTruth => { &oracle_source }
        };
        let optimization = TrajectoryOptimizer::optimize(robot_fk, cost_source, start, target, &options, debug)?;

        diffco_print_debug("Verification", debug, DiffcoDebug::Summary, PrintColor::Blue, true);
        let verification = PathVerifier::check(&optimization.solution, oracle, &self.proxy, self.margin, self.config.verification_max_step, hook)?;
        if debug.includes(&DiffcoDebug::Summary) { verification.print_summary(); }

        Ok(PlanningQueryReport {
            planner_output,
            optimization,
            verification
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlanningQueryReport {
    pub planner_output: PlannerOutput,
    pub optimization: TrajectoryOptimizationResult,
    pub verification: PathCheckResult
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot_modules::robot_fk_module::IdentityKinematics;
    use crate::utils::utils_traits::{ToAndFromRonString, ToAndFromTomlString};

    #[test]
    fn partial_toml_config_fills_defaults() {
        let s = r#"
name = "toml_experiment"
environment = "2class_1"
verification_max_step = 0.1
link_width = 0.2
debug = "Silent"

[dataset]
sample_count = 500
train_count = 400
seed = 3
"#;
        let config = ExperimentConfig::load_from_toml_string(s).unwrap();
        assert_eq!(config.name, "toml_experiment");
        assert_eq!(config.environment, PredefinedEnvironment::TwoClass1);
        assert_eq!(config.dataset.test_count(), 100);
        assert_eq!(config.debug, DiffcoDebug::Silent);
        assert_eq!(config.optimizer, TrajectoryOptimizerOptions::default());
        assert_eq!(config.build_environment().unwrap().robot().link_width(), 0.2);
    }

    #[test]
    fn partial_ron_config_fills_defaults() {
        let config = ExperimentConfig::load_from_ron_string("(name: \"ron_experiment\", dof: Some(2), save_proxy: false)").unwrap();
        assert_eq!(config.dof, Some(2));
        assert!(!config.save_proxy);
        assert_eq!(config.environment, PredefinedEnvironment::ThreeCircle);
        assert_eq!(config.link_width, DEFAULT_LINK_WIDTH);
        assert_eq!(config.planner.num_smoothing, 100);
    }

    fn small_config(dir: &Path) -> ExperimentConfig {
        let mut config = ExperimentConfig::default();
        config.name = "small".to_string();
        config.dof = Some(2);
        config.dataset = DatasetRequest { sample_count: 600, train_count: 500, seed: 1 };
        config.training.max_iterations = 3000;
        config.data_dir = Some(dir.to_path_buf());
        config.planner.max_time = Duration::from_secs(2);
        config.optimizer.num_waypoints = 8;
        config.optimizer.num_trials = 1;
        config.optimizer.max_iterations = 100;
        config.debug = DiffcoDebug::Silent;
        config
    }

    #[test]
    fn prepare_stores_dataset_and_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let (_env, context) = DiffcoExperiment::prepare_predefined(&config).unwrap();
        assert_eq!(context.dataset().train().len(), 500);
        assert_eq!(context.dataset().test().len(), 100);
        assert!(context.margin() <= 0.0);
        assert!(dir.path().join("landscape").join("small.json").exists());
        let proxy_path = dir.path().join("proxies").join("small.json");
        let loaded = DiffCo::load_from_path(&proxy_path).unwrap();
        assert_eq!(loaded.num_supports(), context.proxy().num_supports());
    }

    #[test]
    fn query_pins_endpoints_and_audits_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let (env, context) = DiffcoExperiment::prepare_predefined(&config).unwrap();
        let free = context.dataset().test().free_configs();
        let start = free[0].clone();
        let target = free[free.len() - 1].clone();
        let planner = context.default_planner(env.qlim());
        let report = context.run_query(&env, env.robot(), &planner, &start, &target, CostSourceSelection::Proxy, None).unwrap();
        assert_eq!(report.optimization.solution.len(), 8);
        assert_eq!(report.optimization.solution[0], start);
        assert_eq!(report.optimization.solution[7], target);
        assert!(report.verification.num_checked >= 8);
    }

    #[test]
    fn mismatched_joint_limits_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let (env, context) = DiffcoExperiment::prepare_predefined(&config).unwrap();
        let fk = IdentityKinematics::new(vec![(-1.0, 1.0), (-1.0, 1.0)]);
        let planner = context.default_planner(env.qlim());
        let q = DVector::zeros(2);
        let res = context.run_query(&env, &fk, &planner, &q, &q, CostSourceSelection::Proxy, None);
        assert!(matches!(res, Err(DiffcoError::JointLimitMismatchError(_))));
    }
}
