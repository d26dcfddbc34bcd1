pub mod cost_sources;

use std::time::Duration;
use instant::Instant;
use itertools::Itertools;
use nalgebra::{DMatrix, DVector};
use serde::{Serialize, Deserialize};
use crate::nonlinear_optimization::{NonlinearOptimizer, NonlinearOptimizerType, NonlinearProblem, OptimizerParameters, SolverExitStatus};
use crate::robot_modules::robot_fk_module::{ForwardKinematics, JointLimitUtils};
use crate::trajectory_optimization::cost_sources::{CollisionCostSource, CostSourceCapability};
use crate::utils::utils_console::{diffco_print_debug, DiffcoDebug, PrintColor};
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_math::interpolation::{LinearInterpolationMode, SimpleInterpolationUtils};
use crate::utils::utils_sampling::SimpleSamplers;

pub type TrajectoryOptimizerType = NonlinearOptimizerType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySolverParameters {
    pub max_time: Option<Duration>,
    pub max_outer_iterations: Option<usize>,
    pub tolerance: Option<f64>,
    pub learning_rate: f64,
    pub penalty_weight: f64,
    /// Standard deviation of the noise added to interior waypoints for restarts after the first.
    pub perturbation_scale: f64,
    /// First poll radius of the pattern search.
    pub initial_step: f64
}
impl TrajectorySolverParameters {
    fn to_optimizer_parameters(&self, max_iterations: usize) -> OptimizerParameters {
        let mut out = OptimizerParameters::new_empty();
        out.set_max_iterations(max_iterations);
        if let Some(a) = &self.max_time { out.set_max_time(a.clone()); }
        if let Some(a) = &self.max_outer_iterations { out.set_max_outer_iterations(*a); }
        if let Some(a) = &self.tolerance { out.set_tolerance(*a); }
        out.learning_rate = self.learning_rate;
        out.penalty_weight = self.penalty_weight;
        out.initial_step = self.initial_step;
        out
    }
}
impl Default for TrajectorySolverParameters {
    fn default() -> Self {
        Self {
            max_time: None,
            max_outer_iterations: None,
            tolerance: None,
            learning_rate: 0.01,
            penalty_weight: 100.0,
            perturbation_scale: 0.2,
            initial_step: 0.1
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryOptimizerOptions {
    /// Includes the pinned start and target.
    pub num_waypoints: usize,
    pub num_trials: usize,
    pub max_iterations: usize,
    pub safety_margin: f64,
    /// Collision checking resolution in configuration space.
    pub max_step: f64,
    pub seed: u64,
    /// Resampled to `num_waypoints` by arc length; its endpoints are replaced by start and target.
    pub init_solution: Option<Vec<DVector<f64>>>,
    pub optimizer_type: TrajectoryOptimizerType,
    pub solver_parameters: TrajectorySolverParameters
}
impl Default for TrajectoryOptimizerOptions {
    fn default() -> Self {
        Self {
            num_waypoints: 12,
            num_trials: 3,
            max_iterations: 500,
            safety_margin: 0.0,
            max_step: 0.05,
            seed: 2021,
            init_solution: None,
            optimizer_type: TrajectoryOptimizerType::Adam,
            solver_parameters: TrajectorySolverParameters::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialDiagnostics {
    pub trial_idx: usize,
    pub exit_status: SolverExitStatus,
    pub num_inner_iterations: usize,
    pub num_outer_iterations: usize,
    pub solve_time: Duration,
    pub cost: f64,
    pub constraint_violation: f64,
    pub feasible: bool
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryOptimizationResult {
    pub solution: Vec<DVector<f64>>,
    /// Every configuration of the solution densified to `max_step` satisfies the constraint.
    pub success: bool,
    pub time: Duration,
    pub cost: f64,
    /// Largest positive constraint value along the densified solution.
    pub constraint_violation: f64,
    pub trials: Vec<TrialDiagnostics>
}

pub struct TrajectoryOptimizer;
impl TrajectoryOptimizer {
    pub fn optimize(robot_fk: &dyn ForwardKinematics,
                    cost_source: &dyn CollisionCostSource,
                    start: &DVector<f64>,
                    target: &DVector<f64>,
                    options: &TrajectoryOptimizerOptions,
                    debug: &DiffcoDebug) -> Result<TrajectoryOptimizationResult, DiffcoError> {
        let timer = Instant::now();
        let dof = robot_fk.num_dofs();
        robot_fk.check_dimension(start, "TrajectoryOptimizer::optimize")?;
        robot_fk.check_dimension(target, "TrajectoryOptimizer::optimize")?;
        if let Some(n) = cost_source.num_dofs() {
            if n != dof { return Err(DiffcoError::new_dimension_mismatch_error("TrajectoryOptimizer::optimize", n, dof, file!(), line!())); }
        }
        if options.num_waypoints < 2 {
            return Err(DiffcoError::new_generic_error_str(&format!("num_waypoints must be at least 2, got {}.", options.num_waypoints), file!(), line!()));
        }
        if options.num_trials < 1 {
            return Err(DiffcoError::new_generic_error_str("num_trials must be at least 1.", file!(), line!()));
        }
        if !(options.max_step > 0.0) {
            return Err(DiffcoError::new_generic_error_str(&format!("max_step must be positive, got {}.", options.max_step), file!(), line!()));
        }
        if !(options.solver_parameters.perturbation_scale >= 0.0) {
            return Err(DiffcoError::new_generic_error_str(&format!("perturbation_scale must be non-negative, got {}.", options.solver_parameters.perturbation_scale), file!(), line!()));
        }
        if options.optimizer_type.requires_gradient() && cost_source.capability() == CostSourceCapability::NonDifferentiable {
            return Err(DiffcoError::new_unsupported_operation_error("TrajectoryOptimizer::optimize",
                                                                    &format!("{:?} needs gradients but the cost source is not differentiable.", options.optimizer_type), file!(), line!()));
        }

        let init_path = Self::initial_path(start, target, options)?;
        let problem = TrajectoryProblem::new(robot_fk, cost_source, start, target, options.num_waypoints - 2, options.safety_margin)?;

        if problem.num_interior == 0 {
            let cost = problem.path_cost(&init_path)?;
            let violation = Self::densified_violation(cost_source, &init_path, options)?;
            return Ok(TrajectoryOptimizationResult {
                solution: init_path,
                success: violation == 0.0,
                time: timer.elapsed(),
                cost,
                constraint_violation: violation,
                trials: vec![]
            });
        }

        let joint_limits = robot_fk.joint_limits();
        let bounds = problem.bounds();
        let init_x = problem.flatten_interior(&init_path);
        let optimizer = NonlinearOptimizer::new(options.optimizer_type);
        let parameters = options.solver_parameters.to_optimizer_parameters(options.max_iterations);
        let mut rng = SimpleSamplers::seeded_rng(options.seed);

        let mut trials = vec![];
        let mut best: Option<(Vec<DVector<f64>>, f64, f64)> = None;
        for trial_idx in 0..options.num_trials {
            let mut x0 = init_x.clone();
            if trial_idx > 0 {
                let means_and_deviations: Vec<(f64, f64)> = x0.iter().map(|v| (*v, options.solver_parameters.perturbation_scale)).collect();
                x0 = DVector::from_vec(SimpleSamplers::normal_samples(&means_and_deviations, &mut rng)?);
            }
            for (i, b) in bounds.iter().enumerate() { x0[i] = x0[i].max(b.0).min(b.1); }

            let res = optimizer.optimize(&problem, &x0, &parameters)?;
            let mut solution = problem.unflatten(res.x_min());
            for q in solution.iter_mut().skip(1).take(problem.num_interior) {
                JointLimitUtils::clamp_to_joint_limits(q, joint_limits);
            }
            let cost = problem.path_cost(&solution)?;
            let violation = Self::densified_violation(cost_source, &solution, options)?;
            let feasible = violation == 0.0;

            diffco_print_debug(&format!("Trial {}: {:?} after {} iterations, cost {:.5}, violation {:.5}.", trial_idx, res.exit_status(), res.num_inner_iterations(), cost, violation),
                               debug, DiffcoDebug::Verbose, if feasible { PrintColor::Green } else { PrintColor::Yellow }, false);

            trials.push(TrialDiagnostics {
                trial_idx,
                exit_status: res.exit_status(),
                num_inner_iterations: res.num_inner_iterations(),
                num_outer_iterations: res.num_outer_iterations(),
                solve_time: res.solve_time(),
                cost,
                constraint_violation: violation,
                feasible
            });

            let replace = match &best {
                None => { true }
                Some((_, best_cost, best_violation)) => {
                    if feasible && *best_violation == 0.0 { cost < *best_cost }
                    else if feasible { true }
                    else { *best_violation > 0.0 && violation < *best_violation }
                }
            };
            if replace { best = Some((solution, cost, violation)); }
        }

        let (solution, cost, violation) = match best {
            Some(b) => { b }
            None => { return Err(DiffcoError::new_generic_error_str("no optimization trial was run.", file!(), line!())); }
        };
        let success = violation == 0.0;
        diffco_print_debug(&format!("Trajectory optimization {} in {:?} (cost {:.5}).", if success { "succeeded" } else { "failed" }, timer.elapsed(), cost),
                           debug, DiffcoDebug::Summary, if success { PrintColor::Green } else { PrintColor::Yellow }, false);

        Ok(TrajectoryOptimizationResult {
            solution,
            success,
            time: timer.elapsed(),
            cost,
            constraint_violation: violation,
            trials
        })
    }
    /// Straight line from start to target, or the given path resampled, with both ends pinned.
    pub fn initial_path(start: &DVector<f64>, target: &DVector<f64>, options: &TrajectoryOptimizerOptions) -> Result<Vec<DVector<f64>>, DiffcoError> {
        let mut out = match &options.init_solution {
            None => {
                SimpleInterpolationUtils::linear_interpolation(start, target, &LinearInterpolationMode::FixedNumKnots { num_knots: options.num_waypoints })
            }
            Some(init) => {
                for q in init {
                    if q.len() != start.len() { return Err(DiffcoError::new_dimension_mismatch_error("TrajectoryOptimizer::initial_path", q.len(), start.len(), file!(), line!())); }
                }
                SimpleInterpolationUtils::resample_by_arc_length(init, options.num_waypoints)?
            }
        };
        let last = out.len() - 1;
        out[0] = start.clone();
        out[last] = target.clone();
        Ok(out)
    }
    fn densified_violation(cost_source: &dyn CollisionCostSource, path: &Vec<DVector<f64>>, options: &TrajectoryOptimizerOptions) -> Result<f64, DiffcoError> {
        let dense = SimpleInterpolationUtils::densify(path, options.max_step)?;
        let mut violation: f64 = 0.0;
        for q in &dense {
            let v = cost_source.constraint_value(q, options.safety_margin)?;
            if v.is_nan() { return Ok(f64::INFINITY); }
            violation = violation.max(v);
        }
        Ok(violation)
    }
}

/// Interior waypoints flattened into one decision vector; start and target stay fixed.
struct TrajectoryProblem<'a> {
    robot_fk: &'a dyn ForwardKinematics,
    cost_source: &'a dyn CollisionCostSource,
    start: DVector<f64>,
    target: DVector<f64>,
    start_fk: DVector<f64>,
    target_fk: DVector<f64>,
    num_interior: usize,
    dof: usize,
    margin: f64
}
impl<'a> TrajectoryProblem<'a> {
    fn new(robot_fk: &'a dyn ForwardKinematics, cost_source: &'a dyn CollisionCostSource, start: &DVector<f64>, target: &DVector<f64>, num_interior: usize, margin: f64) -> Result<Self, DiffcoError> {
        Ok(Self {
            robot_fk,
            cost_source,
            start: start.clone(),
            target: target.clone(),
            start_fk: robot_fk.fkine(start)?,
            target_fk: robot_fk.fkine(target)?,
            num_interior,
            dof: robot_fk.num_dofs(),
            margin
        })
    }
    fn waypoint(&self, x: &[f64], i: usize) -> DVector<f64> {
        DVector::from_column_slice(&x[i * self.dof..(i + 1) * self.dof])
    }
    fn flatten_interior(&self, path: &Vec<DVector<f64>>) -> DVector<f64> {
        let mut out = DVector::zeros(self.num_interior * self.dof);
        for i in 0..self.num_interior {
            out.rows_mut(i * self.dof, self.dof).copy_from(&path[i + 1]);
        }
        out
    }
    fn unflatten(&self, x: &DVector<f64>) -> Vec<DVector<f64>> {
        let mut out = vec![self.start.clone()];
        for i in 0..self.num_interior { out.push(self.waypoint(x.as_slice(), i)); }
        out.push(self.target.clone());
        out
    }
    fn path_cost(&self, path: &Vec<DVector<f64>>) -> Result<f64, DiffcoError> {
        let fks = self.robot_fk.fkine_batch(path)?;
        Ok(fks.iter().tuple_windows().map(|(a, b)| (b - a).norm_squared()).sum())
    }
    fn all_fks(&self, x: &[f64]) -> Result<Vec<DVector<f64>>, DiffcoError> {
        let mut out = vec![self.start_fk.clone()];
        for i in 0..self.num_interior { out.push(self.robot_fk.fkine(&self.waypoint(x, i))?); }
        out.push(self.target_fk.clone());
        Ok(out)
    }
}
impl<'a> NonlinearProblem for TrajectoryProblem<'a> {
    fn problem_size(&self) -> usize { self.num_interior * self.dof }
    fn bounds(&self) -> Vec<(f64, f64)> {
        let mut out = vec![];
        for _ in 0..self.num_interior { out.extend(self.robot_fk.joint_limits().iter().cloned()); }
        out
    }
    fn cost(&self, x: &[f64]) -> Result<f64, DiffcoError> {
        let fks = self.all_fks(x)?;
        Ok(fks.iter().tuple_windows().map(|(a, b)| (b - a).norm_squared()).sum())
    }
    fn cost_gradient(&self, x: &[f64]) -> Result<DVector<f64>, DiffcoError> {
        let fks = self.all_fks(x)?;
        let mut out = DVector::zeros(self.problem_size());
        for i in 0..self.num_interior {
            let k = i + 1;
            let residual = (&fks[k] - &fks[k - 1]) - (&fks[k + 1] - &fks[k]);
            let j = self.robot_fk.fkine_jacobian(&self.waypoint(x, i))?;
            out.rows_mut(i * self.dof, self.dof).copy_from(&(2.0 * j.transpose() * residual));
        }
        Ok(out)
    }
    fn num_inequality_constraints(&self) -> usize { self.num_interior }
    fn inequality_constraints(&self, x: &[f64]) -> Result<DVector<f64>, DiffcoError> {
        let mut out = DVector::zeros(self.num_interior);
        for i in 0..self.num_interior {
            out[i] = self.cost_source.constraint_value(&self.waypoint(x, i), self.margin)?;
        }
        Ok(out)
    }
    fn inequality_constraints_jacobian(&self, x: &[f64]) -> Result<DMatrix<f64>, DiffcoError> {
        let mut out = DMatrix::zeros(self.num_interior, self.problem_size());
        for i in 0..self.num_interior {
            let g = self.cost_source.constraint_gradient(&self.waypoint(x, i), self.margin)?;
            for d in 0..self.dof { out[(i, i * self.dof + d)] = g[d]; }
        }
        Ok(out)
    }
    fn inequality_constraint_gradient(&self, x: &[f64], idx: usize) -> Result<DVector<f64>, DiffcoError> {
        if idx >= self.num_interior { return Err(DiffcoError::new_idx_out_of_bound_error(idx, self.num_interior, file!(), line!())); }
        let mut out = DVector::zeros(self.problem_size());
        let g = self.cost_source.constraint_gradient(&self.waypoint(x, idx), self.margin)?;
        out.rows_mut(idx * self.dof, self.dof).copy_from(&g);
        Ok(out)
    }
}
