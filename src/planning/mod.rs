use std::cell::RefCell;
use std::time::Duration;
use instant::Instant;
use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use crate::utils::utils_console::{diffco_print_debug, DiffcoDebug, PrintColor};
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_math::interpolation::SimpleInterpolationUtils;
use crate::utils::utils_sampling::SimpleSamplers;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannerOptions {
    pub max_time: Duration
}
impl Default for PlannerOptions {
    fn default() -> Self {
        Self { max_time: Duration::from_secs(10) }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannerOutput {
    pub success: bool,
    /// Empty when `success` is false.
    pub solution: Vec<DVector<f64>>,
    pub time: Duration
}
impl PlannerOutput {
    pub fn new_failure(time: Duration) -> Self {
        Self { success: false, solution: vec![], time }
    }
}

/// Produces a discrete collision free path between two configurations, or reports failure.
/// Never runs longer than `options.max_time` by more than one bounded search round.
pub trait InitialPathProvider {
    fn plan(&self,
            start: &DVector<f64>,
            target: &DVector<f64>,
            validity: &dyn Fn(&DVector<f64>) -> bool,
            options: &PlannerOptions) -> Result<PlannerOutput, DiffcoError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RRTConnectPlanner {
    joint_limits: Vec<(f64, f64)>,
    extend_length: f64,
    max_try_per_round: usize,
    num_smoothing: usize,
    seed: u64,
    debug: DiffcoDebug
}
impl RRTConnectPlanner {
    pub fn new(joint_limits: Vec<(f64, f64)>, extend_length: f64, seed: u64) -> Self {
        Self {
            joint_limits,
            extend_length,
            max_try_per_round: 2000,
            num_smoothing: 100,
            seed,
            debug: DiffcoDebug::Silent
        }
    }
    pub fn with_max_try_per_round(mut self, max_try_per_round: usize) -> Self {
        self.max_try_per_round = max_try_per_round;
        self
    }
    pub fn with_num_smoothing(mut self, num_smoothing: usize) -> Self {
        self.num_smoothing = num_smoothing;
        self
    }
    pub fn with_debug(mut self, debug: DiffcoDebug) -> Self {
        self.debug = debug;
        self
    }
}
impl InitialPathProvider for RRTConnectPlanner {
    fn plan(&self, start: &DVector<f64>, target: &DVector<f64>, validity: &dyn Fn(&DVector<f64>) -> bool, options: &PlannerOptions) -> Result<PlannerOutput, DiffcoError> {
        let timer = Instant::now();
        let n = self.joint_limits.len();
        if start.len() != n { return Err(DiffcoError::new_dimension_mismatch_error("RRTConnectPlanner::plan", start.len(), n, file!(), line!())); }
        if target.len() != n { return Err(DiffcoError::new_dimension_mismatch_error("RRTConnectPlanner::plan", target.len(), n, file!(), line!())); }
        if !(self.extend_length > 0.0) {
            return Err(DiffcoError::new_generic_error_str(&format!("extend length must be positive, got {}.", self.extend_length), file!(), line!()));
        }

        if !validity(start) || !validity(target) {
            diffco_print_debug("Start or target configuration is invalid.", &self.debug, DiffcoDebug::Summary, PrintColor::Yellow, false);
            return Ok(PlannerOutput::new_failure(timer.elapsed()));
        }

        let is_free = |q: &[f64]| validity(&DVector::from_column_slice(q));
        let rng = RefCell::new(SimpleSamplers::seeded_rng(self.seed));
        let random_sample = || SimpleSamplers::uniform_samples(&self.joint_limits, &mut *rng.borrow_mut());

        let mut round = 0;
        while timer.elapsed() < options.max_time {
            round += 1;
            let res = rrt::dual_rrt_connect(start.as_slice(), target.as_slice(), is_free, random_sample, self.extend_length, self.max_try_per_round);
            match res {
                Ok(mut path) => {
                    rrt::smooth_path(&mut path, is_free, self.extend_length, self.num_smoothing);
                    let mut solution: Vec<DVector<f64>> = path.into_iter().map(DVector::from_vec).collect();
                    if let Some(first) = solution.first_mut() { *first = start.clone(); }
                    if let Some(last) = solution.last_mut() { *last = target.clone(); }
                    diffco_print_debug(&format!("RRT-Connect found a path with {} waypoints in round {} ({:?}).", solution.len(), round, timer.elapsed()),
                                       &self.debug, DiffcoDebug::Verbose, PrintColor::Green, false);
                    return Ok(PlannerOutput { success: true, solution, time: timer.elapsed() });
                }
                Err(e) => {
                    diffco_print_debug(&format!("RRT-Connect round {} failed: {}", round, e), &self.debug, DiffcoDebug::Verbose, PrintColor::None, false);
                }
            }
        }

        diffco_print_debug(&format!("RRT-Connect gave up after {} rounds ({:?}).", round, timer.elapsed()), &self.debug, DiffcoDebug::Summary, PrintColor::Yellow, false);
        Ok(PlannerOutput::new_failure(timer.elapsed()))
    }
}

/// Succeeds only when the densified straight segment is valid everywhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StraightLinePlanner {
    max_step: f64
}
impl StraightLinePlanner {
    pub fn new(max_step: f64) -> Self {
        Self { max_step }
    }
}
impl InitialPathProvider for StraightLinePlanner {
    fn plan(&self, start: &DVector<f64>, target: &DVector<f64>, validity: &dyn Fn(&DVector<f64>) -> bool, _options: &PlannerOptions) -> Result<PlannerOutput, DiffcoError> {
        let timer = Instant::now();
        let segment = vec![start.clone(), target.clone()];
        let dense = SimpleInterpolationUtils::densify(&segment, self.max_step)?;
        if dense.iter().all(|q| validity(q)) {
            return Ok(PlannerOutput { success: true, solution: segment, time: timer.elapsed() });
        }
        Ok(PlannerOutput::new_failure(timer.elapsed()))
    }
}
