#[cfg(feature = "nlopt_optimization")]
use std::cell::RefCell;
use std::time::Duration;
use instant::Instant;
use nalgebra::{DMatrix, DVector};
use optimization_engine::{constraints, Optimizer, Problem, SolverError};
use optimization_engine::alm::{AlmCache, AlmFactory, AlmOptimizer, AlmProblem, NO_JACOBIAN_MAPPING, NO_MAPPING, NO_SET};
use optimization_engine::core::ExitStatus;
use optimization_engine::panoc::{PANOCCache, PANOCOptimizer};
use serde::{Serialize, Deserialize};
use crate::utils::utils_errors::DiffcoError;
#[cfg(feature = "nlopt_optimization")]
use nlopt::{Algorithm, Nlopt, Target};

/// A bounded minimization problem with inequality constraints `g(x) <= 0`.
pub trait NonlinearProblem {
    fn problem_size(&self) -> usize;
    fn bounds(&self) -> Vec<(f64, f64)>;
    fn cost(&self, x: &[f64]) -> Result<f64, DiffcoError>;
    fn cost_gradient(&self, x: &[f64]) -> Result<DVector<f64>, DiffcoError>;
    fn num_inequality_constraints(&self) -> usize;
    fn inequality_constraints(&self, x: &[f64]) -> Result<DVector<f64>, DiffcoError>;
    /// Row `i` is the gradient of constraint `i`.
    fn inequality_constraints_jacobian(&self, x: &[f64]) -> Result<DMatrix<f64>, DiffcoError>;
    fn inequality_constraint_gradient(&self, x: &[f64], idx: usize) -> Result<DVector<f64>, DiffcoError> {
        let j = self.inequality_constraints_jacobian(x)?;
        if idx >= j.nrows() { return Err(DiffcoError::new_idx_out_of_bound_error(idx, j.nrows(), file!(), line!())); }
        Ok(j.row(idx).transpose())
    }
    /// Cost plus `weight * Σ max(0, g_i)²`.
    fn penalized_cost(&self, x: &[f64], weight: f64) -> Result<f64, DiffcoError> {
        let c = self.cost(x)?;
        if self.num_inequality_constraints() == 0 { return Ok(c); }
        let g = self.inequality_constraints(x)?;
        Ok(c + weight * g.iter().map(|v| v.max(0.0).powi(2)).sum::<f64>())
    }
    fn penalized_cost_gradient(&self, x: &[f64], weight: f64) -> Result<DVector<f64>, DiffcoError> {
        let mut grad = self.cost_gradient(x)?;
        if self.num_inequality_constraints() == 0 { return Ok(grad); }
        let g = self.inequality_constraints(x)?;
        for (i, v) in g.iter().enumerate() {
            if *v > 0.0 { grad += (2.0 * weight * *v) * self.inequality_constraint_gradient(x, i)?; }
        }
        Ok(grad)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonlinearOptimizerType {
    OpEn,
    Adam,
    PatternSearch,
    #[cfg(feature = "nlopt_optimization")]
    NloptSLSQP,
    #[cfg(feature = "nlopt_optimization")]
    NloptCOBYLA
}
impl NonlinearOptimizerType {
    pub fn requires_gradient(&self) -> bool {
        return match self {
            NonlinearOptimizerType::OpEn => { true }
            NonlinearOptimizerType::Adam => { true }
            NonlinearOptimizerType::PatternSearch => { false }
            #[cfg(feature = "nlopt_optimization")]
            NonlinearOptimizerType::NloptSLSQP => { true }
            #[cfg(feature = "nlopt_optimization")]
            NonlinearOptimizerType::NloptCOBYLA => { false }
        }
    }
}

#[derive(Clone, Debug)]
pub enum NonlinearOptimizer {
    OpEn(OpEnNonlinearOptimizer),
    Adam(AdamNonlinearOptimizer),
    PatternSearch(PatternSearchNonlinearOptimizer),
    #[cfg(feature = "nlopt_optimization")]
    Nlopt(NLoptNonlinearOptimizer)
}
impl NonlinearOptimizer {
    pub fn new(t: NonlinearOptimizerType) -> Self {
        return match t {
            NonlinearOptimizerType::OpEn => { Self::OpEn(OpEnNonlinearOptimizer) }
            NonlinearOptimizerType::Adam => { Self::Adam(AdamNonlinearOptimizer) }
            NonlinearOptimizerType::PatternSearch => { Self::PatternSearch(PatternSearchNonlinearOptimizer) }
            #[cfg(feature = "nlopt_optimization")]
            NonlinearOptimizerType::NloptSLSQP => { Self::Nlopt(NLoptNonlinearOptimizer::new_slsqp()) }
            #[cfg(feature = "nlopt_optimization")]
            NonlinearOptimizerType::NloptCOBYLA => { Self::Nlopt(NLoptNonlinearOptimizer::new_cobyla()) }
        }
    }
    /// Budget exhaustion and solver failures are reported in the result's exit status.  Errors
    /// are only returned for malformed inputs.
    pub fn optimize(&self, problem: &dyn NonlinearProblem, init_condition: &DVector<f64>, parameters: &OptimizerParameters) -> Result<OptimizerResult, DiffcoError> {
        if init_condition.len() != problem.problem_size() {
            return Err(DiffcoError::new_dimension_mismatch_error("NonlinearOptimizer::optimize", init_condition.len(), problem.problem_size(), file!(), line!()));
        }
        if problem.bounds().len() != problem.problem_size() {
            return Err(DiffcoError::new_dimension_mismatch_error("NonlinearOptimizer::optimize", problem.bounds().len(), problem.problem_size(), file!(), line!()));
        }
        return match self {
            NonlinearOptimizer::OpEn(n) => { n.optimize(problem, init_condition, parameters) }
            NonlinearOptimizer::Adam(n) => { n.optimize(problem, init_condition, parameters) }
            NonlinearOptimizer::PatternSearch(n) => { n.optimize(problem, init_condition, parameters) }
            #[cfg(feature = "nlopt_optimization")]
            NonlinearOptimizer::Nlopt(n) => { n.optimize(problem, init_condition, parameters) }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

fn solver_error_from(_e: DiffcoError) -> SolverError {
    SolverError::Cost
}

fn positive_tolerance(parameters: &OptimizerParameters, default: f64) -> f64 {
    parameters.tolerance.filter(|t| *t > 0.0).unwrap_or(default)
}

fn split_bounds(bounds: &Vec<(f64, f64)>) -> (Vec<f64>, Vec<f64>) {
    let mut lower_bounds = vec![];
    let mut upper_bounds = vec![];
    for b in bounds {
        lower_bounds.push(b.0);
        upper_bounds.push(b.1);
    }
    (lower_bounds, upper_bounds)
}

fn project_onto_bounds(x: &mut DVector<f64>, bounds: &Vec<(f64, f64)>) {
    for (i, b) in bounds.iter().enumerate() {
        x[i] = x[i].max(b.0).min(b.1);
    }
}

/// Augmented Lagrangian (with constraints) or PANOC (without) through `optimization_engine`.
/// Each inequality is passed as the equality `max(0, g_i(x)) = 0`.
#[derive(Clone, Debug)]
pub struct OpEnNonlinearOptimizer;
impl OpEnNonlinearOptimizer {
    pub fn optimize(&self, problem: &dyn NonlinearProblem, init_condition: &DVector<f64>, parameters: &OptimizerParameters) -> Result<OptimizerResult, DiffcoError> {
        return if problem.num_inequality_constraints() == 0 {
            self.optimize_panoc(problem, init_condition, parameters)
        } else {
            self.optimize_alm(problem, init_condition, parameters)
        }
    }
    fn optimize_panoc(&self, problem: &dyn NonlinearProblem, init_condition: &DVector<f64>, parameters: &OptimizerParameters) -> Result<OptimizerResult, DiffcoError> {
        let n = problem.problem_size();
        let mut panoc_cache = PANOCCache::new(n, positive_tolerance(parameters, 1e-5), 3);

        let df = |u: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
            let g = problem.cost_gradient(u).map_err(solver_error_from)?;
            grad.copy_from_slice(g.as_slice());
            Ok(())
        };
        let f = |u: &[f64], cost: &mut f64| -> Result<(), SolverError> {
            *cost = problem.cost(u).map_err(solver_error_from)?;
            Ok(())
        };

        let (lower_bounds, upper_bounds) = split_bounds(&problem.bounds());
        let bounds = constraints::Rectangle::new(Some(&lower_bounds), Some(&upper_bounds));

        let open_problem = Problem::new(&bounds, df, f);

        let mut panoc = PANOCOptimizer::new(open_problem, &mut panoc_cache);
        if let Some(a) = &parameters.max_time { panoc = panoc.with_max_duration(a.clone()); }
        if let Some(a) = &parameters.max_iterations { panoc = panoc.with_max_iter(a.clone()); }

        let start = Instant::now();
        let mut u = init_condition.as_slice().to_vec();
        let status = panoc.solve(&mut u);
        return match status {
            Ok(status) => {
                Ok(OptimizerResult {
                    x_min: DVector::from_vec(u),
                    exit_status: SolverExitStatus::from(status.exit_status()),
                    num_outer_iterations: 0,
                    num_inner_iterations: status.iterations(),
                    solve_time: status.solve_time(),
                    cost: status.cost_value()
                })
            }
            Err(_) => { OptimizerResult::new_numerical_failure(problem, init_condition, start.elapsed()) }
        }
    }
    fn optimize_alm(&self, problem: &dyn NonlinearProblem, init_condition: &DVector<f64>, parameters: &OptimizerParameters) -> Result<OptimizerResult, DiffcoError> {
        let n = problem.problem_size();
        let m = problem.num_inequality_constraints();
        let panoc_cache = PANOCCache::new(n, positive_tolerance(parameters, 1e-5), 3);
        let mut alm_cache = AlmCache::new(panoc_cache, 0, m);

        let (lower_bounds, upper_bounds) = split_bounds(&problem.bounds());
        let bounds = constraints::Rectangle::new(Some(&lower_bounds), Some(&upper_bounds));

        let df = |u: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
            let g = problem.cost_gradient(u).map_err(solver_error_from)?;
            grad.copy_from_slice(g.as_slice());
            Ok(())
        };
        let f = |u: &[f64], cost: &mut f64| -> Result<(), SolverError> {
            *cost = problem.cost(u).map_err(solver_error_from)?;
            Ok(())
        };
        let f2 = |u: &[f64], f2u: &mut [f64]| -> Result<(), SolverError> {
            let g = problem.inequality_constraints(u).map_err(solver_error_from)?;
            for (i, v) in g.iter().enumerate() { f2u[i] = v.max(0.0); }
            Ok(())
        };
        let f2_jacobian_product = |u: &[f64], d: &[f64], res: &mut [f64]| -> Result<(), SolverError> {
            let g = problem.inequality_constraints(u).map_err(solver_error_from)?;
            let j = problem.inequality_constraints_jacobian(u).map_err(solver_error_from)?;
            for r in res.iter_mut() { *r = 0.0; }
            for i in 0..m {
                if g[i] <= 0.0 { continue; }
                for k in 0..n { res[k] += j[(i, k)] * d[i]; }
            }
            Ok(())
        };

        let factory = AlmFactory::new(
            f,
            df,
            NO_MAPPING,
            NO_JACOBIAN_MAPPING,
            Some(f2),
            Some(f2_jacobian_product),
            NO_SET,
            m,
        );

        let alm_problem = AlmProblem::new(
            bounds,
            NO_SET,
            NO_SET,
            |u: &[f64], xi: &[f64], cost: &mut f64| -> Result<(), SolverError> {
                factory.psi(u, xi, cost)
            },
            |u: &[f64], xi: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
                factory.d_psi(u, xi, grad)
            },
            NO_MAPPING,
            Some(f2),
            0,
            m
        );

        let mut alm_optimizer = AlmOptimizer::new(&mut alm_cache, alm_problem);
        if let Some(a) = &parameters.max_time { alm_optimizer = alm_optimizer.with_max_duration(a.clone()); }
        if let Some(a) = &parameters.max_iterations { alm_optimizer = alm_optimizer.with_max_inner_iterations(a.clone()); }
        if let Some(a) = &parameters.max_outer_iterations { alm_optimizer = alm_optimizer.with_max_outer_iterations(a.clone()); }
        if parameters.tolerance.is_some() { alm_optimizer = alm_optimizer.with_delta_tolerance(positive_tolerance(parameters, 1e-4)); }

        let start = Instant::now();
        let mut u = init_condition.as_slice().to_vec();
        let solver_result = alm_optimizer.solve(&mut u);
        return match solver_result {
            Ok(r) => {
                Ok(OptimizerResult {
                    x_min: DVector::from_vec(u),
                    exit_status: SolverExitStatus::from(r.exit_status()),
                    num_outer_iterations: r.num_outer_iterations(),
                    num_inner_iterations: r.num_inner_iterations(),
                    solve_time: r.solve_time(),
                    cost: r.cost()
                })
            }
            Err(_) => { OptimizerResult::new_numerical_failure(problem, init_condition, start.elapsed()) }
        }
    }
}

/// Adam on the penalized cost, projected onto the bounds after every step.  The best iterate
/// seen (by penalized cost) is returned.
#[derive(Clone, Debug)]
pub struct AdamNonlinearOptimizer;
impl AdamNonlinearOptimizer {
    pub fn optimize(&self, problem: &dyn NonlinearProblem, init_condition: &DVector<f64>, parameters: &OptimizerParameters) -> Result<OptimizerResult, DiffcoError> {
        let start = Instant::now();
        let bounds = problem.bounds();
        let max_iterations = parameters.max_iterations.unwrap_or(500);
        let tolerance = parameters.tolerance.unwrap_or(1e-8);
        let (beta1, beta2, eps) = (0.9, 0.999, 1e-8);

        let mut x = init_condition.clone();
        project_onto_bounds(&mut x, &bounds);
        let mut m = DVector::zeros(x.len());
        let mut v = DVector::zeros(x.len());

        let mut best_x = x.clone();
        let mut best_merit = problem.penalized_cost(x.as_slice(), parameters.penalty_weight)?;
        let mut exit_status = SolverExitStatus::NotConvergedIterations;
        let mut iterations = 0;

        for t in 1..=max_iterations {
            if let Some(max_time) = &parameters.max_time {
                if start.elapsed() > *max_time { exit_status = SolverExitStatus::NotConvergedOutOfTime; break; }
            }
            let g = problem.penalized_cost_gradient(x.as_slice(), parameters.penalty_weight)?;
            if !g.iter().all(|v| v.is_finite()) { exit_status = SolverExitStatus::NumericalFailure; break; }
            if g.norm() <= tolerance { exit_status = SolverExitStatus::Converged; break; }
            iterations = t;

            m = beta1 * &m + (1.0 - beta1) * &g;
            v = beta2 * &v + (1.0 - beta2) * g.component_mul(&g);
            let m_hat = &m / (1.0 - beta1.powi(t as i32));
            let v_hat = &v / (1.0 - beta2.powi(t as i32));
            let step = m_hat.zip_map(&v_hat, |a, b| parameters.learning_rate * a / (b.sqrt() + eps));
            x -= step;
            project_onto_bounds(&mut x, &bounds);

            let merit = problem.penalized_cost(x.as_slice(), parameters.penalty_weight)?;
            if merit < best_merit {
                best_merit = merit;
                best_x = x.clone();
            }
        }

        let cost = problem.cost(best_x.as_slice())?;
        Ok(OptimizerResult {
            x_min: best_x,
            exit_status,
            num_outer_iterations: 0,
            num_inner_iterations: iterations,
            solve_time: start.elapsed(),
            cost
        })
    }
}

/// Gradient free compass search on the penalized cost.  Each iteration polls ±step along every
/// coordinate; the step is halved when no poll improves.
#[derive(Clone, Debug)]
pub struct PatternSearchNonlinearOptimizer;
impl PatternSearchNonlinearOptimizer {
    pub fn optimize(&self, problem: &dyn NonlinearProblem, init_condition: &DVector<f64>, parameters: &OptimizerParameters) -> Result<OptimizerResult, DiffcoError> {
        let start = Instant::now();
        let bounds = problem.bounds();
        let max_iterations = parameters.max_iterations.unwrap_or(500);
        let tolerance = parameters.tolerance.unwrap_or(1e-6);

        let mut x = init_condition.clone();
        project_onto_bounds(&mut x, &bounds);
        let mut merit = problem.penalized_cost(x.as_slice(), parameters.penalty_weight)?;
        let mut step = parameters.initial_step;
        let mut exit_status = SolverExitStatus::NotConvergedIterations;
        let mut iterations = 0;

        for t in 1..=max_iterations {
            if step <= tolerance { exit_status = SolverExitStatus::Converged; break; }
            if let Some(max_time) = &parameters.max_time {
                if start.elapsed() > *max_time { exit_status = SolverExitStatus::NotConvergedOutOfTime; break; }
            }
            iterations = t;

            let mut improved = false;
            for i in 0..x.len() {
                for dir in [1.0, -1.0] {
                    let mut candidate = x.clone();
                    candidate[i] = (candidate[i] + dir * step).max(bounds[i].0).min(bounds[i].1);
                    if candidate[i] == x[i] { continue; }
                    let candidate_merit = problem.penalized_cost(candidate.as_slice(), parameters.penalty_weight)?;
                    if candidate_merit < merit {
                        x = candidate;
                        merit = candidate_merit;
                        improved = true;
                        break;
                    }
                }
            }
            if !improved { step *= 0.5; }
        }
        if step <= tolerance { exit_status = SolverExitStatus::Converged; }

        let cost = problem.cost(x.as_slice())?;
        Ok(OptimizerResult {
            x_min: x,
            exit_status,
            num_outer_iterations: 0,
            num_inner_iterations: iterations,
            solve_time: start.elapsed(),
            cost
        })
    }
}

#[cfg(feature = "nlopt_optimization")]
#[derive(Clone, Debug)]
pub struct NLoptNonlinearOptimizer {
    algorithm: Algorithm
}
#[cfg(feature = "nlopt_optimization")]
impl NLoptNonlinearOptimizer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }
    pub fn new_slsqp() -> Self {
        Self::new(Algorithm::Slsqp)
    }
    pub fn new_cobyla() -> Self {
        Self::new(Algorithm::Cobyla)
    }
    pub fn optimize(&self, problem: &dyn NonlinearProblem, init_condition: &DVector<f64>, parameters: &OptimizerParameters) -> Result<OptimizerResult, DiffcoError> {
        let start = Instant::now();
        let failure: RefCell<Option<DiffcoError>> = RefCell::new(None);

        let obj_f = |x: &[f64], gradient: Option<&mut [f64]>, _params: &mut ()| -> f64 {
            let val = match problem.cost(x) {
                Ok(v) => { v }
                Err(e) => { *failure.borrow_mut() = Some(e); return f64::INFINITY; }
            };
            if let Some(gradient) = gradient {
                match problem.cost_gradient(x) {
                    Ok(g) => { gradient.copy_from_slice(g.as_slice()); }
                    Err(e) => { *failure.borrow_mut() = Some(e); }
                }
            }
            return val;
        };
        let mut nlopt = Nlopt::new(self.algorithm, problem.problem_size(), obj_f, Target::Minimize, ());
        let tol = parameters.tolerance.unwrap_or(0.000001);
        let nlopt_error = |e: nlopt::FailState| DiffcoError::new_generic_error_str(&format!("nlopt setup failed: {:?}", e), file!(), line!());
        for idx in 0..problem.num_inequality_constraints() {
            let failure = &failure;
            let ineq_con = move |x: &[f64], gradient: Option<&mut [f64]>, _params: &mut ()| -> f64 {
                let val = match problem.inequality_constraints(x) {
                    Ok(g) => { g[idx] }
                    Err(e) => { *failure.borrow_mut() = Some(e); return f64::INFINITY; }
                };
                if let Some(gradient) = gradient {
                    match problem.inequality_constraint_gradient(x, idx) {
                        Ok(g) => { gradient.copy_from_slice(g.as_slice()); }
                        Err(e) => { *failure.borrow_mut() = Some(e); }
                    }
                }
                return val;
            };
            nlopt.add_inequality_constraint(ineq_con, (), tol).map_err(nlopt_error)?;
        }

        let (lower_bounds, upper_bounds) = split_bounds(&problem.bounds());
        nlopt.set_lower_bounds(&lower_bounds).map_err(nlopt_error)?;
        nlopt.set_upper_bounds(&upper_bounds).map_err(nlopt_error)?;
        if let Some(a) = &parameters.max_time { nlopt.set_maxtime(a.as_secs_f64()).map_err(nlopt_error)?; }
        if let Some(a) = &parameters.max_iterations { nlopt.set_maxeval(*a as u32).map_err(nlopt_error)?; }
        nlopt.set_ftol_rel(0.0001).map_err(nlopt_error)?;

        let mut x = init_condition.as_slice().to_vec();
        let res = nlopt.optimize(&mut x);
        if failure.borrow().is_some() {
            return OptimizerResult::new_numerical_failure(problem, init_condition, start.elapsed());
        }
        return match res {
            Ok((state, cost)) => {
                let exit_status = match state {
                    nlopt::SuccessState::MaxEvalReached => { SolverExitStatus::NotConvergedIterations }
                    nlopt::SuccessState::MaxTimeReached => { SolverExitStatus::NotConvergedOutOfTime }
                    _ => { SolverExitStatus::Converged }
                };
                Ok(OptimizerResult {
                    x_min: DVector::from_vec(x),
                    exit_status,
                    num_outer_iterations: 0,
                    num_inner_iterations: 0,
                    solve_time: start.elapsed(),
                    cost
                })
            }
            Err(_) => { OptimizerResult::new_numerical_failure(problem, init_condition, start.elapsed()) }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverExitStatus {
    Converged,
    NotConvergedIterations,
    NotConvergedOutOfTime,
    /// The solver reported an error or produced non finite values.  The initial condition is
    /// returned as the solution.
    NumericalFailure
}
impl From<ExitStatus> for SolverExitStatus {
    fn from(e: ExitStatus) -> Self {
        return match e {
            ExitStatus::Converged => { Self::Converged }
            ExitStatus::NotConvergedIterations => { Self::NotConvergedIterations }
            ExitStatus::NotConvergedOutOfTime => { Self::NotConvergedOutOfTime }
        }
    }
}

#[derive(Clone, Debug)]
pub struct OptimizerResult {
    x_min: DVector<f64>,
    exit_status: SolverExitStatus,
    num_outer_iterations: usize,
    num_inner_iterations: usize,
    solve_time: Duration,
    cost: f64
}
impl OptimizerResult {
    fn new_numerical_failure(problem: &dyn NonlinearProblem, init_condition: &DVector<f64>, solve_time: Duration) -> Result<Self, DiffcoError> {
        let cost = problem.cost(init_condition.as_slice()).unwrap_or(f64::NAN);
        Ok(Self {
            x_min: init_condition.clone(),
            exit_status: SolverExitStatus::NumericalFailure,
            num_outer_iterations: 0,
            num_inner_iterations: 0,
            solve_time,
            cost
        })
    }
    pub fn x_min(&self) -> &DVector<f64> {
        &self.x_min
    }
    pub fn exit_status(&self) -> SolverExitStatus {
        self.exit_status
    }
    pub fn num_outer_iterations(&self) -> usize {
        self.num_outer_iterations
    }
    pub fn num_inner_iterations(&self) -> usize {
        self.num_inner_iterations
    }
    pub fn solve_time(&self) -> Duration {
        self.solve_time
    }
    pub fn cost(&self) -> f64 {
        self.cost
    }
}

/// Raw solver knobs.  Fields a solver does not use are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerParameters {
    pub max_time: Option<Duration>,
    pub max_iterations: Option<usize>,
    pub max_outer_iterations: Option<usize>,
    pub tolerance: Option<f64>,
    /// Adam step size.
    pub learning_rate: f64,
    /// Weight of the constraint violation for penalty based solvers.
    pub penalty_weight: f64,
    /// Initial poll radius of pattern search.
    pub initial_step: f64
}
impl OptimizerParameters {
    pub fn new_empty() -> Self {
        Self::default()
    }
    pub fn set_max_time(&mut self, max_time: Duration) {
        self.max_time = Some(max_time);
    }
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = Some(max_iterations);
    }
    pub fn set_max_outer_iterations(&mut self, max_outer_iterations: usize) {
        self.max_outer_iterations = Some(max_outer_iterations)
    }
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = Some(tolerance);
    }
}
impl Default for OptimizerParameters {
    fn default() -> Self {
        Self {
            max_time: None,
            max_iterations: None,
            max_outer_iterations: None,
            tolerance: None,
            learning_rate: 0.01,
            penalty_weight: 100.0,
            initial_step: 0.1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// min (x0 - 2)² + (x1 - 1)²  s.t.  x0 + x1 - 2 <= 0,  bounds [-5, 5]
    struct QuadraticProblem;
    impl NonlinearProblem for QuadraticProblem {
        fn problem_size(&self) -> usize { 2 }
        fn bounds(&self) -> Vec<(f64, f64)> { vec![(-5.0, 5.0); 2] }
        fn cost(&self, x: &[f64]) -> Result<f64, DiffcoError> { Ok((x[0] - 2.0).powi(2) + (x[1] - 1.0).powi(2)) }
        fn cost_gradient(&self, x: &[f64]) -> Result<DVector<f64>, DiffcoError> {
            Ok(DVector::from_vec(vec![2.0 * (x[0] - 2.0), 2.0 * (x[1] - 1.0)]))
        }
        fn num_inequality_constraints(&self) -> usize { 1 }
        fn inequality_constraints(&self, x: &[f64]) -> Result<DVector<f64>, DiffcoError> { Ok(DVector::from_vec(vec![x[0] + x[1] - 2.0])) }
        fn inequality_constraints_jacobian(&self, _x: &[f64]) -> Result<DMatrix<f64>, DiffcoError> { Ok(DMatrix::from_row_slice(1, 2, &[1.0, 1.0])) }
    }

    struct BowlProblem;
    impl NonlinearProblem for BowlProblem {
        fn problem_size(&self) -> usize { 3 }
        fn bounds(&self) -> Vec<(f64, f64)> { vec![(-1.0, 1.0); 3] }
        fn cost(&self, x: &[f64]) -> Result<f64, DiffcoError> { Ok(x.iter().map(|v| (v - 0.5).powi(2)).sum()) }
        fn cost_gradient(&self, x: &[f64]) -> Result<DVector<f64>, DiffcoError> { Ok(DVector::from_iterator(3, x.iter().map(|v| 2.0 * (v - 0.5)))) }
        fn num_inequality_constraints(&self) -> usize { 0 }
        fn inequality_constraints(&self, _x: &[f64]) -> Result<DVector<f64>, DiffcoError> { Ok(DVector::zeros(0)) }
        fn inequality_constraints_jacobian(&self, _x: &[f64]) -> Result<DMatrix<f64>, DiffcoError> { Ok(DMatrix::zeros(0, 3)) }
    }

    #[test]
    fn open_solves_constrained_quadratic() {
        let mut params = OptimizerParameters::default();
        params.set_max_time(Duration::from_secs(5));
        let res = NonlinearOptimizer::new(NonlinearOptimizerType::OpEn).optimize(&QuadraticProblem, &DVector::zeros(2), &params).unwrap();
        assert_relative_eq!(res.x_min()[0], 1.5, epsilon = 1e-2);
        assert_relative_eq!(res.x_min()[1], 0.5, epsilon = 1e-2);
    }

    #[test]
    fn open_panoc_respects_bounds() {
        let res = NonlinearOptimizer::new(NonlinearOptimizerType::OpEn).optimize(&BowlProblem, &DVector::from_vec(vec![-1.0, 0.0, 1.0]), &OptimizerParameters::default()).unwrap();
        assert_eq!(res.exit_status(), SolverExitStatus::Converged);
        for v in res.x_min().iter() { assert_relative_eq!(*v, 0.5, epsilon = 1e-3); }
    }

    #[test]
    fn adam_and_pattern_search_reach_the_constrained_optimum() {
        let mut params = OptimizerParameters::default();
        params.set_max_iterations(3000);
        params.learning_rate = 0.01;
        params.penalty_weight = 10.0;
        for t in [NonlinearOptimizerType::Adam, NonlinearOptimizerType::PatternSearch] {
            let res = NonlinearOptimizer::new(t).optimize(&QuadraticProblem, &DVector::zeros(2), &params).unwrap();
            assert_relative_eq!(res.x_min()[0], 1.5, epsilon = 5e-2);
            assert_relative_eq!(res.x_min()[1], 0.5, epsilon = 5e-2);
        }
    }

    #[test]
    fn adam_stops_immediately_at_a_stationary_point() {
        let init = DVector::from_vec(vec![0.5, 0.5, 0.5]);
        let res = NonlinearOptimizer::new(NonlinearOptimizerType::Adam).optimize(&BowlProblem, &init, &OptimizerParameters::default()).unwrap();
        assert_eq!(res.exit_status(), SolverExitStatus::Converged);
        assert_eq!(res.x_min(), &init);
        assert_eq!(res.num_inner_iterations(), 0);
    }

    #[test]
    fn wrong_initial_size_is_an_error() {
        assert!(NonlinearOptimizer::new(NonlinearOptimizerType::Adam).optimize(&BowlProblem, &DVector::zeros(2), &OptimizerParameters::default()).is_err());
    }

    #[test]
    fn gradient_requirement_by_family() {
        assert!(NonlinearOptimizerType::OpEn.requires_gradient());
        assert!(NonlinearOptimizerType::Adam.requires_gradient());
        assert!(!NonlinearOptimizerType::PatternSearch.requires_gradient());
    }
}
