
//! DiffCo is a toolbox for learning a differentiable collision checker from samples and using it
//! for motion planning.
//! A kernel perceptron is trained on configurations labeled by a ground truth collision oracle,
//! its score is calibrated into a safety margin, and the result is used as a constraint when
//! optimizing trajectories.  Optimized paths are then audited against the ground truth.

pub mod collision_environments;
pub mod collision_proxy;
pub mod datasets;
pub mod experiments;
pub mod nonlinear_optimization;
pub mod path_verification;
pub mod planning;
pub mod robot_modules;
pub mod trajectory_optimization;
pub mod utils;
