extern crate diffco;

use std::env;
use std::path::Path;
use std::str::FromStr;
use itertools::Itertools;
use nalgebra::DVector;
use diffco::collision_environments::CollisionOracle;
use diffco::collision_environments::predefined_environments::PredefinedEnvironment;
use diffco::robot_modules::robot_fk_module::ForwardKinematics;
use diffco::experiments::{CostSourceSelection, DiffcoExperiment, ExperimentConfig};
use diffco::utils::utils_console::{diffco_print, diffco_print_new_line, PrintColor, PrintMode};
use diffco::utils::utils_enums::EnumUtils;
use diffco::utils::utils_errors::DiffcoError;

/// Usage: `diffco_tutorial [environment name | config file]`
fn main() -> Result<(), DiffcoError> {
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        None => { ExperimentConfig::default() }
        Some(arg) => {
            match PredefinedEnvironment::from_str(arg) {
                Ok(environment) => {
                    let mut config = ExperimentConfig::default();
                    config.name = format!("{}_tutorial", environment);
                    config.environment = environment;
                    config
                }
                Err(_) if Path::new(arg).exists() => { ExperimentConfig::load_from_path(Path::new(arg))? }
                Err(_) => {
                    let names = EnumUtils::get_all_variant_names::<PredefinedEnvironment>();
                    return Err(DiffcoError::new_generic_error_str(&format!("{:?} is neither a config file nor one of: {}", arg, names.iter().join(", ")), file!(), line!()));
                }
            }
        }
    };

    let (env, context) = DiffcoExperiment::prepare_predefined(&config)?;

    // the two free test configurations farthest apart make the query
    let candidates: Vec<DVector<f64>> = context.dataset().test().free_configs().into_iter().take(30).collect();
    let (start, target) = match candidates.iter().tuple_combinations().max_by(|(a, b), (c, d)| (*a - *b).norm().total_cmp(&(*c - *d).norm())) {
        Some((a, b)) => { (a.clone(), b.clone()) }
        None => { return Err(DiffcoError::new_generic_error_str("the test set has fewer than two free configurations.", file!(), line!())); }
    };

    diffco_print("Start control points: ", PrintMode::Println, PrintColor::Cyan, true);
    env.robot().print_results(&start)?;
    diffco_print("Target control points: ", PrintMode::Println, PrintColor::Cyan, true);
    env.robot().print_results(&target)?;

    let planner = context.default_planner(env.qlim());
    let mut trace = String::new();
    let mut hook = |_idx: usize, _q: &DVector<f64>, ground_truth: bool, proxy: bool| {
        trace.push(match (ground_truth, proxy) {
            (false, false) => { '.' }
            (true, true) => { 'x' }
            (true, false) => { '!' }
            (false, true) => { 'o' }
        });
    };
    let report = context.run_query(&env, env.robot(), &planner, &start, &target, CostSourceSelection::Proxy, Some(&mut hook))?;

    diffco_print_new_line();
    diffco_print("Waypoints (. free, x both, ! missed by proxy, o proxy only): ", PrintMode::Println, PrintColor::Cyan, true);
    diffco_print(&trace, PrintMode::Println, PrintColor::None, false);
    let color = if report.optimization.success && !report.verification.ground_truth_any_collision { PrintColor::Green } else { PrintColor::Yellow };
    diffco_print(&format!("planner success: {}, optimizer success: {}, cost: {:.4}, time: {:?}",
                          report.planner_output.success, report.optimization.success, report.optimization.cost, report.optimization.time),
                 PrintMode::Println, color, false);

    Ok(())
}
