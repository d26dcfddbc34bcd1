use std::collections::HashMap;
use instant::Instant;
use nalgebra::DVector;
use ordered_float::OrderedFloat;
use pbr::ProgressBar;
use serde::{Serialize, Deserialize};
use crate::collision_proxy::FeatureTransform;
use crate::collision_proxy::kernels::{KernelFunction, KernelType};
use crate::collision_proxy::polyharmonic::{PolyharmonicInterpolant, PolyharmonicParameters, PolyharmonicTarget};
use crate::datasets::{LabeledSamples, COLLISION_LABEL};
use crate::utils::utils_console::{diffco_print_debug, DiffcoDebug, PrintColor};
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_files::FileUtils;
use crate::utils::utils_traits::SaveAndLoadable;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffCoTrainingParameters {
    pub kernel: KernelFunction,
    pub transform: FeatureTransform,
    /// Gain multiplier applied when a collision sample is corrected.
    pub beta: f64,
    pub max_iterations: usize
}
impl Default for DiffCoTrainingParameters {
    fn default() -> Self {
        Self {
            kernel: KernelFunction::new(KernelType::RationalQuadratic, 10.0),
            transform: FeatureTransform::Identity,
            beta: 1.0,
            max_iterations: 10000
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingState {
    Updating,
    /// Every training sample is classified correctly.
    Converged,
    /// `max_iterations` updates were made and some sample is still misclassified.
    BudgetExhausted
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub state: TrainingState,
    pub steps: usize,
    pub num_supports: usize,
    pub train_accuracy: f64
}

/// Mistake-driven kernel perceptron over a fixed training set.  The hypothesis `F = K gains` is
/// kept for every sample and updated incrementally; kernel columns are only computed for
/// samples that are (or were) support points.
struct KernelPerceptron<'a> {
    features: Vec<DVector<f64>>,
    labels: &'a Vec<f64>,
    kernel: &'a KernelFunction,
    beta: f64,
    gains: Vec<f64>,
    hypothesis: Vec<f64>,
    columns: HashMap<usize, Vec<f64>>,
    steps: usize,
    max_iterations: usize,
    state: TrainingState
}
impl <'a> KernelPerceptron<'a> {
    fn new(features: Vec<DVector<f64>>, labels: &'a Vec<f64>, kernel: &'a KernelFunction, beta: f64, max_iterations: usize) -> Self {
        let n = features.len();
        Self {
            features,
            labels,
            kernel,
            beta,
            gains: vec![0.0; n],
            hypothesis: vec![0.0; n],
            columns: HashMap::new(),
            steps: 0,
            max_iterations,
            state: TrainingState::Updating
        }
    }
    fn step(&mut self) -> TrainingState {
        if self.state != TrainingState::Updating { return self.state; }

        let worst = (0..self.labels.len()).min_by_key(|i| OrderedFloat(self.labels[*i] * self.hypothesis[*i]));
        let worst = match worst {
            Some(w) if self.labels[w] * self.hypothesis[w] <= 0.0 => { w }
            _ => { self.state = TrainingState::Converged; return self.state; }
        };
        if self.steps >= self.max_iterations {
            self.state = TrainingState::BudgetExhausted;
            return self.state;
        }
        self.steps += 1;

        let y = self.labels[worst];
        let scale = if y == COLLISION_LABEL { self.beta } else { 1.0 };
        let delta = scale * y - self.hypothesis[worst];
        self.add_to_gain(worst, delta);
        self.state
    }
    fn add_to_gain(&mut self, j: usize, delta: f64) {
        if !self.columns.contains_key(&j) {
            let xj = &self.features[j];
            let col = self.features.iter().map(|x| self.kernel.eval(x, xj)).collect();
            self.columns.insert(j, col);
        }
        self.gains[j] += delta;
        if let Some(col) = self.columns.get(&j) {
            for (f, k) in self.hypothesis.iter_mut().zip(col.iter()) { *f += delta * k; }
        }
    }
    fn train_accuracy(&self) -> f64 {
        if self.labels.is_empty() { return f64::NAN; }
        let correct = self.labels.iter().zip(self.hypothesis.iter()).filter(|(y, f)| *y * *f > 0.0).count();
        correct as f64 / self.labels.len() as f64
    }
    fn support_idxs(&self) -> Vec<usize> {
        let mut idxs: Vec<usize> = self.columns.keys().cloned().filter(|j| self.gains[*j] != 0.0).collect();
        idxs.sort();
        idxs
    }
}

/// A trained DiffCo collision proxy.  Scores are positive where the proxy predicts collision.
/// Instances are immutable; `fit_poly` produces a new one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffCo {
    kernel: KernelFunction,
    transform: FeatureTransform,
    support_configs: Vec<DVector<f64>>,
    support_features: Vec<DVector<f64>>,
    gains: Vec<f64>,
    support_labels: Vec<f64>,
    support_hypothesis: Vec<f64>,
    poly: Option<PolyharmonicInterpolant>
}
impl DiffCo {
    pub fn train(train_set: &LabeledSamples,
                 kernel_type: KernelType,
                 transform: FeatureTransform,
                 gamma: f64,
                 max_iterations: usize,
                 debug: &DiffcoDebug) -> Result<(Self, TrainingOutcome), DiffcoError> {
        let params = DiffCoTrainingParameters {
            kernel: KernelFunction::new(kernel_type, gamma),
            transform,
            max_iterations,
            ..Default::default()
        };
        return Self::train_with_parameters(train_set, &params, debug);
    }
    pub fn train_with_parameters(train_set: &LabeledSamples, params: &DiffCoTrainingParameters, debug: &DiffcoDebug) -> Result<(Self, TrainingOutcome), DiffcoError> {
        if train_set.is_empty() {
            return Err(DiffcoError::new_generic_error_str("cannot train on an empty training set.", file!(), line!()));
        }
        if let (Some(expected), Some(given)) = (params.transform.input_dim(), train_set.dim()) {
            if expected != given { return Err(DiffcoError::new_dimension_mismatch_error("train", given, expected, file!(), line!())); }
        }
        let start = Instant::now();

        let features = params.transform.apply_batch(train_set.configs())?;
        let mut perceptron = KernelPerceptron::new(features, train_set.labels(), &params.kernel, params.beta, params.max_iterations);

        let mut pb = if debug.includes(&DiffcoDebug::Verbose) {
            let mut pb = ProgressBar::new(params.max_iterations as u64);
            pb.format("╢▌▌░╟");
            pb.show_counter = false;
            Some(pb)
        } else { None };

        while perceptron.step() == TrainingState::Updating {
            if let Some(pb) = &mut pb { if perceptron.steps % 100 == 0 { pb.set(perceptron.steps as u64); } }
        }
        if let Some(pb) = &mut pb { pb.finish(); }

        let idxs = perceptron.support_idxs();
        let outcome = TrainingOutcome {
            state: perceptron.state,
            steps: perceptron.steps,
            num_supports: idxs.len(),
            train_accuracy: perceptron.train_accuracy()
        };

        diffco_print_debug(&format!("DiffCo training finished as {:?} after {} steps: {} support points, train accuracy {:.4}, {:?}.",
                                    outcome.state, outcome.steps, outcome.num_supports, outcome.train_accuracy, start.elapsed()),
                           debug, DiffcoDebug::Summary, PrintColor::None, false);

        let out_self = Self {
            kernel: params.kernel.clone(),
            transform: params.transform.clone(),
            support_configs: idxs.iter().map(|i| train_set.configs()[*i].clone()).collect(),
            support_features: idxs.iter().map(|i| perceptron.features[*i].clone()).collect(),
            gains: idxs.iter().map(|i| perceptron.gains[*i]).collect(),
            support_labels: idxs.iter().map(|i| train_set.labels()[*i]).collect(),
            support_hypothesis: idxs.iter().map(|i| perceptron.hypothesis[*i]).collect(),
            poly: None
        };

        Ok((out_self, outcome))
    }
    /// Returns a copy whose score is a polyharmonic interpolant fit over the support points in
    /// feature space.  Support membership and gains are unchanged.
    pub fn fit_poly(&self, params: &PolyharmonicParameters) -> Result<Self, DiffcoError> {
        let values = match params.target {
            PolyharmonicTarget::Hypothesis => { self.support_hypothesis.clone() }
            PolyharmonicTarget::Label => { self.support_labels.clone() }
        };
        let poly = PolyharmonicInterpolant::fit(&self.support_features, &values, params)?;
        let mut out_self = self.clone();
        out_self.poly = Some(poly);
        Ok(out_self)
    }
    pub fn score(&self, configs: &Vec<DVector<f64>>) -> Result<DVector<f64>, DiffcoError> {
        let mut out = DVector::zeros(configs.len());
        for (i, q) in configs.iter().enumerate() { out[i] = self.score_single(q)?; }
        Ok(out)
    }
    pub fn score_single(&self, q: &DVector<f64>) -> Result<f64, DiffcoError> {
        let f = self.transform.apply(q)?;
        return self.score_feature(&f);
    }
    /// Gradient of the score with respect to the configuration.
    pub fn score_gradient(&self, q: &DVector<f64>) -> Result<DVector<f64>, DiffcoError> {
        let f = self.transform.apply(q)?;
        let grad_f = match &self.poly {
            Some(poly) => { poly.gradient(&f)? }
            None => {
                self.check_feature_dim(&f)?;
                let mut g = DVector::zeros(f.len());
                for (s, w) in self.support_features.iter().zip(self.gains.iter()) {
                    g += *w * self.kernel.gradient_wrt_y(s, &f);
                }
                g
            }
        };
        let j = self.transform.jacobian(q)?;
        Ok(j.transpose() * grad_f)
    }
    fn score_feature(&self, f: &DVector<f64>) -> Result<f64, DiffcoError> {
        if let Some(poly) = &self.poly { return poly.eval(f); }
        self.check_feature_dim(f)?;
        let mut out = 0.0;
        for (s, w) in self.support_features.iter().zip(self.gains.iter()) {
            out += w * self.kernel.eval(s, f);
        }
        Ok(out)
    }
    fn check_feature_dim(&self, f: &DVector<f64>) -> Result<(), DiffcoError> {
        if let Some(s) = self.support_features.first() {
            if s.len() != f.len() {
                return Err(DiffcoError::new_dimension_mismatch_error("DiffCo::score", f.len(), s.len(), file!(), line!()));
            }
        }
        Ok(())
    }
    pub fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }
    pub fn transform(&self) -> &FeatureTransform {
        &self.transform
    }
    pub fn support_configs(&self) -> &Vec<DVector<f64>> {
        &self.support_configs
    }
    pub fn gains(&self) -> &Vec<f64> {
        &self.gains
    }
    pub fn support_labels(&self) -> &Vec<f64> {
        &self.support_labels
    }
    pub fn num_supports(&self) -> usize { self.gains.len() }
    pub fn has_poly(&self) -> bool { self.poly.is_some() }
    pub fn poly(&self) -> Option<&PolyharmonicInterpolant> { self.poly.as_ref() }
}
impl SaveAndLoadable for DiffCo {
    type SaveType = DiffCo;

    fn get_save_serialization_object(&self) -> Self::SaveType {
        self.clone()
    }
    fn load_from_json_string(json_str: &str) -> Result<Self, DiffcoError> where Self: Sized {
        FileUtils::load_object_from_json_string(json_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::datasets::FREE_LABEL;
    use crate::robot_modules::planar_robot::RevolutePlanarRobot;
    use crate::utils::utils_math::finite_difference::FiniteDifferenceUtils;
    use crate::utils::utils_sampling::SimpleSamplers;

    fn two_blobs() -> LabeledSamples {
        let mut configs = vec![];
        let mut labels = vec![];
        for i in 0..6 {
            let t = i as f64 * 0.2;
            configs.push(DVector::from_vec(vec![1.0 + t * 0.3, 1.0 - t * 0.2])); labels.push(COLLISION_LABEL);
            configs.push(DVector::from_vec(vec![-1.0 - t * 0.3, -1.0 + t * 0.2])); labels.push(FREE_LABEL);
        }
        LabeledSamples::new(configs, labels).unwrap()
    }

    #[test]
    fn separable_blobs_converge() {
        let data = two_blobs();
        let (proxy, outcome) = DiffCo::train(&data, KernelType::RationalQuadratic, FeatureTransform::Identity, 1.0, 1000, &DiffcoDebug::Silent).unwrap();
        assert_eq!(outcome.state, TrainingState::Converged);
        assert_eq!(outcome.train_accuracy, 1.0);
        assert!(proxy.num_supports() >= 2);
        assert!(proxy.num_supports() <= data.len());
        let s = proxy.score(data.configs()).unwrap();
        for (v, y) in s.iter().zip(data.labels()) { assert!(v * y > 0.0); }
    }

    #[test]
    fn zero_budget_is_exhausted_immediately() {
        let data = two_blobs();
        let (proxy, outcome) = DiffCo::train(&data, KernelType::Gaussian, FeatureTransform::Identity, 1.0, 0, &DiffcoDebug::Silent).unwrap();
        assert_eq!(outcome.state, TrainingState::BudgetExhausted);
        assert_eq!(outcome.steps, 0);
        assert_eq!(proxy.num_supports(), 0);
    }

    fn circle_samples() -> LabeledSamples {
        let mut rng = SimpleSamplers::seeded_rng(4);
        let bounds = vec![(-1.0, 1.0), (-1.0, 1.0)];
        let mut configs = vec![];
        while configs.len() < 150 {
            let q = DVector::from_vec(SimpleSamplers::uniform_samples(&bounds, &mut rng));
            if (q.norm() - 0.5).abs() > 0.05 { configs.push(q); }
        }
        let flags: Vec<bool> = configs.iter().map(|q| q.norm() < 0.5).collect();
        LabeledSamples::new_from_collision_flags(configs, &flags).unwrap()
    }

    #[test]
    fn training_stops_at_full_accuracy_for_any_larger_budget() {
        let data = circle_samples();
        let (full, outcome) = DiffCo::train(&data, KernelType::RationalQuadratic, FeatureTransform::Identity, 20.0, 20000, &DiffcoDebug::Silent).unwrap();
        assert_eq!(outcome.state, TrainingState::Converged);
        assert_eq!(outcome.train_accuracy, 1.0);
        let steps = outcome.steps;

        for budget in 0..steps + 5 {
            let (proxy, o) = DiffCo::train(&data, KernelType::RationalQuadratic, FeatureTransform::Identity, 20.0, budget, &DiffcoDebug::Silent).unwrap();
            if budget < steps {
                assert_eq!(o.state, TrainingState::BudgetExhausted);
                assert!(o.train_accuracy < 1.0);
            } else {
                assert_eq!(o.state, TrainingState::Converged);
                assert_eq!(o.train_accuracy, 1.0);
                assert_eq!(o.steps, steps);
                assert_eq!(proxy, full);
            }
        }
    }

    #[test]
    fn score_gradient_matches_finite_differences() {
        let robot = RevolutePlanarRobot::new_default_width(1.0, 2).unwrap();
        let mut configs = vec![];
        let mut labels = vec![];
        for i in 0..20 {
            let a = -3.0 + i as f64 * 0.3;
            configs.push(DVector::from_vec(vec![a, 0.5 * a]));
            labels.push(if a > 0.0 { COLLISION_LABEL } else { FREE_LABEL });
        }
        let data = LabeledSamples::new(configs, labels).unwrap();
        let (proxy, _) = DiffCo::train(&data, KernelType::RationalQuadratic, FeatureTransform::ForwardKinematics(robot), 2.0, 500, &DiffcoDebug::Silent).unwrap();
        let q = DVector::from_vec(vec![0.3, -0.8]);
        let numeric = FiniteDifferenceUtils::gradient(|x| proxy.score_single(x), &q).unwrap();
        assert_relative_eq!(proxy.score_gradient(&q).unwrap(), numeric, epsilon = 1e-5);

        let poly = proxy.fit_poly(&PolyharmonicParameters::default()).unwrap();
        let numeric = FiniteDifferenceUtils::gradient(|x| poly.score_single(x), &q).unwrap();
        assert_relative_eq!(poly.score_gradient(&q).unwrap(), numeric, epsilon = 1e-4);
    }

    #[test]
    fn fit_poly_keeps_supports_and_returns_new_instance() {
        let data = two_blobs();
        let (proxy, _) = DiffCo::train(&data, KernelType::RationalQuadratic, FeatureTransform::Identity, 1.0, 1000, &DiffcoDebug::Silent).unwrap();
        let params = PolyharmonicParameters { order: 3, smoothing: 0.0, target: PolyharmonicTarget::Label };
        let fitted = proxy.fit_poly(&params).unwrap();
        assert!(!proxy.has_poly());
        assert!(fitted.has_poly());
        assert_eq!(fitted.poly().map(|p| p.num_centers()), Some(proxy.num_supports()));
        assert_eq!(fitted.support_configs(), proxy.support_configs());
        let s = fitted.score(proxy.support_configs()).unwrap();
        for (v, y) in s.iter().zip(proxy.support_labels()) { assert_relative_eq!(*v, *y, epsilon = 1e-6); }
    }

    #[test]
    fn saved_proxy_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("proxy.json");
        let (proxy, _) = DiffCo::train(&two_blobs(), KernelType::Cauchy, FeatureTransform::Identity, 1.0, 1000, &DiffcoDebug::Silent).unwrap();
        proxy.save_to_path(&p).unwrap();
        let loaded = DiffCo::load_from_path(&p).unwrap();
        assert_eq!(loaded, proxy);
    }
}
