use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use crate::collision_proxy::diffco::DiffCo;
use crate::datasets::{LabeledSamples, COLLISION_LABEL, FREE_LABEL};
use crate::utils::utils_console::{diffco_print, PrintColor, PrintMode};
use crate::utils::utils_errors::DiffcoError;

/// `margin = min(score over known free configurations) / divisor`.  Free samples are trained
/// toward negative scores, so the minimum is normally negative and the margin sits between it
/// and zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPolicy {
    pub divisor: f64
}
impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self { divisor: 10.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProxyEvaluation {
    pub accuracy: f64,
    /// NaN when the evaluation set has no collision samples.
    pub true_positive_rate: f64,
    /// NaN when the evaluation set has no free samples.
    pub true_negative_rate: f64
}
impl ProxyEvaluation {
    pub fn print_summary(&self) {
        diffco_print("Test accuracy: ", PrintMode::Print, PrintColor::Blue, true);
        diffco_print(&format!("{:.4}", self.accuracy), PrintMode::Println, PrintColor::None, false);
        diffco_print("TPR: ", PrintMode::Print, PrintColor::Blue, true);
        diffco_print(&format!("{:.4}", self.true_positive_rate), PrintMode::Println, PrintColor::None, false);
        diffco_print("TNR: ", PrintMode::Print, PrintColor::Blue, true);
        diffco_print(&format!("{:.4}", self.true_negative_rate), PrintMode::Println, PrintColor::None, false);
    }
}

pub struct Calibrator;
impl Calibrator {
    pub fn calibrate(proxy: &DiffCo, train_free_configs: &Vec<DVector<f64>>, policy: &CalibrationPolicy) -> Result<f64, DiffcoError> {
        if !(policy.divisor > 1.0) {
            return Err(DiffcoError::new_generic_error_str(&format!("calibration divisor must be greater than 1, got {}.", policy.divisor), file!(), line!()));
        }
        if train_free_configs.is_empty() {
            return Err(DiffcoError::new_generic_error_str("cannot calibrate without free configurations.", file!(), line!()));
        }
        let scores = proxy.score(train_free_configs)?;
        let min_score = scores.min();
        Ok(min_score / policy.divisor)
    }
    /// Collision is predicted where `score - margin > 0`.
    pub fn predict(proxy: &DiffCo, margin: f64, configs: &Vec<DVector<f64>>) -> Result<Vec<bool>, DiffcoError> {
        let scores = proxy.score(configs)?;
        Ok(scores.iter().map(|s| s - margin > 0.0).collect())
    }
    pub fn evaluate(proxy: &DiffCo, margin: f64, test_set: &LabeledSamples) -> Result<ProxyEvaluation, DiffcoError> {
        let predictions = Self::predict(proxy, margin, test_set.configs())?;
        return Ok(Self::evaluate_predictions(&predictions, test_set.labels()));
    }
    pub fn evaluate_predictions(predictions: &Vec<bool>, labels: &Vec<f64>) -> ProxyEvaluation {
        let mut tp = 0usize;
        let mut tn = 0usize;
        let mut positives = 0usize;
        let mut negatives = 0usize;
        for (p, l) in predictions.iter().zip(labels.iter()) {
            if *l == COLLISION_LABEL {
                positives += 1;
                if *p { tp += 1; }
            } else if *l == FREE_LABEL {
                negatives += 1;
                if !*p { tn += 1; }
            }
        }
        let ratio = |a: usize, b: usize| if b == 0 { f64::NAN } else { a as f64 / b as f64 };
        ProxyEvaluation {
            accuracy: ratio(tp + tn, positives + negatives),
            true_positive_rate: ratio(tp, positives),
            true_negative_rate: ratio(tn, negatives)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision_proxy::FeatureTransform;
    use crate::collision_proxy::kernels::KernelType;
    use crate::utils::utils_console::DiffcoDebug;

    fn line_data() -> LabeledSamples {
        let configs: Vec<DVector<f64>> = (0..30).map(|i| DVector::from_vec(vec![-3.0 + i as f64 * 0.2])).collect();
        let labels = configs.iter().map(|c| if c[0] > 0.0 { COLLISION_LABEL } else { FREE_LABEL }).collect();
        LabeledSamples::new(configs, labels).unwrap()
    }

    #[test]
    fn margin_lies_between_min_free_score_and_zero() {
        let data = line_data();
        let (proxy, _) = DiffCo::train(&data, KernelType::RationalQuadratic, FeatureTransform::Identity, 5.0, 2000, &DiffcoDebug::Silent).unwrap();
        let free = data.free_configs();
        let min_score = proxy.score(&free).unwrap().min();
        assert!(min_score < 0.0);
        let margin = Calibrator::calibrate(&proxy, &free, &CalibrationPolicy::default()).unwrap();
        assert!(min_score <= margin);
        assert!(margin <= 0.0);
        assert!((margin - min_score / 10.0).abs() < 1e-12);
    }

    #[test]
    fn bad_policy_or_empty_set_is_an_error() {
        let data = line_data();
        let (proxy, _) = DiffCo::train(&data, KernelType::Gaussian, FeatureTransform::Identity, 5.0, 2000, &DiffcoDebug::Silent).unwrap();
        assert!(Calibrator::calibrate(&proxy, &data.free_configs(), &CalibrationPolicy { divisor: 1.0 }).is_err());
        assert!(Calibrator::calibrate(&proxy, &vec![], &CalibrationPolicy::default()).is_err());
    }

    #[test]
    fn rates_are_nan_for_missing_classes() {
        let e = Calibrator::evaluate_predictions(&vec![false, true], &vec![FREE_LABEL, FREE_LABEL]);
        assert!(e.true_positive_rate.is_nan());
        assert_eq!(e.true_negative_rate, 0.5);
        assert_eq!(e.accuracy, 0.5);

        let e = Calibrator::evaluate_predictions(&vec![true], &vec![COLLISION_LABEL]);
        assert!(e.true_negative_rate.is_nan());
        assert_eq!(e.true_positive_rate, 1.0);

        let e = Calibrator::evaluate_predictions(&vec![], &vec![]);
        assert!(e.accuracy.is_nan());
    }
}
