use std::path::{Path, PathBuf};
use instant::Instant;
use nalgebra::DVector;
use pbr::ProgressBar;
use serde::{Serialize, Deserialize};
use crate::collision_environments::CollisionOracle;
use crate::utils::utils_console::{diffco_print_debug, diffco_print_warning, DiffcoDebug, PrintColor};
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_files::{DataDirLocation, DataDirUtils, FileUtils};
use crate::utils::utils_sampling::SimpleSamplers;
use crate::utils::utils_traits::SaveAndLoadable;

pub const COLLISION_LABEL: f64 = 1.0;
pub const FREE_LABEL: f64 = -1.0;

/// Configurations with their ground truth labels (+1 collision, -1 free).
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledSamples {
    configs: Vec<DVector<f64>>,
    labels: Vec<f64>
}
impl LabeledSamples {
    pub fn new(configs: Vec<DVector<f64>>, labels: Vec<f64>) -> Result<Self, DiffcoError> {
        if configs.len() != labels.len() {
            return Err(DiffcoError::new_dimension_mismatch_error("LabeledSamples::new", labels.len(), configs.len(), file!(), line!()));
        }
        for l in &labels {
            if *l != COLLISION_LABEL && *l != FREE_LABEL {
                return Err(DiffcoError::new_generic_error_str(&format!("labels must be +1 or -1, found {}.", l), file!(), line!()));
            }
        }
        if let Some(first) = configs.first() {
            let dim = first.len();
            for c in &configs {
                if c.len() != dim {
                    return Err(DiffcoError::new_dimension_mismatch_error("LabeledSamples::new", c.len(), dim, file!(), line!()));
                }
            }
        }
        Ok(Self { configs, labels })
    }
    pub fn new_from_collision_flags(configs: Vec<DVector<f64>>, collisions: &Vec<bool>) -> Result<Self, DiffcoError> {
        let labels = collisions.iter().map(|c| if *c { COLLISION_LABEL } else { FREE_LABEL }).collect();
        return Self::new(configs, labels);
    }
    pub fn configs(&self) -> &Vec<DVector<f64>> {
        &self.configs
    }
    pub fn labels(&self) -> &Vec<f64> {
        &self.labels
    }
    pub fn len(&self) -> usize { self.labels.len() }
    pub fn is_empty(&self) -> bool { self.labels.is_empty() }
    /// Configuration dimension, or None for an empty set.
    pub fn dim(&self) -> Option<usize> { self.configs.first().map(|c| c.len()) }
    pub fn free_configs(&self) -> Vec<DVector<f64>> {
        self.configs_with_label(FREE_LABEL)
    }
    pub fn collision_configs(&self) -> Vec<DVector<f64>> {
        self.configs_with_label(COLLISION_LABEL)
    }
    pub fn num_collisions(&self) -> usize {
        self.labels.iter().filter(|l| **l == COLLISION_LABEL).count()
    }
    fn configs_with_label(&self, label: f64) -> Vec<DVector<f64>> {
        self.configs.iter().zip(self.labels.iter()).filter(|(_, l)| **l == label).map(|(c, _)| c.clone()).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    train: LabeledSamples,
    test: LabeledSamples
}
impl Dataset {
    pub fn new(train: LabeledSamples, test: LabeledSamples) -> Result<Self, DiffcoError> {
        if let (Some(a), Some(b)) = (train.dim(), test.dim()) {
            if a != b { return Err(DiffcoError::new_dimension_mismatch_error("Dataset::new", b, a, file!(), line!())); }
        }
        Ok(Self { train, test })
    }
    pub fn train(&self) -> &LabeledSamples {
        &self.train
    }
    pub fn test(&self) -> &LabeledSamples {
        &self.test
    }
    pub fn total_len(&self) -> usize { self.train.len() + self.test.len() }
    pub fn dim(&self) -> Option<usize> { self.train.dim().or(self.test.dim()) }
}
impl SaveAndLoadable for Dataset {
    type SaveType = DatasetSaveObject;

    fn get_save_serialization_object(&self) -> Self::SaveType {
        let to_vecs = |v: &Vec<DVector<f64>>| v.iter().map(|c| c.as_slice().to_vec()).collect();
        DatasetSaveObject {
            train_configs: to_vecs(self.train.configs()),
            test_configs: to_vecs(self.test.configs()),
            train_labels: self.train.labels().clone(),
            test_labels: self.test.labels().clone()
        }
    }
    fn load_from_json_string(json_str: &str) -> Result<Self, DiffcoError> where Self: Sized {
        let save_object: DatasetSaveObject = FileUtils::load_object_from_json_string(json_str)?;
        let to_dvecs = |v: Vec<Vec<f64>>| v.into_iter().map(DVector::from_vec).collect();
        let train = LabeledSamples::new(to_dvecs(save_object.train_configs), save_object.train_labels)?;
        let test = LabeledSamples::new(to_dvecs(save_object.test_configs), save_object.test_labels)?;
        return Self::new(train, test);
    }
}

/// On-disk layout of a dataset: four named arrays.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetSaveObject {
    pub train_configs: Vec<Vec<f64>>,
    pub test_configs: Vec<Vec<f64>>,
    pub train_labels: Vec<f64>,
    pub test_labels: Vec<f64>
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRequest {
    pub sample_count: usize,
    pub train_count: usize,
    pub seed: u64
}
impl Default for DatasetRequest {
    fn default() -> Self {
        Self {
            sample_count: 12000,
            train_count: 10000,
            seed: 2021
        }
    }
}
impl DatasetRequest {
    pub fn test_count(&self) -> usize { self.sample_count.saturating_sub(self.train_count) }
    pub fn validate(&self) -> Result<(), DiffcoError> {
        if self.train_count < 1 || self.sample_count < self.train_count {
            return Err(DiffcoError::new_generic_error_str(&format!("need sample_count >= train_count >= 1, got sample_count {} and train_count {}.", self.sample_count, self.train_count), file!(), line!()));
        }
        Ok(())
    }
}

pub struct DatasetBuilder;
impl DatasetBuilder {
    /// Draws `sample_count` configurations, labels them with a single batched call and splits
    /// them into disjoint train and test sets with exactly `train_count` training samples.
    pub fn build_dataset<S, L>(request: &DatasetRequest, mut sampler: S, labeler: L, debug: &DiffcoDebug) -> Result<Dataset, DiffcoError>
        where S: FnMut() -> DVector<f64>,
              L: FnOnce(&Vec<DVector<f64>>) -> Result<Vec<bool>, DiffcoError> {
        request.validate()?;
        let start = Instant::now();

        let mut pb = if debug.includes(&DiffcoDebug::Verbose) {
            let mut pb = ProgressBar::new(request.sample_count as u64);
            pb.format("╢▌▌░╟");
            pb.show_counter = false;
            Some(pb)
        } else { None };

        let mut configs = Vec::with_capacity(request.sample_count);
        for i in 0..request.sample_count {
            configs.push(sampler());
            if let Some(pb) = &mut pb { if i % 100 == 0 { pb.set(i as u64); } }
        }
        if let Some(pb) = &mut pb { pb.finish(); }

        let collisions = labeler(&configs)?;
        if collisions.len() != configs.len() {
            return Err(DiffcoError::new_dimension_mismatch_error("build_dataset", collisions.len(), configs.len(), file!(), line!()));
        }

        let mut rng = SimpleSamplers::seeded_rng(request.seed);
        let train_idxs = rand::seq::index::sample(&mut rng, request.sample_count, request.train_count).into_vec();
        let mut in_train = vec![false; request.sample_count];
        for i in &train_idxs { in_train[*i] = true; }

        let mut train_configs = Vec::with_capacity(request.train_count);
        let mut train_flags = Vec::with_capacity(request.train_count);
        for i in &train_idxs {
            train_configs.push(configs[*i].clone());
            train_flags.push(collisions[*i]);
        }
        let mut test_configs = Vec::with_capacity(request.test_count());
        let mut test_flags = Vec::with_capacity(request.test_count());
        for (i, c) in configs.into_iter().enumerate() {
            if !in_train[i] {
                test_configs.push(c);
                test_flags.push(collisions[i]);
            }
        }

        let dataset = Dataset::new(
            LabeledSamples::new_from_collision_flags(train_configs, &train_flags)?,
            LabeledSamples::new_from_collision_flags(test_configs, &test_flags)?
        )?;

        diffco_print_debug(&format!("Built dataset with {} train and {} test samples ({} / {} in collision) in {:?}.",
                                    dataset.train().len(), dataset.test().len(), dataset.train().num_collisions(), dataset.test().num_collisions(), start.elapsed()),
                           debug, DiffcoDebug::Summary, PrintColor::None, false);

        Ok(dataset)
    }
    /// Samples from and labels with the given oracle.
    pub fn build_dataset_from_oracle(oracle: &dyn CollisionOracle, request: &DatasetRequest, debug: &DiffcoDebug) -> Result<Dataset, DiffcoError> {
        let mut rng = SimpleSamplers::seeded_rng(request.seed.wrapping_add(1));
        return Self::build_dataset(request, || oracle.sample_q(&mut rng), |configs| oracle.is_collision(configs), debug);
    }
}

/// A directory of datasets keyed by experiment name.
#[derive(Clone, Debug)]
pub struct DatasetStorage {
    data_dir: PathBuf
}
impl DatasetStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self { data_dir: data_dir.to_path_buf() }
    }
    pub fn new_default() -> Result<Self, DiffcoError> {
        Ok(Self::new(&DataDirUtils::get_default_data_dir()?))
    }
    pub fn path_for_key(&self, key: &str) -> PathBuf {
        DataDirUtils::get_path_to_data_dir_location(&self.data_dir, DataDirLocation::Dataset { key: key.to_string() })
    }
    pub fn save(&self, key: &str, dataset: &Dataset) -> Result<(), DiffcoError> {
        dataset.save_to_path(&self.path_for_key(key))
    }
    /// `Ok(None)` when nothing is stored under the key.
    pub fn load(&self, key: &str) -> Result<Option<Dataset>, DiffcoError> {
        let p = self.path_for_key(key);
        if !p.exists() { return Ok(None); }
        return Dataset::load_from_path(&p).map(Some);
    }
    /// Returns the stored dataset when it matches the request, otherwise builds a new one and
    /// stores it under `key`.  Unreadable or stale files are replaced, never fatal.
    pub fn build_or_load_dataset<S, L>(&self,
                                       key: &str,
                                       request: &DatasetRequest,
                                       expected_dof: usize,
                                       sampler: S,
                                       labeler: L,
                                       debug: &DiffcoDebug) -> Result<Dataset, DiffcoError>
        where S: FnMut() -> DVector<f64>,
              L: FnOnce(&Vec<DVector<f64>>) -> Result<Vec<bool>, DiffcoError> {
        request.validate()?;
        match self.load(key) {
            Ok(Some(dataset)) => {
                match Self::check_matches_request(&dataset, request, expected_dof) {
                    Ok(()) => {
                        diffco_print_debug(&format!("Loaded dataset {:?} from {:?}.", key, self.path_for_key(key)), debug, DiffcoDebug::Summary, PrintColor::Cyan, false);
                        return Ok(dataset);
                    }
                    Err(e) => { diffco_print_warning(&format!("stored dataset {:?} does not match the request, resampling. ({})", key, e), debug); }
                }
            }
            Ok(None) => {
                diffco_print_debug(&format!("No dataset stored under {:?}, sampling a new one.", key), debug, DiffcoDebug::Summary, PrintColor::None, false);
            }
            Err(e) => { diffco_print_warning(&format!("could not read dataset {:?}, resampling. ({})", key, e), debug); }
        }

        let dataset = DatasetBuilder::build_dataset(request, sampler, labeler, debug)?;
        if let Err(e) = self.save(key, &dataset) {
            diffco_print_warning(&format!("could not save dataset {:?}. ({})", key, e), debug);
        }
        Ok(dataset)
    }
    pub fn build_or_load_dataset_from_oracle(&self, key: &str, oracle: &dyn CollisionOracle, request: &DatasetRequest, debug: &DiffcoDebug) -> Result<Dataset, DiffcoError> {
        let mut rng = SimpleSamplers::seeded_rng(request.seed.wrapping_add(1));
        return self.build_or_load_dataset(key, request, oracle.num_dofs(), || oracle.sample_q(&mut rng), |configs| oracle.is_collision(configs), debug);
    }
    fn check_matches_request(dataset: &Dataset, request: &DatasetRequest, expected_dof: usize) -> Result<(), DiffcoError> {
        if dataset.train().len() != request.train_count {
            return Err(DiffcoError::new_dimension_mismatch_error("check_matches_request", dataset.train().len(), request.train_count, file!(), line!()));
        }
        if dataset.test().len() != request.test_count() {
            return Err(DiffcoError::new_dimension_mismatch_error("check_matches_request", dataset.test().len(), request.test_count(), file!(), line!()));
        }
        if let Some(d) = dataset.dim() {
            if d != expected_dof {
                return Err(DiffcoError::new_dimension_mismatch_error("check_matches_request", d, expected_dof, file!(), line!()));
            }
        }
        Ok(())
    }
}
