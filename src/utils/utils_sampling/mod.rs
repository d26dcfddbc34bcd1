use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Normal, Distribution};
use crate::utils::utils_errors::DiffcoError;

pub struct SimpleSamplers;
impl SimpleSamplers {
    pub fn uniform_samples(bounds: &Vec<(f64, f64)>, rng: &mut dyn RngCore) -> Vec<f64> {
        let mut out_vec = vec![];
        for b in bounds {
            if b.0 == b.1 {
                out_vec.push(b.0);
            } else {
                out_vec.push(rng.gen_range(b.0..b.1));
            }
        }
        out_vec
    }
    pub fn normal_samples(means_and_standard_deviations: &Vec<(f64, f64)>, rng: &mut dyn RngCore) -> Result<Vec<f64>, DiffcoError> {
        let mut out_vec = vec![];
        for (mean, standard_deviation) in means_and_standard_deviations {
            if !(*standard_deviation >= 0.0) {
                return Err(DiffcoError::new_generic_error_str(&format!("standard deviation must be non-negative, got {}.", standard_deviation), file!(), line!()));
            }
            if *standard_deviation == 0.0 { out_vec.push(*mean); continue; }
            let distribution = Normal::new(*mean, *standard_deviation)
                .map_err(|e| DiffcoError::new_generic_error_str(&format!("invalid normal distribution: {}", e), file!(), line!()))?;
            out_vec.push(distribution.sample(rng));
        }
        Ok(out_vec)
    }
    /// Seeded generator used wherever results must be reproducible.
    pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
        return ChaCha20Rng::seed_from_u64(seed);
    }
}
