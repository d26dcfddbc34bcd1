use nalgebra::DVector;
use crate::utils::utils_errors::DiffcoError;

pub struct SimpleInterpolationUtils;
impl SimpleInterpolationUtils {
    pub fn linear_interpolation(start_point: &DVector<f64>,
                                end_point: &DVector<f64>,
                                mode: &LinearInterpolationMode) -> Vec<DVector<f64>> {
        let mut out_vec = vec![];

        let delta = end_point - start_point;
        let n = delta.norm();

        match mode {
            LinearInterpolationMode::FixedNumKnots { num_knots } => {
                if *num_knots < 2 { out_vec.push(start_point.clone()); out_vec.push(end_point.clone()); return out_vec; }
                let num_segments = *num_knots - 1;
                out_vec.push(start_point.clone());
                for i in 1..num_segments {
                    let t = i as f64 / num_segments as f64;
                    out_vec.push(start_point + t * &delta);
                }
                out_vec.push(end_point.clone());
            }
            LinearInterpolationMode::FixedL2NormSpacing { spacing } => {
                if *spacing >= n || n == 0.0 { out_vec.push(start_point.clone()); out_vec.push(end_point.clone()); }
                else {
                    let num_segments = Self::num_segments_for_spacing(n, *spacing);

                    out_vec.push(start_point.clone());
                    for i in 1..num_segments {
                        let t = i as f64 / num_segments as f64;
                        out_vec.push(start_point + t * &delta);
                    }
                    out_vec.push(end_point.clone());
                }
            }
        }

        out_vec
    }
    /// Inserts evenly spaced configurations between consecutive waypoints so that no step is
    /// longer than `max_step`.  Given waypoints are kept exactly, and segments that are already
    /// short enough are left alone.
    pub fn densify(path: &Vec<DVector<f64>>, max_step: f64) -> Result<Vec<DVector<f64>>, DiffcoError> {
        if !(max_step > 0.0) {
            return Err(DiffcoError::new_generic_error_str(&format!("max_step must be positive, got {}.", max_step), file!(), line!()));
        }
        let mut out_vec = vec![];
        if path.is_empty() { return Ok(out_vec); }

        out_vec.push(path[0].clone());
        for w in path.windows(2) {
            if w[0].len() != w[1].len() {
                return Err(DiffcoError::new_dimension_mismatch_error("densify", w[1].len(), w[0].len(), file!(), line!()));
            }
            let d = (&w[1] - &w[0]).norm();
            if d > max_step {
                let interpolated = Self::linear_interpolation(&w[0], &w[1], &LinearInterpolationMode::FixedL2NormSpacing { spacing: max_step });
                for p in interpolated.into_iter().skip(1) { out_vec.push(p); }
                // keep the original knot bit-exact
                let last = out_vec.len() - 1;
                out_vec[last] = w[1].clone();
            } else {
                out_vec.push(w[1].clone());
            }
        }

        Ok(out_vec)
    }
    /// Returns `num_points` configurations spread evenly by arc length along the piecewise
    /// linear path.  The first and last configurations are kept exactly.
    pub fn resample_by_arc_length(path: &Vec<DVector<f64>>, num_points: usize) -> Result<Vec<DVector<f64>>, DiffcoError> {
        if path.is_empty() {
            return Err(DiffcoError::new_generic_error_str("cannot resample an empty path.", file!(), line!()));
        }
        if num_points < 2 {
            return Err(DiffcoError::new_generic_error_str(&format!("resampling needs at least 2 points, got {}.", num_points), file!(), line!()));
        }
        let mut cumulative = vec![0.0];
        for w in path.windows(2) {
            if w[0].len() != w[1].len() {
                return Err(DiffcoError::new_dimension_mismatch_error("resample_by_arc_length", w[1].len(), w[0].len(), file!(), line!()));
            }
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + (&w[1] - &w[0]).norm());
        }
        let total = cumulative[cumulative.len() - 1];
        let first = path[0].clone();
        let last = path[path.len() - 1].clone();

        let mut out_vec = vec![first.clone()];
        let mut segment = 0;
        for k in 1..num_points - 1 {
            if total == 0.0 { out_vec.push(first.clone()); continue; }
            let s = total * k as f64 / (num_points - 1) as f64;
            while segment + 1 < path.len() - 1 && cumulative[segment + 1] < s { segment += 1; }
            let seg_len = cumulative[segment + 1] - cumulative[segment];
            let t = if seg_len > 0.0 { ((s - cumulative[segment]) / seg_len).min(1.0).max(0.0) } else { 0.0 };
            out_vec.push(&path[segment] + t * (&path[segment + 1] - &path[segment]));
        }
        out_vec.push(last);

        Ok(out_vec)
    }
    fn num_segments_for_spacing(length: f64, spacing: f64) -> usize {
        let mut k = (length / spacing).ceil().max(1.0) as usize;
        if length / k as f64 > spacing { k += 1; }
        k
    }
}

pub enum LinearInterpolationMode {
    FixedNumKnots { num_knots: usize },
    FixedL2NormSpacing { spacing: f64 }
}
