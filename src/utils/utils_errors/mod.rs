use std::fmt;

/// A common error type returned by functions throughout the crate.
#[derive(Clone, Debug, PartialEq)]
pub enum DiffcoError {
    GenericError(String),
    IdxOutOfBoundError(String),
    UnsupportedOperationError(String),
    DimensionMismatchError(String),
    JointLimitMismatchError(String)
}
impl DiffcoError {
    pub fn new_generic_error_str(s: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: {} -- File: {}, Line: {}", s, file, line);
        return Self::GenericError(s);
    }
    pub fn new_idx_out_of_bound_error(given_idx: usize, length_of_array: usize, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Index {:?} is too large for the array of length {:?} -- File: {}, Line: {}", given_idx, length_of_array, file, line);
        return Self::IdxOutOfBoundError(s)
    }
    pub fn new_unsupported_operation_error(function_name: &str, message: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Unsupported operation error in function {}.  {} -- File: {}, Line: {}", function_name, message, file, line);
        return Self::UnsupportedOperationError(s);
    }
    pub fn new_dimension_mismatch_error(function_name: &str, given_dimension: usize, expected_dimension: usize, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Dimension mismatch in function {}.  Given dimension is {:?}, but it should be {:?} -- File: {}, Line: {}", function_name, given_dimension, expected_dimension, file, line);
        return Self::DimensionMismatchError(s);
    }
    pub fn new_joint_limit_mismatch_error(a: &Vec<(f64, f64)>, b: &Vec<(f64, f64)>, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Joint limits {:?} do not match joint limits {:?} -- File: {}, Line: {}", a, b, file, line);
        return Self::JointLimitMismatchError(s);
    }
    pub fn message(&self) -> &str {
        return match self {
            DiffcoError::GenericError(s) => { s }
            DiffcoError::IdxOutOfBoundError(s) => { s }
            DiffcoError::UnsupportedOperationError(s) => { s }
            DiffcoError::DimensionMismatchError(s) => { s }
            DiffcoError::JointLimitMismatchError(s) => { s }
        }
    }
}
impl fmt::Display for DiffcoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
impl std::error::Error for DiffcoError { }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_records_location() {
        let e = DiffcoError::new_generic_error_str("bad thing", "a.rs", 12);
        assert!(e.to_string().contains("bad thing"));
        assert!(e.to_string().contains("a.rs"));
        assert!(e.to_string().contains("12"));
    }

    #[test]
    fn dimension_mismatch_reports_both_sizes() {
        let e = DiffcoError::new_dimension_mismatch_error("fkine", 3, 7, file!(), line!());
        match &e {
            DiffcoError::DimensionMismatchError(s) => {
                assert!(s.contains("3"));
                assert!(s.contains("7"));
            }
            _ => panic!("wrong variant")
        }
    }
}
