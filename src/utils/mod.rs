pub mod utils_console;
pub mod utils_enums;
pub mod utils_errors;
pub mod utils_files;
pub mod utils_math;
pub mod utils_sampling;
pub mod utils_shape_geometry;
pub mod utils_traits;
