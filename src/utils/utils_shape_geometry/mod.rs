pub mod geometric_shape;
