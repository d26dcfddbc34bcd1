pub mod planar_robot;
pub mod robot_fk_module;
