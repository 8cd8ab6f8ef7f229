pub mod error;
pub mod integrator;
pub mod machine;
pub mod params;
pub mod post_processing;

#[cfg(feature = "ecs")]
pub mod ecs;
