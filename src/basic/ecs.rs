pub mod elements;
pub mod plugin;
pub mod systems;
