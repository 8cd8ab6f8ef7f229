#[cfg(feature = "ecs")]
pub mod sim_time;
pub mod state;

#[cfg(feature = "ecs")]
use bevy_app::plugin_group;
#[cfg(feature = "ecs")]
use sim_time::TimePlugin;

#[cfg(feature = "ecs")]
plugin_group! {
    /// Time keeping for ECS driven dynamic simulations.
    pub struct TimeSeriesDefaultPlugins {
     : TimePlugin,
    }
}
