mod basic;
pub mod io;
pub mod timeseries;
pub mod prelude {
    use crate::basic;
    pub use basic::*;

    pub use crate::io::{config::SimConfig, mach::load_mach};
    pub use basic::error::{DynError, DynResult};
    pub use basic::integrator::{IntegrationScheme, NamedVector, StepContext};
    pub use basic::machine::{DynMachine, DynamicModel, ExtGrid, InitMethod, Residuals, SymOrder4};
    pub use basic::params::{MachineId, MachineParams, ParamStore};

    #[cfg(feature = "ecs")]
    pub use basic::ecs::plugin::{DynamicsApp, DynamicsPlugin, dynamics_app};
}
