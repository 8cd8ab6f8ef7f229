use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use num_complex::Complex64;

use super::{
    elements::MachineBundle,
    systems::{
        initialise_machines, record_now, record_trajectories, solve_stage, stage_count,
        update_injections,
    },
};
use crate::{
    basic::{
        error::DynResult,
        integrator::check_step_size,
        machine::{DynMachine, DynamicModel},
        post_processing::print_machines,
    },
    io::config::SimConfig,
    timeseries::{
        sim_time::{DeltaTime, Time, TimePlugin},
        state::Trajectories,
    },
};

/// Sets up time keeping and trajectory recording for machine dynamics.
///
/// The plugin does not solve the network. The caller drives every macro step
/// through [`DynamicsApp::advance_dynamics`] and supplies the network solution
/// as a hook.
pub struct DynamicsPlugin {
    /// Macro step size in seconds.
    pub dt: f64,
    pub record: bool,
}

impl Default for DynamicsPlugin {
    fn default() -> Self {
        Self {
            dt: 0.01,
            record: true,
        }
    }
}

impl Plugin for DynamicsPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<TimePlugin>() {
            app.add_plugins(TimePlugin);
        }
        app.insert_resource(DeltaTime(self.dt));
        if self.record {
            app.init_resource::<Trajectories>();
        }
        app.add_systems(
            PostUpdate,
            record_trajectories.run_if(resource_exists::<Trajectories>),
        );
    }
}

/// Driver operations for an [`App`] holding machine entities.
pub trait DynamicsApp {
    fn spawn_machine(
        &mut self,
        machine: impl Into<DynMachine>,
        vt0: Complex64,
        s0: Complex64,
    ) -> Entity;

    /// Initialises all machines from their stored terminal voltage and power,
    /// computes the first injections and records the starting point.
    fn initialise_machines(&mut self) -> DynResult<()>;

    /// Recomputes the current injections from the present terminal voltages.
    fn update_injections(&mut self);

    /// Advances every machine by one macro step of [`DeltaTime`].
    ///
    /// After each stage the `network` hook receives the world with the new
    /// machine states. It is expected to write the [`TerminalVoltage`]
    /// components, usually alternating its own solve with
    /// [`update_injections`]. The injections are then refreshed from the
    /// final voltages of the stage. After the last stage the schedule runs,
    /// which advances [`Time`] and records the trajectories.
    ///
    /// An error from a machine or from `network` aborts the step where it
    /// happens. Machines already past that stage keep their partial update and
    /// the schedule does not run, so [`Time`] is not advanced. Re-initialise
    /// the machines before stepping again.
    ///
    /// [`TerminalVoltage`]: super::elements::TerminalVoltage
    /// [`update_injections`]: super::systems::update_injections
    fn advance_dynamics<F>(&mut self, network: F) -> DynResult<()>
    where
        F: FnMut(&mut World) -> DynResult<()>;

    fn print_machines(&mut self);
}

impl DynamicsApp for App {
    fn spawn_machine(
        &mut self,
        machine: impl Into<DynMachine>,
        vt0: Complex64,
        s0: Complex64,
    ) -> Entity {
        self.world_mut()
            .spawn(MachineBundle::new(machine, vt0, s0))
            .id()
    }

    fn initialise_machines(&mut self) -> DynResult<()> {
        let world = self.world_mut();
        initialise_machines(world)?;
        record_now(world);
        Ok(())
    }

    fn update_injections(&mut self) {
        update_injections(self.world_mut());
    }

    fn advance_dynamics<F>(&mut self, mut network: F) -> DynResult<()>
    where
        F: FnMut(&mut World) -> DynResult<()>,
    {
        let world = self.world_mut();
        let h = world.get_resource::<DeltaTime>().map(|dt| dt.0).unwrap_or(0.0);
        check_step_size(h)?;
        for stage in 0..stage_count(world) {
            solve_stage(world, h, stage)?;
            network(world)?;
            update_injections(world);
        }
        self.update();
        if let Some(t) = self.world().get_resource::<Time>() {
            tracing::trace!(t = t.0, "advanced machine dynamics");
        }
        Ok(())
    }

    fn print_machines(&mut self) {
        let world = self.world_mut();
        let mut query = world.query::<&DynMachine>();
        let machines: Vec<&DynMachine> = query.iter(world).collect();
        print_machines(machines);
    }
}

/// App with the dynamics plugin configured from `config` and one entity per
/// configured machine, all at 1∠0 with zero power until the caller writes the
/// power-flow result into them.
pub fn dynamics_app(config: &SimConfig) -> DynResult<App> {
    config.validate()?;
    let mut app = App::new();
    app.add_plugins(DynamicsPlugin {
        dt: config.dt,
        record: true,
    });
    for machine in config.build_machines()? {
        tracing::debug!(machine = %machine.id().id, "spawning machine");
        app.spawn_machine(machine, Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
    }
    Ok(app)
}
