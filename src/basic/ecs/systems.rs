use bevy_ecs::prelude::*;

use super::elements::{CurrentInjection, PowerInjection, TerminalVoltage};
use crate::{
    basic::{
        error::DynResult,
        machine::{DynMachine, DynamicModel},
    },
    timeseries::{sim_time::Time, state::Trajectories},
};

/// Initialises every machine from its terminal voltage and power injection,
/// then stores the resulting current injection.
pub fn initialise_machines(world: &mut World) -> DynResult<()> {
    let mut query = world.query::<(
        &mut DynMachine,
        &TerminalVoltage,
        &PowerInjection,
        &mut CurrentInjection,
    )>();
    for (mut machine, vt, s, mut i) in query.iter_mut(world) {
        machine.initialise(vt.0, s.0)?;
        i.0 = machine.calc_currents(vt.0);
    }
    Ok(())
}

/// Recomputes the current injections for the present terminal voltages.
pub fn update_injections(world: &mut World) {
    let mut query = world.query::<(&mut DynMachine, &TerminalVoltage, &mut CurrentInjection)>();
    for (mut machine, vt, mut i) in query.iter_mut(world) {
        i.0 = machine.calc_currents(vt.0);
    }
}

/// Largest number of stages among the machines of `world`.
pub fn stage_count(world: &mut World) -> usize {
    let mut query = world.query::<&DynMachine>();
    query
        .iter(world)
        .map(|m| m.scheme().stages())
        .max()
        .unwrap_or(0)
}

/// Runs stage `stage` on every machine whose scheme has that stage.
pub fn solve_stage(world: &mut World, h: f64, stage: usize) -> DynResult<()> {
    let mut query = world.query::<&mut DynMachine>();
    for mut machine in query.iter_mut(world) {
        if stage < machine.scheme().stages() {
            machine.solve_step(h, stage)?;
        }
    }
    Ok(())
}

pub fn record_trajectories(
    time: Res<Time>,
    mut trajectories: ResMut<Trajectories>,
    machines: Query<&DynMachine>,
) {
    for machine in &machines {
        trajectories.record(time.0, machine);
    }
}

/// Records the present state outside the schedule, e.g. right after the
/// initialisation.
pub fn record_now(world: &mut World) {
    if !world.contains_resource::<Trajectories>() {
        return;
    }
    let t = world.get_resource::<Time>().map(|t| t.0).unwrap_or(0.0);
    world.resource_scope(|world, mut trajectories: Mut<Trajectories>| {
        let mut query = world.query::<&DynMachine>();
        for machine in query.iter(world) {
            trajectories.record(t, machine);
        }
    });
}
