//! Single machine against an infinite bus through a line reactance, with a
//! step in mechanical power at t = 0.1 s.

use bevy_ecs::prelude::*;
use num_complex::Complex64;
use rustdyn::prelude::{
    ecs::{
        elements::{CurrentInjection, TerminalVoltage},
        systems::update_injections,
    },
    *,
};

const XL: f64 = 0.1;
const NETWORK_ITERATIONS: usize = 5;

const MACHINE: &str = "
# round rotor generator
ID = GEN1
GEN_NO = 1
Ra = 0.003
Xd = 2.1
Xq = 2.0
Xdp = 0.3
Xqp = 0.5
Td0p = 7.0
Tq0p = 0.75
H = 3.0
";

fn main() -> DynResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = SimConfig {
        scheme: IntegrationScheme::RungeKutta4,
        dt: 0.005,
        t_end: 2.0,
        ..Default::default()
    };
    let file = rustdyn::io::mach::parse_mach(MACHINE)?;
    let machine = file.sym_order4(config.scheme)?;

    // power-flow result at the machine terminal
    let vt0 = Complex64::new(1.0, 0.0);
    let s0 = Complex64::new(0.8, 0.2);
    let v_inf = vt0 - Complex64::new(0.0, XL) * (s0 / vt0).conj();
    let yl = Complex64::new(0.0, XL).inv();

    let mut app = dynamics_app(&config)?;
    app.spawn_machine(machine, vt0, s0);
    app.initialise_machines()?;
    app.print_machines();

    let mut network = move |world: &mut World| -> DynResult<()> {
        for _ in 0..NETWORK_ITERATIONS {
            update_injections(world);
            let mut query =
                world.query::<(&DynMachine, &CurrentInjection, &mut TerminalVoltage)>();
            for (m, i, mut vt) in query.iter_mut(world) {
                vt.0 = (i.0 + yl * v_inf) / (m.norton_admittance() + yl);
            }
        }
        Ok(())
    };

    for step in 0..config.steps() {
        if step == (0.1 / config.dt).round() as usize {
            let world = app.world_mut();
            let mut query = world.query::<&mut DynMachine>();
            for mut m in query.iter_mut(world) {
                if let DynMachine::SymOrder4(sym) = &mut *m {
                    sym.set_pm(0.9);
                }
            }
        }
        app.advance_dynamics(&mut network)?;
    }
    app.print_machines();

    let out = std::env::temp_dir().join("rustdyn_infinite_bus");
    app.world()
        .resource::<rustdyn::timeseries::state::Trajectories>()
        .save_csv_dir(&out)?;
    println!("trajectories written to {}", out.display());
    Ok(())
}
