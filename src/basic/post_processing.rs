//! Tabular display of machine results.

mod res_display;
use res_display::*;
use tabled::{Table, settings::Style};

use super::machine::DynamicModel;

/// Renders the operating point of each machine as a markdown table.
pub fn machine_table<'a, M, I>(machines: I) -> String
where
    M: DynamicModel + ?Sized + 'a,
    I: IntoIterator<Item = &'a M>,
{
    let rows = machines.into_iter().map(|m| MachineResTable {
        Machine: m.id().id.clone(),
        Gen: m.id().gen_no,
        P_pu: FloatWrapper::new(m.signal("P"), 5),
        Q_pu: FloatWrapper::new(m.signal("Q"), 5),
        Vt_pu: FloatWrapper::new(m.signal("Vt"), 5),
        Omega_pu: FloatWrapper::new(m.state("omega"), 6),
        Delta_deg: FloatWrapper::new(m.state("delta").map(f64::to_degrees), 4),
    });
    Table::new(rows).with(Style::markdown()).to_string()
}

/// Prints [`machine_table`] to stdout.
pub fn print_machines<'a, M, I>(machines: I)
where
    M: DynamicModel + ?Sized + 'a,
    I: IntoIterator<Item = &'a M>,
{
    let table = machine_table(machines);
    println!("{table}");
}

#[cfg(test)]
mod test {
    use num_complex::Complex64;

    use super::*;
    use crate::basic::{
        integrator::IntegrationScheme,
        machine::{DynMachine, ExtGrid, SymOrder4},
        params::{MachineId, MachineParams},
    };

    #[test]
    fn test_machine_table() {
        let params = MachineParams {
            Ra: 0.0,
            Xd: 2.1,
            Xq: 2.0,
            Xdp: 0.3,
            Xqp: 0.5,
            Td0p: 7.0,
            Tq0p: 0.75,
            H: 3.0,
        };
        let mut gen1: DynMachine =
            SymOrder4::new(MachineId::new("GEN1", 1), params, IntegrationScheme::ModifiedEuler)
                .unwrap()
                .into();
        let mut grid: DynMachine =
            ExtGrid::new(MachineId::new("GRID", 0), 0.1, 6.0, IntegrationScheme::ModifiedEuler)
                .unwrap()
                .into();
        let vt = Complex64::new(1.0, 0.0);
        gen1.initialise(vt, Complex64::new(0.8, 0.2)).unwrap();
        grid.initialise(vt, Complex64::new(-0.8, -0.2)).unwrap();

        let table = machine_table([&gen1, &grid]);
        assert!(table.contains("GEN1"));
        assert!(table.contains("0.80000"));
        // the external grid has no reactive power signal
        assert!(table.lines().any(|l| l.contains("GRID") && l.contains(" - ")));
    }
}
