//! Dynamic machine models fed by a network solution.
//!
//! Every model follows the same cycle: [`DynamicModel::initialise`] once from
//! a power-flow result, then per macro step alternate
//! [`DynamicModel::solve_step`] and [`DynamicModel::calc_currents`] for each
//! stage of its [`IntegrationScheme`].

use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{error::DynResult, integrator::IntegrationScheme, params::MachineId};

pub mod ext_grid;
pub mod sym_order4;

pub use ext_grid::ExtGrid;
pub use sym_order4::SymOrder4;

/// Default nominal network frequency in Hz.
pub const DEFAULT_FREQUENCY_HZ: f64 = 50.0;

/// Decimal digits residuals are rounded to before they count as nonzero.
pub const RESIDUAL_DECIMALS: i32 = 6;

/// How initial machine quantities are derived from the power-flow result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitMethod {
    /// Project the network voltage and current into the dq frame and solve
    /// the stator equations for the transient EMFs (includes `Ra`).
    #[default]
    Projection,
    /// Build Vfd, Eqp and Edp from the EMF behind `Xq` and recover Vd/Vq
    /// from them, neglecting `Ra`.
    Algebraic,
}

/// Values of the differential equations evaluated at the current state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Residuals(pub Vec<(&'static str, f64)>);

impl Residuals {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// True when every residual rounds to zero at [`RESIDUAL_DECIMALS`].
    pub fn is_zero(&self) -> bool {
        let scale = 10f64.powi(RESIDUAL_DECIMALS);
        self.0.iter().all(|(_, v)| (v * scale).round() == 0.0)
    }
}

impl fmt::Display for Residuals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}

/// Common interface of the machine models, as seen by a network solver.
pub trait DynamicModel {
    fn id(&self) -> &MachineId;

    fn scheme(&self) -> IntegrationScheme;

    /// Derives consistent states and signals from the terminal voltage and
    /// complex power injection of the initial network solution.
    fn initialise(&mut self, vt0: Complex64, s0: Complex64) -> DynResult<()>;

    /// Updates the algebraic signals for terminal voltage `vt` and returns the
    /// current injection in the network reference frame.
    fn calc_currents(&mut self, vt: Complex64) -> Complex64;

    /// Advances the states by stage `stage` of a macro step of size `h`.
    fn solve_step(&mut self, h: f64, stage: usize) -> DynResult<()>;

    /// Evaluates the differential equations at the current state and warns
    /// when they are not zero.
    fn check_diffs(&self) -> Residuals;

    /// Admittance the network adds to its Ybus for this machine.
    fn norton_admittance(&self) -> Complex64;

    fn state_values(&self) -> Vec<(&'static str, f64)>;

    fn signal_values(&self) -> Vec<(&'static str, f64)>;

    fn state(&self, name: &str) -> Option<f64> {
        find(&self.state_values(), name)
    }

    fn signal(&self, name: &str) -> Option<f64> {
        find(&self.signal_values(), name)
    }
}

fn find(values: &[(&'static str, f64)], name: &str) -> Option<f64> {
    values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

/// Closed-set dispatch over the available machine models.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "ecs", derive(bevy_ecs::component::Component))]
pub enum DynMachine {
    SymOrder4(SymOrder4),
    ExtGrid(ExtGrid),
}

impl From<SymOrder4> for DynMachine {
    fn from(m: SymOrder4) -> Self {
        DynMachine::SymOrder4(m)
    }
}

impl From<ExtGrid> for DynMachine {
    fn from(m: ExtGrid) -> Self {
        DynMachine::ExtGrid(m)
    }
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            DynMachine::SymOrder4($m) => $body,
            DynMachine::ExtGrid($m) => $body,
        }
    };
}

impl DynamicModel for DynMachine {
    fn id(&self) -> &MachineId {
        dispatch!(self, m => m.id())
    }

    fn scheme(&self) -> IntegrationScheme {
        dispatch!(self, m => m.scheme())
    }

    fn initialise(&mut self, vt0: Complex64, s0: Complex64) -> DynResult<()> {
        dispatch!(self, m => m.initialise(vt0, s0))
    }

    fn calc_currents(&mut self, vt: Complex64) -> Complex64 {
        dispatch!(self, m => m.calc_currents(vt))
    }

    fn solve_step(&mut self, h: f64, stage: usize) -> DynResult<()> {
        dispatch!(self, m => m.solve_step(h, stage))
    }

    fn check_diffs(&self) -> Residuals {
        dispatch!(self, m => m.check_diffs())
    }

    fn norton_admittance(&self) -> Complex64 {
        dispatch!(self, m => m.norton_admittance())
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        dispatch!(self, m => DynamicModel::state_values(m))
    }

    fn signal_values(&self) -> Vec<(&'static str, f64)> {
        dispatch!(self, m => DynamicModel::signal_values(m))
    }
}
