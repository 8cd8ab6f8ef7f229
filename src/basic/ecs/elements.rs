use bevy_ecs::prelude::*;
use derive_more::{Deref, DerefMut, From};
use num_complex::Complex64;

use crate::basic::machine::DynMachine;

/// Complex terminal voltage of a machine in the network frame.
///
/// Written by the network solution, read by the machine when it computes its
/// injection.
#[derive(Debug, Component, Clone, Copy, Deref, DerefMut, From, PartialEq)]
pub struct TerminalVoltage(pub Complex64);

impl Default for TerminalVoltage {
    fn default() -> Self {
        Self(Complex64::new(1.0, 0.0))
    }
}

/// Complex power the machine injects into the network at initialisation.
#[derive(Debug, Component, Clone, Copy, Default, Deref, DerefMut, From, PartialEq)]
pub struct PowerInjection(pub Complex64);

/// Norton current injection of the machine in the network frame.
#[derive(Debug, Component, Clone, Copy, Default, Deref, DerefMut, From, PartialEq)]
pub struct CurrentInjection(pub Complex64);

/// Everything a machine entity carries.
#[derive(Debug, Bundle)]
pub struct MachineBundle {
    pub machine: DynMachine,
    pub vt: TerminalVoltage,
    pub s: PowerInjection,
    /// Filled in by the initialisation.
    pub i: CurrentInjection,
}

impl MachineBundle {
    pub fn new(machine: impl Into<DynMachine>, vt0: Complex64, s0: Complex64) -> Self {
        Self {
            machine: machine.into(),
            vt: TerminalVoltage(vt0),
            s: PowerInjection(s0),
            i: CurrentInjection::default(),
        }
    }
}
