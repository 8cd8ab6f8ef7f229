//! External grid model: a constant EMF behind a transient reactance with a
//! swing equation for its angle and speed.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_FREQUENCY_HZ, DynamicModel, Residuals};
use crate::basic::{
    error::{DynError, DynResult},
    integrator::{IntegrationScheme, NamedVector, StepContext, check_step_size},
    params::{MachineId, ParamStore},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, NamedVector)]
pub struct GridStates {
    pub omega: f64,
    pub delta: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, NamedVector)]
pub struct GridSignals {
    #[vector(name = "Vt")]
    pub vt: f64,
    #[vector(name = "P")]
    pub p: f64,
    #[vector(name = "Pm")]
    pub pm: f64,
}

/// Stiff source seen by the network as a constant EMF behind `Xdp`.
///
/// The nominal frequency defaults to [`DEFAULT_FREQUENCY_HZ`] like every
/// other model here, not 60 Hz. Use [`ExtGrid::with_nominal_frequency`] for a
/// 60 Hz system.
#[derive(Debug, Clone)]
pub struct ExtGrid {
    id: MachineId,
    xdp: f64,
    h_inertia: f64,
    scheme: IntegrationScheme,
    omega_n: f64,
    /// Magnitude of the internal EMF, fixed at initialisation.
    eq: f64,
    states: GridStates,
    signals: GridSignals,
    ctx: StepContext<2>,
}

impl ExtGrid {
    pub fn new(id: MachineId, xdp: f64, h_inertia: f64, scheme: IntegrationScheme) -> DynResult<Self> {
        if !xdp.is_finite() || xdp == 0.0 {
            return Err(DynError::DegenerateImpedance { denominator: xdp });
        }
        if !(h_inertia.is_finite() && h_inertia > 0.0) {
            return Err(DynError::InvalidParameter {
                name: "H",
                value: h_inertia,
                reason: "must be finite and strictly positive",
            });
        }
        Ok(Self {
            id,
            xdp,
            h_inertia,
            scheme,
            omega_n: 2.0 * PI * DEFAULT_FREQUENCY_HZ,
            eq: 0.0,
            states: GridStates::default(),
            signals: GridSignals::default(),
            ctx: StepContext::new(),
        })
    }

    pub fn from_store(id: MachineId, store: &ParamStore, scheme: IntegrationScheme) -> DynResult<Self> {
        Self::new(id, store.require("Xdp")?, store.require("H")?, scheme)
    }

    pub fn with_nominal_frequency(mut self, f_n: f64) -> DynResult<Self> {
        if !(f_n.is_finite() && f_n > 0.0) {
            return Err(DynError::InvalidParameter {
                name: "fn",
                value: f_n,
                reason: "must be finite and strictly positive",
            });
        }
        self.omega_n = 2.0 * PI * f_n;
        Ok(self)
    }

    pub fn id(&self) -> &MachineId {
        &self.id
    }

    pub fn scheme(&self) -> IntegrationScheme {
        self.scheme
    }

    pub fn emf(&self) -> f64 {
        self.eq
    }

    pub fn states(&self) -> &GridStates {
        &self.states
    }

    pub fn signals(&self) -> &GridSignals {
        &self.signals
    }

    pub fn set_pm(&mut self, pm: f64) {
        self.signals.pm = pm;
    }

    pub fn norton_admittance(&self) -> Complex64 {
        Complex64::new(0.0, self.xdp).inv()
    }

    pub fn initialise(&mut self, vt0: Complex64, s0: Complex64) -> DynResult<()> {
        if vt0.norm() == 0.0 {
            return Err(DynError::ZeroVoltage);
        }
        let ia0 = (s0 / vt0).conj();
        let eq0 = vt0 + Complex64::new(0.0, self.xdp) * ia0;
        let delta0 = eq0.arg();
        let p0 = vt0.norm() * eq0.norm() * (delta0 - vt0.arg()).sin() / self.xdp;

        self.eq = eq0.norm();
        self.signals = GridSignals {
            vt: vt0.norm(),
            p: p0,
            pm: p0,
        };
        self.states = GridStates {
            omega: 1.0,
            delta: delta0,
        };
        self.ctx = StepContext::new();
        tracing::debug!(machine = %self.id.id, delta0, eq = self.eq, p0, "initialised external grid");
        self.check_diffs();
        Ok(())
    }

    fn rates(&self) -> GridStates {
        GridStates {
            omega: (self.signals.pm - self.signals.p) / (2.0 * self.h_inertia),
            delta: self.omega_n * (self.states.omega - 1.0),
        }
    }

    pub fn check_diffs(&self) -> Residuals {
        let d_omega = self.rates().omega;
        let residuals = Residuals(vec![("domega", d_omega)]);
        if !residuals.is_zero() {
            tracing::warn!(machine = %self.id.id, d_omega, "swing equation not zero on initialisation");
        }
        residuals
    }

    pub fn calc_currents(&mut self, vt: Complex64) -> Complex64 {
        let delta = self.states.delta;
        self.signals.p = vt.norm() * self.eq * (delta - vt.arg()).sin() / self.xdp;
        self.signals.vt = vt.norm();
        Complex64::from_polar(self.eq, delta) / Complex64::new(0.0, self.xdp)
    }

    pub fn solve_step(&mut self, h: f64, stage: usize) -> DynResult<()> {
        check_step_size(h)?;
        let k = self.rates().to_vector() * h;
        let mut x = self.states.to_vector();
        self.ctx.advance(self.scheme, stage, &mut x, k)?;
        self.states = GridStates::from_vector(&x);
        Ok(())
    }
}

impl DynamicModel for ExtGrid {
    fn id(&self) -> &MachineId {
        ExtGrid::id(self)
    }

    fn scheme(&self) -> IntegrationScheme {
        self.scheme
    }

    fn initialise(&mut self, vt0: Complex64, s0: Complex64) -> DynResult<()> {
        ExtGrid::initialise(self, vt0, s0)
    }

    fn calc_currents(&mut self, vt: Complex64) -> Complex64 {
        ExtGrid::calc_currents(self, vt)
    }

    fn solve_step(&mut self, h: f64, stage: usize) -> DynResult<()> {
        ExtGrid::solve_step(self, h, stage)
    }

    fn check_diffs(&self) -> Residuals {
        ExtGrid::check_diffs(self)
    }

    fn norton_admittance(&self) -> Complex64 {
        ExtGrid::norton_admittance(self)
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        self.states.named().to_vec()
    }

    fn signal_values(&self) -> Vec<(&'static str, f64)> {
        self.signals.named().to_vec()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn grid(scheme: IntegrationScheme) -> ExtGrid {
        ExtGrid::new(MachineId::new("GRID1", 0), 0.1, 6.0, scheme).unwrap()
    }

    #[test]
    fn test_initialise_power_balance() {
        let mut g = grid(IntegrationScheme::ModifiedEuler);
        let vt0 = Complex64::from_polar(1.0, 0.0);
        g.initialise(vt0, Complex64::new(-0.5, 0.1)).unwrap();
        assert!((g.signals().p + 0.5).abs() < 1e-12);
        assert_eq!(g.states().omega, 1.0);
        assert!(g.check_diffs().is_zero());
    }

    #[test]
    fn test_injection_matches_emf() {
        let mut g = grid(IntegrationScheme::RungeKutta4);
        let vt0 = Complex64::from_polar(1.0, 0.05);
        let s0 = Complex64::new(0.6, 0.2);
        g.initialise(vt0, s0).unwrap();
        let injection = g.calc_currents(vt0);
        // Norton source minus the admittance current gives the armature current
        let ia = injection - g.norton_admittance() * vt0;
        let expected = (s0 / vt0).conj();
        assert!((ia - expected).norm() < 1e-12);
    }

    #[test]
    fn test_steady_state_is_stationary() {
        let mut g = grid(IntegrationScheme::RungeKutta4);
        let vt = Complex64::new(1.0, 0.0);
        g.initialise(vt, Complex64::new(0.3, 0.0)).unwrap();
        let delta0 = g.states().delta;
        for _ in 0..100 {
            for stage in 0..g.scheme().stages() {
                g.solve_step(0.01, stage).unwrap();
                g.calc_currents(vt);
            }
        }
        assert!((g.states().omega - 1.0).abs() < 1e-9);
        assert!((g.states().delta - delta0).abs() < 1e-9);
    }

    #[test]
    fn test_nominal_frequency() {
        let mut g = grid(IntegrationScheme::ModifiedEuler);
        assert_eq!(g.omega_n, 2.0 * PI * 50.0);
        g = g.with_nominal_frequency(60.0).unwrap();
        assert_eq!(g.omega_n, 2.0 * PI * 60.0);
        assert!(g.with_nominal_frequency(0.0).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ExtGrid::new(MachineId::default(), 0.0, 6.0, IntegrationScheme::ModifiedEuler).is_err());
        assert!(ExtGrid::new(MachineId::default(), 0.1, -1.0, IntegrationScheme::ModifiedEuler).is_err());
    }
}
