//! 4th-order synchronous machine model.
//!
//! States are the rotor angle and speed (swing equation) and the transient
//! EMFs behind `Xdp`/`Xqp`. The stator is algebraic: given a terminal voltage
//! the dq currents follow from two linear equations, and the machine is seen
//! by the network as a Norton current source in parallel with [`SymOrder4::norton_admittance`].

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_FREQUENCY_HZ, DynamicModel, InitMethod, Residuals};
use crate::basic::{
    error::{DynError, DynResult},
    integrator::{IntegrationScheme, NamedVector, StepContext, check_step_size},
    params::{MachineId, MachineParams, ParamStore},
};

/// Dynamic states, integrated every stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, NamedVector)]
pub struct MachineStates {
    /// Rotor speed in per-unit, 1.0 is synchronous.
    pub omega: f64,
    /// Rotor angle in radians.
    pub delta: f64,
    #[vector(name = "Eqp")]
    pub eqp: f64,
    #[vector(name = "Edp")]
    pub edp: f64,
}

/// Algebraic signals, refreshed by [`SymOrder4::calc_currents`].
///
/// `vfd` and `pm` are inputs held by exciter and governor collaborators; the
/// machine only sets them at initialisation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, NamedVector)]
pub struct MachineSignals {
    #[vector(name = "Vfd")]
    pub vfd: f64,
    #[vector(name = "Id")]
    pub id: f64,
    #[vector(name = "Iq")]
    pub iq: f64,
    #[vector(name = "Vd")]
    pub vd: f64,
    #[vector(name = "Vq")]
    pub vq: f64,
    #[vector(name = "Vt")]
    pub vt: f64,
    #[vector(name = "P")]
    pub p: f64,
    #[vector(name = "Q")]
    pub q: f64,
    #[vector(name = "Pm")]
    pub pm: f64,
}

/// Closed-form solvers of the stator equations
///
/// ```text
/// Eqp - Vq = Xdp*Id + Ra*Iq
/// Edp - Vd = Ra*Id  - Xqp*Iq
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DqSolver {
    /// `Ra > 0`: Cramer's rule on the coupled 2x2 system,
    /// `Id = (Xqp*a + Ra*b) / D`, `Iq = (Ra*a - Xdp*b) / D` with
    /// `a = Eqp - Vq`, `b = Edp - Vd`, `D = Xdp*Xqp + Ra^2`.
    Resistive,
    /// `Ra <= 0`: the cross terms vanish, `Id = (Eqp - Vq)/Xdp` and
    /// `Iq = (Vd - Edp)/Xqp`.
    Lossless,
}

impl DqSolver {
    pub fn for_params(params: &MachineParams) -> Self {
        if params.Ra > 0.0 {
            DqSolver::Resistive
        } else {
            DqSolver::Lossless
        }
    }

    /// Returns `(Id, Iq)`.
    pub fn solve(self, params: &MachineParams, eqp: f64, edp: f64, vd: f64, vq: f64) -> (f64, f64) {
        match self {
            DqSolver::Resistive => {
                let a = eqp - vq;
                let b = edp - vd;
                let det = params.Xdp * params.Xqp + params.Ra * params.Ra;
                let id = (params.Xqp * a + params.Ra * b) / det;
                let iq = (params.Ra * a - params.Xdp * b) / det;
                (id, iq)
            }
            DqSolver::Lossless => ((eqp - vq) / params.Xdp, (vd - edp) / params.Xqp),
        }
    }
}

/// 4th-order (two-axis) synchronous machine.
#[derive(Debug, Clone)]
pub struct SymOrder4 {
    id: MachineId,
    params: MachineParams,
    scheme: IntegrationScheme,
    init_method: InitMethod,
    omega_n: f64,
    yg: Complex64,
    solver: DqSolver,
    states: MachineStates,
    signals: MachineSignals,
    ctx: StepContext<4>,
}

impl SymOrder4 {
    pub fn new(id: MachineId, params: MachineParams, scheme: IntegrationScheme) -> DynResult<Self> {
        params.validate()?;
        let ra = params.ra_eff();
        // Equivalent Norton admittance for Ybus modification
        let yg = Complex64::new(ra, -0.5 * (params.Xdp + params.Xqp)) / params.dq_determinant();
        Ok(Self {
            id,
            params,
            scheme,
            init_method: InitMethod::default(),
            omega_n: 2.0 * PI * DEFAULT_FREQUENCY_HZ,
            yg,
            solver: DqSolver::for_params(&params),
            states: MachineStates::default(),
            signals: MachineSignals::default(),
            ctx: StepContext::new(),
        })
    }

    pub fn from_store(id: MachineId, store: &ParamStore, scheme: IntegrationScheme) -> DynResult<Self> {
        Self::new(id, MachineParams::try_from(store)?, scheme)
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

    pub fn with_init_method(mut self, method: InitMethod) -> Self {
        self.init_method = method;
        self
    }

    pub fn id(&self) -> &MachineId {
        &self.id
    }

    pub fn params(&self) -> &MachineParams {
        &self.params
    }

    pub fn scheme(&self) -> IntegrationScheme {
        self.scheme
    }

    pub fn omega_n(&self) -> f64 {
        self.omega_n
    }

    pub fn states(&self) -> &MachineStates {
        &self.states
    }

    pub fn signals(&self) -> &MachineSignals {
        &self.signals
    }

    pub fn step_context(&self) -> &StepContext<4> {
        &self.ctx
    }

    /// Overwrites the dynamic states, e.g. to apply a disturbance.
    pub fn set_states(&mut self, states: MachineStates) {
        self.states = states;
    }

    /// Mechanical power input, held constant across the stages of a step.
    pub fn set_pm(&mut self, pm: f64) {
        self.signals.pm = pm;
    }

    /// Field voltage, held constant across the stages of a step.
    pub fn set_vfd(&mut self, vfd: f64) {
        self.signals.vfd = vfd;
    }

    pub fn norton_admittance(&self) -> Complex64 {
        self.yg
    }

    pub fn initialise(&mut self, vt0: Complex64, s0: Complex64) -> DynResult<()> {
        if vt0.norm() == 0.0 {
            return Err(DynError::ZeroVoltage);
        }
        let p = self.params;
        let ra = p.ra_eff();

        let ia0 = (s0 / vt0).conj();
        let phi0 = ia0.arg();

        // EMF behind the synchronous reactance, aligned with the q axis
        let eq0 = vt0 + Complex64::new(ra, p.Xq) * ia0;
        let delta0 = eq0.arg();

        let id0 = ia0.norm() * (delta0 - phi0).sin();
        let iq0 = ia0.norm() * (delta0 - phi0).cos();

        let (vd0, vq0, eqp0, edp0, vfd0, p0) = match self.init_method {
            InitMethod::Projection => {
                let vd0 = vt0.norm() * (delta0 - vt0.arg()).sin();
                let vq0 = vt0.norm() * (delta0 - vt0.arg()).cos();
                let eqp0 = vq0 + ra * iq0 + p.Xdp * id0;
                let edp0 = vd0 + ra * id0 - p.Xqp * iq0;
                let vfd0 = eqp0 + (p.Xd - p.Xdp) * id0;
                let p0 = (vd0 + ra * id0) * id0 + (vq0 + ra * iq0) * iq0;
                (vd0, vq0, eqp0, edp0, vfd0, p0)
            }
            InitMethod::Algebraic => {
                let vfd0 = eq0.norm() + (p.Xd - p.Xq) * id0;
                let eqp0 = vfd0 - (p.Xd - p.Xdp) * id0;
                let edp0 = (p.Xq - p.Xqp) * iq0;
                let vd0 = edp0 + p.Xqp * iq0 - ra * id0;
                let vq0 = eqp0 - p.Xdp * id0 - ra * iq0;
                let p0 = (vd0 + ra * id0) * id0 + (vq0 + ra * iq0) * iq0;
                (vd0, vq0, eqp0, edp0, vfd0, p0)
            }
        };

        self.signals = MachineSignals {
            vfd: vfd0,
            id: id0,
            iq: iq0,
            vd: vd0,
            vq: vq0,
            vt: vt0.norm(),
            p: p0,
            q: vq0 * id0 - vd0 * iq0,
            pm: p0,
        };
        self.states = MachineStates {
            omega: 1.0,
            delta: delta0,
            eqp: eqp0,
            edp: edp0,
        };
        self.ctx = StepContext::new();

        tracing::debug!(
            machine = %self.id.id,
            delta0,
            eqp0,
            edp0,
            vfd0,
            p0,
            "initialised 4th order machine"
        );
        self.check_diffs();
        Ok(())
    }

    /// Right-hand sides of the four differential equations.
    fn rates(&self) -> MachineStates {
        let p = &self.params;
        let s = &self.signals;
        let x = &self.states;
        MachineStates {
            omega: (s.pm - s.p) / (2.0 * p.H),
            delta: self.omega_n * (x.omega - 1.0),
            eqp: (s.vfd - (p.Xd - p.Xdp) * s.id - x.eqp) / p.Td0p,
            edp: ((p.Xq - p.Xqp) * s.iq - x.edp) / p.Tq0p,
        }
    }

    pub fn check_diffs(&self) -> Residuals {
        let rates = self.rates();
        let residuals = Residuals(vec![("dEdp", rates.edp), ("dEqp", rates.eqp)]);
        if !residuals.is_zero() {
            tracing::warn!(
                machine = %self.id.id,
                d_edp = rates.edp,
                d_eqp = rates.eqp,
                "differential equations not zero on initialisation"
            );
        }
        residuals
    }

    pub fn calc_currents(&mut self, vt: Complex64) -> Complex64 {
        let delta = self.states.delta;
        let (vm, va) = vt.to_polar();
        let vd = vm * (delta - va).sin();
        let vq = vm * (delta - va).cos();

        let (id, iq) = self
            .solver
            .solve(&self.params, self.states.eqp, self.states.edp, vd, vq);

        let ra = self.params.ra_eff();
        let p = (vd + ra * id) * id + (vq + ra * iq) * iq;
        let q = vq * id - vd * iq;

        // dq current rotated into the network frame
        let i_n = Complex64::new(iq, -id) * Complex64::cis(delta);

        self.signals.id = id;
        self.signals.iq = iq;
        self.signals.vd = vd;
        self.signals.vq = vq;
        self.signals.p = p;
        self.signals.q = q;
        self.signals.vt = vd.hypot(vq);

        i_n + self.yg * vt
    }

    pub fn solve_step(&mut self, h: f64, stage: usize) -> DynResult<()> {
        check_step_size(h)?;
        let k = self.rates().to_vector() * h;
        let mut x = self.states.to_vector();
        self.ctx.advance(self.scheme, stage, &mut x, k)?;
        self.states = MachineStates::from_vector(&x);
        Ok(())
    }
}

impl DynamicModel for SymOrder4 {
    fn id(&self) -> &MachineId {
        SymOrder4::id(self)
    }

    fn scheme(&self) -> IntegrationScheme {
        self.scheme
    }

    fn initialise(&mut self, vt0: Complex64, s0: Complex64) -> DynResult<()> {
        SymOrder4::initialise(self, vt0, s0)
    }

    fn calc_currents(&mut self, vt: Complex64) -> Complex64 {
        SymOrder4::calc_currents(self, vt)
    }

    fn solve_step(&mut self, h: f64, stage: usize) -> DynResult<()> {
        SymOrder4::solve_step(self, h, stage)
    }

    fn check_diffs(&self) -> Residuals {
        SymOrder4::check_diffs(self)
    }

    fn norton_admittance(&self) -> Complex64 {
        self.yg
    }

    fn state_values(&self) -> Vec<(&'static str, f64)> {
        self.states.named().to_vec()
    }

    fn signal_values(&self) -> Vec<(&'static str, f64)> {
        self.signals.named().to_vec()
    }
}
