//! Explicit multi-stage integration shared by all dynamic models.
//!
//! A model computes its stage increment `k = h * f(x)` from its own states and
//! signals, then hands `k` to a [`StepContext`] which applies the update rule
//! of the selected [`IntegrationScheme`]. The context owns the stage-0
//! snapshot and the ordered increments of the current macro step, and resets
//! both on every stage 0.

use std::{fmt, str::FromStr};

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

use super::error::{DynError, DynResult};

pub use rustdyn_proc_macro::NamedVector;

/// A struct of named `f64` fields that maps onto a fixed-size vector.
///
/// Usually implemented with `#[derive(NamedVector)]`; field order is the
/// vector layout.
pub trait NamedVector<const N: usize>: Sized {
    /// Display names of the fields, in vector order.
    const NAMES: [&'static str; N];

    fn to_vector(&self) -> SVector<f64, N>;

    fn from_vector(v: &SVector<f64, N>) -> Self;

    /// Name/value pairs in vector order.
    fn named(&self) -> [(&'static str, f64); N] {
        let v = self.to_vector();
        std::array::from_fn(|i| (Self::NAMES[i], v[i]))
    }

    /// Looks a value up by its display name.
    fn get(&self, name: &str) -> Option<f64> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.to_vector()[i])
    }
}

/// Numerical integration scheme, fixed for the lifetime of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntegrationScheme {
    /// Predictor-corrector (Heun), stages 0 and 1.
    #[default]
    #[serde(rename = "mod_euler")]
    ModifiedEuler,
    /// Classical 4th-order Runge-Kutta, stages 0 to 3.
    #[serde(rename = "runge_kutta")]
    RungeKutta4,
}

impl IntegrationScheme {
    /// Number of sub-stages that make up one macro step.
    pub const fn stages(self) -> usize {
        match self {
            IntegrationScheme::ModifiedEuler => 2,
            IntegrationScheme::RungeKutta4 => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            IntegrationScheme::ModifiedEuler => "mod_euler",
            IntegrationScheme::RungeKutta4 => "runge_kutta",
        }
    }

    pub fn check_stage(self, stage: usize) -> DynResult<()> {
        if stage < self.stages() {
            Ok(())
        } else {
            Err(DynError::InvalidStage {
                stage,
                scheme: self.name(),
                stages: self.stages(),
            })
        }
    }
}

impl fmt::Display for IntegrationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntegrationScheme {
    type Err = DynError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mod_euler" => Ok(IntegrationScheme::ModifiedEuler),
            "runge_kutta" => Ok(IntegrationScheme::RungeKutta4),
            other => Err(DynError::UnknownScheme(other.to_string())),
        }
    }
}

/// Rejects step sizes that are not finite and strictly positive.
pub fn check_step_size(h: f64) -> DynResult<()> {
    if h.is_finite() && h > 0.0 {
        Ok(())
    } else {
        Err(DynError::InvalidStepSize { h })
    }
}

/// Scratch data of one macro step: the stage-0 snapshot and the stage
/// increments `k` in the order they were produced.
#[derive(Debug, Clone)]
pub struct StepContext<const N: usize> {
    origin: SVector<f64, N>,
    increments: Vec<SVector<f64, N>>,
}

impl<const N: usize> Default for StepContext<N> {
    fn default() -> Self {
        Self {
            origin: SVector::zeros(),
            increments: Vec::with_capacity(4),
        }
    }
}

impl<const N: usize> StepContext<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// State snapshot taken at stage 0 of the current macro step.
    pub fn origin(&self) -> &SVector<f64, N> {
        &self.origin
    }

    pub fn increments(&self) -> &[SVector<f64, N>] {
        &self.increments
    }

    /// Number of stages already applied in the current macro step.
    pub fn completed(&self) -> usize {
        self.increments.len()
    }

    /// Applies stage `stage` of `scheme` to `x` given the increment `k = h*f`.
    ///
    /// Stage 0 snapshots `x` and discards the previous step's increments.
    /// Any other stage must directly follow its predecessor within the same
    /// macro step. On error `x` is left untouched.
    pub fn advance(
        &mut self,
        scheme: IntegrationScheme,
        stage: usize,
        x: &mut SVector<f64, N>,
        k: SVector<f64, N>,
    ) -> DynResult<()> {
        scheme.check_stage(stage)?;
        if stage == 0 {
            self.increments.clear();
            self.origin = *x;
        } else if self.increments.len() != stage {
            return Err(DynError::StageOutOfOrder {
                stage,
                completed: self.increments.len(),
            });
        }

        let next = match (scheme, stage) {
            (IntegrationScheme::ModifiedEuler, 0) => *x + k,
            // corrector: predicted + 0.5 * (k1 - k0) == origin + 0.5 * (k0 + k1)
            (IntegrationScheme::ModifiedEuler, _) => *x + (k - self.increments[0]) * 0.5,
            (IntegrationScheme::RungeKutta4, 0 | 1) => self.origin + k * 0.5,
            (IntegrationScheme::RungeKutta4, 2) => self.origin + k,
            (IntegrationScheme::RungeKutta4, _) => {
                let ks = &self.increments;
                self.origin + (ks[0] + ks[1] * 2.0 + ks[2] * 2.0 + k) * (1.0 / 6.0)
            }
        };
        self.increments.push(k);
        *x = next;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use nalgebra::Vector2;

    use super::*;

    #[test]
    fn test_rk4_combination() {
        let ks = [
            Vector2::new(0.1, -0.4),
            Vector2::new(0.2, 0.3),
            Vector2::new(-0.05, 0.7),
            Vector2::new(0.6, 0.01),
        ];
        let mut ctx = StepContext::<2>::new();
        let mut x = Vector2::zeros();
        for (stage, k) in ks.iter().enumerate() {
            ctx.advance(IntegrationScheme::RungeKutta4, stage, &mut x, *k)
                .unwrap();
        }
        let expected = (ks[0] + ks[1] * 2.0 + ks[2] * 2.0 + ks[3]) * (1.0 / 6.0);
        assert_eq!(x, expected);
        assert_eq!(ctx.increments(), &ks[..]);
    }

    #[test]
    fn test_rk4_intermediate_stages_restart_from_origin() {
        let origin = Vector2::new(1.0, 2.0);
        let mut ctx = StepContext::<2>::new();
        let mut x = origin;
        ctx.advance(IntegrationScheme::RungeKutta4, 0, &mut x, Vector2::new(0.2, 0.2))
            .unwrap();
        assert_eq!(x, origin + Vector2::new(0.1, 0.1));
        ctx.advance(IntegrationScheme::RungeKutta4, 1, &mut x, Vector2::new(0.4, 0.0))
            .unwrap();
        assert_eq!(x, origin + Vector2::new(0.2, 0.0));
        ctx.advance(IntegrationScheme::RungeKutta4, 2, &mut x, Vector2::new(0.4, 0.0))
            .unwrap();
        assert_eq!(x, origin + Vector2::new(0.4, 0.0));
        assert_eq!(ctx.origin(), &origin);
    }

    #[test]
    fn test_mod_euler_corrector_keeps_prediction() {
        let k = Vector2::new(0.25, -0.125);
        let mut ctx = StepContext::<2>::new();
        let mut x = Vector2::new(1.0, 0.5);
        ctx.advance(IntegrationScheme::ModifiedEuler, 0, &mut x, k)
            .unwrap();
        let predicted = x;
        ctx.advance(IntegrationScheme::ModifiedEuler, 1, &mut x, k)
            .unwrap();
        assert_eq!(x, predicted);
    }

    #[test]
    fn test_mod_euler_is_trapezoidal() {
        let mut ctx = StepContext::<2>::new();
        let mut x = Vector2::new(0.0, 0.0);
        ctx.advance(IntegrationScheme::ModifiedEuler, 0, &mut x, Vector2::new(1.0, 2.0))
            .unwrap();
        ctx.advance(IntegrationScheme::ModifiedEuler, 1, &mut x, Vector2::new(3.0, 4.0))
            .unwrap();
        assert_eq!(x, Vector2::new(2.0, 3.0));
    }

    #[test]
    fn test_invalid_stage_leaves_state() {
        let mut ctx = StepContext::<2>::new();
        let mut x = Vector2::new(1.0, 1.0);
        let err = ctx
            .advance(IntegrationScheme::ModifiedEuler, 2, &mut x, Vector2::new(1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, DynError::InvalidStage { stage: 2, .. }));
        assert_eq!(x, Vector2::new(1.0, 1.0));
    }

    #[test]
    fn test_stage_order_is_enforced() {
        let mut ctx = StepContext::<2>::new();
        let mut x = Vector2::zeros();
        let err = ctx
            .advance(IntegrationScheme::RungeKutta4, 2, &mut x, Vector2::zeros())
            .unwrap_err();
        assert!(matches!(
            err,
            DynError::StageOutOfOrder {
                stage: 2,
                completed: 0
            }
        ));

        for stage in 0..2 {
            ctx.advance(IntegrationScheme::ModifiedEuler, stage, &mut x, Vector2::zeros())
                .unwrap();
        }
        // a finished step cannot be corrected twice
        let err = ctx
            .advance(IntegrationScheme::ModifiedEuler, 1, &mut x, Vector2::zeros())
            .unwrap_err();
        assert!(matches!(err, DynError::StageOutOfOrder { .. }));
    }

    #[test]
    fn test_stage_zero_resets_increments() {
        let mut ctx = StepContext::<2>::new();
        let mut x = Vector2::zeros();
        for stage in 0..4 {
            ctx.advance(IntegrationScheme::RungeKutta4, stage, &mut x, Vector2::new(1.0, 1.0))
                .unwrap();
        }
        assert_eq!(ctx.completed(), 4);
        ctx.advance(IntegrationScheme::RungeKutta4, 0, &mut x, Vector2::new(2.0, 2.0))
            .unwrap();
        assert_eq!(ctx.completed(), 1);
        assert_eq!(ctx.increments()[0], Vector2::new(2.0, 2.0));
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!(
            "runge_kutta".parse::<IntegrationScheme>().unwrap(),
            IntegrationScheme::RungeKutta4
        );
        assert_eq!(IntegrationScheme::ModifiedEuler.stages(), 2);
        assert!("euler".parse::<IntegrationScheme>().is_err());
        let json = serde_json::to_string(&IntegrationScheme::RungeKutta4).unwrap();
        assert_eq!(json, "\"runge_kutta\"");
    }
}
