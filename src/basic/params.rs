//! Machine parameter storage.
//!
//! A [`ParamStore`] is the raw name/value mapping produced by a reader such as
//! the `.mach` parser. [`MachineParams`] is the validated, typed view the
//! 4th-order model works with. Conversion fails fast on missing or unusable
//! values so no model is ever built on absent parameters.

use std::collections::BTreeMap;

use derive_more::derive::{Deref, From, Into};
use serde::{Deserialize, Serialize};

use super::error::{DynError, DynResult};

/// Named electrical constants of one machine, immutable once loaded.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, From, Into, Deref)]
#[serde(transparent)]
pub struct ParamStore(BTreeMap<String, f64>);

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `name`, or a configuration error.
    pub fn require(&self, name: &str) -> DynResult<f64> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| DynError::MissingParameter {
                name: name.to_string(),
            })
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ParamStore {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Identity metadata attached to a machine. Not used by the physics.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineId {
    pub id: String,
    pub gen_no: i64,
}

impl MachineId {
    pub fn new(id: impl Into<String>, gen_no: i64) -> Self {
        Self {
            id: id.into(),
            gen_no,
        }
    }
}

/// Parameters of the 4th-order synchronous machine, all in per-unit on the
/// machine base except time constants (seconds) and inertia (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct MachineParams {
    pub Ra: f64,
    pub Xd: f64,
    pub Xq: f64,
    pub Xdp: f64,
    pub Xqp: f64,
    pub Td0p: f64,
    pub Tq0p: f64,
    pub H: f64,
}

impl MachineParams {
    pub const REQUIRED: [&'static str; 8] = ["Ra", "Xd", "Xq", "Xdp", "Xqp", "Td0p", "Tq0p", "H"];

    /// Armature resistance as seen by the model. A non-positive `Ra` is
    /// treated as negligible and clamped to zero.
    #[inline]
    pub fn ra_eff(&self) -> f64 {
        if self.Ra > 0.0 { self.Ra } else { 0.0 }
    }

    /// `Xdp*Xqp + Ra^2`, the determinant of the dq current equations.
    #[inline]
    pub fn dq_determinant(&self) -> f64 {
        let ra = self.ra_eff();
        self.Xdp * self.Xqp + ra * ra
    }

    /// Checks the values the model divides by.
    pub fn validate(&self) -> DynResult<()> {
        let named = [
            ("Ra", self.Ra),
            ("Xd", self.Xd),
            ("Xq", self.Xq),
            ("Xdp", self.Xdp),
            ("Xqp", self.Xqp),
            ("Td0p", self.Td0p),
            ("Tq0p", self.Tq0p),
            ("H", self.H),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(DynError::InvalidParameter {
                    name,
                    value,
                    reason: "not finite",
                });
            }
        }
        for (name, value) in [("Td0p", self.Td0p), ("Tq0p", self.Tq0p), ("H", self.H)] {
            if value <= 0.0 {
                return Err(DynError::InvalidParameter {
                    name,
                    value,
                    reason: "must be strictly positive",
                });
            }
        }
        let denominator = self.dq_determinant();
        // Covers Xdp = 0 or Xqp = 0 on the lossless branch too.
        if denominator == 0.0 {
            return Err(DynError::DegenerateImpedance { denominator });
        }
        Ok(())
    }
}

impl TryFrom<&ParamStore> for MachineParams {
    type Error = DynError;

    fn try_from(store: &ParamStore) -> Result<Self, Self::Error> {
        let params = MachineParams {
            Ra: store.require("Ra")?,
            Xd: store.require("Xd")?,
            Xq: store.require("Xq")?,
            Xdp: store.require("Xdp")?,
            Xqp: store.require("Xqp")?,
            Td0p: store.require("Td0p")?,
            Tq0p: store.require("Tq0p")?,
            H: store.require("H")?,
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn store() -> ParamStore {
        [
            ("Ra", 0.0),
            ("Xd", 2.1),
            ("Xq", 2.0),
            ("Xdp", 0.3),
            ("Xqp", 0.5),
            ("Td0p", 7.0),
            ("Tq0p", 0.75),
            ("H", 3.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_params_from_store() {
        let params = MachineParams::try_from(&store()).unwrap();
        assert_eq!(params.Xd, 2.1);
        assert_eq!(params.Tq0p, 0.75);
        assert_eq!(params.dq_determinant(), 0.3 * 0.5);
    }

    #[test]
    fn test_missing_parameter() {
        let mut map: BTreeMap<String, f64> = store().into();
        map.remove("Td0p");
        let err = MachineParams::try_from(&ParamStore::from(map)).unwrap_err();
        match err {
            DynError::MissingParameter { name } => assert_eq!(name, "Td0p"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_negative_resistance_is_ignored() {
        let mut map: BTreeMap<String, f64> = store().into();
        map.insert("Ra".into(), -0.01);
        let params = MachineParams::try_from(&ParamStore::from(map)).unwrap();
        assert_eq!(params.ra_eff(), 0.0);
    }

    #[test]
    fn test_degenerate_impedance() {
        let mut map: BTreeMap<String, f64> = store().into();
        map.insert("Xqp".into(), 0.0);
        let err = MachineParams::try_from(&ParamStore::from(map)).unwrap_err();
        assert!(matches!(err, DynError::DegenerateImpedance { .. }));
    }

    #[test]
    fn test_non_positive_inertia() {
        let mut map: BTreeMap<String, f64> = store().into();
        map.insert("H".into(), 0.0);
        let err = MachineParams::try_from(&ParamStore::from(map)).unwrap_err();
        assert!(matches!(err, DynError::InvalidParameter { name: "H", .. }));
    }
}
