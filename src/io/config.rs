//! JSON simulation configuration.
//!
//! ```json
//! {
//!   "scheme": "runge_kutta",
//!   "dt": 0.01,
//!   "t_end": 5.0,
//!   "machines": [
//!     { "model": "sym_order4", "id": "GEN1", "gen_no": 1,
//!       "params": { "Ra": 0.0, "Xd": 2.1, "Xq": 2.0, "Xdp": 0.3, "Xqp": 0.5,
//!                   "Td0p": 7.0, "Tq0p": 0.75, "H": 3.0 } },
//!     { "model": "ext_grid", "id": "GRID", "gen_no": 0, "Xdp": 0.1, "H": 6.0 }
//!   ]
//! }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::basic::{
    error::{DynError, DynResult},
    integrator::{IntegrationScheme, check_step_size},
    machine::{DEFAULT_FREQUENCY_HZ, DynMachine, ExtGrid, InitMethod, SymOrder4},
    params::{MachineId, ParamStore},
};

fn default_dt() -> f64 {
    0.01
}

fn default_t_end() -> f64 {
    1.0
}

fn default_frequency() -> f64 {
    DEFAULT_FREQUENCY_HZ
}

/// One machine of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
#[allow(non_snake_case)]
pub enum MachineEntry {
    SymOrder4 {
        id: String,
        #[serde(default)]
        gen_no: i64,
        params: ParamStore,
    },
    ExtGrid {
        id: String,
        #[serde(default)]
        gen_no: i64,
        Xdp: f64,
        H: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub scheme: IntegrationScheme,
    /// Macro step size in seconds.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Simulated time span in seconds.
    #[serde(default = "default_t_end")]
    pub t_end: f64,
    /// Nominal network frequency in Hz.
    #[serde(default = "default_frequency")]
    pub f_n: f64,
    #[serde(default)]
    pub init_method: InitMethod,
    #[serde(default)]
    pub machines: Vec<MachineEntry>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            scheme: IntegrationScheme::default(),
            dt: default_dt(),
            t_end: default_t_end(),
            f_n: default_frequency(),
            init_method: InitMethod::default(),
            machines: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(content: &str) -> DynResult<Self> {
        let cfg: SimConfig = serde_json::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> DynResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> DynResult<()> {
        check_step_size(self.dt)?;
        if !(self.t_end.is_finite() && self.t_end >= 0.0) {
            return Err(DynError::InvalidParameter {
                name: "t_end",
                value: self.t_end,
                reason: "must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Number of macro steps needed to cover `t_end`.
    pub fn steps(&self) -> usize {
        (self.t_end / self.dt).round() as usize
    }

    /// Instantiates every configured machine with the shared scheme and
    /// nominal frequency.
    pub fn build_machines(&self) -> DynResult<Vec<DynMachine>> {
        self.machines
            .iter()
            .map(|entry| -> DynResult<DynMachine> {
                Ok(match entry {
                    MachineEntry::SymOrder4 { id, gen_no, params } => {
                        SymOrder4::from_store(MachineId::new(id.clone(), *gen_no), params, self.scheme)?
                            .with_nominal_frequency(self.f_n)?
                            .with_init_method(self.init_method)
                            .into()
                    }
                    MachineEntry::ExtGrid { id, gen_no, Xdp, H } => {
                        ExtGrid::new(MachineId::new(id.clone(), *gen_no), *Xdp, *H, self.scheme)?
                            .with_nominal_frequency(self.f_n)?
                            .into()
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::basic::machine::DynamicModel;

    const CONFIG: &str = r#"{
        "scheme": "runge_kutta",
        "dt": 0.005,
        "t_end": 2.0,
        "machines": [
            { "model": "sym_order4", "id": "GEN1", "gen_no": 1,
              "params": { "Ra": 0.0, "Xd": 2.1, "Xq": 2.0, "Xdp": 0.3, "Xqp": 0.5,
                          "Td0p": 7.0, "Tq0p": 0.75, "H": 3.0 } },
            { "model": "ext_grid", "id": "GRID", "Xdp": 0.1, "H": 6.0 }
        ]
    }"#;

    #[test]
    fn test_load_config() {
        let cfg = SimConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(cfg.scheme, IntegrationScheme::RungeKutta4);
        assert_eq!(cfg.f_n, 50.0);
        assert_eq!(cfg.steps(), 400);
        let machines = cfg.build_machines().unwrap();
        assert_eq!(machines.len(), 2);
        assert!(matches!(machines[1], DynMachine::ExtGrid(_)));
        assert_eq!(machines[0].scheme(), IntegrationScheme::RungeKutta4);
    }

    #[test]
    fn test_defaults() {
        let cfg = SimConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, SimConfig::default());
        assert_eq!(cfg.scheme, IntegrationScheme::ModifiedEuler);
    }

    #[test]
    fn test_invalid_step() {
        let err = SimConfig::from_json_str(r#"{ "dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, DynError::InvalidStepSize { .. }));
    }

    #[test]
    fn test_missing_machine_parameter() {
        let cfg = SimConfig::from_json_str(
            r#"{ "machines": [ { "model": "sym_order4", "id": "G", "params": { "Xd": 2.1 } } ] }"#,
        )
        .unwrap();
        let err = cfg.build_machines().unwrap_err();
        assert!(matches!(err, DynError::MissingParameter { .. }));
    }
}
