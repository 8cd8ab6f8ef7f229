//! Reader for `.mach` machine parameter files.
//!
//! The format is one `key = value` pair per line. Lines starting with `#` and
//! blank lines are skipped. `ID` and `GEN_NO` carry identity metadata, every
//! other key must hold a number and lands in the [`ParamStore`].
//!
//! ```text
//! # Generator 1
//! ID = GEN1
//! GEN_NO = 1
//! Ra = 0.0
//! Xd = 2.1
//! ```

use std::{fs, path::Path};

use crate::basic::{
    error::{DynError, DynResult},
    integrator::IntegrationScheme,
    machine::{ExtGrid, SymOrder4},
    params::{MachineId, ParamStore},
};

/// Contents of one `.mach` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineFile {
    pub id: MachineId,
    pub params: ParamStore,
}

impl MachineFile {
    /// Builds a 4th-order machine, failing if a required parameter is absent.
    pub fn sym_order4(&self, scheme: IntegrationScheme) -> DynResult<SymOrder4> {
        SymOrder4::from_store(self.id.clone(), &self.params, scheme)
    }

    /// Builds an external grid from the `Xdp` and `H` entries.
    pub fn ext_grid(&self, scheme: IntegrationScheme) -> DynResult<ExtGrid> {
        ExtGrid::from_store(self.id.clone(), &self.params, scheme)
    }
}

/// Parses the text of a `.mach` file.
pub fn parse_mach(content: &str) -> DynResult<MachineFile> {
    let mut file = MachineFile::default();
    let mut params = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| DynError::Parse {
            line: line_no,
            message: format!("expected `key = value`, found `{line}`"),
        })?;
        let key = key.trim();
        let value = value.trim();
        match key {
            "ID" => file.id.id = value.to_string(),
            "GEN_NO" => {
                file.id.gen_no = value.parse().map_err(|_| DynError::Parse {
                    line: line_no,
                    message: format!("GEN_NO must be an integer, found `{value}`"),
                })?
            }
            _ => {
                let number: f64 = value.parse().map_err(|_| DynError::Parse {
                    line: line_no,
                    message: format!("{key} must be numeric, found `{value}`"),
                })?;
                params.push((key.to_string(), number));
            }
        }
    }
    file.params = params.into_iter().collect();
    Ok(file)
}

/// Reads and parses a `.mach` file from disk.
pub fn load_mach(path: impl AsRef<Path>) -> DynResult<MachineFile> {
    let content = fs::read_to_string(path)?;
    parse_mach(&content)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::basic::params::MachineParams;

    const GEN1: &str = "\
# 4th order machine
ID = GEN1
GEN_NO = 2

Ra = 0.0
Xd = 2.1
Xq = 2.0
Xdp = 0.3
Xqp = 0.5
Td0p = 7.0
Tq0p = 0.75
H = 3.0
";

    #[test]
    fn test_parse_mach() {
        let file = parse_mach(GEN1).unwrap();
        assert_eq!(file.id, MachineId::new("GEN1", 2));
        assert_eq!(file.params.len(), 8);
        let params = MachineParams::try_from(&file.params).unwrap();
        assert_eq!(params.Xqp, 0.5);
        let machine = file.sym_order4(IntegrationScheme::RungeKutta4).unwrap();
        assert_eq!(machine.id().gen_no, 2);
    }

    #[test]
    fn test_non_numeric_value() {
        let err = parse_mach("ID = G\nXd = two\n").unwrap_err();
        match err {
            DynError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("Xd"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_parameter_fails_at_build() {
        let file = parse_mach("ID = G\nXd = 2.1\n").unwrap();
        let err = file
            .sym_order4(IntegrationScheme::ModifiedEuler)
            .unwrap_err();
        assert!(matches!(err, DynError::MissingParameter { .. }));
    }

    #[test]
    fn test_ext_grid_from_file() {
        let file = parse_mach("ID = GRID\nGEN_NO = 0\nXdp = 0.1\nH = 6.0\n").unwrap();
        let grid = file.ext_grid(IntegrationScheme::ModifiedEuler).unwrap();
        assert_eq!(grid.id().id, "GRID");
    }

    #[test]
    fn test_missing_file() {
        let err = load_mach("does/not/exist.mach").unwrap_err();
        assert!(matches!(err, DynError::Io(_)));
    }
}
