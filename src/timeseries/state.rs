//! Recorded machine trajectories.

use std::{collections::BTreeMap, fs::File, io::Write, path::Path};

#[cfg(feature = "ecs")]
use bevy_ecs::prelude::*;
use derive_more::derive::{Deref, DerefMut};
use serde::{Deserialize, Serialize};

use crate::basic::{error::DynResult, machine::DynamicModel};

/// Time history of the states followed by the signals of one machine.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub machine: String,
    /// Column names, fixed by the first record.
    pub columns: Vec<String>,
    pub t: Vec<f64>, // in seconds
    pub data: Vec<Vec<f64>>,
}

impl Trajectory {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            ..Default::default()
        }
    }

    pub fn record<M: DynamicModel + ?Sized>(&mut self, t: f64, model: &M) {
        let values: Vec<(&'static str, f64)> = model
            .state_values()
            .into_iter()
            .chain(model.signal_values())
            .collect();
        if self.columns.is_empty() {
            self.columns = values.iter().map(|(n, _)| n.to_string()).collect();
        }
        self.t.push(t);
        self.data.push(values.into_iter().map(|(_, v)| v).collect());
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// All recorded samples of column `name`.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.data.iter().map(|row| row[idx]).collect())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> DynResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["t".to_string()];
        header.extend(self.columns.iter().cloned());
        wtr.write_record(&header)?;
        for (t, row) in self.t.iter().zip(&self.data) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(t.to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> DynResult<()> {
        self.write_csv(File::create(path)?)
    }
}

/// Trajectories keyed by machine id.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Deref, DerefMut)]
#[cfg_attr(feature = "ecs", derive(Resource))]
pub struct Trajectories(pub BTreeMap<String, Trajectory>);

impl Trajectories {
    pub fn record<M: DynamicModel + ?Sized>(&mut self, t: f64, model: &M) {
        let id = &model.id().id;
        self.0
            .entry(id.clone())
            .or_insert_with(|| Trajectory::new(id.clone()))
            .record(t, model);
    }

    /// Writes one `<machine>.csv` file per trajectory into `dir`.
    pub fn save_csv_dir(&self, dir: impl AsRef<Path>) -> DynResult<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for (id, traj) in &self.0 {
            traj.save_csv(dir.join(format!("{id}.csv")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use num_complex::Complex64;

    use super::*;
    use crate::basic::{
        integrator::IntegrationScheme,
        machine::ExtGrid,
        params::MachineId,
    };

    fn grid() -> ExtGrid {
        let mut g = ExtGrid::new(MachineId::new("G1", 1), 0.2, 5.0, IntegrationScheme::ModifiedEuler)
            .unwrap();
        g.initialise(Complex64::new(1.0, 0.0), Complex64::new(0.4, 0.1))
            .unwrap();
        g
    }

    #[test]
    fn test_record_and_column() {
        let g = grid();
        let mut traj = Trajectories::default();
        traj.record(0.0, &g);
        traj.record(0.01, &g);
        let t = &traj["G1"];
        assert_eq!(t.len(), 2);
        assert_eq!(t.columns, vec!["omega", "delta", "Vt", "P", "Pm"]);
        assert_eq!(t.column("omega").unwrap(), vec![1.0, 1.0]);
        assert!(t.column("Q").is_none());
    }

    #[test]
    fn test_write_csv() {
        let g = grid();
        let mut traj = Trajectory::new("G1");
        traj.record(0.0, &g);
        let mut buf = Vec::new();
        traj.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "t,omega,delta,Vt,P,Pm");
        assert!(lines.next().unwrap().starts_with("0,1,"));
        assert!(lines.next().is_none());
    }
}
