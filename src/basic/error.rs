//! Error type shared by the machine models, the integrator and the readers.

use thiserror::Error;

pub type DynResult<T> = Result<T, DynError>;

#[derive(Error, Debug)]
pub enum DynError {
    #[error("Missing machine parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid machine parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Degenerate machine impedance: Xdp*Xqp + Ra^2 = {denominator}")]
    DegenerateImpedance { denominator: f64 },

    #[error("Terminal voltage is zero, cannot derive armature current")]
    ZeroVoltage,

    #[error("Invalid step size h = {h}")]
    InvalidStepSize { h: f64 },

    #[error("Invalid stage {stage} for {scheme} (valid stages: 0..{stages})")]
    InvalidStage {
        stage: usize,
        scheme: &'static str,
        stages: usize,
    },

    #[error("Stage {stage} called after {completed} completed stage(s) of the current step")]
    StageOutOfOrder { stage: usize, completed: usize },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unknown integration scheme: {0}")]
    UnknownScheme(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_display() {
        let err = DynError::InvalidStage {
            stage: 4,
            scheme: "runge_kutta",
            stages: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("runge_kutta"));
        assert!(msg.contains("0..4"));
    }

    #[test]
    fn io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gen1.mach");
        let err: DynError = io.into();
        assert!(matches!(err, DynError::Io(_)));
    }
}
