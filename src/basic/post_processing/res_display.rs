use std::fmt;
use tabled::Tabled;
/// A wrapper around a float that limits the number of decimal places when printed.
///
/// Absent values, e.g. a signal a model does not have, print as `-`.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub(crate) struct FloatWrapper {
    pub(crate) value: Option<f64>,
    pub(crate) precision: usize, // Number of decimal places to display
}

impl FloatWrapper {
    /// Creates a new `FloatWrapper` with the given value and precision.
    pub fn new(value: Option<f64>, precision: usize) -> Self {
        FloatWrapper { value, precision }
    }
}
impl Default for FloatWrapper {
    fn default() -> Self {
        Self {
            value: None,
            precision: 3,
        }
    }
}

impl fmt::Display for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{:.1$}", value, self.precision),
            None => f.write_str("-"),
        }
    }
}

impl fmt::Debug for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Table row for displaying machine results.
#[derive(Debug, Tabled)]
#[allow(non_snake_case)]
pub(crate) struct MachineResTable {
    pub(crate) Machine: String,
    pub(crate) Gen: i64,
    pub(crate) P_pu: FloatWrapper,
    pub(crate) Q_pu: FloatWrapper,
    pub(crate) Vt_pu: FloatWrapper,
    pub(crate) Omega_pu: FloatWrapper,
    pub(crate) Delta_deg: FloatWrapper,
}
