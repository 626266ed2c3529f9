use serde::{Deserialize, Serialize};

/// Score assigned to an evaluated chromosome.
///
/// Numeric evaluation may fail (division by zero, overflow, invalid floating point
/// operations). Instead of leaking `NaN` into comparisons, such results are recorded as
/// [`Fitness::Undefined`], which never wins a comparison against a defined value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Fitness {
    Value(f64),
    Undefined,
}

impl Fitness {
    /// Wraps a raw numeric result, mapping any non-finite value to `Undefined`.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(*value),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<f64> for Fitness {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for Fitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

/// Arithmetic mean of the given values. Undefined if any value is undefined or the
/// slice is empty.
pub fn mean(values: &[Fitness]) -> Fitness {
    if values.is_empty() {
        return Fitness::Undefined;
    }

    let mut sum = 0.0;
    for value in values {
        match value {
            Fitness::Value(v) => sum += v,
            Fitness::Undefined => return Fitness::Undefined,
        }
    }

    Fitness::new(sum / values.len() as f64)
}

/// Population variance (mean squared deviation, no Bessel correction).
pub fn variance(values: &[Fitness]) -> Fitness {
    let Fitness::Value(mean) = mean(values) else {
        return Fitness::Undefined;
    };

    let squared_deviations: Vec<Fitness> = values
        .iter()
        .map(|value| match value {
            Fitness::Value(v) => Fitness::new((v - mean).powi(2)),
            Fitness::Undefined => Fitness::Undefined,
        })
        .collect();

    self::mean(&squared_deviations)
}
