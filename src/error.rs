use thiserror::Error;

use crate::quantity::{Kind, Unit};

/// Error type for the dive-planning compute pipeline.
///
/// Computation is deterministic and pure, so none of these are retryable;
/// every failure propagates synchronously to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("unit mismatch: {left} vs {right}")]
    UnitMismatch { left: Unit, right: Unit },

    #[error("expected a {expected} quantity, got unit {found}")]
    KindMismatch { expected: Kind, found: Unit },

    #[error("unknown gas supply: {0}")]
    UnknownGasSupply(String),

    #[error("unknown compartment: {0}")]
    UnknownCompartment(String),

    #[error("no segment contains time {0}")]
    TimeOutOfRange(String),

    #[error("no gas supply snapshot at {0}; the profile is sampled at segment boundaries only")]
    NoSnapshotAt(String),

    #[error("integration step of {seconds} s exceeds the 10 s accuracy bound")]
    StepTooLong { seconds: f64 },

    #[error("no compartment exceeds the low gradient factor; the interpolation pivot is undefined")]
    GfPivotUndefined,

    #[error("timeline must contain at least one time point")]
    EmptyTimeline,

    #[error("timeline times must be strictly increasing")]
    UnorderedTimeline,

    #[error("profile has {found} values for {expected} slots")]
    MisalignedProfile { expected: usize, found: usize },

    #[error("invalid gas mix: o2={o2}, he={he}")]
    InvalidGasMix { o2: f64, he: f64 },

    #[error("gradient factors must lie in (0, 1]: low={low}, high={high}")]
    InvalidGradientFactors { low: f64, high: f64 },

    #[error("resample period must be a positive time")]
    InvalidSamplePeriod,
}
