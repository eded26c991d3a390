//! Stateless compute core for dive planning.
//!
//! Computes a diver's inert-gas loading (Bühlmann ZH-L16C with gradient
//! factors) and breathing-gas consumption over a planned dive profile, in
//! one deterministic batch pass. All inputs are plain data structures and
//! all outputs are immutable values read through indexed accessors; parsing,
//! rendering and reporting live outside this crate.
//!
//! The pipeline, leaves first:
//!
//! 1. [`quantity`] — unit-checked physical quantities.
//! 2. [`timeline`] — ordered time points and segmentation.
//! 3. [`depth_profile`] — time→depth mapping with interpolation.
//! 4. [`gas_profile`] — forward simulation of per-cylinder depletion.
//! 5. [`buhlmann`] — per-tissue loading and gradient-factor ceilings.
//!
//! A [`DivePlan`] ties the pieces together: it derives the timeline and
//! profiles that both simulations consume.

pub mod buhlmann;
pub mod depth_profile;
pub mod dive;
pub mod dive_plan;
pub mod error;
pub mod gas_profile;
pub mod physics;
pub mod quantity;
pub mod timeline;

pub use buhlmann::{
    Buhlmann, Compartment, CompartmentProfile, CompartmentProfiles, CompartmentState,
    GfCoefficients, GradientFactors, COMPARTMENT_COUNT,
};
pub use depth_profile::DepthProfile;
pub use dive::Dive;
pub use dive_plan::{DivePlan, DivePlanRow};
pub use error::ComputeError;
pub use gas_profile::{
    Cylinder, GasSupply, GasSupplyProfile, GasSupplySet, GasUsage, GasUsageProfile,
};
pub use physics::{
    depth_from_pressure, pressure_from_depth, Gas, ALVEOLAR_WATER_VAPOR_PRESSURE,
    ATMOSPHERIC_PRESSURE, GRAVITY, WATER_DENSITY,
};
pub use quantity::{Kind, Quantity, Unit};
pub use timeline::{TimePoint, TimeSegment, Timeline};
