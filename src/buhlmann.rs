//! Bühlmann ZH-L16C tissue model with gradient-factor conservatism.
//!
//! Sixteen independent compartments, each with a nitrogen half-time and the
//! Bühlmann `a`/`b` coefficients, are integrated over a depth profile. The
//! unmodified tolerated ceiling is `M = a + P_amb / b`; gradient factors
//! scale the allowed supersaturation gradient between a pivot pressure
//! (gf_low) and the surface (gf_high), realized as adjusted coefficients
//! `a_gf`/`b_gf` so the adjusted ceiling keeps the same linear form.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::depth_profile::DepthProfile;
use crate::error::ComputeError;
use crate::gas_profile::{GasSupplySet, GasUsageProfile};
use crate::physics::{
    pressure_from_depth, Gas, ALVEOLAR_WATER_VAPOR_PRESSURE, ATMOSPHERIC_PRESSURE,
};
use crate::quantity::{Kind, Quantity};

/// Number of tissue compartments in the ZH-L16C table.
pub const COMPARTMENT_COUNT: usize = 16;

/// Longest integration step the exponential update is trusted for.
const MAX_STEP: Quantity = Quantity::named(Kind::Time, 10.0);

/// ZH-L16C nitrogen rows: (half-time min, a bar, b).
const ZH_L16C_TABLE: [(f64, f64, f64); COMPARTMENT_COUNT] = [
    (5.0, 1.1696, 0.5578),
    (8.0, 1.0000, 0.6514),
    (12.5, 0.8618, 0.7222),
    (18.5, 0.7562, 0.7825),
    (27.0, 0.6200, 0.8126),
    (38.3, 0.5043, 0.8434),
    (54.3, 0.4410, 0.8693),
    (77.0, 0.4000, 0.8910),
    (109.0, 0.3750, 0.9092),
    (146.0, 0.3500, 0.9222),
    (187.0, 0.3295, 0.9319),
    (239.0, 0.3065, 0.9403),
    (305.0, 0.2835, 0.9477),
    (390.0, 0.2610, 0.9544),
    (498.0, 0.2480, 0.9602),
    (635.0, 0.2327, 0.9653),
];

/// Conservatism pair: fractions of the allowed M-value gradient at the pivot
/// pressure (`low`) and at the surface (`high`).
#[derive(Clone, Copy, Debug)]
pub struct GradientFactors {
    low: f64,
    high: f64,
}

impl GradientFactors {
    pub fn new(low: f64, high: f64) -> Result<Self, ComputeError> {
        if !(0.0 < low && low <= 1.0 && 0.0 < high && high <= 1.0) {
            return Err(ComputeError::InvalidGradientFactors { low, high });
        }
        Ok(GradientFactors { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

/// Gradient-factor-adjusted Bühlmann coefficients for one compartment.
///
/// Derived so that `a_gf + P_amb / b_gf` equals the gf_low-scaled ceiling at
/// the pivot pressure and the gf_high-scaled ceiling at atmospheric
/// pressure, interpolating linearly in ambient pressure between the two.
#[derive(Clone, Copy, Debug)]
pub struct GfCoefficients {
    a_gf: Quantity,
    b_gf: f64,
}

impl GfCoefficients {
    pub fn a_gf(&self) -> Quantity {
        self.a_gf
    }

    pub fn b_gf(&self) -> f64 {
        self.b_gf
    }
}

/// Immutable tissue constants of one compartment.
#[derive(Clone, Debug)]
pub struct Compartment {
    name: String,
    half_time: Quantity,
    a: Quantity,
    b: f64,
}

impl Compartment {
    pub fn new(
        name: impl Into<String>,
        half_time: Quantity,
        a: Quantity,
        b: f64,
    ) -> Result<Self, ComputeError> {
        let half_time = half_time.expect_kind(Kind::Time)?;
        let a = a.expect_kind(Kind::Pressure)?;
        Ok(Compartment {
            name: name.into(),
            half_time,
            a,
            b,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn half_time(&self) -> Quantity {
        self.half_time
    }

    pub fn a(&self) -> Quantity {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    /// Derive the adjusted coefficients for this compartment from the
    /// conservatism pair and the pivot pressure.
    fn gf_coefficients(
        &self,
        gf: GradientFactors,
        pressure_gf_low: Quantity,
    ) -> Result<GfCoefficients, ComputeError> {
        let span = pressure_gf_low.try_sub(ATMOSPHERIC_PRESSURE)?;
        let lead = (pressure_gf_low * gf.high())
            .try_sub(ATMOSPHERIC_PRESSURE * gf.low())?
            .try_ratio(span)?;
        let cross = (pressure_gf_low * ATMOSPHERIC_PRESSURE) / span;
        let a_gf = (self.a * lead)
            .try_add(cross * ((gf.high() - gf.low()) * (1.0 - self.b) / self.b))?;

        let slope = self.a.try_ratio(span)? * (gf.low() - gf.high());
        let offset = (pressure_gf_low * gf.low())
            .try_sub(ATMOSPHERIC_PRESSURE * gf.high())?
            .try_ratio(span)?
            * ((1.0 - self.b) / self.b);
        let b_gf = 1.0 / (1.0 + slope + offset);

        Ok(GfCoefficients { a_gf, b_gf })
    }
}

/// One compartment's loading at one instant: the ambient pressure and the
/// dissolved nitrogen partial pressure. Everything else is derived.
#[derive(Clone, Debug)]
pub struct CompartmentState {
    compartment: Arc<Compartment>,
    ambient_pressure: Quantity,
    n2_pressure: Quantity,
}

impl CompartmentState {
    pub fn new(
        compartment: Arc<Compartment>,
        ambient_pressure: Quantity,
        n2_pressure: Quantity,
    ) -> Result<Self, ComputeError> {
        let ambient_pressure = ambient_pressure.expect_kind(Kind::Pressure)?;
        let n2_pressure = n2_pressure.expect_kind(Kind::Pressure)?;
        Ok(CompartmentState {
            compartment,
            ambient_pressure,
            n2_pressure,
        })
    }

    pub fn compartment(&self) -> &Compartment {
        &self.compartment
    }

    pub fn ambient_pressure(&self) -> Quantity {
        self.ambient_pressure
    }

    pub fn n2_pressure(&self) -> Quantity {
        self.n2_pressure
    }

    /// Unmodified tolerated inert-gas pressure: `a + P_amb / b`.
    pub fn m_value(&self) -> Result<Quantity, ComputeError> {
        self.compartment
            .a()
            .try_add(self.ambient_pressure / self.compartment.b())
    }

    /// Supersaturation: dissolved nitrogen above ambient.
    pub fn gradient(&self) -> Result<Quantity, ComputeError> {
        self.n2_pressure.try_sub(self.ambient_pressure)
    }

    /// Allowed supersaturation at full tolerance.
    pub fn m_gradient(&self) -> Result<Quantity, ComputeError> {
        self.m_value()?.try_sub(self.ambient_pressure)
    }

    /// Fraction of the unmodified allowed supersaturation currently used.
    pub fn gradient_factor(&self) -> Result<f64, ComputeError> {
        self.gradient()?.try_ratio(self.m_gradient()?)
    }

    /// Gradient-factor-adjusted ceiling at this state's ambient pressure.
    pub fn gf_ceiling(&self, coefficients: &GfCoefficients) -> Result<Quantity, ComputeError> {
        coefficients
            .a_gf()
            .try_add(self.ambient_pressure / coefficients.b_gf())
    }

    /// The state after breathing `gas` for `duration` while the ambient
    /// pressure moves to `ambient_pressure`.
    ///
    /// Uses the half-time exponential uptake law with the inspired nitrogen
    /// pressure taken at the mean of the old and new ambient pressure, less
    /// the alveolar water-vapor correction. Steps longer than 10 s are
    /// outside the update's validity and fail; callers subdivide first.
    pub fn next(
        &self,
        duration: Quantity,
        ambient_pressure: Quantity,
        gas: &Gas,
    ) -> Result<CompartmentState, ComputeError> {
        let duration = duration.expect_kind(Kind::Time)?;
        let ambient_pressure = ambient_pressure.expect_kind(Kind::Pressure)?;
        if duration.try_cmp(MAX_STEP)? == Ordering::Greater {
            return Err(ComputeError::StepTooLong {
                seconds: duration.value(),
            });
        }
        let mean_ambient = self.ambient_pressure.try_add(ambient_pressure)? / 2.0;
        let inspired = gas.ppn2(mean_ambient.try_sub(ALVEOLAR_WATER_VAPOR_PRESSURE)?);
        let fraction = 1.0 - (-duration.try_ratio(self.compartment.half_time())?).exp2();
        let n2_pressure = self
            .n2_pressure
            .try_add(inspired.try_sub(self.n2_pressure)? * fraction)?;
        Ok(CompartmentState {
            compartment: Arc::clone(&self.compartment),
            ambient_pressure,
            n2_pressure,
        })
    }
}

/// One compartment's states, one per timeline point.
#[derive(Clone, Debug)]
pub struct CompartmentProfile {
    states: Vec<CompartmentState>,
}

impl CompartmentProfile {
    /// Fold the compartment across every segment of the depth profile,
    /// breathing the gas the usage profile assigns to each segment's start,
    /// resolved through the supply set.
    pub fn create(
        compartment: Arc<Compartment>,
        depth_profile: &DepthProfile,
        usage_profile: &GasUsageProfile,
        supply_set: &GasSupplySet,
        start_ambient_pressure: Quantity,
        start_n2_pressure: Quantity,
    ) -> Result<Self, ComputeError> {
        let mut states = Vec::with_capacity(depth_profile.timeline().len());
        let mut current = CompartmentState::new(
            Arc::clone(&compartment),
            start_ambient_pressure,
            start_n2_pressure,
        )?;
        for segment in depth_profile.timeline().segments() {
            let ambient = pressure_from_depth(depth_profile.at(segment.stop())?)?;
            let usage = usage_profile.at(segment.start())?;
            let gas = *supply_set.get(usage.gas_supply_name())?.gas();
            let next = current.next(segment.duration(), ambient, &gas)?;
            states.push(current);
            current = next;
        }
        states.push(current);
        Ok(CompartmentProfile { states })
    }

    pub fn compartment(&self) -> &Compartment {
        self.states[0].compartment()
    }

    pub fn states(&self) -> &[CompartmentState] {
        &self.states
    }
}

/// The pivot pressure and per-compartment adjusted coefficients derived for
/// one simulation run. Shared by every state query, so it is computed once.
#[derive(Clone, Debug)]
struct GfInterpolation {
    pressure_gf_low: Quantity,
    coefficients: Vec<GfCoefficients>,
}

/// All sixteen compartment profiles over identical inputs.
#[derive(Clone, Debug)]
pub struct CompartmentProfiles {
    profiles: Vec<CompartmentProfile>,
    gradient_factors: GradientFactors,
    interpolation: Option<GfInterpolation>,
}

impl CompartmentProfiles {
    pub fn create(
        compartments: &[Arc<Compartment>],
        gradient_factors: GradientFactors,
        depth_profile: &DepthProfile,
        usage_profile: &GasUsageProfile,
        supply_set: &GasSupplySet,
        start_ambient_pressure: Quantity,
        start_n2_pressure: Quantity,
    ) -> Result<Self, ComputeError> {
        // the compartments are independent; each folds over the same inputs
        let profiles = compartments
            .iter()
            .map(|compartment| {
                CompartmentProfile::create(
                    Arc::clone(compartment),
                    depth_profile,
                    usage_profile,
                    supply_set,
                    start_ambient_pressure,
                    start_n2_pressure,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pivot = Self::pressure_gf_low_of(&profiles, gradient_factors)?;
        let interpolation = match pivot {
            Some(pressure_gf_low) => Some(GfInterpolation {
                pressure_gf_low,
                coefficients: profiles
                    .iter()
                    .map(|profile| {
                        profile
                            .compartment()
                            .gf_coefficients(gradient_factors, pressure_gf_low)
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            }),
            None => None,
        };

        tracing::debug!(
            compartments = profiles.len(),
            points = depth_profile.timeline().len(),
            pivot_defined = interpolation.is_some(),
            "integrated compartment loading"
        );

        Ok(CompartmentProfiles {
            profiles,
            gradient_factors,
            interpolation,
        })
    }

    /// Highest ambient pressure, over every state of every compartment, at
    /// which some compartment's unmodified gradient factor already exceeds
    /// gf_low. None when the dive never reaches that conservatism level.
    fn pressure_gf_low_of(
        profiles: &[CompartmentProfile],
        gradient_factors: GradientFactors,
    ) -> Result<Option<Quantity>, ComputeError> {
        let mut pivot: Option<Quantity> = None;
        for profile in profiles {
            for state in profile.states() {
                if state.gradient_factor()? <= gradient_factors.low() {
                    continue;
                }
                pivot = Some(match pivot {
                    None => state.ambient_pressure(),
                    Some(current) => {
                        if state.ambient_pressure().try_cmp(current)? == Ordering::Greater {
                            state.ambient_pressure()
                        } else {
                            current
                        }
                    }
                });
            }
        }
        Ok(pivot)
    }

    pub fn profiles(&self) -> &[CompartmentProfile] {
        &self.profiles
    }

    /// Profile of the compartment with the given name.
    pub fn profile(&self, name: &str) -> Result<&CompartmentProfile, ComputeError> {
        self.profiles
            .iter()
            .find(|profile| profile.compartment().name() == name)
            .ok_or_else(|| ComputeError::UnknownCompartment(name.to_string()))
    }

    pub fn gradient_factors(&self) -> GradientFactors {
        self.gradient_factors
    }

    /// The pivot ambient pressure anchoring the gf_low end of the
    /// interpolation.
    pub fn pressure_gf_low(&self) -> Result<Quantity, ComputeError> {
        self.interpolation
            .as_ref()
            .map(|interpolation| interpolation.pressure_gf_low)
            .ok_or(ComputeError::GfPivotUndefined)
    }

    /// Adjusted coefficients of the named compartment.
    pub fn coefficients_for(&self, name: &str) -> Result<&GfCoefficients, ComputeError> {
        let index = self
            .profiles
            .iter()
            .position(|profile| profile.compartment().name() == name)
            .ok_or_else(|| ComputeError::UnknownCompartment(name.to_string()))?;
        let interpolation = self
            .interpolation
            .as_ref()
            .ok_or(ComputeError::GfPivotUndefined)?;
        Ok(&interpolation.coefficients[index])
    }

    /// Gradient-factor-adjusted ceiling of the named compartment at every
    /// timeline point.
    pub fn gf_ceilings(&self, name: &str) -> Result<Vec<Quantity>, ComputeError> {
        let coefficients = *self.coefficients_for(name)?;
        self.profile(name)?
            .states()
            .iter()
            .map(|state| state.gf_ceiling(&coefficients))
            .collect()
    }
}

/// The ZH-L16C table bound to a conservatism pair.
#[derive(Clone, Debug)]
pub struct Buhlmann {
    compartments: Vec<Arc<Compartment>>,
    gradient_factors: GradientFactors,
}

impl Buhlmann {
    pub fn new(compartments: Vec<Arc<Compartment>>, gradient_factors: GradientFactors) -> Self {
        Buhlmann {
            compartments,
            gradient_factors,
        }
    }

    /// The standard 16-compartment ZH-L16C nitrogen table.
    pub fn zh_l16c(gradient_factors: GradientFactors) -> Self {
        let compartments = ZH_L16C_TABLE
            .iter()
            .enumerate()
            .map(|(row, &(half_time, a, b))| {
                Arc::new(Compartment {
                    name: format!("compartment {}", row + 1),
                    half_time: Quantity::minutes(half_time),
                    a: Quantity::bar(a),
                    b,
                })
            })
            .collect();
        Buhlmann::new(compartments, gradient_factors)
    }

    pub fn compartments(&self) -> &[Arc<Compartment>] {
        &self.compartments
    }

    pub fn gradient_factors(&self) -> GradientFactors {
        self.gradient_factors
    }

    /// Run the full simulation from the default start: atmospheric ambient
    /// pressure with nitrogen equilibrated to breathing air at the surface.
    pub fn compartment_profiles(
        &self,
        depth_profile: &DepthProfile,
        usage_profile: &GasUsageProfile,
        supply_set: &GasSupplySet,
    ) -> Result<CompartmentProfiles, ComputeError> {
        self.compartment_profiles_from(
            depth_profile,
            usage_profile,
            supply_set,
            ATMOSPHERIC_PRESSURE,
            Gas::AIR.ppn2(ATMOSPHERIC_PRESSURE),
        )
    }

    /// Run the full simulation from an explicit starting condition.
    pub fn compartment_profiles_from(
        &self,
        depth_profile: &DepthProfile,
        usage_profile: &GasUsageProfile,
        supply_set: &GasSupplySet,
        start_ambient_pressure: Quantity,
        start_n2_pressure: Quantity,
    ) -> Result<CompartmentProfiles, ComputeError> {
        CompartmentProfiles::create(
            &self.compartments,
            self.gradient_factors,
            depth_profile,
            usage_profile,
            supply_set,
            start_ambient_pressure,
            start_n2_pressure,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_compartment() -> Arc<Compartment> {
        Arc::clone(&Buhlmann::zh_l16c(GradientFactors::new(0.35, 0.85).unwrap()).compartments()[0])
    }

    fn surface_state(compartment: Arc<Compartment>) -> CompartmentState {
        CompartmentState::new(
            compartment,
            ATMOSPHERIC_PRESSURE,
            Gas::AIR.ppn2(ATMOSPHERIC_PRESSURE),
        )
        .unwrap()
    }

    #[test]
    fn test_m_value_matches_coefficients() {
        let state = surface_state(first_compartment());
        // a + P_atm / b for compartment 1
        let expected = Quantity::bar(1.1696)
            .try_add(ATMOSPHERIC_PRESSURE / 0.5578)
            .unwrap();
        assert!(state.m_value().unwrap().approx_eq(expected).unwrap());
    }

    #[test]
    fn test_surface_equilibrium_gradient_is_negative() {
        // breathing air at the surface leaves n2 below ambient
        let state = surface_state(first_compartment());
        assert!(state.gradient().unwrap().value() < 0.0);
        assert!(state.gradient_factor().unwrap() < 0.0);
    }

    #[test]
    fn test_next_zero_duration_is_identity() {
        let state = surface_state(first_compartment());
        let next = state
            .next(Quantity::seconds(0.0), ATMOSPHERIC_PRESSURE, &Gas::AIR)
            .unwrap();
        assert!(next
            .n2_pressure()
            .approx_eq(state.n2_pressure())
            .unwrap());
        assert!(next
            .ambient_pressure()
            .approx_eq(state.ambient_pressure())
            .unwrap());
    }

    #[test]
    fn test_next_rejects_steps_over_ten_seconds() {
        let state = surface_state(first_compartment());
        let result = state.next(Quantity::seconds(10.5), ATMOSPHERIC_PRESSURE, &Gas::AIR);
        assert!(matches!(result, Err(ComputeError::StepTooLong { .. })));
        // and a minute-long step fails the same way at depth
        let result = state.next(Quantity::minutes(1.0), Quantity::bar(4.0), &Gas::AIR);
        assert!(matches!(result, Err(ComputeError::StepTooLong { .. })));
    }

    #[test]
    fn test_next_loads_nitrogen_under_pressure() {
        let mut state = surface_state(first_compartment());
        let depth_pressure = Quantity::bar(5.0);
        // one minute at 40 m in 10 s steps
        for _ in 0..6 {
            state = state
                .next(Quantity::seconds(10.0), depth_pressure, &Gas::AIR)
                .unwrap();
        }
        assert_eq!(
            state
                .n2_pressure()
                .try_cmp(Gas::AIR.ppn2(ATMOSPHERIC_PRESSURE))
                .unwrap(),
            Ordering::Greater
        );
        // but still well below the inspired pressure after one minute
        assert_eq!(
            state
                .n2_pressure()
                .try_cmp(Gas::AIR.ppn2(depth_pressure))
                .unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_long_exposure_converges_to_inspired() {
        let mut state = surface_state(first_compartment());
        let depth_pressure = Quantity::bar(3.0);
        let inspired = Gas::AIR.ppn2(
            depth_pressure
                .try_sub(ALVEOLAR_WATER_VAPOR_PRESSURE)
                .unwrap(),
        );
        // 100 minutes = 20 half-times of compartment 1
        for _ in 0..600 {
            state = state
                .next(Quantity::seconds(10.0), depth_pressure, &Gas::AIR)
                .unwrap();
        }
        let relative_gap =
            (state.n2_pressure().value() - inspired.value()).abs() / inspired.value();
        assert!(
            relative_gap < 1e-4,
            "saturated load should approach inspired pressure, gap {relative_gap}"
        );
    }

    #[test]
    fn test_gf_ceiling_boundary_conditions() {
        let gf = GradientFactors::new(0.35, 0.85).unwrap();
        let compartment = first_compartment();
        let pivot = Quantity::bar(2.8);
        let coefficients = compartment.gf_coefficients(gf, pivot).unwrap();

        // at the pivot pressure the adjusted ceiling equals the gf_low-scaled
        // gradient over ambient
        let at_pivot = CompartmentState::new(Arc::clone(&compartment), pivot, pivot).unwrap();
        let expected_low = pivot
            .try_add(at_pivot.m_gradient().unwrap() * gf.low())
            .unwrap();
        assert!(at_pivot
            .gf_ceiling(&coefficients)
            .unwrap()
            .approx_eq(expected_low)
            .unwrap());

        // at atmospheric pressure it equals the gf_high-scaled gradient
        let at_surface = CompartmentState::new(
            Arc::clone(&compartment),
            ATMOSPHERIC_PRESSURE,
            ATMOSPHERIC_PRESSURE,
        )
        .unwrap();
        let expected_high = ATMOSPHERIC_PRESSURE
            .try_add(at_surface.m_gradient().unwrap() * gf.high())
            .unwrap();
        assert!(at_surface
            .gf_ceiling(&coefficients)
            .unwrap()
            .approx_eq(expected_high)
            .unwrap());
    }

    #[test]
    fn test_gradient_factors_validation() {
        assert!(GradientFactors::new(0.35, 0.85).is_ok());
        assert!(GradientFactors::new(0.0, 0.85).is_err());
        assert!(GradientFactors::new(0.35, 1.2).is_err());
    }

    #[test]
    fn test_zh_l16c_table_shape() {
        let model = Buhlmann::zh_l16c(GradientFactors::new(0.35, 0.85).unwrap());
        assert_eq!(model.compartments().len(), COMPARTMENT_COUNT);
        let first = &model.compartments()[0];
        assert!(first
            .half_time()
            .approx_eq(Quantity::minutes(5.0))
            .unwrap());
        let last = &model.compartments()[COMPARTMENT_COUNT - 1];
        assert!(last
            .half_time()
            .approx_eq(Quantity::minutes(635.0))
            .unwrap());
        assert_eq!(last.name(), "compartment 16");
    }
}
