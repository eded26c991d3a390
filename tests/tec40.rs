//! End-to-end run of a tec-40 style decompression dive: descent to 40 m on
//! air, staged ascent on EAN50, two cylinders, gradient factors 35/85.

use std::cmp::Ordering;

use diveplan_compute::{
    Buhlmann, Cylinder, DivePlan, Gas, GasSupply, GasSupplyProfile, GasSupplySet, GradientFactors,
    Quantity, COMPARTMENT_COUNT,
};

fn tec40_plan() -> DivePlan {
    let main = GasSupply::new(Cylinder::litres(12.0), Gas::AIR, Quantity::bar(200.0)).unwrap();
    let deco = GasSupply::new(
        Cylinder::litres(5.5),
        Gas::new(0.5, 0.0).unwrap(),
        Quantity::bar(150.0),
    )
    .unwrap();
    let start = GasSupplySet::new().with("main", main).with("deco", deco);

    DivePlan::from_table(
        start,
        [
            (0.0, 0.0, "main", 20.0),
            (5.0, 1.0, "main", 20.0),
            (5.0, 5.0, "main", 20.0),
            (40.0, 3.0, "main", 20.0),
            (40.0, 13.0, "main", 20.0),
            (18.0, 2.5, "deco", 20.0),
            (18.0, 1.0, "deco", 15.0),
            (9.0, 1.0, "deco", 15.0),
            (9.0, 0.5, "deco", 15.0),
            (6.0, 0.5, "deco", 15.0),
            (6.0, 1.5, "deco", 15.0),
            (3.0, 0.5, "deco", 15.0),
            (3.0, 2.5, "deco", 15.0),
            (0.0, 0.5, "deco", 15.0),
        ],
    )
}

#[test]
fn test_timeline_ends_at_total_duration() {
    let timeline = tec40_plan().timeline().unwrap();
    assert_eq!(timeline.len(), 14);
    assert!(timeline
        .last_time()
        .unwrap()
        .approx_eq(Quantity::minutes(32.5))
        .unwrap());

    // resampling keeps the endpoints and every plan point
    let fine = timeline.resample(Quantity::seconds(10.0)).unwrap();
    assert!(fine
        .last_time()
        .unwrap()
        .approx_eq(Quantity::minutes(32.5))
        .unwrap());
    assert_eq!(fine.len(), 196);
    for point in timeline.iter() {
        assert!(fine.index_of(point.time()).unwrap().is_some());
    }
}

#[test]
fn test_both_cylinders_end_below_start() {
    let dive = tec40_plan().dive().unwrap().resample(Quantity::seconds(10.0)).unwrap();
    let end = dive.timeline().last_time().unwrap();
    for (name, start_pressure) in [("main", 200.0), ("deco", 150.0)] {
        let final_pressure = dive.supply_pressure_at(name, end).unwrap();
        assert_eq!(
            final_pressure
                .try_cmp(Quantity::bar(start_pressure))
                .unwrap(),
            Ordering::Less,
            "{name} should end below its starting pressure"
        );
        // and nothing overdrew the cylinder in this plan
        assert!(final_pressure.value() > 0.0);
    }
}

#[test]
fn test_each_segment_draws_from_exactly_one_supply() {
    let plan = tec40_plan();
    let usage_profile = plan.gas_usage_profile().unwrap();
    let dive = plan.dive().unwrap().resample(Quantity::seconds(10.0)).unwrap();
    let supply_profile: &GasSupplyProfile = dive.gas_supply_profile();

    for (index, segment) in dive.timeline().segments().iter().enumerate() {
        let used = usage_profile.at(segment.start()).unwrap().gas_supply_name();
        let before = &supply_profile.snapshots()[index];
        let after = &supply_profile.snapshots()[index + 1];
        for name in ["main", "deco"] {
            let unchanged = before
                .get(name)
                .unwrap()
                .pressure()
                .approx_eq(after.get(name).unwrap().pressure())
                .unwrap();
            if name == used {
                assert!(!unchanged, "{name} must deplete over its own segment");
            } else {
                assert!(unchanged, "{name} must not change over a {used} segment");
            }
        }
    }
}

#[test]
fn test_compartment_profiles_cover_every_point() {
    let plan = tec40_plan();
    let dive = plan.dive().unwrap().resample(Quantity::seconds(10.0)).unwrap();
    let model = Buhlmann::zh_l16c(GradientFactors::new(0.35, 0.85).unwrap());
    let profiles = model
        .compartment_profiles(
            dive.depth_profile(),
            dive.gas_usage_profile(),
            plan.start_gas_supply_set(),
        )
        .unwrap();

    assert_eq!(profiles.profiles().len(), COMPARTMENT_COUNT);
    for profile in profiles.profiles() {
        assert_eq!(profile.states().len(), dive.timeline().len());
        for state in profile.states() {
            assert!(state.n2_pressure().value().is_finite());
            assert!(state.m_value().unwrap().value() > 0.0);
        }
    }

    // a 40 m dive this long has a decompression obligation, so the pivot is
    // defined and sits above atmospheric pressure
    let pivot = profiles.pressure_gf_low().unwrap();
    assert_eq!(
        pivot
            .try_cmp(diveplan_compute::ATMOSPHERIC_PRESSURE)
            .unwrap(),
        Ordering::Greater
    );
}

#[test]
fn test_gf_ceiling_runs_through_both_anchors() {
    let plan = tec40_plan();
    let dive = plan.dive().unwrap().resample(Quantity::seconds(10.0)).unwrap();
    let gf = GradientFactors::new(0.35, 0.85).unwrap();
    let model = Buhlmann::zh_l16c(gf);
    let profiles = model
        .compartment_profiles(
            dive.depth_profile(),
            dive.gas_usage_profile(),
            plan.start_gas_supply_set(),
        )
        .unwrap();
    let pivot = profiles.pressure_gf_low().unwrap();
    let surface = diveplan_compute::ATMOSPHERIC_PRESSURE;
    let span = pivot.try_sub(surface).unwrap();

    for (compartment, profile) in model.compartments().iter().zip(profiles.profiles()) {
        let name = compartment.name();
        let coefficients = profiles.coefficients_for(name).unwrap();
        let ceilings = profiles.gf_ceilings(name).unwrap();
        assert_eq!(ceilings.len(), profile.states().len());

        // the two anchor ceilings: gf_low-scaled gradient at the pivot,
        // gf_high-scaled gradient at the surface
        let m_gradient_at = |pressure: Quantity| {
            compartment
                .a()
                .try_add(pressure * ((1.0 - compartment.b()) / compartment.b()))
                .unwrap()
        };
        let low_anchor = pivot.try_add(m_gradient_at(pivot) * gf.low()).unwrap();
        let high_anchor = surface
            .try_add(m_gradient_at(surface) * gf.high())
            .unwrap();

        for state in profile.states() {
            // the adjusted ceiling is the line through the two anchors,
            // evaluated at this state's ambient pressure
            let offset = state
                .ambient_pressure()
                .try_sub(surface)
                .unwrap()
                .try_ratio(span)
                .unwrap();
            let expected = high_anchor
                .try_add(low_anchor.try_sub(high_anchor).unwrap() * offset)
                .unwrap();
            let actual = state.gf_ceiling(coefficients).unwrap();
            let gap = (actual.value() - expected.value()).abs() / expected.value().abs();
            assert!(
                gap < 1e-9,
                "{name}: adjusted ceiling off the anchor line by {gap}"
            );
        }
    }
}
