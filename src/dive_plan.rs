//! Structured dive-plan input.
//!
//! A plan is an ordered list of rows, each giving the depth reached at the
//! end of the row's duration, and the supply and surface consumption rate
//! breathed from that point on. The plan derives the timeline, depth
//! profile, usage profile and supply profile that feed the simulations.

use crate::depth_profile::DepthProfile;
use crate::dive::Dive;
use crate::error::ComputeError;
use crate::gas_profile::{GasSupplyProfile, GasSupplySet, GasUsage, GasUsageProfile};
use crate::quantity::Quantity;
use crate::timeline::{TimePoint, Timeline};

/// One plan row, in the units dive plans are written in.
#[derive(Clone, Debug)]
pub struct DivePlanRow {
    depth: Quantity,
    duration: Quantity,
    gas_supply_name: String,
    sac: Quantity,
}

impl DivePlanRow {
    pub fn new(
        depth_m: f64,
        duration_min: f64,
        gas_supply_name: impl Into<String>,
        sac_l_min: f64,
    ) -> Self {
        DivePlanRow {
            depth: Quantity::metres(depth_m),
            duration: Quantity::minutes(duration_min),
            gas_supply_name: gas_supply_name.into(),
            sac: Quantity::litres_per_minute(sac_l_min),
        }
    }

    pub fn depth(&self) -> Quantity {
        self.depth
    }

    pub fn duration(&self) -> Quantity {
        self.duration
    }

    pub fn gas_supply_name(&self) -> &str {
        &self.gas_supply_name
    }

    pub fn sac(&self) -> Quantity {
        self.sac
    }
}

/// An ordered dive plan plus the cylinders it starts with.
#[derive(Clone, Debug)]
pub struct DivePlan {
    start_gas_supply_set: GasSupplySet,
    rows: Vec<DivePlanRow>,
}

impl DivePlan {
    pub fn new(start_gas_supply_set: GasSupplySet, rows: Vec<DivePlanRow>) -> Self {
        DivePlan {
            start_gas_supply_set,
            rows,
        }
    }

    /// Build a plan from `(depth_m, duration_min, supply, sac_l_min)` rows.
    pub fn from_table<'a>(
        start_gas_supply_set: GasSupplySet,
        table: impl IntoIterator<Item = (f64, f64, &'a str, f64)>,
    ) -> Self {
        let rows = table
            .into_iter()
            .map(|(depth_m, duration_min, name, sac_l_min)| {
                DivePlanRow::new(depth_m, duration_min, name, sac_l_min)
            })
            .collect();
        DivePlan::new(start_gas_supply_set, rows)
    }

    pub fn rows(&self) -> &[DivePlanRow] {
        &self.rows
    }

    pub fn start_gas_supply_set(&self) -> &GasSupplySet {
        &self.start_gas_supply_set
    }

    /// Cumulative row durations as a labeled timeline: point `i` is the end
    /// of row `i`'s duration and carries the label `P{i}`.
    pub fn timeline(&self) -> Result<Timeline, ComputeError> {
        let mut elapsed = Quantity::seconds(0.0);
        let mut points = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            elapsed = elapsed.try_add(row.duration())?;
            points.push(TimePoint::labeled(elapsed, format!("P{index}")));
        }
        Timeline::new(points)
    }

    /// Each row's depth at its timeline point.
    pub fn depth_profile(&self) -> Result<DepthProfile, ComputeError> {
        let depths = self.rows.iter().map(DivePlanRow::depth).collect();
        DepthProfile::new(self.timeline()?, depths)
    }

    /// Row `i`'s supply and rate govern the segment starting at point `i`.
    pub fn gas_usage_profile(&self) -> Result<GasUsageProfile, ComputeError> {
        let timeline = self.timeline()?;
        let usages = self
            .rows
            .iter()
            .take(timeline.segments().len())
            .map(|row| GasUsage::new(row.gas_supply_name(), row.sac()))
            .collect::<Result<Vec<_>, _>>()?;
        GasUsageProfile::new(timeline, usages)
    }

    pub fn gas_supply_profile(&self) -> Result<GasSupplyProfile, ComputeError> {
        GasSupplyProfile::create(
            self.start_gas_supply_set.clone(),
            &self.depth_profile()?,
            &self.gas_usage_profile()?,
        )
    }

    /// The four derived profiles bundled into a [`Dive`].
    pub fn dive(&self) -> Result<Dive, ComputeError> {
        Dive::new(
            self.timeline()?,
            self.depth_profile()?,
            self.gas_usage_profile()?,
            self.gas_supply_profile()?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas_profile::{Cylinder, GasSupply};
    use crate::physics::Gas;

    fn start_set() -> GasSupplySet {
        GasSupplySet::new().with(
            "main",
            GasSupply::new(Cylinder::litres(12.0), Gas::AIR, Quantity::bar(200.0)).unwrap(),
        )
    }

    fn plan() -> DivePlan {
        DivePlan::from_table(
            start_set(),
            [
                (0.0, 0.0, "main", 20.0),
                (18.0, 2.0, "main", 20.0),
                (18.0, 30.0, "main", 20.0),
                (0.0, 3.0, "main", 15.0),
            ],
        )
    }

    #[test]
    fn test_timeline_is_cumulative_and_labeled() {
        let timeline = plan().timeline().unwrap();
        assert_eq!(timeline.len(), 4);
        assert!(timeline
            .time(0)
            .unwrap()
            .approx_eq(Quantity::minutes(0.0))
            .unwrap());
        assert!(timeline
            .time(3)
            .unwrap()
            .approx_eq(Quantity::minutes(35.0))
            .unwrap());
        assert_eq!(timeline.point(2).unwrap().label(), Some("P2"));
        assert_eq!(timeline.named_profile().len(), 4);
    }

    #[test]
    fn test_depth_profile_follows_rows() {
        let profile = plan().depth_profile().unwrap();
        let depth = profile.at(Quantity::minutes(2.0)).unwrap();
        assert!(depth.approx_eq(Quantity::metres(18.0)).unwrap());
        // halfway down the descent
        let depth = profile.at(Quantity::minutes(1.0)).unwrap();
        assert!(depth.approx_eq(Quantity::metres(9.0)).unwrap());
    }

    #[test]
    fn test_usage_covers_every_segment() {
        let usage_profile = plan().gas_usage_profile().unwrap();
        assert_eq!(usage_profile.timeline().segments().len(), 3);
        let usage = usage_profile.at(Quantity::minutes(10.0)).unwrap();
        assert_eq!(usage.gas_supply_name(), "main");
        assert!(usage
            .sac()
            .approx_eq(Quantity::litres_per_minute(20.0))
            .unwrap());
    }

    #[test]
    fn test_supply_profile_depletes_main() {
        let plan = plan();
        let supply_profile = plan.gas_supply_profile().unwrap();
        let last = supply_profile.at(Quantity::minutes(35.0)).unwrap();
        assert_eq!(
            last.get("main")
                .unwrap()
                .pressure()
                .try_cmp(Quantity::bar(200.0))
                .unwrap(),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn test_duplicate_times_rejected() {
        let plan = DivePlan::from_table(
            start_set(),
            [(0.0, 0.0, "main", 20.0), (10.0, 0.0, "main", 20.0)],
        );
        assert!(matches!(
            plan.timeline(),
            Err(ComputeError::UnorderedTimeline)
        ));
    }
}
