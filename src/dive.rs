//! A planned dive's derived profiles, bundled.

use crate::depth_profile::DepthProfile;
use crate::error::ComputeError;
use crate::gas_profile::{GasSupplyProfile, GasSupplySet, GasUsageProfile};
use crate::quantity::Quantity;
use crate::timeline::Timeline;

/// Timeline, depth, gas usage and gas supply of one planned dive.
///
/// The read-only surface the presentation layer consumes: depth at any time
/// inside the span, supply pressure at any timeline boundary.
#[derive(Clone, Debug)]
pub struct Dive {
    timeline: Timeline,
    depth_profile: DepthProfile,
    gas_usage_profile: GasUsageProfile,
    gas_supply_profile: GasSupplyProfile,
    start_gas_supply_set: GasSupplySet,
}

impl Dive {
    pub fn new(
        timeline: Timeline,
        depth_profile: DepthProfile,
        gas_usage_profile: GasUsageProfile,
        gas_supply_profile: GasSupplyProfile,
    ) -> Result<Self, ComputeError> {
        let start_gas_supply_set = gas_supply_profile
            .snapshots()
            .first()
            .cloned()
            .ok_or(ComputeError::EmptyTimeline)?;
        Ok(Dive {
            timeline,
            depth_profile,
            gas_usage_profile,
            gas_supply_profile,
            start_gas_supply_set,
        })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn depth_profile(&self) -> &DepthProfile {
        &self.depth_profile
    }

    pub fn gas_usage_profile(&self) -> &GasUsageProfile {
        &self.gas_usage_profile
    }

    pub fn gas_supply_profile(&self) -> &GasSupplyProfile {
        &self.gas_supply_profile
    }

    pub fn depth_at(&self, time: Quantity) -> Result<Quantity, ComputeError> {
        self.depth_profile.at(time)
    }

    pub fn supply_pressure_at(&self, name: &str, time: Quantity) -> Result<Quantity, ComputeError> {
        Ok(self.gas_supply_profile.at(time)?.get(name)?.pressure())
    }

    /// The same dive on a timeline densified to `period`: depths are
    /// re-interpolated and the supply simulation re-run from the original
    /// starting set, while the usage profile keeps answering from the
    /// original plan segments.
    pub fn resample(&self, period: Quantity) -> Result<Dive, ComputeError> {
        let timeline = self.timeline.resample(period)?;
        let depth_profile = self.depth_profile.interpolate(&timeline)?;
        let gas_usage_profile = self.gas_usage_profile.clone();
        let gas_supply_profile = GasSupplyProfile::create(
            self.start_gas_supply_set.clone(),
            &depth_profile,
            &gas_usage_profile,
        )?;
        Dive::new(
            timeline,
            depth_profile,
            gas_usage_profile,
            gas_supply_profile,
        )
    }
}
