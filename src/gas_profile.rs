//! Breathing-gas supplies and the forward simulation of their depletion.
//!
//! A [`GasSupplySet`] is an immutable named collection of cylinders; consuming
//! gas returns a new set that shares every unaffected supply by reference.
//! [`GasSupplyProfile`] folds a set across a timeline's segments, keeping one
//! snapshot per segment boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::depth_profile::DepthProfile;
use crate::error::ComputeError;
use crate::physics::{pressure_from_depth, Gas, ATMOSPHERIC_PRESSURE};
use crate::quantity::{Kind, Quantity};
use crate::timeline::{TimeSegment, Timeline};

/// A cylinder with a fixed physical volume.
#[derive(Clone, Copy, Debug)]
pub struct Cylinder {
    volume: Quantity,
}

impl Cylinder {
    pub fn new(volume: Quantity) -> Result<Self, ComputeError> {
        let volume = volume.expect_kind(Kind::Volume)?;
        Ok(Cylinder { volume })
    }

    pub fn litres(litres: f64) -> Self {
        Cylinder {
            volume: Quantity::litres(litres),
        }
    }

    pub fn volume(&self) -> Quantity {
        self.volume
    }
}

/// A cylinder filled with a fixed gas mixture at some current pressure.
///
/// The cylinder and the mixture never change over the supply's lifetime;
/// pressure changes only through [`GasSupply::consume`], which returns a new
/// value.
#[derive(Clone, Debug)]
pub struct GasSupply {
    cylinder: Cylinder,
    gas: Gas,
    pressure: Quantity,
}

impl GasSupply {
    pub fn new(cylinder: Cylinder, gas: Gas, pressure: Quantity) -> Result<Self, ComputeError> {
        let pressure = pressure.expect_kind(Kind::Pressure)?;
        Ok(GasSupply {
            cylinder,
            gas,
            pressure,
        })
    }

    pub fn cylinder(&self) -> &Cylinder {
        &self.cylinder
    }

    pub fn gas(&self) -> &Gas {
        &self.gas
    }

    pub fn pressure(&self) -> Quantity {
        self.pressure
    }

    /// The supply's content expressed as a volume at atmospheric pressure.
    pub fn surface_volume(&self) -> Quantity {
        (self.pressure / ATMOSPHERIC_PRESSURE) * self.cylinder.volume()
    }

    /// Draw `volume` breathed at `pressure` from the cylinder.
    ///
    /// The drawn volume is converted to its atmospheric equivalent,
    /// subtracted from the content, and the cylinder pressure recomputed.
    /// Overdrawing is passed through as a negative pressure; the plan
    /// checker owns that policy, not this simulation.
    pub fn consume(&self, volume: Quantity, pressure: Quantity) -> Result<GasSupply, ComputeError> {
        let volume = volume.expect_kind(Kind::Volume)?;
        let pressure = pressure.expect_kind(Kind::Pressure)?;
        let drawn = (pressure / ATMOSPHERIC_PRESSURE) * volume;
        let remaining = self.surface_volume().try_sub(drawn)?;
        let new_pressure = remaining * ATMOSPHERIC_PRESSURE / self.cylinder.volume();
        if new_pressure.value() < 0.0 {
            tracing::warn!(
                gas = %self.gas,
                pressure = %new_pressure,
                "cylinder overdrawn below empty"
            );
        }
        Ok(GasSupply {
            cylinder: self.cylinder,
            gas: self.gas,
            pressure: new_pressure,
        })
    }
}

impl fmt::Display for GasSupply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.surface_volume(), self.gas)
    }
}

/// An immutable, named collection of independent gas supplies.
#[derive(Clone, Debug, Default)]
pub struct GasSupplySet {
    supplies: BTreeMap<String, Arc<GasSupply>>,
}

impl GasSupplySet {
    pub fn new() -> Self {
        GasSupplySet::default()
    }

    /// Builder-style insertion of a named supply.
    pub fn with(mut self, name: impl Into<String>, supply: GasSupply) -> Self {
        self.supplies.insert(name.into(), Arc::new(supply));
        self
    }

    pub fn get(&self, name: &str) -> Result<&GasSupply, ComputeError> {
        self.supplies
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| ComputeError::UnknownGasSupply(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.supplies.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GasSupply)> {
        self.supplies
            .iter()
            .map(|(name, supply)| (name.as_str(), supply.as_ref()))
    }

    /// A new set in which only the named supply has been consumed from;
    /// every other entry is shared with `self`.
    pub fn consume(
        &self,
        name: &str,
        volume: Quantity,
        pressure: Quantity,
    ) -> Result<GasSupplySet, ComputeError> {
        let updated = Arc::new(self.get(name)?.consume(volume, pressure)?);
        let supplies = self
            .supplies
            .iter()
            .map(|(key, supply)| {
                let supply = if key == name {
                    Arc::clone(&updated)
                } else {
                    Arc::clone(supply)
                };
                (key.clone(), supply)
            })
            .collect();
        Ok(GasSupplySet { supplies })
    }

    /// Consume what `usage` prescribes over `segment` at `depth`.
    pub fn use_for(
        &self,
        segment: &TimeSegment,
        depth: Quantity,
        usage: &GasUsage,
    ) -> Result<GasSupplySet, ComputeError> {
        let volume = usage.sac() * segment.duration();
        let pressure = pressure_from_depth(depth)?;
        self.consume(usage.gas_supply_name(), volume, pressure)
    }
}

impl fmt::Display for GasSupplySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, supply) in self.iter() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{name}: {supply}")?;
            first = false;
        }
        Ok(())
    }
}

/// Which supply is breathed and at what surface-equivalent rate.
#[derive(Clone, Debug)]
pub struct GasUsage {
    gas_supply_name: String,
    sac: Quantity,
}

impl GasUsage {
    pub fn new(gas_supply_name: impl Into<String>, sac: Quantity) -> Result<Self, ComputeError> {
        let sac = sac.expect_kind(Kind::FlowRate)?;
        Ok(GasUsage {
            gas_supply_name: gas_supply_name.into(),
            sac,
        })
    }

    pub fn gas_supply_name(&self) -> &str {
        &self.gas_supply_name
    }

    pub fn sac(&self) -> Quantity {
        self.sac
    }
}

/// Total mapping from every timeline segment to exactly one [`GasUsage`].
#[derive(Clone, Debug)]
pub struct GasUsageProfile {
    timeline: Timeline,
    usages: Vec<GasUsage>,
}

impl GasUsageProfile {
    pub fn new(timeline: Timeline, usages: Vec<GasUsage>) -> Result<Self, ComputeError> {
        if usages.len() != timeline.segments().len() {
            return Err(ComputeError::MisalignedProfile {
                expected: timeline.segments().len(),
                found: usages.len(),
            });
        }
        Ok(GasUsageProfile { timeline, usages })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The usage governing the segment that contains `time`.
    pub fn at(&self, time: Quantity) -> Result<&GasUsage, ComputeError> {
        let index = self
            .timeline
            .segment_index_for(time)?
            .ok_or_else(|| ComputeError::TimeOutOfRange(time.to_string()))?;
        Ok(&self.usages[index])
    }
}

/// Gas-supply snapshots at every timeline boundary, produced by sequentially
/// consuming across each segment.
///
/// The profile is a step function sampled only at segment boundaries;
/// lookup anywhere else fails.
#[derive(Clone, Debug)]
pub struct GasSupplyProfile {
    timeline: Timeline,
    snapshots: Vec<GasSupplySet>,
}

impl GasSupplyProfile {
    pub fn create(
        start: GasSupplySet,
        depth_profile: &DepthProfile,
        usage_profile: &GasUsageProfile,
    ) -> Result<Self, ComputeError> {
        let timeline = depth_profile.timeline().clone();
        let mut snapshots = Vec::with_capacity(timeline.len());
        let mut current = start;
        for segment in timeline.segments() {
            let depth = depth_profile.average_depth(segment)?;
            let usage = usage_profile.at(segment.start())?;
            let next = current.use_for(segment, depth, usage)?;
            snapshots.push(current);
            current = next;
        }
        snapshots.push(current);
        tracing::debug!(
            segments = timeline.segments().len(),
            "simulated gas consumption"
        );
        Ok(GasSupplyProfile {
            timeline,
            snapshots,
        })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn snapshots(&self) -> &[GasSupplySet] {
        &self.snapshots
    }

    /// The snapshot at a boundary time; any other time has no defined value.
    pub fn at(&self, time: Quantity) -> Result<&GasSupplySet, ComputeError> {
        let index = self
            .timeline
            .index_of(time)?
            .ok_or_else(|| ComputeError::NoSnapshotAt(time.to_string()))?;
        Ok(&self.snapshots[index])
    }
}
