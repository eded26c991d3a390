//! Time-to-depth mapping with linear interpolation.

use crate::error::ComputeError;
use crate::quantity::{Kind, Quantity};
use crate::timeline::{TimeSegment, Timeline};

/// Explicit depth samples, one per timeline point.
///
/// Queries at a sampled time return the sample; queries at any other time
/// inside the span interpolate linearly between the enclosing segment's
/// endpoint samples.
#[derive(Clone, Debug)]
pub struct DepthProfile {
    timeline: Timeline,
    depths: Vec<Quantity>,
}

impl DepthProfile {
    pub fn new(timeline: Timeline, depths: Vec<Quantity>) -> Result<Self, ComputeError> {
        if depths.len() != timeline.len() {
            return Err(ComputeError::MisalignedProfile {
                expected: timeline.len(),
                found: depths.len(),
            });
        }
        for depth in &depths {
            depth.expect_kind(Kind::Depth)?;
        }
        Ok(DepthProfile { timeline, depths })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn depths(&self) -> &[Quantity] {
        &self.depths
    }

    /// Depth at `time`: the explicit sample if one exists, otherwise the
    /// linear interpolation within the enclosing segment.
    pub fn at(&self, time: Quantity) -> Result<Quantity, ComputeError> {
        if let Some(index) = self.timeline.index_of(time)? {
            return Ok(self.depths[index]);
        }
        let index = self
            .timeline
            .segment_index_for(time)?
            .ok_or_else(|| ComputeError::TimeOutOfRange(time.to_string()))?;
        let segment = &self.timeline.segments()[index];
        let before = self.depths[index] * segment.stop().try_sub(time)?;
        let after = self.depths[index + 1] * time.try_sub(segment.start())?;
        Ok(before.try_add(after)? / segment.duration())
    }

    /// Arithmetic mean of the segment's two endpoint depths. A first-order
    /// stand-in for the true average over the interpolated curve.
    pub fn average_depth(&self, segment: &TimeSegment) -> Result<Quantity, ComputeError> {
        let start = self.at(segment.start())?;
        let stop = self.at(segment.stop())?;
        Ok(start.try_add(stop)? / 2.0)
    }

    /// Re-sample the profile onto another timeline covering the same span.
    pub fn interpolate(&self, timeline: &Timeline) -> Result<DepthProfile, ComputeError> {
        let depths = timeline
            .iter()
            .map(|point| self.at(point.time()))
            .collect::<Result<Vec<_>, _>>()?;
        DepthProfile::new(timeline.clone(), depths)
    }
}
