//! Ordered time points and their segmentation.
//!
//! A [`Timeline`] is a strictly increasing sequence of time quantities, some
//! of which may carry a label. It partitions its span into contiguous,
//! non-overlapping [`TimeSegment`]s derived from consecutive point pairs.

use std::ops::Range;

use crate::error::ComputeError;
use crate::quantity::{Kind, Quantity};

/// One timeline point: a time and an optional label.
#[derive(Clone, Debug)]
pub struct TimePoint {
    time: Quantity,
    label: Option<String>,
}

impl TimePoint {
    pub fn new(time: Quantity) -> Self {
        TimePoint { time, label: None }
    }

    pub fn labeled(time: Quantity, label: impl Into<String>) -> Self {
        TimePoint {
            time,
            label: Some(label.into()),
        }
    }

    pub fn time(&self) -> Quantity {
        self.time
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// The closed interval between two consecutive timeline points.
#[derive(Clone, Copy, Debug)]
pub struct TimeSegment {
    start: Quantity,
    stop: Quantity,
}

impl TimeSegment {
    /// Only built by [`Timeline`], which guarantees start < stop.
    fn new(start: Quantity, stop: Quantity) -> Self {
        TimeSegment { start, stop }
    }

    pub fn start(&self) -> Quantity {
        self.start
    }

    pub fn stop(&self) -> Quantity {
        self.stop
    }

    pub fn duration(&self) -> Quantity {
        Quantity::seconds(self.stop.value() - self.start.value())
    }

    /// Closed-interval membership, boundaries included.
    pub fn contains(&self, time: Quantity) -> Result<bool, ComputeError> {
        let after_start = time.try_cmp(self.start)? != std::cmp::Ordering::Less;
        let before_stop = time.try_cmp(self.stop)? != std::cmp::Ordering::Greater;
        Ok(after_start && before_stop)
    }
}

/// Strictly increasing time points with a derived segment partition.
#[derive(Clone, Debug)]
pub struct Timeline {
    points: Vec<TimePoint>,
    segments: Vec<TimeSegment>,
}

impl Timeline {
    pub fn new(points: Vec<TimePoint>) -> Result<Self, ComputeError> {
        if points.is_empty() {
            return Err(ComputeError::EmptyTimeline);
        }
        for point in &points {
            point.time().expect_kind(Kind::Time)?;
        }
        for pair in points.windows(2) {
            if pair[0].time().try_cmp(pair[1].time())? != std::cmp::Ordering::Less {
                return Err(ComputeError::UnorderedTimeline);
            }
        }
        Ok(Self::from_validated(points))
    }

    pub fn from_times(times: Vec<Quantity>) -> Result<Self, ComputeError> {
        Timeline::new(times.into_iter().map(TimePoint::new).collect())
    }

    /// Points already known to be valid Time quantities in strict order.
    fn from_validated(points: Vec<TimePoint>) -> Self {
        let segments = points
            .windows(2)
            .map(|pair| TimeSegment::new(pair[0].time(), pair[1].time()))
            .collect();
        Timeline { points, segments }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<&TimePoint> {
        self.points.get(index)
    }

    pub fn time(&self, index: usize) -> Option<Quantity> {
        self.points.get(index).map(TimePoint::time)
    }

    pub fn first_time(&self) -> Option<Quantity> {
        self.points.first().map(TimePoint::time)
    }

    pub fn last_time(&self) -> Option<Quantity> {
        self.points.last().map(TimePoint::time)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimePoint> {
        self.points.iter()
    }

    pub fn times(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.points.iter().map(TimePoint::time)
    }

    /// The contiguous, non-overlapping partition of the full span.
    pub fn segments(&self) -> &[TimeSegment] {
        &self.segments
    }

    /// Sub-timeline over an index range; labels inside the range survive.
    pub fn slice(&self, range: Range<usize>) -> Timeline {
        Timeline::from_validated(self.points[range].to_vec())
    }

    /// Index of the point matching `time` within tolerance, if any.
    pub fn index_of(&self, time: Quantity) -> Result<Option<usize>, ComputeError> {
        for (index, point) in self.points.iter().enumerate() {
            if point.time().approx_eq(time)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Index of the first segment whose closed interval contains `time`.
    ///
    /// A time shared by two segments' boundary resolves to the earlier
    /// segment; callers rely on this tie-break.
    pub fn segment_index_for(&self, time: Quantity) -> Result<Option<usize>, ComputeError> {
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.contains(time)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    pub fn segment_for(&self, time: Quantity) -> Result<Option<&TimeSegment>, ComputeError> {
        Ok(self.segment_index_for(time)?.map(|index| &self.segments[index]))
    }

    /// Sub-timeline containing only the labeled points.
    pub fn named_profile(&self) -> Timeline {
        Timeline::from_validated(
            self.points
                .iter()
                .filter(|point| point.label().is_some())
                .cloned()
                .collect(),
        )
    }

    /// A new timeline holding every original point plus every multiple of
    /// `period` strictly inside the span. Original points, including labeled
    /// ones, are preserved exactly; only new interior samples are inserted.
    pub fn resample(&self, period: Quantity) -> Result<Timeline, ComputeError> {
        let period = period.expect_kind(Kind::Time)?;
        if period.value() <= 0.0 {
            return Err(ComputeError::InvalidSamplePeriod);
        }
        let step = period.value();
        let mut points = vec![self.points[0].clone()];
        for pair in self.points.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            let mut n = (previous.time().value() / step).floor() as i64 + 1;
            loop {
                let candidate = Quantity::seconds(n as f64 * step);
                if candidate.try_cmp(next.time())? != std::cmp::Ordering::Less {
                    break;
                }
                if !candidate.approx_eq(previous.time())? {
                    points.push(TimePoint::new(candidate));
                }
                n += 1;
            }
            points.push(next.clone());
        }
        Timeline::new(points)
    }
}
