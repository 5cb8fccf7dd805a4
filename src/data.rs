//! Samples, data points and the session history.

/// One reading from the DAQ: the two receiver channel voltages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSample {
    pub a: f64,
    pub b: f64,
}

/// One reading from the declinometer (raw sensor units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeclinometerSample {
    pub raw: f64,
}

/// A fused, timestamped measurement.  Built once per tick when both
/// readers delivered a fresh sample; never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    /// Sidereal seconds since the clock's anchor.
    pub sidereal_timestamp: f64,
    /// Calibrated declination (degrees).
    pub declination: f64,
    pub channel_a: f64,
    pub channel_b: f64,
}

/// Append-only record of every data point taken this session.
#[derive(Debug, Default)]
pub struct History {
    points: Vec<DataPoint>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: DataPoint) {
        self.points.push(point);
    }

    /// Most recent point, if any.
    pub fn latest(&self) -> Option<&DataPoint> {
        self.points.last()
    }

    pub fn as_slice(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
