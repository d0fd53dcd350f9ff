//! Validated beat timeline

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Ordered beat onsets in seconds from the start of a track
///
/// Always finite, non-negative and non-decreasing; the constructor rejects
/// anything else rather than sorting it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct BeatTimeline(Vec<f64>);

impl BeatTimeline {
    pub fn new(beats: Vec<f64>) -> Result<Self, TimelineError> {
        let mut previous = 0.0;
        for (index, &value) in beats.iter().enumerate() {
            if !value.is_finite() {
                return Err(TimelineError::NonFinite { index });
            }
            if value < 0.0 {
                return Err(TimelineError::Negative { index, value });
            }
            if value < previous {
                return Err(TimelineError::OutOfOrder {
                    index,
                    previous,
                    value,
                });
            }
            previous = value;
        }
        Ok(Self(beats))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Seconds of the last beat, if any
    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl<'de> Deserialize<'de> for BeatTimeline {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let beats = Vec::<f64>::deserialize(deserializer)?;
        Self::new(beats).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Vec<f64>> for BeatTimeline {
    type Error = TimelineError;

    fn try_from(beats: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(beats)
    }
}
