//! Pitch envelope contours.
//!
//! A contour is an ordered list of `(position%, pitch-variation%)` points
//! applied across a spoken unit. Positions conventionally run from 0 to
//! 100 but this is not enforced.

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

/// One point of a pitch contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePoint {
    /// Position within the phoneme, in percent of its duration.
    pub position: f32,
    /// Pitch at this position, in percent of the base pitch.
    pub pitch_variation: f32,
}

impl EnvelopePoint {
    pub const fn new(position: f32, pitch_variation: f32) -> Self {
        Self {
            position,
            pitch_variation,
        }
    }
}

/// Non-empty ordered pitch contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EnvelopePoint>", into = "Vec<EnvelopePoint>")]
pub struct Envelope {
    points: Vec<EnvelopePoint>,
}

impl Envelope {
    /// Build a contour, rejecting an empty point list.
    pub fn new(points: Vec<EnvelopePoint>) -> SynthResult<Self> {
        if points.is_empty() {
            return Err(SynthError::InvalidEnvelope(
                "contour must contain at least one point".to_string(),
            ));
        }
        if let Some(bad) = points
            .iter()
            .find(|p| !p.position.is_finite() || !p.pitch_variation.is_finite())
        {
            return Err(SynthError::InvalidEnvelope(format!(
                "non-finite point ({}, {})",
                bad.position, bad.pitch_variation
            )));
        }
        Ok(Self { points })
    }

    /// The flat two-point contour `[(0, 100), (100, 100)]`.
    pub fn flat() -> Self {
        Self {
            points: vec![EnvelopePoint::new(0.0, 100.0), EnvelopePoint::new(100.0, 100.0)],
        }
    }

    pub fn points(&self) -> &[EnvelopePoint] {
        &self.points
    }

    /// The trailing point, whose pitch carries forward to the next phoneme.
    pub fn last(&self) -> EnvelopePoint {
        // Non-empty by construction.
        self.points[self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::flat()
    }
}

impl TryFrom<Vec<EnvelopePoint>> for Envelope {
    type Error = SynthError;

    fn try_from(points: Vec<EnvelopePoint>) -> SynthResult<Self> {
        Self::new(points)
    }
}

impl From<Envelope> for Vec<EnvelopePoint> {
    fn from(envelope: Envelope) -> Self {
        envelope.points
    }
}
