use serde::Serialize;

use crate::descriptor::Descriptor;
use crate::distance::{distance, match_percent, similarity_percent};
use crate::error::Result;

/// Outcome of a one-to-one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verification {
    pub is_match: bool,
    pub distance: f32,
    /// Similarity in `[0, 100]`.
    pub score: f32,
}

impl Verification {
    pub fn percent(&self) -> u8 {
        match_percent(self.distance)
    }
}

/// Compare `probe` against a single `reference`.
///
/// A distance exactly equal to `threshold` is not a match.
pub fn verify(reference: &Descriptor, probe: &Descriptor, threshold: f32) -> Result<Verification> {
    let d = distance(reference, probe)?;
    Ok(Verification {
        is_match: d < threshold,
        distance: d,
        score: similarity_percent(d),
    })
}

/// An enrolled reference face checked against live probes.
#[derive(Debug, Clone)]
pub struct Verifier {
    reference: Descriptor,
    threshold: f32,
}

impl Verifier {
    pub fn new(reference: Descriptor, threshold: f32) -> Self {
        Self {
            reference,
            threshold,
        }
    }

    pub fn reference(&self) -> &Descriptor {
        &self.reference
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn check(&self, probe: &Descriptor) -> Result<Verification> {
        verify(&self.reference, probe, self.threshold)
    }

    /// Verify the first face detected in a frame.
    ///
    /// Returns `None` when the frame has no faces.
    pub fn check_frame(&self, faces: &[Descriptor]) -> Result<Option<Verification>> {
        faces.first().map(|probe| self.check(probe)).transpose()
    }
}
