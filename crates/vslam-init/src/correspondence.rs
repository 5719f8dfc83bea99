use glam::DVec2;

use crate::error::InitError;

/// Index-aligned 2D point correspondences between a reference and a target image.
///
/// Entry `i` of [`Correspondences::reference`] and entry `i` of
/// [`Correspondences::target`] always describe the same physical match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Correspondences {
    reference: Vec<DVec2>,
    target: Vec<DVec2>,
}

impl Correspondences {
    /// Create a correspondence set, checking that both sequences are aligned.
    pub fn new(reference: Vec<DVec2>, target: Vec<DVec2>) -> Result<Self, InitError> {
        check_lengths("reference", reference.len(), "target", target.len())?;
        Ok(Self { reference, target })
    }

    /// Points observed in the reference image.
    pub fn reference(&self) -> &[DVec2] {
        &self.reference
    }

    /// Points observed in the target image.
    pub fn target(&self) -> &[DVec2] {
        &self.target
    }

    /// Number of correspondences.
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Iterate over `(reference, target)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        self.reference.iter().copied().zip(self.target.iter().copied())
    }

    /// Keep the correspondences flagged in `mask`.
    ///
    /// The result is a new set; the source is left untouched.
    pub fn filter_inliers(&self, mask: &[bool]) -> Result<Self, InitError> {
        check_lengths("correspondences", self.len(), "mask", mask.len())?;
        let (reference, target) = self
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(pair, _)| pair)
            .unzip();
        Ok(Self { reference, target })
    }
}

/// Metadata of a single descriptor match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureMatch {
    /// Keypoint index in the reference image.
    pub reference_index: usize,
    /// Keypoint index in the target image.
    pub target_index: usize,
    /// Descriptor distance.
    pub distance: f32,
}

/// Output of a feature matcher: matched keypoint positions plus match metadata,
/// all three sequences index-aligned.
#[derive(Clone, Debug, Default)]
pub struct MatchSet {
    /// Keypoint positions in the reference image.
    pub reference: Vec<DVec2>,
    /// Keypoint positions in the target image.
    pub target: Vec<DVec2>,
    /// Per-correspondence match metadata.
    pub matches: Vec<FeatureMatch>,
}

impl MatchSet {
    /// Check that the three sequences have the same length.
    pub fn validate(&self) -> Result<(), InitError> {
        check_lengths("reference", self.reference.len(), "target", self.target.len())?;
        check_lengths("reference", self.reference.len(), "matches", self.matches.len())
    }
}

pub(crate) fn check_lengths(
    left_name: &'static str,
    left_len: usize,
    right_name: &'static str,
    right_len: usize,
) -> Result<(), InitError> {
    if left_len != right_len {
        return Err(InitError::MismatchedArrayLengths {
            left_name,
            left_len,
            right_name,
            right_len,
        });
    }
    Ok(())
}
