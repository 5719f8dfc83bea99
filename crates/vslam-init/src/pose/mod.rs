//! Relative pose recovery from an estimated two-view model.
//!
//! A homography decomposes into eight pose hypotheses and a fundamental matrix
//! into four. Every hypothesis is checked by triangulating the model inliers;
//! the one with the most geometrically valid points wins, provided it is
//! clearly better than the others and the reconstruction has enough parallax.

mod candidates;
pub use candidates::*;

mod essential;
pub use essential::*;

mod homography;
pub use homography::*;

#[cfg(test)]
pub(crate) mod test_scene;
