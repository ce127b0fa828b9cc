//! # Edge-bounded Disparity Computation
//!
//! This crate provides dense disparity map computation for rectified grayscale stereo pairs,
//! using windows bounded by image edges and a voting ensemble over randomised partitions.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod disparity;
mod error;
pub mod edgebound;
pub mod edges;
pub mod fixed_window;
pub mod scheduler;
pub mod scorer;
pub mod voting;
pub mod window;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap, StereoFrame};
    pub use crate::edges::{EdgeDetector, EdgeMap, EdgeMask};
    pub use crate::error::{Error, Result};
}
