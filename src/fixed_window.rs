//! # Fixed window disparity computation
//!
//! Classic local-window stereo: every pixel far enough from the border is matched using a
//! square window centred on it, scored with the same Hausdorff/L2 hybrid as the edge-bounded
//! matcher, or by L2 alone. Pixels whose window would leave the image are given disparity 0.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;

use crate::disparity::{DisparityAlgorithm, DisparityMap, StereoFrame};
use crate::edgebound::{validate_fraction_threshold, validate_max_disparity};
use crate::edges::{detect_pair, EdgeDetector, EdgeMask, GradientEdgeDetector};
use crate::error::*;
use crate::scorer::{Decision, MatchContext, Metric, DEFAULT_HYBRID_FRACTION_THRESHOLD};
use crate::window::Window;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct FixedWindow<D = GradientEdgeDetector> {
    params: Params,
    detector: D
}

/// How each window's disparity is chosen.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Matching {
    /// Hausdorff edge matching, falling back to L2 below the fraction threshold.
    Hybrid,

    /// Plain L2 block correlation, edges are not detected at all.
    L2
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Params {
    /// Side length of the square matching window.
    pub window_size: usize,
    pub max_disparity: usize,
    pub edge_threshold: u32,

    #[serde(default = "default_dilation_radius")]
    pub dilation_radius: usize,

    #[serde(default = "default_hybrid_fraction_threshold")]
    pub hybrid_fraction_threshold: f32,

    #[serde(default)]
    pub matching: Matching,

    /// Seeds the intensities substituted for off-image pixels in the L2 metric.
    #[serde(default)]
    pub seed: Option<u64>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Matching {
    fn default() -> Self {
        Matching::Hybrid
    }
}

impl Params {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;

        Ok(params)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::invalid("window_size", "must be at least 1"));
        }

        validate_max_disparity(self.max_disparity)?;

        if self.edge_threshold == 0 {
            return Err(Error::invalid("edge_threshold", "must be greater than 0"));
        }

        validate_fraction_threshold(self.hybrid_fraction_threshold)
    }

    /// Extents `(north/west, south/east)` of the window around its centre. Even sizes reach
    /// one pixel further to the north and west.
    fn extents(&self) -> (usize, usize) {
        let half = self.window_size / 2;

        match self.window_size % 2 {
            0 => (half, half - 1),
            _ => (half, half)
        }
    }
}

impl FixedWindow<GradientEdgeDetector> {
    pub fn new(params: Params) -> Result<Self> {
        let detector = GradientEdgeDetector::new(params.edge_threshold as f32);
        Self::with_detector(params, detector)
    }
}

impl<D: EdgeDetector> FixedWindow<D> {
    pub fn with_detector(params: Params, detector: D) -> Result<Self> {
        params.validate()?;

        Ok(Self { params, detector })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl<D: EdgeDetector> DisparityAlgorithm for FixedWindow<D> {
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap> {
        frame.check_dimensions()?;

        let width = frame.width() as usize;
        let height = frame.height() as usize;

        let mut disp_map = DisparityMap::new(width, height);

        let (left_edges, right_edges) = match self.params.matching {
            Matching::Hybrid => detect_pair(&self.detector, frame, self.params.dilation_radius)?,
            Matching::L2 => (EdgeMask::new(width, height), EdgeMask::new(width, height))
        };

        let ctx = MatchContext {
            left: &frame.left,
            right: &frame.right,
            left_edges: &left_edges,
            right_edges: &right_edges,
            max_disparity: self.params.max_disparity
        };

        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy()
        };

        let (before, after) = self.params.extents();
        let mut hausdorff_pixels = 0usize;

        info!("Computing fixed window disparities");

        // Only centres whose whole window lies inside the image
        if width > before + after && height > before + after {
            for y in before..(height - after) {
                for x in before..(width - after) {
                    let window = Window {
                        x,
                        y,
                        north: before,
                        south: after,
                        west: before,
                        east: after
                    };

                    let decision = match self.params.matching {
                        Matching::Hybrid => ctx.hybrid(
                            &window,
                            self.params.hybrid_fraction_threshold,
                            &mut rng
                        ),
                        Matching::L2 => Decision {
                            disparity: ctx.best_l2(&window, &mut rng).disparity,
                            metric: Metric::L2
                        }
                    };

                    if decision.metric == Metric::Hausdorff {
                        hausdorff_pixels += 1;
                    }

                    disp_map.put(x, y, decision.disparity);
                }
            }
        }

        debug!("{} pixels decided by Hausdorff", hausdorff_pixels);

        let (min_disp, max_disp) = {
            let raw = disp_map.as_raw();
            (raw.iter().copied().min(), raw.iter().copied().max())
        };
        disp_map.min_disp = min_disp;
        disp_map.max_disp = max_disp;

        Ok(disp_map)
    }
}

fn default_dilation_radius() -> usize {
    1
}

fn default_hybrid_fraction_threshold() -> f32 {
    DEFAULT_HYBRID_FRACTION_THRESHOLD
}
