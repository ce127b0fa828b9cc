//! # Window matching costs
//!
//! Scores a window of the left image against the right image at every candidate disparity,
//! either by the fraction of its edge pixels which land on (dilated) right image edges, or by
//! the sum of squared intensity differences.
//!
//! A left pixel at column `x` lands at column `x - d` in the right image. Both metrics scan
//! `d = 0..=max_disparity` and only accept strict improvements, so the smallest disparity wins
//! any tie.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;
use rand::Rng;

use crate::edges::EdgeMask;
use crate::window::Window;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Minimum best Hausdorff fraction for the edge metric to be trusted over L2.
pub const DEFAULT_HYBRID_FRACTION_THRESHOLD: f32 = 0.75;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Everything needed to score windows of one stereo pair.
pub struct MatchContext<'a> {
    pub left: &'a GrayImage,
    pub right: &'a GrayImage,

    /// Edges of the left image, bounding window growth and selecting pixels for Hausdorff.
    pub left_edges: &'a EdgeMask,

    /// Edges of the right image, already dilated.
    pub right_edges: &'a EdgeMask,

    pub max_disparity: usize
}

/// Which metric decided a window's disparity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Hausdorff,
    L2
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub disparity: u8,
    pub metric: Metric
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HausdorffMatch {
    pub disparity: u8,
    pub fraction: f32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct L2Match {
    pub disparity: u8,
    pub cost: u64
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl<'a> MatchContext<'a> {
    pub fn width(&self) -> usize {
        self.left.width() as usize
    }

    pub fn height(&self) -> usize {
        self.left.height() as usize
    }

    /// Sum of squared differences between the window and the right image shifted by `d`.
    ///
    /// Pixels whose shifted column falls at or before column 0 of the right image are compared
    /// against a uniformly random intensity instead, so pushing a window off the image is never
    /// free.
    pub fn l2_cost<R: Rng>(&self, window: &Window, d: usize, rng: &mut R) -> u64 {
        let left = self.left.as_raw();
        let right = self.right.as_raw();
        let width = self.width();

        let mut cost = 0u64;

        for y in window.y_min()..=window.y_max() {
            let row = y * width;
            for x in window.x_min()..=window.x_max() {
                let val_left = left[row + x] as i64;

                let val_right = match x > d {
                    true => right[row + x - d] as i64,
                    false => rng.gen::<u8>() as i64
                };

                let diff = val_left - val_right;
                cost += (diff * diff) as u64;
            }
        }

        cost
    }

    /// Disparity with the lowest L2 cost.
    pub fn best_l2<R: Rng>(&self, window: &Window, rng: &mut R) -> L2Match {
        let mut best = L2Match {
            disparity: 0,
            cost: u64::MAX
        };

        for d in 0..=self.max_disparity {
            let cost = self.l2_cost(window, d, rng);

            if cost < best.cost {
                best = L2Match {
                    disparity: d as u8,
                    cost
                };
            }
        }

        best
    }

    /// Number of left edge pixels inside the window.
    pub fn edge_count(&self, window: &Window) -> usize {
        window
            .pixels()
            .filter(|&(x, y)| self.left_edges.is_edge(x, y))
            .count()
    }

    /// Fraction of the window's left edge pixels which land on a right edge when shifted by `d`.
    ///
    /// Edges shifted to column 0 or beyond never match. Returns `None` if the window holds no edge
    /// pixels.
    pub fn hausdorff_fraction(&self, window: &Window, d: usize) -> Option<f32> {
        let num_edges = self.edge_count(window);
        if num_edges == 0 {
            return None;
        }

        Some(self.intersections(window, d) as f32 / num_edges as f32)
    }

    /// Disparity with the highest Hausdorff fraction, `None` if the window holds no edges.
    ///
    /// When no disparity matches a single edge the result is disparity 0 with fraction 0.
    pub fn best_hausdorff(&self, window: &Window) -> Option<HausdorffMatch> {
        let num_edges = self.edge_count(window);
        if num_edges == 0 {
            return None;
        }

        let mut best = HausdorffMatch {
            disparity: 0,
            fraction: 0.0
        };

        for d in 0..=self.max_disparity {
            let fraction = self.intersections(window, d) as f32 / num_edges as f32;

            if fraction > best.fraction {
                best = HausdorffMatch {
                    disparity: d as u8,
                    fraction
                };
            }
        }

        Some(best)
    }

    /// Pick a disparity for the window, trusting the Hausdorff metric only when the window has
    /// edges and its best fraction reaches `threshold`, and falling back to L2 otherwise.
    pub fn hybrid<R: Rng>(&self, window: &Window, threshold: f32, rng: &mut R) -> Decision {
        match self.best_hausdorff(window) {
            Some(hd) if hd.fraction >= threshold => Decision {
                disparity: hd.disparity,
                metric: Metric::Hausdorff
            },
            _ => Decision {
                disparity: self.best_l2(window, rng).disparity,
                metric: Metric::L2
            }
        }
    }

    fn intersections(&self, window: &Window, d: usize) -> usize {
        let width = self.width();
        let mut count = 0;

        for y in window.y_min()..=window.y_max() {
            let row = y * width;
            for x in window.x_min()..=window.x_max() {
                if self.left_edges.at(row + x) && x > d && self.right_edges.at(row + x - d) {
                    count += 1;
                }
            }
        }

        count
    }
}
