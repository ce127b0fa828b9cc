//! # Stochastic window covering
//!
//! One pass of the edge-bounded matcher: windows are seeded at random unassigned pixels and
//! grown until the whole image is partitioned, each window taking a single disparity.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::debug;
use rand::Rng;

use crate::scorer::{MatchContext, Metric};
use crate::window::{self, Window};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct StochasticScheduler<'a> {
    ctx: &'a MatchContext<'a>,
    hybrid_fraction_threshold: f32
}

/// Result of one full covering of the image.
pub struct Pass {
    /// Disparity of every pixel in row-major order.
    pub disparities: Vec<u8>,

    /// The windows in the order they were grown. Pairwise disjoint, covering the image.
    pub windows: Vec<Window>,

    pub stats: PassStats
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    pub windows: usize,

    /// How many of the windows took their disparity from the Hausdorff metric.
    pub hausdorff_windows: usize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl<'a> StochasticScheduler<'a> {
    pub fn new(ctx: &'a MatchContext<'a>, hybrid_fraction_threshold: f32) -> Self {
        Self {
            ctx,
            hybrid_fraction_threshold
        }
    }

    /// Cover the image with edge-bounded windows in an order drawn from `rng`.
    pub fn run<R: Rng>(&self, rng: &mut R) -> Pass {
        let width = self.ctx.width();
        let height = self.ctx.height();
        let num_pixels = width * height;

        let mut assigned: Vec<Option<u8>> = vec![None; num_pixels];
        let mut windows = Vec::new();
        let mut stats = PassStats::default();
        let mut covered = 0;

        while covered < num_pixels {
            let (x, y) = self.next_seed(&assigned, rng);

            let grown = window::grow(x, y, self.ctx.left_edges, &assigned);
            let win = grown.window;

            let decision = self.ctx.hybrid(&win, self.hybrid_fraction_threshold, rng);
            if decision.metric == Metric::Hausdorff {
                stats.hausdorff_windows += 1;
            }

            for (wx, wy) in win.pixels() {
                assigned[wy * width + wx] = Some(decision.disparity);
            }

            covered += win.area();
            windows.push(win);
        }

        stats.windows = windows.len();

        debug!(
            "Covered {}x{} image with {} windows ({} decided by Hausdorff)",
            width, height, stats.windows, stats.hausdorff_windows
        );

        // Every pixel is owned by exactly one window once covered reaches num_pixels
        let disparities = assigned.into_iter().map(|d| d.unwrap_or(0)).collect();

        Pass {
            disparities,
            windows,
            stats
        }
    }

    /// Draw a random interior pixel, walking forward through the buffer (wrapping at the end)
    /// until an unassigned one is found.
    ///
    /// Only called while at least one pixel is unassigned.
    fn next_seed<R: Rng>(&self, assigned: &[Option<u8>], rng: &mut R) -> (usize, usize) {
        let width = self.ctx.width();
        let height = self.ctx.height();

        let y = match height >= 3 {
            true => rng.gen_range(1..height - 1),
            false => rng.gen_range(0..height)
        };
        let x = match width >= 3 {
            true => rng.gen_range(1..width - 1),
            false => rng.gen_range(0..width)
        };

        let mut i = y * width + x;
        while assigned[i].is_some() {
            i += 1;
            if i >= assigned.len() {
                i = 0;
            }
        }

        (i % width, i / width)
    }
}
