//! # Edge-bounded voting disparity computation
//!
//! Partitions the left image into windows bounded by its edges, seeded in random order, and
//! gives each window a single disparity chosen by a hybrid of Hausdorff edge matching and L2
//! block correlation. Several independent partitions vote on the final disparity of each pixel,
//! smoothing out the noise any single random partition introduces.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::disparity::{DisparityAlgorithm, DisparityMap, StereoFrame};
use crate::edges::{detect_pair, EdgeDetector, GradientEdgeDetector};
use crate::error::*;
use crate::scheduler::{PassStats, StochasticScheduler};
use crate::scorer::{MatchContext, DEFAULT_HYBRID_FRACTION_THRESHOLD};
use crate::voting::VoteTable;

#[cfg(feature = "statistics")]
use plotters::prelude::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct EdgeBounded<D = GradientEdgeDetector> {
    params: Params,
    detector: D,
    pass_stats: Vec<PassStats>
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Params {
    /// Largest disparity considered, at most 255 since the output map is 8-bit.
    pub max_disparity: usize,

    /// Threshold handed to the default edge detector, higher values find fewer edges.
    pub edge_threshold: u32,

    /// Radius by which the right image's edges are dilated before Hausdorff matching.
    #[serde(default = "default_dilation_radius")]
    pub dilation_radius: usize,

    /// Number of independent passes voting on each pixel.
    pub num_voting_iterations: usize,

    #[serde(default = "default_hybrid_fraction_threshold")]
    pub hybrid_fraction_threshold: f32,

    /// Seed of the first pass, pass `i` uses `seed + i`. Random if not given.
    #[serde(default)]
    pub seed: Option<u64>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            max_disparity: 16,
            edge_threshold: 20,
            dilation_radius: default_dilation_radius(),
            num_voting_iterations: 5,
            hybrid_fraction_threshold: default_hybrid_fraction_threshold(),
            seed: None
        }
    }
}

impl Params {
    /// Parse parameters from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;

        Ok(params)
    }

    /// Load parameters from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        validate_max_disparity(self.max_disparity)?;

        if self.edge_threshold == 0 {
            return Err(Error::invalid("edge_threshold", "must be greater than 0"));
        }

        if self.num_voting_iterations == 0 {
            return Err(Error::invalid("num_voting_iterations", "must be at least 1"));
        }

        validate_fraction_threshold(self.hybrid_fraction_threshold)
    }
}

impl EdgeBounded<GradientEdgeDetector> {
    /// Create a new instance of the algorithm with the given parameters, detecting edges by
    /// gradient magnitude above `edge_threshold`.
    pub fn new(params: Params) -> Result<Self> {
        let detector = GradientEdgeDetector::new(params.edge_threshold as f32);
        Self::with_detector(params, detector)
    }
}

impl<D: EdgeDetector> EdgeBounded<D> {
    /// Create a new instance of the algorithm using the given edge detector.
    pub fn with_detector(params: Params, detector: D) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            params,
            detector,
            pass_stats: Vec::new()
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Statistics of each pass of the most recent `compute` call.
    pub fn pass_stats(&self) -> &[PassStats] {
        &self.pass_stats
    }

    /// Run every pass and tally their votes, returning the table and per-pass statistics in
    /// pass order.
    #[cfg(not(feature = "parallel"))]
    fn run_passes(&self, ctx: &MatchContext, base_seed: u64) -> (VoteTable, Vec<PassStats>) {
        let scheduler = StochasticScheduler::new(ctx, self.params.hybrid_fraction_threshold);

        let mut votes = VoteTable::new(ctx.width() * ctx.height(), self.params.max_disparity);
        let mut stats = Vec::with_capacity(self.params.num_voting_iterations);

        for i in 0..self.params.num_voting_iterations {
            let pass = scheduler.run(&mut pass_rng(base_seed, i));

            votes.tally(&pass.disparities);
            stats.push(pass.stats);

            debug!("Pass {} tallied", i);
        }

        (votes, stats)
    }

    /// Run every pass concurrently, each on its own generator, and tally their votes.
    #[cfg(feature = "parallel")]
    fn run_passes(&self, ctx: &MatchContext, base_seed: u64) -> (VoteTable, Vec<PassStats>) {
        let scheduler = StochasticScheduler::new(ctx, self.params.hybrid_fraction_threshold);

        let num_pixels = ctx.width() * ctx.height();
        let max_disparity = self.params.max_disparity;
        let empty = || (VoteTable::new(num_pixels, max_disparity), Vec::new());

        let (votes, mut stats) = (0..self.params.num_voting_iterations)
            .into_par_iter()
            .fold(empty, |(mut table, mut stats), i| {
                let pass = scheduler.run(&mut pass_rng(base_seed, i));

                table.tally(&pass.disparities);
                stats.push((i, pass.stats));

                debug!("Pass {} tallied", i);

                (table, stats)
            })
            .reduce(empty, |(mut table, mut stats), (other, other_stats)| {
                table.merge(&other);
                stats.extend(other_stats);
                (table, stats)
            });

        stats.sort_by_key(|&(i, _)| i);

        (votes, stats.into_iter().map(|(_, s)| s).collect())
    }

    /// Plot the windows grown in each pass of the last run.
    #[cfg(feature = "statistics")]
    fn plot_stats(&self) -> Result<()> {
        fn err<E: std::fmt::Debug>(e: E) -> Error {
            Error::Statistics(format!("{:?}", e))
        }

        std::fs::create_dir_all("plots/edgebound")?;

        let max_windows = self.pass_stats
            .iter()
            .map(|s| s.windows)
            .max()
            .unwrap_or(0);

        let windows_plot = BitMapBackend::new(
            "plots/edgebound/windows.png",
            (800, 600)
        ).into_drawing_area();
        windows_plot.fill(&WHITE).map_err(err)?;

        let mut chart = ChartBuilder::on(&windows_plot)
            .caption("Windows per pass", ("sans-serif", 20).into_font())
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(30)
            .build_ranged(
                0..self.pass_stats.len(),
                0..(max_windows + 1)
            ).map_err(err)?;

        chart.configure_mesh().draw().map_err(err)?;

        chart
            .draw_series(LineSeries::new(
                self.pass_stats.iter().enumerate().map(|(i, s)| (i, s.windows)),
                &RED
            )).map_err(err)?
            .label("Windows")
            .legend(|(x, y)|
                PathElement::new(vec![(x, y), (x + 20, y)], &RED
            ));
        chart
            .draw_series(LineSeries::new(
                self.pass_stats.iter().enumerate().map(|(i, s)| (i, s.hausdorff_windows)),
                &BLUE
            )).map_err(err)?
            .label("Decided by Hausdorff")
            .legend(|(x, y)|
                PathElement::new(vec![(x, y), (x + 20, y)], &BLUE
            ));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw().map_err(err)?;

        info!("Stats plotting complete");

        Ok(())
    }
}

impl<D: EdgeDetector> DisparityAlgorithm for EdgeBounded<D> {
    /// Compute the disparity map for the given frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap> {
        frame.check_dimensions()?;

        let width = frame.width() as usize;
        let height = frame.height() as usize;

        // ---- EDGES ----

        info!("Finding edges");
        let (left_edges, right_edges) = detect_pair(
            &self.detector,
            frame,
            self.params.dilation_radius
        )?;

        // ---- VOTING PASSES ----

        let ctx = MatchContext {
            left: &frame.left,
            right: &frame.right,
            left_edges: &left_edges,
            right_edges: &right_edges,
            max_disparity: self.params.max_disparity
        };

        let base_seed = self.params.seed.unwrap_or_else(rand::random);

        info!(
            "Running {} stereo passes with base seed {}",
            self.params.num_voting_iterations, base_seed
        );
        let (votes, stats) = self.run_passes(&ctx, base_seed);
        self.pass_stats = stats;

        // ---- VOTE WINNERS ----

        info!("Finding vote winners");
        let disp_map = DisparityMap::from_raw(width, height, votes.finalize());
        debug!(
            "Voted disparities span {:?} to {:?} over {} passes",
            disp_map.min_disp, disp_map.max_disp, votes.passes()
        );

        #[cfg(feature = "statistics")]
        self.plot_stats()?;

        Ok(disp_map)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// The independent generator of one pass.
fn pass_rng(base_seed: u64, pass: usize) -> StdRng {
    StdRng::seed_from_u64(base_seed.wrapping_add(pass as u64))
}

fn default_dilation_radius() -> usize {
    1
}

fn default_hybrid_fraction_threshold() -> f32 {
    DEFAULT_HYBRID_FRACTION_THRESHOLD
}

pub(crate) fn validate_max_disparity(max_disparity: usize) -> Result<()> {
    if max_disparity == 0 || max_disparity > u8::MAX as usize {
        return Err(Error::invalid("max_disparity", "must lie in 1..=255"));
    }

    Ok(())
}

pub(crate) fn validate_fraction_threshold(threshold: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::invalid(
            "hybrid_fraction_threshold",
            format!("must lie in [0, 1], got {}", threshold)
        ));
    }

    Ok(())
}
