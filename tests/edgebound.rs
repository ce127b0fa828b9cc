//! Test the edge-bounded voting disparity algorithm end to end

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use cv_edge_disparity::edgebound::{EdgeBounded, Params};
use cv_edge_disparity::edges::{detect_pair, GradientEdgeDetector};
use cv_edge_disparity::prelude::*;
use cv_edge_disparity::scheduler::StochasticScheduler;
use cv_edge_disparity::scorer::MatchContext;
use cv_edge_disparity::voting::VoteTable;
use image::{GrayImage, Luma};
use rand::{rngs::StdRng, Rng, SeedableRng};

// -----------------------------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------------------------

fn params(max_disparity: usize, iterations: usize) -> Params {
    Params {
        max_disparity,
        edge_threshold: 1000,
        dilation_radius: 0,
        num_voting_iterations: iterations,
        seed: Some(42),
        ..Params::default()
    }
}

/// A bright column at `x_bright`, darker to its west than to its east. Only the Sobel response
/// on its east flank, at `x_bright + 1`, exceeds 800.
fn column(width: u32, height: u32, x_bright: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, _| match x {
        x if x < x_bright => Luma([100]),
        x if x == x_bright => Luma([255]),
        _ => Luma([0])
    })
}

fn blocky_pair(width: u32, height: u32, shift: u32, seed: u64) -> StereoFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let stride = (width + shift) / 4 + 1;
    let blocks: Vec<u8> = (0..stride * (height / 4 + 1)).map(|_| rng.gen()).collect();

    let at = |x: u32, y: u32| Luma([blocks[((y / 4) * stride + x / 4) as usize]]);

    StereoFrame {
        left: GrayImage::from_fn(width, height, |x, y| at(x, y)),
        right: GrayImage::from_fn(width, height, |x, y| at(x + shift, y))
    }
}

// -----------------------------------------------------------------------------------------------
// SCENARIOS
// -----------------------------------------------------------------------------------------------

#[test]
fn identical_flat_images_give_zero_disparity() -> Result<()> {
    let frame = StereoFrame::new(
        GrayImage::from_pixel(4, 4, Luma([128])),
        GrayImage::from_pixel(4, 4, Luma([128]))
    )?;

    // Column 0 is compared against random intensities, so single passes can stray
    let mut disp = EdgeBounded::new(params(2, 21))?;
    let map = disp.compute(&frame)?;

    assert_eq!(map.width(), 4);
    assert_eq!(map.height(), 4);
    assert!(map.as_raw().iter().all(|&d| d == 0));

    // Without edges nothing can be decided by Hausdorff
    assert!(disp.pass_stats().iter().all(|s| s.hausdorff_windows == 0));

    Ok(())
}

#[test]
fn shifted_edge_column_is_matched_by_hausdorff() -> Result<()> {
    let frame = StereoFrame::new(column(12, 8, 6), column(12, 8, 4))?;

    let detector = GradientEdgeDetector::new(800.0);
    let left_edges = detector.find_edges(&frame.left).mask;
    assert_eq!(left_edges.count(), 8);
    assert!((0..8).all(|y| left_edges.is_edge(7, y)));

    let mut disp = EdgeBounded::new(Params {
        edge_threshold: 800,
        ..params(4, 5)
    })?;
    let map = disp.compute(&frame)?;

    for y in 0..8 {
        assert_eq!(map.get(7, y), 2, "edge pixel at row {}", y);
    }
    assert!(disp.pass_stats().iter().all(|s| s.hausdorff_windows > 0));

    Ok(())
}

// -----------------------------------------------------------------------------------------------
// ENSEMBLE PROPERTIES
// -----------------------------------------------------------------------------------------------

#[test]
fn output_stays_in_disparity_range() -> Result<()> {
    let frame = blocky_pair(40, 24, 3, 1);

    let mut disp = EdgeBounded::new(Params {
        edge_threshold: 200,
        dilation_radius: 1,
        ..params(6, 4)
    })?;
    let map = disp.compute(&frame)?;

    assert!(map.as_raw().iter().all(|&d| d <= 6));
    assert_eq!(disp.pass_stats().len(), 4);
    assert!(map.max_disp.map_or(false, |d| d <= 6));

    Ok(())
}

#[test]
fn fixed_seed_reproduces_the_map() -> Result<()> {
    let frame = blocky_pair(32, 20, 2, 2);
    let p = Params {
        edge_threshold: 200,
        ..params(5, 3)
    };

    let a = EdgeBounded::new(p.clone())?.compute(&frame)?;
    let b = EdgeBounded::new(p)?.compute(&frame)?;

    assert_eq!(a.as_raw(), b.as_raw());

    Ok(())
}

/// Rebuild the ensemble one pass at a time from the public pieces, in pass order.
fn serial_votes(frame: &StereoFrame, p: &Params) -> Result<Vec<u8>> {
    let detector = GradientEdgeDetector::new(p.edge_threshold as f32);
    let (left_edges, right_edges) = detect_pair(&detector, frame, p.dilation_radius)?;

    let ctx = MatchContext {
        left: &frame.left,
        right: &frame.right,
        left_edges: &left_edges,
        right_edges: &right_edges,
        max_disparity: p.max_disparity
    };
    let scheduler = StochasticScheduler::new(&ctx, p.hybrid_fraction_threshold);

    let base = p.seed.expect("seeded params");
    let mut votes = VoteTable::new(ctx.width() * ctx.height(), p.max_disparity);
    for i in 0..p.num_voting_iterations {
        let pass = scheduler.run(&mut StdRng::seed_from_u64(base.wrapping_add(i as u64)));
        votes.tally(&pass.disparities);
    }

    Ok(votes.finalize())
}

/// Holds for the serial and the `parallel` build alike.
#[test]
fn ensemble_matches_passes_folded_in_order() -> Result<()> {
    let frame = blocky_pair(36, 22, 3, 4);

    for &seed in [0u64, 17, u64::MAX].iter() {
        let p = Params {
            edge_threshold: 200,
            seed: Some(seed),
            ..params(6, 6)
        };

        let map = EdgeBounded::new(p.clone())?.compute(&frame)?;

        assert_eq!(map.as_raw(), &serial_votes(&frame, &p)?);
    }

    Ok(())
}

#[test]
fn stats_are_replaced_on_every_run() -> Result<()> {
    let frame = blocky_pair(16, 12, 1, 3);
    let mut disp = EdgeBounded::new(params(3, 2))?;

    disp.compute(&frame)?;
    disp.compute(&frame)?;

    assert_eq!(disp.pass_stats().len(), 2);
    assert!(disp.pass_stats().iter().all(|s| s.windows >= 1));

    Ok(())
}

// -----------------------------------------------------------------------------------------------
// ERRORS AND CONFIGURATION
// -----------------------------------------------------------------------------------------------

#[test]
fn mismatched_images_are_rejected() -> Result<()> {
    let frame = StereoFrame {
        left: GrayImage::new(8, 6),
        right: GrayImage::new(8, 5)
    };

    let mut disp = EdgeBounded::new(params(2, 1))?;

    match disp.compute(&frame) {
        Err(Error::DimensionMismatch { left, right }) => {
            assert_eq!(left, (8, 6));
            assert_eq!(right, (8, 5));
        }
        other => panic!("expected a dimension mismatch, got {:?}", other.map(|_| ())),
    }

    assert!(StereoFrame::new(GrayImage::new(3, 3), GrayImage::new(4, 3)).is_err());

    Ok(())
}

#[test]
fn out_of_range_params_are_rejected() {
    let bad = vec![
        Params { max_disparity: 0, ..params(1, 1) },
        Params { max_disparity: 256, ..params(1, 1) },
        Params { edge_threshold: 0, ..params(1, 1) },
        Params { num_voting_iterations: 0, ..params(1, 1) },
        Params { hybrid_fraction_threshold: 1.5, ..params(1, 1) },
        Params { hybrid_fraction_threshold: std::f32::NAN, ..params(1, 1) },
    ];

    for p in bad {
        match EdgeBounded::new(p.clone()) {
            Err(Error::InvalidParam { .. }) => (),
            _ => panic!("{:?} should be rejected", p),
        }
    }

    assert!(EdgeBounded::new(params(255, 1)).is_ok());
}

#[test]
fn params_parse_from_toml_with_defaults() -> Result<()> {
    let p = Params::from_toml_str(
        r#"
        max_disparity = 16
        edge_threshold = 20
        num_voting_iterations = 7
        "#
    )?;

    assert_eq!(p.max_disparity, 16);
    assert_eq!(p.edge_threshold, 20);
    assert_eq!(p.num_voting_iterations, 7);
    assert_eq!(p.dilation_radius, 1);
    assert_eq!(p.hybrid_fraction_threshold, 0.75);
    assert_eq!(p.seed, None);

    let seeded = Params::from_toml_str(
        r#"
        max_disparity = 8
        edge_threshold = 5
        num_voting_iterations = 1
        dilation_radius = 0
        hybrid_fraction_threshold = 0.5
        seed = 99
        "#
    )?;

    assert_eq!(seeded.seed, Some(99));
    assert_eq!(seeded.dilation_radius, 0);

    Ok(())
}

#[test]
fn params_from_toml_are_validated() {
    let res = Params::from_toml_str(
        r#"
        max_disparity = 300
        edge_threshold = 20
        num_voting_iterations = 7
        "#
    );
    assert!(matches!(res, Err(Error::InvalidParam { name: "max_disparity", .. })));

    let res = Params::from_toml_str("max_disparity = \"lots\"");
    assert!(matches!(res, Err(Error::Config(_))));
}

#[test]
fn params_load_from_file() -> Result<()> {
    let path = std::env::temp_dir().join("cv_edge_disparity_params_test.toml");
    std::fs::write(
        &path,
        "max_disparity = 10\nedge_threshold = 30\nnum_voting_iterations = 2\n"
    )?;

    let p = Params::from_file(&path)?;
    std::fs::remove_file(&path)?;

    assert_eq!(p.max_disparity, 10);
    assert_eq!(p.num_voting_iterations, 2);

    assert!(matches!(
        Params::from_file(std::env::temp_dir().join("cv_edge_disparity_missing.toml")),
        Err(Error::Io(_))
    ));

    Ok(())
}

#[test]
fn normalised_output_stretches_to_full_range() -> Result<()> {
    let frame = StereoFrame::new(column(12, 8, 6), column(12, 8, 4))?;
    let map = EdgeBounded::new(Params {
        edge_threshold: 800,
        ..params(4, 3)
    })?
    .compute(&frame)?;

    let max = map.max_disp.expect("map has values");
    assert!(max >= 2);

    let stretched = map.to_luma_normalised();
    assert_eq!(stretched.get_pixel(7, 0)[0], (2.0 * (255.0 / max as f32)) as u8);
    assert_eq!(map.to_luma().get_pixel(7, 0)[0], 2);

    Ok(())
}

#[test]
fn normalisation_uses_the_largest_disparity_present() {
    let map = DisparityMap::from_raw(3, 1, vec![0, 1, 3]);

    assert_eq!(map.max_disp, Some(3));
    assert_eq!(map.min_disp, Some(0));

    let stretched = map.to_luma_normalised();
    assert_eq!(stretched.get_pixel(2, 0)[0], 255);
    assert_eq!(stretched.get_pixel(1, 0)[0], 85);

    let flat = DisparityMap::from_raw(2, 1, vec![0, 0]).to_luma_normalised();
    assert!(flat.as_raw().iter().all(|&v| v == 0));
}
