//! # Edge maps
//!
//! Binary edge masks, the detectors that produce them and the dilation used to pad the right
//! image's edges before Hausdorff matching.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;
use imageproc::{edges::canny, gradients};
use log::debug;

use crate::disparity::StereoFrame;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A binary edge mask with the same dimensions as the image it was computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMask {
    width: usize,
    height: usize,
    data: Vec<bool>
}

/// Output of an edge detector.
pub struct EdgeMap {
    pub mask: EdgeMask,

    /// Per-pixel edge orientation in radians, only meaningful where the mask is set. Not every
    /// detector provides one, and the matchers in this crate do not read it.
    pub orientation: Option<Vec<f32>>
}

/// Marks pixels whose Sobel gradient magnitude is strictly above `threshold`.
#[derive(Clone, Copy, Debug)]
pub struct GradientEdgeDetector {
    pub threshold: f32
}

/// Canny edge detection with hysteresis thresholds.
#[derive(Clone, Copy, Debug)]
pub struct CannyEdgeDetector {
    pub low: f32,
    pub high: f32
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// Something which can find the edges in a grayscale image.
///
/// Higher thresholds should yield fewer edges.
pub trait EdgeDetector {
    fn find_edges(&self, image: &GrayImage) -> EdgeMap;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl EdgeMask {
    /// An empty mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height]
        }
    }

    /// Build a mask from a row-major buffer, returns `None` if the length is not
    /// `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<bool>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }

        Some(Self { width, height, data })
    }

    /// Build a mask by evaluating `f` at every pixel.
    pub fn from_fn<F: FnMut(usize, usize) -> bool>(width: usize, height: usize, mut f: F) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }

        Self { width, height, data }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    /// Edge flag at a row-major index.
    #[inline]
    pub fn at(&self, i: usize) -> bool {
        self.data[i]
    }

    pub fn set(&mut self, x: usize, y: usize, val: bool) {
        self.data[y * self.width + x] = val;
    }

    /// Number of edge pixels in the mask.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&e| e).count()
    }

    /// Grow the mask outward by `radius` pixels.
    ///
    /// Each step turns a pixel on if any of its 4-connected neighbours was on at the end of the
    /// previous step. The outermost border of the image is never modified.
    pub fn dilate(&mut self, radius: usize) {
        let w = self.width;
        let h = self.height;

        if w < 3 || h < 3 {
            return;
        }

        let mut prev = self.data.clone();

        for _ in 0..radius {
            prev.copy_from_slice(&self.data);

            for y in 1..(h - 1) {
                for x in 1..(w - 1) {
                    let i = y * w + x;

                    if !prev[i] && (prev[i - 1] || prev[i + 1] || prev[i - w] || prev[i + w]) {
                        self.data[i] = true;
                    }
                }
            }
        }
    }

    /// Return a dilated copy of this mask.
    pub fn dilated(&self, radius: usize) -> Self {
        let mut new = self.clone();
        new.dilate(radius);
        new
    }

    /// Render the mask as an image, edges white, for debugging.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            match self.is_edge(x as usize, y as usize) {
                true => image::Luma([255]),
                false => image::Luma([0])
            }
        })
    }
}

impl GradientEdgeDetector {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl EdgeDetector for GradientEdgeDetector {
    fn find_edges(&self, image: &GrayImage) -> EdgeMap {
        let gx = gradients::horizontal_sobel(image);
        let gy = gradients::vertical_sobel(image);

        let width = image.width() as usize;
        let height = image.height() as usize;
        let mut orientation = vec![0.0f32; width * height];

        let mask = EdgeMask::from_fn(width, height, |x, y| {
            let dx = gx.get_pixel(x as u32, y as u32)[0] as f32;
            let dy = gy.get_pixel(x as u32, y as u32)[0] as f32;

            let edge = (dx * dx + dy * dy).sqrt() > self.threshold;
            if edge {
                orientation[y * width + x] = dy.atan2(dx);
            }

            edge
        });

        EdgeMap {
            mask,
            orientation: Some(orientation)
        }
    }
}

impl CannyEdgeDetector {
    pub fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }
}

impl EdgeDetector for CannyEdgeDetector {
    fn find_edges(&self, image: &GrayImage) -> EdgeMap {
        let edges = canny(image, self.low, self.high);

        let mask = EdgeMask::from_fn(
            edges.width() as usize,
            edges.height() as usize,
            |x, y| edges.get_pixel(x as u32, y as u32)[0] > 0
        );

        EdgeMap {
            mask,
            orientation: None
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Detect edges in both images of a frame, dilating the right mask by `dilation_radius`.
///
/// Returns `(left, right)`.
pub fn detect_pair<D: EdgeDetector + ?Sized>(
    detector: &D,
    frame: &StereoFrame,
    dilation_radius: usize
) -> Result<(EdgeMask, EdgeMask)> {
    let left = checked_mask(detector, &frame.left)?;
    let mut right = checked_mask(detector, &frame.right)?;

    debug!("Found {} left edges and {} right edges", left.count(), right.count());

    right.dilate(dilation_radius);

    debug!("Dilated right edges by {}, now {} edges", dilation_radius, right.count());

    Ok((left, right))
}

fn checked_mask<D: EdgeDetector + ?Sized>(detector: &D, image: &GrayImage) -> Result<EdgeMask> {
    let mask = detector.find_edges(image).mask;

    let expected = (image.width() as usize, image.height() as usize);
    let got = (mask.width(), mask.height());

    if expected != got {
        return Err(Error::EdgeMapMismatch { expected, got });
    }

    Ok(mask)
}
