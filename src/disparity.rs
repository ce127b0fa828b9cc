//! # General disparity objects
//!
//! This module provides generic disparity traits and structures for use by different algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A rectified pair of single channel images.
pub struct StereoFrame {
    pub left: GrayImage,
    pub right: GrayImage
}

/// An integer disparity map, one 8-bit disparity per pixel.
pub struct DisparityMap {
    data: GrayImage,
    pub max_disp: Option<u8>,
    pub min_disp: Option<u8>
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the given stereo frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StereoFrame {
    /// Build a frame, checking that both images have the same dimensions.
    pub fn new(left: GrayImage, right: GrayImage) -> Result<Self> {
        let frame = Self { left, right };
        frame.check_dimensions()?;

        Ok(frame)
    }

    pub fn width(&self) -> u32 {
        self.left.width()
    }

    pub fn height(&self) -> u32 {
        self.left.height()
    }

    /// Returns an error if the left and right images differ in size.
    ///
    /// The fields are public so a frame may have been assembled without going through `new`,
    /// which is why every algorithm calls this before touching any pixel.
    pub fn check_dimensions(&self) -> Result<()> {
        if self.left.dimensions() != self.right.dimensions() {
            return Err(Error::DimensionMismatch {
                left: self.left.dimensions(),
                right: self.right.dimensions()
            });
        }

        Ok(())
    }
}

impl DisparityMap {
    pub fn new(width: usize, height: usize) -> Self {
        DisparityMap {
            data: GrayImage::new(width as u32, height as u32),
            min_disp: None,
            max_disp: None
        }
    }

    /// Build a map from a row-major buffer of disparities, recording the observed range.
    pub fn from_raw(width: usize, height: usize, disparities: Vec<u8>) -> Self {
        let min_disp = disparities.iter().copied().min();
        let max_disp = disparities.iter().copied().max();

        // Callers always hand over exactly width * height values
        let data = GrayImage::from_raw(width as u32, height as u32, disparities)
            .unwrap_or_else(|| GrayImage::new(width as u32, height as u32));

        DisparityMap {
            data,
            min_disp,
            max_disp
        }
    }

    pub fn width(&self) -> usize {
        self.data.width() as usize
    }

    pub fn height(&self) -> usize {
        self.data.height() as usize
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data.get_pixel(x as u32, y as u32)[0]
    }

    pub fn put(&mut self, x: usize, y: usize, val: u8) {
        self.data.put_pixel(x as u32, y as u32, image::Luma([val]))
    }

    /// The disparities in row-major order.
    pub fn as_raw(&self) -> &[u8] {
        self.data.as_raw()
    }

    /// Converts the map into a Luma8 image holding the raw disparity values.
    pub fn to_luma(&self) -> GrayImage {
        self.data.clone()
    }

    /// Converts the map to a normalised GrayImage.
    ///
    /// Normalises by the maximum observed disparity in the map. If the maximum disparity is not
    /// set, or is zero, then the function is equivalent to `.to_luma()`.
    pub fn to_luma_normalised(&self) -> GrayImage {

        let mut new = GrayImage::new(self.data.width(), self.data.height());

        let mult = match self.max_disp {
            Some(d) if d > 0 => 255.0 / d as f32,
            _ => 1.0
        };

        for (x, y, pixel) in self.data.enumerate_pixels() {
            let val = (pixel[0] as f32 * mult).min(255.0);

            *new.get_pixel_mut(x, y) = image::Luma([val as u8]);
        }

        new
    }
}
