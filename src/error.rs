//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The left and right images of a stereo pair do not share the same dimensions.
    #[error("Left image is {left:?} but right image is {right:?}, both must be the same size")]
    DimensionMismatch {
        left: (u32, u32),
        right: (u32, u32)
    },

    /// An edge detector returned a mask whose size differs from the image it was given.
    #[error("Edge map is {got:?} but the image is {expected:?}")]
    EdgeMapMismatch {
        expected: (usize, usize),
        got: (usize, usize)
    },

    /// A configuration value is outside of its permitted range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParam {
        name: &'static str,
        reason: String
    },

    #[error("Could not parse parameters: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Could not read parameters: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "statistics")]
    #[error("Error was thrown while plotting statistics: {0}")]
    Statistics(String)
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParam {
            name,
            reason: reason.into()
        }
    }
}
