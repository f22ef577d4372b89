#![deny(missing_docs)]
//! Image types used as the storage for distance fields

/// image representation for distance field computations.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
