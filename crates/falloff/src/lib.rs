//! Exact Euclidean distance transforms for masks and heightmaps.
//!
//! ```
//! use falloff::image::{Image, ImageSize};
//! use falloff::imgproc::distance_transform::distance_field;
//!
//! let mask = Image::<u8, 1>::new(ImageSize { width: 4, height: 1 }, vec![0, 0, 0, 1]).unwrap();
//! let field = distance_field(&mask).unwrap();
//! assert_eq!(field.as_slice(), &[0.75, 0.5, 0.25, 0.0]);
//! ```

#[doc(inline)]
pub use falloff_image as image;

#[doc(inline)]
pub use falloff_imgproc as imgproc;
