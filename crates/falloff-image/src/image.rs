use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use falloff_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

/// Number of elements needed to store an image of the given size.
fn num_elements(size: ImageSize, channels: usize) -> Result<usize, ImageError> {
    size.width
        .checked_mul(size.height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(ImageError::SizeOverflow(size.width, size.height, channels))
}

/// Represents an image with pixel data.
///
/// The pixels are stored row-major in a contiguous buffer of
/// `width * height * CHANNELS` elements, with the channels of a pixel
/// interleaved. Pixel `(x, y)` starts at offset `(y * width + x) * CHANNELS`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Returns
    ///
    /// A new image with the given pixel data.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use falloff_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 1>::new(
    ///    ImageSize {
    ///       width: 10,
    ///      height: 20,
    ///  },
    /// vec![0u8; 10 * 20],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 1);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = num_elements(size, CHANNELS)?;

        // check if the data length matches the image size
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and default pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `val` - The default value of the pixel data.
    ///
    /// # Returns
    ///
    /// A new image with the given size and default pixel data.
    ///
    /// # Examples
    ///
    /// ```
    /// use falloff_image::{Image, ImageSize};
    ///
    /// let image = Image::<f32, 1>::from_size_val(
    ///   ImageSize {
    ///     width: 10,
    ///    height: 20,
    /// }, 0.0).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 1);
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        let data = vec![val; num_elements(size, CHANNELS)?];
        Ok(Self { size, data })
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Get the pixel data as a row-major slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the pixel data as a mutable row-major slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its pixel data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn offset(&self, x: usize, y: usize, ch: usize) -> Result<usize, ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }

        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }

        Ok((y * self.width() + x) * CHANNELS + ch)
    }

    /// Get the pixel data of the image.
    ///
    /// # Arguments
    ///
    /// * `x` - The x-coordinate of the pixel.
    /// * `y` - The y-coordinate of the pixel.
    /// * `ch` - The channel index of the pixel.
    ///
    /// # Returns
    ///
    /// The pixel value at the given coordinates.
    ///
    /// # Errors
    ///
    /// If the coordinates or the channel are out of bounds, an error is returned.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<T, ImageError>
    where
        T: Copy,
    {
        let i = self.offset(x, y, ch)?;
        Ok(self.data[i])
    }

    /// Set the pixel data of the image.
    ///
    /// # Arguments
    ///
    /// * `x` - The x-coordinate of the pixel.
    /// * `y` - The y-coordinate of the pixel.
    /// * `ch` - The channel index of the pixel.
    /// * `val` - The value to write.
    ///
    /// # Errors
    ///
    /// If the coordinates or the channel are out of bounds, an error is returned.
    pub fn set_pixel(&mut self, x: usize, y: usize, ch: usize, val: T) -> Result<(), ImageError> {
        let i = self.offset(x, y, ch)?;
        self.data[i] = val;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{Image, ImageError, ImageSize};

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.width, 10);
        assert_eq!(image_size.height, 20);
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new(
            ImageSize {
                width: 10,
                height: 20,
            },
            vec![0.0; 10 * 20],
        )?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.num_channels(), 1);

        Ok(())
    }

    #[test]
    fn image_invalid_data_length() {
        let res = Image::<u8, 1>::new(
            ImageSize {
                width: 3,
                height: 2,
            },
            vec![0; 5],
        );
        assert_eq!(res, Err(ImageError::InvalidChannelShape(5, 6)));
    }

    #[test]
    fn image_size_overflow() {
        let res = Image::<u8, 2>::from_size_val(
            ImageSize {
                width: usize::MAX,
                height: 1,
            },
            0,
        );
        assert_eq!(res, Err(ImageError::SizeOverflow(usize::MAX, 1, 2)));
    }

    #[test]
    fn image_row_major_layout() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new(
            ImageSize {
                width: 3,
                height: 2,
            },
            vec![0., 1., 2., 3., 4., 5.],
        )?;
        assert_eq!(image.get_pixel(2, 0, 0)?, 2.0);
        assert_eq!(image.get_pixel(0, 1, 0)?, 3.0);
        assert_eq!(image.get_pixel(2, 1, 0)?, 5.0);

        Ok(())
    }

    #[test]
    fn image_interleaved_channels() -> Result<(), ImageError> {
        let image = Image::<u8, 2>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![1, 2, 3, 4],
        )?;
        assert_eq!(image.get_pixel(1, 0, 0)?, 3);
        assert_eq!(image.get_pixel(1, 0, 1)?, 4);

        Ok(())
    }

    #[test]
    fn image_set_pixel() -> Result<(), ImageError> {
        let mut image = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0.0,
        )?;
        image.set_pixel(1, 1, 0, 7.0)?;
        assert_eq!(image.as_slice(), &[0.0, 0.0, 0.0, 7.0]);
        image.set_pixel(1, 0, 0, 2.0)?;
        assert_eq!(image.into_vec(), vec![0.0, 2.0, 0.0, 7.0]);

        Ok(())
    }

    #[test]
    fn image_out_of_bounds() -> Result<(), ImageError> {
        let mut image = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 3,
            },
            0.0,
        )?;
        assert_eq!(
            image.get_pixel(2, 0, 0),
            Err(ImageError::PixelIndexOutOfBounds(2, 0, 2, 3))
        );
        assert_eq!(
            image.set_pixel(0, 0, 1, 1.0),
            Err(ImageError::ChannelIndexOutOfBounds(1, 1))
        );
        assert_eq!(
            image.get_pixel(0, 3, 0),
            Err(ImageError::PixelIndexOutOfBounds(0, 3, 2, 3))
        );

        Ok(())
    }
}
