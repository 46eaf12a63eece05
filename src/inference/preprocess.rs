//! Image preprocessing
//!
//! Decodes an uploaded image, resizes it straight to the model resolution
//! (aspect ratio is not preserved, no crop or letterbox) and normalizes each
//! channel with mean 0.5 / std 0.5, giving values in [-1, 1] laid out as
//! `[1, 3, H, W]`.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::{imageops::FilterType, DynamicImage};

use crate::utils::error::{CropSightError, Result};

/// Spatial resolution the classifiers were trained at
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Largest accepted model input resolution
pub const MAX_IMAGE_SIZE: u32 = 4096;

/// Per-channel normalization mean (RGB)
pub const NORMALIZE_MEAN: [f32; 3] = [0.5, 0.5, 0.5];
/// Per-channel normalization std (RGB)
pub const NORMALIZE_STD: [f32; 3] = [0.5, 0.5, 0.5];

/// A normalized image in CHW order with a leading batch dimension of 1
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedImage {
    data: Vec<f32>,
    shape: [usize; 4],
}

impl PreprocessedImage {
    /// `[1, 3, height, width]`
    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Move the pixels onto `device` as a 4D tensor
    pub fn into_tensor<B: Backend>(self, device: &B::Device) -> Tensor<B, 4> {
        Tensor::<B, 4>::from_floats(TensorData::new(self.data, self.shape), device)
    }
}

/// Turns raw upload bytes into model input
#[derive(Debug, Clone)]
pub struct Preprocessor {
    /// Target width and height
    pub image_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    /// Interpolation used for the resize
    pub filter: FilterType,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_IMAGE_SIZE,
            mean: NORMALIZE_MEAN,
            std: NORMALIZE_STD,
            filter: FilterType::Triangle,
        }
    }
}

impl Preprocessor {
    pub fn new(image_size: u32) -> Self {
        Self {
            image_size,
            ..Self::default()
        }
    }

    /// Decode bytes in any format the `image` crate was built with
    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(CropSightError::ImageDecode("upload is empty".to_string()));
        }
        Ok(image::load_from_memory(bytes)?)
    }

    /// Decode, resize and normalize an uploaded image
    pub fn preprocess(&self, bytes: &[u8]) -> Result<PreprocessedImage> {
        let image = self.decode(bytes)?;
        Ok(self.preprocess_image(&image))
    }

    /// Resize and normalize an already decoded image
    pub fn preprocess_image(&self, image: &DynamicImage) -> PreprocessedImage {
        let resized = image.resize_exact(self.image_size, self.image_size, self.filter);
        let size = self.image_size as usize;

        PreprocessedImage {
            data: self.normalize(&resized),
            shape: [1, 3, size, size],
        }
    }

    /// Scale to [0, 1], then `(x - mean) / std` per channel, CHW layout
    fn normalize(&self, image: &DynamicImage) -> Vec<f32> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let num_pixels = width as usize * height as usize;

        let mut normalized = vec![0.0f32; 3 * num_pixels];

        for (i, pixel) in rgb.pixels().enumerate() {
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                normalized[c * num_pixels + i] = (value - self.mean[c]) / self.std[c];
            }
        }

        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_bytes;
    use burn_ndarray::NdArray;

    #[test]
    fn test_shape_is_fixed_for_any_aspect_ratio() {
        let preprocessor = Preprocessor::default();

        for (w, h) in [(1, 1), (640, 480), (37, 300), (224, 224), (1000, 10)] {
            let input = preprocessor.preprocess(&png_bytes(w, h, [10, 200, 30])).unwrap();
            assert_eq!(input.shape(), [1, 3, 224, 224], "input {}x{}", w, h);
            assert_eq!(input.data().len(), 3 * 224 * 224);
        }
    }

    #[test]
    fn test_normalization_range() {
        let preprocessor = Preprocessor::new(8);

        let white = preprocessor.preprocess(&png_bytes(16, 16, [255, 255, 255])).unwrap();
        assert!(white.data().iter().all(|&v| (v - 1.0).abs() < 1e-6));

        let black = preprocessor.preprocess(&png_bytes(16, 16, [0, 0, 0])).unwrap();
        assert!(black.data().iter().all(|&v| (v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_channels_are_planar() {
        let preprocessor = Preprocessor::new(4);
        let input = preprocessor.preprocess(&png_bytes(4, 4, [255, 0, 0])).unwrap();
        let plane = 16;

        assert!(input.data()[..plane].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(input.data()[plane..].iter().all(|&v| (v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_corrupt_bytes_fail_to_decode() {
        let preprocessor = Preprocessor::default();

        let err = preprocessor.preprocess(b"this is not an image").unwrap_err();
        assert!(matches!(err, CropSightError::ImageDecode(_)));

        let err = preprocessor.preprocess(&[]).unwrap_err();
        assert!(matches!(err, CropSightError::ImageDecode(_)));
    }

    #[test]
    fn test_truncated_png_fails_to_decode() {
        let bytes = png_bytes(32, 32, [1, 2, 3]);
        let truncated = &bytes[..bytes.len() / 2];

        let err = Preprocessor::default().preprocess(truncated).unwrap_err();
        assert!(matches!(err, CropSightError::ImageDecode(_)));
    }

    #[test]
    fn test_into_tensor() {
        let device = Default::default();
        let input = Preprocessor::new(16)
            .preprocess(&png_bytes(20, 10, [0, 128, 255]))
            .unwrap();

        let tensor = input.into_tensor::<NdArray>(&device);
        assert_eq!(tensor.dims(), [1, 3, 16, 16]);
    }
}
