//! Shared test fixtures

use std::cell::Cell;
use std::io::Cursor;

use burn::tensor::{backend::Backend, Tensor};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::model::Classifier;

/// Encode a solid-color PNG
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Classifier that ignores its input and returns the same logits every call
pub struct FixedLogits {
    logits: Vec<f32>,
    calls: Cell<usize>,
}

impl FixedLogits {
    pub fn new(logits: &[f32]) -> Self {
        Self {
            logits: logits.to_vec(),
            calls: Cell::new(0),
        }
    }

    /// Logits that put probability `p` on `index` and spread the rest evenly
    pub fn with_top_probability(num_classes: usize, index: usize, p: f32) -> Self {
        let rest = (1.0 - p) / (num_classes - 1) as f32;
        let logits: Vec<f32> = (0..num_classes)
            .map(|i| if i == index { p.ln() } else { rest.ln() })
            .collect();
        Self::new(&logits)
    }

    /// Number of forward passes run so far
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl<B: Backend> Classifier<B> for FixedLogits {
    fn logits(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        self.calls.set(self.calls.get() + 1);
        let [batch, _, _, _] = input.dims();
        assert_eq!(batch, 1, "pipeline runs one image per forward pass");
        let device = input.device();
        Tensor::<B, 1>::from_floats(self.logits.as_slice(), &device).reshape([1, self.logits.len()])
    }

    fn num_classes(&self) -> usize {
        self.logits.len()
    }
}
