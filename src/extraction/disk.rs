use image::{imageops, RgbImage};

use crate::config::ModelConfig;
use crate::error::{ExtractionError, Result};
use crate::extraction::onnx::{
    expect_outputs, select_by_score, select_rows, tensor_from_rgb, to_matrix_2d, to_vec_1d,
    OnnxModel,
};
use crate::features::{Descriptors, ImageFeatures};

/// The network downsamples by powers of two; inputs must be divisible by
/// this stride.
pub const INPUT_STRIDE: u32 = 16;

pub struct DiskExtractor {
    model: OnnxModel,
    n_features: usize,
}

impl DiskExtractor {
    pub fn new(cfg: &ModelConfig, n_features: usize) -> Result<Self> {
        let model = OnnxModel::load(&cfg.model, cfg.device)?;
        Ok(Self { model, n_features })
    }

    pub fn extract(&self, img: &RgbImage) -> Result<ImageFeatures> {
        let padded = pad_to_stride(img, INPUT_STRIDE);
        let outputs = self.model.run(tensor_from_rgb(&padded))?;
        expect_outputs(&outputs, 3)?;
        let keypoints = to_matrix_2d(&outputs[0], "keypoints")?;
        let scores = to_vec_1d(&outputs[1], "scores")?;
        let descriptors = to_matrix_2d(&outputs[2], "descriptors")?;
        if scores.len() != keypoints.nrows() {
            return Err(ExtractionError::ModelOutputShape {
                name: "scores",
                shape: vec![scores.len()],
                expected: "one score per keypoint",
            });
        }

        let order = select_by_score(&scores, self.n_features);
        Ok(ImageFeatures {
            keypoints: select_rows(&keypoints, &order),
            descriptors: Descriptors::Float(select_rows(&descriptors, &order)),
            laf: None,
        })
    }
}

/// Zero-pads on the bottom/right so both dimensions are multiples of
/// `stride`. Original pixels keep their coordinates.
pub fn pad_to_stride(img: &RgbImage, stride: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    let pw = w.div_ceil(stride) * stride;
    let ph = h.div_ceil(stride) * stride;
    if pw == w && ph == h {
        return img.clone();
    }
    let mut padded = RgbImage::new(pw, ph);
    imageops::replace(&mut padded, img, 0, 0);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_to_stride_dimensions() {
        let img = RgbImage::new(100, 65);
        let padded = pad_to_stride(&img, INPUT_STRIDE);
        assert_eq!(padded.dimensions(), (112, 80));
    }

    #[test]
    fn test_pad_noop_when_aligned() {
        let img = RgbImage::new(64, 32);
        let padded = pad_to_stride(&img, INPUT_STRIDE);
        assert_eq!(padded.dimensions(), (64, 32));
    }

    #[test]
    fn test_pad_preserves_pixels() {
        let mut img = RgbImage::new(10, 10);
        img.put_pixel(9, 9, image::Rgb([1, 2, 3]));
        let padded = pad_to_stride(&img, INPUT_STRIDE);
        assert_eq!(padded.get_pixel(9, 9), &image::Rgb([1, 2, 3]));
        assert_eq!(padded.get_pixel(15, 15), &image::Rgb([0, 0, 0]));
    }
}
