use image::GrayImage;

use crate::config::ModelConfig;
use crate::error::{ExtractionError, Result};
use crate::extraction::onnx::{
    expect_outputs, select_by_score, select_rows, tensor_from_gray, to_matrix_2d, to_vec_1d,
    OnnxModel,
};
use crate::features::{Descriptors, ImageFeatures};

/// SuperPoint on a grayscale tensor. The exported graph keeps its batch
/// dimension; outputs are flattened to (count, dimension) here and the
/// keypoint count is capped at the configured maximum.
pub struct SuperPointExtractor {
    model: OnnxModel,
    n_features: usize,
}

impl SuperPointExtractor {
    pub fn new(cfg: &ModelConfig, n_features: usize) -> Result<Self> {
        let model = OnnxModel::load(&cfg.model, cfg.device)?;
        Ok(Self { model, n_features })
    }

    pub fn extract(&self, img: &GrayImage) -> Result<ImageFeatures> {
        let outputs = self.model.run(tensor_from_gray(img))?;
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
