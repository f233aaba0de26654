use image::RgbImage;

use crate::config::AlikeConfig;
use crate::error::{ExtractionError, Result};
use crate::extraction::onnx::{
    expect_outputs, select_by_score, select_rows, tensor_from_rgb, to_matrix_2d, to_vec_1d,
    OnnxModel,
};
use crate::features::{Descriptors, ImageFeatures};

/// ALIKE runs on a pre-decoded RGB image. The exported graph emits
/// keypoints, scores and descriptors; filtering by `top_k` / score
/// threshold and the `n_limit` cap happen here.
pub struct AlikeExtractor {
    cfg: AlikeConfig,
    model: OnnxModel,
}

impl AlikeExtractor {
    pub fn new(cfg: &AlikeConfig) -> Result<Self> {
        let model = OnnxModel::load(&cfg.model, cfg.device)?;
        Ok(Self {
            cfg: cfg.clone(),
            model,
        })
    }

    pub fn extract(&self, img: &RgbImage) -> Result<ImageFeatures> {
        let outputs = self.model.run(tensor_from_rgb(img))?;
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

        let mut order = if self.cfg.top_k > 0 {
            select_by_score(&scores, self.cfg.top_k as usize)
        } else {
            let mut kept: Vec<usize> = (0..scores.len())
                .filter(|&i| scores[i] >= self.cfg.scores_th)
                .collect();
            kept.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
            kept
        };
        order.truncate(self.cfg.n_limit);

        let mut keypoints = select_rows(&keypoints, &order);
        if !self.cfg.subpixel {
            keypoints.apply(|v| *v = v.round());
        }

        Ok(ImageFeatures {
            keypoints,
            descriptors: Descriptors::Float(select_rows(&descriptors, &order)),
            laf: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Device;
    use nalgebra as na;

    #[test]
    fn test_construction_requires_readable_model() {
        let cfg = AlikeConfig {
            model: "missing/alike.onnx".into(),
            device: Device::Cpu,
            top_k: -1,
            scores_th: 0.2,
            n_limit: 5000,
            subpixel: false,
        };
        assert!(AlikeExtractor::new(&cfg).is_err());
    }

    #[test]
    fn test_rounding_helper_matches_subpixel_off() {
        let mut m = na::DMatrix::from_row_slice(1, 2, &[1.4f32, 2.6]);
        m.apply(|v| *v = v.round());
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(0, 1)], 3.0);
    }
}
