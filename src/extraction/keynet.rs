use image::GrayImage;
use nalgebra as na;

use crate::config::ModelConfig;
use crate::error::{ExtractionError, Result};
use crate::extraction::onnx::{expect_outputs, select_by_score, tensor_from_gray, OnnxModel};
use crate::features::{AffineFrames, Descriptors, ImageFeatures};

/// KeyNet + AffNet + HardNet. The exported graph emits stage-major
/// tensors: affine frames (stages, n, 2, 3), responses (stages, n) and
/// descriptors (stages, n, d). Every stage is kept in the returned
/// `AffineFrames`; the keypoint and descriptor arrays are read from the
/// final stage, with keypoints taken from each frame's translation
/// column. This is the only backend that returns a non-null LAF.
pub struct KeyNetExtractor {
    model: OnnxModel,
    n_features: usize,
}

impl KeyNetExtractor {
    pub fn new(cfg: &ModelConfig, n_features: usize) -> Result<Self> {
        let model = OnnxModel::load(&cfg.model, cfg.device)?;
        Ok(Self { model, n_features })
    }

    pub fn extract(&self, img: &GrayImage) -> Result<ImageFeatures> {
        let outputs = self.model.run(tensor_from_gray(img))?;
        expect_outputs(&outputs, 3)?;

        let laf_view = outputs[0].to_array_view::<f32>()?;
        let laf_shape = laf_view.shape().to_vec();
        if laf_shape.len() != 4 || laf_shape[2] != 2 || laf_shape[3] != 3 {
            return Err(ExtractionError::ModelOutputShape {
                name: "lafs",
                shape: laf_shape,
                expected: "(stages, n, 2, 3)",
            });
        }
        let (stages, n) = (laf_shape[0], laf_shape[1]);

        let resp_view = outputs[1].to_array_view::<f32>()?;
        if resp_view.shape() != [stages, n] {
            return Err(ExtractionError::ModelOutputShape {
                name: "responses",
                shape: resp_view.shape().to_vec(),
                expected: "(stages, n)",
            });
        }

        let desc_view = outputs[2].to_array_view::<f32>()?;
        let desc_shape = desc_view.shape().to_vec();
        if desc_shape.len() != 3 || desc_shape[0] != stages || desc_shape[1] != n {
            return Err(ExtractionError::ModelOutputShape {
                name: "descriptors",
                shape: desc_shape,
                expected: "(stages, n, d)",
            });
        }
        let dim = desc_shape[2];

        // order by the final stage's response, strongest first
        let last_responses: Vec<f32> = (0..n).map(|i| resp_view[[stages - 1, i]]).collect();
        let order = select_by_score(&last_responses, self.n_features);

        let frames = AffineFrames {
            stages: (0..stages)
                .map(|s| {
                    order
                        .iter()
                        .map(|&i| {
                            na::Matrix2x3::new(
                                laf_view[[s, i, 0, 0]],
                                laf_view[[s, i, 0, 1]],
                                laf_view[[s, i, 0, 2]],
                                laf_view[[s, i, 1, 0]],
                                laf_view[[s, i, 1, 1]],
                                laf_view[[s, i, 1, 2]],
                            )
                        })
                        .collect()
                })
                .collect(),
        };

        let mut descriptors = na::DMatrix::zeros(order.len(), dim);
        for (r, &i) in order.iter().enumerate() {
            for c in 0..dim {
                descriptors[(r, c)] = desc_view[[stages - 1, i, c]];
            }
        }

        Ok(ImageFeatures {
            keypoints: frames.centers(),
            descriptors: Descriptors::Float(descriptors),
            laf: Some(frames),
        })
    }
}
