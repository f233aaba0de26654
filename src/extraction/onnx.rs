//! Shared ONNX session plumbing for the pretrained backends.
//!
//! The graph is parsed once when the extractor is constructed and planned
//! against the concrete input shape at call time, so one extractor handles
//! images of any size. Execution is forward-only.

use std::path::Path;

use image::{GrayImage, RgbImage};
use nalgebra as na;
use tract_onnx::prelude::*;

use crate::config::Device;
use crate::error::{ExtractionError, Result};

pub struct OnnxModel {
    model: InferenceModel,
}

impl OnnxModel {
    /// Parses the graph at `path`. Only the CPU device is available in
    /// this build; asking for anything else fails here, not mid-call.
    pub fn load(path: &Path, device: Device) -> Result<Self> {
        if device != Device::Cpu {
            return Err(ExtractionError::DeviceUnavailable(device));
        }
        log::debug!("loading onnx graph from {}", path.display());
        let model = tract_onnx::onnx().model_for_path(path)?;
        Ok(Self { model })
    }

    /// Plans the graph for the input's shape and runs it.
    pub fn run(&self, input: Tensor) -> Result<TVec<TValue>> {
        let shape: TVec<usize> = input.shape().iter().copied().collect();
        let plan = self
            .model
            .clone()
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))?
            .into_optimized()?
            .into_runnable()?;
        Ok(plan.run(tvec!(input.into()))?)
    }
}

/// (1, 1, h, w) float tensor in [0, 1].
pub fn tensor_from_gray(img: &GrayImage) -> Tensor {
    let (w, h) = img.dimensions();
    tract_ndarray::Array4::from_shape_fn((1, 1, h as usize, w as usize), |(_, _, y, x)| {
        img.get_pixel(x as u32, y as u32).0[0] as f32 / 255.0
    })
    .into()
}

/// (1, 3, h, w) float tensor in [0, 1], channel-major.
pub fn tensor_from_rgb(img: &RgbImage) -> Tensor {
    let (w, h) = img.dimensions();
    tract_ndarray::Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
        img.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0
    })
    .into()
}

pub fn expect_outputs(outputs: &TVec<TValue>, expected: usize) -> Result<()> {
    if outputs.len() != expected {
        return Err(ExtractionError::ModelOutputArity {
            expected,
            got: outputs.len(),
        });
    }
    Ok(())
}

/// Flattens an output to (rows, last-dim); any leading batch dimensions
/// collapse into the row count.
pub fn to_matrix_2d(value: &TValue, name: &'static str) -> Result<na::DMatrix<f32>> {
    let view = value.to_array_view::<f32>()?;
    let shape = view.shape().to_vec();
    let cols = match shape.last() {
        Some(&c) if c > 0 => c,
        _ => {
            return Err(ExtractionError::ModelOutputShape {
                name,
                shape,
                expected: "(.., n, d)",
            });
        }
    };
    let rows = view.len() / cols;
    Ok(na::DMatrix::from_row_iterator(
        rows,
        cols,
        view.iter().copied(),
    ))
}

/// Flattens an output to a plain vector, one entry per keypoint.
pub fn to_vec_1d(value: &TValue, _name: &'static str) -> Result<Vec<f32>> {
    let view = value.to_array_view::<f32>()?;
    Ok(view.iter().copied().collect())
}

/// Indices of the strongest scores, descending, truncated to `limit`.
pub fn select_by_score(scores: &[f32], limit: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(limit);
    order
}

/// Copies the given rows of `m`, preserving `order`'s ordering.
pub fn select_rows(m: &na::DMatrix<f32>, order: &[usize]) -> na::DMatrix<f32> {
    let mut out = na::DMatrix::zeros(order.len(), m.ncols());
    for (r, &i) in order.iter().enumerate() {
        out.row_mut(r).copy_from(&m.row(i));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file_fails() {
        let err = OnnxModel::load(Path::new("no_such_model.onnx"), Device::Cpu);
        assert!(err.is_err());
    }

    #[test]
    fn test_cuda_is_rejected_at_load() {
        let err = OnnxModel::load(Path::new("whatever.onnx"), Device::Cuda);
        assert!(matches!(
            err,
            Err(ExtractionError::DeviceUnavailable(Device::Cuda))
        ));
    }

    #[test]
    fn test_tensor_from_gray_layout() {
        let mut img = GrayImage::from_pixel(4, 2, image::Luma([0]));
        img.put_pixel(3, 1, image::Luma([255]));
        let t = tensor_from_gray(&img);
        assert_eq!(t.shape(), &[1, 1, 2, 4]);
        let view = t.to_array_view::<f32>().unwrap();
        assert_eq!(view[[0, 0, 1, 3]], 1.0);
        assert_eq!(view[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn test_select_by_score() {
        let order = select_by_score(&[0.1, 0.9, 0.5], 2);
        assert_eq!(order, vec![1, 2]);
    }
}
