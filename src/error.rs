use std::path::PathBuf;

use thiserror::Error;

use crate::config::{Device, Method};

/// Errors surfaced by configuration, image loading and backend inference.
///
/// There is no retry or partial-failure handling anywhere in the crate;
/// every failure propagates to the caller as one of these variants.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown extraction method `{0}`")]
    UnknownMethod(String),

    #[error("config is missing the {0} backend section")]
    MissingBackendConfig(Method),

    #[error("device {0:?} is not available in this build")]
    DeviceUnavailable(Device),

    #[error(transparent)]
    Inference(#[from] tract_onnx::prelude::TractError),

    #[error("model produced {got} outputs, expected {expected}")]
    ModelOutputArity { expected: usize, got: usize },

    #[error("model output {name} has shape {shape:?}, expected {expected}")]
    ModelOutputShape {
        name: &'static str,
        shape: Vec<usize>,
        expected: &'static str,
    },

    #[error("descriptor rows ({descriptors}) do not match keypoint rows ({keypoints})")]
    RowMismatch { keypoints: usize, descriptors: usize },
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
