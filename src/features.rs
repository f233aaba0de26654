use std::collections::HashMap;

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result};

/// Descriptor rows for one image, row-aligned with its keypoints.
///
/// The backends do not share a numeric format: the rescaled binary
/// descriptors are 8-bit, the deep backends emit floats at their native
/// dimensionality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Descriptors {
    Quantized(na::DMatrix<u8>),
    Float(na::DMatrix<f32>),
}

impl Descriptors {
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Quantized(m) => m.nrows(),
            Descriptors::Float(m) => m.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptor dimensionality (columns).
    pub fn dim(&self) -> usize {
        match self {
            Descriptors::Quantized(m) => m.ncols(),
            Descriptors::Float(m) => m.ncols(),
        }
    }
}

/// Per-stage local affine frames, one 2x3 frame per keypoint.
///
/// Only the affine-covariant backend fills this in; every stage of its
/// pipeline is kept, and `last` is the one the keypoint/descriptor arrays
/// are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffineFrames {
    pub stages: Vec<Vec<na::Matrix2x3<f32>>>,
}

impl AffineFrames {
    pub fn last(&self) -> Option<&[na::Matrix2x3<f32>]> {
        self.stages.last().map(|s| s.as_slice())
    }

    /// Keypoint centers of the final stage: the translation column of
    /// each frame, as an (n, 2) matrix.
    pub fn centers(&self) -> na::DMatrix<f32> {
        let frames = self.last().unwrap_or(&[]);
        let mut m = na::DMatrix::zeros(frames.len(), 2);
        for (i, laf) in frames.iter().enumerate() {
            m[(i, 0)] = laf[(0, 2)];
            m[(i, 1)] = laf[(1, 2)];
        }
        m
    }
}

/// Extraction result for one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFeatures {
    /// One row per keypoint. Column layout is backend-specific.
    pub keypoints: na::DMatrix<f32>,
    pub descriptors: Descriptors,
    pub laf: Option<AffineFrames>,
}

impl ImageFeatures {
    pub fn len(&self) -> usize {
        self.keypoints.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every backend must hand back one descriptor row per keypoint row.
    pub fn check_alignment(&self) -> Result<()> {
        if self.keypoints.nrows() != self.descriptors.len() {
            return Err(ExtractionError::RowMismatch {
                keypoints: self.keypoints.nrows(),
                descriptors: self.descriptors.len(),
            });
        }
        Ok(())
    }
}

/// Features for an image pair, parallel arrays ordered as the call's
/// (im0, im1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePair {
    pub stems: [String; 2],
    pub features: [ImageFeatures; 2],
}

/// Opt-in bounded cache of extraction results keyed by filename stem.
///
/// Re-inserting a stem overwrites the previous entry; once `capacity`
/// distinct stems are held, inserting a new one evicts the oldest.
#[derive(Debug, Clone)]
pub struct FeatureCache {
    capacity: usize,
    order: Vec<String>,
    entries: HashMap<String, ImageFeatures>,
}

impl FeatureCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, stem: &str, features: ImageFeatures) {
        if self.entries.insert(stem.to_string(), features).is_none() {
            self.order.push(stem.to_string());
            if self.order.len() > self.capacity {
                let evicted = self.order.remove(0);
                self.entries.remove(&evicted);
            }
        }
    }

    pub fn get(&self, stem: &str) -> Option<&ImageFeatures> {
        self.entries.get(stem)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}
