use image::GrayImage;
use nalgebra as na;

use crate::config::OrbConfig;
use crate::features::{Descriptors, ImageFeatures};
use crate::orb::{Orb, OrbKeypoint, DESCRIPTOR_BYTES};

/// Padded descriptor width shared with the float backends' schema.
pub const PADDED_DESCRIPTOR_DIM: usize = 128;

/// Target L2 norm of a rescaled descriptor row before quantization.
pub const DESCRIPTOR_NORM: f32 = 512.0;

pub struct OrbExtractor {
    orb: Orb,
}

impl OrbExtractor {
    pub fn new(cfg: &OrbConfig, n_features: usize) -> Self {
        Self {
            orb: Orb::new(cfg, n_features),
        }
    }

    pub fn extract(&self, img: &GrayImage) -> ImageFeatures {
        let (kps, raw) = self.orb.detect_and_describe(img);
        ImageFeatures {
            keypoints: keypoint_matrix(&kps),
            descriptors: Descriptors::Quantized(rescale_descriptors(&raw)),
            laf: None,
        }
    }
}

/// (k, 4) keypoint rows: x, y, then constant 1 and 0 columns padding the
/// plain coordinates to the four-column keypoint schema.
pub fn keypoint_matrix(kps: &[OrbKeypoint]) -> na::DMatrix<f32> {
    let mut m = na::DMatrix::zeros(kps.len(), 4);
    for (i, kp) in kps.iter().enumerate() {
        m[(i, 0)] = kp.x;
        m[(i, 1)] = kp.y;
        m[(i, 2)] = 1.0;
        m[(i, 3)] = 0.0;
    }
    m
}

/// Zero-pads the raw 32-byte descriptors to 128 columns, rectifies,
/// rescales each row to L2 norm 512, rounds and quantizes to 8 bits.
/// All-zero rows are left as zeros.
pub fn rescale_descriptors(raw: &[[u8; DESCRIPTOR_BYTES]]) -> na::DMatrix<u8> {
    let mut out = na::DMatrix::zeros(raw.len(), PADDED_DESCRIPTOR_DIM);
    for (r, bytes) in raw.iter().enumerate() {
        let row: Vec<f32> = bytes.iter().map(|&b| (b as f32).abs()).collect();
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (c, v) in row.iter().enumerate() {
            out[(r, c)] = (v * DESCRIPTOR_NORM / norm).round() as u8;
        }
    }
    out
}
