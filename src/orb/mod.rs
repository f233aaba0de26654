//! ORB detection and description on image pyramids.
//!
//! FAST corners come from `imageproc`; scoring, orientation and the
//! steered BRIEF descriptors are computed here. Deterministic for a fixed
//! config.

use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::corners::corners_fast9;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::config::{OrbConfig, ScoreType};

pub mod brief;

pub use brief::DESCRIPTOR_BYTES;

const BRIEF_BLUR_SIGMA: f32 = 2.0;
const HARRIS_K: f32 = 0.04;
const HARRIS_BLOCK: i64 = 3;

#[derive(Debug, Clone)]
pub struct OrbKeypoint {
    /// Coordinates at the input image's resolution.
    pub x: f32,
    pub y: f32,
    pub response: f32,
    /// Orientation in radians.
    pub angle: f32,
    pub level: usize,
}

#[derive(Debug, Clone)]
pub struct Orb {
    cfg: OrbConfig,
    n_features: usize,
    pattern: brief::SamplingPattern,
}

impl Orb {
    pub fn new(cfg: &OrbConfig, n_features: usize) -> Self {
        Self {
            cfg: cfg.clone(),
            n_features,
            pattern: brief::SamplingPattern::new(cfg.patch_size, cfg.wta_k),
        }
    }

    /// Detects up to `n_features` keypoints and computes their raw 32-byte
    /// descriptors.
    pub fn detect_and_describe(&self, img: &GrayImage) -> (Vec<OrbKeypoint>, Vec<[u8; 32]>) {
        let mut keypoints = Vec::new();
        let mut descriptors = Vec::new();

        for (level, scale, level_img) in self.build_pyramid(img) {
            let mut level_kps = self.detect_at_level(&level_img, level);
            level_kps.sort_by(|a, b| b.response.total_cmp(&a.response));
            level_kps.truncate(self.n_features);

            let blurred = gaussian_blur_f32(&level_img, BRIEF_BLUR_SIGMA);
            for mut kp in level_kps {
                let desc =
                    brief::compute_descriptor(&blurred, kp.x, kp.y, kp.angle, &self.pattern);
                kp.x *= scale;
                kp.y *= scale;
                keypoints.push(kp);
                descriptors.push(desc);
            }
        }

        // Strongest first across all levels.
        let mut order: Vec<usize> = (0..keypoints.len()).collect();
        order.sort_by(|&a, &b| keypoints[b].response.total_cmp(&keypoints[a].response));
        order.truncate(self.n_features);

        let kps = order.iter().map(|&i| keypoints[i].clone()).collect();
        let descs = order.iter().map(|&i| descriptors[i]).collect();
        (kps, descs)
    }

    /// Pyramid levels as `(level, scale, image)`, where multiplying level
    /// coordinates by `scale` maps them back to the input resolution.
    fn build_pyramid(&self, img: &GrayImage) -> Vec<(usize, f32, GrayImage)> {
        (0..self.cfg.n_levels.max(1))
            .filter_map(|level| {
                let scale = self
                    .cfg
                    .scale_factor
                    .powi(level as i32 - self.cfg.first_level as i32);
                let w = (img.width() as f32 / scale).round() as u32;
                let h = (img.height() as f32 / scale).round() as u32;
                if w < self.cfg.patch_size || h < self.cfg.patch_size {
                    return None;
                }
                let level_img = if (scale - 1.0).abs() < f32::EPSILON {
                    img.clone()
                } else {
                    imageops::resize(img, w, h, FilterType::Triangle)
                };
                Some((level, scale, level_img))
            })
            .collect()
    }

    fn detect_at_level(&self, level_img: &GrayImage, level: usize) -> Vec<OrbKeypoint> {
        let margin = self.cfg.edge_threshold;
        let (w, h) = level_img.dimensions();
        if w <= 2 * margin || h <= 2 * margin {
            return Vec::new();
        }

        let corners = corners_fast9(level_img, self.cfg.fast_threshold);

        let grads = match self.cfg.score_type {
            ScoreType::Harris => Some((horizontal_sobel(level_img), vertical_sobel(level_img))),
            ScoreType::Fast => None,
        };

        let radius = (self.cfg.patch_size / 2).min(margin);
        corners
            .into_iter()
            .filter(|c| {
                c.x >= margin && c.y >= margin && c.x < w - margin && c.y < h - margin
            })
            .map(|c| {
                let response = match &grads {
                    Some((dx, dy)) => harris_response(dx, dy, c.x, c.y),
                    None => c.score,
                };
                OrbKeypoint {
                    x: c.x as f32,
                    y: c.y as f32,
                    response,
                    angle: intensity_centroid_angle(level_img, c.x, c.y, radius),
                    level,
                }
            })
            .collect()
    }
}

/// Harris corner measure from Sobel gradient images, summed over a small
/// window around `(x, y)`.
fn harris_response(
    dx: &image::ImageBuffer<image::Luma<i16>, Vec<i16>>,
    dy: &image::ImageBuffer<image::Luma<i16>, Vec<i16>>,
    x: u32,
    y: u32,
) -> f32 {
    let (w, h) = dx.dimensions();
    let mut ixx = 0f64;
    let mut iyy = 0f64;
    let mut ixy = 0f64;
    for wy in -HARRIS_BLOCK..=HARRIS_BLOCK {
        for wx in -HARRIS_BLOCK..=HARRIS_BLOCK {
            let sx = x as i64 + wx;
            let sy = y as i64 + wy;
            if sx < 0 || sy < 0 || sx >= w as i64 || sy >= h as i64 {
                continue;
            }
            let gx = dx.get_pixel(sx as u32, sy as u32).0[0] as f64;
            let gy = dy.get_pixel(sx as u32, sy as u32).0[0] as f64;
            ixx += gx * gx;
            iyy += gy * gy;
            ixy += gx * gy;
        }
    }
    let det = ixx * iyy - ixy * ixy;
    let trace = ixx + iyy;
    (det - HARRIS_K as f64 * trace * trace) as f32
}

/// Orientation by intensity centroid: the angle from the patch center to
/// the centroid of pixel intensities within `radius`.
fn intensity_centroid_angle(img: &GrayImage, x: u32, y: u32, radius: u32) -> f32 {
    let (w, h) = img.dimensions();
    let r = radius as i64;
    let mut m01 = 0f64;
    let mut m10 = 0f64;
    for wy in -r..=r {
        for wx in -r..=r {
            if wx * wx + wy * wy > r * r {
                continue;
            }
            let sx = x as i64 + wx;
            let sy = y as i64 + wy;
            if sx < 0 || sy < 0 || sx >= w as i64 || sy >= h as i64 {
                continue;
            }
            let v = img.get_pixel(sx as u32, sy as u32).0[0] as f64;
            m10 += wx as f64 * v;
            m01 += wy as f64 * v;
        }
    }
    m01.atan2(m10) as f32
}
