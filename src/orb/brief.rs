use image::GrayImage;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

pub const DESCRIPTOR_BYTES: usize = 32;
const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;

const PATTERN_SEED: u64 = 42;

/// Steered BRIEF sampling pattern.
///
/// Offsets are drawn once from a seeded normal distribution and clamped to
/// the patch, so the same config always yields the same descriptors. The
/// points are consumed in groups of `wta_k`: each group encodes the index
/// of its brightest sample (1 bit for pairs, 2 bits for 3- or 4-tuples).
#[derive(Debug, Clone)]
pub struct SamplingPattern {
    points: Vec<(f32, f32)>,
    wta_k: usize,
}

fn bits_per_test(wta_k: usize) -> usize {
    if wta_k <= 2 {
        1
    } else {
        2
    }
}

impl SamplingPattern {
    pub fn new(patch_size: u32, wta_k: usize) -> Self {
        let wta_k = wta_k.clamp(2, 4);
        let tests = DESCRIPTOR_BITS / bits_per_test(wta_k);
        let half = patch_size as f32 / 2.0;
        let sigma = patch_size as f32 / 5.0;

        let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
        let normal = Normal::new(0.0f32, sigma).unwrap();
        let clamped_sample = |rng: &mut ChaCha8Rng| -> f32 {
            normal.sample(rng).clamp(-half, half)
        };

        let points = (0..tests * wta_k)
            .map(|_| (clamped_sample(&mut rng), clamped_sample(&mut rng)))
            .collect();
        Self { points, wta_k }
    }

    pub fn wta_k(&self) -> usize {
        self.wta_k
    }
}

/// Computes a 32-byte descriptor at `(x, y)`, rotating the sampling
/// pattern by `angle` radians. Samples falling outside the image read as 0.
pub fn compute_descriptor(
    img: &GrayImage,
    x: f32,
    y: f32,
    angle: f32,
    pattern: &SamplingPattern,
) -> [u8; DESCRIPTOR_BYTES] {
    let (sin, cos) = angle.sin_cos();
    let mut descriptor = [0u8; DESCRIPTOR_BYTES];
    let mut bit = 0usize;
    let bits = bits_per_test(pattern.wta_k);

    for group in pattern.points.chunks(pattern.wta_k) {
        let mut best_idx = 0usize;
        let mut best_val = 0u8;
        for (i, &(dx, dy)) in group.iter().enumerate() {
            let val = sample_rotated(img, x, y, dx, dy, sin, cos);
            if i == 0 || val > best_val {
                best_idx = i;
                best_val = val;
            }
        }
        for b in 0..bits {
            if best_idx & (1 << b) != 0 {
                descriptor[bit / 8] |= 1 << (bit % 8);
            }
            bit += 1;
        }
    }
    descriptor
}

fn sample_rotated(img: &GrayImage, cx: f32, cy: f32, dx: f32, dy: f32, sin: f32, cos: f32) -> u8 {
    let sx = (cx + dx * cos - dy * sin).round();
    let sy = (cy + dx * sin + dy * cos).round();
    if sx < 0.0 || sy < 0.0 || sx >= img.width() as f32 || sy >= img.height() as f32 {
        return 0;
    }
    img.get_pixel(sx as u32, sy as u32).0[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| image::Luma([((x + y) % 256) as u8]))
    }

    #[test]
    fn test_pattern_is_deterministic() {
        let a = SamplingPattern::new(31, 2);
        let b = SamplingPattern::new(31, 2);
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn test_pattern_stays_in_patch() {
        let pattern = SamplingPattern::new(31, 2);
        assert_eq!(pattern.points.len(), 512);
        for &(dx, dy) in &pattern.points {
            assert!(dx.abs() <= 15.5 && dy.abs() <= 15.5);
        }
    }

    #[test]
    fn test_wta_k_group_sizes() {
        // 1 bit per pair, 2 bits per triple/quad, always 256 bits total.
        assert_eq!(SamplingPattern::new(31, 2).points.len(), 256 * 2);
        assert_eq!(SamplingPattern::new(31, 3).points.len(), 128 * 3);
        assert_eq!(SamplingPattern::new(31, 4).points.len(), 128 * 4);
    }

    #[test]
    fn test_descriptor_deterministic() {
        let img = gradient_image(64, 64);
        let pattern = SamplingPattern::new(31, 2);
        let d1 = compute_descriptor(&img, 32.0, 32.0, 0.3, &pattern);
        let d2 = compute_descriptor(&img, 32.0, 32.0, 0.3, &pattern);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_descriptor_out_of_bounds_reads_zero() {
        // A keypoint in a corner still produces a descriptor.
        let img = gradient_image(16, 16);
        let pattern = SamplingPattern::new(31, 2);
        let _ = compute_descriptor(&img, 0.0, 0.0, 0.0, &pattern);
    }
}
