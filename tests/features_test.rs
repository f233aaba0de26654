use nalgebra as na;

use local_features::features::{AffineFrames, Descriptors, FeatureCache, ImageFeatures};

fn dummy_features(n: usize, tag: f32) -> ImageFeatures {
    ImageFeatures {
        keypoints: na::DMatrix::from_element(n, 2, tag),
        descriptors: Descriptors::Float(na::DMatrix::from_element(n, 8, tag)),
        laf: None,
    }
}

#[test]
fn test_descriptor_dims() {
    let d = Descriptors::Quantized(na::DMatrix::zeros(5, 128));
    assert_eq!(d.len(), 5);
    assert_eq!(d.dim(), 128);
    let d = Descriptors::Float(na::DMatrix::zeros(0, 64));
    assert!(d.is_empty());
    assert_eq!(d.dim(), 64);
}

#[test]
fn test_alignment_check() {
    let bad = ImageFeatures {
        keypoints: na::DMatrix::zeros(3, 2),
        descriptors: Descriptors::Float(na::DMatrix::zeros(2, 8)),
        laf: None,
    };
    assert!(bad.check_alignment().is_err());
    assert!(dummy_features(4, 0.0).check_alignment().is_ok());
}

#[test]
fn test_affine_frame_centers_come_from_last_stage() {
    let stage0 = vec![na::Matrix2x3::new(1.0, 0.0, 5.0, 0.0, 1.0, 6.0)];
    let stage1 = vec![na::Matrix2x3::new(1.0, 0.0, 7.0, 0.0, 1.0, 8.0)];
    let frames = AffineFrames {
        stages: vec![stage0, stage1],
    };
    let centers = frames.centers();
    assert_eq!(centers.shape(), (1, 2));
    assert_eq!(centers[(0, 0)], 7.0);
    assert_eq!(centers[(0, 1)], 8.0);
}

#[test]
fn test_cache_overwrites_same_stem() {
    let mut cache = FeatureCache::new(8);
    cache.insert("img0", dummy_features(2, 1.0));
    cache.insert("img0", dummy_features(5, 2.0));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("img0").unwrap().len(), 5);
}

#[test]
fn test_cache_evicts_oldest_at_capacity() {
    let mut cache = FeatureCache::new(2);
    cache.insert("a", dummy_features(1, 0.0));
    cache.insert("b", dummy_features(1, 0.0));
    cache.insert("c", dummy_features(1, 0.0));
    assert_eq!(cache.len(), 2);
    assert!(cache.get("a").is_none());
    assert!(cache.get("b").is_some());
    assert!(cache.get("c").is_some());
}

#[test]
fn test_cache_clear() {
    let mut cache = FeatureCache::new(4);
    cache.insert("a", dummy_features(1, 0.0));
    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get("a").is_none());
}
