//! Backend selection and the pair-extraction facade.

use std::path::Path;

use image::DynamicImage;

use crate::config::{ExtractorConfig, Method};
use crate::data_loader::{load_gray, load_rgb, path_stem};
use crate::error::{ExtractionError, Result};
use crate::features::{FeaturePair, ImageFeatures};

pub mod alike;
pub mod disk;
pub mod keynet;
pub mod onnx;
pub mod orb;
pub mod superpoint;

/// One variant per extraction method. Construction resolves the method,
/// checks its config section is present and loads any model, so every
/// mis-selection fails here rather than on the first image.
pub enum Backend {
    Orb(orb::OrbExtractor),
    Alike(alike::AlikeExtractor),
    Disk(disk::DiskExtractor),
    SuperPoint(superpoint::SuperPointExtractor),
    KeyNetAffNetHardNet(keynet::KeyNetExtractor),
}

impl Backend {
    pub fn from_config(cfg: &ExtractorConfig) -> Result<Self> {
        match cfg.method {
            Method::Orb => Ok(Backend::Orb(orb::OrbExtractor::new(&cfg.orb, cfg.n_features))),
            Method::Alike => {
                let c = cfg
                    .alike
                    .as_ref()
                    .ok_or(ExtractionError::MissingBackendConfig(Method::Alike))?;
                Ok(Backend::Alike(alike::AlikeExtractor::new(c)?))
            }
            Method::Disk => {
                let c = cfg
                    .disk
                    .as_ref()
                    .ok_or(ExtractionError::MissingBackendConfig(Method::Disk))?;
                Ok(Backend::Disk(disk::DiskExtractor::new(c, cfg.n_features)?))
            }
            Method::SuperPoint => {
                let c = cfg
                    .superpoint
                    .as_ref()
                    .ok_or(ExtractionError::MissingBackendConfig(Method::SuperPoint))?;
                Ok(Backend::SuperPoint(superpoint::SuperPointExtractor::new(
                    c,
                    cfg.n_features,
                )?))
            }
            Method::KeyNetAffNetHardNet => {
                let c = cfg.keynet.as_ref().ok_or(
                    ExtractionError::MissingBackendConfig(Method::KeyNetAffNetHardNet),
                )?;
                Ok(Backend::KeyNetAffNetHardNet(keynet::KeyNetExtractor::new(
                    c,
                    cfg.n_features,
                )?))
            }
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Backend::Orb(_) => Method::Orb,
            Backend::Alike(_) => Method::Alike,
            Backend::Disk(_) => Method::Disk,
            Backend::SuperPoint(_) => Method::SuperPoint,
            Backend::KeyNetAffNetHardNet(_) => Method::KeyNetAffNetHardNet,
        }
    }

    /// Extracts from an image file, decoding to the backend's expected
    /// color space.
    pub fn extract_path(&self, path: &Path) -> Result<ImageFeatures> {
        let features = match self {
            Backend::Orb(b) => b.extract(&load_gray(path)?),
            Backend::Alike(b) => b.extract(&load_rgb(path)?)?,
            Backend::Disk(b) => b.extract(&load_rgb(path)?)?,
            Backend::SuperPoint(b) => b.extract(&load_gray(path)?)?,
            Backend::KeyNetAffNetHardNet(b) => b.extract(&load_gray(path)?)?,
        };
        features.check_alignment()?;
        Ok(features)
    }

    /// Extracts from an already-decoded image (the ALIKE-style entry
    /// point, available for every backend).
    pub fn extract_image(&self, img: &DynamicImage) -> Result<ImageFeatures> {
        let features = match self {
            Backend::Orb(b) => b.extract(&img.to_luma8()),
            Backend::Alike(b) => b.extract(&img.to_rgb8())?,
            Backend::Disk(b) => b.extract(&img.to_rgb8())?,
            Backend::SuperPoint(b) => b.extract(&img.to_luma8())?,
            Backend::KeyNetAffNetHardNet(b) => b.extract(&img.to_luma8())?,
        };
        features.check_alignment()?;
        Ok(features)
    }
}

/// Facade over one configured backend: build once, then extract image
/// pairs with `run`.
pub struct LocalFeatureExtractor {
    backend: Backend,
}

impl std::fmt::Debug for LocalFeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFeatureExtractor")
            .field("method", &self.backend.method())
            .finish()
    }
}

impl LocalFeatureExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        log::debug!(
            "configuring {} extractor, n_features {}",
            config.method,
            config.n_features
        );
        Ok(Self {
            backend: Backend::from_config(config)?,
        })
    }

    pub fn method(&self) -> Method {
        self.backend.method()
    }

    pub fn extract_path(&self, path: &Path) -> Result<ImageFeatures> {
        self.backend.extract_path(path)
    }

    pub fn extract_image(&self, img: &DynamicImage) -> Result<ImageFeatures> {
        self.backend.extract_image(img)
    }

    /// Extracts both images of a pair sequentially and returns their
    /// stems and features as parallel arrays.
    pub fn run(&self, im0: &Path, im1: &Path) -> Result<FeaturePair> {
        let f0 = self.extract_path(im0)?;
        let f1 = self.extract_path(im1)?;
        log::trace!(
            "extracted {} / {} keypoints for pair ({}, {})",
            f0.len(),
            f1.len(),
            path_stem(im0),
            path_stem(im1)
        );
        Ok(FeaturePair {
            stems: [path_stem(im0), path_stem(im1)],
            features: [f0, f1],
        })
    }
}
