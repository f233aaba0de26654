use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// The closed set of extraction backends.
///
/// Selecting a backend goes through this enum so a bad method name is
/// rejected when the extractor is constructed, not on the first call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Orb,
    Alike,
    Disk,
    #[serde(rename = "SuperPoint")]
    SuperPoint,
    #[serde(rename = "KeyNetAffNetHardNet")]
    KeyNetAffNetHardNet,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Orb => "ORB",
            Method::Alike => "ALIKE",
            Method::Disk => "DISK",
            Method::SuperPoint => "SuperPoint",
            Method::KeyNetAffNetHardNet => "KeyNetAffNetHardNet",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Method {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORB" => Ok(Method::Orb),
            "ALIKE" => Ok(Method::Alike),
            "DISK" => Ok(Method::Disk),
            "SuperPoint" => Ok(Method::SuperPoint),
            "KeyNetAffNetHardNet" => Ok(Method::KeyNetAffNetHardNet),
            other => Err(ExtractionError::UnknownMethod(other.to_string())),
        }
    }
}

/// Where backend inference runs. Injected through the config so the CPU
/// path stays testable on machines without an accelerator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

/// Corner score used to rank ORB keypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreType {
    Harris,
    Fast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    pub scale_factor: f32,
    pub n_levels: usize,
    pub edge_threshold: u32,
    pub first_level: usize,
    pub wta_k: usize,
    pub score_type: ScoreType,
    pub patch_size: u32,
    pub fast_threshold: u8,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.2,
            n_levels: 8,
            edge_threshold: 31,
            first_level: 0,
            wta_k: 2,
            score_type: ScoreType::Harris,
            patch_size: 31,
            fast_threshold: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlikeConfig {
    pub model: PathBuf,
    #[serde(default)]
    pub device: Device,
    /// Keep the strongest `top_k` keypoints; non-positive means keep
    /// everything at or above `scores_th` instead.
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_scores_th")]
    pub scores_th: f32,
    #[serde(default = "default_n_limit")]
    pub n_limit: usize,
    #[serde(default)]
    pub subpixel: bool,
}

fn default_top_k() -> i64 {
    -1
}

fn default_scores_th() -> f32 {
    0.2
}

fn default_n_limit() -> usize {
    5000
}

/// Config shared by the model-file backends (DISK, SuperPoint,
/// KeyNetAffNetHardNet): where the exported graph lives and where it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: PathBuf,
    #[serde(default)]
    pub device: Device,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub method: Method,
    #[serde(default = "default_n_features")]
    pub n_features: usize,
    #[serde(default)]
    pub orb: OrbConfig,
    #[serde(default)]
    pub alike: Option<AlikeConfig>,
    #[serde(default)]
    pub disk: Option<ModelConfig>,
    #[serde(default)]
    pub superpoint: Option<ModelConfig>,
    #[serde(default)]
    pub keynet: Option<ModelConfig>,
}

fn default_n_features() -> usize {
    1024
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            method: Method::Orb,
            n_features: default_n_features(),
            orb: OrbConfig::default(),
            alike: None,
            disk: None,
            superpoint: None,
            keynet: None,
        }
    }
}
