use std::io::Write;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::features::ImageFeatures;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: &str, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[derive(Serialize)]
struct ExtractionReport {
    timestamp: String,
    method: String,
    images: Vec<ImageReport>,
    total_keypoints: usize,
}

#[derive(Serialize)]
struct ImageReport {
    stem: String,
    keypoints: usize,
    descriptor_dim: usize,
    has_laf: bool,
}

/// Writes a per-image extraction summary to a JSON file.
pub fn write_extraction_report(
    output_path: &str,
    method: &str,
    entries: &[(String, ImageFeatures)],
) -> Result<()> {
    use std::time::SystemTime;

    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let images: Vec<ImageReport> = entries
        .iter()
        .map(|(stem, f)| ImageReport {
            stem: stem.clone(),
            keypoints: f.len(),
            descriptor_dim: f.descriptors.dim(),
            has_laf: f.laf.is_some(),
        })
        .collect();
    let total_keypoints = entries.iter().map(|(_, f)| f.len()).sum();

    let report = ExtractionReport {
        timestamp: timestamp.to_string(),
        method: method.to_string(),
        images,
        total_keypoints,
    };
    object_to_json(output_path, &report)
}
