use std::path::{Path, PathBuf};

use glob::glob;
use image::{GrayImage, ImageReader, RgbImage};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::error::{ExtractionError, Result};
use crate::extraction::LocalFeatureExtractor;
use crate::features::ImageFeatures;

/// Key for an image's extraction result: the filename without extension.
pub fn path_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn load_gray(path: &Path) -> Result<GrayImage> {
    Ok(open(path)?.to_luma8())
}

pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    Ok(open(path)?.to_rgb8())
}

fn open(path: &Path) -> Result<image::DynamicImage> {
    ImageReader::open(path)?
        .decode()
        .map_err(|source| ExtractionError::Image {
            path: path.to_path_buf(),
            source,
        })
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        for ext in &[".png", ".jpg", ".jpeg"] {
            if p.as_os_str().to_string_lossy().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Lists the images under `root_folder`, sorted by path.
pub fn list_images(root_folder: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*", root_folder);
    let paths = glob(&pattern).map_err(|e| {
        ExtractionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;
    let mut sorted_path: Vec<PathBuf> = paths.into_iter().filter_map(img_filter).collect();
    sorted_path.sort();
    Ok(sorted_path)
}

/// Extracts features for every image in a folder, in parallel, sorted by
/// path so the output order is stable.
pub fn extract_folder(
    extractor: &LocalFeatureExtractor,
    root_folder: &str,
) -> Result<Vec<(String, ImageFeatures)>> {
    let paths = list_images(root_folder)?;
    log::trace!("extracting {} images from {}", paths.len(), root_folder);
    paths
        .par_iter()
        .progress_count(paths.len() as u64)
        .map(|path| -> Result<(String, ImageFeatures)> {
            let features = extractor.extract_path(path)?;
            Ok((path_stem(path), features))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_stem() {
        assert_eq!(path_stem(Path::new("/data/cam0/0001.png")), "0001");
        assert_eq!(path_stem(Path::new("img.with.dots.jpg")), "img.with.dots");
    }

    #[test]
    fn test_img_filter_extensions() {
        assert!(img_filter(Ok(PathBuf::from("a/b.png"))).is_some());
        assert!(img_filter(Ok(PathBuf::from("a/b.jpeg"))).is_some());
        assert!(img_filter(Ok(PathBuf::from("a/b.txt"))).is_none());
    }

    #[test]
    fn test_load_missing_image() {
        assert!(load_gray(Path::new("no_such_image.png")).is_err());
    }
}
