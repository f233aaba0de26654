use image::DynamicImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::RecordingStream;
use std::io::Cursor;

use crate::features::ImageFeatures;

pub fn log_image_as_compressed(
    recording: &RecordingStream,
    topic: &str,
    img: &DynamicImage,
    format: image::ImageFormat,
) {
    let mut bytes: Vec<u8> = Vec::new();

    img.to_luma8()
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();

    recording
        .log(
            format!("{}/image", topic),
            &rerun::EncodedImage::from_file_contents(bytes),
        )
        .unwrap();
}

pub fn id_to_color(id: usize) -> (u8, u8, u8, u8) {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    (
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
        255,
    )
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(p2ds: &[(f32, f32)]) -> Vec<(f32, f32)> {
    p2ds.iter().map(|(x, y)| (*x + 0.5, *y + 0.5)).collect()
}

/// Logs each image's keypoints as a colored point cloud, one timeline
/// step per image.
pub fn log_image_features(
    recording: &RecordingStream,
    topic: &str,
    entries: &[(String, ImageFeatures)],
) {
    for (idx, (stem, features)) in entries.iter().enumerate() {
        let (pts, colors): (Vec<_>, Vec<_>) = features
            .keypoints
            .row_iter()
            .enumerate()
            .map(|(i, row)| ((row[0], row[1]), id_to_color(i)))
            .unzip();
        let pts = rerun_shift(&pts);

        recording.set_time_sequence("image", idx as i64);
        recording
            .log(
                format!("{}/{}/pts", topic, stem),
                &rerun::Points2D::new(pts)
                    .with_colors(colors)
                    .with_radii([rerun::Radius::new_ui_points(5.0)]),
            )
            .unwrap();
    }
}
