use nalgebra as na;

use local_features::config::{ExtractorConfig, Method};
use local_features::features::{Descriptors, ImageFeatures};
use local_features::io::{object_from_json, object_to_json, write_extraction_report};

fn temp_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("lfrs_io_{}_{}", name, std::process::id()))
        .to_string_lossy()
        .to_string()
}

#[test]
fn test_config_json_round_trip() {
    let path = temp_path("config.json");
    let config = ExtractorConfig {
        method: Method::Alike,
        n_features: 333,
        ..Default::default()
    };
    object_to_json(&path, &config).unwrap();
    let back: ExtractorConfig = object_from_json(&path).unwrap();
    assert_eq!(back.method, Method::Alike);
    assert_eq!(back.n_features, 333);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_features_json_round_trip() {
    let path = temp_path("features.json");
    let entries = vec![(
        "frame".to_string(),
        ImageFeatures {
            keypoints: na::DMatrix::from_row_slice(2, 4, &[1.0, 2.0, 1.0, 0.0, 3.0, 4.0, 1.0, 0.0]),
            descriptors: Descriptors::Quantized(na::DMatrix::from_element(2, 128, 7u8)),
            laf: None,
        },
    )];
    object_to_json(&path, &entries).unwrap();
    let back: Vec<(String, ImageFeatures)> = object_from_json(&path).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].0, "frame");
    assert_eq!(back[0].1.keypoints, entries[0].1.keypoints);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_extraction_report_contents() {
    let path = temp_path("report.json");
    let entries = vec![
        (
            "a".to_string(),
            ImageFeatures {
                keypoints: na::DMatrix::zeros(3, 4),
                descriptors: Descriptors::Quantized(na::DMatrix::zeros(3, 128)),
                laf: None,
            },
        ),
        (
            "b".to_string(),
            ImageFeatures {
                keypoints: na::DMatrix::zeros(5, 2),
                descriptors: Descriptors::Float(na::DMatrix::zeros(5, 64)),
                laf: None,
            },
        ),
    ];
    write_extraction_report(&path, "ORB", &entries).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report["method"], "ORB");
    assert_eq!(report["total_keypoints"], 8);
    assert_eq!(report["images"][0]["stem"], "a");
    assert_eq!(report["images"][1]["descriptor_dim"], 64);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_object_from_json_missing_file() {
    let result: local_features::error::Result<ExtractorConfig> =
        object_from_json("definitely_not_a_file.json");
    assert!(result.is_err());
}
