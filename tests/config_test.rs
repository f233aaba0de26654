use local_features::config::{Device, ExtractorConfig, Method, ModelConfig, OrbConfig};
use local_features::error::ExtractionError;
use local_features::extraction::LocalFeatureExtractor;

#[test]
fn test_unknown_method_name_is_rejected() {
    let err = "NotABackend".parse::<Method>().unwrap_err();
    assert!(matches!(err, ExtractionError::UnknownMethod(name) if name == "NotABackend"));
}

#[test]
fn test_all_method_names_round_trip() {
    for method in [
        Method::Orb,
        Method::Alike,
        Method::Disk,
        Method::SuperPoint,
        Method::KeyNetAffNetHardNet,
    ] {
        let name = method.to_string();
        assert_eq!(name.parse::<Method>().unwrap(), method);
    }
}

#[test]
fn test_construction_fails_without_backend_section() {
    // DISK requested but no disk section: must fail when the extractor is
    // built, not on the first image.
    let config = ExtractorConfig {
        method: Method::Disk,
        ..Default::default()
    };
    let err = LocalFeatureExtractor::new(&config).unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::MissingBackendConfig(Method::Disk)
    ));
}

#[test]
fn test_construction_fails_on_unavailable_device() {
    let config = ExtractorConfig {
        method: Method::SuperPoint,
        superpoint: Some(ModelConfig {
            model: "superpoint.onnx".into(),
            device: Device::Cuda,
        }),
        ..Default::default()
    };
    let err = LocalFeatureExtractor::new(&config).unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::DeviceUnavailable(Device::Cuda)
    ));
}

#[test]
fn test_construction_fails_on_missing_model_file() {
    let config = ExtractorConfig {
        method: Method::KeyNetAffNetHardNet,
        keynet: Some(ModelConfig {
            model: "definitely/not/here.onnx".into(),
            device: Device::Cpu,
        }),
        ..Default::default()
    };
    assert!(LocalFeatureExtractor::new(&config).is_err());
}

#[test]
fn test_orb_never_needs_a_backend_section() {
    let config = ExtractorConfig {
        method: Method::Orb,
        orb: OrbConfig::default(),
        ..Default::default()
    };
    let extractor = LocalFeatureExtractor::new(&config).unwrap();
    assert_eq!(extractor.method(), Method::Orb);
}

#[test]
fn test_config_serde_names_match_original_backends() {
    let json = r#"{"method": "SuperPoint", "n_features": 512}"#;
    let config: ExtractorConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.method, Method::SuperPoint);

    let json = serde_json::to_string(&ExtractorConfig::default()).unwrap();
    assert!(json.contains("\"ORB\""));
}
