use serde_json::json;
use std::fs;
use std::path::PathBuf;
use stockcast_serving::{ArtifactBundle, Server, ServerConfig, ServingError};
use tempfile::tempdir;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/quantity_prediction_model.json")
}

#[test]
fn fixture_bundle_loads() {
    let bundle = ArtifactBundle::load(fixture_path()).unwrap();
    assert_eq!(bundle.model_kind(), "forest");
    assert_eq!(bundle.scaler_kind(), "standard");
    assert_eq!(
        bundle.feature_cols,
        vec![
            "prev_month_1",
            "prev_month_2",
            "prev_month_3",
            "month_sin",
            "month_cos"
        ]
    );
    assert_eq!(bundle.training_date, "2024-11-18 14:32:05");

    let summary = serde_json::to_value(bundle.summary()).unwrap();
    assert_eq!(summary["model"], "forest");
    assert_eq!(summary["metrics"]["n_train"], 412);
}

#[test]
fn missing_file_fails_to_load() {
    let dir = tempdir().unwrap();
    let err = ArtifactBundle::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ServingError::ArtifactLoad(_)));
    assert!(err.is_startup_error());
}

#[test]
fn corrupt_file_fails_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    fs::write(&path, b"\x80\x04\x95 not json").unwrap();
    assert!(matches!(
        ArtifactBundle::load(&path),
        Err(ServingError::ArtifactLoad(_))
    ));
}

#[test]
fn bundle_without_scaler_fails_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    let value = json!({
        "model": {"type": "linear", "coefficients": [1.0], "intercept": 0.0},
        "feature_cols": ["prev_month_1"],
        "metrics": {},
        "training_date": "2024-01-01"
    });
    fs::write(&path, value.to_string()).unwrap();
    let err = ArtifactBundle::load(&path).unwrap_err();
    assert!(err.to_string().contains("scaler"), "{err}");
}

#[test]
fn non_numeric_metrics_fail_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    let value = json!({
        "scaler": {"type": "identity", "dim": 1},
        "model": {"type": "linear", "coefficients": [1.0]},
        "feature_cols": ["prev_month_1"],
        "metrics": {"mae": "low"},
        "training_date": "2024-01-01"
    });
    fs::write(&path, value.to_string()).unwrap();
    assert!(ArtifactBundle::load(&path).is_err());
}

#[test]
fn mlp_bundle_loads_and_infers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    let value = json!({
        "scaler": {"type": "min_max", "min": [0.0, 0.0, 0.0, 0.0, 0.0], "scale": [0.01, 0.01, 0.01, 1.0, 1.0]},
        "model": {
            "type": "mlp",
            "activation": "relu",
            "coefs": [
                [[1.0], [1.0], [1.0], [0.0], [0.0]],
                [[100.0]]
            ],
            "intercepts": [[0.0], [2.0]]
        },
        "feature_cols": ["prev_month_1", "prev_month_2", "prev_month_3", "month_sin", "month_cos"],
        "metrics": {"rmse": 3.5},
        "training_date": "2024-02-02"
    });
    fs::write(&path, value.to_string()).unwrap();

    let bundle = ArtifactBundle::load(&path).unwrap();
    assert_eq!(bundle.model_kind(), "mlp");
    // 100 * (0.2 + 0.2 + 0.2) + 2
    let y = bundle.infer(&[20.0, 20.0, 20.0, 0.5, 0.5]).unwrap();
    assert!((y - 62.0).abs() < 1e-9, "{y}");
}

#[test]
fn mlp_bundle_with_wrong_input_width_fails_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    let value = json!({
        "scaler": {"type": "identity", "dim": 5},
        "model": {
            "type": "mlp",
            "coefs": [[[1.0], [1.0], [1.0]]],
            "intercepts": [[0.0]]
        },
        "feature_cols": ["prev_month_1", "prev_month_2", "prev_month_3", "month_sin", "month_cos"],
        "metrics": {},
        "training_date": "2024-02-02"
    });
    fs::write(&path, value.to_string()).unwrap();
    let err = ArtifactBundle::load(&path).unwrap_err();
    assert!(matches!(err, ServingError::ArtifactLoad(_)), "{err}");
}

#[tokio::test]
async fn server_refuses_to_start_without_bundle() {
    let dir = tempdir().unwrap();
    let config = ServerConfig::builder()
        .host("127.0.0.1")
        .port(5001)
        .artifact_path(dir.path().join("quantity_prediction_model.json"))
        .build();

    let err = Server::new(config).run_until(async {}).await.unwrap_err();
    assert!(err.is_startup_error(), "{err}");
}

#[test]
fn server_rejects_invalid_config_before_loading() {
    let config = ServerConfig::builder()
        .artifact_path(fixture_path())
        .jitter_ratio(1.5)
        .build();
    assert!(matches!(
        Server::new(config).prepare(),
        Err(ServingError::ConfigError(_))
    ));

    let config = ServerConfig::builder().artifact_path(fixture_path()).build();
    let predictor = Server::new(config).prepare().unwrap();
    assert_eq!(predictor.bundle().model_kind(), "forest");
}
