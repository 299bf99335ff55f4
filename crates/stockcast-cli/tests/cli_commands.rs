use clap::Parser;
use std::path::PathBuf;
use stockcast_cli::{Cli, Commands};
use stockcast_serving::{PredictionMode, MONTH_RANGE_MESSAGE};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../stockcast-serving/testdata/quantity_prediction_model.json")
}

#[test]
fn cli_parses_serve_flags() {
    let cli = Cli::parse_from([
        "stockcast",
        "serve",
        "--artifact-path",
        "/models/bundle.json",
        "--port",
        "8080",
        "--prediction-mode",
        "model",
    ]);
    let Commands::Serve(cmd) = cli.command else {
        panic!("expected serve command");
    };
    assert_eq!(cmd.artifact_path, PathBuf::from("/models/bundle.json"));
    assert_eq!(cmd.port, 8080);
    assert_eq!(cmd.host, "0.0.0.0");
    assert_eq!(cmd.prediction_mode, PredictionMode::Model);
}

#[test]
fn cli_rejects_unknown_prediction_mode() {
    let result = Cli::try_parse_from(["stockcast", "serve", "--prediction-mode", "exact"]);
    assert!(result.is_err());
}

#[test]
fn predict_command_uses_model_output() {
    let cli = Cli::parse_from([
        "stockcast",
        "predict",
        "--artifact-path",
        fixture_path().to_str().unwrap(),
        "--quantity",
        "100",
        "--month",
        "6",
        "--prediction-mode",
        "model",
    ]);
    let Commands::Predict(cmd) = cli.command else {
        panic!("expected predict command");
    };
    let response = cmd.predict().unwrap();
    assert_eq!(response.predicted_quantity, 62);
    assert_eq!(response.training_date, "2024-11-18 14:32:05");
}

#[test]
fn predict_command_reports_month_range_error() {
    let cli = Cli::parse_from([
        "stockcast",
        "predict",
        "--artifact-path",
        fixture_path().to_str().unwrap(),
        "--quantity",
        "10",
        "--month",
        "13",
    ]);
    let Commands::Predict(cmd) = cli.command else {
        panic!("expected predict command");
    };
    let err = cmd.predict().unwrap_err();
    assert_eq!(err.to_string(), MONTH_RANGE_MESSAGE);
}

#[test]
fn predict_command_rejects_invalid_jitter_ratio() {
    for ratio in ["-0.5", "NaN", "inf", "1.0"] {
        let cli = Cli::parse_from([
            "stockcast",
            "predict",
            "--artifact-path",
            fixture_path().to_str().unwrap(),
            "--quantity",
            "10",
            "--month",
            "3",
            "--jitter-ratio",
            ratio,
        ]);
        let Commands::Predict(cmd) = cli.command else {
            panic!("expected predict command");
        };
        let err = cmd.predict().unwrap_err();
        assert!(
            format!("{err:#}").contains("Invalid jitter ratio"),
            "{ratio}: {err:#}"
        );
    }
}

#[test]
fn inspect_command_summarizes_bundle() {
    let cli = Cli::parse_from([
        "stockcast",
        "inspect",
        "--artifact-path",
        fixture_path().to_str().unwrap(),
    ]);
    let Commands::Inspect(cmd) = cli.command else {
        panic!("expected inspect command");
    };
    let summary = cmd.summary().unwrap();
    assert_eq!(summary.model, "forest");
    assert_eq!(summary.scaler, "standard");
    assert_eq!(summary.feature_cols.len(), 5);
}

#[test]
fn inspect_command_fails_on_missing_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let cli = Cli::parse_from([
        "stockcast",
        "inspect",
        "--artifact-path",
        dir.path().join("absent.json").to_str().unwrap(),
    ]);
    let Commands::Inspect(cmd) = cli.command else {
        panic!("expected inspect command");
    };
    assert!(cmd.summary().is_err());
}
