use drift_core::AppConfig;

#[test]
fn partial_toml_keeps_defaults_for_missing_keys() {
    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("drift.config.toml");
    std::fs::write(
        &path,
        r#"
[texture.filter]
hpf_hz = 120.0

[texture.granular]
enabled = true
target_duration_s = 45.0
grain_ms = 200.0

[texture.loop]
enabled = true
crossfade_ms = 250.0

[output]
bits_per_sample = 16

[limits]
max_target_seconds = 90.0
"#,
    )
    .expect("config should be writable");

    let config = AppConfig::from_path(&path).expect("config should parse");
    assert_eq!(config.texture.filter.hpf_hz, 120.0);
    assert_eq!(config.texture.filter.lpf_hz, 15_000.0);
    assert!(config.texture.granular.enabled);
    assert_eq!(config.texture.granular.target_duration_s, Some(45.0));
    assert_eq!(config.texture.granular.grain_ms, 200.0);
    assert_eq!(config.texture.granular.overlap, 0.75);
    assert!(config.texture.looping.enabled);
    assert_eq!(config.texture.looping.crossfade_ms, 250.0);
    assert!(config.texture.limiter.enabled);
    assert!(!config.texture.reverb.enabled);
    assert_eq!(config.output.bits_per_sample, 16);
    assert_eq!(config.output.sample_rate, 48_000);
    assert_eq!(config.limits.max_target_seconds, 90.0);
    assert_eq!(config.limits.fallback_target_seconds, 60.0);
}

#[test]
fn empty_file_yields_defaults() {
    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("drift.config.toml");
    std::fs::write(&path, "").expect("config should be writable");
    assert_eq!(
        AppConfig::from_path(&path).expect("config should parse"),
        AppConfig::default()
    );
}

#[test]
fn malformed_toml_is_reported() {
    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("drift.config.toml");
    std::fs::write(&path, "[texture.granular\nenabled = maybe").expect("config should be writable");
    let error = AppConfig::from_path(&path).expect_err("malformed config must fail");
    assert!(format!("{error:#}").contains("failed to parse config TOML"));
}

#[test]
fn missing_file_is_reported() {
    let temp = tempfile::tempdir().expect("tempdir should be creatable");
    assert!(AppConfig::from_path(&temp.path().join("absent.toml")).is_err());
}
