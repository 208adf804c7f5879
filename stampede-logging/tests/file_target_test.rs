//! File target gets its own test binary: the global subscriber can only be
//! installed once per process.

use stampede_logging::{init_logging_from_config, LogFormat, LogTarget, LoggingConfig};

#[test]
fn test_file_target_writes_json_lines() {
    let dir = tempfile::tempdir().unwrap();

    let config = LoggingConfig {
        format: LogFormat::Json,
        targets: vec![LogTarget::File {
            directory: dir.path().to_string_lossy().into_owned(),
            file_prefix: "run.log".to_string(),
            rotation: "never".to_string(),
        }],
        ..LoggingConfig::default()
    };

    let guard = init_logging_from_config(&config).unwrap();
    assert!(guard.has_file_output());

    tracing::info!(users = 3, "swarm started");
    drop(guard);

    let log_file = dir.path().join("run.log");
    let contents = std::fs::read_to_string(log_file).unwrap();
    let line = contents.lines().next().unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["fields"]["message"], "swarm started");
    assert_eq!(event["fields"]["users"], 3);
}
