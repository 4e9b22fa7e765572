// tests/integration/config_loading.rs

use std::io::Write;
use std::time::Duration;

use rundag::config::{load_and_validate, load_from_str, ConfigFile};
use rundag::errors::RundagError;
use rundag::types::{parse_duration, ExecutorKind};
use rundag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn defaults_apply_when_config_section_is_missing() {
    let file = write_config(
        r#"
[task.build]

[task.test]
after = ["build"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.executor_kind(), ExecutorKind::Simulated);
    assert_eq!(cfg.config().delay_ms, 5000);
    assert_eq!(cfg.config().max_parallel, None);
    assert_eq!(cfg.timeout(), None);

    let graph = cfg.graph().unwrap();
    assert_eq!(graph.len(), 2);
    let deps: Vec<&str> = graph.dependencies_of("test").iter().map(|n| n.id()).collect();
    assert_eq!(deps, vec!["build"]);
}

#[test]
fn config_section_is_parsed() {
    let file = write_config(
        r#"
[config]
executor = "shell"
max_parallel = 3
timeout = "1500ms"

[task.build]
cmd = "echo build"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.executor_kind(), ExecutorKind::Shell);
    let options = cfg.run_options();
    assert_eq!(options.max_parallel, Some(3));
    assert_eq!(options.timeout, Some(Duration::from_millis(1500)));
    assert_eq!(cfg.commands().get("build").map(String::as_str), Some("echo build"));
}

#[test]
fn simulated_settings_feed_the_executor() {
    let cfg = ConfigFileBuilder::new()
        .with_delay_ms(40)
        .with_task("a", TaskConfigBuilder::new().build())
        .with_task("b", TaskConfigBuilder::new().delay_ms(5).fail(true).build())
        .build();

    let executor = cfg.simulated_executor();
    assert_eq!(executor.delay_for("a"), Duration::from_millis(40));
    assert_eq!(executor.delay_for("b"), Duration::from_millis(5));
}

#[test]
fn empty_task_file_is_rejected() {
    let result = ConfigFile::try_from(load_from_str("").unwrap());
    match result {
        Err(RundagError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn invalid_timeout_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_timeout("soon")
        .with_task("a", TaskConfigBuilder::new().build())
        .try_build();

    match result {
        Err(RundagError::ConfigError(msg)) => assert!(msg.contains("timeout")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_max_parallel_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_max_parallel(0)
        .with_task("a", TaskConfigBuilder::new().build())
        .try_build();

    assert!(matches!(result, Err(RundagError::ConfigError(_))));
}

#[test]
fn shell_executor_requires_commands() {
    let result = ConfigFileBuilder::new()
        .with_executor(ExecutorKind::Shell)
        .with_task("a", TaskConfigBuilder::new().cmd("true").build())
        .with_task("b", TaskConfigBuilder::new().after("a").build())
        .try_build();

    match result {
        Err(RundagError::ConfigError(msg)) => assert!(msg.contains("'b'")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
after = ["B"]

[task.B]
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(RundagError::CycleDetected(task)) => assert!(task == "A" || task == "B"),
        other => panic!("expected CycleDetected, got {other:?}"),
    }
}

#[test]
fn unknown_dependency_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(RundagError::UnknownDependency { task, dependency }) => {
            assert_eq!(task, "A");
            assert_eq!(dependency, "NonExistent");
        }
        other => panic!("expected UnknownDependency, got {other:?}"),
    }
}

#[test]
fn malformed_toml_and_missing_file_are_errors() {
    let file = write_config("[task.A\nafter = 3");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(RundagError::TomlError(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("missing.toml")),
        Err(RundagError::IoError(_))
    ));
}

#[test]
fn unknown_executor_is_a_parse_error() {
    let result = load_from_str(
        r#"
[config]
executor = "docker"
"#,
    );
    assert!(matches!(result, Err(RundagError::TomlError(_))));
    assert_eq!("Shell".parse::<ExecutorKind>(), Ok(ExecutorKind::Shell));
    assert!("docker".parse::<ExecutorKind>().is_err());
}

#[test]
fn duration_units_and_overflow() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("5d").is_err());

    let err = parse_duration("6000000000000000h").unwrap_err();
    assert!(err.contains("too large"), "{err}");
    assert!(parse_duration("18446744073709551615m").is_err());
}

#[test]
fn overflowing_timeout_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_timeout("6000000000000000h")
        .with_task("a", TaskConfigBuilder::new().build())
        .try_build();

    match result {
        Err(RundagError::ConfigError(msg)) => assert!(msg.contains("too large"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}
