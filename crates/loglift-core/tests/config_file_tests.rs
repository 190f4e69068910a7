// Loading engine configuration from disk.

use std::io::Write;

use loglift_core::{LogliftConfig, LogliftError, LoggingFramework, RewriteEngine, Severity};

#[test]
fn test_load_config_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{
            "target": "jul",
            "rules": ["level-method", "change-level"],
            "max_cycles": 4,
            "change_level": {{"from": "debug", "to": "info", "starts_with": "Startup"}}
        }}"#
    )?;

    let config = LogliftConfig::load(file.path())?;
    assert_eq!(config.target, LoggingFramework::Jul);
    assert_eq!(config.max_cycles, 4);
    assert_eq!(config.change_level.as_ref().map(|c| c.to), Some(Severity::Info));
    assert_eq!(config.logger_name, "logger");

    let engine = RewriteEngine::from_config(&config)?;
    assert_eq!(engine.rule_names(), vec!["level-method", "change-level"]);
    Ok(())
}

#[test]
fn test_missing_and_malformed_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    assert!(matches!(
        LogliftConfig::load(dir.path().join("absent.json")),
        Err(LogliftError::Io(_))
    ));

    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"rules\": ")?;
    assert!(matches!(LogliftConfig::load(&path), Err(LogliftError::Json(_))));
    Ok(())
}

#[test]
fn test_bad_method_pattern_reported() -> anyhow::Result<()> {
    let config = LogliftConfig::from_json_str(
        r#"{"rules": ["parameterize-messages"], "method_pattern": "not a pattern"}"#,
    )?;
    assert!(matches!(RewriteEngine::from_config(&config), Err(LogliftError::Config(_))));
    Ok(())
}
