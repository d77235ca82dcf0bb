//! Loading `bindery.toml`.

use std::fs;

use bindery::{ConfigurationBuilder, Error, ExecutorType, CONFIG_FILE_NAME};
use tempfile::TempDir;

use crate::common::*;

#[test]
fn test_config_file_drives_default_executor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, COMMANDS.replace("\"simple\"", "\"batch\"")).unwrap();

    let config = ConfigurationBuilder::from_file(&path).unwrap().build().unwrap();
    assert_eq!(config.settings().default_executor_type, ExecutorType::Batch);
    assert!(config.registry().contains("app.UserMapper.delete"));

    let (_source, factory, _registry) = setup(config);
    let session = factory.open_session().unwrap();
    assert_eq!(session.executor().executor_type(), ExecutorType::Batch);
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let err = ConfigurationBuilder::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap_err();
    assert!(matches!(err, Error::Config { ref reason } if reason.contains("failed to read config file")));
}

#[test]
fn test_duplicate_command_in_document() {
    let doubled = format!("{}\n{}", COMMANDS, COMMANDS.replace("[settings]\ndefault_executor_type = \"simple\"\n", ""));
    let err = ConfigurationBuilder::from_toml_str(&doubled).unwrap().build().unwrap_err();
    assert!(matches!(err, Error::Config { .. }), "got {:?}", err);
}
