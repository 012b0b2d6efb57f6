use crate::types::{ConfigError, InfraError, InfraResult};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, ErrorKind};

/// ファイルパスからBufReaderを作成する
/// パースやデータ変換は各ドメインで行う
pub fn load_file(file_path: &str) -> InfraResult<BufReader<File>> {
    let file = File::open(file_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => InfraError::from(ConfigError::missing_config_file(file_path)),
        _ => InfraError::file_system(file_path, e),
    })?;
    Ok(BufReader::new(file))
}

/// YAMLファイルからSerdeでDeserializeできる型を読み込む
pub fn load_yaml_from_file<T: DeserializeOwned>(file_path: &str) -> InfraResult<T> {
    let buf_reader = load_file(file_path)?;
    serde_yaml::from_reader(buf_reader).map_err(|e| InfraError::yaml(file_path, e))
}
