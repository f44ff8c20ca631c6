use crate::config::EngineConfig;
use crate::error::LoadError;
use crate::models::Dataset;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, LoadError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Load a base's fact table and dimension tables from a JSON file
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, LoadError> {
    load_json(path)
}

/// Load view tunables; missing fields keep their defaults
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, LoadError> {
    load_json(path)
}
