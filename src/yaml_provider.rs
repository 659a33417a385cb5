use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

pub use serde_yaml::Value as YamlValue;

pub trait YamlProvider: Send + Sync {
    fn parse_str(&self, input: &str) -> Result<YamlValue>;
}

struct SerdeYamlProvider;

impl YamlProvider for SerdeYamlProvider {
    fn parse_str(&self, input: &str) -> Result<YamlValue> {
        Ok(serde_yaml::from_str(input)?)
    }
}

static YAML_PROVIDER: OnceLock<Box<dyn YamlProvider>> = OnceLock::new();

pub fn provider() -> &'static dyn YamlProvider {
    YAML_PROVIDER
        .get_or_init(|| Box::new(SerdeYamlProvider))
        .as_ref()
}

/// Install a custom YAML provider. Intended for tests.
pub fn set_provider(provider: Box<dyn YamlProvider>) -> std::result::Result<(), &'static str> {
    YAML_PROVIDER
        .set(provider)
        .map_err(|_| "YAML provider already set")
}

fn read_to_string(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Opening YAML file {path:?}"))?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    Ok(buf)
}

pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_to_string(path)?;
    let value = provider().parse_str(&raw)?;
    Ok(serde_yaml::from_value(value)?)
}
