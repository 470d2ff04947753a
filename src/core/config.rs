use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::generation::GenerationConfig;
use crate::core::models::ModelKind;

/// Persistent user preferences, stored as TOML in the platform config
/// directory. Everything is optional; unset values fall back to the built-in
/// generation defaults.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model short name (e.g., "llama2-7b") used when no `-m` flag is given.
    pub default_model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_length: Option<u32>,
    /// Override for the assistant greeting that seeds each session.
    pub greeting: Option<String>,
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path();
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path();
        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    fn get_config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "causerie")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.default_model {
            Some(model) => println!("  default-model: {model}"),
            None => println!("  default-model: (unset)"),
        }
        let defaults = GenerationConfig::default();
        println!(
            "  temperature: {}",
            self.temperature.unwrap_or(defaults.temperature)
        );
        println!("  top-p: {}", self.top_p.unwrap_or(defaults.top_p));
        println!(
            "  max-length: {}",
            self.max_length.unwrap_or(defaults.max_length)
        );
        match &self.greeting {
            Some(greeting) => println!("  greeting: {greeting}"),
            None => println!("  greeting: (default)"),
        }
    }

    /// Applies one `set` command. Values are validated here so a bad value
    /// never reaches the config file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            "default-model" => {
                let model = ModelKind::try_from(value)?;
                self.default_model = Some(model.as_str().to_string());
            }
            "temperature" => self.temperature = Some(value.parse::<f64>()?),
            "top-p" => self.top_p = Some(value.parse::<f64>()?),
            "max-length" => self.max_length = Some(value.parse::<u32>()?),
            "greeting" => self.greeting = Some(value.to_string()),
            _ => return Err(format!("unknown config key: {key}").into()),
        }
        let resolved = self.generation_config(None)?;
        resolved.validate()?;
        Ok(())
    }

    pub fn unset(&mut self, key: &str) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            "default-model" => self.default_model = None,
            "temperature" => self.temperature = None,
            "top-p" => self.top_p = None,
            "max-length" => self.max_length = None,
            "greeting" => self.greeting = None,
            _ => return Err(format!("unknown config key: {key}").into()),
        }
        Ok(())
    }

    /// Resolves the effective generation config: built-in defaults, overlaid
    /// with config-file values, overlaid with an explicit model choice.
    pub fn generation_config(
        &self,
        model_override: Option<&str>,
    ) -> Result<GenerationConfig, Box<dyn std::error::Error>> {
        let mut resolved = GenerationConfig::default();

        if let Some(name) = model_override.or(self.default_model.as_deref()) {
            resolved.model = ModelKind::try_from(name)?;
        }
        if let Some(temperature) = self.temperature {
            resolved.temperature = temperature;
        }
        if let Some(top_p) = self.top_p {
            resolved.top_p = top_p;
        }
        if let Some(max_length) = self.max_length {
            resolved.max_length = max_length;
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("nonexistent_config.toml");

        let config = Config::load_from_path(&config_path).expect("Failed to load config");

        assert_eq!(config.default_model, None);
        assert_eq!(config.temperature, None);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("test_config.toml");

        let config = Config {
            default_model: Some("llama2-13b".to_string()),
            temperature: Some(0.7),
            ..Default::default()
        };

        config
            .save_to_path(&config_path)
            .expect("Failed to save config");
        let loaded = Config::load_from_path(&config_path).expect("Failed to load config");

        assert_eq!(loaded.default_model, Some("llama2-13b".to_string()));
        assert_eq!(loaded.temperature, Some(0.7));
        assert_eq!(loaded.max_length, None);
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut config = Config::default();
        assert!(config.set("colour", "blue").is_err());
        assert!(config.set("top-p", "not-a-number").is_err());
        assert!(config.set("top-p", "2.0").is_err());
        assert!(config.set("default-model", "gpt-4").is_err());
    }

    #[test]
    fn set_and_unset_round_trip() {
        let mut config = Config::default();
        config.set("default-model", "13b").expect("valid model");
        assert_eq!(config.default_model, Some("llama2-13b".to_string()));

        config.set("max-length", "1024").expect("valid length");
        assert_eq!(config.max_length, Some(1024));

        config.unset("max-length").expect("known key");
        assert_eq!(config.max_length, None);
        assert!(config.unset("colour").is_err());
    }

    #[test]
    fn generation_config_layers_overrides() {
        let config = Config {
            default_model: Some("llama2-13b".to_string()),
            temperature: Some(0.5),
            ..Default::default()
        };

        let resolved = config.generation_config(None).expect("resolves");
        assert_eq!(resolved.model, ModelKind::Llama2_13b);
        assert_eq!(resolved.temperature, 0.5);
        assert_eq!(resolved.top_p, GenerationConfig::default().top_p);

        let overridden = config.generation_config(Some("70b")).expect("resolves");
        assert_eq!(overridden.model, ModelKind::Llama2_70b);
    }
}
